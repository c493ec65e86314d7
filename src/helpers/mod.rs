//! Helper functions for templates and routes

mod date;
mod url;

pub use date::*;
pub use url::*;
