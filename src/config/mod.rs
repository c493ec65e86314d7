//! Configuration module

mod site;

pub use site::PrismicConfig;
pub use site::SiteConfig;
pub use site::{ENV_ACCESS_TOKEN, ENV_ENDPOINT};
