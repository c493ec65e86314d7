//! List posts from the content API

use anyhow::Result;

use crate::pagination::PaginationController;
use crate::source::ContentSource;
use crate::Site;

/// Print post summaries; with `all`, follow every page of the listing
pub async fn run(site: &Site, all: bool) -> Result<()> {
    let source = site.content_source()?;
    let dates = site.config.date_formatter()?;

    let first = source.query_posts().await?;
    let mut controller = PaginationController::from_response(&first);
    if all {
        controller.load_all(&source).await?;
    }

    println!("Posts ({}):", controller.items().len());
    for post in controller.items() {
        println!(
            "  {} - {} [{}]",
            dates.format_opt(post.first_publication_date.as_ref()),
            post.title,
            post.uid
        );
    }

    if !controller.is_exhausted() {
        println!("  ... more pages available (use --all)");
    }

    Ok(())
}
