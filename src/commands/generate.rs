//! Generate static files

use anyhow::Result;

use crate::generator::{GenerateReport, Generator};
use crate::Site;

/// Generate the static site from the configured content API
///
/// Pages whose rendered HTML did not change are left alone unless `force`
/// is set.
pub async fn run(site: &Site, force: bool) -> Result<()> {
    let start = std::time::Instant::now();

    let source = site.content_source()?;
    let generator = Generator::new(site)?.with_force(force);
    let report = generator.generate(&source).await?;

    log_report(&report);
    tracing::info!("Generation completed in {:?}", start.elapsed());
    Ok(())
}

fn log_report(report: &GenerateReport) {
    if report.failed > 0 {
        tracing::warn!(
            "{} of {} posts could not be generated",
            report.failed,
            report.posts
        );
    }
    if report.written == 0 {
        tracing::info!("No changes detected, {} pages up to date", report.unchanged);
    }
}
