//! Generate static files

use anyhow::Result;

use crate::generator::{GenerateReport, Generator};
use crate::Blog;

/// Generate the static site from the configured CMS
pub async fn run(blog: &Blog) -> Result<()> {
    let cms = blog.cms_client()?;
    let generator = Generator::new(blog, cms)?;
    run_with(&generator).await?;
    Ok(())
}

/// Generate with an existing generator
pub async fn run_with<C: crate::cms::CmsClient>(
    generator: &Generator<C>,
) -> Result<GenerateReport> {
    let start = std::time::Instant::now();

    let report = generator.generate().await?;
    if !report.missing.is_empty() {
        tracing::warn!(
            "{} posts were listed but not found: {}",
            report.missing.len(),
            report.missing.join(", ")
        );
    }

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(report)
}
