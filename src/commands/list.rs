//! List posts known to the CMS

use anyhow::Result;

use crate::cms::{CmsClient, Predicate, QueryOptions};
use crate::content::{DateFormatter, PostPagination, PostSummaryData};
use crate::Blog;

/// Print every post as `date - title [uid]`
pub async fn run(blog: &Blog) -> Result<()> {
    let cms = blog.cms_client()?;
    let posts = fetch_all(blog, &cms).await?;

    println!("Posts ({}):", posts.results.len());
    for post in &posts.results {
        println!(
            "  {} - {} [{}]",
            post.first_publication_date.as_deref().unwrap_or("-"),
            post.title,
            post.uid
        );
    }

    Ok(())
}

/// Walk every result page of the posts query
pub async fn fetch_all<C: CmsClient>(blog: &Blog, cms: &C) -> Result<PostPagination> {
    let config = &blog.config;
    let dates = DateFormatter::from_config(config);
    let predicates = [Predicate::document_type(&config.cms.document_type)];

    let mut all = PostPagination::default();
    let mut page = 1;
    loop {
        let options = QueryOptions::default()
            .page_size(config.paths.page_size)
            .page(page);
        let response = cms.query::<PostSummaryData>(&predicates, &options).await?;
        let total_pages = response.total_pages;
        let fetched = PostPagination::from_response(response, &dates)?;
        all = PostPagination::merge(&all, fetched);

        if page >= total_pages {
            break;
        }
        page += 1;
    }

    Ok(all)
}
