//! Content loader - fetches posts from the CMS

use anyhow::Result;

use super::{DateFormatter, PostDetail, PostDetailData, PostPagination, PostSummaryData};
use crate::cms::richtext::LinkResolver;
use crate::cms::{CmsClient, Predicate, QueryOptions};
use crate::config::SiteConfig;

/// Document with no field projected, only its metadata is used
#[derive(Debug, serde::Deserialize)]
struct Ignored {}

/// Loads listing pages and posts through a [`CmsClient`]
pub struct ContentLoader<'a, C> {
    config: &'a SiteConfig,
    cms: &'a C,
    dates: DateFormatter,
    links: LinkResolver,
}

impl<'a, C: CmsClient> ContentLoader<'a, C> {
    pub fn new(config: &'a SiteConfig, cms: &'a C) -> Self {
        Self {
            config,
            cms,
            dates: DateFormatter::from_config(config),
            links: LinkResolver::new(&config.cms.document_type),
        }
    }

    pub fn dates(&self) -> &DateFormatter {
        &self.dates
    }

    fn posts_predicate(&self) -> Predicate {
        Predicate::document_type(&self.config.cms.document_type)
    }

    /// First page of the listing, dates localized
    pub async fn load_listing(&self) -> Result<PostPagination> {
        let doc_type = &self.config.cms.document_type;
        let options = QueryOptions::default()
            .fetch(
                self.config
                    .listing
                    .fields
                    .iter()
                    .map(|field| format!("{}.{}", doc_type, field)),
            )
            .page_size(self.config.listing.page_size)
            .page(1);

        let response = self
            .cms
            .query::<PostSummaryData>(&[self.posts_predicate()], &options)
            .await?;
        let listing = PostPagination::from_response(response, &self.dates)?;
        tracing::info!(
            "Loaded {} posts for the listing (more: {})",
            listing.results.len(),
            listing.has_next_page()
        );
        Ok(listing)
    }

    /// Uids of the posts to pre-render
    ///
    /// Only the first page is enumerated; anything past it is rendered on
    /// first request.
    pub async fn load_paths(&self) -> Result<Vec<String>> {
        let options = QueryOptions::default().page_size(self.config.paths.page_size);
        let response = self
            .cms
            .query::<Ignored>(&[self.posts_predicate()], &options)
            .await?;

        let mut uids = Vec::with_capacity(response.results.len());
        for doc in response.results {
            match doc.uid {
                Some(uid) if !uid.is_empty() => uids.push(uid),
                _ => tracing::warn!("Skipping {} document {} without uid", doc.doc_type, doc.id),
            }
        }
        if response.total_results_size as usize > uids.len() {
            tracing::info!(
                "{} of {} posts pre-rendered, the rest render on first request",
                uids.len(),
                response.total_results_size
            );
        }
        Ok(uids)
    }

    /// One post by uid; a missing post fails with [`crate::cms::CmsError::NotFound`]
    pub async fn load_post(&self, uid: &str) -> Result<PostDetail> {
        let doc = self
            .cms
            .get_by_uid::<PostDetailData>(
                &self.config.cms.document_type,
                uid,
                &QueryOptions::default(),
            )
            .await?;
        PostDetail::from_document(doc, &self.dates, &self.links)
    }
}
