//! Home page listing with "load more" pagination

use anyhow::Result;

use super::post::{DateFormatter, PostPagination, PostSummary, PostSummaryData};
use crate::cms::PageFetcher;
use crate::config::CursorMode;

/// Listing state of one visitor session
///
/// Starts from the statically generated first page; every successful
/// "load more" appends the fetched page after the posts already shown.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    initial_next_page: Option<String>,
    current: PostPagination,
    mode: CursorMode,
}

impl ListingPage {
    pub fn new(initial: PostPagination, mode: CursorMode) -> Self {
        Self {
            initial_next_page: initial.next_page_url.clone(),
            current: initial,
            mode,
        }
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.current.results
    }

    pub fn cursor(&self) -> &PostPagination {
        &self.current
    }

    /// Whether the "load more" control is rendered
    pub fn show_load_more(&self) -> bool {
        self.current.has_next_page()
    }

    /// URL the next "load more" will request
    ///
    /// In [`CursorMode::Initial`] this is always the first cursor's URL, so
    /// repeated loads fetch the second page again and duplicate its posts.
    pub fn load_more_url(&self) -> Option<&str> {
        if !self.show_load_more() {
            return None;
        }
        match self.mode {
            CursorMode::Initial => self.initial_next_page.as_deref(),
            CursorMode::Latest => self.current.next_page_url.as_deref(),
        }
    }

    /// Fetch the next page and append it
    ///
    /// Returns `Ok(false)` without fetching when there is nothing to load.
    /// On error the state is left as it was.
    pub async fn load_more<F: PageFetcher>(
        &mut self,
        fetcher: &F,
        dates: &DateFormatter,
    ) -> Result<bool> {
        let Some(url) = self.load_more_url().map(str::to_string) else {
            return Ok(false);
        };

        let response = fetcher.fetch_page::<PostSummaryData>(&url).await?;
        let fetched = PostPagination::from_response(response, dates)?;
        tracing::debug!("Loaded {} more posts from {}", fetched.results.len(), url);

        self.current = PostPagination::merge(&self.current, fetched);
        Ok(true)
    }
}
