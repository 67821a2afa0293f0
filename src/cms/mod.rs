//! Headless CMS access
//!
//! The generator and server only see the [`CmsClient`] and [`PageFetcher`]
//! capabilities; [`prismic::PrismicClient`] implements both against the
//! Prismic REST API.

mod error;
pub mod prismic;
pub mod richtext;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;

pub use error::CmsError;
pub use prismic::PrismicClient;

/// An `at(path, value)` query predicate: exact match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    path: String,
    value: String,
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Predicate matching every document of a custom type
    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }

    /// Render as a single bracketed predicate, e.g. `[at(document.type, "post")]`
    pub fn to_query(&self) -> String {
        format!("[at({}, {})]", self.path, quote(&self.value))
    }
}

/// Build the `q` parameter for a list of predicates
pub fn predicates_query(predicates: &[Predicate]) -> String {
    let inner: String = predicates.iter().map(Predicate::to_query).collect();
    format!("[{}]", inner)
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Options of a query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Field projection (`post.title`); empty fetches every field
    pub fetch: Vec<String>,
    pub page_size: Option<u32>,
    pub page: Option<u32>,
}

impl QueryOptions {
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// A CMS document carrying typed `data`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document<D> {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    pub data: D,
}

/// One page of query results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse<D> {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results_per_page: u32,
    #[serde(default)]
    pub results_size: u32,
    #[serde(default)]
    pub total_results_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub prev_page: Option<String>,
    pub results: Vec<Document<D>>,
}

/// Query capability of a headless CMS
pub trait CmsClient: Send + Sync {
    /// Run a predicate query
    fn query<D>(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> impl Future<Output = Result<SearchResponse<D>, CmsError>> + Send
    where
        D: DeserializeOwned + Send;

    /// Fetch one document of `doc_type` by its unique identifier
    fn get_by_uid<D>(
        &self,
        doc_type: &str,
        uid: &str,
        options: &QueryOptions,
    ) -> impl Future<Output = Result<Document<D>, CmsError>> + Send
    where
        D: DeserializeOwned + Send;
}

/// Fetches an opaque `next_page` URL with a plain GET
pub trait PageFetcher: Send + Sync {
    fn fetch_page<D>(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<SearchResponse<D>, CmsError>> + Send
    where
        D: DeserializeOwned + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_rendering() {
        assert_eq!(
            Predicate::document_type("post").to_query(),
            r#"[at(document.type, "post")]"#
        );
        assert_eq!(
            Predicate::at("my.post.uid", "say \"hi\"").to_query(),
            r#"[at(my.post.uid, "say \"hi\"")]"#
        );
    }

    #[test]
    fn test_predicates_query() {
        let q = predicates_query(&[
            Predicate::document_type("post"),
            Predicate::at("my.post.uid", "hooks"),
        ]);
        assert_eq!(
            q,
            r#"[[at(document.type, "post")][at(my.post.uid, "hooks")]]"#
        );
    }

    #[test]
    fn test_decode_search_response() {
        let json = r#"{
            "page": 1,
            "results_per_page": 1,
            "results_size": 1,
            "total_results_size": 2,
            "total_pages": 2,
            "next_page": "https://blog.cdn.prismic.io/api/v2/documents/search?page=2",
            "prev_page": null,
            "results": [{
                "id": "YF1",
                "uid": "hello",
                "type": "post",
                "first_publication_date": "2021-03-25T19:25:28+0000",
                "last_publication_date": null,
                "data": {"title": "Hello"}
            }]
        }"#;
        let response: SearchResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(response.total_pages, 2);
        assert!(response.next_page.is_some());
        assert_eq!(response.results[0].uid.as_deref(), Some("hello"));
        assert_eq!(response.results[0].data["title"], "Hello");
    }
}
