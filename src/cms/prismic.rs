//! Prismic REST API v2 client

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::{
    predicates_query, CmsClient, CmsError, Document, PageFetcher, Predicate, QueryOptions,
    SearchResponse,
};
use crate::config::CmsConfig;
use crate::helpers::with_query;

/// How long a resolved master ref is reused before the API root is read again
const REF_TTL: Duration = Duration::from_secs(5);

/// API root document; only the refs matter here
#[derive(Debug, Deserialize)]
struct ApiRoot {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// Client for a Prismic repository
#[derive(Debug, Clone)]
pub struct PrismicClient {
    http: reqwest::Client,
    endpoint: Url,
    access_token: Option<String>,
    /// Last master ref and when it was resolved, shared by clones
    master_ref: Arc<Mutex<Option<(String, Instant)>>>,
}

impl PrismicClient {
    /// Create a client for an API endpoint such as `https://repo.cdn.prismic.io/api/v2`
    pub fn new(endpoint: &str, access_token: Option<String>) -> Result<Self, CmsError> {
        if endpoint.trim().is_empty() {
            return Err(CmsError::NotConfigured);
        }
        let endpoint = Url::parse(endpoint.trim_end_matches('/')).map_err(|e| {
            CmsError::InvalidUrl {
                url: endpoint.to_string(),
                reason: e.to_string(),
            }
        })?;
        let http = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            access_token: access_token.filter(|t| !t.is_empty()),
            master_ref: Arc::new(Mutex::new(None)),
        })
    }

    /// Create a client from the `cms` configuration section
    pub fn from_config(config: &CmsConfig) -> Result<Self, CmsError> {
        Self::new(&config.endpoint, config.access_token.clone())
    }

    /// Current master ref, read from the API root at most once per [`REF_TTL`]
    ///
    /// Publishing changes the master ref, so it is never kept for long.
    async fn master_ref(&self) -> Result<String, CmsError> {
        let cached = self
            .cached_ref()
            .clone()
            .filter(|(_, at)| at.elapsed() < REF_TTL);
        if let Some((reference, _)) = cached {
            return Ok(reference);
        }

        let reference = self.fetch_master_ref().await?;
        *self.cached_ref() = Some((reference.clone(), Instant::now()));
        Ok(reference)
    }

    fn cached_ref(&self) -> std::sync::MutexGuard<'_, Option<(String, Instant)>> {
        self.master_ref.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn fetch_master_ref(&self) -> Result<String, CmsError> {
        let url = self.with_token(self.endpoint.as_str(), Vec::new());
        let root: ApiRoot = self.get_json(&url).await?;
        root.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or(CmsError::MissingMasterRef)
    }

    /// Build the search URL for a query against `reference`
    fn search_url(
        &self,
        reference: &str,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> String {
        let mut params = vec![("ref", reference.to_string())];
        if !predicates.is_empty() {
            params.push(("q", predicates_query(predicates)));
        }
        if let Some(page_size) = options.page_size {
            params.push(("pageSize", page_size.to_string()));
        }
        if let Some(page) = options.page {
            params.push(("page", page.to_string()));
        }
        if !options.fetch.is_empty() {
            params.push(("fetch", options.fetch.join(",")));
        }

        let base = format!("{}/documents/search", self.endpoint.as_str().trim_end_matches('/'));
        self.with_token(&base, params)
    }

    fn with_token(&self, base: &str, mut params: Vec<(&str, String)>) -> String {
        if let Some(token) = &self.access_token {
            params.push(("access_token", token.clone()));
        }
        with_query(base, &params)
    }

    /// Resolve a possibly relative URL against the endpoint's origin
    fn resolve(&self, url: &str) -> Result<Url, CmsError> {
        self.endpoint.join(url).map_err(|e| CmsError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CmsError> {
        let url = self.resolve(url)?;
        tracing::debug!("GET {}", url);

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CmsError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| CmsError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl CmsClient for PrismicClient {
    async fn query<D>(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<SearchResponse<D>, CmsError>
    where
        D: DeserializeOwned + Send,
    {
        let reference = self.master_ref().await?;
        let url = self.search_url(&reference, predicates, options);
        let response: SearchResponse<D> = self.get_json(&url).await?;
        tracing::debug!(
            "Query returned {} of {} results (page {}/{})",
            response.results.len(),
            response.total_results_size,
            response.page,
            response.total_pages
        );
        Ok(response)
    }

    async fn get_by_uid<D>(
        &self,
        doc_type: &str,
        uid: &str,
        options: &QueryOptions,
    ) -> Result<Document<D>, CmsError>
    where
        D: DeserializeOwned + Send,
    {
        let predicates = [Predicate::at(format!("my.{}.uid", doc_type), uid)];
        let options = QueryOptions {
            page_size: Some(1),
            ..options.clone()
        };
        let response: SearchResponse<D> = self.query(&predicates, &options).await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| CmsError::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }
}

impl PageFetcher for PrismicClient {
    async fn fetch_page<D>(&self, url: &str) -> Result<SearchResponse<D>, CmsError>
    where
        D: DeserializeOwned + Send,
    {
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PrismicClient {
        PrismicClient::new("https://blog.cdn.prismic.io/api/v2/", None).unwrap()
    }

    #[test]
    fn test_requires_endpoint() {
        assert!(matches!(
            PrismicClient::new("  ", None),
            Err(CmsError::NotConfigured)
        ));
        assert!(matches!(
            PrismicClient::new("not a url", None),
            Err(CmsError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_search_url() {
        let options = QueryOptions::default()
            .fetch(["post.title", "post.author"])
            .page_size(1)
            .page(1);
        let url = client().search_url("master-ref", &[Predicate::document_type("post")], &options);
        assert_eq!(
            url,
            "https://blog.cdn.prismic.io/api/v2/documents/search?ref=master-ref\
             &q=%5B%5Bat%28document.type%2C%20%22post%22%29%5D%5D\
             &pageSize=1&page=1&fetch=post.title%2Cpost.author"
        );
    }

    #[test]
    fn test_search_url_with_token() {
        let client =
            PrismicClient::new("https://blog.cdn.prismic.io/api/v2", Some("secret".into()))
                .unwrap();
        let options = QueryOptions::default().page_size(100);
        let url = client.search_url("r", &[], &options);
        assert_eq!(
            url,
            "https://blog.cdn.prismic.io/api/v2/documents/search?ref=r\
             &pageSize=100&access_token=secret"
        );
    }

    #[test]
    fn test_resolve_relative_next_page() {
        let url = client().resolve("/api?page=2").unwrap();
        assert_eq!(url.as_str(), "https://blog.cdn.prismic.io/api?page=2");

        let absolute = "https://other.example.com/documents/search?page=3";
        assert_eq!(client().resolve(absolute).unwrap().as_str(), absolute);
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let client =
            PrismicClient::new("https://blog.cdn.prismic.io/api/v2", Some(String::new())).unwrap();
        assert!(client.access_token.is_none());
    }
}
