//! CMS client errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("CMS endpoint is not configured (set cms.endpoint or PRISMIC_API_ENDPOINT)")]
    NotConfigured,

    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { status: u16, url: String },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("API root did not advertise a master ref")]
    MissingMasterRef,

    #[error("no {doc_type} document with uid {uid:?}")]
    NotFound { doc_type: String, uid: String },
}

impl CmsError {
    /// Whether this error means the document does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, CmsError::NotFound { .. })
    }
}
