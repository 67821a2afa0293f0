//! Post models

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::reading;
use crate::cms::richtext::{self, LinkResolver};
use crate::cms::{Document, SearchResponse};
use crate::config::SiteConfig;
use crate::helpers::{format_publication_date, DateLocale, DateStyle};

/// Fields fetched for the listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostSummaryData {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,
}

/// Full post fields as stored in the CMS
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostDetailData {
    pub title: Option<String>,
    pub banner: Option<ImageField>,
    pub author: Option<String>,
    pub content: Vec<ContentSliceData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageField {
    pub url: Option<String>,
    pub alt: Option<String>,
}

/// One `content` group entry: a heading and a rich text body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSliceData {
    pub heading: Option<String>,
    pub body: Vec<richtext::Block>,
}

/// Formats publication timestamps for display
#[derive(Debug, Clone)]
pub struct DateFormatter {
    tz: chrono_tz::Tz,
    locale: DateLocale,
    style: DateStyle,
}

impl DateFormatter {
    pub fn new(tz: chrono_tz::Tz, locale: DateLocale, style: DateStyle) -> Self {
        Self { tz, locale, style }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(config.tz(), config.locale(), config.date_style)
    }

    pub fn format(&self, raw: Option<&str>) -> Result<Option<String>> {
        format_publication_date(raw, &self.tz, self.locale, self.style)
    }
}

/// A post as shown in the listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub uid: String,
    /// Display string, already localized
    pub first_publication_date: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    pub fn from_document(doc: Document<PostSummaryData>, dates: &DateFormatter) -> Result<Self> {
        Ok(Self {
            first_publication_date: dates.format(doc.first_publication_date.as_deref())?,
            uid: doc.uid.unwrap_or_default(),
            title: doc.data.title.unwrap_or_default(),
            subtitle: doc.data.subtitle.unwrap_or_default(),
            author: doc.data.author.unwrap_or_default(),
        })
    }
}

/// A page of listing results plus the URL of the next page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostPagination {
    #[serde(rename = "next_page", default)]
    pub next_page_url: Option<String>,
    pub results: Vec<PostSummary>,
}

impl PostPagination {
    /// Convert a raw query page, localizing every date
    pub fn from_response(
        response: SearchResponse<PostSummaryData>,
        dates: &DateFormatter,
    ) -> Result<Self> {
        let results = response
            .results
            .into_iter()
            .map(|doc| PostSummary::from_document(doc, dates))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            next_page_url: response.next_page.filter(|url| !url.is_empty()),
            results,
        })
    }

    /// Whether another page can be requested
    pub fn has_next_page(&self) -> bool {
        self.next_page_url.as_deref().is_some_and(|url| !url.is_empty())
    }

    /// Append `fetched` after `previous`, taking the fetched page's next URL
    pub fn merge(previous: &PostPagination, fetched: PostPagination) -> PostPagination {
        let mut results = Vec::with_capacity(previous.results.len() + fetched.results.len());
        results.extend(previous.results.iter().cloned());
        results.extend(fetched.results);
        PostPagination {
            next_page_url: fetched.next_page_url,
            results,
        }
    }
}

/// One section of a post body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub heading: String,
    pub body_html: String,
}

/// A post ready to render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,
    pub title: String,
    pub banner_url: String,
    pub author: String,
    pub first_publication_date: Option<String>,
    pub content: Vec<ContentBlock>,
}

impl PostDetail {
    pub fn from_document(
        doc: Document<PostDetailData>,
        dates: &DateFormatter,
        links: &LinkResolver,
    ) -> Result<Self> {
        let data = doc.data;
        let content = data
            .content
            .into_iter()
            .map(|slice| ContentBlock {
                heading: slice.heading.unwrap_or_default(),
                body_html: richtext::as_html(&slice.body, links),
            })
            .collect();

        Ok(Self {
            first_publication_date: dates.format(doc.first_publication_date.as_deref())?,
            uid: doc.uid.unwrap_or_default(),
            title: data.title.unwrap_or_default(),
            banner_url: data.banner.and_then(|b| b.url).unwrap_or_default(),
            author: data.author.unwrap_or_default(),
            content,
        })
    }

    /// Estimated minutes per content block, in order
    pub fn reading_times(&self) -> Vec<u32> {
        self.content
            .iter()
            .map(|block| reading::estimate_minutes(&block.body_html))
            .collect()
    }
}
