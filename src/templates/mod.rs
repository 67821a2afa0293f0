//! Built-in blog templates using the Tera template engine
//!
//! All templates are embedded in the binary. Autoescaping stays on; post
//! bodies are the only values marked safe since they are produced by the rich
//! text renderer.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{PostDetail, PostPagination};

/// Template renderer with the embedded blog theme
pub struct TemplateRenderer {
    tera: Tera,
}

/// What the detail route shows
#[derive(Debug, Clone, Copy)]
pub enum DetailView<'a> {
    /// Data not available yet: placeholder only
    Fallback {
        /// Seconds before the placeholder reloads; `None` disables reloading
        refresh: Option<u32>,
    },
    Ready(&'a PostDetail),
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub language: String,
    pub logo: String,
}

impl SiteData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            language: config.language.clone(),
            logo: config.logo.clone(),
        }
    }
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("blog/layout.html")),
            ("index.html", include_str!("blog/index.html")),
            ("post.html", include_str!("blog/post.html")),
            ("fallback.html", include_str!("blog/fallback.html")),
            ("404.html", include_str!("blog/404.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("blog/partials/header.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    fn base_context(&self, config: &SiteConfig) -> Context {
        let mut context = Context::new();
        context.insert("site", &SiteData::from_config(config));
        context.insert("labels", &config.labels);
        context
    }

    /// Render the listing; `session` is carried by the "load more" form
    pub fn render_listing(
        &self,
        config: &SiteConfig,
        cursor: &PostPagination,
        session: Option<u64>,
    ) -> Result<String> {
        let mut context = self.base_context(config);
        context.insert("posts", &cursor.results);
        context.insert("show_load_more", &cursor.has_next_page());
        context.insert("session", &session);
        self.render("index.html", &context)
    }

    /// Render a detail page, or only the placeholder while data is pending
    pub fn render_detail(&self, config: &SiteConfig, view: DetailView<'_>) -> Result<String> {
        let mut context = self.base_context(config);
        match view {
            DetailView::Fallback { refresh } => {
                context.insert("refresh", &refresh);
                self.render("fallback.html", &context)
            }
            DetailView::Ready(post) => {
                context.insert("post", post);
                context.insert("reading_times", &post.reading_times());
                self.render("post.html", &context)
            }
        }
    }

    pub fn render_not_found(&self, config: &SiteConfig) -> Result<String> {
        self.render("404.html", &self.base_context(config))
    }
}
