//! Generator module - renders CMS content into static HTML

use anyhow::{bail, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cms::{CmsClient, CmsError};
use crate::content::loader::ContentLoader;
use crate::content::{PostDetail, PostPagination};
use crate::templates::{DetailView, TemplateRenderer};
use crate::Blog;

/// Directory under the public dir holding page data as JSON
pub const DATA_DIR: &str = "_data";

/// What a generation run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    /// Posts on the listing's first page
    pub listed: usize,
    /// Detail pages written
    pub posts: usize,
    /// Uids enumerated but gone by the time they were fetched
    pub missing: Vec<String>,
}

/// Static site generator
pub struct Generator<C> {
    blog: Blog,
    cms: C,
    renderer: TemplateRenderer,
}

impl<C: CmsClient> Generator<C> {
    /// Create a new generator
    pub fn new(blog: &Blog, cms: C) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;

        Ok(Self {
            blog: blog.clone(),
            cms,
            renderer,
        })
    }

    pub fn blog(&self) -> &Blog {
        &self.blog
    }

    pub fn cms(&self) -> &C {
        &self.cms
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    pub fn loader(&self) -> ContentLoader<'_, C> {
        ContentLoader::new(&self.blog.config, &self.cms)
    }

    /// Generate the entire site
    pub async fn generate(&self) -> Result<GenerateReport> {
        let public_dir = &self.blog.public_dir;
        fs::create_dir_all(public_dir)?;

        // Copy static assets (logo, styles)
        self.copy_static_assets()?;

        let loader = self.loader();
        let mut report = GenerateReport::default();

        // Listing: first page only, the rest loads on demand
        let listing = loader.load_listing().await?;
        report.listed = listing.results.len();
        self.write_listing(&listing)?;

        // Detail pages
        let uids = loader.load_paths().await?;
        for uid in &uids {
            match self.generate_post(uid).await {
                Ok(_) => report.posts += 1,
                Err(e) if is_not_found(&e) => {
                    tracing::warn!("Post {} disappeared before it could be fetched", uid);
                    report.missing.push(uid.clone());
                }
                Err(e) => return Err(e),
            }
        }

        self.write_not_found()?;

        tracing::info!(
            "Generated listing ({} posts) and {} post pages",
            report.listed,
            report.posts
        );
        Ok(report)
    }

    /// Fetch one post and write its page and data file
    pub async fn generate_post(&self, uid: &str) -> Result<PostDetail> {
        if !is_safe_uid(uid) {
            bail!("Refusing to generate post with uid {:?}", uid);
        }

        let post = self.loader().load_post(uid).await?;
        let html = self
            .renderer
            .render_detail(&self.blog.config, DetailView::Ready(&post))?;

        write_file(&post_page_path(&self.blog.public_dir, uid), html)?;
        write_json(&post_data_path(&self.blog.public_dir, uid), &post)?;
        tracing::debug!("Generated post: {}", uid);

        Ok(post)
    }

    /// Write the listing page and its initial cursor
    fn write_listing(&self, listing: &PostPagination) -> Result<()> {
        let html = self
            .renderer
            .render_listing(&self.blog.config, listing, None)?;
        write_file(&self.blog.public_dir.join("index.html"), html)?;
        write_json(&listing_data_path(&self.blog.public_dir), listing)?;
        Ok(())
    }

    fn write_not_found(&self) -> Result<()> {
        let html = self.renderer.render_not_found(&self.blog.config)?;
        write_file(&self.blog.public_dir.join("404.html"), html)
    }

    /// Copy static assets (images, css) to the public directory
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.exists() {
            tracing::debug!("No static directory at {:?}", static_dir);
            return Ok(());
        }

        let mut copied = 0;
        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
            copied += 1;
        }

        tracing::debug!("Copied {} static files", copied);
        Ok(())
    }
}

/// Whether an error chain ends in a missing CMS document
pub fn is_not_found(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<CmsError>()
        .is_some_and(CmsError::is_not_found)
}

/// Uids become directory names, so only plain slugs are accepted
pub fn is_safe_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid != "."
        && uid != ".."
        && !uid.contains(['/', '\\'])
        && !uid.chars().any(char::is_control)
}

/// Data file holding the listing's first cursor
pub fn listing_data_path(public_dir: &Path) -> PathBuf {
    public_dir.join(DATA_DIR).join("index.json")
}

pub fn post_page_path(public_dir: &Path, uid: &str) -> PathBuf {
    public_dir.join("post").join(uid).join("index.html")
}

pub fn post_data_path(public_dir: &Path, uid: &str) -> PathBuf {
    public_dir
        .join(DATA_DIR)
        .join("post")
        .join(format!("{}.json", uid))
}

/// Write through a sibling temp file so readers never see a partial page
fn write_file(path: &Path, contents: String) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
    }
    let tmp = temp_path(path);
    fs::write(&tmp, contents).map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", tmp, e))?;
    fs::rename(&tmp, path)
        .map_err(|e| anyhow::anyhow!("Failed to move {:?} to {:?}: {}", tmp, path, e))?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    write_file(path, serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_uid() {
        assert!(is_safe_uid("como-utilizar-hooks"));
        assert!(is_safe_uid("olá"));
        assert!(!is_safe_uid(""));
        assert!(!is_safe_uid(".."));
        assert!(!is_safe_uid("a/b"));
        assert!(!is_safe_uid("a\\b"));
    }

    #[test]
    fn test_output_paths() {
        let public = Path::new("/site/public");
        assert_eq!(
            post_page_path(public, "hooks"),
            Path::new("/site/public/post/hooks/index.html")
        );
        assert_eq!(
            post_data_path(public, "hooks"),
            Path::new("/site/public/_data/post/hooks.json")
        );
        assert_eq!(
            listing_data_path(public),
            Path::new("/site/public/_data/index.json")
        );
    }

    #[test]
    fn test_write_file_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let page = post_page_path(dir.path(), "hooks");

        write_file(&page, "first version".to_string()).unwrap();
        write_file(&page, "second".to_string()).unwrap();

        assert_eq!(fs::read_to_string(&page).unwrap(), "second");
        assert_eq!(temp_path(&page), dir.path().join("post/hooks/.index.html.tmp"));
        assert!(!temp_path(&page).exists());
    }

    #[test]
    fn test_not_found_detection() {
        let err: anyhow::Error = CmsError::NotFound {
            doc_type: "post".to_string(),
            uid: "missing".to_string(),
        }
        .into();
        assert!(is_not_found(&err));
        assert!(!is_not_found(&anyhow::anyhow!("boom")));
    }
}
