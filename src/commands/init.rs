//! Initialize a new blog directory

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

const CONFIG: &str = r#"# Blog configuration

# Site
title: spacetraveling
language: pt-BR
# IANA name, empty for UTC
timezone: ''
# short | medium | long | full
date_style: medium
logo: /images/logo.svg

# Directory
public_dir: public
static_dir: static

# Headless CMS
# PRISMIC_API_ENDPOINT and PRISMIC_ACCESS_TOKEN override these
cms:
  endpoint: ''
  document_type: post

# Home page
listing:
  page_size: 1
  fields: [title, subtitle, author]
  # initial | latest
  cursor: initial

# Pre-rendered posts
paths:
  page_size: 100

server:
  max_sessions: 1024
  fallback_refresh: 1

labels:
  load_more: Carregar mais posts
  loading: Carregando...
  reading_time_suffix: min
  not_found: Post não encontrado
"#;

const ENV_EXAMPLE: &str = "PRISMIC_API_ENDPOINT=https://your-repo.cdn.prismic.io/api/v2\n\
PRISMIC_ACCESS_TOKEN=\n";

const STYLE: &str = r#"* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: #1a1d23; color: #d7d7d7; font-family: Inter, sans-serif; }
a { color: inherit; text-decoration: none; }
.container { max-width: 720px; margin: 0 auto; padding: 0 1rem; }
.header { padding: 4rem 0 3rem; }
.post-summary { margin-bottom: 3rem; }
.post-summary h1 { color: #fff; font-size: 1.75rem; }
.info { display: flex; gap: 1.5rem; margin-top: 1.5rem; font-size: 0.875rem; }
.load-more { background: none; border: 0; color: #ff57b2; font-size: 1.125rem; cursor: pointer; }
.banner { width: 100%; height: 400px; background-position: center; background-repeat: no-repeat; background-size: cover; }
.post-header { margin: 5rem 0 4rem; }
.post-content { margin-bottom: 4rem; }
.post-body p { margin-top: 2rem; line-height: 1.8; }
.loading { padding: 4rem; text-align: center; }
"#;

const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="240" height="26" viewBox="0 0 240 26"><text x="0" y="20" fill="#ff57b2" font-family="sans-serif" font-size="22">spacetraveling.</text></svg>
"##;

/// Initialize a new blog in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    if target_dir.join("_config.yml").exists() {
        bail!("{:?} already has a _config.yml", target_dir);
    }

    // Create directory structure
    fs::create_dir_all(target_dir.join("static/css"))?;
    fs::create_dir_all(target_dir.join("static/images"))?;

    fs::write(target_dir.join("_config.yml"), CONFIG)?;
    fs::write(target_dir.join(".env.example"), ENV_EXAMPLE)?;
    fs::write(target_dir.join("static/css/style.css"), STYLE)?;
    fs::write(target_dir.join("static/images/logo.svg"), LOGO)?;

    tracing::debug!("Wrote starter files to {:?}", target_dir);
    Ok(())
}
