//! Blog server
//!
//! Serves the generated site and handles the two dynamic parts of it: the
//! listing's "load more" action and first-request rendering of posts that were
//! not generated ahead of time.

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::cms::{CmsClient, PageFetcher};
use crate::content::{DateFormatter, ListingPage, PostPagination};
use crate::generator::{self, Generator};
use crate::templates::DetailView;

/// How long a slug reported missing by the CMS keeps answering 404 without a new lookup
const MISSING_TTL: Duration = Duration::from_secs(60);

/// Listing sessions, oldest first
#[derive(Debug)]
pub struct Sessions {
    next_id: u64,
    capacity: usize,
    pages: IndexMap<u64, ListingPage>,
}

impl Sessions {
    pub fn new(capacity: usize) -> Self {
        Self {
            next_id: 1,
            capacity: capacity.max(1),
            pages: IndexMap::new(),
        }
    }

    pub fn get(&self, id: u64) -> Option<&ListingPage> {
        self.pages.get(&id)
    }

    /// Start a new session, dropping the oldest ones past capacity
    pub fn create(&mut self, page: ListingPage) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.store(id, page);
        id
    }

    /// Replace a session's state; the last write wins
    pub fn store(&mut self, id: u64, page: ListingPage) {
        self.pages.insert(id, page);
        while self.pages.len() > self.capacity {
            if let Some((evicted, _)) = self.pages.shift_remove_index(0) {
                tracing::debug!("Evicted listing session {}", evicted);
            }
        }
    }
}

/// Posts being generated on first request, and slugs known to be missing
#[derive(Debug, Default)]
struct FallbackTracker {
    in_flight: HashSet<String>,
    missing: HashMap<String, Instant>,
}

impl FallbackTracker {
    fn is_missing(&mut self, uid: &str) -> bool {
        match self.missing.get(uid) {
            Some(at) if at.elapsed() < MISSING_TTL => true,
            Some(_) => {
                self.missing.remove(uid);
                false
            }
            None => false,
        }
    }

    /// Remember a missing slug, dropping every expired entry
    fn mark_missing(&mut self, uid: String) {
        self.missing.retain(|_, at| at.elapsed() < MISSING_TTL);
        self.missing.insert(uid, Instant::now());
    }
}

/// Shared server state
pub struct AppState<C> {
    generator: Generator<C>,
    dates: DateFormatter,
    sessions: Mutex<Sessions>,
    fallback: Mutex<FallbackTracker>,
}

impl<C: CmsClient + PageFetcher + 'static> AppState<C> {
    pub fn new(generator: Generator<C>) -> Self {
        let config = &generator.blog().config;
        let dates = DateFormatter::from_config(config);
        let sessions = Sessions::new(config.server.max_sessions);

        Self {
            generator,
            dates,
            sessions: Mutex::new(sessions),
            fallback: Mutex::new(FallbackTracker::default()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, Sessions> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fallback(&self) -> MutexGuard<'_, FallbackTracker> {
        self.fallback.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn not_found(&self) -> Response {
        let config = &self.generator.blog().config;
        match self.generator.renderer().render_not_found(config) {
            Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
            Err(e) => internal_error(e),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    session: Option<u64>,
}

/// Build the router
pub fn router<C>(state: Arc<AppState<C>>) -> Router
where
    C: CmsClient + PageFetcher + 'static,
{
    let public_dir = state.generator.blog().public_dir.clone();
    let static_files = ServeDir::new(&public_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(public_dir.join("404.html")));

    Router::new()
        .route("/", get(index_handler::<C>))
        .route("/load-more", post(load_more_handler::<C>))
        .route("/post/:uid", get(post_handler::<C>))
        .route("/post/:uid/", get(post_handler::<C>))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start<C>(generator: Generator<C>, ip: &str, port: u16) -> Result<()>
where
    C: CmsClient + PageFetcher + 'static,
{
    let state = Arc::new(AppState::new(generator));
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Listing: a session's merged list, or the generated first page
async fn index_handler<C>(
    State(state): State<Arc<AppState<C>>>,
    Query(query): Query<SessionQuery>,
) -> Response
where
    C: CmsClient + PageFetcher + 'static,
{
    let config = &state.generator.blog().config;

    if let Some(id) = query.session {
        let cursor = state.sessions().get(id).map(|page| page.cursor().clone());
        match cursor {
            Some(cursor) => {
                return match state
                    .generator
                    .renderer()
                    .render_listing(config, &cursor, Some(id))
                {
                    Ok(html) => Html(html).into_response(),
                    Err(e) => internal_error(e),
                };
            }
            None => tracing::debug!("Unknown listing session {}", id),
        }
    }

    let index = state.generator.blog().public_dir.join("index.html");
    match tokio::fs::read_to_string(&index).await {
        Ok(html) => Html(html).into_response(),
        Err(_) => state.not_found(),
    }
}

/// "Load more": append the next page to the session and show it
///
/// A failed fetch leaves the session as it was; the visitor just sees the
/// same list again.
async fn load_more_handler<C>(
    State(state): State<Arc<AppState<C>>>,
    Query(query): Query<SessionQuery>,
) -> Response
where
    C: CmsClient + PageFetcher + 'static,
{
    let existing = query
        .session
        .and_then(|id| state.sessions().get(id).map(|page| (id, page.clone())));

    let (id, mut page) = match existing {
        Some(found) => found,
        None => {
            let public_dir = &state.generator.blog().public_dir;
            let initial = match read_initial_listing(public_dir).await {
                Ok(initial) => initial,
                Err(e) => return internal_error(e),
            };
            let mode = state.generator.blog().config.listing.cursor;
            let page = ListingPage::new(initial, mode);
            let id = state.sessions().create(page.clone());
            tracing::debug!("Started listing session {}", id);
            (id, page)
        }
    };

    // No lock is held while fetching: concurrent loads on one session each
    // start from their own snapshot and the last one to resolve is kept.
    match page.load_more(state.generator.cms(), &state.dates).await {
        Ok(true) => {
            tracing::debug!("Session {} now lists {} posts", id, page.posts().len());
            state.sessions().store(id, page);
        }
        Ok(false) => {}
        Err(e) => tracing::warn!("Load more failed for session {}: {:#}", id, e),
    }

    Redirect::to(&format!("/?session={}", id)).into_response()
}

/// Post detail: generated page, or placeholder while it is generated
async fn post_handler<C>(
    State(state): State<Arc<AppState<C>>>,
    Path(uid): Path<String>,
) -> Response
where
    C: CmsClient + PageFetcher + 'static,
{
    if !generator::is_safe_uid(&uid) {
        return state.not_found();
    }

    let blog = state.generator.blog();
    let page = generator::post_page_path(&blog.public_dir, &uid);
    if let Ok(html) = tokio::fs::read_to_string(&page).await {
        return Html(html).into_response();
    }

    let start_build = {
        let mut fallback = state.fallback();
        if fallback.is_missing(&uid) {
            return state.not_found();
        }
        fallback.in_flight.insert(uid.clone())
    };

    if start_build {
        tracing::info!("Rendering post {} on first request", uid);
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let result = state.generator.generate_post(&uid).await;
            let mut fallback = state.fallback();
            fallback.in_flight.remove(&uid);
            match result {
                Ok(_) => tracing::info!("Post {} generated", uid),
                Err(e) if generator::is_not_found(&e) => {
                    tracing::info!("Post {} does not exist", uid);
                    fallback.mark_missing(uid);
                }
                Err(e) => tracing::error!("Failed to generate post {}: {:#}", uid, e),
            }
        });
    }

    let refresh = Some(blog.config.server.fallback_refresh);
    match state
        .generator
        .renderer()
        .render_detail(&blog.config, DetailView::Fallback { refresh })
    {
        Ok(html) => Html(html).into_response(),
        Err(e) => internal_error(e),
    }
}

/// The listing's first cursor as written at generation time
pub async fn read_initial_listing(public_dir: &std::path::Path) -> Result<PostPagination> {
    let path = generator::listing_data_path(public_dir);
    let json = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {:?}: {}", path, e))?;
    Ok(serde_json::from_str(&json)?)
}

fn internal_error(e: anyhow::Error) -> Response {
    tracing::error!("Request failed: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CursorMode;

    fn page(next: Option<&str>) -> ListingPage {
        ListingPage::new(
            PostPagination {
                next_page_url: next.map(str::to_string),
                results: Vec::new(),
            },
            CursorMode::Initial,
        )
    }

    #[test]
    fn test_sessions_evict_oldest() {
        let mut sessions = Sessions::new(2);
        let a = sessions.create(page(None));
        let b = sessions.create(page(None));
        let c = sessions.create(page(Some("/next")));

        assert_eq!(sessions.pages.len(), 2);
        assert!(sessions.get(a).is_none());
        assert!(sessions.get(b).is_some());
        assert!(sessions.get(c).is_some_and(ListingPage::show_load_more));
    }

    #[test]
    fn test_store_replaces_state() {
        let mut sessions = Sessions::new(4);
        let id = sessions.create(page(Some("/next")));
        sessions.store(id, page(None));
        assert_eq!(sessions.pages.len(), 1);
        assert!(!sessions.get(id).unwrap().show_load_more());
    }

    #[test]
    fn test_missing_slugs_expire() {
        let mut tracker = FallbackTracker::default();
        tracker.missing.insert("gone".to_string(), Instant::now());
        assert!(tracker.is_missing("gone"));
        assert!(!tracker.is_missing("other"));

        if let Some(expired) = Instant::now().checked_sub(MISSING_TTL + Duration::from_secs(1)) {
            tracker.missing.insert("old".to_string(), expired);
            assert!(!tracker.is_missing("old"));
            assert!(!tracker.missing.contains_key("old"));
        }
    }

    #[test]
    fn test_marking_missing_prunes_expired_slugs() {
        let Some(expired) = Instant::now().checked_sub(MISSING_TTL + Duration::from_secs(1))
        else {
            return;
        };
        let mut tracker = FallbackTracker::default();
        for i in 0..1000 {
            tracker.missing.insert(format!("gone-{}", i), expired);
        }
        tracker.mark_missing("fresh".to_string());

        assert_eq!(tracker.missing.len(), 1);
        assert!(tracker.is_missing("fresh"));
    }
}
