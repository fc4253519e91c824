//! Test utilities for bgn-core
//!
//! This module provides a mock BGN site that serves a review-lists page and
//! the action list download, so the resolver, fetcher, and pipeline can be
//! exercised without touching the real site.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::sync::oneshot;

/// What the mock site is currently publishing
struct Release {
    href: String,
    date_text: String,
    body: Vec<u8>,
    fail_downloads: bool,
}

struct SiteState {
    release: Mutex<Release>,
    downloads: AtomicUsize,
}

/// Mock BGN site for testing
///
/// Serves `/apex/f` (the review-lists page) and `/apex/files/*` (the
/// download). Download requests are counted.
pub struct MockBgnSite {
    addr: SocketAddr,
    state: Arc<SiteState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockBgnSite {
    /// Start the mock site on an available port
    ///
    /// `href` is the link target relative to `/apex/`, e.g.
    /// `files/action_list.xls`.
    pub async fn start(href: &str, date_text: &str, body: &[u8]) -> Self {
        let state = Arc::new(SiteState {
            release: Mutex::new(Release {
                href: href.to_string(),
                date_text: date_text.to_string(),
                body: body.to_vec(),
                fail_downloads: false,
            }),
            downloads: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/apex/f", get(handle_page))
            .route("/apex/files/*file", get(handle_download))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// URL of the review-lists page
    pub fn page_url(&self) -> String {
        format!("http://{}/apex/f?p=geonames_web:review_lists", self.addr)
    }

    /// Base path relative links resolve against
    pub fn base_url(&self) -> String {
        format!("http://{}/apex/", self.addr)
    }

    /// Absolute URL of the current download
    pub fn download_url(&self) -> String {
        let href = self.state.release.lock().unwrap().href.clone();
        format!("{}{}", self.base_url(), href)
    }

    /// Publish a new action list
    pub fn publish(&self, date_text: &str, body: &[u8]) {
        let mut release = self.state.release.lock().unwrap();
        release.date_text = date_text.to_string();
        release.body = body.to_vec();
    }

    /// Make download requests fail with a 500
    pub fn fail_downloads(&self, fail: bool) {
        self.state.release.lock().unwrap().fail_downloads = fail;
    }

    /// Number of download requests served so far
    pub fn downloads(&self) -> usize {
        self.state.downloads.load(Ordering::SeqCst)
    }

    /// Stop the mock site
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockBgnSite {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Review-lists page, laid out like the real one
async fn handle_page(State(state): State<Arc<SiteState>>) -> Html<String> {
    let release = state.release.lock().unwrap();
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Review Lists</title></head>
<body>
  <div class="review-lists">
    <p><span><a href="f?p=geonames_web:quarterly">Quarterly Review List</a> (Updated: October 2, 2023)</span></p>
    <p><span><a href="{}">Action List</a> (Updated: {})</span></p>
  </div>
</body>
</html>"#,
        release.href, release.date_text
    ))
}

async fn handle_download(State(state): State<Arc<SiteState>>) -> Response {
    state.downloads.fetch_add(1, Ordering::SeqCst);
    let release = state.release.lock().unwrap();
    if release.fail_downloads {
        return (StatusCode::INTERNAL_SERVER_ERROR, "download unavailable").into_response();
    }
    (StatusCode::OK, release.body.clone()).into_response()
}
