//! Fakes and fixtures shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use crate::app::Result;
use crate::domain::Notification;
use crate::fetcher::{FetchResult, Fetcher};
use crate::webhook::{Sink, WebhookError};

/// Plays back a fixed list of fetch results, then reports "not modified".
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<FetchResult>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Result<FetchResult>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        _url: &str,
        _etag: Option<&str>,
        _last_modified: Option<&str>,
    ) -> Result<FetchResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or(Ok(FetchResult::NotModified))
    }
}

/// Records every notification it is asked to send.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A sink whose every send fails after being recorded.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn send(&self, notification: &Notification) -> std::result::Result<(), WebhookError> {
        self.sent.lock().unwrap().push(notification.clone());
        if self.fail {
            return Err(WebhookError::Status {
                status: 500,
                body: "unavailable".into(),
            });
        }
        Ok(())
    }
}

/// An RSS 2.0 document with one item per guid, in the given order.
pub fn rss_feed(guids: &[&str]) -> FetchResult {
    let items: String = guids
        .iter()
        .map(|guid| {
            format!(
                "<item><title>Post {guid}</title><link>https://example.com/{guid}</link>\
                 <guid>{guid}</guid><description>Body {guid}</description></item>"
            )
        })
        .collect();

    FetchResult::Content {
        body: format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <rss version=\"2.0\"><channel><title>Test</title>{items}</channel></rss>"
        )
        .into_bytes(),
        etag: None,
        last_modified: None,
    }
}

/// Serve `app` on an ephemeral local port, returning its base URL.
pub async fn spawn_test_server(app: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let address = listener.local_addr().expect("local addr should exist");
    let join_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server should run");
    });
    (format!("http://{address}"), join_handle)
}
