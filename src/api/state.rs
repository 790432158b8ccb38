//! Application state for the API server

use crate::api::auth::SessionStore;
use crate::{Config, ImageDownloader};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the downloader instance, configuration and login sessions.
#[derive(Clone)]
pub struct AppState {
    /// The main ImageDownloader instance
    pub downloader: Arc<ImageDownloader>,

    /// Configuration (read-only)
    pub config: Arc<Config>,

    /// Active login sessions
    pub sessions: SessionStore,
}

impl AppState {
    /// Create a new AppState with no sessions
    pub fn new(downloader: Arc<ImageDownloader>, config: Arc<Config>) -> Self {
        Self {
            downloader,
            config,
            sessions: SessionStore::new(),
        }
    }
}
