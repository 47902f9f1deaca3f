use std::sync::Arc;

use quire_core::workflow::WikiService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Authorization and revision-lifecycle engine, including its store.
    pub wiki: Arc<WikiService>,
    pub config: Arc<ServerConfig>,
}
