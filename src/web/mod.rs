//! HTTP surface: routes, shared state and the fragment response type.

use axum::{
    http::{HeaderName, HeaderValue},
    response::{Html, IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use strum::{Display, IntoStaticStr};
use tower_http::trace::TraceLayer;

use crate::storage::{StorageHandle, StoreError};

pub mod error;
pub mod extract;
mod handlers;

pub use error::WebError;
pub use extract::ActiveFilter;

pub const HX_TRIGGER: HeaderName = HeaderName::from_static("hx-trigger");

/// Change notifications sent in `HX-Trigger` so independent regions of the
/// page can refresh themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Signal {
    ItemCreated,
    ItemDeleted,
    ItemUpdated,
    CompletedCleared,
    AllToggled,
}

/// Store handle shared by every handler.
#[derive(Clone)]
pub struct AppState {
    storage: StorageHandle,
}

impl AppState {
    pub fn new(storage: StorageHandle) -> Self {
        Self { storage }
    }

    /// Runs one read-modify-read cycle against the store on the blocking
    /// pool.
    async fn run<F, T>(&self, op: F) -> Result<T, WebError>
    where
        F: FnOnce(&StorageHandle) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let storage = self.storage.clone();
        Ok(tokio::task::spawn_blocking(move || op(&storage)).await??)
    }
}

/// HTML body plus an optional change signal.
#[derive(Debug, Default)]
pub struct Fragments {
    html: String,
    signal: Option<Signal>,
}

impl Fragments {
    pub fn new(html: String) -> Self {
        Self { html, signal: None }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = Some(signal);
        self
    }
}

impl IntoResponse for Fragments {
    fn into_response(self) -> Response {
        let mut response = Html(self.html).into_response();
        if let Some(signal) = self.signal {
            let name: &'static str = signal.into();
            response
                .headers_mut()
                .insert(HX_TRIGGER, HeaderValue::from_static(name));
        }
        response
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/active", get(handlers::active))
        .route("/completed", get(handlers::completed))
        .route("/todos", get(handlers::list_todos).post(handlers::create_todo))
        .route(
            "/todos/:id",
            get(handlers::get_todo).delete(handlers::delete_todo),
        )
        .route(
            "/todos/:id/edit",
            get(handlers::edit_todo).patch(handlers::update_todo),
        )
        .route("/todos/:id/toggle", patch(handlers::toggle_todo))
        .route("/active-counter", get(handlers::active_counter))
        .route(
            "/clear-completed",
            get(handlers::clear_completed_button).patch(handlers::clear_completed),
        )
        .route(
            "/complete-all",
            get(handlers::toggle_all_checkbox).put(handlers::toggle_all),
        )
        .route("/reset", post(handlers::reset))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
