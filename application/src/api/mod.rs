//! REST API definitions.

pub mod contract;

use axum::{
    routing::{get, post},
    Router,
};

/// Creates a new [`Router`] serving the REST API.
///
/// Expects the [`Service`] to be provided as an [`Extension`].
///
/// [`Extension`]: axum::Extension
/// [`Service`]: crate::Service
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route("/contracts", post(contract::create))
        .route("/contracts/:id", get(contract::get).patch(contract::update))
        .route("/contracts/:id/schedule", get(contract::schedule))
        .route("/contracts/:id/summary", get(contract::summary))
}
