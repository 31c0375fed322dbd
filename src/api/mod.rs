//! HTTP API.
//!
//! `POST /api/upload` turns an uploaded lab report into lab results,
//! `POST /api/onboarding` computes a baseline metabolic profile and
//! `GET /api/health` reports liveness. `api_router()` returns a `Router`
//! that can be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{serve, start_api_server, ApiServer, ServerError};
pub use types::ApiContext;
