//! # Suno Integration Module
//!
//! Thin wrappers around the Suno studio REST API plus the background worker
//! used to fetch audio files.
//!
//! ## API Coverage
//!
//! - `GET /api/session/` - identity of the current token, also the liveness probe
//! - `GET /api/project/me` - workspaces, paginated with `page`/`limit`
//! - `GET /api/project/{id}/clips` - tracks in a workspace, paginated
//! - `GET /api/clip/{id}` - track detail including `audio_url`
//!
//! Every request carries the bearer token and a fixed `Device-Id` header.
//!
//! ## Error Types
//!
//! - [`client::ApiError`] - transport failures and non-success statuses
//!
//! Nothing here retries. The degrading client methods log and return empty
//! values, the `fetch_*` methods hand the error to the caller.

pub mod client;
pub mod download;

pub use client::{ApiError, SessionProbe, SunoClient};
