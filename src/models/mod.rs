//! Data models for upload credential issuance.
//!
//! These types describe the request/response wire shapes and the credential
//! the service hands out. They serialize naturally as JSON via `serde`; the
//! service holds no persistent state, so nothing here maps to storage.

pub mod credential;
pub mod upload;
