//! Integration tests for Gesher
//!
//! These tests verify the integration between different components of the
//! system: the media readiness store with its collaborators, the contact
//! validation/dispatch pipeline, and the HTTP API contract.

#[path = "integration/media_readiness.rs"]
mod media_readiness;

#[path = "integration/contact_dispatch.rs"]
mod contact_dispatch;

#[path = "integration/http_api.rs"]
mod http_api;
