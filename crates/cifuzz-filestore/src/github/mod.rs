//! GitHub backends: REST listing and the Actions artifact service.

pub mod api;
pub mod artifact_client;
