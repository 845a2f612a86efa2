//! Core use-case services.
//!
//! # Responsibility
//! - Validate and normalize caller payloads before they reach storage.
//! - Translate repository failures into caller-facing error kinds.
//!
//! # Invariants
//! - Services never retry; a retry must re-read positions from fresh state.

mod error;
pub mod project_service;
pub mod step_service;

pub use error::{ServiceError, ServiceResult};
