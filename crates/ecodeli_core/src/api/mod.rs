//! REST collaborator access.
//!
//! # Responsibility
//! - Wrap the configured HTTP client behind the [`ApiTransport`] seam.
//! - Provide list/detail decoding and the settle-all join used by loaders.
//!
//! # Invariants
//! - No retry, no backoff, no circuit breaking.
//! - A 404 on detail endpoints is an absent result, never an error.

pub mod client;
pub mod error;
pub mod page;
pub mod settle;

pub use client::{ApiClient, ApiTransport, ReqwestTransport};
pub use error::{ApiError, ApiResult, FeatureError};
pub use page::{ListPayload, Page, PageRequest};
pub use settle::{settle, Settled};
