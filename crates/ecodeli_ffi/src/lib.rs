//! Flutter bridge for the EcoDeli core.
//!
//! Only use-case level functions live here; all business rules stay in
//! `ecodeli_core`.

pub mod api;
