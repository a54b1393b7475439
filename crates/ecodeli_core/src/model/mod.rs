//! Display-ready records shared across role surfaces.
//!
//! # Responsibility
//! - Define the notification feed record consumed by every role page.
//! - Define small view records (stat cards, activity lines) reused by mappers.
//! - Carry the backend address object shared by deliveries and announcements.
//!
//! # Invariants
//! - Records are produced fresh per fetch; nothing here is persisted.

pub mod address;
pub mod notification;
pub mod view;
