//! Back-office screens: home dashboard, invoices, announcement/delivery
//! flows, courier onboarding and courier detail.
//!
//! # Invariants
//! - Every loader joins its requests with a settle-all join; a failed
//!   slice degrades to an absent page and never fails the screen.
//! - Statuses fold onto [`crate::model::view::AdminStatus`].

pub mod courier_detail;
pub mod couriers;
pub mod dashboard;
pub mod flows;
pub mod invoices;

use crate::api::Page;

/// `totalElements` of an optional page; envelopes without a total fall back
/// to the loaded row count.
pub(crate) fn total_or_len<T>(page: Option<&Page<T>>) -> u64 {
    page.map(|page| page.total_elements.max(page.content.len() as u64))
        .unwrap_or(0)
}

/// Rows of an optional page.
pub(crate) fn rows<T>(page: Option<&Page<T>>) -> &[T] {
    page.map(|page| page.content.as_slice()).unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::{rows, total_or_len};
    use crate::api::Page;

    #[test]
    fn total_falls_back_to_row_count() {
        let mut page = Page::of(vec![1, 2, 3]);
        page.total_elements = 0;
        assert_eq!(total_or_len(Some(&page)), 3);
        page.total_elements = 40;
        assert_eq!(total_or_len(Some(&page)), 40);
        assert_eq!(total_or_len::<u8>(None), 0);
        assert!(rows::<u8>(None).is_empty());
    }
}
