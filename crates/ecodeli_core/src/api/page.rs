//! Paginated list envelopes and query builder.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Spring-style page envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default, alias = "number")]
    pub page: u32,
    #[serde(default)]
    pub size: u32,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            page: 0,
            size: 0,
        }
    }
}

impl<T> Page<T> {
    /// Builds a single page around `content`.
    pub fn of(content: Vec<T>) -> Self {
        let len = content.len();
        Self {
            content,
            total_elements: len as u64,
            total_pages: u32::from(len > 0),
            page: 0,
            size: len as u32,
        }
    }
}

/// List endpoints answer either a page envelope or a bare array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub enum ListPayload<T> {
    Bare(Vec<T>),
    Paginated(Page<T>),
}

impl<T> ListPayload<T> {
    pub fn into_content(self) -> Vec<T> {
        match self {
            Self::Bare(items) => items,
            Self::Paginated(page) => page.content,
        }
    }

    /// Normalizes both shapes into a page.
    pub fn into_page(self) -> Page<T> {
        match self {
            Self::Bare(items) => Page::of(items),
            Self::Paginated(page) => page,
        }
    }
}

/// Query parameters of a list call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page: Option<u32>,
    pub size: Option<u32>,
    /// `field,direction`, e.g. `createdAt,desc`.
    pub sort: Option<String>,
    pub filters: Vec<(String, String)>,
}

impl PageRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// `page=0&size=<size>&sort=<sort>` shorthand used by most list screens.
    pub fn first(size: u32, sort: &str) -> Self {
        Self::new().page(0).size(size).sort(sort)
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn sort(mut self, sort: &str) -> Self {
        self.sort = Some(sort.to_string());
        self
    }

    pub fn filter(mut self, key: &str, value: impl ToString) -> Self {
        self.filters.push((key.to_string(), value.to_string()));
        self
    }

    /// Flattens into query pairs: filters first, then paging.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = self.filters.clone();
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(size) = self.size {
            query.push(("size".to_string(), size.to_string()));
        }
        if let Some(sort) = &self.sort {
            query.push(("sort".to_string(), sort.clone()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::{ListPayload, Page, PageRequest};
    use serde_json::json;

    #[test]
    fn list_payload_accepts_both_shapes() {
        let bare: ListPayload<u32> = serde_json::from_value(json!([1, 2])).expect("bare array");
        assert_eq!(bare.into_content(), vec![1, 2]);

        let paged: ListPayload<u32> = serde_json::from_value(json!({
            "content": [3],
            "totalElements": 12,
            "totalPages": 12,
            "page": 0,
            "size": 1
        }))
        .expect("page envelope");
        let page = paged.into_page();
        assert_eq!(page.content, vec![3]);
        assert_eq!(page.total_elements, 12);
    }

    #[test]
    fn missing_content_defaults_to_empty() {
        let page: Page<u32> =
            serde_json::from_value(json!({ "totalElements": 4 })).expect("partial page");
        assert!(page.content.is_empty());
        assert_eq!(page.total_elements, 4);
    }

    #[test]
    fn page_request_orders_filters_before_paging() {
        let query = PageRequest::first(1, "submittedAt,desc")
            .filter("status", "PENDING")
            .to_query();
        assert_eq!(
            query,
            vec![
                ("status".to_string(), "PENDING".to_string()),
                ("page".to_string(), "0".to_string()),
                ("size".to_string(), "1".to_string()),
                ("sort".to_string(), "submittedAt,desc".to_string()),
            ]
        );
    }
}
