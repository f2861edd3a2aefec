// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Pagination contract.
//!
//! Handlers pass page number and size through as raw query-string values;
//! [`PageRequest::parse`] validates them:
//!
//! - page number: must be a non-negative integer, never clamped
//! - page size: must be a positive integer; values above the configured
//!   maximum (48) are clamped, not rejected
//!
//! ```
//! use marketplace_search::{PageRequest, SearchConfig};
//!
//! let config = SearchConfig::default();
//! let page = PageRequest::parse(Some("2"), Some("500"), &config).unwrap();
//! assert_eq!(page.page_number(), 2);
//! assert_eq!(page.page_size(), 48);
//!
//! assert!(PageRequest::parse(Some("two"), None, &config).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::SearchConfig;
use crate::metrics;
use crate::search::PageWindow;

/// Hard upper bound on page size.
pub const MAX_PAGE_SIZE: u64 = 48;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageRequestError {
    #[error("invalid page number '{0}'")]
    InvalidPageNumber(String),
    #[error("invalid page size '{0}'")]
    InvalidPageSize(String),
}

/// Validated zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    page_number: u64,
    page_size: u64,
}

impl PageRequest {
    /// Build from numeric values, clamping the size to `max_page_size`.
    pub fn new(page_number: u64, page_size: u64, max_page_size: u64) -> Result<Self, PageRequestError> {
        if page_size == 0 {
            return Err(PageRequestError::InvalidPageSize(page_size.to_string()));
        }
        let max = max_page_size.clamp(1, MAX_PAGE_SIZE);
        if page_size > max {
            warn!(requested = page_size, max, "Page size clamped");
            metrics::record_page_size_clamped();
        }
        Ok(Self {
            page_number,
            page_size: page_size.min(max),
        })
    }

    /// Validate raw query-string values; missing values take the configured defaults.
    pub fn parse(
        page_number: Option<&str>,
        page_size: Option<&str>,
        config: &SearchConfig,
    ) -> Result<Self, PageRequestError> {
        let number = match page_number {
            Some(raw) => parse_non_negative(raw)
                .ok_or_else(|| PageRequestError::InvalidPageNumber(raw.to_string()))?,
            None => 0,
        };
        let size = match page_size {
            Some(raw) => parse_page_size(raw)
                .ok_or_else(|| PageRequestError::InvalidPageSize(raw.to_string()))?,
            None => config.default_page_size,
        };
        Self::new(number, size, config.max_page_size)
    }

    pub fn page_number(&self) -> u64 {
        self.page_number
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn window(&self) -> PageWindow {
        PageWindow::for_page(self.page_number, self.page_size)
    }
}

/// Trimmed ASCII digits, or `None`. A leading sign is not a plain integer.
fn digits(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit())).then_some(trimmed)
}

fn parse_non_negative(raw: &str) -> Option<u64> {
    digits(raw)?.parse().ok()
}

/// Like [`parse_non_negative`], but a number too large for `u64` is still
/// just a size above the maximum and gets clamped.
fn parse_page_size(raw: &str) -> Option<u64> {
    digits(raw).map(|d| d.parse().unwrap_or(u64::MAX))
}

/// One page of results plus the totals needed to page through the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub content: Vec<T>,
    pub page_number: u64,
    pub page_size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> PageResult<T> {
    /// Assemble from a page of content and the matching total.
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            page_number: request.page_number,
            page_size: request.page_size,
            total_elements,
            total_pages: total_elements.div_ceil(request.page_size),
        }
    }

    pub fn is_last(&self) -> bool {
        self.page_number.saturating_add(1) >= self.total_pages
    }

    /// Convert the content, keeping the paging metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PageResult<U> {
        PageResult {
            content: self.content.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SearchConfig {
        SearchConfig::default()
    }

    #[test]
    fn test_defaults_when_missing() {
        let page = PageRequest::parse(None, None, &config()).unwrap();
        assert_eq!(page.page_number(), 0);
        assert_eq!(page.page_size(), config().default_page_size);
    }

    #[test]
    fn test_oversize_clamped_not_rejected() {
        let page = PageRequest::parse(Some("0"), Some("49"), &config()).unwrap();
        assert_eq!(page.page_size(), 48);
        let page = PageRequest::parse(Some("0"), Some("48"), &config()).unwrap();
        assert_eq!(page.page_size(), 48);
    }

    #[test]
    fn test_size_beyond_u64_clamped_number_beyond_u64_rejected() {
        let huge = "99999999999999999999";
        let page = PageRequest::parse(Some("0"), Some(huge), &config()).unwrap();
        assert_eq!(page.page_size(), 48);
        assert_eq!(
            PageRequest::parse(Some(huge), Some("10"), &config()).unwrap_err(),
            PageRequestError::InvalidPageNumber(huge.to_string())
        );
    }

    #[test]
    fn test_configured_max_cannot_exceed_hard_cap() {
        let config = SearchConfig {
            max_page_size: 1000,
            ..SearchConfig::default()
        };
        let page = PageRequest::parse(None, Some("100"), &config).unwrap();
        assert_eq!(page.page_size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_page_number_never_clamped() {
        let page = PageRequest::parse(Some("100000"), Some("10"), &config()).unwrap();
        assert_eq!(page.page_number(), 100_000);
    }

    #[test]
    fn test_malformed_page_number_rejected() {
        for raw in ["abc", "-1", "1.5", "", "+3"] {
            assert_eq!(
                PageRequest::parse(Some(raw), None, &config()).unwrap_err(),
                PageRequestError::InvalidPageNumber(raw.to_string()),
                "input {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_malformed_page_size_rejected() {
        for raw in ["ten", "-5", "2e3"] {
            assert_eq!(
                PageRequest::parse(None, Some(raw), &config()).unwrap_err(),
                PageRequestError::InvalidPageSize(raw.to_string())
            );
        }
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(matches!(
            PageRequest::parse(None, Some("0"), &config()),
            Err(PageRequestError::InvalidPageSize(_))
        ));
    }

    #[test]
    fn test_surrounding_whitespace_accepted() {
        let page = PageRequest::parse(Some(" 3 "), Some(" 12"), &config()).unwrap();
        assert_eq!((page.page_number(), page.page_size()), (3, 12));
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let req = PageRequest::new(0, 10, 48).unwrap();
        assert_eq!(PageResult::new(Vec::<u8>::new(), req, 0).total_pages, 0);
        assert_eq!(PageResult::new(Vec::<u8>::new(), req, 5).total_pages, 1);
        assert_eq!(PageResult::new(Vec::<u8>::new(), req, 10).total_pages, 1);
        assert_eq!(PageResult::new(Vec::<u8>::new(), req, 11).total_pages, 2);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let req = PageRequest::new(1, 2, 48).unwrap();
        let page = PageResult::new(vec![1, 2], req, 5).map(|n| n * 10);
        assert_eq!(page.content, vec![10, 20]);
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 3);
        assert!(!page.is_last());
    }

    #[test]
    fn test_is_last_at_largest_page_number() {
        let req = PageRequest::parse(Some("18446744073709551615"), Some("10"), &config()).unwrap();
        let page = PageResult::new(Vec::<u8>::new(), req, 5);
        assert_eq!(page.page_number, u64::MAX);
        assert!(page.is_last());

        let first = PageResult::new(vec![1u8], PageRequest::new(0, 10, 48).unwrap(), 5);
        assert!(first.is_last());
    }

    #[test]
    fn test_serializes_camel_case() {
        let req = PageRequest::new(0, 10, 48).unwrap();
        let json = serde_json::to_value(PageResult::new(vec!["a"], req, 1)).unwrap();
        assert_eq!(json["totalElements"], 1);
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["pageSize"], 10);
    }
}
