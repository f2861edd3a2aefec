//! Public types for the search coordinator.

use thiserror::Error;

use crate::pagination::PageRequestError;
use crate::search::SortError;
use crate::storage::traits::StorageError;

/// Why a search produced no page.
///
/// Everything except [`SearchError::StoreUnavailable`] is the caller's fault
/// and is detected before the store is touched.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("invalid page number '{0}'")]
    InvalidPageNumber(String),
    #[error("invalid page size '{0}'")]
    InvalidPageSize(String),
    #[error("invalid sort field '{0}'")]
    InvalidSortField(String),
    #[error("invalid sort direction '{0}'")]
    InvalidSortDirection(String),
    #[error("filter '{filter}' is not supported when searching {entity}s")]
    UnsupportedFilter {
        filter: &'static str,
        entity: &'static str,
    },
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StorageError),
}

impl SearchError {
    /// True when the request itself was invalid.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::StoreUnavailable(_))
    }

    /// HTTP status a handler should answer with.
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            503
        }
    }

    /// Short label for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidPageNumber(_) => "invalid_page_number",
            Self::InvalidPageSize(_) => "invalid_page_size",
            Self::InvalidSortField(_) => "invalid_sort_field",
            Self::InvalidSortDirection(_) => "invalid_sort_direction",
            Self::UnsupportedFilter { .. } => "unsupported_filter",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl From<PageRequestError> for SearchError {
    fn from(err: PageRequestError) -> Self {
        match err {
            PageRequestError::InvalidPageNumber(raw) => Self::InvalidPageNumber(raw),
            PageRequestError::InvalidPageSize(raw) => Self::InvalidPageSize(raw),
        }
    }
}

impl From<SortError> for SearchError {
    fn from(err: SortError) -> Self {
        match err {
            SortError::MissingField(raw) => Self::InvalidSortField(raw),
            SortError::InvalidDirection(raw) => Self::InvalidSortDirection(raw),
            SortError::UnknownField(field) | SortError::UnsortableField(field) => {
                Self::InvalidSortField(field)
            }
        }
    }
}
