//! Pagination parameters for the submission list

use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{api_success_with_meta, ApiResponse, PaginationInfo, ResponseMetadata};

pub const DEFAULT_PAGE_SIZE: u32 = 25;
pub const MAX_PAGE_SIZE: u32 = 100;

/// `?page=2&pageSize=50`. Out-of-range values are clamped, never rejected.
#[derive(Debug, Deserialize, IntoParams, Clone, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    #[param(example = 1, minimum = 1)]
    pub page: Option<u32>,

    #[serde(alias = "page_size")]
    #[param(example = 25, minimum = 1, maximum = 100)]
    pub page_size: Option<u32>,
}

impl PaginationParams {
    /// Get the page number (defaults to 1, minimum 1)
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get the page size (defaults to 25, clamped between 1 and 100)
    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page()) - 1) * i64::from(self.page_size())
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size())
    }

    /// Calculate total pages given a total count
    pub fn total_pages(&self, total_count: i64) -> u32 {
        if total_count <= 0 {
            return 1;
        }
        let size = i64::from(self.page_size());
        u32::try_from((total_count + size - 1) / size).unwrap_or(u32::MAX)
    }

    /// Create response metadata with pagination info
    pub fn to_metadata(&self, total_count: i64) -> ResponseMetadata {
        let total_pages = self.total_pages(total_count);

        ResponseMetadata {
            pagination: Some(PaginationInfo {
                page: self.page(),
                page_size: self.page_size(),
                total_pages,
                has_next: self.page() < total_pages,
                has_previous: self.page() > 1,
            }),
            total_count: Some(total_count),
        }
    }

    /// Wrap data with pagination metadata
    pub fn wrap_response<T>(&self, data: T, total_count: i64) -> ApiResponse<T> {
        api_success_with_meta(data, self.to_metadata(total_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<u32>, page_size: Option<u32>) -> PaginationParams {
        PaginationParams { page, page_size }
    }

    #[test]
    fn test_pagination_defaults() {
        let params = params(None, None);
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), 25);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        assert_eq!(params(Some(0), Some(0)).page(), 1);
        assert_eq!(params(Some(0), Some(0)).page_size(), 1);
        assert_eq!(params(None, Some(500)).page_size(), 100);
    }

    #[test]
    fn test_pagination_offset() {
        assert_eq!(params(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn test_total_pages() {
        let params = params(Some(1), Some(25));
        assert_eq!(params.total_pages(0), 1);
        assert_eq!(params.total_pages(25), 1);
        assert_eq!(params.total_pages(26), 2);
    }

    #[test]
    fn test_metadata_flags() {
        let meta = params(Some(2), Some(10)).to_metadata(35);
        let pagination = meta.pagination.unwrap();
        assert_eq!(pagination.total_pages, 4);
        assert!(pagination.has_next);
        assert!(pagination.has_previous);
    }
}
