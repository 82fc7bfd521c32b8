//! Paging query parameters and the paged response envelope.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 50;

#[derive(Debug, Clone, Copy, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-based)
    #[serde(default = "default_page_index")]
    #[validate(range(min = 1, message = "Page index must be at least 1"))]
    #[param(minimum = 1, example = 1)]
    pub page_index: i64,

    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 50, message = "Page size must be between 1 and 50"))]
    #[param(minimum = 1, maximum = 50, example = 6)]
    pub page_size: i64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page_index: default_page_index(),
            page_size: default_page_size(),
        }
    }
}

impl PaginationParams {
    /// Row offset for the requested page.
    pub fn offset(&self) -> i64 {
        (self.page_index.max(1) - 1).saturating_mul(self.limit())
    }

    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

fn default_page_index() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// `{pageIndex, pageSize, count, data}` where `count` is the total across
/// all pages.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    #[schema(example = 1)]
    pub page_index: i64,
    #[schema(example = 6)]
    pub page_size: i64,
    #[schema(example = 18)]
    pub count: i64,
    pub data: Vec<T>,
}

impl<T> PagedResponse<T> {
    pub fn new(data: Vec<T>, params: &PaginationParams, count: i64) -> Self {
        Self {
            page_index: params.page_index,
            page_size: params.page_size,
            count,
            data,
        }
    }
}
