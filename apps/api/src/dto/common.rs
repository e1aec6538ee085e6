use serde::{Deserialize, Serialize};
use ts_rs::TS;
use turnstile_domain::{CatalogQuery, Page};

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Search and paging parameters shared by every catalog listing.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/page-query.ts"
)]
pub struct PageQuery {
    pub search: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl From<PageQuery> for CatalogQuery {
    fn from(value: PageQuery) -> Self {
        CatalogQuery::new(value.search, value.page, value.page_size)
    }
}

/// One page of a catalog listing.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/page-response.ts"
)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T, U> From<Page<T>> for PageResponse<U>
where
    U: From<T>,
{
    fn from(value: Page<T>) -> Self {
        Self {
            items: value.items.into_iter().map(U::from).collect(),
            page: value.page,
            page_size: value.page_size,
            total_items: value.total_items,
            total_pages: value.total_pages,
        }
    }
}
