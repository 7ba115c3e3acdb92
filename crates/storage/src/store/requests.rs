#![forbid(unsafe_code)]

use adv_core::{Advisor, FavoriteListId, ReportId, SortSpec, UserId};

/// Rows shown per numbered page of a saved report.
pub const REPORT_PAGE_SIZE: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateFavoriteListRequest {
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportPageRequest {
    pub user_id: UserId,
    pub report_id: ReportId,
    /// 1-based page number.
    pub page: usize,
    pub sort: SortSpec,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportPage {
    pub report_id: ReportId,
    pub page: usize,
    pub total_pages: usize,
    /// Length of the materialized id list, deleted advisors included.
    pub total_count: usize,
    pub advisors: Vec<Advisor>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FavoriteListAdvisorsRequest {
    pub user_id: UserId,
    pub list_id: FavoriteListId,
    pub sort: SortSpec,
}
