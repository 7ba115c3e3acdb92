#![forbid(unsafe_code)]

use crate::filter::{FilterState, SearchTerm};
use crate::ids::{AdvisorId, FavoriteListId, ReportId, UserId};
use serde::{Deserialize, Serialize};

/// A read-only row of the advisors directory.
///
/// Every attribute is optional; `None` (absent) is distinct from `Some("")`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisor {
    pub id: AdvisorId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub firm: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
}

impl Advisor {
    pub fn new(id: AdvisorId) -> Self {
        Self {
            id,
            first_name: None,
            last_name: None,
            title: None,
            firm: None,
            branch: None,
            team_name: None,
            city: None,
            province: None,
            email: None,
            linkedin_url: None,
            website_url: None,
        }
    }

    pub fn column(&self, column: AdvisorColumn) -> Option<&str> {
        let value = match column {
            AdvisorColumn::FirstName => &self.first_name,
            AdvisorColumn::LastName => &self.last_name,
            AdvisorColumn::Title => &self.title,
            AdvisorColumn::Firm => &self.firm,
            AdvisorColumn::Branch => &self.branch,
            AdvisorColumn::TeamName => &self.team_name,
            AdvisorColumn::City => &self.city,
            AdvisorColumn::Province => &self.province,
        };
        value.as_deref()
    }
}

/// Text columns of the advisors table that can be filtered or sorted on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisorColumn {
    FirstName,
    LastName,
    Title,
    Firm,
    Branch,
    TeamName,
    City,
    Province,
}

impl AdvisorColumn {
    pub const ALL: [AdvisorColumn; 8] = [
        AdvisorColumn::FirstName,
        AdvisorColumn::LastName,
        AdvisorColumn::Title,
        AdvisorColumn::Firm,
        AdvisorColumn::Branch,
        AdvisorColumn::TeamName,
        AdvisorColumn::City,
        AdvisorColumn::Province,
    ];

    pub fn as_sql_name(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Title => "title",
            Self::Firm => "firm",
            Self::Branch => "branch",
            Self::TeamName => "team_name",
            Self::City => "city",
            Self::Province => "province",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_sql_name().eq_ignore_ascii_case(value))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteList {
    pub id: FavoriteListId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub advisor_count: u64,
    pub created_at_ms: i64,
}

/// A saved report: a fixed, ordered snapshot of advisor ids plus the filters
/// that produced it. The filters are provenance only and never re-evaluated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub advisor_ids: Vec<AdvisorId>,
    pub filters: FilterState,
    pub search: SearchTerm,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReport {
    pub name: String,
    pub description: Option<String>,
    pub filters: FilterState,
    pub search: SearchTerm,
    pub advisor_ids: Vec<AdvisorId>,
}

/// Distinct non-null values per filter category, sorted ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub provinces: Vec<String>,
    pub cities: Vec<String>,
    pub firms: Vec<String>,
    pub branches: Vec<String>,
    pub teams: Vec<String>,
}
