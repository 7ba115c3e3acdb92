#![forbid(unsafe_code)]

use crate::model::{Advisor, AdvisorColumn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCategory {
    Province,
    City,
    Firm,
    Branch,
    Team,
    FavoriteList,
    Report,
}

impl FilterCategory {
    pub const ALL: [FilterCategory; 7] = [
        FilterCategory::Province,
        FilterCategory::City,
        FilterCategory::Firm,
        FilterCategory::Branch,
        FilterCategory::Team,
        FilterCategory::FavoriteList,
        FilterCategory::Report,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Province => "province",
            Self::City => "city",
            Self::Firm => "firm",
            Self::Branch => "branch",
            Self::Team => "team",
            Self::FavoriteList => "favorite_list",
            Self::Report => "report",
        }
    }

    /// The advisors column a direct category filters on. Membership
    /// categories (favorite lists, reports) have none and must be resolved
    /// into id sets first.
    pub fn column(self) -> Option<AdvisorColumn> {
        match self {
            Self::Province => Some(AdvisorColumn::Province),
            Self::City => Some(AdvisorColumn::City),
            Self::Firm => Some(AdvisorColumn::Firm),
            Self::Branch => Some(AdvisorColumn::Branch),
            Self::Team => Some(AdvisorColumn::TeamName),
            Self::FavoriteList | Self::Report => None,
        }
    }
}

/// Immutable snapshot of the selected values per category.
///
/// Values inside one category are OR'd, categories are AND'd, and an empty
/// category places no restriction. Updates always produce a new snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    provinces: BTreeSet<String>,
    cities: BTreeSet<String>,
    firms: BTreeSet<String>,
    branches: BTreeSet<String>,
    teams: BTreeSet<String>,
    favorite_lists: BTreeSet<String>,
    reports: BTreeSet<String>,
}

impl FilterState {
    pub fn with<I, S>(&self, category: FilterCategory, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.clone();
        *next.slot_mut(category) = values
            .into_iter()
            .map(Into::into)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect();
        next
    }

    pub fn without(&self, category: FilterCategory) -> Self {
        let mut next = self.clone();
        next.slot_mut(category).clear();
        next
    }

    pub fn selections(&self, category: FilterCategory) -> &BTreeSet<String> {
        match category {
            FilterCategory::Province => &self.provinces,
            FilterCategory::City => &self.cities,
            FilterCategory::Firm => &self.firms,
            FilterCategory::Branch => &self.branches,
            FilterCategory::Team => &self.teams,
            FilterCategory::FavoriteList => &self.favorite_lists,
            FilterCategory::Report => &self.reports,
        }
    }

    pub fn is_selected(&self, category: FilterCategory) -> bool {
        !self.selections(category).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        FilterCategory::ALL
            .iter()
            .all(|category| !self.is_selected(*category))
    }

    fn slot_mut(&mut self, category: FilterCategory) -> &mut BTreeSet<String> {
        match category {
            FilterCategory::Province => &mut self.provinces,
            FilterCategory::City => &mut self.cities,
            FilterCategory::Firm => &mut self.firms,
            FilterCategory::Branch => &mut self.branches,
            FilterCategory::Team => &mut self.teams,
            FilterCategory::FavoriteList => &mut self.favorite_lists,
            FilterCategory::Report => &mut self.reports,
        }
    }
}

/// Free-text search over first and last names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchTerm(String);

impl SearchTerm {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// The text to match, or `None` when the term places no restriction.
    /// Non-blank terms are matched as typed, surrounding whitespace included.
    pub fn needle(&self) -> Option<&str> {
        if self.is_blank() { None } else { Some(&self.0) }
    }

    pub fn matches_name(&self, advisor: &Advisor) -> bool {
        match self.needle() {
            None => true,
            Some(needle) => name_contains(advisor, needle),
        }
    }
}

pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub(crate) fn name_contains(advisor: &Advisor, needle: &str) -> bool {
    [&advisor.first_name, &advisor.last_name]
        .into_iter()
        .flatten()
        .any(|name| contains_ignore_case(name, needle))
}

/// Whether anything narrows the directory. Saving a report is only offered
/// when this holds.
pub fn has_applied_filters(filters: &FilterState, search: &SearchTerm) -> bool {
    !filters.is_empty() || !search.is_blank()
}
