#![forbid(unsafe_code)]

use super::{FilterSpec, Predicate, SortSpec};
use crate::filter::{FilterCategory, FilterState, SearchTerm};
use crate::membership::{Membership, ResolvedMembership};
use crate::model::Advisor;

/// A composed query: the filter shared by the count and page queries plus the
/// sort applied to pages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuerySpec {
    pub filter: FilterSpec,
    pub sort: SortSpec,
}

impl QuerySpec {
    pub fn matches(&self, advisor: &Advisor) -> bool {
        self.filter.matches(advisor)
    }
}

pub struct QueryComposer;

impl QueryComposer {
    /// Builds the predicate set in a fixed order: search, the five column
    /// categories, favorites, reports.
    pub fn compose(
        filters: &FilterState,
        search: &SearchTerm,
        membership: &ResolvedMembership,
        sort: SortSpec,
    ) -> QuerySpec {
        QuerySpec {
            filter: Self::compose_filter(filters, search, membership),
            sort,
        }
    }

    pub fn compose_filter(
        filters: &FilterState,
        search: &SearchTerm,
        membership: &ResolvedMembership,
    ) -> FilterSpec {
        let mut predicates = Vec::new();

        if let Some(needle) = search.needle() {
            predicates.push(Predicate::NameContains(needle.to_string()));
        }

        for category in FilterCategory::ALL {
            let Some(column) = category.column() else {
                continue;
            };
            let values = filters.selections(category);
            if values.is_empty() {
                continue;
            }
            predicates.push(Predicate::ColumnIn {
                column,
                values: values.clone(),
            });
        }

        let membership_filters = [
            (FilterCategory::FavoriteList, &membership.favorites),
            (FilterCategory::Report, &membership.reports),
        ];
        for (category, resolved) in membership_filters {
            if !filters.is_selected(category) {
                continue;
            }
            match resolved {
                // Selected but never resolved: fail closed.
                Membership::Unfiltered => return FilterSpec::Nothing,
                Membership::Ids(ids) if ids.is_empty() => return FilterSpec::Nothing,
                Membership::Ids(ids) => predicates.push(Predicate::IdIn(ids.clone())),
            }
        }

        FilterSpec::Match(predicates)
    }
}
