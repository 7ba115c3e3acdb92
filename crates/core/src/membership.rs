#![forbid(unsafe_code)]

use crate::access::{DataAccess, DataAccessError};
use crate::filter::{FilterCategory, FilterState};
use crate::ids::{AdvisorId, UserId};
use futures_util::future::join;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Outcome of resolving one indirect category.
///
/// `Ids` with an empty set is a terminal "no results" signal and is never the
/// same as `Unfiltered`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Membership {
    #[default]
    Unfiltered,
    Ids(BTreeSet<AdvisorId>),
}

impl Membership {
    pub fn ids(&self) -> Option<&BTreeSet<AdvisorId>> {
        match self {
            Self::Unfiltered => None,
            Self::Ids(ids) => Some(ids),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedMembership {
    pub favorites: Membership,
    pub reports: Membership,
}

pub struct MembershipResolver;

impl MembershipResolver {
    /// Resolves favorite-list and report selections into advisor id sets.
    /// Only categories with selections reach the store; the two lookups run
    /// concurrently. Lookup failures fail closed to an empty set.
    pub async fn resolve<A>(access: &A, user: &UserId, filters: &FilterState) -> ResolvedMembership
    where
        A: DataAccess + ?Sized,
    {
        let favorites = async {
            let names = filters.selections(FilterCategory::FavoriteList);
            if names.is_empty() {
                return Membership::Unfiltered;
            }
            let outcome = access.resolve_favorite_advisor_ids(user, names).await;
            fail_closed(FilterCategory::FavoriteList, outcome)
        };
        let reports = async {
            let names = filters.selections(FilterCategory::Report);
            if names.is_empty() {
                return Membership::Unfiltered;
            }
            let outcome = access.resolve_report_advisor_ids(user, names).await;
            fail_closed(FilterCategory::Report, outcome)
        };

        let (favorites, reports) = join(favorites, reports).await;
        ResolvedMembership { favorites, reports }
    }
}

fn fail_closed(
    category: FilterCategory,
    outcome: Result<BTreeSet<AdvisorId>, DataAccessError>,
) -> Membership {
    match outcome {
        Ok(ids) => {
            debug!(category = category.as_str(), members = ids.len(), "membership resolved");
            Membership::Ids(ids)
        }
        Err(err @ DataAccessError::InvalidFilter(_)) => {
            debug!(category = category.as_str(), error = %err, "stale membership selection");
            Membership::Ids(BTreeSet::new())
        }
        Err(err) => {
            warn!(
                category = category.as_str(),
                code = err.code(),
                error = %err,
                "membership lookup failed; treating selection as empty"
            );
            Membership::Ids(BTreeSet::new())
        }
    }
}
