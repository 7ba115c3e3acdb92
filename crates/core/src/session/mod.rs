#![forbid(unsafe_code)]

mod ticket;

pub use ticket::*;

use crate::access::{DataAccess, DataAccessError};
use crate::accumulator::ResultAccumulator;
use crate::filter::{FilterState, SearchTerm, has_applied_filters};
use crate::ids::UserId;
use crate::membership::{MembershipResolver, ResolvedMembership};
use crate::model::{Advisor, AdvisorColumn, NewReport};
use crate::pagination::{CursorState, PaginationCursor, ScrollProximity};
use crate::query::{QueryComposer, QuerySpec, SortDirection, SortSpec};
use futures_util::future::join;
use tracing::{debug, warn};

/// Browsing state behind the advisors table: current filters, the composed
/// query, fetch progress, and the rows accumulated so far.
///
/// Single-owner. Fetches may be driven through the async helpers, or split
/// into `begin_*`/`finish_*` pairs when the caller interleaves completions
/// with other events; responses carrying an older [`Lineage`], or for a
/// window no longer in flight, are dropped.
#[derive(Debug)]
pub struct BrowseSession {
    user: UserId,
    filters: FilterState,
    search: SearchTerm,
    membership: ResolvedMembership,
    query: QuerySpec,
    cursor: PaginationCursor,
    results: ResultAccumulator,
    total_count: Option<u64>,
    lineage: Lineage,
}

impl BrowseSession {
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            filters: FilterState::default(),
            search: SearchTerm::default(),
            membership: ResolvedMembership::default(),
            query: QuerySpec::default(),
            cursor: PaginationCursor::new(),
            results: ResultAccumulator::new(),
            total_count: None,
            lineage: Lineage::default(),
        }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn search(&self) -> &SearchTerm {
        &self.search
    }

    pub fn sort(&self) -> SortSpec {
        self.query.sort
    }

    pub fn query(&self) -> &QuerySpec {
        &self.query
    }

    pub fn membership(&self) -> &ResolvedMembership {
        &self.membership
    }

    pub fn results(&self) -> &[Advisor] {
        self.results.rows()
    }

    pub fn displayed_count(&self) -> usize {
        self.results.len()
    }

    /// `None` until the first count for the current lineage arrives.
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn cursor_state(&self) -> CursorState {
        self.cursor.state()
    }

    pub fn has_more(&self) -> bool {
        self.cursor.has_more()
    }

    pub fn is_fetching(&self) -> bool {
        self.cursor.is_fetching()
    }

    pub fn lineage(&self) -> Lineage {
        self.lineage
    }

    pub fn has_applied_filters(&self) -> bool {
        has_applied_filters(&self.filters, &self.search)
    }

    /// Replaces the filter snapshot. Membership selections are re-resolved
    /// for the session user and the result set is reset, even when the
    /// snapshot is unchanged, since list and report contents may have moved.
    pub async fn apply_filters<A>(&mut self, access: &A, filters: FilterState)
    where
        A: DataAccess + ?Sized,
    {
        self.membership = MembershipResolver::resolve(access, &self.user, &filters).await;
        self.filters = filters;
        self.recompose(self.query.sort);
    }

    /// Returns whether the effective term changed (and the result set was
    /// reset). Blank terms are all equivalent.
    pub fn set_search_term(&mut self, text: impl Into<String>) -> bool {
        let search = SearchTerm::new(text);
        if search.needle() == self.search.needle() {
            return false;
        }
        self.search = search;
        self.recompose(self.query.sort);
        true
    }

    /// Returns whether the sort changed (and the result set was reset).
    pub fn set_sort(&mut self, field: AdvisorColumn, direction: SortDirection) -> bool {
        let sort = SortSpec::new(field, direction);
        if sort == self.query.sort {
            return false;
        }
        self.recompose(sort);
        true
    }

    /// Column-header click semantics, see [`SortSpec::toggle`].
    pub fn toggle_sort(&mut self, field: AdvisorColumn) {
        let sort = self.query.sort.toggle(field);
        self.recompose(sort);
    }

    fn recompose(&mut self, sort: SortSpec) {
        self.query = QueryComposer::compose(&self.filters, &self.search, &self.membership, sort);
        self.reset();
    }

    fn reset(&mut self) {
        self.cursor.reset();
        self.results.reset();
        self.total_count = None;
        self.lineage = self.lineage.next();
        debug!(
            lineage = self.lineage.get(),
            predicates = self.query.filter.predicates().len(),
            nothing = self.query.filter.is_nothing(),
            sort = self.query.sort.field.as_sql_name(),
            direction = self.query.sort.direction.as_sql(),
            "browse session reset"
        );
    }

    /// Claims the next window for the current lineage.
    ///
    /// A query short-circuited to zero rows exhausts the cursor on the spot
    /// and returns `None` without touching the store.
    pub fn begin_page(&mut self) -> Option<PageTicket> {
        let window = self.cursor.begin()?;
        if self.query.filter.is_nothing() {
            self.cursor.complete(0);
            return None;
        }
        debug!(
            lineage = self.lineage.get(),
            start = window.start,
            end = window.end,
            "page requested"
        );
        Some(PageTicket {
            lineage: self.lineage,
            window,
            query: self.query.clone(),
        })
    }

    /// Applies a page response. Failures count as an empty page, which
    /// exhausts the cursor.
    pub fn finish_page(
        &mut self,
        ticket: PageTicket,
        outcome: Result<Vec<Advisor>, DataAccessError>,
    ) -> PageOutcome {
        if ticket.lineage != self.lineage {
            debug!(
                ticket = ticket.lineage.get(),
                current = self.lineage.get(),
                start = ticket.window.start,
                "stale page response dropped"
            );
            return PageOutcome::Stale;
        }
        if self.cursor.in_flight() != Some(ticket.window) {
            debug!(
                lineage = ticket.lineage.get(),
                start = ticket.window.start,
                in_flight = ?self.cursor.in_flight(),
                "page response without a matching window in flight dropped"
            );
            return PageOutcome::Stale;
        }

        let mut rows = outcome.unwrap_or_else(|err| {
            warn!(
                lineage = ticket.lineage.get(),
                start = ticket.window.start,
                code = err.code(),
                error = %err,
                "page fetch failed; treating as empty page"
            );
            Vec::new()
        });

        let window_len = usize::try_from(ticket.window.len()).unwrap_or(usize::MAX);
        if rows.len() > window_len {
            warn!(
                received = rows.len(),
                requested = window_len,
                "store returned more rows than requested; truncating"
            );
            rows.truncate(window_len);
        }

        let received = rows.len();
        self.results.append(rows);
        let state = self.cursor.complete(received);
        PageOutcome::Applied { received, state }
    }

    /// Issues a count request, or settles the count at zero when the query
    /// is short-circuited.
    pub fn begin_count(&mut self) -> Option<CountTicket> {
        if self.query.filter.is_nothing() {
            self.total_count = Some(0);
            return None;
        }
        Some(CountTicket {
            lineage: self.lineage,
            query: self.query.clone(),
        })
    }

    /// Applies a count response. Returns `false` when it was stale. Failures
    /// degrade to zero.
    pub fn finish_count(
        &mut self,
        ticket: CountTicket,
        outcome: Result<u64, DataAccessError>,
    ) -> bool {
        if ticket.lineage != self.lineage {
            debug!(
                ticket = ticket.lineage.get(),
                current = self.lineage.get(),
                "stale count response dropped"
            );
            return false;
        }
        let count = outcome.unwrap_or_else(|err| {
            warn!(
                lineage = ticket.lineage.get(),
                code = err.code(),
                error = %err,
                "count failed; reporting zero"
            );
            0
        });
        self.total_count = Some(count);
        true
    }

    pub async fn request_next_page<A>(&mut self, access: &A) -> PageOutcome
    where
        A: DataAccess + ?Sized,
    {
        let Some(ticket) = self.begin_page() else {
            return PageOutcome::NotRequested;
        };
        let outcome = access
            .fetch_page(&ticket.query.filter, &ticket.query.sort, ticket.window)
            .await;
        self.finish_page(ticket, outcome)
    }

    pub async fn refresh_count<A>(&mut self, access: &A) -> Option<u64>
    where
        A: DataAccess + ?Sized,
    {
        if let Some(ticket) = self.begin_count() {
            let outcome = access.count_matching(&ticket.query.filter).await;
            self.finish_count(ticket, outcome);
        }
        self.total_count
    }

    /// Issues the count and the next page together; the two are independent
    /// and may complete in either order.
    pub async fn refresh<A>(&mut self, access: &A) -> PageOutcome
    where
        A: DataAccess + ?Sized,
    {
        let count_ticket = self.begin_count();
        let page_ticket = self.begin_page();

        let count = async {
            match &count_ticket {
                Some(ticket) => Some(access.count_matching(&ticket.query.filter).await),
                None => None,
            }
        };
        let page = async {
            match &page_ticket {
                Some(ticket) => Some(
                    access
                        .fetch_page(&ticket.query.filter, &ticket.query.sort, ticket.window)
                        .await,
                ),
                None => None,
            }
        };
        let (count, page) = join(count, page).await;

        if let (Some(ticket), Some(outcome)) = (count_ticket, count) {
            self.finish_count(ticket, outcome);
        }
        match (page_ticket, page) {
            (Some(ticket), Some(outcome)) => self.finish_page(ticket, outcome),
            _ => PageOutcome::NotRequested,
        }
    }

    /// Scroll handler: fetches the next page once the viewport nears the end
    /// and nothing is already in flight.
    pub async fn fetch_more_if_near_end<A>(
        &mut self,
        access: &A,
        proximity: ScrollProximity,
    ) -> PageOutcome
    where
        A: DataAccess + ?Sized,
    {
        if !proximity.is_near_end() || !self.has_more() || self.is_fetching() {
            return PageOutcome::NotRequested;
        }
        self.request_next_page(access).await
    }

    /// Draft of a report materializing the rows accumulated so far, or `None`
    /// when nothing narrows the directory.
    pub fn report_draft(
        &self,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Option<NewReport> {
        if !self.has_applied_filters() {
            return None;
        }
        Some(NewReport {
            name: name.into(),
            description,
            filters: self.filters.clone(),
            search: self.search.clone(),
            advisor_ids: self.results.advisor_ids(),
        })
    }
}

#[cfg(test)]
mod tests;
