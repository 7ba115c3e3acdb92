#![forbid(unsafe_code)]

use super::*;
use crate::filter::FilterCategory;
use crate::ids::AdvisorId;
use crate::memory::MemoryDirectory;
use crate::pagination::PageWindow;
use crate::query::FilterSpec;
use async_trait::async_trait;
use std::collections::{BTreeSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

fn user() -> UserId {
    UserId::try_new("user-1").unwrap()
}

fn id(value: &str) -> AdvisorId {
    AdvisorId::try_new(value).unwrap()
}

fn advisor(key: &str, first: &str, last: &str, province: &str) -> Advisor {
    let mut advisor = Advisor::new(id(key));
    advisor.first_name = Some(first.to_string());
    advisor.last_name = Some(last.to_string());
    advisor.province = Some(province.to_string());
    advisor
}

fn numbered(prefix: &str, count: usize, province: &str) -> Vec<Advisor> {
    (0..count)
        .map(|i| {
            advisor(
                &format!("{prefix}-{i:04}"),
                &format!("First{i:04}"),
                "Doe",
                province,
            )
        })
        .collect()
}

/// Delegates to a [`MemoryDirectory`] while counting store calls and
/// optionally failing selected operations.
#[derive(Default)]
struct Probe {
    inner: MemoryDirectory,
    calls: AtomicUsize,
    fail_count: AtomicBool,
    fail_pages: AtomicBool,
    fail_membership: AtomicBool,
}

impl Probe {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn transport_error() -> DataAccessError {
        DataAccessError::Transport("connection reset".to_string())
    }
}

#[async_trait]
impl DataAccess for Probe {
    async fn count_matching(&self, filter: &FilterSpec) -> Result<u64, DataAccessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_count.load(Ordering::SeqCst) {
            return Err(Self::transport_error());
        }
        self.inner.count_matching(filter).await
    }

    async fn fetch_page(
        &self,
        filter: &FilterSpec,
        sort: &SortSpec,
        window: PageWindow,
    ) -> Result<Vec<Advisor>, DataAccessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_pages.load(Ordering::SeqCst) {
            return Err(Self::transport_error());
        }
        self.inner.fetch_page(filter, sort, window).await
    }

    async fn resolve_favorite_advisor_ids(
        &self,
        user: &UserId,
        list_names: &BTreeSet<String>,
    ) -> Result<BTreeSet<AdvisorId>, DataAccessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_membership.load(Ordering::SeqCst) {
            return Err(Self::transport_error());
        }
        self.inner.resolve_favorite_advisor_ids(user, list_names).await
    }

    async fn resolve_report_advisor_ids(
        &self,
        user: &UserId,
        report_names: &BTreeSet<String>,
    ) -> Result<BTreeSet<AdvisorId>, DataAccessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_membership.load(Ordering::SeqCst) {
            return Err(Self::transport_error());
        }
        self.inner.resolve_report_advisor_ids(user, report_names).await
    }
}

/// Replays canned responses and records the windows it was asked for.
#[derive(Default)]
struct Scripted {
    count: u64,
    pages: Mutex<VecDeque<Vec<Advisor>>>,
    windows: Mutex<Vec<PageWindow>>,
}

#[async_trait]
impl DataAccess for Scripted {
    async fn count_matching(&self, _filter: &FilterSpec) -> Result<u64, DataAccessError> {
        Ok(self.count)
    }

    async fn fetch_page(
        &self,
        _filter: &FilterSpec,
        _sort: &SortSpec,
        window: PageWindow,
    ) -> Result<Vec<Advisor>, DataAccessError> {
        self.windows.lock().unwrap().push(window);
        Ok(self.pages.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn resolve_favorite_advisor_ids(
        &self,
        _user: &UserId,
        _list_names: &BTreeSet<String>,
    ) -> Result<BTreeSet<AdvisorId>, DataAccessError> {
        Ok(BTreeSet::new())
    }

    async fn resolve_report_advisor_ids(
        &self,
        _user: &UserId,
        _report_names: &BTreeSet<String>,
    ) -> Result<BTreeSet<AdvisorId>, DataAccessError> {
        Ok(BTreeSet::new())
    }
}

async fn drain<A: DataAccess + ?Sized>(session: &mut BrowseSession, access: &A) -> usize {
    let mut pages = 0;
    while let PageOutcome::Applied { .. } = session.request_next_page(access).await {
        pages += 1;
        assert!(pages < 1_000, "pagination never exhausted");
    }
    pages
}

#[tokio::test]
async fn ontario_scenario_pages_forty_then_short_hundred() {
    let access = Scripted {
        count: 125,
        pages: Mutex::new(VecDeque::from(vec![
            numbered("on", 40, "Ontario"),
            numbered("on2", 45, "Ontario"),
        ])),
        windows: Mutex::new(Vec::new()),
    };
    let mut session = BrowseSession::new(user());
    session
        .apply_filters(
            &access,
            FilterState::default().with(FilterCategory::Province, ["Ontario"]),
        )
        .await;

    let first = session.refresh(&access).await;
    assert_eq!(
        first,
        PageOutcome::Applied {
            received: 40,
            state: CursorState::Idle
        }
    );
    let second = session.request_next_page(&access).await;
    assert_eq!(
        second,
        PageOutcome::Applied {
            received: 45,
            state: CursorState::Exhausted
        }
    );

    assert_eq!(session.displayed_count(), 85);
    assert_eq!(session.total_count(), Some(125));
    assert!(!session.has_more());
    assert_eq!(
        session.request_next_page(&access).await,
        PageOutcome::NotRequested
    );
    assert_eq!(
        *access.windows.lock().unwrap(),
        vec![
            PageWindow { start: 0, end: 39 },
            PageWindow {
                start: 40,
                end: 139
            }
        ]
    );
}

#[tokio::test]
async fn count_matches_rows_enumerated_until_exhaustion() {
    let access = MemoryDirectory::new();
    access.insert_advisors(numbered("on", 140, "Ontario")).await;
    access.insert_advisors(numbered("qc", 263, "Quebec")).await;
    access
        .insert_advisors(vec![advisor("x-1", "Anna", "Lee", "Alberta")])
        .await;

    let cases = [
        (FilterState::default(), ""),
        (
            FilterState::default().with(FilterCategory::Province, ["Ontario"]),
            "",
        ),
        (
            FilterState::default().with(FilterCategory::Province, ["Quebec", "Alberta"]),
            "",
        ),
        (FilterState::default(), "first00"),
        (
            FilterState::default().with(FilterCategory::Province, ["Nunavut"]),
            "",
        ),
    ];

    for (filters, search) in cases {
        let mut session = BrowseSession::new(user());
        session.apply_filters(&access, filters).await;
        session.set_search_term(search);
        let total = session.refresh_count(&access).await.unwrap();
        drain(&mut session, &access).await;
        assert_eq!(session.displayed_count() as u64, total, "search={search:?}");
        assert!(!session.has_more());
    }
}

#[tokio::test]
async fn exact_multiple_of_window_needs_one_empty_page_to_exhaust() {
    let access = MemoryDirectory::new();
    access.insert_advisors(numbered("on", 140, "Ontario")).await;

    let mut session = BrowseSession::new(user());
    let pages = drain(&mut session, &access).await;
    assert_eq!(pages, 3);
    assert_eq!(session.displayed_count(), 140);
    assert_eq!(session.cursor_state(), CursorState::Exhausted);
}

#[tokio::test]
async fn search_without_matches_exhausts_on_first_page() {
    let access = MemoryDirectory::new();
    access
        .insert_advisors(vec![
            advisor("a", "Bob", "Smith", "Ontario"),
            advisor("b", "Eve", "Stone", "Quebec"),
        ])
        .await;

    let mut session = BrowseSession::new(user());
    session.set_search_term("an");
    let outcome = session.refresh(&access).await;

    assert_eq!(session.total_count(), Some(0));
    assert_eq!(
        outcome,
        PageOutcome::Applied {
            received: 0,
            state: CursorState::Exhausted
        }
    );
    assert!(session.results().is_empty());
}

#[tokio::test]
async fn empty_favorite_list_yields_nothing_without_querying_rows() {
    let probe = Probe::default();
    probe
        .inner
        .insert_advisors(numbered("on", 10, "Ontario"))
        .await;
    probe
        .inner
        .add_favorite_list(&user(), "Empty", Vec::<AdvisorId>::new())
        .await;

    let mut session = BrowseSession::new(user());
    session
        .apply_filters(
            &probe,
            FilterState::default().with(FilterCategory::FavoriteList, ["Empty"]),
        )
        .await;
    assert_eq!(probe.calls(), 1);
    assert!(session.query().filter.is_nothing());

    let outcome = session.refresh(&probe).await;
    assert_eq!(outcome, PageOutcome::NotRequested);
    assert_eq!(session.total_count(), Some(0));
    assert_eq!(session.cursor_state(), CursorState::Exhausted);
    assert_eq!(probe.calls(), 1);
}

#[tokio::test]
async fn stale_favorite_list_name_fails_closed() {
    let probe = Probe::default();
    probe.inner.insert_advisors(numbered("on", 5, "Ontario")).await;

    let mut session = BrowseSession::new(user());
    session
        .apply_filters(
            &probe,
            FilterState::default().with(FilterCategory::FavoriteList, ["Deleted list"]),
        )
        .await;

    assert!(session.query().filter.is_nothing());
    assert_eq!(session.refresh_count(&probe).await, Some(0));
}

#[tokio::test]
async fn favorite_lists_scope_to_the_session_user() {
    let access = MemoryDirectory::new();
    access.insert_advisors(numbered("on", 5, "Ontario")).await;
    let other = UserId::try_new("user-2").unwrap();
    access
        .add_favorite_list(&other, "Hot", vec![id("on-0000")])
        .await;
    access
        .add_favorite_list(&user(), "Hot", vec![id("on-0001"), id("on-0002")])
        .await;
    access
        .add_favorite_list(&user(), "Warm", vec![id("on-0002"), id("on-0003")])
        .await;

    let mut session = BrowseSession::new(user());
    session
        .apply_filters(
            &access,
            FilterState::default().with(FilterCategory::FavoriteList, ["Hot", "Warm"]),
        )
        .await;
    session.refresh(&access).await;

    let ids = session
        .results()
        .iter()
        .map(|a| a.id.as_str().to_string())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["on-0001", "on-0002", "on-0003"]);
    assert_eq!(session.total_count(), Some(3));
}

#[tokio::test]
async fn report_membership_keeps_deleted_advisors_without_error() {
    let access = MemoryDirectory::new();
    access
        .insert_advisors(vec![
            advisor("A", "Alice", "Ng", "Ontario"),
            advisor("B", "Bruno", "Ortiz", "Ontario"),
            advisor("C", "Chen", "Li", "Quebec"),
            advisor("D", "Dana", "Roy", "Alberta"),
            advisor("E", "Emil", "Berg", "Alberta"),
        ])
        .await;
    access
        .add_report(&user(), "Q1 Leads", vec![id("A"), id("B"), id("C"), id("D")])
        .await;
    assert!(access.remove_advisor(&id("B")).await);

    let mut session = BrowseSession::new(user());
    session
        .apply_filters(
            &access,
            FilterState::default().with(FilterCategory::Report, ["Q1 Leads"]),
        )
        .await;

    let resolved = session.membership().reports.ids().unwrap();
    assert!(resolved.contains(&id("B")));
    assert_eq!(resolved.len(), 4);

    let outcome = session.refresh(&access).await;
    assert_eq!(
        outcome,
        PageOutcome::Applied {
            received: 3,
            state: CursorState::Exhausted
        }
    );
    assert_eq!(session.total_count(), Some(3));
}

#[tokio::test]
async fn favorites_and_reports_intersect() {
    let access = MemoryDirectory::new();
    access.insert_advisors(numbered("on", 6, "Ontario")).await;
    access
        .add_favorite_list(&user(), "Hot", vec![id("on-0000"), id("on-0001"), id("on-0002")])
        .await;
    access
        .add_report(&user(), "Q1", vec![id("on-0002"), id("on-0003")])
        .await;

    let mut session = BrowseSession::new(user());
    session
        .apply_filters(
            &access,
            FilterState::default()
                .with(FilterCategory::FavoriteList, ["Hot"])
                .with(FilterCategory::Report, ["Q1"]),
        )
        .await;
    session.refresh(&access).await;

    assert_eq!(session.displayed_count(), 1);
    assert_eq!(session.results()[0].id, id("on-0002"));
}

#[tokio::test]
async fn sort_and_filter_changes_reset_before_the_next_fetch() {
    let access = MemoryDirectory::new();
    access.insert_advisors(numbered("on", 60, "Ontario")).await;

    let mut session = BrowseSession::new(user());
    session.refresh(&access).await;
    assert_eq!(session.displayed_count(), 40);
    let before = session.lineage();

    assert!(session.set_sort(AdvisorColumn::LastName, SortDirection::Desc));
    assert!(session.results().is_empty());
    assert_eq!(session.cursor_state(), CursorState::Empty);
    assert_eq!(session.total_count(), None);
    assert!(session.lineage() > before);

    assert!(!session.set_sort(AdvisorColumn::LastName, SortDirection::Desc));

    session.refresh(&access).await;
    assert_eq!(session.displayed_count(), 40);
    session
        .apply_filters(
            &access,
            FilterState::default().with(FilterCategory::City, ["Toronto"]),
        )
        .await;
    assert!(session.results().is_empty());
    assert_eq!(session.cursor_state(), CursorState::Empty);
}

#[tokio::test]
async fn stale_page_response_is_discarded() {
    let access = MemoryDirectory::new();
    access.insert_advisors(numbered("on", 60, "Ontario")).await;

    let mut session = BrowseSession::new(user());
    let ticket = session.begin_page().unwrap();
    assert!(session.is_fetching());
    assert!(session.begin_page().is_none());

    let rows = access
        .fetch_page(&ticket.query().filter, &ticket.query().sort, ticket.window())
        .await;

    session.set_search_term("First001");
    assert_eq!(session.finish_page(ticket, rows), PageOutcome::Stale);
    assert!(session.results().is_empty());
    assert_eq!(session.cursor_state(), CursorState::Empty);

    let count_ticket = session.begin_count().unwrap();
    session.set_search_term("First002");
    assert!(!session.finish_count(count_ticket, Ok(99)));
    assert_eq!(session.total_count(), None);

    session.refresh(&access).await;
    assert_eq!(session.displayed_count(), 10);
}

fn replay(ticket: &PageTicket, window: PageWindow) -> PageTicket {
    PageTicket {
        lineage: ticket.lineage,
        window,
        query: ticket.query.clone(),
    }
}

#[tokio::test]
async fn settling_a_window_twice_appends_nothing() {
    let access = MemoryDirectory::new();
    access.insert_advisors(numbered("on", 10, "Ontario")).await;

    let mut session = BrowseSession::new(user());
    let ticket = session.begin_page().unwrap();
    let replayed = replay(&ticket, ticket.window());
    let rows = access
        .fetch_page(&ticket.query().filter, &ticket.query().sort, ticket.window())
        .await;

    assert_eq!(
        session.finish_page(ticket, rows.clone()),
        PageOutcome::Applied {
            received: 10,
            state: CursorState::Exhausted
        }
    );
    assert_eq!(session.finish_page(replayed, rows), PageOutcome::Stale);
    assert_eq!(session.displayed_count(), 10);
    assert_eq!(session.cursor_state(), CursorState::Exhausted);
}

#[tokio::test]
async fn earlier_window_cannot_settle_the_one_in_flight() {
    let access = MemoryDirectory::new();
    access.insert_advisors(numbered("on", 60, "Ontario")).await;

    let mut session = BrowseSession::new(user());
    let first = session.begin_page().unwrap();
    let first_window = first.window();
    let rows = access
        .fetch_page(&first.query().filter, &first.query().sort, first_window)
        .await;
    session.finish_page(first, rows.clone());
    assert_eq!(session.displayed_count(), 40);

    let second = session.begin_page().unwrap();
    let late = replay(&second, first_window);
    assert_eq!(session.finish_page(late, rows), PageOutcome::Stale);
    assert_eq!(session.displayed_count(), 40);
    assert!(session.is_fetching());

    let rows = access
        .fetch_page(&second.query().filter, &second.query().sort, second.window())
        .await;
    assert_eq!(
        session.finish_page(second, rows),
        PageOutcome::Applied {
            received: 20,
            state: CursorState::Exhausted
        }
    );
    let unique: BTreeSet<&str> = session.results().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(unique.len(), 60);
}

#[test]
fn blank_search_terms_are_interchangeable() {
    let mut session = BrowseSession::new(user());
    let lineage = session.lineage();
    assert!(!session.set_search_term("   "));
    assert!(!session.set_search_term(""));
    assert_eq!(session.lineage(), lineage);

    assert!(session.set_search_term("an"));
    assert!(!session.set_search_term("an"));
    assert!(session.set_search_term(" "));
    assert!(session.lineage() > lineage);
}

#[tokio::test]
async fn failures_degrade_to_zero_and_exhaustion() {
    let probe = Probe::default();
    probe.inner.insert_advisors(numbered("on", 60, "Ontario")).await;
    probe.fail_count.store(true, Ordering::SeqCst);
    probe.fail_pages.store(true, Ordering::SeqCst);

    let mut session = BrowseSession::new(user());
    let outcome = session.refresh(&probe).await;
    assert_eq!(
        outcome,
        PageOutcome::Applied {
            received: 0,
            state: CursorState::Exhausted
        }
    );
    assert_eq!(session.total_count(), Some(0));
}

#[tokio::test]
async fn membership_failure_fails_closed() {
    let probe = Probe::default();
    probe.inner.insert_advisors(numbered("on", 5, "Ontario")).await;
    probe
        .inner
        .add_report(&user(), "Q1", vec![id("on-0000")])
        .await;
    probe.fail_membership.store(true, Ordering::SeqCst);

    let mut session = BrowseSession::new(user());
    session
        .apply_filters(
            &probe,
            FilterState::default().with(FilterCategory::Report, ["Q1"]),
        )
        .await;

    assert_eq!(
        session.membership().reports.ids().map(BTreeSet::len),
        Some(0)
    );
    session.refresh(&probe).await;
    assert_eq!(session.total_count(), Some(0));
    assert!(session.results().is_empty());
}

#[tokio::test]
async fn scroll_near_end_fetches_only_when_idle() {
    let access = MemoryDirectory::new();
    access.insert_advisors(numbered("on", 200, "Ontario")).await;
    let near = ScrollProximity {
        scroll_top: 950.0,
        scroll_height: 1000.0,
        client_height: 50.0,
    };
    let far = ScrollProximity {
        scroll_top: 0.0,
        scroll_height: 1000.0,
        client_height: 50.0,
    };

    let mut session = BrowseSession::new(user());
    session.refresh(&access).await;
    assert_eq!(
        session.fetch_more_if_near_end(&access, far).await,
        PageOutcome::NotRequested
    );
    let outcome = session.fetch_more_if_near_end(&access, near).await;
    assert_eq!(
        outcome,
        PageOutcome::Applied {
            received: 100,
            state: CursorState::Idle
        }
    );
    assert_eq!(session.displayed_count(), 140);
}

#[tokio::test]
async fn descending_sort_puts_missing_values_first() {
    let access = MemoryDirectory::new();
    let mut missing = advisor("m", "Zed", "Null", "Ontario");
    missing.last_name = None;
    access
        .insert_advisors(vec![
            advisor("a", "Ann", "Adams", "Ontario"),
            advisor("c", "Cal", "Cole", "Ontario"),
            missing,
        ])
        .await;

    let mut session = BrowseSession::new(user());
    session.set_sort(AdvisorColumn::LastName, SortDirection::Desc);
    session.refresh(&access).await;
    let order = session
        .results()
        .iter()
        .map(|a| a.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["m", "c", "a"]);

    session.set_sort(AdvisorColumn::LastName, SortDirection::Asc);
    session.refresh(&access).await;
    let order = session
        .results()
        .iter()
        .map(|a| a.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["a", "c", "m"]);
}

#[tokio::test]
async fn report_draft_requires_applied_filters() {
    let access = MemoryDirectory::new();
    access
        .insert_advisors(vec![
            advisor("a", "Anna", "Lee", "Ontario"),
            advisor("b", "Brian", "Kay", "Ontario"),
            advisor("c", "Carl", "Moe", "Quebec"),
        ])
        .await;

    let mut session = BrowseSession::new(user());
    session.refresh(&access).await;
    assert!(session.report_draft("All", None).is_none());

    session.set_search_term("an");
    session.refresh(&access).await;
    let draft = session
        .report_draft("Has an", Some("names with an".to_string()))
        .unwrap();
    assert_eq!(draft.advisor_ids, vec![id("a"), id("b")]);
    assert_eq!(draft.search.as_str(), "an");
}

#[test]
fn toggle_sort_flips_or_switches_field() {
    let mut session = BrowseSession::new(user());
    assert_eq!(session.sort(), SortSpec::default());

    session.toggle_sort(AdvisorColumn::FirstName);
    assert_eq!(session.sort().direction, SortDirection::Desc);

    session.toggle_sort(AdvisorColumn::Firm);
    assert_eq!(
        session.sort(),
        SortSpec::new(AdvisorColumn::Firm, SortDirection::Asc)
    );
}
