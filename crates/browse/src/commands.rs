#![forbid(unsafe_code)]

use crate::output::{
    favorite_list_json, print_json, report_json, report_page_json, session_json,
};
use adv_core::{
    Advisor, AdvisorColumn, AdvisorId, BrowseSession, FilterCategory, FilterState, PageOutcome,
    SortDirection, SortSpec, UserId,
};
use adv_storage::{CreateFavoriteListRequest, ReportPageRequest, SharedStore};
use anyhow::{Context, anyhow, bail};
use clap::Args;
use serde_json::json;
use std::path::Path;
use tracing::info;

#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    #[arg(long)]
    pub province: Vec<String>,
    #[arg(long)]
    pub city: Vec<String>,
    #[arg(long)]
    pub firm: Vec<String>,
    #[arg(long)]
    pub branch: Vec<String>,
    #[arg(long)]
    pub team: Vec<String>,
    /// Name of one of your favorite lists.
    #[arg(long = "favorite-list")]
    pub favorite_list: Vec<String>,
    /// Name of one of your saved reports.
    #[arg(long)]
    pub report: Vec<String>,
    /// Case-insensitive substring of the first or last name.
    #[arg(long)]
    pub search: Option<String>,
    #[command(flatten)]
    pub sort: SortArgs,
}

#[derive(Args, Debug, Default, Clone)]
pub struct SortArgs {
    /// Column to sort by, e.g. `last_name`.
    #[arg(long, value_parser = parse_column)]
    pub sort: Option<AdvisorColumn>,
    #[arg(long)]
    pub desc: bool,
}

impl SortArgs {
    pub fn spec(&self) -> SortSpec {
        let direction = if self.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        SortSpec::new(self.sort.unwrap_or(AdvisorColumn::FirstName), direction)
    }
}

fn parse_column(value: &str) -> Result<AdvisorColumn, String> {
    AdvisorColumn::parse(value).ok_or_else(|| {
        let known: Vec<&str> = AdvisorColumn::ALL.iter().map(|c| c.as_sql_name()).collect();
        format!("unknown column `{value}` (expected one of {})", known.join(", "))
    })
}

impl FilterArgs {
    pub fn filter_state(&self) -> FilterState {
        [
            (FilterCategory::Province, &self.province),
            (FilterCategory::City, &self.city),
            (FilterCategory::Firm, &self.firm),
            (FilterCategory::Branch, &self.branch),
            (FilterCategory::Team, &self.team),
            (FilterCategory::FavoriteList, &self.favorite_list),
            (FilterCategory::Report, &self.report),
        ]
        .into_iter()
        .fold(FilterState::default(), |state, (category, values)| {
            state.with(category, values.iter().cloned())
        })
    }
}

pub fn import(store: &SharedStore, path: &Path) -> anyhow::Result<()> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let advisors: Vec<Advisor> = serde_json::from_str(&content)
        .with_context(|| format!("parsing advisors from {}", path.display()))?;
    let written = store.with_store(|inner| inner.upsert_advisors(&advisors))?;
    info!(count = written, path = %path.display(), "imported advisors");
    print_json(&json!({ "imported": written }))
}

pub fn options(store: &SharedStore) -> anyhow::Result<()> {
    let options = store.with_store(|inner| inner.filter_options())?;
    print_json(&serde_json::to_value(options)?)
}

/// Runs a session over the store and fetches up to `pages` pages.
pub async fn run_session(
    store: &SharedStore,
    user: &UserId,
    args: &FilterArgs,
    pages: u64,
) -> BrowseSession {
    let mut session = BrowseSession::new(user.clone());
    session.apply_filters(store, args.filter_state()).await;
    if let Some(search) = &args.search {
        session.set_search_term(search.clone());
    }
    let sort = args.sort.spec();
    session.set_sort(sort.field, sort.direction);

    let mut outcome = session.refresh(store).await;
    let mut fetched = 1;
    while fetched < pages && matches!(outcome, PageOutcome::Applied { .. }) {
        outcome = session.request_next_page(store).await;
        fetched += 1;
    }
    session
}

pub async fn browse(
    store: &SharedStore,
    user: &UserId,
    args: &FilterArgs,
    pages: u64,
) -> anyhow::Result<()> {
    let session = run_session(store, user, args, pages).await;
    print_json(&session_json(&session))
}

pub fn lists(store: &SharedStore, user: &UserId) -> anyhow::Result<()> {
    let lists = store.with_store(|inner| inner.list_favorite_lists(user))?;
    print_json(&json!(lists.iter().map(favorite_list_json).collect::<Vec<_>>()))
}

pub fn list_create(
    store: &SharedStore,
    user: &UserId,
    name: &str,
    description: Option<String>,
) -> anyhow::Result<()> {
    let list = store.with_store(|inner| {
        inner.create_favorite_list(CreateFavoriteListRequest {
            user_id: user.clone(),
            name: name.to_string(),
            description,
        })
    })?;
    print_json(&favorite_list_json(&list))
}

pub fn list_add(
    store: &SharedStore,
    user: &UserId,
    list_name: &str,
    advisor_ids: &[String],
) -> anyhow::Result<()> {
    let ids = advisor_ids
        .iter()
        .map(|raw| AdvisorId::try_new(raw.as_str()).map_err(|err| anyhow!("{raw}: {err}")))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let added = store.with_store(|inner| {
        let Some(list_id) = inner.find_favorite_list(user, list_name)? else {
            return Err(adv_storage::StoreError::UnknownName(list_name.to_string()));
        };
        let mut added = 0usize;
        for id in &ids {
            if inner.add_favorite(user, &list_id, id)? {
                added += 1;
            }
        }
        Ok(added)
    })?;
    print_json(&json!({ "list": list_name, "added": added }))
}

pub fn reports(store: &SharedStore, user: &UserId) -> anyhow::Result<()> {
    let reports = store.with_store(|inner| inner.list_reports(user))?;
    print_json(&json!(reports.iter().map(report_json).collect::<Vec<_>>()))
}

pub async fn report_save(
    store: &SharedStore,
    user: &UserId,
    name: &str,
    description: Option<String>,
    args: &FilterArgs,
    pages: u64,
) -> anyhow::Result<()> {
    let session = run_session(store, user, args, pages).await;
    let Some(draft) = session.report_draft(name, description) else {
        bail!("report-save needs at least one filter or a search term");
    };
    let report = store.with_store(|inner| inner.create_report(user, draft))?;
    info!(report = %report.id, advisors = report.advisor_ids.len(), "saved report");
    print_json(&report_json(&report))
}

pub fn report_show(
    store: &SharedStore,
    user: &UserId,
    name: &str,
    page: usize,
    sort: &SortArgs,
) -> anyhow::Result<()> {
    let report_page = store.with_store(|inner| {
        let Some(report_id) = inner.find_report(user, name)? else {
            return Err(adv_storage::StoreError::UnknownName(name.to_string()));
        };
        inner.report_page(ReportPageRequest {
            user_id: user.clone(),
            report_id,
            page,
            sort: sort.spec(),
        })
    })?;
    print_json(&report_page_json(name, &report_page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use adv_storage::SqliteStore;

    fn store() -> SharedStore {
        let mut advisors = Vec::new();
        for (key, first, city) in [
            ("a1", "Jane", "Toronto"),
            ("a2", "John", "Ottawa"),
            ("a3", "Anne", "Toronto"),
        ] {
            let mut advisor = Advisor::new(AdvisorId::try_new(key).unwrap());
            advisor.first_name = Some(first.to_string());
            advisor.city = Some(city.to_string());
            advisors.push(advisor);
        }
        let mut inner = SqliteStore::open_in_memory().unwrap();
        inner.upsert_advisors(&advisors).unwrap();
        SharedStore::new(inner)
    }

    #[test]
    fn filter_args_drop_blank_values() {
        let args = FilterArgs {
            city: vec!["Toronto".to_string(), "  ".to_string()],
            ..FilterArgs::default()
        };
        let state = args.filter_state();
        assert_eq!(state.selections(FilterCategory::City).len(), 1);
        assert!(state.selections(FilterCategory::Province).is_empty());
    }

    #[test]
    fn unknown_sort_columns_are_rejected() {
        assert_eq!(parse_column("Last_Name"), Ok(AdvisorColumn::LastName));
        assert!(parse_column("salary").is_err());
    }

    #[tokio::test]
    async fn session_applies_filters_search_and_sort() {
        let store = store();
        let args = FilterArgs {
            city: vec!["Toronto".to_string()],
            sort: SortArgs {
                sort: Some(AdvisorColumn::FirstName),
                desc: true,
            },
            ..FilterArgs::default()
        };
        let user = UserId::try_new("alice").unwrap();
        let session = run_session(&store, &user, &args, 3).await;
        let ids: Vec<&str> = session.results().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a3"]);
        assert_eq!(session.total_count(), Some(2));
    }

    #[tokio::test]
    async fn report_save_requires_a_narrowing_filter() {
        let store = store();
        let user = UserId::try_new("alice").unwrap();
        let err = report_save(&store, &user, "All", None, &FilterArgs::default(), 1)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("needs at least one filter"));
    }
}
