#![forbid(unsafe_code)]

use adv_core::{Advisor, BrowseSession, FavoriteList, Report};
use adv_storage::ReportPage;
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn ts_ms_to_rfc3339(ts_ms: i64) -> String {
    let nanos = i128::from(ts_ms) * 1_000_000;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

pub fn advisors_json(rows: &[Advisor]) -> Value {
    Value::Array(
        rows.iter()
            .map(|row| serde_json::to_value(row).unwrap_or(Value::Null))
            .collect(),
    )
}

pub fn session_json(session: &BrowseSession) -> Value {
    json!({
        "user_id": session.user().as_str(),
        "sort": session.sort(),
        "search": session.search().as_str(),
        "total_count": session.total_count(),
        "displayed": session.displayed_count(),
        "state": session.cursor_state().as_str(),
        "has_more": session.has_more(),
        "advisors": advisors_json(session.results()),
    })
}

pub fn favorite_list_json(list: &FavoriteList) -> Value {
    json!({
        "id": list.id.as_str(),
        "name": list.name,
        "description": list.description,
        "advisor_count": list.advisor_count,
        "created_at": ts_ms_to_rfc3339(list.created_at_ms),
    })
}

pub fn report_json(report: &Report) -> Value {
    json!({
        "id": report.id.as_str(),
        "name": report.name,
        "description": report.description,
        "advisor_count": report.advisor_ids.len(),
        "filters": report.filters,
        "search": report.search.as_str(),
        "created_at": ts_ms_to_rfc3339(report.created_at_ms),
    })
}

pub fn report_page_json(name: &str, page: &ReportPage) -> Value {
    json!({
        "report_id": page.report_id.as_str(),
        "name": name,
        "page": page.page,
        "total_pages": page.total_pages,
        "total_count": page.total_count,
        "advisors": advisors_json(&page.advisors),
    })
}
