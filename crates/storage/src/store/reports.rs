#![forbid(unsafe_code)]

use super::favorites::{joined, name_placeholders};
use super::*;
use adv_core::{FilterState, NewReport, Report, ReportId, SearchTerm, UserId};
use rusqlite::types::Value as SqlValue;
use rusqlite::{OptionalExtension, params, params_from_iter};
use std::collections::BTreeSet;

const REPORT_COLUMNS: &str =
    "id, user_id, name, description, advisor_ids_json, search_filters_json, search_text, created_at_ms";

impl SqliteStore {
    /// Saves a report. The advisor id list is stored as given and never
    /// re-derived from the filters.
    pub fn create_report(&mut self, user: &UserId, report: NewReport) -> Result<Report, StoreError> {
        let name = normalize_name(&report.name)?;
        let description = report
            .description
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let id = ReportId::try_new(uuid::Uuid::new_v4().to_string())
            .map_err(|_| StoreError::InvalidInput("invalid report id"))?;
        let now = now_ms();

        let ids_json = serde_json::to_string(&report.advisor_ids)?;
        let filters_json = serde_json::to_string(&report.filters)?;
        self.conn.execute(
            "INSERT INTO reports(id, user_id, name, description, advisor_ids_json, search_filters_json, \
             search_text, created_at_ms, updated_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                id.as_str(),
                user.as_str(),
                name,
                description,
                ids_json,
                filters_json,
                report.search.as_str(),
                now,
            ],
        )?;

        tracing::debug!(report = %id, advisors = report.advisor_ids.len(), "saved report");
        Ok(Report {
            id,
            user_id: user.clone(),
            name,
            description,
            advisor_ids: report.advisor_ids,
            filters: report.filters,
            search: report.search,
            created_at_ms: now,
        })
    }

    /// The user's reports, newest first.
    pub fn list_reports(&self, user: &UserId) -> Result<Vec<Report>, StoreError> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE user_id = ?1 \
             ORDER BY created_at_ms DESC, name ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![user.as_str()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(report_from_row(row)?);
        }
        Ok(out)
    }

    pub fn get_report(&self, user: &UserId, id: &ReportId) -> Result<Report, StoreError> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1 AND user_id = ?2");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![id.as_str(), user.as_str()])?;
        match rows.next()? {
            Some(row) => report_from_row(row),
            None => Err(StoreError::UnknownId),
        }
    }

    pub fn find_report(&self, user: &UserId, name: &str) -> Result<Option<ReportId>, StoreError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM reports WHERE user_id = ?1 AND name = ?2 \
                 ORDER BY created_at_ms DESC LIMIT 1",
                params![user.as_str(), name.trim()],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|value| {
            ReportId::try_new(value).map_err(|_| StoreError::InvalidInput("invalid report id"))
        })
        .transpose()
    }

    pub fn delete_report(&mut self, user: &UserId, id: &ReportId) -> Result<(), StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM reports WHERE id = ?1 AND user_id = ?2",
            params![id.as_str(), user.as_str()],
        )?;
        if deleted == 0 {
            return Err(StoreError::UnknownId);
        }
        Ok(())
    }

    /// Union of the stored id lists of the user's reports named in `names`.
    /// Fails with `UnknownName` when none of the names exists for the user.
    pub fn report_advisor_ids(
        &self,
        user: &UserId,
        names: &BTreeSet<String>,
    ) -> Result<BTreeSet<AdvisorId>, StoreError> {
        if names.is_empty() {
            return Ok(BTreeSet::new());
        }
        let mut params = vec![SqlValue::Text(user.as_str().to_string())];
        let placeholders = name_placeholders(&mut params, names);
        let sql = format!(
            "SELECT advisor_ids_json FROM reports WHERE user_id = ? AND name IN ({placeholders})"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params))?;
        let mut found = false;
        let mut out = BTreeSet::new();
        while let Some(row) = rows.next()? {
            found = true;
            let raw: String = row.get(0)?;
            out.extend(decode_advisor_ids(&raw)?);
        }
        if !found {
            return Err(StoreError::UnknownName(joined(names)));
        }
        Ok(out)
    }

    /// One numbered page of a report: the page slice of the stored id list,
    /// fetched and ordered by `sort`. Ids of deleted advisors count toward
    /// `total_count` but yield no row.
    pub fn report_page(&self, request: ReportPageRequest) -> Result<ReportPage, StoreError> {
        if request.page == 0 {
            return Err(StoreError::InvalidInput("page must be >= 1"));
        }
        let report = self.get_report(&request.user_id, &request.report_id)?;
        let total_count = report.advisor_ids.len();
        let total_pages = total_count.div_ceil(REPORT_PAGE_SIZE);

        let start = (request.page - 1).saturating_mul(REPORT_PAGE_SIZE);
        let advisors = match report.advisor_ids.get(start..) {
            Some(rest) => {
                let slice = &rest[..rest.len().min(REPORT_PAGE_SIZE)];
                self.advisors_by_ids(slice, &request.sort)?
            }
            None => Vec::new(),
        };

        Ok(ReportPage {
            report_id: report.id,
            page: request.page,
            total_pages,
            total_count,
            advisors,
        })
    }
}

fn report_from_row(row: &rusqlite::Row<'_>) -> Result<Report, StoreError> {
    let raw_id: String = row.get(0)?;
    let raw_user: String = row.get(1)?;
    let ids_json: String = row.get(4)?;
    let filters_json: String = row.get(5)?;
    let search_text: String = row.get(6)?;
    Ok(Report {
        id: ReportId::try_new(raw_id).map_err(|_| StoreError::InvalidInput("invalid report id"))?,
        user_id: UserId::try_new(raw_user)
            .map_err(|_| StoreError::InvalidInput("invalid user id"))?,
        name: row.get(2)?,
        description: row.get(3)?,
        advisor_ids: decode_advisor_ids(&ids_json)?,
        filters: serde_json::from_str::<FilterState>(&filters_json)?,
        search: SearchTerm::new(search_text),
        created_at_ms: row.get(7)?,
    })
}

fn decode_advisor_ids(raw: &str) -> Result<Vec<AdvisorId>, StoreError> {
    Ok(serde_json::from_str(raw)?)
}
