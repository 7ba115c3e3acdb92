#![forbid(unsafe_code)]

use super::sql::{push_order_by, push_where_clause};
use super::*;
use adv_core::{FilterOptions, FilterSpec, PageWindow, SortSpec};
use rusqlite::types::Value as SqlValue;
use rusqlite::{OptionalExtension, params, params_from_iter};

impl SqliteStore {
    /// Inserts or replaces advisors by id. Returns the number of rows written.
    pub fn upsert_advisors(&mut self, advisors: &[Advisor]) -> Result<usize, StoreError> {
        let now = now_ms();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO advisors(id, first_name, last_name, title, firm, branch, team_name, city, province, \
                 email, linkedin_url, website_url, created_at_ms, updated_at_ms) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13) \
                 ON CONFLICT(id) DO UPDATE SET \
                   first_name = excluded.first_name, last_name = excluded.last_name, \
                   title = excluded.title, firm = excluded.firm, branch = excluded.branch, \
                   team_name = excluded.team_name, city = excluded.city, province = excluded.province, \
                   email = excluded.email, linkedin_url = excluded.linkedin_url, \
                   website_url = excluded.website_url, updated_at_ms = excluded.updated_at_ms",
            )?;
            for advisor in advisors {
                stmt.execute(params![
                    advisor.id.as_str(),
                    advisor.first_name,
                    advisor.last_name,
                    advisor.title,
                    advisor.firm,
                    advisor.branch,
                    advisor.team_name,
                    advisor.city,
                    advisor.province,
                    advisor.email,
                    advisor.linkedin_url,
                    advisor.website_url,
                    now,
                ])?;
            }
        }
        tx.commit()?;
        Ok(advisors.len())
    }

    /// Removes an advisor and its favorite-list memberships. Report snapshots
    /// keep the id.
    pub fn delete_advisor(&mut self, id: &AdvisorId) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM advisors WHERE id = ?1", params![id.as_str()])?;
        if deleted == 0 {
            return Err(StoreError::UnknownId);
        }
        Ok(())
    }

    pub fn get_advisor(&self, id: &AdvisorId) -> Result<Option<Advisor>, StoreError> {
        let sql = format!("SELECT {ADVISOR_COLUMNS} FROM advisors WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![id.as_str()])?;
        match rows.next()? {
            Some(row) => Ok(Some(advisor_from_row(row)?)),
            None => Ok(None),
        }
    }

    pub fn count_matching(&self, filter: &FilterSpec) -> Result<u64, StoreError> {
        let mut sql = String::from("SELECT COUNT(*) FROM advisors");
        let mut params = Vec::<SqlValue>::new();
        push_where_clause(&mut sql, &mut params, filter)?;

        let count: Option<i64> = self
            .conn
            .query_row(&sql, params_from_iter(params), |row| row.get(0))
            .optional()?;
        Ok(count.map(to_u64).unwrap_or(0))
    }

    pub fn fetch_page(
        &self,
        filter: &FilterSpec,
        sort: &SortSpec,
        window: PageWindow,
    ) -> Result<Vec<Advisor>, StoreError> {
        let mut sql = format!("SELECT {ADVISOR_COLUMNS} FROM advisors");
        let mut params = Vec::<SqlValue>::new();
        push_where_clause(&mut sql, &mut params, filter)?;
        push_order_by(&mut sql, sort);
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(SqlValue::Integer(to_sqlite_i64(window.limit())?));
        params.push(SqlValue::Integer(to_sqlite_i64(window.offset())?));

        self.query_advisors(&sql, params)
    }

    /// Advisors whose ids are in `ids`, ordered by `sort`. Ids with no row are
    /// skipped.
    pub fn advisors_by_ids(
        &self,
        ids: &[AdvisorId],
        sort: &SortSpec,
    ) -> Result<Vec<Advisor>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        let mut sql = format!(
            "SELECT {ADVISOR_COLUMNS} FROM advisors WHERE id IN (SELECT value FROM json_each(?))"
        );
        push_order_by(&mut sql, sort);
        self.query_advisors(&sql, vec![SqlValue::Text(serde_json::to_string(&raw)?)])
    }

    /// Distinct non-blank values per filter category, sorted ascending.
    pub fn filter_options(&self) -> Result<FilterOptions, StoreError> {
        Ok(FilterOptions {
            provinces: self.distinct_values("province")?,
            cities: self.distinct_values("city")?,
            firms: self.distinct_values("firm")?,
            branches: self.distinct_values("branch")?,
            teams: self.distinct_values("team_name")?,
        })
    }

    fn distinct_values(&self, column: &'static str) -> Result<Vec<String>, StoreError> {
        let sql = format!(
            "SELECT DISTINCT {column} FROM advisors \
             WHERE {column} IS NOT NULL AND TRIM({column}) <> '' \
             ORDER BY {column} ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(row.get::<_, String>(0)?);
        }
        Ok(out)
    }

    pub(super) fn query_advisors(
        &self,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> Result<Vec<Advisor>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(params))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(advisor_from_row(row)?);
        }
        Ok(out)
    }
}
