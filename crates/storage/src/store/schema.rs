#![forbid(unsafe_code)]

use super::StoreError;
use rusqlite::{Connection, params};

const SCHEMA_VERSION: &str = "1";

const SQL: &str = r#"
        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS advisors (
          id TEXT PRIMARY KEY,
          first_name TEXT,
          last_name TEXT,
          title TEXT,
          firm TEXT,
          branch TEXT,
          team_name TEXT,
          city TEXT,
          province TEXT,
          email TEXT,
          linkedin_url TEXT,
          website_url TEXT,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS favorite_lists (
          id TEXT PRIMARY KEY,
          user_id TEXT NOT NULL,
          name TEXT NOT NULL,
          description TEXT,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          UNIQUE (user_id, name)
        );

        CREATE TABLE IF NOT EXISTS favorite_list_items (
          favorite_list_id TEXT NOT NULL REFERENCES favorite_lists(id) ON DELETE CASCADE,
          advisor_id TEXT NOT NULL REFERENCES advisors(id) ON DELETE CASCADE,
          added_at_ms INTEGER NOT NULL,
          PRIMARY KEY (favorite_list_id, advisor_id)
        );

        -- advisor_ids_json is a materialized snapshot; it is never rewritten
        -- when advisors are deleted.
        CREATE TABLE IF NOT EXISTS reports (
          id TEXT PRIMARY KEY,
          user_id TEXT NOT NULL,
          name TEXT NOT NULL,
          description TEXT,
          advisor_ids_json TEXT NOT NULL,
          search_filters_json TEXT NOT NULL,
          search_text TEXT NOT NULL DEFAULT '',
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_advisors_province ON advisors(province);
        CREATE INDEX IF NOT EXISTS idx_advisors_city ON advisors(city);
        CREATE INDEX IF NOT EXISTS idx_advisors_firm ON advisors(firm);
        CREATE INDEX IF NOT EXISTS idx_advisors_branch ON advisors(branch);
        CREATE INDEX IF NOT EXISTS idx_advisors_team_name ON advisors(team_name);
        CREATE INDEX IF NOT EXISTS idx_advisors_first_name ON advisors(first_name);
        CREATE INDEX IF NOT EXISTS idx_advisors_last_name ON advisors(last_name);
        CREATE INDEX IF NOT EXISTS idx_favorite_lists_user ON favorite_lists(user_id, name);
        CREATE INDEX IF NOT EXISTS idx_favorite_list_items_advisor ON favorite_list_items(advisor_id);
        CREATE INDEX IF NOT EXISTS idx_reports_user ON reports(user_id, name);
"#;

pub(super) fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", SCHEMA_VERSION],
    )?;
    Ok(())
}
