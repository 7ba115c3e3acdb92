#![forbid(unsafe_code)]

use super::*;
use adv_core::{FavoriteList, FavoriteListId, UserId};
use rusqlite::types::Value as SqlValue;
use rusqlite::{OptionalExtension, params, params_from_iter};
use std::collections::BTreeSet;

impl SqliteStore {
    pub fn create_favorite_list(
        &mut self,
        request: CreateFavoriteListRequest,
    ) -> Result<FavoriteList, StoreError> {
        let name = normalize_name(&request.name)?;
        let description = request
            .description
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let id = FavoriteListId::try_new(uuid::Uuid::new_v4().to_string())
            .map_err(|_| StoreError::InvalidInput("invalid favorite list id"))?;
        let now = now_ms();

        self.conn
            .execute(
                "INSERT INTO favorite_lists(id, user_id, name, description, created_at_ms, updated_at_ms) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![id.as_str(), request.user_id.as_str(), name, description, now],
            )
            .map_err(map_insert_conflict)?;

        tracing::debug!(list = %id, user = %request.user_id, "created favorite list");
        Ok(FavoriteList {
            id,
            user_id: request.user_id,
            name,
            description,
            advisor_count: 0,
            created_at_ms: now,
        })
    }

    /// The user's favorite lists with member counts, newest first.
    pub fn list_favorite_lists(&self, user: &UserId) -> Result<Vec<FavoriteList>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT l.id, l.name, l.description, l.created_at_ms, COUNT(i.advisor_id) \
             FROM favorite_lists l \
             LEFT JOIN favorite_list_items i ON i.favorite_list_id = l.id \
             WHERE l.user_id = ?1 \
             GROUP BY l.id \
             ORDER BY l.created_at_ms DESC, l.name ASC",
        )?;
        let mut rows = stmt.query(params![user.as_str()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let raw_id: String = row.get(0)?;
            out.push(FavoriteList {
                id: FavoriteListId::try_new(raw_id)
                    .map_err(|_| StoreError::InvalidInput("invalid favorite list id"))?,
                user_id: user.clone(),
                name: row.get(1)?,
                description: row.get(2)?,
                created_at_ms: row.get(3)?,
                advisor_count: to_u64(row.get(4)?),
            });
        }
        Ok(out)
    }

    /// Looks a list up by name within the user's lists.
    pub fn find_favorite_list(
        &self,
        user: &UserId,
        name: &str,
    ) -> Result<Option<FavoriteListId>, StoreError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM favorite_lists WHERE user_id = ?1 AND name = ?2",
                params![user.as_str(), name.trim()],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|value| {
            FavoriteListId::try_new(value)
                .map_err(|_| StoreError::InvalidInput("invalid favorite list id"))
        })
        .transpose()
    }

    /// Adds an advisor to one of the user's lists. Adding twice is a no-op.
    pub fn add_favorite(
        &mut self,
        user: &UserId,
        list_id: &FavoriteListId,
        advisor_id: &AdvisorId,
    ) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;
        ensure_list_owned_tx(&tx, user, list_id)?;
        let advisor_exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM advisors WHERE id = ?1",
                params![advisor_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if advisor_exists.is_none() {
            return Err(StoreError::UnknownId);
        }
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO favorite_list_items(favorite_list_id, advisor_id, added_at_ms) \
             VALUES (?1, ?2, ?3)",
            params![list_id.as_str(), advisor_id.as_str(), now_ms()],
        )?;
        tx.commit()?;
        Ok(inserted > 0)
    }

    pub fn remove_favorite(
        &mut self,
        user: &UserId,
        list_id: &FavoriteListId,
        advisor_id: &AdvisorId,
    ) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;
        ensure_list_owned_tx(&tx, user, list_id)?;
        let removed = tx.execute(
            "DELETE FROM favorite_list_items WHERE favorite_list_id = ?1 AND advisor_id = ?2",
            params![list_id.as_str(), advisor_id.as_str()],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    pub fn delete_favorite_list(
        &mut self,
        user: &UserId,
        list_id: &FavoriteListId,
    ) -> Result<(), StoreError> {
        let deleted = self.conn.execute(
            "DELETE FROM favorite_lists WHERE id = ?1 AND user_id = ?2",
            params![list_id.as_str(), user.as_str()],
        )?;
        if deleted == 0 {
            return Err(StoreError::UnknownId);
        }
        Ok(())
    }

    /// Members of one list, ordered by `sort`.
    pub fn favorite_list_advisors(
        &self,
        request: FavoriteListAdvisorsRequest,
    ) -> Result<Vec<Advisor>, StoreError> {
        let owner: Option<String> = self
            .conn
            .query_row(
                "SELECT user_id FROM favorite_lists WHERE id = ?1",
                params![request.list_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if owner.as_deref() != Some(request.user_id.as_str()) {
            return Err(StoreError::UnknownId);
        }

        let mut sql = format!(
            "SELECT {ADVISOR_COLUMNS} FROM advisors \
             WHERE id IN (SELECT advisor_id FROM favorite_list_items WHERE favorite_list_id = ?)"
        );
        super::sql::push_order_by(&mut sql, &request.sort);
        self.query_advisors(&sql, vec![SqlValue::Text(request.list_id.into_string())])
    }

    /// Union of the members of the user's lists named in `names`. Fails with
    /// `UnknownName` when none of the names exists for the user.
    pub fn favorite_advisor_ids(
        &self,
        user: &UserId,
        names: &BTreeSet<String>,
    ) -> Result<BTreeSet<AdvisorId>, StoreError> {
        if names.is_empty() {
            return Ok(BTreeSet::new());
        }
        let mut params = vec![SqlValue::Text(user.as_str().to_string())];
        let placeholders = name_placeholders(&mut params, names);

        let list_sql = format!(
            "SELECT COUNT(*) FROM favorite_lists WHERE user_id = ? AND name IN ({placeholders})"
        );
        let found: i64 =
            self.conn
                .query_row(&list_sql, params_from_iter(params.iter()), |row| row.get(0))?;
        if found == 0 {
            return Err(StoreError::UnknownName(joined(names)));
        }

        let sql = format!(
            "SELECT DISTINCT i.advisor_id FROM favorite_list_items i \
             JOIN favorite_lists l ON l.id = i.favorite_list_id \
             WHERE l.user_id = ? AND l.name IN ({placeholders})"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(params))?;
        let mut out = BTreeSet::new();
        while let Some(row) = rows.next()? {
            let raw: String = row.get(0)?;
            out.insert(
                AdvisorId::try_new(raw)
                    .map_err(|_| StoreError::InvalidInput("invalid advisor id"))?,
            );
        }
        Ok(out)
    }
}

fn ensure_list_owned_tx(
    tx: &rusqlite::Transaction<'_>,
    user: &UserId,
    list_id: &FavoriteListId,
) -> Result<(), StoreError> {
    let owned: Option<i64> = tx
        .query_row(
            "SELECT 1 FROM favorite_lists WHERE id = ?1 AND user_id = ?2",
            params![list_id.as_str(), user.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    if owned.is_none() {
        return Err(StoreError::UnknownId);
    }
    Ok(())
}

pub(super) fn name_placeholders(params: &mut Vec<SqlValue>, names: &BTreeSet<String>) -> String {
    let mut placeholders = String::new();
    for (idx, name) in names.iter().enumerate() {
        if idx > 0 {
            placeholders.push_str(", ");
        }
        placeholders.push('?');
        params.push(SqlValue::Text(name.clone()));
    }
    placeholders
}

pub(super) fn joined(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(", ")
}
