// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword set owned by the admin seam; read-only to the monitor.
//!
//! Uniqueness is enforced under the normalized form, so "еж" and "ёж" are
//! the same keyword.

use rusqlite::params;

use tgrelay_core::{RelayError, text};

use crate::database::Database;
use crate::models::KeywordRow;

/// Add a keyword. Returns `true` if inserted, `false` if an equivalent
/// keyword (under normalization) already exists.
pub async fn keyword_add(db: &Database, keyword: &str) -> Result<bool, RelayError> {
    let keyword = keyword.trim().to_string();
    if keyword.is_empty() {
        return Err(RelayError::Internal("keyword is empty".into()));
    }
    let normalized = text::normalize(&keyword);

    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO keywords (keyword, keyword_normalized) VALUES (?1, ?2)",
                params![keyword, normalized],
            )?;
            Ok(inserted == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete a keyword by id. Returns `true` when a row was removed.
pub async fn keyword_delete(db: &Database, id: i64) -> Result<bool, RelayError> {
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM keywords WHERE id = ?1", params![id])?;
            Ok(deleted == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List keywords, optionally filtered by a normalized substring.
pub async fn keyword_list(db: &Database, query: Option<&str>) -> Result<Vec<KeywordRow>, RelayError> {
    let query = query
        .map(text::normalize)
        .filter(|q| !q.is_empty());
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, keyword, created_at FROM keywords
                 WHERE ?1 IS NULL OR instr(keyword_normalized, ?1) > 0
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt.query_map(params![query], |row| {
                Ok(KeywordRow {
                    id: row.get(0)?,
                    keyword: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?;
            let mut keywords = Vec::new();
            for row in rows {
                keywords.push(row?);
            }
            Ok(keywords)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All keywords in normalized form, for the dispatcher's matcher.
pub async fn keywords_all_normalized(db: &Database) -> Result<Vec<String>, RelayError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT keyword_normalized FROM keywords ORDER BY id ASC")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            let mut keywords = Vec::new();
            for row in rows {
                keywords.push(row?);
            }
            Ok(keywords)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn add_is_idempotent_under_normalization() {
        let (db, _dir) = setup_db().await;

        assert!(keyword_add(&db, "Ёжик").await.unwrap());
        // Same keyword after case-fold and yo-fold.
        assert!(!keyword_add(&db, "ЕЖИК").await.unwrap());

        let all = keywords_all_normalized(&db).await.unwrap();
        assert_eq!(all, vec!["ежик".to_string()]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn empty_keyword_is_rejected() {
        let (db, _dir) = setup_db().await;
        assert!(keyword_add(&db, "   ").await.is_err());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_filters_by_normalized_substring() {
        let (db, _dir) = setup_db().await;

        keyword_add(&db, "срочные новости").await.unwrap();
        keyword_add(&db, "погода").await.unwrap();

        let hits = keyword_list(&db, Some("НОВОСТИ")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].keyword, "срочные новости");

        let all = keyword_list(&db, None).await.unwrap();
        assert_eq!(all.len(), 2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_removes_only_the_given_id() {
        let (db, _dir) = setup_db().await;

        keyword_add(&db, "alpha").await.unwrap();
        keyword_add(&db, "beta").await.unwrap();
        let rows = keyword_list(&db, None).await.unwrap();
        let alpha_id = rows.iter().find(|r| r.keyword == "alpha").unwrap().id;

        assert!(keyword_delete(&db, alpha_id).await.unwrap());
        assert!(!keyword_delete(&db, alpha_id).await.unwrap());

        let remaining = keywords_all_normalized(&db).await.unwrap();
        assert_eq!(remaining, vec!["beta".to_string()]);
        db.close().await.unwrap();
    }
}
