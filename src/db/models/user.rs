//! User database operations

use chrono::{DateTime, Utc};
use rusqlite::Result as SqliteResult;
use serde_json::Value;
use uuid::Uuid;

use super::super::Database;
use crate::models::User;

impl Database {
    /// Upsert a user by identity-provider id, refreshing profile fields
    pub fn sync_user(
        &self,
        provider_id: &str,
        email: Option<&str>,
        wallet_address: Option<&str>,
        linked_accounts: Option<&Value>,
    ) -> SqliteResult<User> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let linked = linked_accounts.map(|v| v.to_string());

        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM users WHERE provider_id = ?1",
                [provider_id],
                |row| row.get(0),
            )
            .ok();

        let id = match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE users SET email = COALESCE(?1, email),
                        wallet_address = COALESCE(?2, wallet_address),
                        linked_accounts = COALESCE(?3, linked_accounts),
                        updated_at = ?4
                     WHERE id = ?5",
                    rusqlite::params![email, wallet_address, linked, &now, &id],
                )?;
                id
            }
            None => {
                let id = Uuid::new_v4().to_string();
                conn.execute(
                    "INSERT INTO users (id, provider_id, email, wallet_address, linked_accounts, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![&id, provider_id, email, wallet_address, linked, &now, &now],
                )?;
                id
            }
        };

        drop(conn);
        self.get_user(&id).map(|opt| opt.expect("user just written"))
    }

    pub fn get_user(&self, id: &str) -> SqliteResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, provider_id, email, wallet_address, linked_accounts, created_at, updated_at
             FROM users WHERE id = ?1",
        )?;
        let user = stmt.query_row([id], Self::row_to_user).ok();
        Ok(user)
    }

    pub fn get_user_by_provider_id(&self, provider_id: &str) -> SqliteResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, provider_id, email, wallet_address, linked_accounts, created_at, updated_at
             FROM users WHERE provider_id = ?1",
        )?;
        let user = stmt.query_row([provider_id], Self::row_to_user).ok();
        Ok(user)
    }

    /// Resolve the owning user of a chat (for prompt personalization)
    pub fn get_user_by_chat_id(&self, chat_id: &str) -> SqliteResult<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT u.id, u.provider_id, u.email, u.wallet_address, u.linked_accounts, u.created_at, u.updated_at
             FROM users u JOIN chats c ON c.user_id = u.id WHERE c.id = ?1",
        )?;
        let user = stmt.query_row([chat_id], Self::row_to_user).ok();
        Ok(user)
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let linked: Option<String> = row.get(4)?;
        let created_at: String = row.get(5)?;
        let updated_at: String = row.get(6)?;

        Ok(User {
            id: row.get(0)?,
            provider_id: row.get(1)?,
            email: row.get(2)?,
            wallet_address: row.get(3)?,
            linked_accounts: linked.and_then(|s| serde_json::from_str(&s).ok()),
            created_at: parse_rfc3339(&created_at),
            updated_at: parse_rfc3339(&updated_at),
        })
    }
}

/// Timestamps are written by this process as RFC3339; fall back to now on
/// rows imported from elsewhere.
pub(crate) fn parse_rfc3339(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use crate::db::sqlite::test_support::temp_db;
    use serde_json::json;

    #[test]
    fn sync_user_inserts_then_updates() {
        let (_dir, db) = temp_db();

        let user = db
            .sync_user("did:privy:abc", Some("a@b.io"), None, None)
            .unwrap();
        assert_eq!(user.provider_id, "did:privy:abc");
        assert_eq!(user.email.as_deref(), Some("a@b.io"));
        assert!(user.wallet_address.is_none());

        let updated = db
            .sync_user(
                "did:privy:abc",
                None,
                Some("0x1111111111111111111111111111111111111111"),
                Some(&json!([{"type": "wallet"}])),
            )
            .unwrap();
        // Same row, wallet filled in, email preserved
        assert_eq!(updated.id, user.id);
        assert_eq!(updated.email.as_deref(), Some("a@b.io"));
        assert_eq!(
            updated.wallet_address.as_deref(),
            Some("0x1111111111111111111111111111111111111111")
        );
        assert!(updated.linked_accounts.is_some());
    }

    #[test]
    fn get_user_by_chat_id_resolves_owner() {
        let (_dir, db) = temp_db();
        let user = db.sync_user("did:privy:xyz", None, None, None).unwrap();
        let chat = db.create_chat(&user.id, "balances").unwrap();

        let resolved = db.get_user_by_chat_id(&chat.id).unwrap().unwrap();
        assert_eq!(resolved.id, user.id);

        assert!(db.get_user_by_chat_id("missing").unwrap().is_none());
    }
}
