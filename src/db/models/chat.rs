//! Chat database operations

use chrono::Utc;
use rusqlite::Result as SqliteResult;
use uuid::Uuid;

use super::super::Database;
use super::user::parse_rfc3339;
use crate::models::Chat;

impl Database {
    pub fn create_chat(&self, user_id: &str, title: &str) -> SqliteResult<Chat> {
        let conn = self.conn.lock().unwrap();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO chats (id, user_id, title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![&id, user_id, title, &now, &now],
        )?;

        drop(conn);
        self.get_chat(&id).map(|opt| opt.expect("chat just written"))
    }

    pub fn get_chat(&self, id: &str) -> SqliteResult<Option<Chat>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, title, created_at, updated_at FROM chats WHERE id = ?1",
        )?;
        let chat = stmt.query_row([id], Self::row_to_chat).ok();
        Ok(chat)
    }

    pub fn get_chats_by_user(&self, user_id: &str) -> SqliteResult<Vec<Chat>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, title, created_at, updated_at
             FROM chats WHERE user_id = ?1 ORDER BY updated_at DESC",
        )?;
        let chats = stmt
            .query_map([user_id], Self::row_to_chat)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(chats)
    }

    /// Returns the updated row, or None when the chat does not exist
    pub fn update_chat(&self, id: &str, title: &str) -> SqliteResult<Option<Chat>> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE chats SET title = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![title, &now, id],
        )?;
        drop(conn);

        if changed == 0 {
            return Ok(None);
        }
        self.get_chat(id)
    }

    /// Deletes a chat and (via cascade) its messages; true when a row was removed
    pub fn delete_chat(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM chats WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    /// Touch updated_at so chat lists sort by recent activity
    pub fn touch_chat(&self, id: &str) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE chats SET updated_at = ?1 WHERE id = ?2",
            rusqlite::params![&now, id],
        )?;
        Ok(())
    }

    fn row_to_chat(row: &rusqlite::Row) -> rusqlite::Result<Chat> {
        let created_at: String = row.get(3)?;
        let updated_at: String = row.get(4)?;
        Ok(Chat {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            created_at: parse_rfc3339(&created_at),
            updated_at: parse_rfc3339(&updated_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::db::sqlite::test_support::temp_db;

    #[test]
    fn chat_crud_round_trip() {
        let (_dir, db) = temp_db();
        let user = db.sync_user("did:privy:chats", None, None, None).unwrap();

        let chat = db.create_chat(&user.id, "Swap planning").unwrap();
        assert_eq!(chat.title, "Swap planning");

        let fetched = db.get_chat(&chat.id).unwrap().unwrap();
        assert_eq!(fetched.id, chat.id);

        let renamed = db.update_chat(&chat.id, "ETH swaps").unwrap().unwrap();
        assert_eq!(renamed.title, "ETH swaps");

        let listed = db.get_chats_by_user(&user.id).unwrap();
        assert_eq!(listed.len(), 1);

        assert!(db.delete_chat(&chat.id).unwrap());
        assert!(db.get_chat(&chat.id).unwrap().is_none());
        assert!(!db.delete_chat(&chat.id).unwrap());
    }

    #[test]
    fn update_missing_chat_returns_none() {
        let (_dir, db) = temp_db();
        assert!(db.update_chat("nope", "title").unwrap().is_none());
    }
}
