//! Message database operations

use chrono::Utc;
use rusqlite::Result as SqliteResult;
use uuid::Uuid;

use super::super::Database;
use super::user::parse_rfc3339;
use crate::models::{ChatMessage, MessageRole};

impl Database {
    pub fn create_message(
        &self,
        chat_id: &str,
        user_id: &str,
        role: MessageRole,
        content: &str,
    ) -> SqliteResult<ChatMessage> {
        let conn = self.conn.lock().unwrap();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO messages (id, chat_id, user_id, role, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![&id, chat_id, user_id, role.as_str(), content, &now, &now],
        )?;

        drop(conn);
        self.get_message(&id).map(|opt| opt.expect("message just written"))
    }

    pub fn get_message(&self, id: &str) -> SqliteResult<Option<ChatMessage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, chat_id, user_id, role, content, created_at, updated_at
             FROM messages WHERE id = ?1",
        )?;
        let message = stmt.query_row([id], Self::row_to_message).ok();
        Ok(message)
    }

    /// Most recent messages for a chat, newest first. Conversation memory
    /// reverses this into chronological order before it reaches the model.
    pub fn get_recent_messages(&self, chat_id: &str, limit: i64) -> SqliteResult<Vec<ChatMessage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, chat_id, user_id, role, content, created_at, updated_at
             FROM messages WHERE chat_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2",
        )?;
        let messages = stmt
            .query_map(rusqlite::params![chat_id, limit], Self::row_to_message)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(messages)
    }

    pub fn get_messages_by_chat(&self, chat_id: &str) -> SqliteResult<Vec<ChatMessage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, chat_id, user_id, role, content, created_at, updated_at
             FROM messages WHERE chat_id = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let messages = stmt
            .query_map([chat_id], Self::row_to_message)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(messages)
    }

    pub fn get_messages_by_user(&self, user_id: &str) -> SqliteResult<Vec<ChatMessage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, chat_id, user_id, role, content, created_at, updated_at
             FROM messages WHERE user_id = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let messages = stmt
            .query_map([user_id], Self::row_to_message)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(messages)
    }

    pub fn update_message(&self, id: &str, content: &str) -> SqliteResult<Option<ChatMessage>> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE messages SET content = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![content, &now, id],
        )?;
        drop(conn);

        if changed == 0 {
            return Ok(None);
        }
        self.get_message(id)
    }

    pub fn delete_message(&self, id: &str) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }

    fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<ChatMessage> {
        let role: String = row.get(3)?;
        let created_at: String = row.get(5)?;
        let updated_at: String = row.get(6)?;

        Ok(ChatMessage {
            id: row.get(0)?,
            chat_id: row.get(1)?,
            user_id: row.get(2)?,
            // Unknown roles written by older builds degrade to user turns
            role: MessageRole::parse(&role).unwrap_or(MessageRole::User),
            content: row.get(4)?,
            created_at: parse_rfc3339(&created_at),
            updated_at: parse_rfc3339(&updated_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::db::sqlite::test_support::temp_db;
    use crate::models::MessageRole;

    #[test]
    fn message_crud_round_trip() {
        let (_dir, db) = temp_db();
        let user = db.sync_user("did:privy:msgs", None, None, None).unwrap();
        let chat = db.create_chat(&user.id, "test").unwrap();

        let msg = db
            .create_message(&chat.id, &user.id, MessageRole::User, "hello")
            .unwrap();
        assert_eq!(msg.role, MessageRole::User);

        let edited = db.update_message(&msg.id, "hello there").unwrap().unwrap();
        assert_eq!(edited.content, "hello there");

        assert_eq!(db.get_messages_by_chat(&chat.id).unwrap().len(), 1);
        assert_eq!(db.get_messages_by_user(&user.id).unwrap().len(), 1);

        assert!(db.delete_message(&msg.id).unwrap());
        assert!(db.get_message(&msg.id).unwrap().is_none());
    }

    #[test]
    fn recent_messages_are_newest_first() {
        let (_dir, db) = temp_db();
        let user = db.sync_user("did:privy:order", None, None, None).unwrap();
        let chat = db.create_chat(&user.id, "ordering").unwrap();

        for i in 0..4 {
            db.create_message(&chat.id, &user.id, MessageRole::User, &format!("m{}", i))
                .unwrap();
        }

        let recent = db.get_recent_messages(&chat.id, 3).unwrap();
        assert_eq!(recent.len(), 3);
        // Descending by creation: the very first message falls off the window
        assert_eq!(recent[0].content, "m3");
        assert_eq!(recent[2].content, "m1");
    }
}
