//! Conversation memory - recent chat history translated into model turns

use crate::ai::{Message, MessageRole};
use crate::db::Database;
use crate::models::MessageRole as DbRole;

/// How many persisted turns feed the model by default
pub const DEFAULT_HISTORY_LIMIT: i64 = 10;

/// Load the last `limit` turns of a chat in chronological (oldest-first)
/// order. The store answers newest-first, so the window is reversed here;
/// callers always see oldest-first regardless of how the store sorts.
///
/// A storage failure degrades to an empty history: losing context is better
/// than failing the user's request.
pub fn chat_history(db: &Database, chat_id: &str, limit: i64) -> Vec<Message> {
    let mut rows = match db.get_recent_messages(chat_id, limit) {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("[MEMORY] Failed to load history for chat {}: {}", chat_id, e);
            return Vec::new();
        }
    };

    rows.reverse();

    rows.into_iter()
        .map(|row| {
            let role = match row.role {
                DbRole::User => MessageRole::User,
                DbRole::Assistant => MessageRole::Assistant,
                DbRole::System => MessageRole::System,
            };
            Message {
                role,
                content: row.content,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::test_support::temp_db;
    use crate::models::MessageRole as DbRole;

    #[test]
    fn history_is_oldest_first() {
        let (_dir, db) = temp_db();
        let user = db.sync_user("did:privy:mem", None, None, None).unwrap();
        let chat = db.create_chat(&user.id, "memory").unwrap();

        db.create_message(&chat.id, &user.id, DbRole::User, "first").unwrap();
        db.create_message(&chat.id, &user.id, DbRole::Assistant, "second").unwrap();
        db.create_message(&chat.id, &user.id, DbRole::User, "third").unwrap();

        let history = chat_history(&db, &chat.id, 10);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "first");
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[1].content, "second");
        assert_eq!(history[1].role, MessageRole::Assistant);
        assert_eq!(history[2].content, "third");
    }

    #[test]
    fn limit_keeps_the_newest_turns() {
        let (_dir, db) = temp_db();
        let user = db.sync_user("did:privy:window", None, None, None).unwrap();
        let chat = db.create_chat(&user.id, "window").unwrap();

        for i in 0..5 {
            db.create_message(&chat.id, &user.id, DbRole::User, &format!("m{}", i))
                .unwrap();
        }

        let history = chat_history(&db, &chat.id, 2);
        // Window covers the two newest turns, still oldest-first
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "m3");
        assert_eq!(history[1].content, "m4");
    }

    #[test]
    fn unknown_chat_yields_empty_history() {
        let (_dir, db) = temp_db();
        assert!(chat_history(&db, "no-such-chat", 10).is_empty());
    }
}
