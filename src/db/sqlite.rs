//! SQLite database - schema definitions and connection management
//!
//! This file contains:
//! - Database struct definition
//! - Connection management (new, init)
//! - Schema creation and migrations
//!
//! All query methods live in the models/ subdirectory.

use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use std::sync::Mutex;

/// Main database wrapper with connection pooling via Mutex
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Create a new database connection and initialize schema
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let conn = Connection::open(database_url)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    /// Initialize all database tables and run migrations
    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Users synced from the identity provider
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                provider_id TEXT UNIQUE NOT NULL,
                email TEXT,
                wallet_address TEXT,
                linked_accounts TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_users_provider_id ON users(provider_id)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_users_wallet_address ON users(wallet_address)",
            [],
        )?;

        // Chats - conversation containers
        conn.execute(
            "CREATE TABLE IF NOT EXISTS chats (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            )",
            [],
        )?;

        // Messages - conversation transcripts
        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                chat_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages(chat_id, created_at)",
            [],
        )?;

        // EIP-7702 smart wallet delegations
        conn.execute(
            "CREATE TABLE IF NOT EXISTS delegations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                chain_id INTEGER NOT NULL,
                delegator TEXT NOT NULL,
                delegatee TEXT NOT NULL,
                nonce TEXT NOT NULL,
                authority TEXT NOT NULL,
                signature TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                transaction_hash TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                UNIQUE(user_id, chain_id, nonce)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_delegations_delegator ON delegations(delegator)",
            [],
        )?;

        // Cross-chain swap transaction records
        conn.execute(
            "CREATE TABLE IF NOT EXISTS swap_transactions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                chat_id TEXT,
                message_id TEXT,
                src_chain_id INTEGER NOT NULL,
                dst_chain_id INTEGER NOT NULL,
                src_token_address TEXT NOT NULL,
                dst_token_address TEXT NOT NULL,
                amount TEXT NOT NULL,
                wallet_address TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                order_hash TEXT,
                quote TEXT,
                secrets TEXT,
                secret_hashes TEXT,
                error_details TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_swaps_user ON swap_transactions(user_id, created_at)",
            [],
        )?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Database;

    /// Open a fresh on-disk database in a temp dir (bundled SQLite)
    pub fn temp_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("test.db");
        let db = Database::new(path.to_str().unwrap()).expect("open db");
        (dir, db)
    }
}
