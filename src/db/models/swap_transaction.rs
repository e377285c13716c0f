//! Swap transaction database operations

use chrono::Utc;
use rusqlite::Result as SqliteResult;
use serde_json::Value;
use uuid::Uuid;

use super::super::Database;
use super::user::parse_rfc3339;
use crate::models::{SwapStatus, SwapTransaction};

/// Fields recorded when a swap is first requested
pub struct NewSwapTransaction<'a> {
    pub user_id: &'a str,
    pub chat_id: Option<&'a str>,
    pub message_id: Option<&'a str>,
    pub src_chain_id: i64,
    pub dst_chain_id: i64,
    pub src_token_address: &'a str,
    pub dst_token_address: &'a str,
    pub amount: &'a str,
    pub wallet_address: &'a str,
}

impl Database {
    pub fn create_swap_transaction(&self, new: &NewSwapTransaction) -> SqliteResult<SwapTransaction> {
        let conn = self.conn.lock().unwrap();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO swap_transactions (id, user_id, chat_id, message_id, src_chain_id, dst_chain_id,
                 src_token_address, dst_token_address, amount, wallet_address, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 'pending', ?11, ?12)",
            rusqlite::params![
                &id,
                new.user_id,
                new.chat_id,
                new.message_id,
                new.src_chain_id,
                new.dst_chain_id,
                new.src_token_address,
                new.dst_token_address,
                new.amount,
                new.wallet_address,
                &now,
                &now
            ],
        )?;

        drop(conn);
        self.get_swap_transaction(&id)
            .map(|opt| opt.expect("swap just written"))
    }

    pub fn get_swap_transaction(&self, id: &str) -> SqliteResult<Option<SwapTransaction>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, chat_id, message_id, src_chain_id, dst_chain_id, src_token_address,
                    dst_token_address, amount, wallet_address, status, order_hash, quote, secrets,
                    secret_hashes, error_details, created_at, updated_at
             FROM swap_transactions WHERE id = ?1",
        )?;
        let swap = stmt.query_row([id], Self::row_to_swap).ok();
        Ok(swap)
    }

    pub fn get_swaps_by_user(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> SqliteResult<Vec<SwapTransaction>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, chat_id, message_id, src_chain_id, dst_chain_id, src_token_address,
                    dst_token_address, amount, wallet_address, status, order_hash, quote, secrets,
                    secret_hashes, error_details, created_at, updated_at
             FROM swap_transactions WHERE user_id = ?1
             ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
        )?;
        let swaps = stmt
            .query_map(rusqlite::params![user_id, limit, offset], Self::row_to_swap)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(swaps)
    }

    /// Record order placement details once the swap API accepted the request
    pub fn mark_swap_processing(
        &self,
        id: &str,
        order_hash: &str,
        quote: &Value,
        secrets: &Value,
        secret_hashes: &Value,
    ) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE swap_transactions SET status = 'processing', order_hash = ?1, quote = ?2,
                 secrets = ?3, secret_hashes = ?4, updated_at = ?5
             WHERE id = ?6",
            rusqlite::params![
                order_hash,
                quote.to_string(),
                secrets.to_string(),
                secret_hashes.to_string(),
                &now,
                id
            ],
        )?;
        Ok(())
    }

    pub fn update_swap_status(
        &self,
        id: &str,
        status: SwapStatus,
        error_details: Option<&Value>,
    ) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE swap_transactions SET status = ?1, error_details = ?2, updated_at = ?3 WHERE id = ?4",
            rusqlite::params![status.as_str(), error_details.map(|v| v.to_string()), &now, id],
        )?;
        Ok(())
    }

    fn row_to_swap(row: &rusqlite::Row) -> rusqlite::Result<SwapTransaction> {
        let status: String = row.get(10)?;
        let quote: Option<String> = row.get(12)?;
        let secrets: Option<String> = row.get(13)?;
        let secret_hashes: Option<String> = row.get(14)?;
        let error_details: Option<String> = row.get(15)?;
        let created_at: String = row.get(16)?;
        let updated_at: String = row.get(17)?;

        Ok(SwapTransaction {
            id: row.get(0)?,
            user_id: row.get(1)?,
            chat_id: row.get(2)?,
            message_id: row.get(3)?,
            src_chain_id: row.get(4)?,
            dst_chain_id: row.get(5)?,
            src_token_address: row.get(6)?,
            dst_token_address: row.get(7)?,
            amount: row.get(8)?,
            wallet_address: row.get(9)?,
            status: SwapStatus::parse(&status).unwrap_or(SwapStatus::Pending),
            order_hash: row.get(11)?,
            quote: quote.and_then(|s| serde_json::from_str(&s).ok()),
            secrets: secrets.and_then(|s| serde_json::from_str(&s).ok()),
            secret_hashes: secret_hashes.and_then(|s| serde_json::from_str(&s).ok()),
            error_details: error_details.and_then(|s| serde_json::from_str(&s).ok()),
            created_at: parse_rfc3339(&created_at),
            updated_at: parse_rfc3339(&updated_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::NewSwapTransaction;
    use crate::db::sqlite::test_support::temp_db;
    use crate::models::SwapStatus;
    use serde_json::json;

    #[test]
    fn swap_lifecycle_updates() {
        let (_dir, db) = temp_db();
        let user = db.sync_user("did:privy:swap", None, None, None).unwrap();

        let swap = db
            .create_swap_transaction(&NewSwapTransaction {
                user_id: &user.id,
                chat_id: None,
                message_id: None,
                src_chain_id: 1,
                dst_chain_id: 137,
                src_token_address: "0xsrc",
                dst_token_address: "0xdst",
                amount: "1000000000000000000",
                wallet_address: "0xwallet",
            })
            .unwrap();
        assert_eq!(swap.status, SwapStatus::Pending);

        db.mark_swap_processing(
            &swap.id,
            "0xorder",
            &json!({"quoteId": "q-1"}),
            &json!([]),
            &json!([]),
        )
        .unwrap();

        let processing = db.get_swap_transaction(&swap.id).unwrap().unwrap();
        assert_eq!(processing.status, SwapStatus::Processing);
        assert_eq!(processing.order_hash.as_deref(), Some("0xorder"));
        assert_eq!(processing.quote.unwrap()["quoteId"], "q-1");

        db.update_swap_status(&swap.id, SwapStatus::Failed, Some(&json!({"error": "timeout"})))
            .unwrap();
        let failed = db.get_swap_transaction(&swap.id).unwrap().unwrap();
        assert_eq!(failed.status, SwapStatus::Failed);
        assert_eq!(failed.error_details.unwrap()["error"], "timeout");
    }

    #[test]
    fn swaps_are_paged_per_user() {
        let (_dir, db) = temp_db();
        let user = db.sync_user("did:privy:pages", None, None, None).unwrap();

        for _ in 0..3 {
            db.create_swap_transaction(&NewSwapTransaction {
                user_id: &user.id,
                chat_id: None,
                message_id: None,
                src_chain_id: 1,
                dst_chain_id: 1,
                src_token_address: "0xa",
                dst_token_address: "0xb",
                amount: "1",
                wallet_address: "0xw",
            })
            .unwrap();
        }

        assert_eq!(db.get_swaps_by_user(&user.id, 2, 0).unwrap().len(), 2);
        assert_eq!(db.get_swaps_by_user(&user.id, 2, 2).unwrap().len(), 1);
    }
}
