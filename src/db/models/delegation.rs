//! Delegation database operations

use chrono::Utc;
use rusqlite::Result as SqliteResult;
use uuid::Uuid;

use super::super::Database;
use super::user::parse_rfc3339;
use crate::models::Delegation;

impl Database {
    /// Store a signed delegation. The unique (user, chain, nonce) constraint
    /// makes replays an upsert of the signature rather than a duplicate row.
    pub fn store_delegation(
        &self,
        user_id: &str,
        chain_id: i64,
        delegator: &str,
        delegatee: &str,
        nonce: &str,
        authority: &str,
        signature: &str,
    ) -> SqliteResult<Delegation> {
        let conn = self.conn.lock().unwrap();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO delegations (id, user_id, chain_id, delegator, delegatee, nonce, authority, signature, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'pending', ?9)
             ON CONFLICT(user_id, chain_id, nonce) DO UPDATE SET
                 delegator = excluded.delegator,
                 delegatee = excluded.delegatee,
                 authority = excluded.authority,
                 signature = excluded.signature",
            rusqlite::params![&id, user_id, chain_id, delegator, delegatee, nonce, authority, signature, &now],
        )?;

        let mut stmt = conn.prepare(
            "SELECT id, user_id, chain_id, delegator, delegatee, nonce, authority, signature, status, transaction_hash, created_at
             FROM delegations WHERE user_id = ?1 AND chain_id = ?2 AND nonce = ?3",
        )?;
        let delegation = stmt.query_row(
            rusqlite::params![user_id, chain_id, nonce],
            Self::row_to_delegation,
        )?;
        Ok(delegation)
    }

    pub fn get_delegations_by_user(&self, user_id: &str) -> SqliteResult<Vec<Delegation>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, chain_id, delegator, delegatee, nonce, authority, signature, status, transaction_hash, created_at
             FROM delegations WHERE user_id = ?1 ORDER BY created_at DESC",
        )?;
        let delegations = stmt
            .query_map([user_id], Self::row_to_delegation)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(delegations)
    }

    pub fn get_delegations_by_address(
        &self,
        delegator: &str,
        chain_id: Option<i64>,
    ) -> SqliteResult<Vec<Delegation>> {
        let conn = self.conn.lock().unwrap();

        let delegations = match chain_id {
            Some(chain) => {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, chain_id, delegator, delegatee, nonce, authority, signature, status, transaction_hash, created_at
                     FROM delegations WHERE delegator = ?1 COLLATE NOCASE AND chain_id = ?2
                     ORDER BY created_at DESC",
                )?;
                stmt.query_map(rusqlite::params![delegator, chain], Self::row_to_delegation)?
                    .filter_map(|r| r.ok())
                    .collect()
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, user_id, chain_id, delegator, delegatee, nonce, authority, signature, status, transaction_hash, created_at
                     FROM delegations WHERE delegator = ?1 COLLATE NOCASE
                     ORDER BY created_at DESC",
                )?;
                stmt.query_map([delegator], Self::row_to_delegation)?
                    .filter_map(|r| r.ok())
                    .collect()
            }
        };

        Ok(delegations)
    }

    fn row_to_delegation(row: &rusqlite::Row) -> rusqlite::Result<Delegation> {
        let created_at: String = row.get(10)?;
        Ok(Delegation {
            id: row.get(0)?,
            user_id: row.get(1)?,
            chain_id: row.get(2)?,
            delegator: row.get(3)?,
            delegatee: row.get(4)?,
            nonce: row.get(5)?,
            authority: row.get(6)?,
            signature: row.get(7)?,
            status: row.get(8)?,
            transaction_hash: row.get(9)?,
            created_at: parse_rfc3339(&created_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::db::sqlite::test_support::temp_db;

    const DELEGATOR: &str = "0xAbC0000000000000000000000000000000000001";

    #[test]
    fn store_and_filter_delegations() {
        let (_dir, db) = temp_db();
        let user = db.sync_user("did:privy:deleg", None, None, None).unwrap();

        db.store_delegation(&user.id, 1, DELEGATOR, "0xdead", "1", "0xauth", "0xsig")
            .unwrap();
        db.store_delegation(&user.id, 137, DELEGATOR, "0xdead", "1", "0xauth", "0xsig")
            .unwrap();

        assert_eq!(db.get_delegations_by_user(&user.id).unwrap().len(), 2);
        assert_eq!(
            db.get_delegations_by_address(DELEGATOR, Some(137)).unwrap().len(),
            1
        );
        // Address match is case-insensitive
        assert_eq!(
            db.get_delegations_by_address(&DELEGATOR.to_lowercase(), None)
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn replayed_nonce_updates_in_place() {
        let (_dir, db) = temp_db();
        let user = db.sync_user("did:privy:nonce", None, None, None).unwrap();

        db.store_delegation(&user.id, 1, DELEGATOR, "0xdead", "7", "0xauth", "0xsig1")
            .unwrap();
        let replayed = db
            .store_delegation(&user.id, 1, DELEGATOR, "0xdead", "7", "0xauth", "0xsig2")
            .unwrap();

        assert_eq!(replayed.signature, "0xsig2");
        assert_eq!(db.get_delegations_by_user(&user.id).unwrap().len(), 1);
    }
}
