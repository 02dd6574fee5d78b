use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension, Result};
use uuid::Uuid;

use super::storage::{BlogDB, User};

impl BlogDB {
    /// Start a session for `user_id` and return its token.
    pub fn create_session(&self, user_id: i64) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)",
            params![token, user_id, now],
        )?;

        Ok(token)
    }

    /// Resolve a session token to its user.
    ///
    /// Tokens older than `ttl` are removed and resolve to `None`.
    pub fn get_session_user(&self, token: &str, ttl: Duration) -> Result<Option<User>> {
        let row: Option<(String, i64, String, String, String)> = self
            .conn
            .query_row(
                "SELECT s.created_at, u.id, u.email, u.name, u.password_hash
                 FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?",
                params![token],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()?;

        let Some((created_at, id, email, name, password_hash)) = row else {
            return Ok(None);
        };

        let expired = DateTime::parse_from_rfc3339(&created_at)
            .map(|created| Utc::now() - created.with_timezone(&Utc) > ttl)
            .unwrap_or(true);
        if expired {
            log::debug!("Session for user {} expired", id);
            self.delete_session(token)?;
            return Ok(None);
        }

        Ok(Some(User {
            id,
            email,
            name,
            password_hash,
        }))
    }

    pub fn delete_session(&self, token: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM sessions WHERE token = ?", params![token])?;
        Ok(rows > 0)
    }

    /// Drop every session older than `ttl`. Returns how many were removed.
    pub fn purge_expired_sessions(&self, ttl: Duration) -> Result<usize> {
        let cutoff = (Utc::now() - ttl).to_rfc3339();
        let rows = self
            .conn
            .execute("DELETE FROM sessions WHERE created_at < ?", params![cutoff])?;
        Ok(rows)
    }
}
