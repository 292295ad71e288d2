//! Room snapshot storage operations.
//!
//! `get`/`put`/`sweep` over the `room_cache` table. Every operation takes an
//! explicit tenant key so the core never reads ambient "current user" state.

use chrono::{DateTime, Utc};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::hash::cache_key;
use crate::Error;
use crate::model::RoomSnapshot;

impl CacheDb {
    /// Load the cached snapshot for a canonical room URL.
    ///
    /// Returns `None` when no entry exists, when the entry's age exceeds the
    /// TTL (expired entries are treated as absent, not returned with a
    /// staleness flag), or when the stored row cannot be decoded. A corrupt
    /// row is deleted on the spot and reported as a miss.
    pub async fn get(&self, user: &str, url: &str) -> Result<Option<RoomSnapshot>, Error> {
        let key = cache_key(url);
        let user = user.to_string();
        let cutoff = Utc::now() - self.ttl;

        self.conn
            .call(move |conn| -> Result<Option<RoomSnapshot>, Error> {
                let row: Result<(String, String), rusqlite::Error> = conn.query_row(
                    "SELECT snapshot, captured_at FROM room_cache WHERE user_id = ?1 AND hash = ?2",
                    params![user, key],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                );

                let (snapshot_json, captured_at) = match row {
                    Ok(r) => r,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let captured = DateTime::parse_from_rfc3339(&captured_at)
                    .ok()
                    .map(|t| t.with_timezone(&Utc));
                let snapshot = serde_json::from_str::<RoomSnapshot>(&snapshot_json).ok();

                match (snapshot, captured) {
                    (Some(snapshot), Some(t)) if t > cutoff => Ok(Some(snapshot)),
                    (Some(_), Some(_)) => Ok(None),
                    _ => {
                        tracing::warn!(hash = %key, "deleting corrupt cache entry");
                        conn.execute(
                            "DELETE FROM room_cache WHERE user_id = ?1 AND hash = ?2",
                            params![user, key],
                        )?;
                        Ok(None)
                    }
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Store a snapshot for a canonical room URL, stamping the current time.
    ///
    /// Always overwrites; there is no versioning or history.
    pub async fn put(&self, user: &str, url: &str, snapshot: &RoomSnapshot) -> Result<(), Error> {
        let key = cache_key(url);
        let user = user.to_string();
        let url = url.to_string();
        let snapshot_json =
            serde_json::to_string(snapshot).map_err(|e| Error::InvalidInput(format!("unserializable snapshot: {e}")))?;
        let captured_at = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO room_cache (user_id, hash, url, snapshot, captured_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(user_id, hash) DO UPDATE SET
                         url = excluded.url,
                         snapshot = excluded.snapshot,
                         captured_at = excluded.captured_at",
                    params![user, key, url, snapshot_json, captured_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete entries whose age exceeds the TTL, plus any row that cannot be
    /// decoded (corrupt rows are treated as expired, never repaired).
    ///
    /// Returns the number of deleted entries across all tenants.
    pub async fn sweep(&self) -> Result<u64, Error> {
        let cutoff = (Utc::now() - self.ttl).to_rfc3339();

        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let expired = conn.execute("DELETE FROM room_cache WHERE captured_at < ?1", params![cutoff])?;

                let mut corrupt: Vec<(String, String)> = Vec::new();
                {
                    let mut stmt = conn.prepare("SELECT user_id, hash, snapshot, captured_at FROM room_cache")?;
                    let rows = stmt.query_map([], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    })?;
                    for row in rows {
                        let (user, hash, snapshot, captured_at) = row?;
                        let unreadable = serde_json::from_str::<RoomSnapshot>(&snapshot).is_err()
                            || DateTime::parse_from_rfc3339(&captured_at).is_err();
                        if unreadable {
                            corrupt.push((user, hash));
                        }
                    }
                }

                let mut removed = expired as u64;
                for (user, hash) in corrupt {
                    removed += conn.execute(
                        "DELETE FROM room_cache WHERE user_id = ?1 AND hash = ?2",
                        params![user, hash],
                    )? as u64;
                }

                Ok(removed)
            })
            .await
            .map_err(Error::from)
    }
}
