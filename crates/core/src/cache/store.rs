//! Versioned named stores.
//!
//! Each store name is one cache version. Entries are only ever written or
//! removed whole: `put` and `put_all` each upsert in one transaction, and
//! `delete` drops a store with all of its entries in one transaction.

use super::connection::CacheDb;
use super::hash::RequestKey;
use super::response::ResponseSnapshot;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Store operations the router depends on.
#[async_trait::async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open (or create) the store `name`.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Names of every existing store.
    async fn names(&self) -> Result<Vec<String>, Error>;

    /// Delete the store `name` with all its entries.
    ///
    /// Returns false if no such store existed.
    async fn delete(&self, name: &str) -> Result<bool, Error>;

    /// Look up `key` in store `name`.
    async fn match_request(&self, name: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error>;

    /// Store `response` under `key`, replacing any previous entry.
    ///
    /// Creates the store if it does not exist yet.
    async fn put(&self, name: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error>;

    /// Store every entry in one transaction: either all are written or none.
    async fn put_all(&self, name: &str, entries: &[(RequestKey, ResponseSnapshot)]) -> Result<(), Error>;

    /// URLs of every entry in store `name`, sorted.
    async fn keys(&self, name: &str) -> Result<Vec<String>, Error>;
}

/// Summary of one store for inspection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
pub struct StoreSummary {
    pub name: String,
    pub entries: u64,
    pub created_at: String,
}

impl CacheDb {
    /// Every store with its entry count, oldest first.
    pub async fn summaries(&self) -> Result<Vec<StoreSummary>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<StoreSummary>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT c.name, c.created_at, COUNT(e.key_hash)
                     FROM caches c LEFT JOIN entries e ON e.cache_name = c.name
                     GROUP BY c.name, c.created_at
                     ORDER BY c.created_at ASC, c.name ASC",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(StoreSummary {
                        name: row.get(0)?,
                        created_at: row.get(1)?,
                        entries: row.get::<_, i64>(2)? as u64,
                    })
                })?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row?);
                }
                Ok(out)
            })
            .await
            .map_err(Error::from)
    }

    /// Whether a store named `name` exists.
    pub async fn exists(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let found: bool =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM caches WHERE name = ?1)", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(found)
            })
            .await
            .map_err(Error::from)
    }
}

/// One entry ready to be written.
struct EntryRow {
    hash: String,
    method: String,
    url: String,
    status: u16,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn new(key: &RequestKey, response: &ResponseSnapshot) -> Result<Self, Error> {
        Ok(Self {
            hash: key.hash(),
            method: key.method().to_string(),
            url: key.url().to_string(),
            status: response.status,
            headers_json: response.headers_json()?,
            body: response.body.to_vec(),
        })
    }
}

impl CacheDb {
    /// Upsert `rows` into store `name` inside a single transaction.
    async fn write_entries(&self, name: &str, rows: Vec<EntryRow>) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![&name, &now],
                )?;
                for row in &rows {
                    tx.execute(
                        "INSERT INTO entries (cache_name, key_hash, method, url, status, headers_json, body, stored_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                         ON CONFLICT(cache_name, key_hash) DO UPDATE SET
                            method = excluded.method,
                            url = excluded.url,
                            status = excluded.status,
                            headers_json = excluded.headers_json,
                            body = excluded.body,
                            stored_at = excluded.stored_at",
                        params![
                            &name,
                            &row.hash,
                            &row.method,
                            &row.url,
                            row.status,
                            &row.headers_json,
                            &row.body,
                            &now
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait::async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY created_at ASC, name ASC")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row?);
                }
                Ok(out)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE cache_name = ?1", params![name])?;
                let removed = tx.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(removed > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn match_request(&self, name: &str, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        let name = name.to_string();
        let hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<ResponseSnapshot>, Error> {
                let result = conn.query_row(
                    "SELECT status, headers_json, body FROM entries WHERE cache_name = ?1 AND key_hash = ?2",
                    params![name, hash],
                    |row| Ok((row.get::<_, u16>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?)),
                );

                match result {
                    Ok((status, headers_json, body)) => {
                        Ok(Some(ResponseSnapshot::from_row(status, &headers_json, body)?))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, name: &str, key: &RequestKey, response: &ResponseSnapshot) -> Result<(), Error> {
        let row = EntryRow::new(key, response)?;
        self.write_entries(name, vec![row]).await
    }

    async fn put_all(&self, name: &str, entries: &[(RequestKey, ResponseSnapshot)]) -> Result<(), Error> {
        let rows = entries
            .iter()
            .map(|(key, response)| EntryRow::new(key, response))
            .collect::<Result<Vec<_>, Error>>()?;
        self.write_entries(name, rows).await
    }

    async fn keys(&self, name: &str) -> Result<Vec<String>, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE cache_name = ?1 ORDER BY url ASC")?;
                let rows = stmt.query_map(params![name], |row| row.get::<_, String>(0))?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row?);
                }
                Ok(out)
            })
            .await
            .map_err(Error::from)
    }
}
