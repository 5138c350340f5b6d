//! Named partition operations.
//!
//! A partition is opened by name and then read or written through a
//! [`Partition`] handle. Opening is idempotent; deleting a partition drops
//! every entry it holds.

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use super::record::ResponseRecord;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Handle to one named partition.
#[derive(Clone, Debug)]
pub struct Partition {
    db: CacheDb,
    name: String,
}

impl CacheDb {
    /// Open (creating if needed) the partition with the given name.
    pub async fn open_partition(&self, name: &str) -> Result<Partition, Error> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("partition name cannot be empty".into()));
        }

        let owned = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![owned, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(Partition { db: self.clone(), name: name.to_string() })
    }

    /// Whether a partition with this name exists.
    pub async fn has_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM partitions WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of every existing partition, sorted.
    pub async fn partition_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a partition and all of its entries.
    ///
    /// Returns false if no such partition existed.
    pub async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE partition = ?1", params![name])?;
                let deleted = tx.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

impl Partition {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the stored response for a request.
    ///
    /// Returns None on a miss. No freshness check happens here.
    pub async fn get(&self, method: &str, url: &str) -> Result<Option<ResponseRecord>, Error> {
        let partition = self.name.clone();
        let key_hash = compute_cache_key(method, url);
        self.db
            .conn
            .call(move |conn| -> Result<Option<ResponseRecord>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status_code, headers_json, body
                     FROM entries WHERE partition = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![partition, key_hash], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u16>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                    ))
                });

                match result {
                    Ok((url, status, headers_json, body)) => {
                        let headers = ResponseRecord::headers_from_json(&headers_json)?;
                        Ok(Some(ResponseRecord { url, status, headers, body: body.into() }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Store a response for a request, replacing any previous entry.
    ///
    /// Concurrent writers to the same key are last-write-wins. The partition
    /// row is recreated if it was deleted since this handle was opened.
    /// `Set-Cookie` headers are never written.
    pub async fn put(&self, method: &str, url: &str, record: &ResponseRecord) -> Result<(), Error> {
        let partition = self.name.clone();
        let key_hash = compute_cache_key(method, url);
        let method = method.to_ascii_uppercase();
        let url = url.to_string();
        let status = record.status;
        let headers_json = record.headers_json()?;
        let body = record.body.to_vec();
        let created_at = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![partition, created_at],
                )?;
                conn.execute(
                    "INSERT INTO entries (partition, key_hash, method, url, status_code, headers_json, body)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(partition, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status_code = excluded.status_code,
                        headers_json = excluded.headers_json,
                        body = excluded.body",
                    params![partition, key_hash, method, url, status, headers_json, body],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove one entry. Returns false on a miss.
    pub async fn delete(&self, method: &str, url: &str) -> Result<bool, Error> {
        let partition = self.name.clone();
        let key_hash = compute_cache_key(method, url);
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE partition = ?1 AND key_hash = ?2",
                    params![partition, key_hash],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// URLs of every stored entry, sorted.
    pub async fn urls(&self) -> Result<Vec<String>, Error> {
        let partition = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE partition = ?1 ORDER BY url")?;
                let urls = stmt
                    .query_map(params![partition], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn len(&self) -> Result<u64, Error> {
        let partition = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE partition = ?1", params![partition], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, body: &str) -> ResponseRecord {
        ResponseRecord::new(
            url,
            200,
            vec![
                ("content-type".into(), "text/plain".into()),
                ("date".into(), "Wed, 21 Oct 2015 07:28:00 GMT".into()),
            ],
            body.to_string(),
        )
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let partition = db.open_partition("grace-static-v1").await.unwrap();
        let stored = record("https://example.com/app.js", "console.log(1)");

        partition.put("GET", "https://example.com/app.js", &stored).await.unwrap();

        let retrieved = partition.get("GET", "https://example.com/app.js").await.unwrap().unwrap();
        assert_eq!(retrieved, stored);
        assert_eq!(retrieved.header("date"), Some("Wed, 21 Oct 2015 07:28:00 GMT"));
    }

    #[tokio::test]
    async fn test_put_strips_set_cookie() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let partition = db.open_partition("grace-static-v1").await.unwrap();
        let url = "https://example.com/site.css";
        let mut live = record(url, "body{}");
        live.headers.push(("set-cookie".into(), "session=alice-secret".into()));

        partition.put("GET", url, &live).await.unwrap();

        let retrieved = partition.get("GET", url).await.unwrap().unwrap();
        assert_eq!(retrieved.header("set-cookie"), None);
        assert_eq!(retrieved.content_type(), Some("text/plain"));
        assert_eq!(live.header("set-cookie"), Some("session=alice-secret"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let partition = db.open_partition("grace-static-v1").await.unwrap();
        assert!(partition.get("GET", "https://example.com/nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partitions_are_isolated() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let images = db.open_partition("grace-images-v1").await.unwrap();
        let statics = db.open_partition("grace-static-v1").await.unwrap();

        images
            .put("GET", "https://example.com/a.png", &record("https://example.com/a.png", "png"))
            .await
            .unwrap();

        assert!(statics.get("GET", "https://example.com/a.png").await.unwrap().is_none());
        assert!(images.get("GET", "https://example.com/a.png").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upsert_last_write_wins() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let partition = db.open_partition("grace-dynamic-v1").await.unwrap();
        let url = "https://example.com/about";

        partition.put("GET", url, &record(url, "old")).await.unwrap();
        partition.put("GET", url, &record(url, "new")).await.unwrap();

        let retrieved = partition.get("GET", url).await.unwrap().unwrap();
        assert_eq!(&retrieved.body[..], b"new");
        assert_eq!(partition.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_partition("grace-static-v1").await.unwrap();
        db.open_partition("grace-static-v1").await.unwrap();
        assert_eq!(db.partition_names().await.unwrap(), vec!["grace-static-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_open_empty_name_rejected() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(matches!(db.open_partition("  ").await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_delete_partition_drops_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let old = db.open_partition("grace-static-v1").await.unwrap();
        old.put("GET", "https://example.com/", &record("https://example.com/", "home"))
            .await
            .unwrap();

        assert!(db.delete_partition("grace-static-v1").await.unwrap());
        assert!(!db.delete_partition("grace-static-v1").await.unwrap());
        assert!(!db.has_partition("grace-static-v1").await.unwrap());

        let reopened = db.open_partition("grace-static-v1").await.unwrap();
        assert!(reopened.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_put_recreates_deleted_partition() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let partition = db.open_partition("grace-images-v1").await.unwrap();
        db.delete_partition("grace-images-v1").await.unwrap();

        partition
            .put("GET", "https://example.com/a.png", &record("https://example.com/a.png", "png"))
            .await
            .unwrap();

        assert!(db.has_partition("grace-images-v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_entry_and_urls() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let partition = db.open_partition("grace-static-v1").await.unwrap();
        for path in ["/b.css", "/a.js"] {
            let url = format!("https://example.com{path}");
            partition.put("GET", &url, &record(&url, "x")).await.unwrap();
        }

        assert_eq!(
            partition.urls().await.unwrap(),
            vec!["https://example.com/a.js".to_string(), "https://example.com/b.css".to_string()]
        );
        assert!(partition.delete("GET", "https://example.com/a.js").await.unwrap());
        assert!(!partition.delete("GET", "https://example.com/a.js").await.unwrap());
        assert_eq!(partition.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lantern.sqlite");
        let url = "https://example.com/manifest.json";

        {
            let db = CacheDb::open(&path).await.unwrap();
            let partition = db.open_partition("grace-static-v1").await.unwrap();
            partition.put("GET", url, &record(url, "{}")).await.unwrap();
        }

        let db = CacheDb::open(&path).await.unwrap();
        assert_eq!(db.partition_names().await.unwrap(), vec!["grace-static-v1".to_string()]);
        let partition = db.open_partition("grace-static-v1").await.unwrap();
        let retrieved = partition.get("GET", url).await.unwrap().unwrap();
        assert_eq!(&retrieved.body[..], b"{}");
    }
}
