//! Database operations for the reuse cache

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Error, Result};
use crate::models::*;
use crate::schema::{CREATE_SCHEMA, SCHEMA_VERSION};

/// SQLite cache database
pub struct CacheDatabase {
    conn: Connection,
}

impl CacheDatabase {
    /// Open or create a cache database
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize the database schema
    fn initialize(&self) -> Result<()> {
        let needs_init: bool = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_info'",
                [],
                |row| row.get::<_, i64>(0),
            )
            .map(|count| count == 0)?;

        if needs_init {
            self.conn.execute_batch(CREATE_SCHEMA)?;
            self.conn.execute(
                "INSERT INTO schema_info (version, description) VALUES (?1, ?2)",
                params![SCHEMA_VERSION, "Initial schema"],
            )?;
            tracing::debug!("Initialized cache schema v{}", SCHEMA_VERSION);
        }

        Ok(())
    }

    /// Record a successfully assembled package for an identity
    pub fn record_packaged(
        &self,
        identity: &str,
        name: &str,
        version: &str,
        revision: Option<&str>,
        package_path: &str,
        file_count: i64,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO packages (identity, name, version, revision, package_path, status, error_message, file_count, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 'packaged', NULL, ?6, ?7, ?7)
             ON CONFLICT(identity) DO UPDATE SET
                name = ?2,
                version = ?3,
                revision = ?4,
                package_path = ?5,
                status = 'packaged',
                error_message = NULL,
                file_count = ?6,
                updated_at = ?7",
            params![identity, name, version, revision, package_path, file_count, now],
        )?;
        tracing::debug!("Recorded package {} {} ({})", name, version, identity);
        Ok(())
    }

    /// Record a failed packaging attempt for an identity
    pub fn record_failure(
        &self,
        identity: &str,
        name: &str,
        version: &str,
        error_message: &str,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO packages (identity, name, version, status, error_message, created_at, updated_at)
             VALUES (?1, ?2, ?3, 'failed', ?4, ?5, ?5)
             ON CONFLICT(identity) DO UPDATE SET
                status = 'failed',
                error_message = ?4,
                updated_at = ?5",
            params![identity, name, version, error_message, now],
        )?;
        tracing::debug!("Recorded failure for {} {} ({})", name, version, identity);
        Ok(())
    }

    /// Get a package record by identity
    pub fn get_by_identity(&self, identity: &str) -> Result<Option<PackageRecord>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, identity, name, version, revision, package_path, status,
                        error_message, file_count, created_at, updated_at
                 FROM packages WHERE identity = ?1",
                params![identity],
                Self::row_to_record,
            )
            .optional()?;
        Ok(result)
    }

    /// Decide whether a cached package can be reused.
    ///
    /// The artifact-on-disk check stays with the caller; this only consults
    /// the recorded state.
    pub fn decide_reuse(&self, identity: &str, force: bool) -> Result<ReuseDecision> {
        if force {
            return Ok(ReuseDecision::rebuild(RebuildReason::Forced));
        }

        let Some(record) = self.get_by_identity(identity)? else {
            return Ok(ReuseDecision::rebuild(RebuildReason::NewIdentity));
        };

        match (record.status, record.package_path) {
            (PackageStatus::Packaged, Some(path)) => Ok(ReuseDecision::reuse(path)),
            (PackageStatus::Packaged, None) => {
                Ok(ReuseDecision::rebuild(RebuildReason::ArtifactMissing {
                    path: String::new(),
                }))
            }
            (PackageStatus::Failed, _) => {
                Ok(ReuseDecision::rebuild(RebuildReason::PreviousFailure {
                    error: record.error_message,
                }))
            }
        }
    }

    /// List all cached packages, newest first
    pub fn list_packages(&self, status_filter: Option<PackageStatus>) -> Result<Vec<PackageRecord>> {
        let base = "SELECT id, identity, name, version, revision, package_path, status,
                           error_message, file_count, created_at, updated_at
                    FROM packages";

        let mut results = Vec::new();
        if let Some(status) = status_filter {
            let mut stmt = self
                .conn
                .prepare(&format!("{} WHERE status = ?1 ORDER BY updated_at DESC", base))?;
            let mut rows = stmt.query(params![status.as_str()])?;
            while let Some(row) = rows.next()? {
                results.push(Self::row_to_record(row)?);
            }
        } else {
            let mut stmt = self.conn.prepare(&format!("{} ORDER BY updated_at DESC", base))?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                results.push(Self::row_to_record(row)?);
            }
        }
        Ok(results)
    }

    /// Get cache statistics
    pub fn get_stats(&self) -> Result<CacheStats> {
        self.conn
            .query_row(
                "SELECT
                    COUNT(*) as total,
                    COALESCE(SUM(CASE WHEN status = 'packaged' THEN 1 ELSE 0 END), 0) as packaged,
                    COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0) as failed
                 FROM packages",
                [],
                |row| {
                    Ok(CacheStats {
                        total_identities: row.get(0)?,
                        packaged: row.get(1)?,
                        failed: row.get(2)?,
                    })
                },
            )
            .map_err(Error::Sqlite)
    }

    /// Remove a cached identity. Returns true if a row was deleted.
    pub fn remove(&self, identity: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM packages WHERE identity = ?1", params![identity])?;
        Ok(deleted > 0)
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<PackageRecord> {
        Ok(PackageRecord {
            id: Some(row.get(0)?),
            identity: row.get(1)?,
            name: row.get(2)?,
            version: row.get(3)?,
            revision: row.get(4)?,
            package_path: row.get(5)?,
            status: row
                .get::<_, String>(6)
                .ok()
                .and_then(|s| PackageStatus::from_str(&s))
                .unwrap_or(PackageStatus::Failed),
            error_message: row.get(7)?,
            file_count: row.get(8)?,
            created_at: row
                .get::<_, String>(9)
                .ok()
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(Utc::now),
            updated_at: row
                .get::<_, String>(10)
                .ok()
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_database() {
        let db = CacheDatabase::in_memory().unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.total_identities, 0);
    }

    #[test]
    fn test_record_and_lookup() {
        let db = CacheDatabase::in_memory().unwrap();

        db.record_packaged("id-abc", "fioc", "1.0.0", Some("abc123"), "/tmp/pkg/fioc", 5)
            .unwrap();

        let record = db.get_by_identity("id-abc").unwrap().unwrap();
        assert_eq!(record.name, "fioc");
        assert_eq!(record.status, PackageStatus::Packaged);
        assert_eq!(record.file_count, Some(5));
        assert_eq!(record.package_path.as_deref(), Some("/tmp/pkg/fioc"));
    }

    #[test]
    fn test_reuse_decision() {
        let db = CacheDatabase::in_memory().unwrap();

        let decision = db.decide_reuse("id-abc", false).unwrap();
        assert!(!decision.reusable);
        assert!(matches!(decision.reason, Some(RebuildReason::NewIdentity)));

        db.record_packaged("id-abc", "fioc", "1.0.0", None, "/tmp/pkg/fioc", 5)
            .unwrap();

        let decision = db.decide_reuse("id-abc", false).unwrap();
        assert!(decision.reusable);
        assert_eq!(decision.package_path.as_deref(), Some("/tmp/pkg/fioc"));

        let forced = db.decide_reuse("id-abc", true).unwrap();
        assert!(!forced.reusable);
        assert!(matches!(forced.reason, Some(RebuildReason::Forced)));
    }

    #[test]
    fn test_failure_then_success() {
        let db = CacheDatabase::in_memory().unwrap();

        db.record_failure("id-abc", "fioc", "1.0.0", "copy failed")
            .unwrap();
        let decision = db.decide_reuse("id-abc", false).unwrap();
        assert!(matches!(
            decision.reason,
            Some(RebuildReason::PreviousFailure { .. })
        ));

        db.record_packaged("id-abc", "fioc", "1.0.0", None, "/tmp/pkg/fioc", 2)
            .unwrap();
        let record = db.get_by_identity("id-abc").unwrap().unwrap();
        assert_eq!(record.status, PackageStatus::Packaged);
        assert!(record.error_message.is_none());
    }

    #[test]
    fn test_list_and_remove() {
        let db = CacheDatabase::in_memory().unwrap();
        db.record_packaged("id-1", "a", "1", None, "/p/a", 1).unwrap();
        db.record_failure("id-2", "b", "1", "boom").unwrap();

        assert_eq!(db.list_packages(None).unwrap().len(), 2);
        assert_eq!(
            db.list_packages(Some(PackageStatus::Failed)).unwrap().len(),
            1
        );

        assert!(db.remove("id-1").unwrap());
        assert!(!db.remove("id-1").unwrap());
        assert_eq!(db.get_stats().unwrap().total_identities, 1);
    }
}
