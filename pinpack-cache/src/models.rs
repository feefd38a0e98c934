//! Data models for the reuse cache

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome recorded for a package identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageStatus {
    Packaged,
    Failed,
}

impl PackageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageStatus::Packaged => "packaged",
            PackageStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "packaged" => Some(PackageStatus::Packaged),
            "failed" => Some(PackageStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Package record in the cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageRecord {
    pub id: Option<i64>,
    pub identity: String,
    pub name: String,
    pub version: String,
    pub revision: Option<String>,
    pub package_path: Option<String>,
    pub status: PackageStatus,
    pub error_message: Option<String>,
    pub file_count: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Why a package has to be assembled instead of reused
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "reason")]
pub enum RebuildReason {
    /// Identity never packaged before
    NewIdentity,
    /// User forced repackaging
    Forced,
    /// Cache row exists but the artifact is gone from disk
    ArtifactMissing { path: String },
    /// Last attempt for this identity failed
    PreviousFailure { error: Option<String> },
}

/// Decision about whether an existing package can be reused
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReuseDecision {
    pub reusable: bool,
    pub package_path: Option<String>,
    pub reason: Option<RebuildReason>,
}

impl ReuseDecision {
    pub fn reuse(package_path: String) -> Self {
        Self {
            reusable: true,
            package_path: Some(package_path),
            reason: None,
        }
    }

    pub fn rebuild(reason: RebuildReason) -> Self {
        Self {
            reusable: false,
            package_path: None,
            reason: Some(reason),
        }
    }
}

/// Statistics over cached package identities
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheStats {
    pub total_identities: i64,
    pub packaged: i64,
    pub failed: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [PackageStatus::Packaged, PackageStatus::Failed] {
            assert_eq!(PackageStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(PackageStatus::from_str("bogus"), None);
    }

    #[test]
    fn test_decision_constructors() {
        let reuse = ReuseDecision::reuse("/tmp/pkg".into());
        assert!(reuse.reusable);
        assert_eq!(reuse.package_path.as_deref(), Some("/tmp/pkg"));

        let rebuild = ReuseDecision::rebuild(RebuildReason::NewIdentity);
        assert!(!rebuild.reusable);
        assert!(rebuild.reason.is_some());
    }
}
