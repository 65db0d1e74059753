//! Point-in-time view of one pool member.
//!
//! A pass decides from these snapshots only. Status fields the inventory may
//! fail to produce are `Option`: a missing value means "no value", never
//! zero. A missing label is kept distinct from a label lookup that failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of asking the label classifier about a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelInfo {
    /// The classifier ran and the resource carries no label.
    Unlabeled,
    /// The classifier returned this label.
    Labeled(String),
    /// The classifier could not be consulted; the cause is carried so the
    /// rule resolver can report a partial resolution.
    Unavailable { reason: String },
}

impl LabelInfo {
    /// The label string, when one is actually present.
    pub fn as_label(&self) -> Option<&str> {
        match self {
            LabelInfo::Labeled(label) => Some(label),
            LabelInfo::Unlabeled | LabelInfo::Unavailable { .. } => None,
        }
    }
}

/// Immutable view of one torrent at decision time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentSnapshot {
    pub id: String,
    pub name: String,
    /// Content info-hash as reported by the inventory (any case).
    pub info_hash: String,
    /// Announce URLs across every tracker tier.
    pub trackers: Vec<String>,
    pub added_at: DateTime<Utc>,
    /// When this snapshot was captured; age is measured against this instant
    /// so one pass sees a single consistent clock.
    pub captured_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeding_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeders: Option<u32>,
    /// Distributed-copies estimate for the swarm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_since_transfer: Option<f64>,
    /// Hours since the swarm was last seen fully complete; `None` if never.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_since_seen_complete: Option<f64>,
    pub finished: bool,
    pub paused: bool,
    pub label: LabelInfo,
}

impl TorrentSnapshot {
    /// Cumulative seeding time in hours, the unit thresholds use.
    pub fn seeding_hours(&self) -> Option<f64> {
        self.seeding_secs.map(|s| s as f64 / 3600.0)
    }

    /// Age since the torrent was added, in days.
    pub fn age_days(&self) -> f64 {
        let secs = (self.captured_at - self.added_at).num_seconds();
        secs as f64 / 86_400.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;

    fn snapshot() -> TorrentSnapshot {
        let now = Utc::now();
        TorrentSnapshot {
            id: "t1".to_string(),
            name: "t1".to_string(),
            info_hash: "abcd".to_string(),
            trackers: vec![],
            added_at: now - TimeDelta::days(3),
            captured_at: now,
            ratio: Some(1.0),
            seeding_secs: Some(7200),
            seeders: None,
            availability: None,
            hours_since_transfer: None,
            hours_since_seen_complete: None,
            finished: false,
            paused: false,
            label: LabelInfo::Unlabeled,
        }
    }

    #[test]
    fn seeding_hours_converts_seconds() {
        assert_eq!(snapshot().seeding_hours(), Some(2.0));
    }

    #[test]
    fn seeding_hours_absent_when_unread() {
        let mut s = snapshot();
        s.seeding_secs = None;
        assert_eq!(s.seeding_hours(), None);
    }

    #[test]
    fn age_in_days_from_capture_instant() {
        let age = snapshot().age_days();
        assert!((age - 3.0).abs() < 0.01, "age was {age}");
    }

    #[test]
    fn label_accessor_ignores_failures() {
        assert_eq!(LabelInfo::Labeled("radarr".to_string()).as_label(), Some("radarr"));
        assert_eq!(LabelInfo::Unlabeled.as_label(), None);
        let failed = LabelInfo::Unavailable {
            reason: "classifier offline".to_string(),
        };
        assert_eq!(failed.as_label(), None);
    }
}
