//! The retention policy document.
//!
//! Key names and defaults stay compatible with documents written by earlier
//! releases; unknown metric/combinator names inside the document resolve via
//! the registry fallbacks at evaluation time, never at load time.

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogKind;

/// One override rule: combinator, metric, threshold.
///
/// The rule condition is `metric ≥ threshold`; the combinator says how the
/// outcome joins the running result when the rule list is folded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub op: String,
    pub metric: String,
    pub threshold: f64,
}

/// An ordered (pattern → rules) entry.
///
/// For tracker rules the pattern is matched case-insensitively as a
/// substring of any announce URL; for label rules it must equal the
/// resource's label exactly. A `Vec` rather than a map keeps the configured
/// insertion order through serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEntry {
    pub pattern: String,
    pub rules: Vec<Rule>,
}

/// Connection settings for one upstream catalog manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Full retention policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Maximum resident torrents; negative means unlimited (pass is a no-op).
    #[serde(default)]
    pub max_seeds: i64,

    /// Primary metric name; rule 1 fires when `metric ≤ min`.
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default)]
    pub min: f64,

    /// Secondary metric name; rule 2 fires when `metric ≥ min2`.
    #[serde(default = "default_filter2")]
    pub filter2: String,
    #[serde(default)]
    pub min2: f64,

    /// Combinator joining rules 1 and 2 when both are enabled.
    #[serde(default = "default_sel_func")]
    pub sel_func: String,
    #[serde(default = "default_true")]
    pub rule_1_enabled: bool,
    #[serde(default = "default_true")]
    pub rule_2_enabled: bool,

    /// Exempted resources consume the cap when set.
    #[serde(default)]
    pub count_exempt: bool,

    /// Exempt tracker substrings.
    #[serde(default)]
    pub trackers: Vec<String>,
    /// Exempt label substrings.
    #[serde(default)]
    pub labels: Vec<String>,

    /// Per-tracker override rules, in configured order.
    #[serde(default)]
    pub tracker_rules: Vec<RuleEntry>,
    /// Per-label override rules, in configured order.
    #[serde(default)]
    pub label_rules: Vec<RuleEntry>,

    /// Whether the remove action is taken for unfinished torrents at all.
    #[serde(default = "default_true")]
    pub remove: bool,
    /// Delete payload data when removing an unfinished torrent.
    #[serde(default)]
    pub remove_data: bool,
    /// Delete payload data when removing a finished torrent.
    #[serde(default)]
    pub seed_remove_data: bool,

    /// Master switch for the action dispatcher.
    #[serde(default)]
    pub enabled: bool,

    /// Minimum free space in GiB; negative disables the check entirely.
    #[serde(default = "default_hdd_space")]
    pub hdd_space: f64,

    /// Scheduler period in hours; fractional values are allowed.
    #[serde(default = "default_interval")]
    pub interval: f64,

    /// Seeding hours after which a finished torrent is removed.
    #[serde(default = "default_seedtime_limit")]
    pub seedtime_limit: f64,
    /// Seeding hours after which a finished torrent is paused.
    #[serde(default = "default_seedtime_pause")]
    pub seedtime_pause: f64,
    /// Whether pausing is permitted at all.
    #[serde(default)]
    pub pause_torrents: bool,

    #[serde(default)]
    pub sonarr: CatalogConfig,
    #[serde(default)]
    pub radarr: CatalogConfig,
    #[serde(default)]
    pub lidarr: CatalogConfig,
}

fn default_filter() -> String {
    "func_ratio".to_string()
}

fn default_filter2() -> String {
    "func_added".to_string()
}

fn default_sel_func() -> String {
    "and".to_string()
}

fn default_true() -> bool {
    true
}

fn default_hdd_space() -> f64 {
    -1.0
}

fn default_interval() -> f64 {
    0.5
}

fn default_seedtime_limit() -> f64 {
    120.0
}

fn default_seedtime_pause() -> f64 {
    48.0
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_seeds: 0,
            filter: default_filter(),
            min: 0.0,
            filter2: default_filter2(),
            min2: 0.0,
            sel_func: default_sel_func(),
            rule_1_enabled: true,
            rule_2_enabled: true,
            count_exempt: false,
            trackers: Vec::new(),
            labels: Vec::new(),
            tracker_rules: Vec::new(),
            label_rules: Vec::new(),
            remove: true,
            remove_data: false,
            seed_remove_data: false,
            enabled: false,
            hdd_space: default_hdd_space(),
            interval: default_interval(),
            seedtime_limit: default_seedtime_limit(),
            seedtime_pause: default_seedtime_pause(),
            pause_torrents: false,
            sonarr: CatalogConfig::default(),
            radarr: CatalogConfig::default(),
            lidarr: CatalogConfig::default(),
        }
    }
}

impl RetentionConfig {
    /// Connection settings for one catalog kind.
    pub fn catalog(&self, kind: CatalogKind) -> &CatalogConfig {
        match kind {
            CatalogKind::Sonarr => &self.sonarr,
            CatalogKind::Radarr => &self.radarr,
            CatalogKind::Lidarr => &self.lidarr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_historical_document() {
        let cfg = RetentionConfig::default();
        assert_eq!(cfg.max_seeds, 0);
        assert_eq!(cfg.filter, "func_ratio");
        assert_eq!(cfg.filter2, "func_added");
        assert_eq!(cfg.sel_func, "and");
        assert!(cfg.rule_1_enabled && cfg.rule_2_enabled);
        assert!(!cfg.enabled);
        assert!(cfg.remove);
        assert_eq!(cfg.hdd_space, -1.0);
        assert_eq!(cfg.interval, 0.5);
        assert_eq!(cfg.seedtime_limit, 120.0);
        assert_eq!(cfg.seedtime_pause, 48.0);
        assert!(!cfg.sonarr.enabled && !cfg.radarr.enabled && !cfg.lidarr.enabled);
    }

    #[test]
    fn sparse_document_fills_defaults() {
        let cfg: RetentionConfig =
            serde_json::from_str(r#"{"max_seeds": 25, "enabled": true}"#).expect("parse");
        assert_eq!(cfg.max_seeds, 25);
        assert!(cfg.enabled);
        assert_eq!(cfg.filter, "func_ratio");
        assert_eq!(cfg.seedtime_limit, 120.0);
    }

    #[test]
    fn rule_entries_keep_insertion_order() {
        let json = r#"{
            "tracker_rules": [
                {"pattern": "beta.example", "rules": [{"op": "and", "metric": "func_ratio", "threshold": 2.0}]},
                {"pattern": "alpha.example", "rules": [{"op": "or", "metric": "func_seeders", "threshold": 5.0}]}
            ]
        }"#;
        let cfg: RetentionConfig = serde_json::from_str(json).expect("parse");
        assert_eq!(cfg.tracker_rules[0].pattern, "beta.example");
        assert_eq!(cfg.tracker_rules[1].pattern, "alpha.example");

        let round = serde_json::to_string(&cfg).expect("serialize");
        let back: RetentionConfig = serde_json::from_str(&round).expect("reparse");
        assert_eq!(back.tracker_rules, cfg.tracker_rules);
    }
}
