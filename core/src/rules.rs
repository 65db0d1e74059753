//! Override-rule resolution and evaluation.
//!
//! Tracker- and label-scoped rules supersede the two general rules for the
//! resources they match. Resolution appends every matching entry's rules in
//! configured order without deduplication; evaluation folds the list into a
//! single boolean.

use crate::config::RetentionConfig;
use crate::config::Rule;
use crate::metrics::Metric;
use crate::select::SelectOp;
use crate::snapshot::LabelInfo;
use crate::snapshot::TorrentSnapshot;

/// Case-insensitive substring containment.
///
/// The single matching function behind tracker exemptions, tracker rule
/// patterns, and label exemptions, so the matching policy can be revisited
/// in one place.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Rules applicable to one resource, with an explicit record of partial
/// resolution.
///
/// `label_error` is set when the label classifier could not be consulted:
/// the tracker rules gathered up to that point are still returned. An empty
/// rule list, for either reason, means "no override"; the general rules
/// apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedRules {
    pub rules: Vec<Rule>,
    pub label_error: Option<String>,
}

impl ResolvedRules {
    pub fn is_override(&self) -> bool {
        !self.rules.is_empty()
    }
}

/// Collect every override rule applicable to `t`.
///
/// Tracker entries match when the lower-cased pattern occurs in any announce
/// URL; label entries, consulted only when a classifier is active, match on
/// exact label equality. Repeated matches append repeatedly.
pub fn resolve(cfg: &RetentionConfig, t: &TorrentSnapshot, labels_active: bool) -> ResolvedRules {
    let mut resolved = ResolvedRules::default();

    for entry in &cfg.tracker_rules {
        if t.trackers.iter().any(|url| contains_ci(url, &entry.pattern)) {
            resolved.rules.extend(entry.rules.iter().cloned());
        }
    }

    if labels_active && !cfg.label_rules.is_empty() {
        match &t.label {
            LabelInfo::Labeled(label) => {
                for entry in &cfg.label_rules {
                    if entry.pattern == *label {
                        resolved.rules.extend(entry.rules.iter().cloned());
                    }
                }
            }
            LabelInfo::Unavailable { reason } => {
                resolved.label_error = Some(reason.clone());
            }
            LabelInfo::Unlabeled => {}
        }
    }

    resolved
}

/// Condition of a single rule: metric ≥ threshold, unsatisfiable when the
/// metric has no value.
fn rule_check(rule: &Rule, t: &TorrentSnapshot) -> bool {
    Metric::from_name(&rule.metric)
        .eval(t)
        .is_some_and(|v| v >= rule.threshold)
}

/// Evaluate the two general rules for a resource with no overrides.
///
/// Rule 1 fires when the primary metric is ≤ `min`; rule 2 when the
/// secondary metric is ≥ `min2`. Both enabled → joined by the configured
/// combinator; one enabled → used alone; neither → `false`.
pub fn general_condition(cfg: &RetentionConfig, t: &TorrentSnapshot) -> bool {
    let rule_1 = || {
        Metric::from_name(&cfg.filter)
            .eval(t)
            .is_some_and(|v| v <= cfg.min)
    };
    let rule_2 = || {
        Metric::from_name(&cfg.filter2)
            .eval(t)
            .is_some_and(|v| v >= cfg.min2)
    };
    match (cfg.rule_1_enabled, cfg.rule_2_enabled) {
        (true, true) => SelectOp::from_name(&cfg.sel_func).apply(rule_1(), rule_2()),
        (true, false) => rule_1(),
        (false, true) => rule_2(),
        (false, false) => false,
    }
}

/// Fold a non-empty override list into the removal condition.
///
/// The list is stable-sorted by combinator first (AND-joined rules
/// evaluate ahead of OR/XOR ones); the first rule seeds the running result
/// directly, every later rule joins via its own combinator.
pub fn evaluate_override(rules: &[Rule], t: &TorrentSnapshot) -> bool {
    let mut ordered: Vec<&Rule> = rules.iter().collect();
    ordered.sort_by_key(|rule| SelectOp::from_name(&rule.op));

    let mut iter = ordered.into_iter();
    let Some(first) = iter.next() else {
        return false;
    };
    let mut cond = rule_check(first, t);
    for rule in iter {
        let check = rule_check(rule, t);
        cond = SelectOp::from_name(&rule.op).apply(check, cond);
    }
    cond
}
