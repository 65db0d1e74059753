//! Budget accounting: which eligible torrents are candidates for action.

use crate::config::RetentionConfig;
use crate::metrics::Metric;
use crate::snapshot::TorrentSnapshot;

/// Compute the action set for this pass.
///
/// Eligible torrents are sorted ascending by the two-level
/// (primary, secondary) metric key, with absent values sorting lowest, and
/// the slice at or beyond the effective cap is returned in DESCENDING key
/// order: the dispatcher starts at the highest key and walks down toward the
/// cap boundary, so the lowest-keyed torrents are never evaluated for
/// action. That traversal direction is long-standing behavior even for
/// metrics where a higher value means a healthier torrent; do not invert it.
///
/// The effective cap is `max_seeds` minus the excluded count when
/// `count_exempt` is set, floored at zero. When the pool fits the budget
/// (`eligible + (excluded iff count_exempt) <= max_seeds`) the result is
/// empty and the pass takes no action at all.
pub fn plan(
    cfg: &RetentionConfig,
    mut eligible: Vec<TorrentSnapshot>,
    excluded_count: usize,
) -> Vec<TorrentSnapshot> {
    // Negative max means unlimited: nothing to do.
    if cfg.max_seeds < 0 {
        return Vec::new();
    }
    let max_seeds = cfg.max_seeds as usize;

    let counted = eligible.len() + if cfg.count_exempt { excluded_count } else { 0 };
    if counted <= max_seeds {
        return Vec::new();
    }

    let effective_cap = if cfg.count_exempt {
        max_seeds.saturating_sub(excluded_count)
    } else {
        max_seeds
    };

    let primary = Metric::from_name(&cfg.filter);
    let secondary = Metric::from_name(&cfg.filter2);
    let key = |t: &TorrentSnapshot| {
        (
            primary.eval(t).unwrap_or(f64::NEG_INFINITY),
            secondary.eval(t).unwrap_or(f64::NEG_INFINITY),
        )
    };
    eligible.sort_by(|a, b| {
        let (a1, a2) = key(a);
        let (b1, b2) = key(b);
        a1.total_cmp(&b1).then(a2.total_cmp(&b2))
    });

    let mut action_set: Vec<TorrentSnapshot> = eligible.split_off(effective_cap.min(eligible.len()));
    action_set.reverse();
    action_set
}
