//! Exemption filter: splits the pool into eligible and excluded members.

use crate::config::RetentionConfig;
use crate::rules::contains_ci;
use crate::snapshot::LabelInfo;
use crate::snapshot::TorrentSnapshot;

/// Result of partitioning one pool snapshot, preserving enumeration order
/// within each side.
#[derive(Debug, Default)]
pub struct Partition {
    pub eligible: Vec<TorrentSnapshot>,
    pub excluded: Vec<TorrentSnapshot>,
}

/// Partition the pool.
///
/// A torrent is excluded when the operator flagged it ignored, when any of
/// its announce URLs contains a configured exempt-tracker substring, or,
/// with an active label classifier, when its label contains a configured
/// exempt-label substring. Everything else is eligible.
pub fn partition<F>(
    pool: Vec<TorrentSnapshot>,
    is_ignored: F,
    cfg: &RetentionConfig,
    labels_active: bool,
) -> Partition
where
    F: Fn(&str) -> bool,
{
    let mut partition = Partition::default();

    for t in pool {
        let ignored = is_ignored(&t.id);
        let tracker_exempt = t
            .trackers
            .iter()
            .any(|url| cfg.trackers.iter().any(|pat| contains_ci(url, pat)));
        let label_exempt = labels_active
            && match &t.label {
                LabelInfo::Labeled(label) => {
                    cfg.labels.iter().any(|pat| contains_ci(label, pat))
                }
                LabelInfo::Unlabeled | LabelInfo::Unavailable { .. } => false,
            };

        if ignored || tracker_exempt || label_exempt {
            tracing::debug!(
                "exempting {} (ignored={ignored}, tracker={tracker_exempt}, label={label_exempt})",
                t.name
            );
            partition.excluded.push(t);
        } else {
            partition.eligible.push(t);
        }
    }

    partition
}
