//! Named metrics a retention policy can sort and filter by.
//!
//! The namespace is closed: configuration refers to metrics by wire name,
//! and an unrecognized name resolves to [`Metric::Ratio`]. The fallback is
//! deliberate and must stay: documents written by older releases must keep
//! driving passes instead of failing lookup.

use crate::snapshot::TorrentSnapshot;

/// One of the built-in per-torrent metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Ratio,
    AgeDays,
    SeedTime,
    Seeders,
    Availability,
    TimeSinceTransfer,
    TimeSeenComplete,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Ratio,
        Metric::AgeDays,
        Metric::SeedTime,
        Metric::Seeders,
        Metric::Availability,
        Metric::TimeSinceTransfer,
        Metric::TimeSeenComplete,
    ];

    /// Resolve a configured name, substituting [`Metric::Ratio`] for anything
    /// unrecognized.
    pub fn from_name(name: &str) -> Metric {
        match name {
            "func_ratio" => Metric::Ratio,
            "func_added" => Metric::AgeDays,
            "func_seed_time" => Metric::SeedTime,
            "func_seeders" => Metric::Seeders,
            "func_availability" => Metric::Availability,
            "func_time_since_transfer" => Metric::TimeSinceTransfer,
            "func_time_seen_complete" => Metric::TimeSeenComplete,
            _ => Metric::Ratio,
        }
    }

    /// Stable wire name used in configuration documents.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Ratio => "func_ratio",
            Metric::AgeDays => "func_added",
            Metric::SeedTime => "func_seed_time",
            Metric::Seeders => "func_seeders",
            Metric::Availability => "func_availability",
            Metric::TimeSinceTransfer => "func_time_since_transfer",
            Metric::TimeSeenComplete => "func_time_seen_complete",
        }
    }

    /// Human-readable label for UI rule pickers.
    pub fn display_label(self) -> &'static str {
        match self {
            Metric::Ratio => "Ratio",
            Metric::AgeDays => "Age in days",
            Metric::SeedTime => "Seed Time (h)",
            Metric::Seeders => "Seeders",
            Metric::Availability => "Availability",
            Metric::TimeSinceTransfer => "Time since transfer (h)",
            Metric::TimeSeenComplete => "Time since seen complete (h)",
        }
    }

    /// Evaluate against a snapshot. `None` means the underlying field could
    /// not be obtained; callers must treat that as "condition not
    /// satisfiable", not as zero.
    pub fn eval(self, t: &TorrentSnapshot) -> Option<f64> {
        match self {
            Metric::Ratio => t.ratio,
            Metric::AgeDays => Some(t.age_days()),
            Metric::SeedTime => t.seeding_hours(),
            Metric::Seeders => t.seeders.map(f64::from),
            Metric::Availability => t.availability,
            Metric::TimeSinceTransfer => t.hours_since_transfer,
            Metric::TimeSeenComplete => t.hours_since_seen_complete,
        }
    }

    /// Static name → display-label catalog for UI population.
    pub fn catalog() -> Vec<(&'static str, &'static str)> {
        Metric::ALL
            .iter()
            .map(|m| (m.name(), m.display_label()))
            .collect()
    }
}
