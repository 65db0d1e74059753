//! `seedcull-core` — retention decision engine for a bounded seeding pool.
//!
//! On every pass the engine partitions the pool into exempt and eligible
//! members, sorts the eligible ones by a configurable two-level metric key,
//! and walks the over-budget tail issuing pause / remove / blacklist actions
//! until the free-space gate reports enough headroom.
//!
//! The host torrent inventory, the disk probe, and the upstream catalog
//! managers are collaborators behind traits ([`inventory::Inventory`],
//! [`inventory::DiskProbe`], [`catalog::CatalogClient`]); the engine itself
//! only ever decides from [`snapshot::TorrentSnapshot`] values captured at
//! pass start.

pub mod budget;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod exempt;
pub mod ignore;
pub mod inventory;
pub mod metrics;
pub mod rules;
pub mod select;
pub mod snapshot;

pub use config::{CatalogConfig, RetentionConfig, Rule, RuleEntry};
pub use engine::{PassReport, RetentionEngine};
pub use snapshot::{LabelInfo, TorrentSnapshot};
