//! The Last Meadow bot core
//!
//! Platform-agnostic decision policy and state synchronization for the Last
//! Meadow idle game bot. The rendered game, its persisted store and the host
//! timer are reached only through the [`Surface`], [`KeyValueStore`] and
//! [`Scheduler`] traits; the browser-backed implementations live in the
//! `meadow-bot` crate.

pub mod bot;
pub mod config;
pub mod maintenance;
pub mod mirror;
pub mod offer;
pub mod patcher;
pub mod policy;
pub mod report;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod surface;
#[doc(hidden)]
pub mod testing;

// Re-export commonly used types
pub use bot::{Bot, BotError, BotState, DecisionOutcome, Scheduler, TaskKind};
pub use config::{BotConfig, ConfigError};
pub use maintenance::{HazardWatch, MaintenanceAction};
pub use mirror::{GameStateSummary, MirrorError, StateMirror};
pub use offer::{Offer, OfferId, OfferKind, UPGRADE_EFFICIENCY, parse_count, parse_rate};
pub use patcher::{PatchReport, StatePatcher, apply_unstick_patch, apply_upgrade_patch};
pub use policy::{PolicyOutcome, PurchaseDecision, PurchaseReason, decide};
pub use report::{
    FinalStatus, FinalSummary, RecordingSink, ReportSink, StatusReport, StuckDetector,
    format_runtime,
};
pub use snapshot::{GameSnapshot, PurchasedItem, STORE_KEY, SnapshotError, StoreDocument};
pub use stats::RunStats;
pub use store::{GameStore, KeyValueStore, MemoryStore, StoreError};
pub use surface::{Query, RawOffer, Surface, SurfaceError, SurfaceReader, Target, Transient};
