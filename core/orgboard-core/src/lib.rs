//! # orgboard-core
//!
//! Core library for orgboard, an organizational quality dashboard. This
//! crate owns the canonical application state (teams, personnel, tasks,
//! activities, notifications, analytics) and its persistence: merge-on-load
//! recovery, debounced autosave with an interval safety net, and periodic
//! backups.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Clients can wrap with
//!   async if needed.
//! - **Not thread-safe**: Clients provide their own synchronization.
//! - **Graceful degradation**: A corrupt or missing snapshot loads the
//!   default state; persistence failures degrade to memory-only operation.
//!   Only rejected mutations surface as errors.
//! - **Injected storage**: Everything durable goes through the
//!   [`StorageBackend`] trait, so tests and alternate backends plug in
//!   without touching the store.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use orgboard_core::{ApplicationStateStore, FileStorage};
//!
//! let storage = FileStorage::new(FileStorage::default_root().expect("home dir"));
//! let mut store = ApplicationStateStore::load(storage);
//! let hits = store.search("smoke");
//! store.flush_now();
//! ```

pub mod analytics;
pub mod autosave;
pub mod defaults;
pub mod error;
pub mod merge;
pub mod search;
pub mod storage;
pub mod store;
pub mod types;

// Re-export commonly used items at crate root
pub use analytics::{AnalyticsReport, AnalyticsSnapshot, Insight, InsightSeverity};
pub use defaults::default_state;
pub use error::{Result, StoreError};
pub use search::{SearchBreakdown, SearchCategory, SearchHit};
pub use storage::{keys, FileStorage, MemoryStorage, StorageBackend};
pub use store::{ApplicationStateStore, PersonDraft, TaskDraft, TeamDraft};
pub use types::*;
