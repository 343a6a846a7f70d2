//! Change feed for tracker mutations.
//!
//! Watchers receive events over bounded in-process channels:
//! - Record changes (added, updated, removed)
//! - Recomputed statistics after every mutation
//! - Quota denials
//!
//! Watchers support:
//! - Filtering by event kind and subscription id
//! - Replay of the current collection before live events
//! - Bounded buffers with slow-watcher dropping
//!
//! # Example
//!
//! ```ignore
//! let handle = tracker.watch(WatchConfig {
//!     filter: WatchFilter::stats(),
//!     ..Default::default()
//! });
//!
//! while let Ok(event) = handle.try_recv() {
//!     match event {
//!         TrackerEvent::StatsChanged { stats, .. } => render_summary(&stats),
//!         TrackerEvent::Dropped { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

mod manager;
mod types;

pub use manager::WatchManager;
pub use types::{DropReason, TrackerEvent, WatchConfig, WatchFilter, WatchHandle, WatchId};
