//! chime-engine - Alarm scheduling engine
//!
//! Owns the shared registries, the self-scaling worker pool, and the
//! command dispatch surface the console binary drives.
//!
//! ## Architecture
//!
//! ```text
//!  +--------------+   submit/cancel    +----------------+
//!  | AlarmEngine  |------------------->| AlarmRegistry  |
//!  | (dispatch)   |                    | (BTreeMap)     |
//!  +------+-------+                    +--------+-------+
//!         | spawns                              | claim / poll
//!         v                                     v
//!  +--------------+   slot updates     +----------------+
//!  | alarm workers|------------------->| WorkerRegistry |
//!  | (tokio tasks)|                    | (BTreeMap)     |
//!  +------+-------+                    +----------------+
//!         | broadcast
//!         v
//!  EngineEvent subscribers (console printer)
//! ```
//!
//! Workers poll on a fixed interval rather than sleeping until the next
//! deadline, so an announcement lands within one poll interval of the
//! alarm expiring. Each worker serves a fixed number of slots and retires
//! itself when every slot drains; the pool grows again on demand.
//!
//! ## Panic-Free Guarantees
//!
//! This crate is written to never panic in production:
//! - No `unwrap()` or `expect()` outside of tests
//! - Mutex poisoning surfaces as `RegistryError::LockPoisoned`
//! - Broadcast sends ignore the no-subscriber error case
//! - No array indexing without bounds checks

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod monitor;
pub mod registry;

mod worker;

pub use config::{ConfigError, EngineConfig};
pub use engine::{AlarmEngine, Reply};
pub use error::{EngineError, EngineResult};
pub use events::{EngineEvent, EVENT_BUFFER};
pub use monitor::spawn_monitor_task;
pub use registry::{
    AlarmRegistry, RegistryError, RegistryResult, SlotPoll, WorkerRegistry, WorkerSnapshot,
};
