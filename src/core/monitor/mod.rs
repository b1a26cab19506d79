//! Sampling, reconciliation, decay and ranking engine.
//!
//! A [`Sampler`] reads kernel metrics once per pass into a [`MonitorContext`];
//! the [`SamplerRuntime`] fires passes on a timer and hands the context to the
//! screen under its mask.

pub mod decay;
pub mod logins;
pub mod messages;
pub mod metrics;
pub mod parse;
pub mod rank;
pub mod registry;
pub mod runtime;
pub mod sampler;
pub mod scheduler;
pub mod source;
pub mod symbols;
pub mod users;

pub use decay::DecayRing;
pub use logins::{LoginSession, LoginSummary, PresenceStatus, WatchGroup};
pub use messages::{Message, MessageQueue, Priority};
pub use metrics::{
    AggregateCpu, CpuPercentages, FilesystemUsage, GroupView, LoadAverages, MemoryState,
    MonitorSnapshot, ProcessView,
};
pub use rank::{top_k, SortKey};
pub use registry::{LiveProcess, ProcessRecord, ProcessRegistry};
pub use runtime::{period_from_secs, MaskGuard, SamplerRuntime};
pub use sampler::{MonitorContext, Sampler, SamplerSettings};
pub use scheduler::{FireOutcome, SchedulerState, UpdateScheduler};
pub use source::{MetricSource, ProcFs};
pub use symbols::{candidate_paths, SymbolTable};
pub use users::{SystemUsers, UserLookup};
