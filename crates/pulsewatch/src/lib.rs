//! PulseWatch - monitor check and aggregation engine
//!
//! This library periodically probes HTTP/S endpoints, records every outcome
//! as an immutable heartbeat, and derives uptime and response-time figures
//! from the heartbeat history on demand.
//!
//! - [`scheduler`] fires sweeps over every known monitor
//! - [`probe`] performs a single check and classifies its outcome
//! - [`store`] holds the append-only heartbeat log
//! - [`aggregate`] and [`window`] turn heartbeats into statistics
//! - [`status`] answers the read side used by dashboards and status pages

pub mod aggregate;
pub mod error;
pub mod model;
pub mod probe;
pub mod scheduler;
pub mod status;
pub mod store;
pub mod window;

pub use error::{StoreError, ValidationError};
pub use model::{Heartbeat, HeartbeatStatus, Monitor, MonitorStatus, MonitorTarget, NewHeartbeat};
pub use probe::{CheckReport, ProbeExecutor, ReqwestTransport, Transport, TransportError};
pub use scheduler::{ChannelTicker, IntervalTicker, SweepScheduler, SweepStats, Ticker};
pub use status::{CurrentStatus, MonitorOverview, MonitorSummary, StatusService};
pub use store::{HeartbeatStore, LibsqlStore, MemoryStore, MonitorSource, Order};
pub use window::Window;

/// Default sweep cadence
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Default per-request probe timeout
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5000;

/// Default number of checks running at once within a sweep
pub const DEFAULT_SWEEP_CONCURRENCY: usize = 16;
