/// Probe module - performs single reachability checks
///
/// This module is responsible for:
/// - Issuing the outbound HTTP GET through a [`Transport`]
/// - Mapping transport failures onto canonical response codes
/// - Persisting exactly one heartbeat per check
pub mod checker;
pub mod classify;
pub mod executor;

pub use checker::{HttpResponse, ReqwestTransport, Transport};
pub use classify::TransportError;
pub use executor::{CheckReport, ProbeExecutor};
