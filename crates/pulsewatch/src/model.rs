use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::ValidationError;

/// Outcome recorded on a heartbeat
///
/// A stored heartbeat is always either up or down. "unknown" only exists as
/// a derived state, see [`MonitorStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartbeatStatus {
    Up,
    Down,
}

impl HeartbeatStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HeartbeatStatus::Up => "up",
            HeartbeatStatus::Down => "down",
        }
    }
}

impl fmt::Display for HeartbeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeartbeatStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(HeartbeatStatus::Up),
            "down" => Ok(HeartbeatStatus::Down),
            other => Err(format!("unknown heartbeat status `{other}`")),
        }
    }
}

/// Status of a monitor as presented to readers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    Up,
    Down,
    Unknown,
}

impl From<HeartbeatStatus> for MonitorStatus {
    fn from(status: HeartbeatStatus) -> Self {
        match status {
            HeartbeatStatus::Up => MonitorStatus::Up,
            HeartbeatStatus::Down => MonitorStatus::Down,
        }
    }
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorStatus::Up => write!(f, "up"),
            MonitorStatus::Down => write!(f, "down"),
            MonitorStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// An endpoint under observation, owned by one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl Monitor {
    /// Build a new monitor after validating its name and URL
    pub fn new(owner_id: Uuid, name: impl Into<String>, url: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        let url = url.into().trim().to_string();

        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        validate_url(&url)?;

        Ok(Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            url,
            created_at: Utc::now(),
        })
    }

    pub fn target(&self) -> MonitorTarget {
        MonitorTarget {
            id: self.id,
            name: self.name.clone(),
            url: self.url.clone(),
        }
    }
}

/// Check that a URL can be probed: it must parse, use http or https, and name a host
pub fn validate_url(raw: &str) -> Result<(), ValidationError> {
    let url = Url::parse(raw).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ValidationError::UnsupportedScheme(other.to_string())),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::MissingHost);
    }

    Ok(())
}

/// The slice of a monitor the sweep needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorTarget {
    pub id: Uuid,
    pub name: String,
    pub url: String,
}

/// A check outcome that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHeartbeat {
    pub monitor_id: Uuid,
    pub status: HeartbeatStatus,
    pub response_time: Option<u64>,
    pub response_code: u16,
    pub error_message: Option<String>,
}

impl NewHeartbeat {
    /// A reachable endpoint that answered with a 2xx status
    pub fn up(monitor_id: Uuid, response_time: u64, response_code: u16) -> Self {
        Self {
            monitor_id,
            status: HeartbeatStatus::Up,
            response_time: Some(response_time),
            response_code,
            error_message: None,
        }
    }

    /// An endpoint that failed, either at transport level or with a non-2xx status
    pub fn down(monitor_id: Uuid, response_code: u16, error_message: impl Into<String>) -> Self {
        Self {
            monitor_id,
            status: HeartbeatStatus::Down,
            response_time: None,
            response_code,
            error_message: Some(error_message.into()),
        }
    }

    /// Attach the store-assigned identity and creation time
    pub fn into_heartbeat(self, id: i64, created_at: DateTime<Utc>) -> Heartbeat {
        Heartbeat {
            id,
            monitor_id: self.monitor_id,
            status: self.status,
            response_time: self.response_time,
            response_code: self.response_code,
            error_message: self.error_message,
            created_at,
        }
    }
}

/// One immutable observation of a monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heartbeat {
    pub id: i64,
    pub monitor_id: Uuid,
    pub status: HeartbeatStatus,
    /// Milliseconds, only present when up
    pub response_time: Option<u64>,
    pub response_code: u16,
    /// Only present when down
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Heartbeat {
    pub fn is_up(&self) -> bool {
        self.status == HeartbeatStatus::Up
    }
}
