//! Read side consumed by dashboards and status pages.
//!
//! Every figure is recomputed from stored heartbeats on request; nothing
//! here caches or persists aggregates.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate;
use crate::error::StoreError;
use crate::model::{Heartbeat, Monitor, MonitorStatus};
use crate::store::{HeartbeatStore, Order};
use crate::window::{Window, Windowed};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Latest known state of a monitor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStatus {
    pub status: MonitorStatus,
    pub response_time: Option<u64>,
    pub response_code: Option<u16>,
    pub created_at: Option<DateTime<Utc>>,
}

impl CurrentStatus {
    fn from_latest(latest: Option<&Heartbeat>) -> Self {
        match latest {
            Some(hb) => Self {
                status: hb.status.into(),
                response_time: hb.response_time,
                response_code: Some(hb.response_code),
                created_at: Some(hb.created_at),
            },
            None => Self {
                status: MonitorStatus::Unknown,
                response_time: None,
                response_code: None,
                created_at: None,
            },
        }
    }
}

/// Uptime per window
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeFigures {
    pub last24h: Option<f64>,
    pub last7d: Option<f64>,
    pub last30d: Option<f64>,
}

/// Average response time per window
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseTimeFigures {
    pub last24h: Option<f64>,
    pub last7d: Option<f64>,
}

/// Everything a monitor detail page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSummary {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub current: CurrentStatus,
    pub uptime: UptimeFigures,
    pub response_times: ResponseTimeFigures,
    /// Last 24 hours, newest first
    pub heartbeats: Vec<Heartbeat>,
}

/// One row of a dashboard monitor list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorOverview {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub latest_status: MonitorStatus,
    pub latest_response_time: Option<u64>,
    pub last_checked: Option<DateTime<Utc>>,
    pub uptime: Option<f64>,
}

/// Answers status, uptime, and response-time questions from the heartbeat store
#[derive(Clone)]
pub struct StatusService {
    store: Arc<dyn HeartbeatStore>,
    clock: Clock,
}

impl StatusService {
    pub fn new(store: Arc<dyn HeartbeatStore>) -> Self {
        Self { store, clock: Arc::new(Utc::now) }
    }

    /// Use a fixed or simulated notion of "now"
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    async fn heartbeats_in(&self, monitor_id: Uuid, window: Window, now: DateTime<Utc>) -> Result<Vec<Heartbeat>, StoreError> {
        self.store.query(monitor_id, window.cutoff(now), Order::Ascending).await
    }

    pub async fn get_current_status(&self, monitor_id: Uuid) -> Result<CurrentStatus, StoreError> {
        let latest = self.store.latest(monitor_id).await?;
        Ok(CurrentStatus::from_latest(latest.as_ref()))
    }

    pub async fn get_uptime(&self, monitor_id: Uuid, window: Window) -> Result<Option<f64>, StoreError> {
        let now = self.now();
        let heartbeats = self.heartbeats_in(monitor_id, window, now).await?;
        Ok(aggregate::uptime(crate::window::within(&heartbeats, now, window)))
    }

    pub async fn get_average_response_time(&self, monitor_id: Uuid, window: Window) -> Result<Option<f64>, StoreError> {
        let now = self.now();
        let heartbeats = self.heartbeats_in(monitor_id, window, now).await?;
        Ok(aggregate::average_response_time(crate::window::within(&heartbeats, now, window)))
    }

    /// Detail view: one 30 day query sliced into every window
    pub async fn summary(&self, monitor: &Monitor) -> Result<MonitorSummary, StoreError> {
        let now = self.now();
        let heartbeats = self.heartbeats_in(monitor.id, Window::Month, now).await?;
        let windowed = Windowed::slice(&heartbeats, now);

        let latest = match aggregate::latest(&heartbeats) {
            Some(hb) => Some(hb.clone()),
            // Older than 30 days still counts as the current state
            None => self.store.latest(monitor.id).await?,
        };

        let mut recent: Vec<Heartbeat> = windowed.day.iter().map(|hb| (*hb).clone()).collect();
        recent.reverse();

        Ok(MonitorSummary {
            id: monitor.id,
            name: monitor.name.clone(),
            url: monitor.url.clone(),
            current: CurrentStatus::from_latest(latest.as_ref()),
            uptime: UptimeFigures {
                last24h: aggregate::uptime(windowed.day.iter().copied()),
                last7d: aggregate::uptime(windowed.week.iter().copied()),
                last30d: aggregate::uptime(windowed.month.iter().copied()),
            },
            response_times: ResponseTimeFigures {
                last24h: aggregate::average_response_time(windowed.day.iter().copied()),
                last7d: aggregate::average_response_time(windowed.week.iter().copied()),
            },
            heartbeats: recent,
        })
    }

    /// List view: latest state plus 24 hour uptime for each monitor
    pub async fn overview(&self, monitors: &[Monitor]) -> Result<Vec<MonitorOverview>, StoreError> {
        let now = self.now();
        let mut rows = Vec::with_capacity(monitors.len());

        for monitor in monitors {
            let heartbeats = self.heartbeats_in(monitor.id, Window::Day, now).await?;
            let latest = self.store.latest(monitor.id).await?;

            rows.push(MonitorOverview {
                id: monitor.id,
                name: monitor.name.clone(),
                url: monitor.url.clone(),
                latest_status: latest.as_ref().map_or(MonitorStatus::Unknown, |hb| hb.status.into()),
                latest_response_time: latest.as_ref().and_then(|hb| hb.response_time),
                last_checked: latest.as_ref().map(|hb| hb.created_at),
                uptime: aggregate::uptime(&heartbeats),
            });
        }

        Ok(rows)
    }
}
