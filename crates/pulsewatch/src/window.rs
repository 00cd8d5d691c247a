//! Fixed lookback windows over a heartbeat sequence.
//!
//! Filtering is a pure function of the heartbeats and a caller-supplied
//! "now", so the helpers here never read the clock themselves.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Heartbeat;

/// Lookback period used to scope aggregate calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Window {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl Window {
    pub const ALL: [Window; 3] = [Window::Day, Window::Week, Window::Month];

    pub fn duration(self) -> Duration {
        match self {
            Window::Day => Duration::hours(24),
            Window::Week => Duration::days(7),
            Window::Month => Duration::days(30),
        }
    }

    /// Oldest creation time still inside the window
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Window::Day => "24h",
            Window::Week => "7d",
            Window::Month => "30d",
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Window {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" | "1d" => Ok(Window::Day),
            "7d" => Ok(Window::Week),
            "30d" => Ok(Window::Month),
            other => Err(format!("unsupported window `{other}`, expected one of 24h, 7d, 30d")),
        }
    }
}

/// Heartbeats created at or after `now - window`, in their original order
pub fn within<'a>(heartbeats: &'a [Heartbeat], now: DateTime<Utc>, window: Window) -> Vec<&'a Heartbeat> {
    let cutoff = window.cutoff(now);
    heartbeats.iter().filter(|hb| hb.created_at >= cutoff).collect()
}

/// The same heartbeat sequence cut into every standard window
#[derive(Debug, Clone)]
pub struct Windowed<'a> {
    pub day: Vec<&'a Heartbeat>,
    pub week: Vec<&'a Heartbeat>,
    pub month: Vec<&'a Heartbeat>,
}

impl<'a> Windowed<'a> {
    pub fn slice(heartbeats: &'a [Heartbeat], now: DateTime<Utc>) -> Self {
        Self {
            day: within(heartbeats, now, Window::Day),
            week: within(heartbeats, now, Window::Week),
            month: within(heartbeats, now, Window::Month),
        }
    }

    pub fn get(&self, window: Window) -> &[&'a Heartbeat] {
        match window {
            Window::Day => &self.day,
            Window::Week => &self.week,
            Window::Month => &self.month,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewHeartbeat;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(id: i64, created_at: DateTime<Utc>) -> Heartbeat {
        NewHeartbeat::up(Uuid::nil(), 100, 200).into_heartbeat(id, created_at)
    }

    #[test]
    fn test_day_window_excludes_older_entries() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let heartbeats = vec![
            at(1, now - Duration::hours(25)),
            at(2, now - Duration::hours(2)),
            at(3, now - Duration::minutes(10)),
        ];

        let day = within(&heartbeats, now, Window::Day);
        let ids: Vec<i64> = day.iter().map(|hb| hb.id).collect();
        assert_eq!(ids, vec![2, 3]);

        let week = within(&heartbeats, now, Window::Week);
        assert_eq!(week.len(), 3);
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let heartbeats = vec![at(1, now - Duration::hours(24)), at(2, now - Duration::hours(24) - Duration::milliseconds(1))];

        let day = within(&heartbeats, now, Window::Day);
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].id, 1);
    }

    #[test]
    fn test_windowed_slices_every_window() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let heartbeats = vec![
            at(1, now - Duration::days(40)),
            at(2, now - Duration::days(20)),
            at(3, now - Duration::days(3)),
            at(4, now - Duration::hours(1)),
        ];

        let windowed = Windowed::slice(&heartbeats, now);
        assert_eq!(windowed.get(Window::Day).len(), 1);
        assert_eq!(windowed.get(Window::Week).len(), 2);
        assert_eq!(windowed.get(Window::Month).len(), 3);
    }

    #[test]
    fn test_window_parsing() {
        assert_eq!("24h".parse::<Window>(), Ok(Window::Day));
        assert_eq!("7d".parse::<Window>(), Ok(Window::Week));
        assert_eq!("30d".parse::<Window>(), Ok(Window::Month));
        assert!("1y".parse::<Window>().is_err());
        assert_eq!(Window::Month.to_string(), "30d");
    }
}
