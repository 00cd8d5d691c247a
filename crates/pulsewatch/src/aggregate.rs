//! Stateless statistics over an already-fetched heartbeat sequence.
//!
//! None of these functions know about windows; callers filter first (see
//! [`crate::window`]) and call once per window they want to report.

use crate::model::{Heartbeat, MonitorStatus};

/// Percentage of up heartbeats, rounded to two decimals
///
/// Returns `None` for an empty sequence so that "no data" stays distinct from 0%.
pub fn uptime<'a, I>(heartbeats: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a Heartbeat>,
{
    let (total, up) = heartbeats
        .into_iter()
        .fold((0usize, 0usize), |(total, up), hb| (total + 1, up + usize::from(hb.is_up())));

    if total == 0 {
        return None;
    }

    Some(round2(up as f64 / total as f64 * 100.0))
}

/// Mean response time of the up heartbeats, rounded to two decimals
///
/// Down heartbeats are ignored. Returns `None` when no up heartbeat exists.
pub fn average_response_time<'a, I>(heartbeats: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a Heartbeat>,
{
    let (count, sum) = heartbeats
        .into_iter()
        .filter(|hb| hb.is_up())
        .filter_map(|hb| hb.response_time)
        .fold((0u64, 0u128), |(count, sum), ms| (count + 1, sum + u128::from(ms)));

    if count == 0 {
        return None;
    }

    Some(round2(sum as f64 / count as f64))
}

/// The most recently created heartbeat
///
/// Ties on creation time go to the later insertion id.
pub fn latest<'a, I>(heartbeats: I) -> Option<&'a Heartbeat>
where
    I: IntoIterator<Item = &'a Heartbeat>,
{
    heartbeats.into_iter().max_by_key(|hb| (hb.created_at, hb.id))
}

/// Status of the latest heartbeat, or `Unknown` without any
pub fn current_status<'a, I>(heartbeats: I) -> MonitorStatus
where
    I: IntoIterator<Item = &'a Heartbeat>,
{
    latest(heartbeats).map_or(MonitorStatus::Unknown, |hb| hb.status.into())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
