//! Periodic scheduled hooks.
//!
//! A [`Schedule`] is a fixed period with an optional initial delay. Registering
//! one spawns a ticker task that feeds a [`HookStream`] of [`Tick`]s; the task
//! is aborted when the stream is dropped, the hook is removed, or the registry
//! shuts down. Missed ticks are skipped rather than bursted.

use crate::error::{HookError, Result};
use crate::registry::HookRegistry;
use crate::stream::{HookGuard, HookStream};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::trace;

/// Fixed-period schedule for a scheduled hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(with = "humantime_serde")]
    pub period: Duration,

    /// Extra delay before the first tick, on top of the first period.
    #[serde(default, with = "humantime_serde")]
    pub initial_delay: Option<Duration>,
}

impl Schedule {
    /// Creates a schedule with the given period.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::InvalidSchedule`] if the period is zero.
    pub fn new(period: Duration) -> Result<Self> {
        let schedule = Self {
            period,
            initial_delay: None,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    #[must_use]
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = Some(initial_delay);
        self
    }

    /// # Errors
    ///
    /// Returns [`HookError::InvalidSchedule`] if the period is zero. Needed
    /// for schedules built through deserialization, which bypasses `new`.
    pub fn validate(&self) -> Result<()> {
        if self.period.is_zero() {
            return Err(HookError::InvalidSchedule(
                "period must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// One firing of a scheduled hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// 1-based position of this tick within its schedule.
    pub sequence: u64,
    pub period: Duration,
}

/// Registers a scheduled hook and returns its ticks as a stream.
///
/// Must be called within a Tokio runtime; the ticker runs as a spawned task.
///
/// # Errors
///
/// Returns [`HookError::InvalidSchedule`] if the schedule fails validation,
/// or [`HookError::RegistryClosed`] if the registry has been closed.
pub fn scheduleds(registry: &Arc<HookRegistry>, schedule: Schedule) -> Result<HookStream<Tick>> {
    schedule.validate()?;

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        if let Some(initial_delay) = schedule.initial_delay {
            tokio::time::sleep(initial_delay).await;
        }

        let mut interval = tokio::time::interval(schedule.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first interval tick completes immediately; the stream should
        // only fire after a full period has elapsed.
        interval.tick().await;

        let mut sequence = 0u64;
        loop {
            interval.tick().await;
            sequence += 1;
            trace!(sequence, "scheduled hook tick");
            if tx
                .send(Tick {
                    sequence,
                    period: schedule.period,
                })
                .is_err()
            {
                break;
            }
        }
    });

    let id = registry.add_scheduled(task.abort_handle())?;
    Ok(HookStream::new(rx, HookGuard::new(id, registry)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_period_rejected() {
        assert_eq!(
            Schedule::new(Duration::ZERO),
            Err(HookError::InvalidSchedule(
                "period must be non-zero".to_string()
            ))
        );
    }

    #[test]
    fn test_schedule_from_config() {
        let schedule: Schedule = serde_json::from_str(r#"{"period": "5s"}"#).unwrap();
        assert_eq!(schedule.period, Duration::from_secs(5));
        assert_eq!(schedule.initial_delay, None);
        schedule.validate().unwrap();

        let schedule: Schedule =
            serde_json::from_str(r#"{"period": "250ms", "initial_delay": "1s"}"#).unwrap();
        assert_eq!(schedule.period, Duration::from_millis(250));
        assert_eq!(schedule.initial_delay, Some(Duration::from_secs(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_are_sequenced() {
        let registry = Arc::new(HookRegistry::new());
        let schedule = Schedule::new(Duration::from_secs(10)).unwrap();
        let mut ticks = scheduleds(&registry, schedule).unwrap();

        for expected in 1..=3 {
            let tick = ticks.recv().await.unwrap();
            assert_eq!(tick.sequence, expected);
            assert_eq!(tick.period, Duration::from_secs(10));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_before_first_period() {
        let registry = Arc::new(HookRegistry::new());
        let schedule = Schedule::new(Duration::from_secs(10)).unwrap();
        let mut ticks = scheduleds(&registry, schedule).unwrap();

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert!(ticks.try_recv().is_none());

        assert_eq!(ticks.recv().await.unwrap().sequence, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_delay_defers_first_tick() {
        let registry = Arc::new(HookRegistry::new());
        let schedule = Schedule::new(Duration::from_secs(10))
            .unwrap()
            .with_initial_delay(Duration::from_secs(5));
        let mut ticks = scheduleds(&registry, schedule).unwrap();

        tokio::time::sleep(Duration::from_secs(14)).await;
        assert!(ticks.try_recv().is_none());

        assert_eq!(ticks.recv().await.unwrap().sequence, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_ticker() {
        let registry = Arc::new(HookRegistry::new());
        let schedule = Schedule::new(Duration::from_secs(1)).unwrap();
        let ticks = scheduleds(&registry, schedule).unwrap();
        assert_eq!(registry.hook_count(), 1);

        drop(ticks);
        assert_eq!(registry.hook_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_by_id_stops_ticks() {
        let registry = Arc::new(HookRegistry::new());
        let schedule = Schedule::new(Duration::from_secs(1)).unwrap();
        let mut ticks = scheduleds(&registry, schedule).unwrap();

        assert_eq!(ticks.recv().await.unwrap().sequence, 1);

        registry.remove(ticks.hook_id()).unwrap();
        assert!(ticks.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_close_stops_ticker() {
        let registry = Arc::new(HookRegistry::new());
        let schedule = Schedule::new(Duration::from_secs(1)).unwrap();
        let mut ticks = scheduleds(&registry, schedule).unwrap();

        registry.close();
        assert!(ticks.recv().await.is_none());

        assert!(matches!(
            scheduleds(&registry, schedule),
            Err(HookError::RegistryClosed)
        ));
    }
}
