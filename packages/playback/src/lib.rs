#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hour-of-day playback cursor.
//!
//! A [`PlaybackClock`] owns an hour cursor in `0..24`. While playing, a
//! single tokio task advances the cursor by one hour per period, wrapping
//! from 23 back to 0. Stopping the clock, or dropping it, aborts that task.
//! The cursor can be set directly at any time; doing so does not shift the
//! phase of the automatic advance.
//!
//! Consumers observe cursor changes through [`PlaybackClock::subscribe`].

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Number of distinct cursor positions.
pub const HOURS_PER_DAY: u32 = 24;

/// Cadence used by the dashboard's play control.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(1200);

/// Errors returned by [`PlaybackClock`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// The requested hour is not in `0..24`.
    #[error("hour {0} is out of range 0..24")]
    HourOutOfRange(u32),

    /// The advance period must be non-zero.
    #[error("playback period must be greater than zero")]
    ZeroPeriod,
}

/// The hour that follows `hour`, wrapping 23 to 0.
#[must_use]
pub const fn next_hour(hour: u32) -> u32 {
    (hour + 1) % HOURS_PER_DAY
}

/// Cycling hour cursor with an optional automatic advance.
pub struct PlaybackClock {
    cursor: Arc<watch::Sender<u32>>,
    period: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackClock {
    /// Creates a paused clock positioned at `initial_hour`.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError`] if `initial_hour` is out of range or
    /// `period` is zero.
    pub fn new(initial_hour: u32, period: Duration) -> Result<Self, PlaybackError> {
        check_hour(initial_hour)?;
        if period.is_zero() {
            return Err(PlaybackError::ZeroPeriod);
        }

        let (cursor, _) = watch::channel(initial_hour);

        Ok(Self {
            cursor: Arc::new(cursor),
            period,
            task: Mutex::new(None),
        })
    }

    /// Current cursor position.
    #[must_use]
    pub fn hour(&self) -> u32 {
        *self.cursor.borrow()
    }

    /// Period between automatic advances.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Returns a receiver that is notified on every cursor change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.cursor.subscribe()
    }

    /// Moves the cursor to `hour`, whether or not the clock is playing.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::HourOutOfRange`] if `hour` is not in
    /// `0..24`.
    pub fn set_hour(&self, hour: u32) -> Result<(), PlaybackError> {
        check_hour(hour)?;
        self.cursor.send_replace(hour);
        log::debug!("Playback cursor set to {hour}");
        Ok(())
    }

    /// Whether the automatic advance is running.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.lock_task().as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Starts the automatic advance. The first advance happens one full
    /// period from now. Does nothing if already playing.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn start(&self) {
        let mut task = self.lock_task();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let cursor = Arc::clone(&self.cursor);
        let period = self.period;

        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                cursor.send_modify(|hour| *hour = next_hour(*hour));
                log::trace!("Playback advanced to {}", *cursor.borrow());
            }
        }));

        log::debug!("Playback started ({}ms period)", period.as_millis());
    }

    /// Stops the automatic advance, freezing the cursor.
    pub fn stop(&self) {
        if let Some(task) = self.lock_task().take() {
            task.abort();
            log::debug!("Playback stopped at {}", self.hour());
        }
    }

    /// Starts or stops the automatic advance.
    pub fn set_playing(&self, playing: bool) {
        if playing {
            self.start();
        } else {
            self.stop();
        }
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PlaybackClock {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for PlaybackClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackClock")
            .field("hour", &self.hour())
            .field("period", &self.period)
            .field("playing", &self.is_playing())
            .finish()
    }
}

/// Checks that `hour` is a valid cursor position.
///
/// # Errors
///
/// Returns [`PlaybackError::HourOutOfRange`] if `hour` is not in `0..24`.
pub const fn check_hour(hour: u32) -> Result<(), PlaybackError> {
    if hour < HOURS_PER_DAY {
        Ok(())
    } else {
        Err(PlaybackError::HourOutOfRange(hour))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn next_hour_wraps_at_midnight() {
        assert_eq!(next_hour(0), 1);
        assert_eq!(next_hour(22), 23);
        assert_eq!(next_hour(23), 0);
    }

    #[test]
    fn rejects_out_of_range_hours_and_zero_period() {
        assert_eq!(
            PlaybackClock::new(24, DEFAULT_PERIOD).unwrap_err(),
            PlaybackError::HourOutOfRange(24)
        );
        assert_eq!(
            PlaybackClock::new(0, Duration::ZERO).unwrap_err(),
            PlaybackError::ZeroPeriod
        );

        let clock = PlaybackClock::new(5, DEFAULT_PERIOD).unwrap();
        assert!(clock.set_hour(30).is_err());
        assert_eq!(clock.hour(), 5);
    }

    #[test]
    fn check_hour_accepts_only_the_day() {
        assert!(check_hour(0).is_ok());
        assert!(check_hour(23).is_ok());
        assert_eq!(check_hour(24), Err(PlaybackError::HourOutOfRange(24)));
    }

    #[test]
    fn manual_set_works_while_paused() {
        let clock = PlaybackClock::new(0, DEFAULT_PERIOD).unwrap();
        clock.set_hour(17).unwrap();
        assert_eq!(clock.hour(), 17);
        assert!(!clock.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn advances_once_per_period_and_wraps() {
        let clock = PlaybackClock::new(22, DEFAULT_PERIOD).unwrap();
        clock.start();
        assert!(clock.is_playing());

        sleep(ms(1_100)).await;
        assert_eq!(clock.hour(), 22);

        sleep(ms(200)).await;
        assert_eq!(clock.hour(), 23);

        sleep(ms(1_200)).await;
        assert_eq!(clock.hour(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_the_cursor() {
        let clock = PlaybackClock::new(3, DEFAULT_PERIOD).unwrap();
        clock.start();
        sleep(ms(1_300)).await;
        assert_eq!(clock.hour(), 4);

        clock.stop();
        assert!(!clock.is_playing());

        sleep(ms(10_000)).await;
        assert_eq!(clock.hour(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_set_keeps_the_advance_phase() {
        let clock = PlaybackClock::new(0, DEFAULT_PERIOD).unwrap();
        clock.start();

        sleep(ms(600)).await;
        clock.set_hour(10).unwrap();
        assert_eq!(clock.hour(), 10);

        sleep(ms(700)).await;
        assert_eq!(clock.hour(), 11);

        sleep(ms(1_200)).await;
        assert_eq!(clock.hour(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_idempotent() {
        let clock = PlaybackClock::new(0, DEFAULT_PERIOD).unwrap();
        clock.start();
        clock.start();
        clock.set_playing(true);

        sleep(ms(1_300)).await;
        assert_eq!(clock.hour(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_each_advance() {
        let clock = PlaybackClock::new(7, DEFAULT_PERIOD).unwrap();
        let mut rx = clock.subscribe();
        clock.start();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 8);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_clock_cancels_the_timer() {
        let clock = PlaybackClock::new(0, DEFAULT_PERIOD).unwrap();
        let mut rx = clock.subscribe();
        clock.start();

        sleep(ms(1_300)).await;
        drop(clock);
        sleep(ms(10_000)).await;

        assert_eq!(*rx.borrow_and_update(), 1);
        assert!(rx.has_changed().is_err());
    }
}
