//! Time-triggered rotation of the file sink
//!
//! A [`RotationTimer`] polls the wall clock at a fixed tick and rotates the
//! shared [`FileSink`] once the next due instant has been reached. A tick that
//! arrives late still rotates (once); periods skipped entirely while the
//! process was paused are not replayed.

use super::error::{ErrorHandler, LoggerError, Result};
use super::metrics::LoggerMetrics;
use crate::appenders::file::{compress_file, FileSink};
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDateTime, TimeZone, Timelike};
use crossbeam_channel::{select, tick, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const ROTATION_THREAD: &str = "styled-logger-rotation";

/// The file sink as shared between writers and the rotation timer
pub type SharedFileSink = Arc<Mutex<Option<FileSink>>>;

/// When to rotate
///
/// # Examples
///
/// ```
/// use styled_logger::RotationSchedule;
/// use std::time::Duration;
///
/// // every day at 00:00
/// let midnight = RotationSchedule::daily(0, 0);
///
/// // every minute, when the seconds hand reaches 0
/// let minutely = RotationSchedule::minutely(0);
///
/// // every 15 minutes from now
/// let interval = RotationSchedule::interval(Duration::from_secs(900));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RotationSchedule {
    /// Once a day at `hour:minute` local time
    Daily { hour: u32, minute: u32 },

    /// Once a minute at `second`
    Minutely { second: u32 },

    /// Every `millis` milliseconds, counted from when the timer starts
    Interval { millis: u64 },
}

impl RotationSchedule {
    #[must_use]
    pub fn daily(hour: u32, minute: u32) -> Self {
        RotationSchedule::Daily { hour, minute }
    }

    #[must_use]
    pub fn minutely(second: u32) -> Self {
        RotationSchedule::Minutely { second }
    }

    /// Intervals beyond `u64::MAX` milliseconds saturate and fail [`RotationSchedule::validate`]
    #[must_use]
    pub fn interval(interval: Duration) -> Self {
        RotationSchedule::Interval {
            millis: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            RotationSchedule::Daily { hour, minute } => {
                if hour > 23 {
                    return Err(LoggerError::config("RotationSchedule", "hour must be between 0 and 23"));
                }
                if minute > 59 {
                    return Err(LoggerError::config("RotationSchedule", "minute must be between 0 and 59"));
                }
            }
            RotationSchedule::Minutely { second } => {
                if second > 59 {
                    return Err(LoggerError::config("RotationSchedule", "second must be between 0 and 59"));
                }
            }
            RotationSchedule::Interval { millis } => {
                if millis == 0 {
                    return Err(LoggerError::config("RotationSchedule", "interval must be non-zero"));
                }
                if interval_delta(millis).is_none() {
                    return Err(LoggerError::config("RotationSchedule", "interval is too large"));
                }
            }
        }
        Ok(())
    }

    /// How often the timer checks the clock
    pub fn tick(&self) -> Duration {
        match *self {
            RotationSchedule::Daily { .. } => Duration::from_secs(60),
            RotationSchedule::Minutely { .. } => Duration::from_secs(1),
            RotationSchedule::Interval { millis } => {
                Duration::from_millis(millis).min(Duration::from_secs(1))
            }
        }
    }

    /// First instant strictly after `now` at which rotation is due
    ///
    /// Daily and minutely targets are wall-clock times, so a daylight saving
    /// change never shifts them. A target that falls in a DST gap moves to
    /// one hour later. `None` when the instant is past what chrono can
    /// represent.
    pub fn next_due<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = now.timezone();
        match *self {
            RotationSchedule::Daily { hour, minute } => {
                let today = now.date_naive();
                let target = resolve_local(&tz, today.and_hms_opt(hour, minute, 0)?)?;
                if target > *now {
                    return Some(target);
                }
                resolve_local(&tz, today.succ_opt()?.and_hms_opt(hour, minute, 0)?)
            }
            RotationSchedule::Minutely { second } => {
                let this_minute = now.naive_local().with_second(second)?.with_nanosecond(0)?;
                let target = resolve_local(&tz, this_minute)?;
                if target > *now {
                    return Some(target);
                }
                resolve_local(&tz, this_minute.checked_add_signed(ChronoDuration::minutes(1))?)
            }
            RotationSchedule::Interval { millis } => {
                now.clone().checked_add_signed(interval_delta(millis)?)
            }
        }
    }
}

fn interval_delta(millis: u64) -> Option<ChronoDuration> {
    ChronoDuration::try_milliseconds(i64::try_from(millis).ok()?)
}

/// Map a wall-clock time to an instant, skipping forward over a DST gap
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive).earliest().or_else(|| {
        let shifted = naive.checked_add_signed(ChronoDuration::hours(1))?;
        tz.from_local_datetime(&shifted).earliest()
    })
}

/// Rotate the shared sink immediately
///
/// Writers block on the sink mutex for the duration of the close/reopen, so
/// no line is written to a handle being closed. Compression of the previous
/// file happens after the lock is released.
pub(crate) fn rotate_shared(sink: &SharedFileSink, metrics: &LoggerMetrics) -> Result<()> {
    rotate_shared_with(sink, metrics, FileSink::rotate)
}

/// [`rotate_shared`] with the reopen step supplied by the caller
pub(crate) fn rotate_shared_with<F>(sink: &SharedFileSink, metrics: &LoggerMetrics, reopen: F) -> Result<()>
where
    F: FnOnce(&mut FileSink) -> Result<Option<PathBuf>>,
{
    let (previous, compress) = {
        let mut guard = sink.lock();
        let sink = guard.as_mut().ok_or(LoggerError::RotationWithoutFile)?;
        (reopen(sink)?, sink.compress_rotated())
    };
    metrics.record_rotation();

    if compress {
        if let Some(previous) = previous {
            compress_file(&previous)?;
        }
    }
    Ok(())
}

/// Background thread rotating a [`FileSink`] on a [`RotationSchedule`]
///
/// Cancelled by [`RotationTimer::cancel`] or by dropping it.
pub struct RotationTimer {
    schedule: RotationSchedule,
    cancel: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RotationTimer {
    pub fn start(
        schedule: RotationSchedule,
        sink: SharedFileSink,
        metrics: Arc<LoggerMetrics>,
        on_error: ErrorHandler,
    ) -> Result<Self> {
        schedule.validate()?;
        let first_due = schedule.next_due(&Local::now()).ok_or_else(|| {
            LoggerError::config("RotationSchedule", "next rotation is out of the representable time range")
        })?;

        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded::<()>(0);
        let ticker = tick(schedule.tick());

        let handle = thread::Builder::new()
            .name(ROTATION_THREAD.to_string())
            .spawn(move || {
                let mut due = first_due;
                loop {
                    select! {
                        recv(cancel_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            let now = Local::now();
                            if now >= due {
                                if let Err(e) = rotate_shared(&sink, &metrics) {
                                    on_error(&e);
                                }
                                match schedule.next_due(&now) {
                                    Some(next) => due = next,
                                    None => {
                                        on_error(&LoggerError::config(
                                            "RotationSchedule",
                                            "next rotation is out of the representable time range; timer stopped",
                                        ));
                                        break;
                                    }
                                }
                            }
                        }
                    }
                }
            })
            .map_err(|e| {
                LoggerError::io_operation("spawn rotation thread", "thread creation failed", e)
            })?;

        Ok(Self {
            schedule,
            cancel: Some(cancel_tx),
            handle: Some(handle),
        })
    }

    pub fn schedule(&self) -> RotationSchedule {
        self.schedule
    }

    /// Stop the timer and wait for its thread to exit
    pub fn cancel(&mut self) {
        drop(self.cancel.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                eprintln!("[LOGGER ERROR] Rotation thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for RotationTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn utc(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_daily_next_due_later_today() {
        let due = RotationSchedule::daily(23, 30).next_due(&utc(10, 0, 0));
        assert_eq!(due, Some(utc(23, 30, 0)));
    }

    #[test]
    fn test_daily_next_due_tomorrow_when_passed() {
        let schedule = RotationSchedule::daily(0, 0);
        let tomorrow = utc(0, 0, 0) + ChronoDuration::days(1);
        assert_eq!(schedule.next_due(&utc(0, 0, 0)), Some(tomorrow));
        assert_eq!(schedule.next_due(&utc(12, 0, 0)), Some(tomorrow));
    }

    #[test]
    fn test_minutely_next_due() {
        let schedule = RotationSchedule::minutely(0);
        assert_eq!(schedule.next_due(&utc(8, 15, 42)), Some(utc(8, 16, 0)));
        assert_eq!(schedule.next_due(&utc(8, 15, 0)), Some(utc(8, 16, 0)));
        assert_eq!(schedule.next_due(&utc(23, 59, 30)), Some(utc(0, 0, 0) + ChronoDuration::days(1)));

        let schedule = RotationSchedule::minutely(30);
        assert_eq!(schedule.next_due(&utc(8, 15, 10)), Some(utc(8, 15, 30)));
    }

    #[test]
    fn test_interval_next_due() {
        let schedule = RotationSchedule::interval(Duration::from_millis(1500));
        assert_eq!(
            schedule.next_due(&utc(1, 2, 3)),
            Some(utc(1, 2, 3) + ChronoDuration::milliseconds(1500))
        );
    }

    #[test]
    fn test_tick_resolution() {
        assert_eq!(RotationSchedule::daily(0, 0).tick(), Duration::from_secs(60));
        assert_eq!(RotationSchedule::minutely(0).tick(), Duration::from_secs(1));
        assert_eq!(
            RotationSchedule::interval(Duration::from_millis(20)).tick(),
            Duration::from_millis(20)
        );
        assert_eq!(
            RotationSchedule::interval(Duration::from_secs(3600)).tick(),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_validate() {
        assert!(RotationSchedule::daily(23, 59).validate().is_ok());
        assert!(RotationSchedule::daily(24, 0).validate().is_err());
        assert!(RotationSchedule::daily(0, 60).validate().is_err());
        assert!(RotationSchedule::minutely(60).validate().is_err());
        assert!(RotationSchedule::interval(Duration::ZERO).validate().is_err());
    }

    #[test]
    fn test_rotation_to_new_date_compresses_previous() {
        let dir = tempdir().unwrap();
        let file = FileSink::open("ZIP", dir.path()).unwrap().with_compression(true);
        let old_path = file.path().to_path_buf();
        let sink: SharedFileSink = Arc::new(Mutex::new(Some(file)));
        let metrics = LoggerMetrics::new();

        sink.lock().as_mut().unwrap().write("old day").unwrap();
        rotate_shared_with(&sink, &metrics, |s| s.rotate_to("2030-07-01")).unwrap();
        sink.lock().as_mut().unwrap().write("new day").unwrap();

        let mut gz_name = old_path.clone().into_os_string();
        gz_name.push(".gz");
        assert!(!old_path.exists());
        assert!(PathBuf::from(gz_name).exists());

        let new_path = dir.path().join("2030-07-01:ZIP.txt");
        assert_eq!(sink.lock().as_ref().unwrap().path(), new_path);
        assert_eq!(std::fs::read_to_string(new_path).unwrap(), "new day\n");
        assert_eq!(metrics.rotations(), 1);
    }

    #[test]
    fn test_oversized_interval_rejected() {
        let saturated = RotationSchedule::interval(Duration::from_millis(u64::MAX));
        assert_eq!(saturated, RotationSchedule::Interval { millis: u64::MAX });
        assert!(saturated.validate().is_err());

        let beyond_u64 = RotationSchedule::interval(Duration::from_secs(u64::MAX));
        assert_eq!(beyond_u64, RotationSchedule::Interval { millis: u64::MAX });
        assert!(beyond_u64.validate().is_err());

        let huge = RotationSchedule::Interval { millis: 1 << 62 };
        assert_eq!(huge.next_due(&utc(0, 0, 0)), None);
    }

    #[test]
    fn test_timer_refuses_unreachable_interval() {
        let dir = tempdir().unwrap();
        let sink: SharedFileSink =
            Arc::new(Mutex::new(Some(FileSink::open("HUGE", dir.path()).unwrap())));
        let metrics = Arc::new(LoggerMetrics::new());

        for schedule in [
            RotationSchedule::interval(Duration::from_millis(u64::MAX)),
            RotationSchedule::Interval { millis: 1 << 62 },
        ] {
            let result = RotationTimer::start(
                schedule,
                Arc::clone(&sink),
                Arc::clone(&metrics),
                crate::core::error::default_error_handler(),
            );
            assert!(
                matches!(result, Err(LoggerError::InvalidConfiguration { .. })),
                "{:?} was accepted",
                schedule
            );
        }
        assert_eq!(metrics.rotations(), 0);
    }

    /// Central European rules around 2024-03-31: UTC+1 until 01:00 UTC, UTC+2 after
    #[derive(Debug, Clone, Copy)]
    struct SpringForward;

    impl SpringForward {
        const WINTER: i32 = 3600;
        const SUMMER: i32 = 7200;

        fn switch_utc() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap().and_hms_opt(1, 0, 0).unwrap()
        }

        fn offset(secs: i32) -> chrono::FixedOffset {
            chrono::FixedOffset::east_opt(secs).unwrap()
        }
    }

    impl TimeZone for SpringForward {
        type Offset = chrono::FixedOffset;

        fn from_offset(_offset: &chrono::FixedOffset) -> Self {
            SpringForward
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> chrono::LocalResult<chrono::FixedOffset> {
            let secs = if *local < Self::switch_utc().date() { Self::WINTER } else { Self::SUMMER };
            chrono::LocalResult::Single(Self::offset(secs))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> chrono::LocalResult<chrono::FixedOffset> {
            let gap_start = Self::switch_utc() + ChronoDuration::seconds(Self::WINTER as i64);
            let gap_end = Self::switch_utc() + ChronoDuration::seconds(Self::SUMMER as i64);
            if *local < gap_start {
                chrono::LocalResult::Single(Self::offset(Self::WINTER))
            } else if *local < gap_end {
                chrono::LocalResult::None
            } else {
                chrono::LocalResult::Single(Self::offset(Self::SUMMER))
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> chrono::FixedOffset {
            let secs = if *utc < Self::switch_utc().date() { Self::WINTER } else { Self::SUMMER };
            Self::offset(secs)
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> chrono::FixedOffset {
            let secs = if *utc < Self::switch_utc() { Self::WINTER } else { Self::SUMMER };
            Self::offset(secs)
        }
    }

    fn local(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_daily_keeps_wall_clock_across_dst() {
        let now = SpringForward.from_local_datetime(&local(30, 13, 0)).unwrap();

        let due = RotationSchedule::daily(12, 0).next_due(&now).unwrap();

        assert_eq!(due.naive_local(), local(31, 12, 0));
        assert_eq!(due.naive_utc(), local(31, 10, 0));
    }

    #[test]
    fn test_daily_target_in_dst_gap_moves_forward() {
        let now = SpringForward.from_local_datetime(&local(30, 13, 0)).unwrap();

        let due = RotationSchedule::daily(2, 30).next_due(&now).unwrap();

        assert_eq!(due.naive_local(), local(31, 3, 30));
    }

    #[test]
    fn test_schedule_serde() {
        let json = r#"{"kind":"daily","hour":2,"minute":30}"#;
        let schedule: RotationSchedule = serde_json::from_str(json).unwrap();
        assert_eq!(schedule, RotationSchedule::daily(2, 30));
        assert_eq!(serde_json::to_string(&schedule).unwrap(), json);
    }

    #[test]
    fn test_rotate_shared_without_sink() {
        let sink: SharedFileSink = Arc::new(Mutex::new(None));
        let err = rotate_shared(&sink, &LoggerMetrics::new()).unwrap_err();
        assert!(matches!(err, LoggerError::RotationWithoutFile));
    }

    #[test]
    fn test_timer_rotates_and_cancels() {
        let dir = tempdir().unwrap();
        let sink: SharedFileSink =
            Arc::new(Mutex::new(Some(FileSink::open("TIMER", dir.path()).unwrap())));
        let metrics = Arc::new(LoggerMetrics::new());
        let errors = Arc::new(AtomicUsize::new(0));
        let errors_clone = Arc::clone(&errors);

        let mut timer = RotationTimer::start(
            RotationSchedule::interval(Duration::from_millis(20)),
            Arc::clone(&sink),
            Arc::clone(&metrics),
            Arc::new(move |_| {
                errors_clone.fetch_add(1, Ordering::Relaxed);
            }),
        )
        .unwrap();

        std::thread::sleep(Duration::from_millis(200));
        assert!(timer.is_running());
        timer.cancel();
        assert!(!timer.is_running());

        let rotations = metrics.rotations();
        assert!(rotations >= 1, "expected at least one rotation, got {}", rotations);
        assert_eq!(errors.load(Ordering::Relaxed), 0);

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(metrics.rotations(), rotations, "timer kept running after cancel");
        assert!(sink.lock().as_ref().unwrap().is_open());
    }

    #[test]
    fn test_timer_rejects_invalid_schedule() {
        let sink: SharedFileSink = Arc::new(Mutex::new(None));
        let result = RotationTimer::start(
            RotationSchedule::minutely(99),
            sink,
            Arc::new(LoggerMetrics::new()),
            crate::core::error::default_error_handler(),
        );
        assert!(matches!(result, Err(LoggerError::InvalidConfiguration { .. })));
    }
}
