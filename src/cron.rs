//! Interval-based cron approximation. A [`Schedule`] is polled on a fixed
//! interval and the task runs when the current wall-clock matches every
//! non-wildcard field. Matching is UTC; missed ticks are skipped, not
//! caught up.

use crate::error::ConfigError;
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Parsed 5-field cron expression: minute, hour, day-of-month, month,
/// day-of-week (0 = Sunday). `None` is a wildcard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub minute: Option<u32>,
    pub hour: Option<u32>,
    pub day_of_month: Option<u32>,
    pub month: Option<u32>,
    pub day_of_week: Option<u32>,
}

impl Schedule {
    pub fn parse(expression: &str) -> Result<Self, ConfigError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(ConfigError::Cron(format!(
                "expected 5 fields, got {}",
                fields.len()
            )));
        }
        Ok(Schedule {
            minute: parse_field(fields[0], "minute", 0, 59)?,
            hour: parse_field(fields[1], "hour", 0, 23)?,
            day_of_month: parse_field(fields[2], "day of month", 1, 31)?,
            month: parse_field(fields[3], "month", 1, 12)?,
            day_of_week: parse_field(fields[4], "day of week", 0, 6)?,
        })
    }

    pub fn matches(&self, t: &DateTime<Utc>) -> bool {
        let checks = [
            (self.minute, t.minute()),
            (self.hour, t.hour()),
            (self.day_of_month, t.day()),
            (self.month, t.month()),
            (self.day_of_week, t.weekday().num_days_from_sunday()),
        ];
        checks.iter().all(|(field, now)| match field {
            Some(v) => v == now,
            None => true,
        })
    }
}

fn parse_field(s: &str, label: &str, min: u32, max: u32) -> Result<Option<u32>, ConfigError> {
    if s == "*" {
        return Ok(None);
    }
    let n: u32 = s
        .parse()
        .map_err(|_| ConfigError::Cron(format!("{} field '{}' is not a number or '*'", label, s)))?;
    if n < min || n > max {
        return Err(ConfigError::Cron(format!(
            "{} field {} out of range {}..={}",
            label, n, min, max
        )));
    }
    Ok(Some(n))
}

/// Spawn a task polling the expression every `check_interval` (default 60s)
/// and running `task` on each matching minute. A last-fired guard keeps a
/// sub-minute interval from firing twice within the same minute. Abort the
/// returned handle to stop the job.
pub fn schedule<F, Fut>(
    expression: &str,
    check_interval: Option<Duration>,
    task: F,
) -> Result<JoinHandle<()>, ConfigError>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let schedule = Schedule::parse(expression)?;
    let every = check_interval.unwrap_or(DEFAULT_CHECK_INTERVAL);
    Ok(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_fired_minute: Option<i64> = None;
        loop {
            ticker.tick().await;
            let now = Utc::now();
            let this_minute = now.timestamp() / 60;
            if schedule.matches(&now) && last_fired_minute != Some(this_minute) {
                last_fired_minute = Some(this_minute);
                task().await;
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn wildcards_match_any_time() {
        let s = Schedule::parse("* * * * *").unwrap();
        let t = Utc.with_ymd_and_hms(2026, 8, 7, 13, 37, 0).unwrap();
        assert!(s.matches(&t));
    }

    #[test]
    fn fixed_fields_must_all_match() {
        // 2026-08-07 is a Friday (weekday 5).
        let t = Utc.with_ymd_and_hms(2026, 8, 7, 13, 37, 0).unwrap();
        assert!(Schedule::parse("37 13 7 8 5").unwrap().matches(&t));
        assert!(!Schedule::parse("38 13 7 8 5").unwrap().matches(&t));
        assert!(!Schedule::parse("37 13 7 8 3").unwrap().matches(&t));
        assert!(Schedule::parse("37 * * * *").unwrap().matches(&t));
    }

    #[test]
    fn parse_rejects_malformed_expressions() {
        assert!(Schedule::parse("* * * *").is_err());
        assert!(Schedule::parse("* * * * * *").is_err());
        assert!(Schedule::parse("x * * * *").is_err());
        assert!(Schedule::parse("60 * * * *").is_err());
        assert!(Schedule::parse("* 24 * * *").is_err());
        assert!(Schedule::parse("* * 0 * *").is_err());
        assert!(Schedule::parse("* * * 13 *").is_err());
        assert!(Schedule::parse("* * * * 7").is_err());
    }

    #[tokio::test]
    async fn schedule_rejects_bad_expression_before_spawning() {
        let result = schedule("nope", None, || async {});
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn matching_task_fires_once_per_minute_with_subminute_polling() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let handle = schedule("* * * * *", Some(Duration::from_secs(5)), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();

        // 30 virtual seconds of 5s polls stay within one wall-clock minute
        // only if the test starts early in a minute; the guard still bounds
        // fires to at most one per distinct minute.
        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;
        assert!(fired.load(Ordering::SeqCst) <= 2);
        assert!(fired.load(Ordering::SeqCst) >= 1);
        handle.abort();
    }
}
