//! Operation timing helpers

use std::time::{Duration, Instant};

/// Format an elapsed duration, e.g. `1 minute and 5 seconds`
pub fn human_readable(elapsed: Duration) -> String {
    let total = elapsed.as_secs_f64();
    let minutes = (total / 60.0).floor();
    let seconds = (total - minutes * 60.0).round();

    let minutes_part = (minutes > 0.0)
        .then(|| format!("{:.0} minute{}", minutes, if minutes > 1.0 { "s" } else { "" }));
    let seconds_part = (seconds > 0.0)
        .then(|| format!("{:.0} second{}", seconds, if seconds != 1.0 { "s" } else { "" }));

    match (minutes_part, seconds_part) {
        (Some(m), Some(s)) => format!("{} and {}", m, s),
        (Some(m), None) => m,
        (None, Some(s)) => s,
        (None, None) => "0 seconds".to_string(),
    }
}

/// Run `f`, then log how long it took
pub fn log_duration<T>(detail: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let result = f();
    tracing::info!(
        "Completed {}operation in {}.",
        detail,
        human_readable(start.elapsed())
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(human_readable(Duration::from_secs(65)), "1 minute and 5 seconds");
        assert_eq!(human_readable(Duration::from_secs(125)), "2 minutes and 5 seconds");
        assert_eq!(human_readable(Duration::from_secs(120)), "2 minutes");
        assert_eq!(human_readable(Duration::from_secs(1)), "1 second");
        assert_eq!(human_readable(Duration::from_millis(200)), "0 seconds");
    }

    #[test]
    fn log_duration_returns_result() {
        assert_eq!(log_duration("test ", || 41 + 1), 42);
    }
}
