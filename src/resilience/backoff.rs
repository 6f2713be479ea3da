//! Exponential backoff with optional jitter.

use rand::Rng;
use std::time::Duration;

/// Delay before the retry that follows failed attempt `attempt` (0-based):
/// `base * 2^attempt`, capped at `max`, plus up to `jitter_ratio` of it.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration, jitter_ratio: f64) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    let capped = base.saturating_mul(factor).min(max);

    if jitter_ratio <= 0.0 {
        return capped;
    }

    let jitter_range = capped.mul_f64(jitter_ratio.min(1.0));
    if jitter_range.is_zero() {
        return capped;
    }
    let jitter = rand::thread_rng().gen_range(Duration::ZERO..jitter_range);
    capped + jitter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let base = Duration::from_millis(100);
        let max = Duration::from_secs(2);

        assert_eq!(calculate_backoff(0, base, max, 0.0), Duration::from_millis(100));
        assert_eq!(calculate_backoff(1, base, max, 0.0), Duration::from_millis(200));
        assert_eq!(calculate_backoff(3, base, max, 0.0), Duration::from_millis(800));
        assert_eq!(calculate_backoff(10, base, max, 0.0), max);
    }

    #[test]
    fn monitor_backoff_caps_at_ten_minutes() {
        let base = Duration::from_secs(60);
        let cap = Duration::from_secs(600);

        assert_eq!(calculate_backoff(0, base, cap, 0.0), Duration::from_secs(60));
        assert_eq!(calculate_backoff(2, base, cap, 0.0), Duration::from_secs(240));
        assert_eq!(calculate_backoff(4, base, cap, 0.0), cap);
        assert_eq!(calculate_backoff(40, base, cap, 0.0), cap);
    }

    #[test]
    fn jitter_stays_within_ratio() {
        let base = Duration::from_millis(1000);
        for _ in 0..50 {
            let d = calculate_backoff(0, base, Duration::from_secs(10), 0.1);
            assert!(d >= base);
            assert!(d < Duration::from_millis(1100));
        }
    }
}
