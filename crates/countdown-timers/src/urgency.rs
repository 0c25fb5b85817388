use crate::types::UrgencyLevel;

/// Lower bounds (in percent of the duration) of levels 1, 2 and 3.
const ELEVATED_PCT: i128 = 33;
const HIGH_PCT: i128 = 66;
const CRITICAL_PCT: i128 = 90;

/// Derive the urgency level from how much of `duration` has elapsed.
///
/// | elapsed / duration | level |
/// |--------------------|-------|
/// | `< 0.33`           | 0     |
/// | `[0.33, 0.66)`     | 1     |
/// | `[0.66, 0.90)`     | 2     |
/// | `>= 0.90`          | 3     |
///
/// Each band includes its lower bound. The comparison is done on integers
/// (`100 * elapsed` against `pct * duration`) so exact boundary ratios never
/// land in the wrong band through float rounding. A zero or negative
/// duration always yields level 0.
pub fn compute_urgency(elapsed_time: i64, duration: i64) -> UrgencyLevel {
    if duration <= 0 {
        return UrgencyLevel::Calm;
    }
    let scaled = i128::from(elapsed_time) * 100;
    let duration = i128::from(duration);

    if scaled < ELEVATED_PCT * duration {
        UrgencyLevel::Calm
    } else if scaled < HIGH_PCT * duration {
        UrgencyLevel::Elevated
    } else if scaled < CRITICAL_PCT * duration {
        UrgencyLevel::High
    } else {
        UrgencyLevel::Critical
    }
}

/// Convenience wrapper for the unsigned fields stored on a `Timer`.
pub fn urgency_for(elapsed_time: u32, duration: u32) -> UrgencyLevel {
    compute_urgency(i64::from(elapsed_time), i64::from(duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(elapsed: i64, duration: i64) -> u8 {
        compute_urgency(elapsed, duration).as_u8()
    }

    #[test]
    fn band_boundaries_belong_to_the_upper_level() {
        assert_eq!(level(0, 100), 0);
        assert_eq!(level(32, 100), 0);
        assert_eq!(level(33, 100), 1);
        assert_eq!(level(65, 100), 1);
        assert_eq!(level(66, 100), 2);
        assert_eq!(level(89, 100), 2);
        assert_eq!(level(90, 100), 3);
        assert_eq!(level(100, 100), 3);
    }

    #[test]
    fn degenerate_duration_is_calm() {
        assert_eq!(level(0, 0), 0);
        assert_eq!(level(50, 0), 0);
        assert_eq!(level(50, -10), 0);
        assert_eq!(level(i64::MAX, i64::MIN), 0);
    }

    #[test]
    fn scaled_boundaries_hold_for_other_durations() {
        // 0.33 * 300 = 99, 0.66 * 50 = 33, 0.9 * 10 = 9
        assert_eq!(level(98, 300), 0);
        assert_eq!(level(99, 300), 1);
        assert_eq!(level(32, 50), 1);
        assert_eq!(level(33, 50), 2);
        assert_eq!(level(8, 10), 2);
        assert_eq!(level(9, 10), 3);
    }

    #[test]
    fn monotone_and_bounded_for_every_elapsed_value() {
        for duration in 1..=250i64 {
            let mut previous = 0u8;
            for elapsed in 0..=duration {
                let current = level(elapsed, duration);
                assert!(current <= 3);
                assert!(
                    current >= previous,
                    "urgency dropped at {elapsed}/{duration}: {previous} -> {current}"
                );
                previous = current;
            }
            assert_eq!(previous, 3, "full duration must be critical for {duration}");
        }
    }

    #[test]
    fn huge_values_do_not_overflow() {
        assert_eq!(level(i64::MAX, i64::MAX), 3);
        assert_eq!(level(0, i64::MAX), 0);
        assert_eq!(urgency_for(u32::MAX, u32::MAX), UrgencyLevel::Critical);
    }
}
