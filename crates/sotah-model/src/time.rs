pub type UnixTimestamp = i64;

pub const DAY_SECONDS: i64 = 86_400;
pub const WEEK_SECONDS: i64 = 604_800;
pub const RETENTION_DAYS: i64 = 14;

/// Normalises a timestamp to the start of its UTC week: the largest
/// `k * WEEK_SECONDS <= t`. Shard and manifest bucketing both key off
/// this alignment (spec.md Section 8's worked intake example pins
/// `1710604800 -> 1710374400`, i.e. true week granularity, not a
/// day-only strip of hours/minutes/seconds).
pub fn week_start(t: UnixTimestamp) -> UnixTimestamp {
    t - t.rem_euclid(WEEK_SECONDS)
}

/// Lowercases and strips everything but alphanumerics and spaces.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_start_is_idempotent() {
        let t = 1_710_634_123;
        assert_eq!(week_start(week_start(t)), week_start(t));
    }

    #[test]
    fn week_start_matches_worked_intake_example() {
        assert_eq!(week_start(1_710_604_800), 1_710_374_400);
    }

    #[test]
    fn week_start_floors_within_bucket_width() {
        let ws = week_start(1_710_634_123);
        assert!(ws <= 1_710_634_123);
        assert!(ws + WEEK_SECONDS > 1_710_634_123);
        assert_eq!(ws % WEEK_SECONDS, 0);
    }

    #[test]
    fn normalize_name_strips_punctuation_and_lowercases() {
        assert_eq!(normalize_name("Thunderfury, Blessed Blade"), "thunderfury blessed blade");
    }

    #[test]
    fn normalize_name_is_idempotent() {
        let once = normalize_name("Gnomish Army Knife");
        assert_eq!(normalize_name(&once), once);
    }
}
