use chrono::{DateTime, Duration, Utc};

/// A transaction is delayed once cooking has started, it has not been served,
/// and more time than `expected` has passed since cooking started.
pub fn is_delayed(
    cooking_started_at: Option<DateTime<Utc>>,
    served_at: Option<DateTime<Utc>>,
    expected: Duration,
    now: DateTime<Utc>,
) -> bool {
    match (cooking_started_at, served_at) {
        (Some(started), None) => now.signed_duration_since(started) > expected,
        _ => false,
    }
}

/// Expected kitchen time for a transaction: the sum of its lines' cooking durations.
pub fn expected_cooking_time<I>(durations_in_minutes: I) -> Duration
where
    I: IntoIterator<Item = i32>,
{
    let minutes: i64 = durations_in_minutes
        .into_iter()
        .map(|minutes| i64::from(minutes.max(0)))
        .sum();
    Duration::minutes(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overdue_unserved_transaction_is_delayed() {
        let now = Utc::now();
        assert!(is_delayed(
            Some(now - Duration::minutes(30)),
            None,
            Duration::minutes(20),
            now
        ));
    }

    #[test]
    fn served_transaction_is_never_delayed() {
        let now = Utc::now();
        assert!(!is_delayed(
            Some(now - Duration::minutes(10)),
            Some(now - Duration::minutes(5)),
            Duration::minutes(1),
            now
        ));
    }

    #[test]
    fn uncooked_transaction_is_never_delayed() {
        assert!(!is_delayed(None, None, Duration::zero(), Utc::now()));
    }

    #[test]
    fn within_expected_time_is_not_delayed() {
        let now = Utc::now();
        assert!(!is_delayed(
            Some(now - Duration::minutes(20)),
            None,
            Duration::minutes(20),
            now
        ));
    }

    #[test]
    fn expected_time_sums_lines_and_ignores_negative_durations() {
        assert_eq!(expected_cooking_time([10, 5, -3]), Duration::minutes(15));
        assert_eq!(expected_cooking_time(Vec::new()), Duration::zero());
    }
}
