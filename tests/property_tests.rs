//! Property-based tests for the order workflow value objects.
//!
//! These tests use proptest to verify invariants across a wide range of inputs,
//! helping to catch edge cases that unit tests might miss.

use chrono::{Duration, TimeZone, Utc};
use dinein_api::{
    errors::ServiceError,
    models::{is_delayed, OrderStatus, OrderTransition, Price, QueueCode},
    payments::notification_signature,
    services::{pricing::calculate_price, queue::next_queue_code},
};
use proptest::prelude::*;
use rust_decimal::Decimal;

// Strategies for generating test data
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn quantity_strategy() -> impl Strategy<Value = i64> {
    1i64..10_000
}

fn status_strategy() -> impl Strategy<Value = OrderStatus> {
    prop_oneof![
        Just(OrderStatus::Pending),
        Just(OrderStatus::Preparing),
        Just(OrderStatus::ReadyToServe),
        Just(OrderStatus::Delivering),
        Just(OrderStatus::Served),
    ]
}

fn transition_strategy() -> impl Strategy<Value = OrderTransition> {
    prop_oneof![
        Just(OrderTransition::StartCooking),
        Just(OrderTransition::FinishCooking),
        Just(OrderTransition::StartDelivering),
        Just(OrderTransition::FinishDelivering),
    ]
}

// Property: Queue codes
proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn queue_code_number_round_trips(n in 0u16..=9999) {
        let code = QueueCode::from_number(n);
        prop_assert_eq!(code.number(), n);
        prop_assert_eq!(code.as_str().len(), 5);
        prop_assert_eq!(QueueCode::parse(code.as_str()).unwrap(), code);
    }

    #[test]
    fn next_code_stays_in_range_and_skips_zero(n in 0u16..=9999) {
        let next = QueueCode::from_number(n).next();
        prop_assert!(!next.is_zero());
        prop_assert!(next.number() <= QueueCode::MAX_NUMBER);
        if n < QueueCode::MAX_NUMBER {
            prop_assert_eq!(next.number(), n + 1);
        }
    }

    #[test]
    fn generator_follows_latest_code(n in 0u16..9999) {
        let latest = QueueCode::from_number(n).to_string();
        prop_assert_eq!(next_queue_code(Some(&latest)).number(), n + 1);
    }

    #[test]
    fn malformed_codes_never_parse(s in "[A-PR-Z][0-9]{4}|Q[0-9]{0,3}|Q[0-9]{5,8}") {
        prop_assert!(QueueCode::parse(&s).is_err(), "accepted {}", s);
    }
}

// Property: Price arithmetic
proptest! {
    #[test]
    fn line_price_is_exact_product(unit in price_strategy(), qty in quantity_strategy()) {
        let line = calculate_price(Price::new(unit).unwrap(), qty).unwrap();
        prop_assert_eq!(line.amount(), unit * Decimal::from(qty));
        prop_assert!(!line.amount().is_sign_negative());
    }

    #[test]
    fn non_positive_quantities_are_invalid(unit in price_strategy(), qty in -1_000_000i64..=0) {
        let result = calculate_price(Price::new(unit).unwrap(), qty);
        prop_assert!(matches!(result, Err(ServiceError::InvalidQuantity(q)) if q == qty));
    }

    #[test]
    fn negative_prices_are_rejected(cents in 1i64..100_000_000) {
        let result = Price::new(Decimal::new(-cents, 2));
        prop_assert!(matches!(result, Err(ServiceError::InvalidPrice(_))));
    }
}

// Property: Order status machine
proptest! {
    #[test]
    fn transitions_only_fire_from_their_precondition(
        current in status_strategy(),
        transition in transition_strategy(),
    ) {
        let allowed = transition.check(current).is_ok();
        prop_assert_eq!(allowed, current == transition.precondition());
        if allowed {
            prop_assert!(current.can_transition_to(transition.target()));
        }
    }

    #[test]
    fn status_tags_round_trip(status in status_strategy()) {
        prop_assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
    }
}

// Property: Delay detection
proptest! {
    #[test]
    fn delay_is_elapsed_beyond_expected(
        elapsed_minutes in 0i64..600,
        expected_minutes in 0i64..600,
        served in any::<bool>(),
    ) {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let started = now - Duration::minutes(elapsed_minutes);
        let served_at = served.then_some(now);

        let delayed = is_delayed(Some(started), served_at, Duration::minutes(expected_minutes), now);
        prop_assert_eq!(delayed, !served && elapsed_minutes > expected_minutes);
        prop_assert!(!is_delayed(None, served_at, Duration::minutes(expected_minutes), now));
    }
}

// Property: Notification signatures
proptest! {
    #[test]
    fn signature_depends_on_every_field(
        order_id in "[A-Za-z0-9-]{1,36}",
        amount in "[0-9]{1,9}\\.[0-9]{2}",
        key in "[A-Za-z0-9-]{8,32}",
    ) {
        let signature = notification_signature(&order_id, "200", &amount, &key);
        prop_assert_eq!(signature.len(), 128);
        prop_assert!(signature.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        prop_assert_ne!(&signature, &notification_signature(&order_id, "201", &amount, &key));
        let other_key = format!("{}x", key);
        prop_assert_ne!(&signature, &notification_signature(&order_id, "200", &amount, &other_key));
    }
}
