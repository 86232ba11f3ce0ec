// tests/property_retry.rs

use std::time::Duration;

use proptest::prelude::*;

use conveyor::errors::ConveyorError;
use conveyor::retry::{self, RecordingSleeper, RetryPolicy};

proptest! {
    /// For any policy, an operation that always fails is attempted
    /// exactly `max_attempts` times and the backoff sleeps follow
    /// `base * mult^1 .. base * mult^(n-1)`.
    #[test]
    fn test_exhaustion_attempt_count_and_delays(
        max_attempts in 1u32..=6,
        base_secs in 1u64..=10,
        multiplier in 2u32..=5,
    ) {
        let policy = RetryPolicy {
            max_attempts,
            base_delay: Duration::from_secs(base_secs),
            multiplier,
        };

        let mut calls = 0u32;
        let mut sleeper = RecordingSleeper::default();
        let result: Result<(), _> = retry::execute(
            || {
                calls += 1;
                Err(anyhow::anyhow!("always fails"))
            },
            &policy,
            &mut sleeper,
        );

        prop_assert_eq!(calls, max_attempts);
        match result {
            Err(ConveyorError::Exhausted { attempts, .. }) => {
                prop_assert_eq!(attempts, max_attempts);
            }
            _ => prop_assert!(false, "expected Exhausted"),
        }

        let expected: Vec<Duration> = (1..max_attempts)
            .map(|k| Duration::from_secs(base_secs * u64::from(multiplier.pow(k))))
            .collect();
        prop_assert_eq!(sleeper.slept, expected);
    }

    /// An operation that succeeds on attempt k sleeps exactly k-1 times.
    #[test]
    fn test_success_cuts_backoff_short(
        max_attempts in 2u32..=6,
        succeed_on in 1u32..=6,
    ) {
        let succeed_on = succeed_on.min(max_attempts);
        let policy = RetryPolicy {
            max_attempts,
            base_delay: Duration::from_secs(1),
            multiplier: 2,
        };

        let mut calls = 0u32;
        let mut sleeper = RecordingSleeper::default();
        let result = retry::execute(
            || {
                calls += 1;
                if calls < succeed_on {
                    Err(anyhow::anyhow!("transient"))
                } else {
                    Ok(calls)
                }
            },
            &policy,
            &mut sleeper,
        );

        prop_assert_eq!(result.unwrap(), succeed_on);
        prop_assert_eq!(sleeper.slept.len() as u32, succeed_on - 1);
    }
}
