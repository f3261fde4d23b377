use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use super::*;

#[test]
fn test_backoff_shapes() {
    let exponential = RetryPolicy::exponential(3, Duration::from_millis(1_000));
    assert_eq!(exponential.delay_after(1), Duration::from_millis(2_000));
    assert_eq!(exponential.delay_after(2), Duration::from_millis(4_000));
    assert_eq!(exponential.delay_after(3), Duration::from_millis(8_000));

    let linear = RetryPolicy::linear(3, Duration::from_millis(2_000));
    assert_eq!(linear.delay_after(1), Duration::from_millis(2_000));
    assert_eq!(linear.delay_after(2), Duration::from_millis(4_000));
    assert_eq!(linear.delay_after(3), Duration::from_millis(6_000));
}

#[test]
fn test_backoff_saturates_instead_of_overflowing() {
    let policy = RetryPolicy::exponential(100, Duration::from_secs(u64::MAX / 2));
    assert_eq!(policy.delay_after(64), Duration::MAX);
}

#[test]
fn test_zero_attempts_is_invalid() {
    let policy = RetryPolicy::linear(0, Duration::from_millis(10));
    assert!(matches!(
        policy.validate(),
        Err(ConfigError::InvalidRetryPolicy { .. })
    ));
    assert!(RetryPolicy::linear(1, Duration::ZERO).validate().is_ok());
}

#[tokio::test]
async fn test_retryable_failures_use_exactly_max_attempts() {
    let policy = RetryPolicy::exponential(3, Duration::ZERO);
    let calls = Arc::new(AtomicU32::new(0));

    let result: Result<(), ToolError> = execute_with_retry(&policy, "test", |attempt| {
        let calls = Arc::clone(&calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ToolError::RateLimited(format!("attempt {attempt}")))
        }
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(result, Err(ToolError::RateLimited("attempt 3".to_string())));
}

#[tokio::test]
async fn test_non_retryable_failure_short_circuits() {
    let policy = RetryPolicy::linear(3, Duration::ZERO);
    let calls = Arc::new(AtomicU32::new(0));

    let result: Result<(), ToolError> = execute_with_retry(&policy, "test", |_| {
        let calls = Arc::clone(&calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ToolError::invalid_argument("prompt rejected"))
        }
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        result,
        Err(ToolError::InvalidArgument("prompt rejected".to_string()))
    );
}

#[tokio::test]
async fn test_message_markers_trigger_retry_until_success() {
    let policy = RetryPolicy::linear(3, Duration::ZERO);
    let calls = Arc::new(AtomicU32::new(0));

    let result = execute_with_retry(&policy, "test", |attempt| {
        let calls = Arc::clone(&calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            if attempt < 2 {
                Err(ToolError::Unknown {
                    status: 504,
                    message: "upstream timeout".to_string(),
                })
            } else {
                Ok("done")
            }
        }
    })
    .await;

    assert_eq!(result, Ok("done"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_exponential_delay_before_third_attempt_is_four_times_base() {
    let base = Duration::from_millis(250);
    let policy = RetryPolicy::exponential(3, base);
    let started = Instant::now();
    let attempt_times = Arc::new(Mutex::new(Vec::new()));

    let result: Result<(), ToolError> = execute_with_retry(&policy, "image", |_| {
        let attempt_times = Arc::clone(&attempt_times);
        async move {
            attempt_times
                .lock()
                .expect("times lock")
                .push(Instant::now().duration_since(started));
            Err(ToolError::RateLimited("429".to_string()))
        }
    })
    .await;

    assert!(matches!(result, Err(ToolError::RateLimited(_))));
    let times = attempt_times.lock().expect("times lock").clone();
    assert_eq!(times.len(), 3);
    assert_eq!(times[1] - times[0], base * 2);
    assert_eq!(times[2] - times[1], base * 4);
}

#[tokio::test(start_paused = true)]
async fn test_linear_delays_grow_by_base() {
    let base = Duration::from_millis(2_000);
    let policy = RetryPolicy::linear(3, base);
    let started = Instant::now();
    let attempt_times = Arc::new(Mutex::new(Vec::new()));

    let _: Result<(), ToolError> = execute_with_retry(&policy, "video", |_| {
        let attempt_times = Arc::clone(&attempt_times);
        async move {
            attempt_times
                .lock()
                .expect("times lock")
                .push(Instant::now().duration_since(started));
            Err(ToolError::Unavailable("503".to_string()))
        }
    })
    .await;

    let times = attempt_times.lock().expect("times lock").clone();
    assert_eq!(times, vec![Duration::ZERO, base, base * 3]);
}
