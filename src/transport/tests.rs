use std::time::Duration;

use crate::transport::http::HttpTransport;
use crate::transport::retry::{Backoff, RetryPolicy};

#[test]
fn test_transport_exports_compile() {
    let transport = HttpTransport::new(1_000);
    assert!(transport.is_ok());

    let policy = RetryPolicy::new(3, Duration::from_millis(10), Backoff::Linear);
    assert!(policy.validate().is_ok());
}
