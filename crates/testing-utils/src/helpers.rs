//! Naming helpers for integration tests.

use chrono::Utc;

pub struct TestEnv;

impl TestEnv {
    pub fn unique_email(prefix: &str) -> String {
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or(0);
        format!("{prefix}_{timestamp}@example.com")
    }
}
