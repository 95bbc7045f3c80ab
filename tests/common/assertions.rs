//! Custom assertion macros
//!
//! Unwrapping helpers with descriptive panics for `Result`s and service envelopes.

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $message:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $message, e),
        }
    };
}

/// Assert that an envelope succeeded with data and return the data
#[macro_export]
macro_rules! assert_envelope_ok {
    ($envelope:expr) => {{
        let envelope = $envelope;
        assert!(
            envelope.success,
            "Expected successful envelope, got failure: {:?}",
            envelope.message
        );
        match envelope.data {
            Some(data) => data,
            None => panic!("Expected envelope data, got none"),
        }
    }};
}

/// Assert that an envelope failed and return its message
#[macro_export]
macro_rules! assert_envelope_failed {
    ($envelope:expr) => {{
        let envelope = $envelope;
        assert!(!envelope.success, "Expected failed envelope, got success");
        envelope.message.unwrap_or_default()
    }};
}

/// Assert that a string contains a substring
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "Expected '{}' to contain '{}'",
            $haystack,
            $needle
        );
    };
}
