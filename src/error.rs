//! Error types.
//!
//! The error surface is deliberately tiny: every steady-state clock operation
//! is total, so the only failure in the system is claiming a well-known name
//! that is already taken.

/// An error from mock clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// A clock is already registered under the requested name.
    #[error("a mock clock is already registered under {name:?}")]
    AlreadyRegistered {
        /// The contested name.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_names_the_address() {
        let err = ClockError::AlreadyRegistered {
            name: "mock_clock".into(),
        };
        assert!(err.to_string().contains("mock_clock"));
    }
}
