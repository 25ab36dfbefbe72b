//! Process-wide error type.
//!
//! Every fallible operation returns `AppError`, which carries the message the
//! user sees plus the process exit code. Codes follow a fixed scheme:
//!
//! - `2` — configuration/schema problems (bundle missing or invalid, CSV
//!   unreadable, required feature columns missing, bad `--set` input)
//! - `3` — data problems inside an otherwise well-formed table (non-numeric
//!   charges token, unknown category, empty table)
//! - `4` — runtime failures (terminal init/draw, export I/O)

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Configuration/schema error (exit code 2).
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Data-level error (exit code 3).
    pub fn data(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    /// Runtime failure (exit code 4).
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_carry_exit_codes() {
        assert_eq!(AppError::config("x").exit_code(), 2);
        assert_eq!(AppError::data("x").exit_code(), 3);
        assert_eq!(AppError::runtime("x").exit_code(), 4);
    }

    #[test]
    fn display_is_message_only() {
        let err = AppError::config("Bundle not found.");
        assert_eq!(err.to_string(), "Bundle not found.");
    }
}
