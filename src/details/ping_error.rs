use std::{error::Error, fmt};

// Errors raised by this crate itself. Errors coming from the operating system are passed on as
// `std::io::Error` inside a `GenericError` so that callers can still inspect their kind.
#[derive(Debug)]
pub struct PingError {
    pub message: String,
}

impl PingError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        PingError { message: message.into() }
    }
}

impl fmt::Display for PingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "PingError")?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl Error for PingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}

impl From<std::io::Error> for PingError {
    fn from(error: std::io::Error) -> PingError {
        PingError { message: error.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use super::*;

    #[test]
    fn derive_debug() {
        let ping_error = PingError::new("packet size too small");
        let fmt_debug_str = format!("{ping_error:?}");
        assert_eq!("PingError { message: \"packet size too small\" }", fmt_debug_str);
    }

    #[test]
    fn fmt_without_message() {
        let ping_error = PingError::new("");
        assert_eq!("PingError", format!("{ping_error}"));
    }

    #[test]
    fn fmt_with_message() {
        let ping_error = PingError::new("unknown host nowhere");
        assert_eq!("PingError: unknown host nowhere", format!("{ping_error}"));
    }

    #[test]
    fn source() {
        assert!(PingError::new(String::new()).source().is_none());
    }

    #[test]
    fn ping_error_from_std_io_error_keeps_message() {
        let std_io_error = std::io::Error::new(ErrorKind::PermissionDenied, "operation not permitted");
        let ping_error: PingError = PingError::from(std_io_error);
        assert_eq!("PingError: operation not permitted", format!("{ping_error}"));
        assert!(ping_error.source().is_none());
    }
}
