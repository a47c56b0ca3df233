#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validate(#[from] validator::ValidationErrors),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unknown(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Unknown(value.into())
    }
}

#[macro_export]
macro_rules! invalid {
    ($msg:literal $(,)?) => {
        return Err($crate::Error::InvalidInput(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::Error::InvalidInput(format!($fmt, $($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_count(count: usize) -> Result<usize> {
        if count > 5 {
            invalid!("count must be at most 5, got {count}");
        }

        Ok(count)
    }

    #[test]
    fn invalid_returns_input_error() {
        assert_eq!(check_count(3).ok(), Some(3));

        let err = check_count(9).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(err.to_string(), "invalid input: count must be at most 5, got 9");
    }
}
