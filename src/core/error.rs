use thiserror::Error;

/// Calculator failures. Always a caller input problem, never an engine fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuoteError {
    #[error("invalid {field}: {message}")]
    InvalidInput { field: &'static str, message: String },
}

impl QuoteError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        QuoteError::InvalidInput {
            field,
            message: message.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            QuoteError::InvalidInput { field, .. } => field,
        }
    }
}

/// Rate table loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read rate tables from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rate tables: {0}")]
    Parse(String),

    #[error("unsupported rate table format: {0} (expected .toml or .json)")]
    UnsupportedFormat(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<(), QuoteError> {
    if !value.is_finite() {
        return Err(QuoteError::invalid(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(QuoteError::invalid(field, format!("must be >= 0, got {value}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_message_names_the_field() {
        let err = QuoteError::invalid("vehiclePrice", "must be >= 0");
        assert_eq!(err.field(), "vehiclePrice");
        assert_eq!(err.to_string(), "invalid vehiclePrice: must be >= 0");
    }

    #[test]
    fn ensure_non_negative_rejects_nan_and_negatives() {
        assert!(ensure_non_negative("x", 0.0).is_ok());
        assert!(ensure_non_negative("x", 12.5).is_ok());
        assert!(ensure_non_negative("x", -0.01).is_err());
        assert!(ensure_non_negative("x", f64::NAN).is_err());
        assert!(ensure_non_negative("x", f64::INFINITY).is_err());
    }
}
