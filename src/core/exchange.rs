//! Currency exchange abstractions

use super::context::{CallContext, Interrupted};
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

/// A single conversion lookup. Symbols are expected in uppercase.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRequest {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Interrupted(#[from] Interrupted),
    #[error("could not get data from CMC")]
    Transport(#[source] reqwest::Error),
    #[error("could not read data from CMC")]
    Read(#[source] reqwest::Error),
    #[error("CMC unexpected status code: {0}")]
    BadStatus(StatusCode),
    #[error("could not decode data from CMC")]
    Decode(#[from] serde_json::Error),
    #[error("missing data for {0:?}")]
    MissingData(String),
    #[error("missing quote for {0:?}")]
    MissingQuote(String),
}

impl ExchangeError {
    /// True when the call was cancelled or ran past its deadline.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, ExchangeError::Interrupted(_))
    }
}

#[async_trait]
pub trait Exchanger: Send + Sync {
    async fn exchange(
        &self,
        ctx: &CallContext,
        request: &ExchangeRequest,
    ) -> Result<f64, ExchangeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ExchangeError::MissingData("USD".to_string()).to_string(),
            r#"missing data for "USD""#
        );
        assert_eq!(
            ExchangeError::MissingQuote("BTC".to_string()).to_string(),
            r#"missing quote for "BTC""#
        );
        assert_eq!(
            ExchangeError::BadStatus(StatusCode::INTERNAL_SERVER_ERROR).to_string(),
            "CMC unexpected status code: 500 Internal Server Error"
        );
        assert_eq!(
            ExchangeError::from(Interrupted::DeadlineExceeded).to_string(),
            "deadline exceeded"
        );
    }

    #[test]
    fn test_decode_error_keeps_cause_out_of_message() {
        use std::error::Error as _;

        let cause = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let cause_message = cause.to_string();
        let err = ExchangeError::from(cause);

        assert_eq!(err.to_string(), "could not decode data from CMC");
        assert_eq!(err.source().map(|e| e.to_string()), Some(cause_message.clone()));

        let rendered = format!("{:#}", anyhow::Error::new(err));
        assert_eq!(rendered.matches(&cause_message).count(), 1);
    }

    #[test]
    fn test_is_interrupted() {
        assert!(ExchangeError::from(Interrupted::Canceled).is_interrupted());
        assert!(!ExchangeError::MissingData("USD".to_string()).is_interrupted());
    }
}
