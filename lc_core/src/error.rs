use reqwest::StatusCode;
use thiserror::Error;

/// Why a menu page could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{url} answered with {status}")]
    Status { url: String, status: StatusCode },
    #[error("month {0} does not exist")]
    InvalidPeriod(u32),
}
