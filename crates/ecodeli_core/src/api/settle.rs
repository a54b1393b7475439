//! Settle-all join support.
//!
//! Loaders issue independent requests concurrently with `tokio::join!`
//! over [`settle`]d futures; each failed slice degrades to a default.

use crate::api::error::{ApiError, ApiResult};
use log::warn;
use std::future::Future;

/// Outcome of one request inside a settle-all join.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled<T> {
    Fulfilled(T),
    Rejected(ApiError),
}

impl<T> Settled<T> {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Fulfilled(value) => Some(value),
            Self::Rejected(_) => None,
        }
    }

    pub fn into_result(self) -> ApiResult<T> {
        match self {
            Self::Fulfilled(value) => Ok(value),
            Self::Rejected(err) => Err(err),
        }
    }
}

impl<T: Default> Settled<T> {
    /// Fulfilled value, or `T::default()` for a rejected slice.
    pub fn ok_or_default(self) -> T {
        self.into_option().unwrap_or_default()
    }
}

/// Awaits `future` and captures its outcome; rejections are logged at
/// `warn` under `label`.
pub async fn settle<T, F>(label: &'static str, future: F) -> Settled<T>
where
    F: Future<Output = ApiResult<T>>,
{
    match future.await {
        Ok(value) => Settled::Fulfilled(value),
        Err(err) => {
            warn!(
                "event=settle module=api status=rejected slice={} code={} error={}",
                label,
                err.code(),
                err
            );
            Settled::Rejected(err)
        }
    }
}
