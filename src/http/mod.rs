//! Request execution pipeline: transport, single-shot executor, and backoff policy.

mod executor;
mod retry;
pub(crate) mod transport;

pub use executor::RequestExecutor;
pub use retry::{DEFAULT_MAX_RETRIES, RetryState, Sleeper, TokioSleeper, is_transient_status};
pub use transport::{HttpTransport, ReqwestTransport, ResponseEnvelope, TransportRequest};

#[cfg(test)]
pub(crate) use retry::MockSleeper;
