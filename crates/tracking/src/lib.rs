//! API call tracking for the apitrack server.
//!
//! An [`ApiCallsTracker`] receives one [`ApiCall`] per dispatched request
//! and either ignores it, logs it, or queues it for asynchronous
//! persistence. Tracking observes requests, it never vetoes them: `track`
//! does not block and does not surface errors to the request path.

#![deny(missing_docs)]

mod store;
mod worker;

use jiff::Timestamp;

pub use store::{CallRecord, CallStore, RedisStore, StoreError};
pub use worker::PersistentTracker;

/// One observed request, as seen by the tracking middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    /// The calling client, or `undefined` when the request named none.
    pub client: String,
    /// The HTTP method.
    pub http_method: String,
    /// The matched route template.
    pub path: String,
}

/// Strategy for recording observed API calls.
pub enum ApiCallsTracker {
    /// Discards every call.
    Ignoring,
    /// Writes one log line per call.
    Logging,
    /// Queues calls for asynchronous persistence.
    Persistent(PersistentTracker),
}

impl ApiCallsTracker {
    /// Records one observed call.
    pub fn track(&self, api_call: ApiCall) {
        match self {
            ApiCallsTracker::Ignoring => {}
            ApiCallsTracker::Logging => {
                log::info!(
                    "{} called {} {} on {}",
                    api_call.client,
                    api_call.http_method,
                    api_call.path,
                    Timestamp::now()
                );
            }
            ApiCallsTracker::Persistent(tracker) => tracker.submit(api_call),
        }
    }
}
