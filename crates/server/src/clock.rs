//! The clock resource: the current date and the current epoch timestamp.

use axum::Json;
use jiff::{Timestamp, Zoned};

/// Returns the current date and time as a JSON string.
pub(crate) async fn date() -> Json<String> {
    Json(Zoned::now().to_string())
}

/// Returns the current epoch time in milliseconds as a JSON string.
pub(crate) async fn timestamp() -> Json<String> {
    Json(Timestamp::now().as_millisecond().to_string())
}
