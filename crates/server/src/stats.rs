//! The stats resource: renders the timer metrics as a sortable HTML table.

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    response::{Html, IntoResponse, Response},
};
use http::StatusCode;
use metrics::{MetricRegistry, report};
use url::form_urlencoded;

/// Query parameter holding the group name prefix filter.
const CLASS_PARAM: &str = "class";

pub(crate) async fn stats(State(registry): State<Arc<MetricRegistry>>, RawQuery(query): RawQuery) -> Response {
    let class = class_from_query(query.as_deref());
    let mut body = String::new();

    match report::render(&registry, class.as_deref(), &mut body) {
        Ok(()) => Html(body).into_response(),
        Err(error) => {
            log::error!("Failed to render the metrics report: {error}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// First value of the `class` query parameter; repeated parameters keep
/// the first occurrence.
fn class_from_query(query: Option<&str>) -> Option<String> {
    query.and_then(|query| {
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == CLASS_PARAM)
            .map(|(_, value)| value.into_owned())
    })
}
