//! Request tracking middleware.
//!
//! Builds an [`ApiCall`] for every request the router matched and hands
//! it to the configured tracker before delegating to the handler.
//! Requests without a matched route pass through untracked.

use std::{
    sync::Arc,
    task::{Context, Poll},
};

use axum::extract::MatchedPath;
use http::{Method, Request};
use tower::Layer;
use tracking::{ApiCall, ApiCallsTracker};
use url::form_urlencoded;

/// Query parameter naming the calling client.
const CLIENT_PARAM: &str = "client";

/// Client recorded when the request names none.
const UNKNOWN_CLIENT: &str = "undefined";

#[derive(Clone)]
pub(crate) struct TrackingLayer(Arc<ApiCallsTracker>);

impl TrackingLayer {
    pub(crate) fn new(tracker: Arc<ApiCallsTracker>) -> Self {
        Self(tracker)
    }
}

impl<Service> Layer<Service> for TrackingLayer {
    type Service = TrackingService<Service>;

    fn layer(&self, next: Service) -> Self::Service {
        TrackingService {
            next,
            tracker: self.0.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct TrackingService<Service> {
    next: Service,
    tracker: Arc<ApiCallsTracker>,
}

impl<Service, ReqBody> tower::Service<Request<ReqBody>> for TrackingService<Service>
where
    Service: tower::Service<Request<ReqBody>>,
{
    type Response = Service::Response;
    type Error = Service::Error;
    type Future = Service::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        if let Some(matched) = req.extensions().get::<MatchedPath>() {
            let call = api_call(req.method(), matched.as_str(), req.uri().query());
            self.tracker.track(call);
        }

        self.next.call(req)
    }
}

fn api_call(method: &Method, path: &str, query: Option<&str>) -> ApiCall {
    ApiCall {
        client: client_from_query(query),
        http_method: method.to_string(),
        path: path.to_string(),
    }
}

/// First value of the `client` query parameter; an empty value counts as
/// absent.
fn client_from_query(query: Option<&str>) -> String {
    query
        .and_then(|query| {
            form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == CLIENT_PARAM)
                .map(|(_, value)| value.into_owned())
        })
        .filter(|client| !client.is_empty())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_defaults_to_undefined_without_the_parameter() {
        let call = api_call(&Method::GET, "/clock/date", None);

        assert_eq!("undefined", call.client);
        assert_eq!("GET", call.http_method);
        assert_eq!("/clock/date", call.path);
    }

    #[test]
    fn the_first_client_value_wins() {
        let call = api_call(&Method::GET, "/clock/date", Some("client=foo&client=bar"));
        assert_eq!("foo", call.client);
    }

    #[test]
    fn an_empty_client_value_counts_as_absent() {
        let call = api_call(&Method::GET, "/clock/date", Some("client="));
        assert_eq!("undefined", call.client);
    }

    #[test]
    fn other_parameters_are_ignored() {
        let call = api_call(&Method::POST, "/clock/date", Some("verbose=1&client=alice"));

        assert_eq!("alice", call.client);
        assert_eq!("POST", call.http_method);
    }

    #[test]
    fn client_values_are_url_decoded() {
        let call = api_call(&Method::GET, "/clock/date", Some("client=alice%20smith"));
        assert_eq!("alice smith", call.client);
    }
}
