//! Request timing middleware.
//!
//! Times every matched request into an aggregate timer and a per-route
//! timer. The per-route timers are what the stats report renders; the
//! aggregate timer lives in the excluded group and stays out of it.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Instant,
};

use axum::{body::Body, extract::MatchedPath};
use http::{Request, Response};
use metrics::{MetricName, MetricRegistry, report};
use tower::Layer;

/// Group for the aggregate request timer.
const FILTER_GROUP: &str = report::EXCLUDED_GROUP;

/// Group for the per-route timers.
const RESOURCES_GROUP: &str = "apitrack.resources";

#[derive(Clone)]
pub(crate) struct RequestTimingLayer(Arc<MetricRegistry>);

impl RequestTimingLayer {
    pub(crate) fn new(registry: Arc<MetricRegistry>) -> Self {
        Self(registry)
    }
}

impl<Service> Layer<Service> for RequestTimingLayer {
    type Service = RequestTimingService<Service>;

    fn layer(&self, next: Service) -> Self::Service {
        RequestTimingService {
            next,
            registry: self.0.clone(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct RequestTimingService<Service> {
    next: Service,
    registry: Arc<MetricRegistry>,
}

impl<Service, ReqBody> tower::Service<Request<ReqBody>> for RequestTimingService<Service>
where
    Service: tower::Service<Request<ReqBody>, Response = Response<Body>> + Clone + Send + 'static,
    Service::Future: Send,
    ReqBody: Send + 'static,
{
    type Response = Response<Body>;
    type Error = Service::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response<Body>, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.next.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let route = req
            .extensions()
            .get::<MatchedPath>()
            .map(|matched| matched.as_str().to_owned());

        let registry = self.registry.clone();
        let mut next = self.next.clone();

        Box::pin(async move {
            let Some(route) = route else {
                return next.call(req).await;
            };

            let start = Instant::now();
            let response = next.call(req).await?;
            let elapsed = start.elapsed();

            registry
                .timer(MetricName::new(FILTER_GROUP, "http", "requests"))
                .record(elapsed);

            let (scope, name) = route_metric_name(&route);
            registry
                .timer(MetricName::new(RESOURCES_GROUP, scope, name))
                .record(elapsed);

            Ok(response)
        })
    }
}

/// Derives the per-route timer identity from the matched route template:
/// the first segment becomes the scope, the rest the name. A route with a
/// single segment uses it for both.
fn route_metric_name(route: &str) -> (String, String) {
    let mut segments = route.split('/').filter(|segment| !segment.is_empty());

    let scope = segments.next().unwrap_or("root").to_string();
    let name = segments.collect::<Vec<_>>().join("/");

    if name.is_empty() {
        (scope.clone(), scope)
    } else {
        (scope, name)
    }
}
