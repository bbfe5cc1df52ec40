//! Scripted transport for adapter tests.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{HttpRequest, HttpResponse, Method, ProviderResult, Transport};

struct Route {
    method: Method,
    url: String,
    responses: VecDeque<HttpResponse>,
}

/// A [`Transport`] answering from registered routes and recording requests.
///
/// Routes match on method and URL without query string. A route registered
/// several times answers in order; its last response then repeats.
/// Unmatched requests get a 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeTransport {
    /// Creates a transport with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a response.
    pub fn on(&self, method: Method, url: &str, status: u16, body: &str) -> &Self {
        let mut routes = lock(&self.routes);
        let response = HttpResponse::new(status, body);
        match routes.iter_mut().find(|r| r.method == method && r.url == url) {
            Some(route) => route.responses.push_back(response),
            None => routes.push(Route {
                method,
                url: url.to_string(),
                responses: VecDeque::from([response]),
            }),
        }
        self
    }

    /// Returns every request sent so far.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Returns requests sent with `method`.
    #[must_use]
    pub fn requests_with(&self, method: Method) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    /// Returns the number of non-GET requests.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method != Method::Get)
            .count()
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: &HttpRequest) -> ProviderResult<HttpResponse> {
        lock(&self.requests).push(request.clone());

        let path = request.url.split('?').next().unwrap_or_default();
        let mut routes = lock(&self.routes);
        let response = routes
            .iter_mut()
            .find(|r| r.method == request.method && r.url == path)
            .and_then(|route| {
                if route.responses.len() > 1 {
                    route.responses.pop_front()
                } else {
                    route.responses.front().cloned()
                }
            })
            .unwrap_or_else(|| HttpResponse::new(404, r#"{"message":"Not Found"}"#));
        Ok(response)
    }
}
