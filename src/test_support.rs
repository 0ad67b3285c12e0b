//! Call-counting transport for unit tests

use crate::cache::CachePolicy;
use crate::error::Result;
use crate::http::{ApiRequest, ApiResponse, Transport};
use crate::jss::Jss;
use crate::types::Method;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Serves canned responses keyed by method and path.
///
/// Several responses for one route are served in order and the last one
/// repeats. Unknown routes answer 404.
#[derive(Default)]
pub(crate) struct StubTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<ApiResponse>>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl StubTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn route(&self, method: Method, path: &str, status: u16, body: &str) {
        let content_type = if body.trim_start().starts_with('<') {
            "text/xml"
        } else {
            "application/json"
        };
        let response = ApiResponse::new(status, Some(content_type.to_string()), body);
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
    }

    pub(crate) fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.calls.lock().unwrap().push(request.clone());

        let mut routes = self.routes.lock().unwrap();
        let response = match routes.get_mut(&(request.method, request.path.clone())) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or_else(|| ApiResponse::new(404, None, "<p>The server has not found anything matching the request URI</p>")))
    }
}

/// Binding over a stub with the built-in catalog
pub(crate) fn jss_with(stub: &Arc<StubTransport>, policy: CachePolicy) -> Jss {
    let transport: Arc<dyn Transport> = stub.clone();
    Jss::builder()
        .transport(transport)
        .base_url("https://jss.example.com:8443")
        .cache_policy(policy)
        .build()
        .unwrap()
}

/// Binding over a stub whose data never expires
pub(crate) fn jss(stub: &Arc<StubTransport>) -> Jss {
    jss_with(stub, CachePolicy::never_expire())
}
