//! Shared fixtures for unit tests: a scripted transport and JSON builders.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{ApiClient, ApiError, ApiRequest, Method, RawResponse, Transport};
use crate::auth::{MemoryTokenStore, SessionStore};

pub const TEST_BASE_URL: &str = "https://api.test";

type Responder = dyn Fn(&ApiRequest, usize) -> (Duration, u16, String) + Send + Sync;

/// Transport answering from a closure.
///
/// The closure gets the request and how many earlier requests used the same
/// method and URL, so a test can script a sequence of answers per endpoint.
pub struct MockTransport {
    responder: Box<Responder>,
    requests: Mutex<Vec<ApiRequest>>,
    calls: Mutex<HashMap<(Method, String), usize>>,
}

impl MockTransport {
    pub fn new<F>(respond: F) -> Arc<Self>
    where
        F: Fn(&ApiRequest, usize) -> (u16, String) + Send + Sync + 'static,
    {
        Self::with_delay(move |req, n| {
            let (status, body) = respond(req, n);
            (Duration::ZERO, status, body)
        })
    }

    /// Like `new`, with a per-response delay on the tokio clock.
    pub fn with_delay<F>(respond: F) -> Arc<Self>
    where
        F: Fn(&ApiRequest, usize) -> (Duration, u16, String) + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(respond),
            requests: Mutex::new(Vec::new()),
            calls: Mutex::new(HashMap::new()),
        })
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    /// Requests sent to `path`, any method.
    pub fn count(&self, path: &str) -> usize {
        let url = format!("{}{}", TEST_BASE_URL, path);
        self.requests
            .lock()
            .expect("requests lock")
            .iter()
            .filter(|req| req.url == url)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let n = {
            let mut calls = self.calls.lock().expect("calls lock");
            let n = calls
                .entry((request.method, request.url.clone()))
                .or_insert(0);
            *n += 1;
            *n - 1
        };
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());

        let (delay, status, body) = (self.responder)(&request, n);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(RawResponse { status, body })
    }
}

pub fn test_session() -> SessionStore {
    SessionStore::new(Box::new(MemoryTokenStore::default()))
}

pub fn test_client(transport: Arc<MockTransport>) -> (ApiClient, SessionStore) {
    let session = test_session();
    let client = ApiClient::new(transport, TEST_BASE_URL, session.clone());
    (client, session)
}

/// `{"success":true,"data":<data>}`
pub fn ok_json(data: &str) -> String {
    format!(r#"{{"success":true,"data":{}}}"#, data)
}

pub fn organization_json(id: &str, name: &str) -> String {
    format!(r#"{{"id":"{}","name":"{}","type":"home"}}"#, id, name)
}

pub fn user_json(id: &str) -> String {
    format!(r#"{{"id":"{id}","email":"{id}@example.com","firstName":"Test","lastName":"User"}}"#)
}

/// An unassigned night shift with `count` slots.
pub fn shift_json(id: &str, count: u32) -> String {
    format!(
        r#"{{"id":"{}","date":"2026-03-02","pattern":{{"id":"p1","name":"Night","startTime":"20:00:00","endTime":"08:00:00"}},"status":"pending","count":{}}}"#,
        id, count
    )
}
