//! In-process stand-in for the robot webhooks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::Uri;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tokio::task::JoinHandle;

pub type Responder = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

pub fn reply(value: Value) -> Responder {
    Arc::new(move |_: &Value| value.clone())
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub raw_query: String,
    pub body: Value,
}

impl Recorded {
    pub fn query(&self) -> HashMap<String, String> {
        serde_urlencoded::from_str(&self.raw_query).unwrap()
    }
}

pub struct MockServer {
    pub base: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn start(routes: Vec<(&'static str, Responder)>) -> Self {
        let requests: Arc<Mutex<Vec<Recorded>>> = Arc::default();
        let mut app = Router::new();
        for (path, responder) in routes {
            let requests = requests.clone();
            app = app.route(
                path,
                post(move |uri: Uri, Json(body): Json<Value>| {
                    let requests = requests.clone();
                    let responder = responder.clone();
                    async move {
                        let response = responder(&body);
                        requests.lock().unwrap().push(Recorded {
                            path: uri.path().to_string(),
                            raw_query: uri.query().unwrap_or_default().to_string(),
                            body,
                        });
                        Json(response)
                    }
                }),
            );
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", address),
            requests,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn requests(&self, path: &str) -> Vec<Recorded> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A URL nobody listens on, so requests fail at the transport level.
pub async fn closed_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/closed", address)
}
