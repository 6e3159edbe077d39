//! HTTP Store
//!
//! `RemoteStore` over the JSON REST endpoints, via reqwest.

use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde_json::Value;

use super::{RemoteError, RemoteResult, RemoteStore};

#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> RemoteResult<Value> {
        log::debug!("[API] {} /{}", method, path);
        let mut request = self.client.request(method.clone(), self.url(path));

        // Session cookies come from the auth collaborator
        #[cfg(target_arch = "wasm32")]
        {
            request = request.fetch_credentials_include();
        }

        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            log::error!("[API] {} /{} failed: {}", method, path, e);
            RemoteError::client(e)
        })?;
        handle_response(response).await
    }
}

async fn handle_response(response: Response) -> RemoteResult<Value> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response.text().await.map_err(RemoteError::client)?;
    log::debug!("[API] Response: {} for {}", status, url);

    if status.is_success() {
        Ok(parse_body(&text))
    } else {
        let message = error_message(status.as_u16(), &text);
        log::error!("[API] Error {} for {}: {}", status.as_u16(), url, message);
        Err(RemoteError::new(status.as_u16(), message))
    }
}

/// Success bodies: JSON, empty -> null, anything else -> the raw text
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| {
        log::warn!("[API] Response is not JSON");
        Value::String(text.to_string())
    })
}

/// Human-readable message from an error body
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| format!("HTTP error! Status: {}", status))
}

#[async_trait(?Send)]
impl RemoteStore for HttpStore {
    async fn fetch(&self, path: &str) -> RemoteResult<Value> {
        self.request(Method::GET, path, None).await
    }

    async fn create(&self, path: &str, body: Value) -> RemoteResult<Value> {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn update(&self, path: &str, patch: Value) -> RemoteResult<Value> {
        self.request(Method::PUT, path, Some(patch)).await
    }

    async fn delete(&self, path: &str) -> RemoteResult<Value> {
        self.request(Method::DELETE, path, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_prefers_message_then_error() {
        assert_eq!(error_message(400, r#"{"message":"Title required"}"#), "Title required");
        assert_eq!(error_message(401, r#"{"error":"Unauthorized"}"#), "Unauthorized");
        assert_eq!(error_message(500, "<html>oops</html>"), "HTTP error! Status: 500");
        assert_eq!(error_message(404, r#"{"detail":1}"#), "HTTP error! Status: 404");
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body(r#"{"id":3}"#), json!({"id": 3}));
        assert_eq!(parse_body("deleted"), Value::String("deleted".into()));
    }

    #[test]
    fn test_url_joining() {
        let store = HttpStore::new("http://localhost:5000/api/");
        assert_eq!(store.url("task-lists"), "http://localhost:5000/api/task-lists");
        assert_eq!(store.url("/tasks/4"), "http://localhost:5000/api/tasks/4");
    }
}
