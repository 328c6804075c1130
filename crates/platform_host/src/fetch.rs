//! Remote content retrieval contracts and adapters.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Object-safe boxed future used by [`ContentFetcher`] async methods.
pub type FetchFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Typed failure signal returned by the fetch boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Nothing is served at the requested path.
    NotFound {
        /// Requested path.
        path: String,
    },
    /// The transport failed before a body was received.
    Transport {
        /// Requested path.
        path: String,
        /// Transport diagnostic.
        message: String,
    },
    /// The body carried an `error` field.
    Remote {
        /// Requested path.
        path: String,
        /// Value of the `error` field.
        message: String,
    },
    /// The body could not be decoded into the expected shape.
    Decode {
        /// Requested path.
        path: String,
        /// Decoder diagnostic.
        message: String,
    },
}

impl FetchError {
    /// Returns the requested path the failure belongs to.
    pub fn path(&self) -> &str {
        match self {
            Self::NotFound { path }
            | Self::Transport { path, .. }
            | Self::Remote { path, .. }
            | Self::Decode { path, .. } => path,
        }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "not found: {path}"),
            Self::Transport { path, message } => write!(f, "request to {path} failed: {message}"),
            Self::Remote { path, message } => write!(f, "{path} responded with error: {message}"),
            Self::Decode { path, message } => write!(f, "invalid body from {path}: {message}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Host service issuing `GET` requests for shell content.
pub trait ContentFetcher {
    /// Fetches the raw body served at `path`.
    fn fetch_text<'a>(&'a self, path: &'a str) -> FetchFuture<'a, Result<String, FetchError>>;
}

/// Applies the failure convention: a JSON object body with an `error` field is a failure.
///
/// Bodies that are not JSON objects (markup, plain text) pass through unchanged.
///
/// # Errors
///
/// Returns [`FetchError::Remote`] when the body carries an `error` field.
pub fn check_error_field(path: &str, body: &str) -> Result<(), FetchError> {
    let trimmed = body.trim_start();
    if !trimmed.starts_with('{') {
        return Ok(());
    }
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) else {
        return Ok(());
    };
    match map.get("error") {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(message)) => Err(FetchError::Remote {
            path: path.to_string(),
            message: message.clone(),
        }),
        Some(other) => Err(FetchError::Remote {
            path: path.to_string(),
            message: other.to_string(),
        }),
    }
}

/// Fetches a body and applies [`check_error_field`].
///
/// # Errors
///
/// Returns transport failures and error-field failures.
pub async fn fetch_checked_with<F: ContentFetcher + ?Sized>(
    fetcher: &F,
    path: &str,
) -> Result<String, FetchError> {
    let body = fetcher.fetch_text(path).await?;
    check_error_field(path, &body)?;
    Ok(body)
}

/// Fetches and deserializes a JSON body through a [`ContentFetcher`] implementation.
///
/// # Errors
///
/// Returns transport failures, error-field failures, and JSON decoding failures.
pub async fn fetch_json_with<F: ContentFetcher + ?Sized, T: DeserializeOwned>(
    fetcher: &F,
    path: &str,
) -> Result<T, FetchError> {
    let body = fetch_checked_with(fetcher, path).await?;
    serde_json::from_str(&body).map_err(|e| FetchError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

#[derive(Debug, Clone, Copy, Default)]
/// Fetcher that serves nothing.
pub struct NoopContentFetcher;

impl ContentFetcher for NoopContentFetcher {
    fn fetch_text<'a>(&'a self, path: &'a str) -> FetchFuture<'a, Result<String, FetchError>> {
        Box::pin(async move {
            Err(FetchError::NotFound {
                path: path.to_string(),
            })
        })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory fetcher keyed by request path, recording every request it receives.
pub struct MemoryContentFetcher {
    routes: Rc<RefCell<HashMap<String, Result<String, String>>>>,
    requests: Rc<RefCell<Vec<String>>>,
}

impl MemoryContentFetcher {
    /// Serves `body` at `path`.
    pub fn insert_text(&self, path: impl Into<String>, body: impl Into<String>) {
        self.routes
            .borrow_mut()
            .insert(path.into(), Ok(body.into()));
    }

    /// Serves `value` serialized as JSON at `path`.
    pub fn insert_json(&self, path: impl Into<String>, value: &Value) {
        self.insert_text(path, value.to_string());
    }

    /// Makes requests for `path` fail at the transport level.
    pub fn fail(&self, path: impl Into<String>, message: impl Into<String>) {
        self.routes
            .borrow_mut()
            .insert(path.into(), Err(message.into()));
    }

    /// Stops serving `path`.
    pub fn remove(&self, path: &str) {
        self.routes.borrow_mut().remove(path);
    }

    /// Returns every requested path in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// Returns how many times `path` was requested.
    pub fn request_count(&self, path: &str) -> usize {
        self.requests.borrow().iter().filter(|p| *p == path).count()
    }
}

impl ContentFetcher for MemoryContentFetcher {
    fn fetch_text<'a>(&'a self, path: &'a str) -> FetchFuture<'a, Result<String, FetchError>> {
        Box::pin(async move {
            self.requests.borrow_mut().push(path.to_string());
            match self.routes.borrow().get(path) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(message)) => Err(FetchError::Transport {
                    path: path.to_string(),
                    message: message.clone(),
                }),
                None => Err(FetchError::NotFound {
                    path: path.to_string(),
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Answer {
        answer: u32,
    }

    #[test]
    fn error_field_marks_successful_body_as_failure() {
        let err = check_error_field("/x", r#"{"error":"denied"}"#).unwrap_err();
        assert_eq!(
            err,
            FetchError::Remote {
                path: "/x".to_string(),
                message: "denied".to_string()
            }
        );
        assert!(check_error_field("/x", r#"{"error":null,"ok":true}"#).is_ok());
        assert!(check_error_field("/x", "<div class=\"error\">markup</div>").is_ok());
        assert!(check_error_field("/x", "{ not json").is_ok());
    }

    #[test]
    fn memory_fetcher_serves_routes_and_records_requests() {
        let fetcher = MemoryContentFetcher::default();
        fetcher.insert_json("/answer", &json!({ "answer": 42 }));
        fetcher.fail("/down", "offline");

        let answer: Answer = block_on(fetch_json_with(&fetcher, "/answer")).expect("answer");
        assert_eq!(answer, Answer { answer: 42 });
        assert!(matches!(
            block_on(fetcher.fetch_text("/down")),
            Err(FetchError::Transport { .. })
        ));
        assert!(matches!(
            block_on(fetcher.fetch_text("/missing")),
            Err(FetchError::NotFound { .. })
        ));
        assert_eq!(fetcher.requests(), vec!["/answer", "/down", "/missing"]);
        assert_eq!(fetcher.request_count("/answer"), 1);
    }

    #[test]
    fn fetch_json_reports_decode_and_remote_failures() {
        let fetcher = MemoryContentFetcher::default();
        fetcher.insert_text("/bad", "[1, 2");
        fetcher.insert_json("/remote", &json!({ "error": { "code": 7 } }));

        let bad = block_on(fetch_json_with::<_, Answer>(&fetcher, "/bad")).unwrap_err();
        assert!(matches!(bad, FetchError::Decode { .. }));
        let remote = block_on(fetch_json_with::<_, Answer>(&fetcher, "/remote")).unwrap_err();
        assert_eq!(remote.path(), "/remote");
        assert!(matches!(remote, FetchError::Remote { .. }));
    }

    #[test]
    fn noop_fetcher_serves_nothing() {
        let fetcher = NoopContentFetcher;
        let fetcher_obj: &dyn ContentFetcher = &fetcher;
        assert!(block_on(fetcher_obj.fetch_text("/a")).is_err());
    }
}
