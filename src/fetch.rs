//! HTTP helpers for making requests to the shopfloor API

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client, Method, RequestBuilder, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::auth::Auth;
use crate::error::Error;

/// Helper for building and executing HTTP requests
pub struct FetchBuilder<'a> {
    client: &'a Client,
    url: String,
    method: Method,
    headers: HeaderMap,
    query_params: Option<HashMap<String, String>>,
    body: Option<Vec<u8>>,
    auth: Option<&'a Auth>,
}

impl<'a> FetchBuilder<'a> {
    /// Create a new FetchBuilder
    pub fn new(client: &'a Client, url: &str, method: Method) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        Self {
            client,
            url: url.to_string(),
            method,
            headers,
            query_params: None,
            body: None,
            auth: None,
        }
    }

    /// Add a header to the request
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add bearer token authentication to the request
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {}", token))
    }

    /// Attach the session's bearer token when the request is built and log
    /// the session out if the server answers 401
    pub fn authorized(mut self, auth: &'a Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Add a query parameter to the request
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query_params
            .get_or_insert_with(HashMap::new)
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Add a JSON body to the request
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(body)?;
        self.body = Some(json);
        Ok(self)
    }

    /// Build the request, returning the bearer token it carries, if any
    fn build(&self) -> Result<(RequestBuilder, Option<String>), Error> {
        let mut url = Url::parse(&self.url)?;

        if let Some(params) = &self.query_params {
            let mut query_pairs = url.query_pairs_mut();
            for (key, value) in params {
                query_pairs.append_pair(key, value);
            }
        }

        let mut headers = self.headers.clone();
        let mut token = None;

        // The token is read here, right before sending, never carried across an await.
        if let Some(auth) = self.auth {
            let session = auth
                .current_session()
                .ok_or_else(|| Error::session_invalid("no active session"))?;
            let value = HeaderValue::from_str(&format!("Bearer {}", session.token))
                .map_err(|_| Error::session_invalid("session token is not a valid header value"))?;
            headers.insert(AUTHORIZATION, value);
            token = Some(session.token);
        }

        let mut req = self.client.request(self.method.clone(), url.as_str());
        req = req.headers(headers);

        if let Some(body) = &self.body {
            req = req.body(body.clone());
        }

        Ok((req, token))
    }

    /// Execute the request and parse the response as JSON
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let response = self.send_checked().await?;
        let text = response.text().await?;
        let result = serde_json::from_str(&text)?;
        Ok(result)
    }

    /// Execute the request, discarding any response body
    pub async fn execute_unit(&self) -> Result<(), Error> {
        self.send_checked().await?;
        Ok(())
    }

    /// Execute the request and return the raw response
    pub async fn execute_raw(&self) -> Result<Response, Error> {
        let (response, _) = self.send().await?;
        Ok(response)
    }

    async fn send(&self) -> Result<(Response, Option<String>), Error> {
        let (req, token) = self.build()?;
        debug!(method = %self.method, url = %self.url, "sending request");
        let response = req.send().await?;
        Ok((response, token))
    }

    async fn send_checked(&self) -> Result<Response, Error> {
        let (response, token) = self.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = error_message(status, &text);

        if status == StatusCode::UNAUTHORIZED {
            if let (Some(auth), Some(token)) = (self.auth, token.as_deref()) {
                warn!(url = %self.url, "request rejected with 401");
                auth.invalidate_token(token, &message).await;
                return Err(Error::SessionInvalid(message));
            }
        }

        Err(Error::Api { status, message })
    }
}

/// Pull a human readable message out of an error body
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

/// Helper for creating HTTP requests
pub struct Fetch;

impl Fetch {
    /// Create a GET request
    pub fn get<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::GET)
    }

    /// Create a POST request
    pub fn post<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::POST)
    }

    /// Create a PUT request
    pub fn put<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::PUT)
    }

    /// Create a DELETE request
    pub fn delete<'a>(client: &'a Client, url: &str) -> FetchBuilder<'a> {
        FetchBuilder::new(client, url, Method::DELETE)
    }
}

/// Shared handle for authenticated calls against the API host
#[derive(Clone)]
pub struct Api {
    client: Client,
    auth: Arc<Auth>,
}

impl Api {
    pub(crate) fn new(client: Client, auth: Arc<Auth>) -> Self {
        Self { client, auth }
    }

    /// The session service requests are authorized with
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Authenticated GET request for an endpoint path
    pub fn get(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::GET, path)
    }

    /// Authenticated POST request for an endpoint path
    pub fn post(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::POST, path)
    }

    /// Authenticated PUT request for an endpoint path
    pub fn put(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::PUT, path)
    }

    /// Authenticated DELETE request for an endpoint path
    pub fn delete(&self, path: &str) -> FetchBuilder<'_> {
        self.request(Method::DELETE, path)
    }

    fn request(&self, method: Method, path: &str) -> FetchBuilder<'_> {
        let url = self.auth.options().endpoint(path);
        FetchBuilder::new(&self.client, &url, method).authorized(&self.auth)
    }
}
