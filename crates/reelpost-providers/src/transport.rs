// ABOUTME: Injected HTTP capability used for every platform API call
// ABOUTME: reqwest-backed transport with byte counting and a scripted transport for tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Reelpost Contributors

//! # HTTP Transport
//!
//! Drivers, profile lookups, and the OAuth client never hold a `reqwest::Client`
//! directly. They build a [`TransportRequest`] and hand it to an
//! [`HttpTransport`], which lets tests substitute [`ScriptedTransport`].
//!
//! Binary bodies are streamed in fixed slices so the transport can report how
//! many bytes were handed to the connection, both to progress listeners and in
//! [`ProviderError::Network`] when the exchange fails midway.

use crate::constants::uploads::PROGRESS_SLICE_BYTES;
use crate::errors::{ProviderError, ProviderResult};
use crate::http_client::shared_client;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, Stream};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;
use url::form_urlencoded;

/// Callback receiving the cumulative number of body bytes handed to the connection
pub type ByteProgress = Arc<dyn Fn(u64) + Send + Sync>;

/// HTTP verbs the platform APIs need
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
}

impl HttpMethod {
    /// Upper-case verb
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One part of a multipart/form-data body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartField {
    /// Plain text field
    Text {
        /// Field name
        name: String,
        /// Field value
        value: String,
    },
    /// Binary file field
    File {
        /// Field name
        name: String,
        /// File name reported to the server
        file_name: String,
        /// MIME type of the part
        content_type: String,
        /// Part bytes
        data: Bytes,
    },
}

impl MultipartField {
    /// Text field
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Binary file field
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Bytes,
    ) -> Self {
        Self::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Field name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Request payload
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body
    Empty,
    /// `application/json`
    Json(Value),
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    /// Raw bytes streamed with an explicit length
    Bytes {
        /// Payload
        data: Bytes,
        /// MIME type sent as `Content-Type`
        content_type: String,
    },
    /// `multipart/form-data`
    Multipart(Vec<MultipartField>),
}

impl RequestBody {
    /// Value of a form or multipart text field
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        match self {
            Self::Form(pairs) => pairs
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.as_str()),
            Self::Multipart(fields) => fields.iter().find_map(|field| match field {
                MultipartField::Text { name, value } if name == key => Some(value.as_str()),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Bytes of a multipart file field
    #[must_use]
    pub fn file_part(&self, key: &str) -> Option<&Bytes> {
        match self {
            Self::Multipart(fields) => fields.iter().find_map(|field| match field {
                MultipartField::File { name, data, .. } if name == key => Some(data),
                _ => None,
            }),
            _ => None,
        }
    }

    /// JSON payload, if this is a JSON body
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Raw payload length, if this is a byte body
    #[must_use]
    pub fn byte_len(&self) -> Option<u64> {
        match self {
            Self::Bytes { data, .. } => Some(data.len() as u64),
            _ => None,
        }
    }
}

/// A single outbound platform API call
#[derive(Clone)]
pub struct TransportRequest {
    /// Platform slug used in errors and logs
    pub provider: &'static str,
    /// Verb
    pub method: HttpMethod,
    /// Absolute URL including query string
    pub url: String,
    /// Extra headers
    pub headers: Vec<(String, String)>,
    /// Bearer token sent as `Authorization`
    pub bearer: Option<String>,
    /// Payload
    pub body: RequestBody,
    /// Progress callback for byte bodies
    pub on_progress: Option<ByteProgress>,
}

impl fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRequest")
            .field("provider", &self.provider)
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("bearer", &self.bearer.as_ref().map(|_| "[REDACTED]"))
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl TransportRequest {
    /// Request with no headers and an empty body
    #[must_use]
    pub fn new(provider: &'static str, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            provider,
            method,
            url: url.into(),
            headers: Vec::new(),
            bearer: None,
            body: RequestBody::Empty,
            on_progress: None,
        }
    }

    /// GET request
    #[must_use]
    pub fn get(provider: &'static str, url: impl Into<String>) -> Self {
        Self::new(provider, HttpMethod::Get, url)
    }

    /// POST request
    #[must_use]
    pub fn post(provider: &'static str, url: impl Into<String>) -> Self {
        Self::new(provider, HttpMethod::Post, url)
    }

    /// PUT request
    #[must_use]
    pub fn put(provider: &'static str, url: impl Into<String>) -> Self {
        Self::new(provider, HttpMethod::Put, url)
    }

    /// Append url-encoded query parameters
    #[must_use]
    pub fn query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        if !encoded.is_empty() {
            let separator = if self.url.contains('?') { '&' } else { '?' };
            self.url.push(separator);
            self.url.push_str(&encoded);
        }
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Authenticate with a bearer token
    #[must_use]
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// JSON body
    #[must_use]
    pub fn json(mut self, value: Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    /// Form-encoded body
    #[must_use]
    pub fn form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Raw byte body
    #[must_use]
    pub fn bytes(mut self, data: Bytes, content_type: impl Into<String>) -> Self {
        self.body = RequestBody::Bytes {
            data,
            content_type: content_type.into(),
        };
        self
    }

    /// Multipart body
    #[must_use]
    pub fn multipart(mut self, fields: Vec<MultipartField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }

    /// Report cumulative bytes sent while streaming a byte body
    #[must_use]
    pub fn on_progress(mut self, callback: ByteProgress) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Case-insensitive header lookup
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Decoded query parameter lookup
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<String> {
        let (_, query) = self.url.split_once('?')?;
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// URL without its query string, safe for logs
    #[must_use]
    pub fn url_path(&self) -> &str {
        self.url
            .split_once('?')
            .map_or(self.url.as_str(), |(path, _)| path)
    }
}

/// Response status, headers, and buffered body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Headers keyed by lowercase name
    pub headers: HashMap<String, String>,
    /// Body
    pub body: Bytes,
}

impl TransportResponse {
    /// Response with a raw body
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Response with a JSON body
    #[must_use]
    pub fn from_json(status: u16, value: &Value) -> Self {
        Self::new(status, value.to_string()).with_header("content-type", "application/json")
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Whether the status is 2xx
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Case-insensitive header lookup
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Body as (lossy) UTF-8
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body
    ///
    /// # Errors
    ///
    /// Returns `InvalidResponse` if the body is not the expected JSON
    pub fn json<T: DeserializeOwned>(&self, provider: &str) -> ProviderResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            ProviderError::invalid_response(provider, format!("malformed JSON body: {e}"))
        })
    }

    /// Turn a non-2xx response into `HttpStatus`, keeping the body verbatim
    ///
    /// # Errors
    ///
    /// Returns `HttpStatus` for any status outside 200-299
    pub fn error_for_status(self, provider: &str) -> ProviderResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ProviderError::HttpStatus {
                provider: provider.to_owned(),
                status: self.status,
                body: self.text(),
            })
        }
    }
}

/// Capability to perform one HTTP exchange
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request` and buffer the response
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns `Network` when no response was received
    async fn execute(&self, request: TransportRequest) -> ProviderResult<TransportResponse>;
}

/// Transport backed by a pooled `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Wrap an existing client
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// Use the process-wide shared client
    #[must_use]
    pub fn shared() -> Self {
        Self::new(shared_client().clone())
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::shared()
    }
}

const fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
    }
}

fn counted_stream(
    data: Bytes,
    sent: Arc<AtomicU64>,
    on_progress: Option<ByteProgress>,
) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static {
    let total = data.len();
    stream::iter((0..total).step_by(PROGRESS_SLICE_BYTES).map(move |start| {
        let end = (start + PROGRESS_SLICE_BYTES).min(total);
        let slice = data.slice(start..end);
        let len = slice.len() as u64;
        let so_far = sent.fetch_add(len, Ordering::Relaxed) + len;
        if let Some(callback) = &on_progress {
            callback(so_far);
        }
        Ok(slice)
    }))
}

fn multipart_form(provider: &str, fields: Vec<MultipartField>) -> ProviderResult<Form> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            MultipartField::Text { name, value } => form.text(name, value),
            MultipartField::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                let len = data.len() as u64;
                let part = Part::stream_with_length(Body::from(data), len)
                    .file_name(file_name)
                    .mime_str(&content_type)
                    .map_err(|e| ProviderError::Network {
                        provider: provider.to_owned(),
                        message: format!("invalid part content type {content_type}: {e}"),
                        bytes_sent: None,
                    })?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> ProviderResult<TransportResponse> {
        debug!(
            provider = request.provider,
            method = %request.method,
            url = request.url_path(),
            "Sending platform request"
        );
        let TransportRequest {
            provider,
            method,
            url,
            headers,
            bearer,
            body,
            on_progress,
        } = request;

        let sent = Arc::new(AtomicU64::new(0));
        let streamed = matches!(body, RequestBody::Bytes { .. });
        let mut builder = self.client.request(reqwest_method(method), &url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = &bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(pairs) => builder.form(&pairs),
            RequestBody::Bytes { data, content_type } => {
                let len = data.len() as u64;
                builder
                    .header(CONTENT_TYPE, content_type)
                    .header(CONTENT_LENGTH, len)
                    .body(Body::wrap_stream(counted_stream(
                        data,
                        Arc::clone(&sent),
                        on_progress,
                    )))
            }
            RequestBody::Multipart(fields) => builder.multipart(multipart_form(provider, fields)?),
        };

        let network_error = |error: &reqwest::Error| ProviderError::Network {
            provider: provider.to_owned(),
            message: error.to_string(),
            bytes_sent: streamed.then(|| sent.load(Ordering::Relaxed)),
        };

        let response = builder.send().await.map_err(|e| network_error(&e))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_owned(), value.to_owned()))
            })
            .collect();
        let body = response.bytes().await.map_err(|e| network_error(&e))?;

        debug!(provider, status, bytes = body.len(), "Platform response received");
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

/// Canned outcome for a scripted request
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this response
    Response(TransportResponse),
    /// Fail with this error
    Error(ProviderError),
    /// Accept the whole body, then drop the connection before responding
    LostResponse,
}

#[derive(Debug)]
struct Script {
    method: HttpMethod,
    fragment: String,
    reply: ScriptedReply,
    sticky: bool,
}

/// Transport that replays canned replies and records every request
///
/// Replies are matched by method and URL substring in registration order. A
/// one-shot reply is consumed by the first request it matches; a sticky reply
/// answers every matching request. Unmatched requests fail with `Network`.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    scripts: Mutex<Vec<Script>>,
    recorded: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    /// Empty script
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: HttpMethod, fragment: &str, reply: ScriptedReply, sticky: bool) -> &Self {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Script {
                method,
                fragment: fragment.to_owned(),
                reply,
                sticky,
            });
        self
    }

    /// Answer the next matching request with `response`
    pub fn respond(&self, method: HttpMethod, fragment: &str, response: TransportResponse) -> &Self {
        self.push(method, fragment, ScriptedReply::Response(response), false)
    }

    /// Answer the next matching request with a JSON body
    pub fn respond_json(&self, method: HttpMethod, fragment: &str, status: u16, body: Value) -> &Self {
        self.respond(method, fragment, TransportResponse::from_json(status, &body))
    }

    /// Answer every matching request with `response`
    pub fn respond_always(
        &self,
        method: HttpMethod,
        fragment: &str,
        response: TransportResponse,
    ) -> &Self {
        self.push(method, fragment, ScriptedReply::Response(response), true)
    }

    /// Fail the next matching request with `error`
    pub fn fail(&self, method: HttpMethod, fragment: &str, error: ProviderError) -> &Self {
        self.push(method, fragment, ScriptedReply::Error(error), false)
    }

    /// Accept the next matching request's body, then lose the response
    pub fn lose_response(&self, method: HttpMethod, fragment: &str) -> &Self {
        self.push(method, fragment, ScriptedReply::LostResponse, false)
    }

    /// Every request seen so far, in order
    #[must_use]
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests matching a method and URL substring, in order
    #[must_use]
    pub fn requests_to(&self, method: HttpMethod, fragment: &str) -> Vec<TransportRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && request.url.contains(fragment))
            .collect()
    }

    fn next_reply(&self, method: HttpMethod, url: &str) -> Option<ScriptedReply> {
        let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        let index = scripts
            .iter()
            .position(|script| script.method == method && url.contains(&script.fragment))?;
        if scripts[index].sticky {
            Some(scripts[index].reply.clone())
        } else {
            Some(scripts.remove(index).reply)
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: TransportRequest) -> ProviderResult<TransportResponse> {
        let reply = self.next_reply(request.method, &request.url);
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let body_len = request.body.byte_len();
        let report_full_body = || {
            if let (Some(len), Some(callback)) = (body_len, &request.on_progress) {
                callback(len);
            }
        };

        match reply {
            Some(ScriptedReply::Response(response)) => {
                report_full_body();
                Ok(response)
            }
            Some(ScriptedReply::Error(error)) => Err(error),
            Some(ScriptedReply::LostResponse) => {
                report_full_body();
                Err(ProviderError::Network {
                    provider: request.provider.to_owned(),
                    message: "connection closed before a response was read".to_owned(),
                    bytes_sent: body_len,
                })
            }
            None => Err(ProviderError::Network {
                provider: request.provider.to_owned(),
                message: format!("no scripted reply for {} {}", request.method, request.url),
                bytes_sent: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_pairs_are_encoded_and_appended() {
        let request = TransportRequest::get("youtube", "https://example.test/v3/channels")
            .query([("part", "snippet"), ("mine", "true")])
            .query([("q", "a b&c")]);
        assert_eq!(
            request.url,
            "https://example.test/v3/channels?part=snippet&mine=true&q=a+b%26c"
        );
        assert_eq!(request.query_value("q").as_deref(), Some("a b&c"));
        assert_eq!(request.url_path(), "https://example.test/v3/channels");
    }

    #[test]
    fn non_success_status_keeps_body() {
        let response = TransportResponse::new(403, r#"{"error":"forbidden"}"#);
        let Err(ProviderError::HttpStatus { status, body, .. }) = response.error_for_status("tiktok")
        else {
            panic!("expected HttpStatus");
        };
        assert_eq!(status, 403);
        assert_eq!(body, r#"{"error":"forbidden"}"#);
    }

    #[test]
    fn debug_output_redacts_bearer() {
        let request = TransportRequest::get("facebook", "https://example.test").bearer("secret");
        let rendered = format!("{request:?}");
        assert!(!rendered.contains("secret"));
    }

    #[tokio::test]
    async fn scripted_one_shot_then_sticky() {
        let transport = ScriptedTransport::new();
        transport
            .respond_json(HttpMethod::Post, "/status", 200, json!({"n": 1}))
            .respond_always(
                HttpMethod::Post,
                "/status",
                TransportResponse::from_json(200, &json!({"n": 2})),
            );

        let mut seen = Vec::new();
        for _ in 0..3 {
            let response = transport
                .execute(TransportRequest::post("tiktok", "https://x.test/status"))
                .await
                .unwrap();
            let body: Value = response.json("tiktok").unwrap();
            seen.push(body["n"].as_i64().unwrap());
        }
        assert_eq!(seen, vec![1, 2, 2]);
        assert_eq!(transport.requests_to(HttpMethod::Post, "/status").len(), 3);
    }

    #[tokio::test]
    async fn lost_response_reports_full_body() {
        let transport = ScriptedTransport::new();
        transport.lose_response(HttpMethod::Put, "/upload");
        let err = transport
            .execute(
                TransportRequest::put("youtube", "https://x.test/upload")
                    .bytes(Bytes::from_static(b"0123456789"), "video/mp4"),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Network {
                bytes_sent: Some(10),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unmatched_request_is_a_network_error() {
        let transport = ScriptedTransport::new();
        let err = transport
            .execute(TransportRequest::get("tiktok", "https://x.test/none"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Network { bytes_sent: None, .. }));
    }
}
