//! Request builder and response parser for the marketplace backend.
//!
//! # Design
//! `ApiClient` holds the base origin and a handle to the [`Session`]. It
//! builds `HttpRequest` values and never touches the network; parsing is a
//! set of free functions over `HttpResponse`. The bearer credential is read
//! from the session on every build, so a login between two calls takes
//! effect on the second one.

use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::form_urlencoded;
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::session::Session;
use crate::types::ImageUpload;

/// Normalized body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<Session>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn get(&self, path: &str) -> HttpRequest {
        self.request(HttpMethod::Get, path, Vec::new(), None)
    }

    pub fn delete(&self, path: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, path, Vec::new(), None)
    }

    pub fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, path, body)
    }

    pub fn put_json<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, path, body)
    }

    /// `multipart/form-data` POST with every file under the same field name.
    pub fn post_multipart(&self, path: &str, field: &str, files: &[ImageUpload]) -> HttpRequest {
        let boundary = format!("evmarket-{}", Uuid::new_v4().simple());
        let mut body = Vec::new();
        for file in files {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{field}\"; filename=\"{}\"\r\n",
                    header_value(&file.file_name).replace('"', "")
                )
                .as_bytes(),
            );
            body.extend_from_slice(
                format!("Content-Type: {}\r\n\r\n", header_value(&file.content_type)).as_bytes(),
            );
            body.extend_from_slice(&file.bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        let headers = vec![(
            "content-type".to_string(),
            format!("multipart/form-data; boundary={boundary}"),
        )];
        self.request(HttpMethod::Post, path, headers, Some(body))
    }

    fn json_request<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_vec(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let headers = vec![("content-type".to_string(), "application/json".to_string())];
        Ok(self.request(method, path, headers, Some(body)))
    }

    fn request(
        &self,
        method: HttpMethod,
        path: &str,
        mut headers: Vec<(String, String)>,
        body: Option<Vec<u8>>,
    ) -> HttpRequest {
        if let Some(token) = self.session.token() {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers,
            body,
        }
    }
}

/// Control characters (CR/LF included) removed, so a value cannot end its
/// part header early.
fn header_value(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_control()).collect()
}

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encodes one path segment, so ids can never add segments or start
/// a query.
pub fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT).to_string()
}

/// Appends `pairs` to `path` as an `application/x-www-form-urlencoded` query.
pub fn with_query<'a>(path: &str, pairs: impl IntoIterator<Item = (&'a str, String)>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in pairs {
        query.append_pair(key, &value);
        any = true;
    }
    if any {
        format!("{path}?{}", query.finish())
    } else {
        path.to_string()
    }
}

/// Deserialize a successful JSON response into `T`.
pub fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// JSON when the response says so, text otherwise.
pub fn parse_body(response: HttpResponse) -> Result<ResponseBody, ApiError> {
    check_status(&response)?;
    if response.is_json() {
        let value = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Deserialization(e.to_string()))?;
        Ok(ResponseBody::Json(value))
    } else {
        Ok(ResponseBody::Text(response.body))
    }
}

/// Succeeds on any 2xx, ignoring the body.
pub fn parse_empty(response: HttpResponse) -> Result<(), ApiError> {
    check_status(&response)
}

fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}
