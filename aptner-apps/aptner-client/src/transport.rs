//!  Aptner Client
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Transport
//!
//! A single HTTP call against the Aptner API: no retries, no authentication
//! policy. The [`Transport`] trait is the seam the request engine drives;
//! [`HttpTransport`] is the `wreq` implementation.

use crate::config::ClientConfig;
use crate::error::{AptnerError, Result};
use serde_json::Value;
use std::future::Future;
use std::time::Instant;

const LOG_BODY_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }

    fn to_wreq(self) -> wreq::Method {
        match self {
            Method::Get => wreq::Method::GET,
            Method::Post => wreq::Method::POST,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call attempt. `attach_token` asks the transport to send the bearer token, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub attach_token: bool,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            body: None,
            attach_token: true,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
            attach_token: true,
        }
    }

    pub fn without_token(mut self) -> Self {
        self.attach_token = false;
        self
    }
}

/// Performs exactly one HTTP exchange.
///
/// - `Ok(Some(json))` on success with a JSON body
/// - `Ok(None)` on success with an empty or non-JSON body
/// - `Err(AptnerError::Http)` for any status >= 400, with the raw body
/// - `Err(AptnerError::Transport)` when no response was received
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> impl Future<Output = Result<Option<Value>>> + Send;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: wreq::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = wreq::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| AptnerError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                timed_out: false,
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<Option<Value>> {
        let url = self.url(&request.path);
        let mut builder = self
            .client
            .request(request.method.to_wreq(), url.as_str())
            .header("Content-Type", "application/json");
        if request.attach_token {
            if let Some(token) = bearer {
                builder = builder.header("Authorization", format!("Bearer {token}"));
            }
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let http_start = Instant::now();
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        tracing::debug!(
            "[send] {} {} -> {} in {:?} ({} bytes)",
            request.method,
            request.path,
            status.as_u16(),
            http_start.elapsed(),
            body.len()
        );

        if status.as_u16() >= 400 {
            let body_preview = body.chars().take(LOG_BODY_PREVIEW_CHARS).collect::<String>();
            tracing::debug!("[send] error body: {}", body_preview);
            return Err(AptnerError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(decode_body(&body))
    }
}

fn transport_error(err: wreq::Error) -> AptnerError {
    AptnerError::Transport {
        message: err.to_string(),
        timed_out: err.is_timeout(),
    }
}

/// The API sometimes answers a success with no body at all.
pub(crate) fn decode_body(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("[send] success body is not JSON ({}), ignoring it", e);
            None
        }
    }
}
