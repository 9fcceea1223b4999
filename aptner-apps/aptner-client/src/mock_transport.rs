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

//! Scripted in-memory transport for unit tests.

use crate::error::{AptnerError, Result};
use crate::session::AUTH_PATH;
use crate::transport::{ApiRequest, Method, Transport};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) type Reply = Result<Option<Value>>;

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub attach_token: bool,
    /// Token actually put on the wire
    pub bearer: Option<String>,
}

/// Replies are queued per path. The last queued reply is sticky once the
/// queue is down to one entry. Unscripted auth calls hand out `token-N`,
/// any other unscripted path answers 404.
#[derive(Default)]
pub(crate) struct MockTransport {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<RecordedCall>>,
    issued_tokens: AtomicUsize,
    latency: Duration,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn script(&self, path: &str, replies: impl IntoIterator<Item = Reply>) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .extend(replies);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls().iter().filter(|c| c.path == path).count()
    }

    fn next_reply(&self, path: &str) -> Reply {
        let mut scripts = self.scripts.lock().unwrap();
        if let Some(queue) = scripts.get_mut(path) {
            if queue.len() > 1 {
                return queue.pop_front().unwrap();
            }
            if let Some(last) = queue.front() {
                return last.clone();
            }
        }
        if path == AUTH_PATH {
            let n = self.issued_tokens.fetch_add(1, Ordering::SeqCst) + 1;
            return Ok(Some(json!({ "accessToken": format!("token-{n}") })));
        }
        Err(AptnerError::Http {
            status: 404,
            body: format!("no mock route for {path}"),
        })
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<Option<Value>> {
        let bearer = bearer.filter(|_| request.attach_token).map(str::to_string);
        self.calls.lock().unwrap().push(RecordedCall {
            method: request.method,
            path: request.path.clone(),
            body: request.body.clone(),
            attach_token: request.attach_token,
            bearer,
        });
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.next_reply(&request.path)
    }
}

pub(crate) fn unauthorized() -> Reply {
    Err(AptnerError::Http {
        status: 401,
        body: "token expired".to_string(),
    })
}

pub(crate) fn server_error() -> Reply {
    Err(AptnerError::Http {
        status: 500,
        body: "internal error".to_string(),
    })
}

pub(crate) fn connection_refused() -> Reply {
    Err(AptnerError::Transport {
        message: "connection refused".to_string(),
        timed_out: false,
    })
}
