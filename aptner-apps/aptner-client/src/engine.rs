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

//! # Resilient request engine
//!
//! Wraps a [`Transport`] and the [`Session`] with a bounded retry loop:
//!
//! 1. every attempt attaches the current token, except calls to the auth path;
//! 2. a 401 on the first attempt refreshes the token and retries at once,
//!    a 401 on later attempts just consumes the attempt;
//! 3. any other failure backs off (`base * 2^attempt`) unless it was the last attempt,
//!    in which case it is returned;
//! 4. when the loop runs out on 401s, one more refresh and one final raw
//!    request are made, and that outcome is returned as-is.
//!
//! A failed refresh is logged and never aborts the loop.

use crate::config::Credentials;
use crate::error::Result;
use crate::session::{AUTH_PATH, Session};
use crate::transport::{ApiRequest, Method, Transport};
use aptner_backoff::Backoff;
use serde_json::Value;

pub struct RequestEngine<T> {
    transport: T,
    session: Session,
    backoff: Backoff,
}

impl<T: Transport> RequestEngine<T> {
    pub fn new(transport: T, credentials: Credentials, backoff: Backoff) -> Self {
        Self {
            transport,
            session: Session::new(credentials),
            backoff,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn authenticate(&self) -> Result<()> {
        self.session.authenticate(&self.transport).await
    }

    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>> {
        let is_auth_path = path == AUTH_PATH;
        let request = ApiRequest {
            method,
            path: path.to_string(),
            body,
            attach_token: !is_auth_path,
        };
        let max_attempts = self.backoff.max_attempts();

        for attempt in self.backoff.attempts() {
            let err = match self.raw(&request).await {
                Ok(payload) => return Ok(payload),
                Err(err) => err,
            };

            if err.is_unauthorized() && !is_auth_path {
                if attempt == 0 {
                    tracing::warn!("[execute] {} {} got 401, refreshing token", method, path);
                    self.refresh_token("retry").await;
                } else {
                    tracing::warn!(
                        "[execute] {} {} still 401 after re-authentication (attempt {}/{})",
                        method,
                        path,
                        attempt + 1,
                        max_attempts
                    );
                }
                continue;
            }

            if self.backoff.is_last(attempt) {
                tracing::error!(
                    "[execute] {} {} failed after {} attempts: {}",
                    method,
                    path,
                    max_attempts,
                    err
                );
                return Err(err);
            }

            tracing::warn!(
                "[execute] {} {} failed (attempt {}/{}): {}. Retrying in {:?}...",
                method,
                path,
                attempt + 1,
                max_attempts,
                err,
                self.backoff.delay_for(attempt)
            );
            self.backoff.wait(attempt).await;
        }

        if !is_auth_path {
            self.refresh_token("final").await;
        }
        self.raw(&request).await
    }

    async fn raw(&self, request: &ApiRequest) -> Result<Option<Value>> {
        let token = if request.attach_token {
            self.session.token().await
        } else {
            None
        };
        self.transport.send(request, token.as_deref()).await
    }

    async fn refresh_token(&self, stage: &str) {
        if let Err(e) = self.authenticate().await {
            tracing::warn!("[execute] {} re-authentication failed: {}", stage, e);
        }
    }
}
