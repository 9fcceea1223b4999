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

//! # Session
//!
//! Owns the account credentials and the current bearer token.
//! Authentication is single-flight: callers that arrive while an exchange is
//! running wait for it and share its outcome instead of issuing their own.

use crate::config::Credentials;
use crate::error::{AptnerError, Result};
use crate::transport::{ApiRequest, Transport};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};

pub const AUTH_PATH: &str = "/auth/token";

#[derive(Default)]
struct AuthRound {
    generation: u64,
    outcome: Option<Result<()>>,
}

pub struct Session {
    credentials: Credentials,
    token: RwLock<Option<String>>,
    round: Mutex<AuthRound>,
    completed_rounds: AtomicU64,
}

impl Session {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            token: RwLock::new(None),
            round: Mutex::new(AuthRound::default()),
            completed_rounds: AtomicU64::new(0),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Current bearer token, `None` until an authentication has succeeded
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Number of authentication exchanges that actually hit the wire
    pub fn completed_rounds(&self) -> u64 {
        self.completed_rounds.load(Ordering::Acquire)
    }

    /// Exchange the credentials for a fresh token.
    ///
    /// If another caller finishes an exchange while this one waits for the
    /// lock, that exchange's result is returned without a second call.
    pub async fn authenticate<T: Transport>(&self, transport: &T) -> Result<()> {
        let observed = self.completed_rounds.load(Ordering::Acquire);
        let mut round = self.round.lock().await;
        if round.generation != observed {
            if let Some(outcome) = round.outcome.clone() {
                tracing::debug!("[authenticate] joined exchange #{}", round.generation);
                return outcome;
            }
        }

        let outcome = self.exchange(transport).await;
        round.generation += 1;
        round.outcome = Some(outcome.clone());
        self.completed_rounds.store(round.generation, Ordering::Release);
        outcome
    }

    async fn exchange<T: Transport>(&self, transport: &T) -> Result<()> {
        let payload = json!({
            "id": self.credentials.id(),
            "password": self.credentials.password(),
        });
        let request = ApiRequest::post(AUTH_PATH, payload).without_token();
        let response = transport
            .send(&request, None)
            .await
            .map_err(|err| match err.status() {
                Some(status @ (401 | 403)) => {
                    AptnerError::Auth(format!("credentials rejected (HTTP {status})"))
                }
                _ => err,
            })?;

        let token = extract_access_token(response.as_ref())
            .ok_or_else(|| AptnerError::Auth("failed to obtain access token".to_string()))?;
        *self.token.write().await = Some(token);
        tracing::info!("[authenticate] access token refreshed");
        Ok(())
    }
}

fn extract_access_token(response: Option<&Value>) -> Option<String> {
    response?
        .get("accessToken")?
        .as_str()
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
