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

//! # Aptner Client
//!
//! The operation surface consumed by adapters (CLI, schedulers, dashboards).
//! Each domain module adds its operations to [`AptnerClient`] in its own `impl` block.

use crate::config::{ClientConfig, Credentials};
use crate::engine::RequestEngine;
use crate::error::{AptnerError, Result};
use crate::transport::{HttpTransport, Method, Transport};
use aptner_backoff::Backoff;
use serde_json::Value;

pub struct AptnerClient<T = HttpTransport> {
    engine: RequestEngine<T>,
}

impl AptnerClient<HttpTransport> {
    pub fn new(credentials: Credentials, config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_transport(
            transport,
            credentials,
            config.backoff.clone(),
        ))
    }
}

impl<T: Transport> AptnerClient<T> {
    pub fn with_transport(transport: T, credentials: Credentials, backoff: Backoff) -> Self {
        Self {
            engine: RequestEngine::new(transport, credentials, backoff),
        }
    }

    pub fn engine(&self) -> &RequestEngine<T> {
        &self.engine
    }

    /// Validate the credentials and obtain the first token
    pub async fn authenticate(&self) -> Result<()> {
        self.engine.authenticate().await
    }

    /// GET a resource whose body is required
    pub(crate) async fn fetch_json(&self, path: &str) -> Result<Value> {
        self.engine
            .execute(Method::Get, path, None)
            .await?
            .ok_or_else(|| AptnerError::Parse(format!("empty response from {path}")))
    }
}

#[cfg(test)]
impl<T: Transport> AptnerClient<T> {
    pub(crate) fn for_tests(transport: T) -> Self {
        Self::with_transport(
            transport,
            Credentials::new("resident", "secret").unwrap(),
            Backoff::default(),
        )
    }
}
