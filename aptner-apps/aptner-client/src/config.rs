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

//! # Client configuration
//!
//! Side-effect free configuration values: endpoint, timeouts, retry schedule,
//! account credentials and the tracked-car list.

use crate::error::{AptnerError, Result};
use aptner_backoff::Backoff;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://v2.aptner.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub backoff: Backoff,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_TIMEOUT,
            backoff: Backoff::default(),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: ClientConfig::default(),
        }
    }
}

pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.config.backoff = backoff;
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let mut config = self.config;
        let base_url = config.base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AptnerError::InvalidRequest(format!(
                "base URL must be absolute http(s): {:?}",
                config.base_url
            )));
        }
        config.base_url = base_url.to_string();
        if config.timeout.is_zero() || config.connect_timeout.is_zero() {
            return Err(AptnerError::InvalidRequest(
                "timeouts must be non-zero".to_string(),
            ));
        }
        Ok(config)
    }
}

/// Account identifier and password, fixed for the lifetime of a client
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    id: String,
    password: String,
}

impl Credentials {
    pub fn new(id: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let id = id.into().trim().to_string();
        let password = password.into();
        if id.is_empty() || password.is_empty() {
            return Err(AptnerError::InvalidRequest(
                "id and password are required".to_string(),
            ));
        }
        Ok(Self { id, password })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id", &self.id)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Normalize a user-entered car list (comma and/or newline separated).
/// Blank entries are dropped and duplicates keep their first position.
pub fn parse_car_list(raw: &str) -> Vec<String> {
    let mut cars: Vec<String> = Vec::new();
    for car in raw.replace('\n', ",").split(',').map(str::trim) {
        if !car.is_empty() && !cars.iter().any(|c| c == car) {
            cars.push(car.to_string());
        }
    }
    cars
}
