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

//! # Error taxonomy
//!
//! Every failure the client can surface. Cloneable so one authentication
//! outcome can be handed to every caller that waited on it.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AptnerError {
    /// Credentials rejected, or the token field was missing/empty
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The server answered with a status >= 400
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// No response was received (connect, DNS, timeout, body read)
    #[error("transport error: {message}")]
    Transport { message: String, timed_out: bool },

    /// The response JSON did not have the expected shape
    #[error("unexpected response: {0}")]
    Parse(String),

    /// Caller input rejected before any I/O
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl AptnerError {
    pub fn status(&self) -> Option<u16> {
        match self {
            AptnerError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub(crate) fn parse(context: &str, err: impl std::fmt::Display) -> Self {
        AptnerError::Parse(format!("{context}: {err}"))
    }
}

pub type Result<T, E = AptnerError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_http_errors_carry_a_status() {
        let http = AptnerError::Http {
            status: 401,
            body: "expired".into(),
        };
        assert_eq!(http.status(), Some(401));
        assert!(http.is_unauthorized());

        let transport = AptnerError::Transport {
            message: "connection refused".into(),
            timed_out: false,
        };
        assert_eq!(transport.status(), None);
        assert!(!transport.is_unauthorized());
        assert!(!AptnerError::Auth("no token".into()).is_unauthorized());
    }

    #[test]
    fn display_keeps_status_and_body() {
        let err = AptnerError::Http {
            status: 503,
            body: "maintenance".into(),
        };
        assert_eq!(err.to_string(), "HTTP error 503: maintenance");
    }
}
