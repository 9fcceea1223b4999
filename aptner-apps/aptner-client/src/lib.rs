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

// Library for aptner-client
// Resilient client for the Aptner apartment-management API

mod cars;
mod client;
pub mod config;
mod engine;
pub mod error;
mod fee;
mod lenient;
#[cfg(test)]
mod mock_transport;
mod ranges;
mod reservations;
mod session;
pub mod transport;

pub use client::AptnerClient;
pub use config::{ClientConfig, ClientConfigBuilder, Credentials, DEFAULT_BASE_URL, parse_car_list};
pub use engine::RequestEngine;
pub use error::AptnerError;
pub use session::{AUTH_PATH, Session};
pub use transport::{ApiRequest, HttpTransport, Method, Transport};

// Re-export domain operations and their results
pub use cars::{
    ACCESS_HISTORY_PATH, AccessHistory, CarRecord, CarStatus, first_seen_records, latest_records,
    tracked_records,
};
pub use fee::{FEE_PATH, FeeStatement};
pub use ranges::{ReservationEntry, ReservationRange, compress_ranges};
pub use reservations::{
    MAX_PAGES_WITHOUT_TOTAL, RESERVE_PATH, RESERVES_PATH, ReservationRequest, ReservePage,
    parse_visit_date,
};

pub use aptner_backoff::Backoff;
