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

//! # Visitor-parking reservations
//!
//! Listing walks every page of the reservations endpoint, keeps today's and
//! future entries and compresses them into ranges. Creation posts one request.

use crate::client::AptnerClient;
use crate::error::{AptnerError, Result};
use crate::lenient::{null_as_default, opt_integer};
use crate::ranges::{ReservationEntry, ReservationRange, compress_ranges};
use crate::transport::{Method, Transport};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

pub const RESERVES_PATH: &str = "/pc/reserves";
pub const RESERVE_PATH: &str = "/pc/reserve/";

/// Page cap used when the server never reports `totalPages`
pub const MAX_PAGES_WITHOUT_TOTAL: u32 = 20;

pub const VISIT_DATE_FORMAT: &str = "%Y.%m.%d";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservePage {
    #[serde(default, deserialize_with = "opt_integer")]
    total_pages: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    reserve_list: Vec<ReserveItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReserveItem {
    #[serde(default)]
    visit_date: Option<Value>,
    #[serde(default)]
    car_no: Option<String>,
}

impl ReservePage {
    pub fn from_json(payload: &Value) -> Result<Self> {
        ReservePage::deserialize(payload).map_err(|e| AptnerError::parse("reserve list", e))
    }

    /// Reported page count, 0 when absent or nonsensical
    pub fn total_pages(&self) -> u32 {
        self.total_pages
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0)
    }

    /// Entries dated `today` or later. Unparsable dates and blank plates are skipped.
    pub fn upcoming_entries(
        &self,
        today: NaiveDate,
    ) -> impl Iterator<Item = ReservationEntry> + '_ {
        self.reserve_list.iter().filter_map(move |item| {
            let raw = item.visit_date.as_ref()?.as_str()?;
            let visit_date = match NaiveDate::parse_from_str(raw.trim(), VISIT_DATE_FORMAT) {
                Ok(date) => date,
                Err(_) => {
                    tracing::debug!("[reserve_status] skipping unparsable visit date {:?}", raw);
                    return None;
                }
            };
            if visit_date < today {
                return None;
            }
            let car_no = item.car_no.as_deref().filter(|c| !c.is_empty())?;
            Some(ReservationEntry {
                car_no: car_no.to_string(),
                visit_date,
            })
        })
    }
}

/// Whether pagination stops after `page` (1-based)
pub(crate) fn is_last_page(page: u32, total_pages: u32) -> bool {
    if total_pages > 0 {
        page >= total_pages
    } else {
        page >= MAX_PAGES_WITHOUT_TOTAL
    }
}

/// Parse a visit date typed by a person: `YYYY.MM.DD`, `YYYY-MM-DD` or `YYYY/MM/DD`
pub fn parse_visit_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    [VISIT_DATE_FORMAT, "%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .ok_or_else(|| {
            AptnerError::InvalidRequest(format!(
                "invalid date {s:?}, use YYYY.MM.DD or YYYY-MM-DD"
            ))
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRequest {
    pub visit_date: NaiveDate,
    pub purpose: String,
    pub car_no: String,
    pub days: u32,
    pub phone: String,
}

impl ReservationRequest {
    pub fn validate(&self) -> Result<()> {
        let blank = |s: &str| s.trim().is_empty();
        if blank(&self.car_no) {
            return Err(AptnerError::InvalidRequest("car number is required".into()));
        }
        if blank(&self.purpose) {
            return Err(AptnerError::InvalidRequest("purpose is required".into()));
        }
        if blank(&self.phone) {
            return Err(AptnerError::InvalidRequest("phone is required".into()));
        }
        if self.days == 0 {
            return Err(AptnerError::InvalidRequest("days must be at least 1".into()));
        }
        Ok(())
    }

    pub fn to_payload(&self) -> Value {
        json!({
            "visitDate": self.visit_date.format(VISIT_DATE_FORMAT).to_string(),
            "purpose": self.purpose.trim(),
            "carNo": self.car_no.trim(),
            "days": self.days,
            "phone": self.phone.trim(),
        })
    }
}

impl<T: Transport> AptnerClient<T> {
    /// Upcoming reservations as merged ranges per vehicle, relative to the local date
    pub async fn get_reserve_status(&self) -> Result<BTreeMap<String, Vec<ReservationRange>>> {
        self.reserve_status_as_of(chrono::Local::now().date_naive()).await
    }

    pub async fn reserve_status_as_of(
        &self,
        today: NaiveDate,
    ) -> Result<BTreeMap<String, Vec<ReservationRange>>> {
        let mut total_pages = 0;
        let mut page = 0;
        let mut entries = Vec::new();

        loop {
            page += 1;
            let payload = self
                .fetch_json(&format!("{RESERVES_PATH}?pg={page}"))
                .await?;
            let reserved = ReservePage::from_json(&payload)?;
            if total_pages == 0 {
                total_pages = reserved.total_pages();
            }
            entries.extend(reserved.upcoming_entries(today));

            if is_last_page(page, total_pages) {
                break;
            }
        }

        tracing::debug!(
            "[reserve_status] {} upcoming entries over {} page(s)",
            entries.len(),
            page
        );
        Ok(compress_ranges(entries))
    }

    /// Book a visitor-parking slot. Success carries no payload.
    pub async fn reserve_car(&self, request: &ReservationRequest) -> Result<()> {
        request.validate()?;
        self.engine()
            .execute(Method::Post, RESERVE_PATH, Some(request.to_payload()))
            .await?;
        tracing::info!(
            "[reserve_car] reserved {} from {} for {} day(s)",
            request.car_no,
            request.visit_date,
            request.days
        );
        Ok(())
    }
}
