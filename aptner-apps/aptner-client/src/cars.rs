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

//! # Vehicle access history
//!
//! Side-effect free reduction of the monthly access history into per-vehicle
//! records, plus the client operations that fetch it.
//!
//! Two reductions coexist on purpose:
//! - [`first_seen_records`] keeps the first record of each vehicle in list order;
//! - [`latest_records`] keeps the record with the greatest timestamp.

use crate::client::AptnerClient;
use crate::error::{AptnerError, Result};
use crate::lenient::{null_as_default, opt_flag};
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const ACCESS_HISTORY_PATH: &str = "/pc/monthly-access-history";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarStatus {
    In,
    Out,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarRecord {
    pub car_no: String,
    pub status: CarStatus,
    pub is_exit: bool,
    pub in_datetime: Option<String>,
    pub out_datetime: Option<String>,
}

impl CarRecord {
    pub fn not_found(car_no: &str) -> Self {
        Self {
            car_no: car_no.to_string(),
            status: CarStatus::NotFound,
            is_exit: true,
            in_datetime: None,
            out_datetime: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessHistory {
    #[serde(default, deserialize_with = "null_as_default")]
    monthly_parking_history_list: Vec<MonthlyParking>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MonthlyParking {
    #[serde(default, deserialize_with = "null_as_default")]
    visit_car_use_history_report_list: Vec<VisitReport>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisitReport {
    #[serde(default)]
    car_no: Option<String>,
    #[serde(default, deserialize_with = "opt_flag")]
    is_exit: Option<bool>,
    #[serde(default)]
    in_datetime: Option<String>,
    #[serde(default)]
    out_datetime: Option<String>,
}

impl VisitReport {
    fn plate(&self) -> Option<&str> {
        self.car_no.as_deref().filter(|c| !c.is_empty())
    }

    /// Entry time if present, else exit time
    fn timestamp(&self) -> Option<&str> {
        let non_empty = |s: &Option<String>| s.as_deref().filter(|t| !t.is_empty());
        non_empty(&self.in_datetime).or_else(|| non_empty(&self.out_datetime))
    }

    fn status(&self) -> CarStatus {
        if self.is_exit.unwrap_or(false) {
            CarStatus::Out
        } else {
            CarStatus::In
        }
    }

    fn to_record(&self, car_no: &str, is_exit_default: bool) -> CarRecord {
        CarRecord {
            car_no: car_no.to_string(),
            status: self.status(),
            is_exit: self.is_exit.unwrap_or(is_exit_default),
            in_datetime: self.in_datetime.clone(),
            out_datetime: self.out_datetime.clone(),
        }
    }
}

impl AccessHistory {
    pub fn from_json(payload: &Value) -> Result<Self> {
        AccessHistory::deserialize(payload).map_err(|e| AptnerError::parse("access history", e))
    }

    fn months(&self) -> impl Iterator<Item = &[VisitReport]> {
        self.monthly_parking_history_list
            .iter()
            .map(|m| m.visit_car_use_history_report_list.as_slice())
    }

    pub fn report_count(&self) -> usize {
        self.months().map(|reports| reports.len()).sum()
    }
}

/// First record per vehicle in list order; later records never overwrite it.
///
/// With a plate filter, a month's report scan stops at the first exact match
/// but the remaining months are still walked.
pub fn first_seen_records(
    history: &AccessHistory,
    plate: Option<&str>,
) -> BTreeMap<String, CarRecord> {
    let mut records = BTreeMap::new();
    for reports in history.months() {
        for report in reports {
            if plate.is_some_and(|p| report.car_no.as_deref() != Some(p)) {
                continue;
            }
            let Some(car_no) = report.plate() else {
                continue;
            };
            records
                .entry(car_no.to_string())
                .or_insert_with(|| report.to_record(car_no, false));
            if plate.is_some() {
                break;
            }
        }
    }
    records
}

/// Latest record per vehicle by timestamp (`inDatetime`, else `outDatetime`).
/// Records with neither are ignored. A requested plate that never appears
/// gets a `not_found` record.
pub fn latest_records(
    history: &AccessHistory,
    plate: Option<&str>,
) -> BTreeMap<String, CarRecord> {
    let mut latest: BTreeMap<&str, &VisitReport> = BTreeMap::new();
    for report in history.months().flatten() {
        let Some(car_no) = report.plate() else {
            continue;
        };
        if plate.is_some_and(|p| p != car_no) {
            continue;
        }
        let Some(time) = report.timestamp() else {
            continue;
        };
        let newer = latest
            .get(car_no)
            .and_then(|existing| existing.timestamp())
            .map_or(true, |existing_time| time > existing_time);
        if newer {
            latest.insert(car_no, report);
        }
    }

    let mut records: BTreeMap<String, CarRecord> = latest
        .into_iter()
        .map(|(car_no, report)| (car_no.to_string(), report.to_record(car_no, true)))
        .collect();
    if let Some(plate) = plate {
        records
            .entry(plate.to_string())
            .or_insert_with(|| CarRecord::not_found(plate));
    }
    records
}

/// Latest record for each plate of a tracked list, in list order
pub fn tracked_records(history: &AccessHistory, plates: &[String]) -> Vec<CarRecord> {
    let latest = latest_records(history, None);
    plates
        .iter()
        .filter(|p| !p.is_empty())
        .map(|plate| {
            latest
                .get(plate)
                .cloned()
                .unwrap_or_else(|| CarRecord::not_found(plate))
        })
        .collect()
}

impl<T: Transport> AptnerClient<T> {
    async fn access_history(&self) -> Result<AccessHistory> {
        let payload = self.fetch_json(ACCESS_HISTORY_PATH).await?;
        let history = AccessHistory::from_json(&payload)?;
        tracing::debug!("[access_history] {} reports", history.report_count());
        Ok(history)
    }

    /// Entry/exit records keyed by plate, first record wins
    pub async fn find_car(&self, plate: Option<&str>) -> Result<BTreeMap<String, CarRecord>> {
        let history = self.access_history().await?;
        Ok(first_seen_records(&history, plate))
    }

    /// Current state keyed by plate, latest record wins
    pub async fn get_car_status(&self, plate: Option<&str>) -> Result<BTreeMap<String, CarRecord>> {
        let history = self.access_history().await?;
        Ok(latest_records(&history, plate))
    }

    /// One history fetch for a whole tracked-car list
    pub async fn get_tracked_car_status(&self, plates: &[String]) -> Result<Vec<CarRecord>> {
        if plates.is_empty() {
            return Ok(Vec::new());
        }
        let history = self.access_history().await?;
        Ok(tracked_records(&history, plates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_transport::MockTransport;
    use serde_json::json;

    const PLATE: &str = "12가3456";

    fn history() -> AccessHistory {
        AccessHistory::from_json(&json!({
            "monthlyParkingHistoryList": [
                {
                    "visitCarUseHistoryReportList": [
                        {"carNo": PLATE, "isExit": true,
                         "inDatetime": "2024.06.01 09:00", "outDatetime": "2024.06.01 18:00"},
                        {"carNo": "34나5678", "isExit": false, "inDatetime": "2024.06.02 08:00"},
                        {"carNo": PLATE, "isExit": false, "inDatetime": "2024.06.03 07:30"},
                        {"carNo": "", "isExit": false, "inDatetime": "2024.06.03 07:31"},
                        {"isExit": true}
                    ]
                },
                {
                    "visitCarUseHistoryReportList": [
                        {"carNo": "34나5678", "isExit": true,
                         "inDatetime": "2024.05.20 10:00", "outDatetime": "2024.05.20 11:00"},
                        {"carNo": "56다7890", "outDatetime": "2024.05.19 23:00"},
                        {"carNo": "78라9012"}
                    ]
                },
                {"visitCarUseHistoryReportList": null}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn first_seen_keeps_list_order_winner() {
        let records = first_seen_records(&history(), None);
        assert_eq!(records.len(), 4);
        let car = &records[PLATE];
        assert_eq!(car.status, CarStatus::Out);
        assert_eq!(car.in_datetime.as_deref(), Some("2024.06.01 09:00"));
        assert_eq!(records["34나5678"].status, CarStatus::In);
        assert_eq!(records["78라9012"].status, CarStatus::In);
        assert!(records["78라9012"].in_datetime.is_none());
    }

    #[test]
    fn first_seen_with_plate_returns_only_that_plate() {
        let records = first_seen_records(&history(), Some("34나5678"));
        assert_eq!(records.len(), 1);
        assert_eq!(records["34나5678"].in_datetime.as_deref(), Some("2024.06.02 08:00"));
        assert!(first_seen_records(&history(), Some("00허0000")).is_empty());
    }

    #[test]
    fn latest_keeps_greatest_timestamp() {
        let records = latest_records(&history(), None);
        let car = &records[PLATE];
        assert_eq!(car.status, CarStatus::In);
        assert!(!car.is_exit);
        assert_eq!(car.in_datetime.as_deref(), Some("2024.06.03 07:30"));
        assert_eq!(records["34나5678"].in_datetime.as_deref(), Some("2024.06.02 08:00"));
        // exit-only timestamp still competes
        assert_eq!(records["56다7890"].out_datetime.as_deref(), Some("2024.05.19 23:00"));
        // no timestamp at all: ignored
        assert!(!records.contains_key("78라9012"));
    }

    #[test]
    fn reductions_diverge_on_repeated_vehicle() {
        let first = first_seen_records(&history(), Some(PLATE));
        let latest = latest_records(&history(), Some(PLATE));
        assert_eq!(first[PLATE].status, CarStatus::Out);
        assert_eq!(latest[PLATE].status, CarStatus::In);
        assert_ne!(first[PLATE].in_datetime, latest[PLATE].in_datetime);
    }

    #[test]
    fn unknown_plate_gets_not_found_record() {
        let records = latest_records(&history(), Some("00허0000"));
        assert_eq!(records.len(), 1);
        let missing = &records["00허0000"];
        assert_eq!(missing.status, CarStatus::NotFound);
        assert!(missing.is_exit);
        assert!(missing.in_datetime.is_none() && missing.out_datetime.is_none());

        let out = serde_json::to_value(missing).unwrap();
        assert_eq!(out["status"], json!("not_found"));
        assert_eq!(out["inDatetime"], Value::Null);
    }

    #[test]
    fn missing_exit_flag_defaults_differ_between_status_and_flag() {
        let history = AccessHistory::from_json(&json!({
            "monthlyParkingHistoryList": [
                {"visitCarUseHistoryReportList": [
                    {"carNo": PLATE, "inDatetime": "2024.06.01 09:00"}
                ]}
            ]
        }))
        .unwrap();
        let record = &latest_records(&history, None)[PLATE];
        assert_eq!(record.status, CarStatus::In);
        assert!(record.is_exit);
    }

    #[test]
    fn tracked_list_keeps_order_and_fills_gaps() {
        let plates = vec!["00허0000".to_string(), PLATE.to_string(), String::new()];
        let records = tracked_records(&history(), &plates);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, CarStatus::NotFound);
        assert_eq!(records[1].car_no, PLATE);
        assert_eq!(records[1].status, CarStatus::In);
    }

    #[test]
    fn shape_errors_are_parse_errors() {
        let err =
            AccessHistory::from_json(&json!({"monthlyParkingHistoryList": "nope"})).unwrap_err();
        assert!(matches!(err, AptnerError::Parse(_)));
        let empty = AccessHistory::from_json(&json!({})).unwrap();
        assert_eq!(empty.report_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn tracked_status_fetches_history_once() {
        let transport = MockTransport::new();
        transport.script(ACCESS_HISTORY_PATH, [Ok(Some(json!({"monthlyParkingHistoryList": []})))]);
        let client = AptnerClient::for_tests(transport);

        let plates = vec![PLATE.to_string(), "34나5678".to_string()];
        let records = client.get_tracked_car_status(&plates).await.unwrap();
        assert!(records.iter().all(|r| r.status == CarStatus::NotFound));
        assert_eq!(client.engine().transport().calls_to(ACCESS_HISTORY_PATH), 1);

        assert!(client.get_tracked_car_status(&[]).await.unwrap().is_empty());
        assert_eq!(client.engine().transport().calls_to(ACCESS_HISTORY_PATH), 1);
    }
}
