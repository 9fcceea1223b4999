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

//! # Reservation range compression
//!
//! Side-effect free merge of per-day visitor reservations into inclusive
//! date ranges per vehicle. Consecutive days join one range; any gap of two
//! days or more starts a new one.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationEntry {
    pub car_no: String,
    pub visit_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRange {
    pub car_no: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl ReservationRange {
    fn single(car_no: &str, date: NaiveDate) -> Self {
        Self {
            car_no: car_no.to_string(),
            from: date,
            to: date,
        }
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.from.iter_days().take_while(|d| *d <= self.to)
    }
}

/// Group entries by vehicle and merge each vehicle's dates into sorted,
/// non-overlapping, maximally merged ranges.
pub fn compress_ranges<I>(entries: I) -> BTreeMap<String, Vec<ReservationRange>>
where
    I: IntoIterator<Item = ReservationEntry>,
{
    let mut by_car: BTreeMap<String, Vec<NaiveDate>> = BTreeMap::new();
    for entry in entries {
        by_car.entry(entry.car_no).or_default().push(entry.visit_date);
    }

    by_car
        .into_iter()
        .map(|(car_no, mut dates)| {
            dates.sort_unstable();
            let ranges = merge_sorted(&car_no, &dates);
            (car_no, ranges)
        })
        .collect()
}

fn merge_sorted(car_no: &str, dates: &[NaiveDate]) -> Vec<ReservationRange> {
    let Some((&first, rest)) = dates.split_first() else {
        return Vec::new();
    };

    let mut ranges = Vec::new();
    let mut current = ReservationRange::single(car_no, first);
    for &date in rest {
        if (date - current.to).num_days() > 1 {
            let closed = std::mem::replace(&mut current, ReservationRange::single(car_no, date));
            ranges.push(closed);
        } else {
            current.to = date;
        }
    }
    ranges.push(current);
    ranges
}
