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

//! # Fee statement
//!
//! Monthly management-fee lookup. `fee` is the only mandatory object in the
//! response; everything inside it is decoded leniently.

use crate::client::AptnerClient;
use crate::error::{AptnerError, Result};
use crate::lenient::{lossy_integer, null_as_default};
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const FEE_PATH: &str = "/fee/detail";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeStatement {
    pub year: Option<i64>,
    pub month: Option<i64>,
    /// Total amount billed for the month (`currentFee`)
    #[serde(rename = "fee")]
    pub current_fee: Option<i64>,
    /// Line items in server order, name -> value
    pub details: Map<String, Value>,
}

#[derive(Deserialize)]
struct FeeEnvelope {
    fee: WireFee,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFee {
    #[serde(default, deserialize_with = "lossy_integer")]
    year: Option<i64>,
    #[serde(default, deserialize_with = "lossy_integer")]
    month: Option<i64>,
    #[serde(default, deserialize_with = "lossy_integer")]
    current_fee: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    details: Vec<WireFeeItem>,
}

#[derive(Deserialize)]
struct WireFeeItem {
    name: String,
    value: Value,
}

impl FeeStatement {
    pub fn from_json(payload: &Value) -> Result<Self> {
        let envelope =
            FeeEnvelope::deserialize(payload).map_err(|e| AptnerError::parse("fee detail", e))?;
        let fee = envelope.fee;
        let details = fee
            .details
            .into_iter()
            .map(|item| (item.name, item.value))
            .collect();
        Ok(Self {
            year: fee.year,
            month: fee.month,
            current_fee: fee.current_fee,
            details,
        })
    }
}

impl<T: Transport> AptnerClient<T> {
    pub async fn get_fee(&self) -> Result<FeeStatement> {
        let payload = self.fetch_json(FEE_PATH).await?;
        let statement = FeeStatement::from_json(&payload)?;
        tracing::debug!(
            "[get_fee] {:?}/{:?}: {:?} ({} items)",
            statement.year,
            statement.month,
            statement.current_fee,
            statement.details.len()
        );
        Ok(statement)
    }
}
