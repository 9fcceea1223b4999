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

//! Field decoders for the loosely typed parts of the API:
//! numbers that sometimes arrive as strings, flags that arrive as 0/1,
//! lists that arrive as `null`.

use serde::de::{Deserializer, Error};
use serde::Deserialize;
use serde_json::Value;

/// `null` and missing decode to `T::default()`
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Integer from a JSON number or a numeric string such as `"1,234,000"`
pub(crate) fn opt_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None => Ok(None),
        Some(value) => integer_from_value(&value).map_err(D::Error::custom),
    }
}

/// Like [`opt_integer`], but a value that is not an integer decodes to `None`
pub(crate) fn lossy_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(integer_from_value(&value).unwrap_or_else(|e| {
        tracing::debug!("[lossy_integer] ignoring {}", e);
        None
    }))
}

fn integer_from_value(value: &Value) -> Result<Option<i64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .map(Some)
            .ok_or_else(|| format!("not an integer: {n}")),
        Value::String(s) => {
            let digits: String = s.trim().chars().filter(|c| *c != ',').collect();
            if digits.is_empty() {
                return Ok(None);
            }
            digits
                .parse()
                .map(Some)
                .map_err(|_| format!("not an integer: {s:?}"))
        }
        other => Err(format!("expected integer, got {other}")),
    }
}

/// Truthiness of a JSON flag. `null` and missing decode to `None`.
pub(crate) fn opt_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => Some(n.as_f64().is_some_and(|f| f != 0.0)),
        Some(Value::String(s)) => Some(!matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "0" | "false" | "n" | "no"
        )),
        Some(Value::Array(a)) => Some(!a.is_empty()),
        Some(Value::Object(o)) => Some(!o.is_empty()),
    })
}
