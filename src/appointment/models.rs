use std::fmt;
use std::str::FromStr;

use anyhow::{Error, anyhow};
use serde::{Deserialize, Deserializer, Serialize};

/// The booking fields shown in the form. Every field is a plain
/// string and an unresolved field is always `""`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentRecord {
    #[serde(deserialize_with = "null_as_empty")]
    pub area: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub customer_name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub phone: String,
    // YYYY-MM-DD
    #[serde(deserialize_with = "null_as_empty")]
    pub date: String,
    // HH:MM, 24-hour
    #[serde(deserialize_with = "null_as_empty")]
    pub start_time: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub end_time: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub address: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub notes: String,
}

// Models sometimes answer `null` instead of an empty string
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl AppointmentRecord {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Area => &self.area,
            Field::CustomerName => &self.customer_name,
            Field::Phone => &self.phone,
            Field::Date => &self.date,
            Field::StartTime => &self.start_time,
            Field::EndTime => &self.end_time,
            Field::Address => &self.address,
            Field::Notes => &self.notes,
        }
    }

    pub fn set(&mut self, field: Field, value: &str) {
        let slot = match field {
            Field::Area => &mut self.area,
            Field::CustomerName => &mut self.customer_name,
            Field::Phone => &mut self.phone,
            Field::Date => &mut self.date,
            Field::StartTime => &mut self.start_time,
            Field::EndTime => &mut self.end_time,
            Field::Address => &mut self.address,
            Field::Notes => &mut self.notes,
        };
        *slot = value.to_string();
    }

    /// A copy with surrounding whitespace removed from every field.
    pub fn trimmed(&self) -> Self {
        let mut out = Self::default();
        for field in Field::ALL {
            out.set(field, self.get(field).trim());
        }
        out
    }
}

/// One editable field of the form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Area,
    CustomerName,
    Phone,
    Date,
    StartTime,
    EndTime,
    Address,
    Notes,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Area,
        Field::CustomerName,
        Field::Phone,
        Field::Date,
        Field::StartTime,
        Field::EndTime,
        Field::Address,
        Field::Notes,
    ];

    /// The JSON key used by the record and the extraction schema
    pub fn key(&self) -> &'static str {
        match self {
            Field::Area => "area",
            Field::CustomerName => "customerName",
            Field::Phone => "phone",
            Field::Date => "date",
            Field::StartTime => "startTime",
            Field::EndTime => "endTime",
            Field::Address => "address",
            Field::Notes => "notes",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Field::Area => "Area",
            Field::CustomerName => "Customer name",
            Field::Phone => "Phone",
            Field::Date => "Date",
            Field::StartTime => "Start time",
            Field::EndTime => "End time",
            Field::Address => "Address",
            Field::Notes => "Notes",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = Error;

    /// Accepts the JSON key, snake_case, or a short alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], "");
        let field = match normalized.as_str() {
            "area" => Field::Area,
            "customername" | "name" | "customer" => Field::CustomerName,
            "phone" => Field::Phone,
            "date" => Field::Date,
            "starttime" | "start" => Field::StartTime,
            "endtime" | "end" => Field::EndTime,
            "address" => Field::Address,
            "notes" | "note" => Field::Notes,
            _ => return Err(anyhow!("Unknown field: {}", s)),
        };
        Ok(field)
    }
}
