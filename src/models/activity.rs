// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Activity record model for the local record store.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Column set of the activity table, in on-disk order.
///
/// Written as the header of every table, including an empty one.
pub const ACTIVITY_COLUMNS: [&str; 11] = [
    "id",
    "name",
    "start_date",
    "distance_km",
    "moving_time_min",
    "elevation_m",
    "type",
    "average_speed_kmh",
    "pr_count",
    "kudos",
    "energy_kj",
];

/// One exercise session, normalized to plain units.
///
/// Field order must match [`ACTIVITY_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Strava activity ID (unique key of the store)
    pub id: u64,
    /// Activity name/title
    pub name: String,
    /// Start time, local wall clock of the activity
    #[serde(rename = "start_date", with = "crate::time_utils::local_timestamp")]
    pub start_timestamp: NaiveDateTime,
    pub distance_km: f64,
    pub moving_time_min: f64,
    #[serde(rename = "elevation_m")]
    pub elevation_gain_m: f64,
    /// Bare activity label (Run, Ride, Hike, ...)
    #[serde(rename = "type", deserialize_with = "lenient::activity_type")]
    pub activity_type: String,
    pub average_speed_kmh: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub pr_count: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub kudos: u32,
    /// Energy reported by a power meter or device, if any
    #[serde(default)]
    pub energy_kj: Option<f64>,
}

impl ActivityRecord {
    /// Calendar date of the activity start.
    pub fn date(&self) -> NaiveDate {
        self.start_timestamp.date()
    }
}

/// Strip framing from an activity type label.
///
/// `"Run"`, `" Run "`, `"root='Run'"`, `"<Run>"` and `"ActivityType.Run"`
/// all normalize to `"Run"`. Returns `None` if nothing is left.
pub fn normalize_activity_type(raw: &str) -> Option<String> {
    let mut label = raw.trim();

    // Quoted payload wins over whatever surrounds it.
    for quote in ['\'', '"'] {
        if let Some(start) = label.find(quote) {
            if let Some(len) = label[start + 1..].find(quote) {
                label = &label[start + 1..start + 1 + len];
                break;
            }
        }
    }

    // `key=value` and `Enum.Variant` framing.
    if let Some(pos) = label.rfind(&['=', '.'][..]) {
        label = &label[pos + 1..];
    }

    let label = label.trim_matches(|c: char| !c.is_alphanumeric());
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

/// Cell readers for tables written by older versions of the job.
///
/// Those tables can hold the framed type label (`root='Run'`) and counts
/// written as floats (`1.0`) or left blank.
mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub fn activity_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::normalize_activity_type(&raw)
            .ok_or_else(|| D::Error::custom(format!("empty activity type: {:?}", raw)))
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(0);
        }
        if let Ok(n) = raw.parse::<u32>() {
            return Ok(n);
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_nan() => Ok(0),
            Ok(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(v as u32),
            _ => Err(D::Error::custom(format!("invalid count: {:?}", raw))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "id,name,start_date,distance_km,moving_time_min,elevation_m,type,average_speed_kmh,pr_count,kudos,energy_kj";

    fn read(rows: &str) -> Vec<Result<ActivityRecord, csv::Error>> {
        let data = format!("{}\n{}", HEADER, rows);
        csv::Reader::from_reader(data.as_bytes())
            .deserialize()
            .collect()
    }

    #[test]
    fn test_framed_type_is_normalized_on_read() {
        let rows = read("1,A,2024-01-01T07:00:00,10.0,50.0,0.0,root='Run',12.0,0,0,\n");
        assert_eq!(rows[0].as_ref().unwrap().activity_type, "Run");
    }

    #[test]
    fn test_float_and_blank_counts() {
        let rows = read(
            "1,A,2024-01-01T07:00:00,10.0,50.0,0.0,Run,12.0,1.0,3,\n\
             2,B,2024-01-02T07:00:00,10.0,50.0,0.0,Run,12.0,,nan,\n",
        );
        let first = rows[0].as_ref().unwrap();
        assert_eq!((first.pr_count, first.kudos), (1, 3));
        let second = rows[1].as_ref().unwrap();
        assert_eq!((second.pr_count, second.kudos), (0, 0));
    }

    #[test]
    fn test_unusable_cells_still_fail_the_row() {
        let rows = read(
            "1,A,2024-01-01T07:00:00,10.0,50.0,0.0,'',12.0,0,0,\n\
             2,B,2024-01-02T07:00:00,10.0,50.0,0.0,Run,12.0,-2,0,\n",
        );
        assert!(rows[0].is_err());
        assert!(rows[1].is_err());
    }

    #[test]
    fn test_normalize_activity_type_framing() {
        assert_eq!(normalize_activity_type("Run").as_deref(), Some("Run"));
        assert_eq!(normalize_activity_type("  Ride\n").as_deref(), Some("Ride"));
        assert_eq!(normalize_activity_type("root='Run'").as_deref(), Some("Run"));
        assert_eq!(normalize_activity_type("\"Hike\"").as_deref(), Some("Hike"));
        assert_eq!(normalize_activity_type("<Swim>").as_deref(), Some("Swim"));
        assert_eq!(
            normalize_activity_type("ActivityType.TrailRun").as_deref(),
            Some("TrailRun")
        );
        assert_eq!(normalize_activity_type("''"), None);
        assert_eq!(normalize_activity_type("   "), None);
    }
}
