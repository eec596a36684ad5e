//! Daily daytime/nighttime aggregation of hourly forecast readings.
//!
//! Hourly readings are collapsed into one [`DailySummary`] per calendar date.
//! Whether the output carries one category or two is decided over the whole
//! window: if the `is_day` flag never changes, every date reports its means
//! under the Daytime fields and Nighttime is `N/A`. As soon as the flag varies
//! anywhere, every date is split into Daytime (`is_day == true`) and Nighttime
//! (`is_day == false`), with `N/A` for a category a date has no samples for.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Sentinel text used for a missing day/night category.
pub const NOT_APPLICABLE: &str = "N/A";

/// One localized hourly forecast sample.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyReading {
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Air temperature at 2 m in Celsius
    pub temperature: f64,
    /// Relative humidity at 2 m in percent
    pub relative_humidity: f64,
    pub is_day: bool,
}

/// An averaged value, or `N/A` when no samples existed for it.
///
/// Serializes as a plain JSON number, or as the string `"N/A"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Value(f64),
    NotApplicable,
}

#[cfg(test)]
impl Measurement {
    pub fn value(self) -> Option<f64> {
        match self {
            Measurement::Value(v) => Some(v),
            Measurement::NotApplicable => None,
        }
    }

    pub fn is_not_applicable(self) -> bool {
        matches!(self, Measurement::NotApplicable)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::Value(v) => write!(f, "{}", v),
            Measurement::NotApplicable => f.write_str(NOT_APPLICABLE),
        }
    }
}

impl Serialize for Measurement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Measurement::Value(v) => serializer.serialize_f64(*v),
            Measurement::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
        }
    }
}

impl<'de> Deserialize<'de> for Measurement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(Measurement::Value(v)),
            Raw::Text(s) if s == NOT_APPLICABLE => Ok(Measurement::NotApplicable),
            Raw::Text(s) => Err(serde::de::Error::custom(format!(
                "expected a number or \"{}\", got \"{}\"",
                NOT_APPLICABLE, s
            ))),
        }
    }
}

/// Daytime/nighttime averages for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub day_temperature: Measurement,
    pub night_temperature: Measurement,
    pub day_humidity: Measurement,
    pub night_humidity: Measurement,
}

/// Running sums for one (date, category) group.
#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    temperature_sum: f64,
    humidity_sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, r: &HourlyReading) {
        self.temperature_sum += r.temperature;
        self.humidity_sum += r.relative_humidity;
        self.count += 1;
    }

    fn temperature(&self) -> Measurement {
        self.finish(self.temperature_sum)
    }

    fn humidity(&self) -> Measurement {
        self.finish(self.humidity_sum)
    }

    fn finish(&self, sum: f64) -> Measurement {
        if self.count == 0 {
            Measurement::NotApplicable
        } else {
            Measurement::Value(sum / self.count as f64)
        }
    }
}

#[derive(Debug, Default)]
struct DayGroups {
    all: Mean,
    day: Mean,
    night: Mean,
}

/// Collapse hourly readings into one summary per date, ascending by date.
pub fn aggregate(readings: &[HourlyReading]) -> Vec<DailySummary> {
    let Some(first) = readings.first() else {
        return Vec::new();
    };
    let single_category = readings.iter().all(|r| r.is_day == first.is_day);

    let mut by_date: BTreeMap<NaiveDate, DayGroups> = BTreeMap::new();
    for r in readings {
        let groups = by_date.entry(r.date).or_default();
        groups.all.add(r);
        if r.is_day {
            groups.day.add(r);
        } else {
            groups.night.add(r);
        }
    }

    by_date
        .into_iter()
        .map(|(date, groups)| {
            if single_category {
                DailySummary {
                    date,
                    day_temperature: groups.all.temperature(),
                    night_temperature: Measurement::NotApplicable,
                    day_humidity: groups.all.humidity(),
                    night_humidity: Measurement::NotApplicable,
                }
            } else {
                DailySummary {
                    date,
                    day_temperature: groups.day.temperature(),
                    night_temperature: groups.night.temperature(),
                    day_humidity: groups.day.humidity(),
                    night_humidity: groups.night.humidity(),
                }
            }
        })
        .collect()
}
