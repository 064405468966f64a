use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Time-bucket width of a cost query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Granularity {
    Daily,
    Monthly,
    Hourly,
}

impl Granularity {
    /// Next period boundary after `t`.
    pub fn advance(&self, t: NaiveDateTime) -> NaiveDateTime {
        match self {
            Self::Daily => t + chrono::Duration::days(1),
            Self::Hourly => t + chrono::Duration::hours(1),
            Self::Monthly => t
                .checked_add_months(Months::new(1))
                .expect("period boundary out of range"),
        }
    }

    /// Period boundaries covering `[start, end)`, contiguous and half-open.
    pub fn periods(&self, start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDateTime, NaiveDateTime)> {
        let end_dt = end.and_time(NaiveTime::MIN);
        let mut cur = start.and_time(NaiveTime::MIN);
        let mut out = Vec::new();
        while cur < end_dt {
            let next = self.advance(cur);
            out.push((cur, next.min(end_dt)));
            cur = next;
        }
        out
    }

    /// Canonical label for a period start. Hourly buckets keep the
    /// backend's timestamp format; wider buckets are plain dates.
    pub fn label(&self, t: NaiveDateTime) -> String {
        match self {
            Self::Hourly => t.format("%Y-%m-%dT%H:00:00Z").to_string(),
            _ => t.format("%Y-%m-%d").to_string(),
        }
    }
}

impl FromStr for Granularity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Self::Daily),
            "MONTHLY" => Ok(Self::Monthly),
            "HOURLY" => Ok(Self::Hourly),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "DAILY"),
            Self::Monthly => write!(f, "MONTHLY"),
            Self::Hourly => write!(f, "HOURLY"),
        }
    }
}

/// Attribute used to split a time series into per-key series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupDimension {
    Service,
    Region,
    UsageType,
}

impl FromStr for GroupDimension {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SERVICE" => Ok(Self::Service),
            "REGION" => Ok(Self::Region),
            "USAGE_TYPE" => Ok(Self::UsageType),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for GroupDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service => write!(f, "SERVICE"),
            Self::Region => write!(f, "REGION"),
            Self::UsageType => write!(f, "USAGE_TYPE"),
        }
    }
}

/// One named numeric sequence, positionally aligned to the payload labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<f64>,
}

/// Display-agnostic chart structure: ordered period labels plus one or
/// more datasets of equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPayload {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_daily_periods_contiguous() {
        let periods = Granularity::Daily.periods(date("2024-07-01"), date("2024-07-03"));
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].1, periods[1].0);
        assert_eq!(periods[0].0, date("2024-07-01").and_time(NaiveTime::MIN));
        assert_eq!(periods[1].1, date("2024-07-03").and_time(NaiveTime::MIN));
    }

    #[test]
    fn test_monthly_periods() {
        let periods = Granularity::Monthly.periods(date("2024-01-01"), date("2024-04-01"));
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[1].0, date("2024-02-01").and_time(NaiveTime::MIN));
        assert_eq!(periods[2].1, date("2024-04-01").and_time(NaiveTime::MIN));
    }

    #[test]
    fn test_hourly_periods_one_day() {
        let periods = Granularity::Hourly.periods(date("2024-07-01"), date("2024-07-02"));
        assert_eq!(periods.len(), 24);
    }

    #[test]
    fn test_labels() {
        let start = date("2024-07-01").and_time(NaiveTime::MIN);
        assert_eq!(Granularity::Daily.label(start), "2024-07-01");
        assert_eq!(Granularity::Monthly.label(start), "2024-07-01");
        let five = start + chrono::Duration::hours(5);
        assert_eq!(Granularity::Hourly.label(five), "2024-07-01T05:00:00Z");
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("daily".parse::<Granularity>(), Ok(Granularity::Daily));
        assert_eq!("Monthly".parse::<Granularity>(), Ok(Granularity::Monthly));
        assert!("WEEKLY".parse::<Granularity>().is_err());
        assert_eq!("usage_type".parse::<GroupDimension>(), Ok(GroupDimension::UsageType));
        assert!("TAG".parse::<GroupDimension>().is_err());
    }
}
