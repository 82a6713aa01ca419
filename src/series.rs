//! Historical time series types and anomaly annotations

use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar month identifier, e.g. `2024-03`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Create a new period. Month must be in `1..=12`.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ForecastError::InvalidConfiguration(format!(
                "Month must be between 1 and 12, got {}",
                month
            )));
        }
        Ok(Self { year, month })
    }

    /// The period containing the given date
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// First day of the month, for callers that need a full date
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// The next calendar month
    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = s.split_once('-').ok_or_else(|| {
            ForecastError::InvalidConfiguration(format!(
                "Period must be formatted as YYYY-MM, got '{}'",
                s
            ))
        })?;

        let year: i32 = year.parse().map_err(|_| {
            ForecastError::InvalidConfiguration(format!("Invalid year in period '{}'", s))
        })?;
        let month: u32 = month.parse().map_err(|_| {
            ForecastError::InvalidConfiguration(format!("Invalid month in period '{}'", s))
        })?;

        Period::new(year, month)
    }
}

/// One observed monthly value in a historical statement series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalObservation {
    /// Month the value was observed in
    pub period: Period,
    /// Observed amount
    pub value: f64,
}

impl HistoricalObservation {
    pub fn new(period: Period, value: f64) -> Self {
        Self { period, value }
    }
}

/// Ordered monthly time series for a single metric.
///
/// Construction validates that periods are strictly increasing (which also
/// guarantees uniqueness). Gaps are tolerated: month-over-month changes are
/// only formed between adjacent calendar months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    observations: Vec<HistoricalObservation>,
}

impl HistoricalSeries {
    /// Create a series from chronologically ordered observations
    pub fn new(observations: Vec<HistoricalObservation>) -> Result<Self> {
        for pair in observations.windows(2) {
            if pair[1].period <= pair[0].period {
                return Err(ForecastError::InvalidConfiguration(format!(
                    "Historical periods must be strictly increasing: {} follows {}",
                    pair[1].period, pair[0].period
                )));
            }
        }

        Ok(Self { observations })
    }

    /// Convenience constructor from a start month and consecutive values
    pub fn from_values(start: Period, values: &[f64]) -> Result<Self> {
        let mut observations = Vec::with_capacity(values.len());
        let mut period = start;
        for &value in values {
            observations.push(HistoricalObservation::new(period, value));
            period = period.succ();
        }
        Self::new(observations)
    }

    pub fn observations(&self) -> &[HistoricalObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// First and last period covered, if the series is non-empty
    pub fn span(&self) -> Option<(Period, Period)> {
        match (self.observations.first(), self.observations.last()) {
            (Some(first), Some(last)) => Some((first.period, last.period)),
            _ => None,
        }
    }
}

/// Which derived statistic an annotated range is excluded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionScope {
    /// Excluded from the median baseline only
    Baseline,
    /// Excluded from the volatility profile only
    Volatility,
    /// Excluded from both
    Both,
}

impl ExclusionScope {
    /// Whether this scope removes a period from baseline eligibility
    pub fn excludes_baseline(&self) -> bool {
        matches!(self, ExclusionScope::Baseline | ExclusionScope::Both)
    }

    /// Whether this scope removes a period from volatility eligibility
    pub fn excludes_volatility(&self) -> bool {
        matches!(self, ExclusionScope::Volatility | ExclusionScope::Both)
    }
}

/// User-marked anomalous date range excluded from baseline and/or
/// volatility calculations.
///
/// Overlapping annotations union: a period excluded by any applicable
/// annotation is excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyAnnotation {
    start: Period,
    end: Period,
    /// Free-text justification entered in the annotation workflow
    pub reason: String,
    /// Exclusion scope
    pub exclude_from: ExclusionScope,
}

impl AnomalyAnnotation {
    /// Create an annotation covering `start..=end`
    pub fn new(
        start: Period,
        end: Period,
        reason: impl Into<String>,
        exclude_from: ExclusionScope,
    ) -> Result<Self> {
        if start > end {
            return Err(ForecastError::InvalidConfiguration(format!(
                "Annotation start {} is after end {}",
                start, end
            )));
        }

        Ok(Self {
            start,
            end,
            reason: reason.into(),
            exclude_from,
        })
    }

    pub fn start(&self) -> Period {
        self.start
    }

    pub fn end(&self) -> Period {
        self.end
    }

    /// Whether this annotation's range covers the given period
    pub fn covers(&self, period: Period) -> bool {
        self.start <= period && period <= self.end
    }
}
