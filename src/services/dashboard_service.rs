//! Dashboard aggregates

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::errors::{Result, SurveyhubError};
use crate::storage::{SeaOrmStorage, WindowCounts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardFilter {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl DashboardFilter {
    pub fn days(&self) -> i64 {
        match self {
            DashboardFilter::Weekly => 7,
            DashboardFilter::Monthly => 30,
            DashboardFilter::Yearly => 365,
        }
    }
}

impl FromStr for DashboardFilter {
    type Err = SurveyhubError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "" | "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(SurveyhubError::validation(format!(
                "Invalid filter: '{}'. Valid: weekly, monthly, yearly",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSummary {
    pub filter: DashboardFilter,
    pub window: WindowCounts,
    pub today: WindowCounts,
}

/// 当天 00:00 UTC
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(now)
}

pub struct DashboardService {
    storage: Arc<SeaOrmStorage>,
}

impl DashboardService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn summary(&self, filter: DashboardFilter) -> Result<DashboardSummary> {
        let now = Utc::now();
        let window = self
            .storage
            .window_counts(Some(now - Duration::days(filter.days())))
            .await?;
        let today = self.storage.window_counts(Some(start_of_day(now))).await?;
        Ok(DashboardSummary {
            filter,
            window,
            today,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_filter_parsing() {
        assert_eq!("Weekly".parse::<DashboardFilter>().unwrap(), DashboardFilter::Weekly);
        assert_eq!("".parse::<DashboardFilter>().unwrap(), DashboardFilter::Monthly);
        assert_eq!(DashboardFilter::Yearly.days(), 365);
        assert!(matches!(
            "daily".parse::<DashboardFilter>(),
            Err(SurveyhubError::Validation(_))
        ));
    }

    #[test]
    fn test_start_of_day() {
        let now = Utc.with_ymd_and_hms(2025, 11, 3, 17, 45, 12).unwrap();
        assert_eq!(
            start_of_day(now),
            Utc.with_ymd_and_hms(2025, 11, 3, 0, 0, 0).unwrap()
        );
    }
}
