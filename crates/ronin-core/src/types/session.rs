//! 주요 귀금속 시장 거래 세션.
//!
//! 각 세션은 현지 시간대 기준의 개장/폐장 시각을 가지며,
//! 주말(현지 토/일)에는 항상 폐장으로 간주합니다.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Tz;

/// 거래 세션.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketSession {
    /// 세션 이름
    pub name: &'static str,
    /// 현지 시간대
    pub timezone: Tz,
    /// 개장 시각 (현지, 시)
    pub open_hour: u32,
    /// 폐장 시각 (현지, 시, 미포함)
    pub close_hour: u32,
}

impl MarketSession {
    /// 주어진 시각에 세션이 열려 있는지 확인합니다.
    pub fn is_open(&self, at: DateTime<Utc>) -> bool {
        let local = at.with_timezone(&self.timezone);
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        (self.open_hour..self.close_hour).contains(&local.hour())
    }
}

/// 기본 세션 목록: 뉴욕, 런던, 상하이, 도쿄.
pub fn default_sessions() -> [MarketSession; 4] {
    [
        MarketSession {
            name: "New York",
            timezone: chrono_tz::America::New_York,
            open_hour: 8,
            close_hour: 13,
        },
        MarketSession {
            name: "London",
            timezone: chrono_tz::Europe::London,
            open_hour: 8,
            close_hour: 16,
        },
        MarketSession {
            name: "Shanghai",
            timezone: chrono_tz::Asia::Shanghai,
            open_hour: 9,
            close_hour: 15,
        },
        MarketSession {
            name: "Tokyo",
            timezone: chrono_tz::Asia::Tokyo,
            open_hour: 9,
            close_hour: 15,
        },
    ]
}

/// 주어진 시각에 열려 있는 세션 이름 목록 (기본 세션 순서).
pub fn open_sessions(at: DateTime<Utc>) -> Vec<&'static str> {
    default_sessions()
        .iter()
        .filter(|s| s.is_open(at))
        .map(|s| s.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_open_sessions_weekday_afternoon_utc() {
        // 2024-06-03 (월) 14:00 UTC = 뉴욕 10:00 EDT, 런던 15:00 BST
        let at = Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap();
        assert_eq!(open_sessions(at), vec!["New York", "London"]);
    }

    #[test]
    fn test_open_sessions_asia_morning() {
        // 2024-06-04 (화) 02:00 UTC = 상하이 10:00, 도쿄 11:00
        let at = Utc.with_ymd_and_hms(2024, 6, 4, 2, 0, 0).unwrap();
        assert_eq!(open_sessions(at), vec!["Shanghai", "Tokyo"]);
    }

    #[test]
    fn test_weekend_closed() {
        // 2024-06-08 (토) 14:00 UTC
        let at = Utc.with_ymd_and_hms(2024, 6, 8, 14, 0, 0).unwrap();
        assert!(open_sessions(at).is_empty());
    }
}
