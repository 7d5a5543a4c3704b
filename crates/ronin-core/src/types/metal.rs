//! 귀금속 심볼 및 통화 정의.
//!
//! 이 모듈은 시세 조회에 사용되는 열거형을 정의합니다:
//! - `Metal` - 지원하는 귀금속 (금, 은, 백금, 팔라듐)
//! - `Currency` - 시세 표시 통화 (ISO 4217)

use serde::{Deserialize, Serialize};
use std::fmt;

/// 지원하는 귀금속.
///
/// 각 귀금속은 ISO 4217 귀금속 코드(XAU, XAG, XPT, XPD)를 가집니다.
/// 정렬 순서는 화면 표시 순서와 같습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metal {
    /// 금 (XAU)
    #[serde(alias = "XAU", alias = "xau")]
    Gold,
    /// 은 (XAG)
    #[serde(alias = "XAG", alias = "xag")]
    Silver,
    /// 백금 (XPT)
    #[serde(alias = "XPT", alias = "xpt")]
    Platinum,
    /// 팔라듐 (XPD)
    #[serde(alias = "XPD", alias = "xpd")]
    Palladium,
}

impl Metal {
    /// 지원하는 모든 귀금속 (표시 순서).
    pub const ALL: [Metal; 4] = [Metal::Gold, Metal::Silver, Metal::Platinum, Metal::Palladium];

    /// ISO 4217 귀금속 코드를 반환합니다.
    pub fn code(&self) -> &'static str {
        match self {
            Metal::Gold => "XAU",
            Metal::Silver => "XAG",
            Metal::Platinum => "XPT",
            Metal::Palladium => "XPD",
        }
    }

    /// 표시용 이름을 반환합니다.
    pub fn name(&self) -> &'static str {
        match self {
            Metal::Gold => "Gold",
            Metal::Silver => "Silver",
            Metal::Platinum => "Platinum",
            Metal::Palladium => "Palladium",
        }
    }

    /// ISO 코드에서 귀금속을 찾습니다 (대소문자 무시).
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Metal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Metal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::from_code(s)
            .or_else(|| Self::ALL.into_iter().find(|m| m.name().eq_ignore_ascii_case(s)))
            .ok_or_else(|| format!("Unknown metal: {}", s))
    }
}

/// 시세 표시 통화.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// 미국 달러
    Usd,
    /// 유로
    Eur,
    /// 영국 파운드
    Gbp,
    /// 일본 엔
    Jpy,
    /// 중국 위안
    Cny,
}

impl Default for Currency {
    fn default() -> Self {
        Self::Usd
    }
}

impl Currency {
    /// ISO 4217 코드를 반환합니다.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Cny => "CNY",
        }
    }

    /// 통화 기호를 반환합니다.
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Jpy | Currency::Cny => "¥",
        }
    }

    /// 가격 표시 소수점 자릿수.
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::Jpy => 0,
            _ => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "JPY" => Ok(Self::Jpy),
            "CNY" => Ok(Self::Cny),
            _ => Err(format!("Unsupported currency: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metal_codes() {
        assert_eq!(Metal::Gold.code(), "XAU");
        assert_eq!(Metal::Palladium.to_string(), "XPD");
        assert_eq!(Metal::from_code("xag"), Some(Metal::Silver));
        assert_eq!(Metal::from_code("BTC"), None);
    }

    #[test]
    fn test_metal_from_str() {
        assert_eq!("gold".parse::<Metal>().unwrap(), Metal::Gold);
        assert_eq!("XPT".parse::<Metal>().unwrap(), Metal::Platinum);
        assert!("copper".parse::<Metal>().is_err());
    }

    #[test]
    fn test_metal_serde() {
        let metals: Vec<Metal> = serde_json::from_str(r#"["gold", "XAG"]"#).unwrap();
        assert_eq!(metals, vec![Metal::Gold, Metal::Silver]);
        assert_eq!(serde_json::to_string(&Metal::Platinum).unwrap(), "\"platinum\"");
    }

    #[test]
    fn test_currency() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(Currency::Jpy.decimal_places(), 0);
        assert_eq!(Currency::Eur.symbol(), "€");
        assert!("KRW".parse::<Currency>().is_err());
    }
}
