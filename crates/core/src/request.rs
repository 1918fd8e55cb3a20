//! Analysis request parameters chosen by the user.
//!
//! Wire values are the lowercase identifiers the workflow engine
//! expects (`intraday`, `moyenne`, `moyen`, ...). Parsing is lenient on
//! case and accents; serialization always emits the canonical form.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::CoreError;

static PAIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{2,6}/[A-Z0-9]{2,6}$").expect("valid regex"));

// ---------------------------------------------------------------------------
// CurrencyPair
// ---------------------------------------------------------------------------

/// A market symbol such as `EUR/USD` or `XAU/USD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CurrencyPair(String);

impl CurrencyPair {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyPair {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        if !PAIR_RE.is_match(&normalized) {
            return Err(CoreError::Validation(format!(
                "Invalid currency pair '{s}'. Expected BASE/QUOTE, e.g. EUR/USD"
            )));
        }
        Ok(Self(normalized))
    }
}

impl std::fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Enumerated choices
// ---------------------------------------------------------------------------

/// Strip the accents the UI labels use so `élevée` parses like `elevee`.
fn fold(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'é' | 'è' | 'ê' => 'e',
            other => other,
        })
        .collect()
}

macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident, $what:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match fold(s).as_str() {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(CoreError::Validation(format!(
                        "Invalid {} '{}'. Must be one of: {}",
                        $what,
                        s,
                        [$($wire),+].join(", ")
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice_enum!(
    /// Holding horizon of the trade.
    TradingStyle, "trading style", {
        Scalping => "scalping",
        Intraday => "intraday",
        Swing => "swing",
    }
);

choice_enum!(
    /// Risk appetite.
    RiskLevel, "risk level", {
        Faible => "faible",
        Moyenne => "moyenne",
        Elevee => "elevee",
    }
);

choice_enum!(
    /// Gain objective.
    GainObjective, "gain objective", {
        Faible => "faible",
        Moyen => "moyen",
        Eleve => "eleve",
    }
);

// ---------------------------------------------------------------------------
// AnalysisRequest
// ---------------------------------------------------------------------------

/// Parameters of one market-analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    pub pair: CurrencyPair,
    pub style: TradingStyle,
    pub risk: RiskLevel,
    pub gain: GainObjective,
}

impl AnalysisRequest {
    /// Parse and validate the four user-facing values.
    pub fn parse(pair: &str, style: &str, risk: &str, gain: &str) -> Result<Self, CoreError> {
        Ok(Self {
            pair: pair.parse()?,
            style: style.parse()?,
            risk: risk.parse()?,
            gain: gain.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_reference_request() {
        let req = AnalysisRequest::parse("EUR/USD", "intraday", "moyenne", "moyen").unwrap();
        assert_eq!(req.pair.as_str(), "EUR/USD");
        assert_eq!(req.style, TradingStyle::Intraday);
        assert_eq!(req.risk, RiskLevel::Moyenne);
        assert_eq!(req.gain, GainObjective::Moyen);
    }

    #[test]
    fn pair_is_uppercased() {
        let pair: CurrencyPair = " eur/usd ".parse().unwrap();
        assert_eq!(pair.as_str(), "EUR/USD");
    }

    #[test]
    fn pair_without_slash_rejected() {
        assert_matches!("EURUSD".parse::<CurrencyPair>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn pair_code_length_bounds() {
        assert!("BTC/USDT".parse::<CurrencyPair>().is_ok());
        assert!("US30/USD".parse::<CurrencyPair>().is_ok());
        assert!("E/USD".parse::<CurrencyPair>().is_err());
        assert!("EURUSDX/USD".parse::<CurrencyPair>().is_err());
    }

    #[test]
    fn accented_values_parse() {
        assert_eq!("Élevée".parse::<RiskLevel>().unwrap(), RiskLevel::Elevee);
        assert_eq!("élevé".parse::<GainObjective>().unwrap(), GainObjective::Eleve);
    }

    #[test]
    fn unknown_style_lists_valid_values() {
        let err = "position".parse::<TradingStyle>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("scalping"));
        assert!(msg.contains("swing"));
    }

    #[test]
    fn serializes_wire_values() {
        let req = AnalysisRequest::parse("XAU/USD", "swing", "faible", "eleve").unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["pair"], "XAU/USD");
        assert_eq!(json["style"], "swing");
        assert_eq!(json["risk"], "faible");
        assert_eq!(json["gain"], "eleve");
    }
}
