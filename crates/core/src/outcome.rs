//! Interpretation of a job's `final_result` document.
//!
//! The workflow engine owns the result format and has shipped it in a
//! few shapes over time: a nested `signal` object, flat fields at the
//! top level, or the whole document as a JSON string. Interpretation is
//! total: anything not understood becomes [`AnalysisOutcome::Unrecognized`].

use serde::Serialize;
use serde_json::Value;

/// Trade direction of a generated signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "buy" | "long" | "achat" => Some(Direction::Buy),
            "sell" | "short" | "vente" => Some(Direction::Sell),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
        }
    }
}

/// A trade signal extracted from the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeSignal {
    pub direction: Direction,
    pub entry: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Vec<f64>,
    /// Confidence as reported (usually 0-100).
    pub confidence: Option<f64>,
}

/// What the finished analysis concluded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Signal {
        signal: TradeSignal,
        commentary: Option<String>,
    },
    NoSignal {
        reason: Option<String>,
    },
    Unrecognized {
        raw: Value,
    },
}

impl AnalysisOutcome {
    /// Classify a final result document.
    pub fn from_result(result: &Value) -> Self {
        // Some engine versions store the document as a JSON string.
        if let Value::String(text) = result {
            if let Ok(inner) = serde_json::from_str::<Value>(text) {
                if inner.is_object() {
                    return Self::from_result(&inner);
                }
            }
            return AnalysisOutcome::Unrecognized {
                raw: result.clone(),
            };
        }

        let Some(obj) = result.as_object() else {
            return AnalysisOutcome::Unrecognized {
                raw: result.clone(),
            };
        };

        let commentary = first_string(result, &["analysis", "commentary", "summary", "message"]);

        if obj.get("no_signal").and_then(Value::as_bool) == Some(true) {
            return AnalysisOutcome::NoSignal {
                reason: first_string(result, &["reason", "message", "analysis"]),
            };
        }

        match obj.get("signal") {
            Some(Value::Object(_)) => {
                let signal_doc = &obj["signal"];
                match parse_signal(signal_doc) {
                    Some(signal) => AnalysisOutcome::Signal { signal, commentary },
                    None => AnalysisOutcome::NoSignal {
                        reason: first_string(signal_doc, &["reason", "message"])
                            .or_else(|| first_string(result, &["reason"]))
                            .or(commentary),
                    },
                }
            }
            Some(Value::Null) | Some(Value::Bool(false)) => AnalysisOutcome::NoSignal {
                reason: first_string(result, &["reason", "message", "analysis"]),
            },
            Some(Value::String(s)) if Direction::parse(s).is_none() => AnalysisOutcome::NoSignal {
                reason: first_string(result, &["reason", "message", "analysis"]),
            },
            _ => match parse_signal(result) {
                Some(signal) => AnalysisOutcome::Signal { signal, commentary },
                None => AnalysisOutcome::Unrecognized {
                    raw: result.clone(),
                },
            },
        }
    }

    pub fn has_signal(&self) -> bool {
        matches!(self, AnalysisOutcome::Signal { .. })
    }
}

/// Extract a signal from an object with `direction`-like and price fields.
fn parse_signal(doc: &Value) -> Option<TradeSignal> {
    let direction = ["direction", "action", "type", "signal"]
        .iter()
        .filter_map(|k| doc.get(*k).and_then(Value::as_str))
        .find_map(Direction::parse)?;

    Some(TradeSignal {
        direction,
        entry: first_number(doc, &["entry", "entry_price", "price"]),
        stop_loss: first_number(doc, &["stop_loss", "sl", "stoploss"]),
        take_profit: numbers(doc, &["take_profit", "tp", "targets"]),
        confidence: first_number(doc, &["confidence", "confidence_score"]),
    })
}

fn first_string(doc: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| doc.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

fn first_number(doc: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|k| doc.get(*k)).find_map(as_number)
}

fn numbers(doc: &Value, keys: &[&str]) -> Vec<f64> {
    for key in keys {
        match doc.get(*key) {
            Some(Value::Array(items)) => return items.iter().filter_map(as_number).collect(),
            Some(v) => {
                if let Some(n) = as_number(v) {
                    return vec![n];
                }
            }
            None => {}
        }
    }
    Vec::new()
}
