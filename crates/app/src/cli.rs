//! Command-line parsing for the `signaldesk` binary.

use signaldesk_core::error::CoreError;
use signaldesk_core::request::{AnalysisRequest, GainObjective, RiskLevel, TradingStyle};

/// Help text listing every accepted choice.
pub fn usage() -> String {
    fn choices<T: std::fmt::Display>(all: &[T]) -> String {
        all.iter().map(T::to_string).collect::<Vec<_>>().join(" | ")
    }

    format!(
        "Usage:
  signaldesk analyze <PAIR> <STYLE> <RISK> <GAIN>
  signaldesk chat <SYMBOL>
  signaldesk logs

STYLE: {}
RISK:  {}
GAIN:  {}",
        choices(TradingStyle::ALL),
        choices(RiskLevel::ALL),
        choices(GainObjective::ALL),
    )
}

/// A parsed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Analyze(AnalysisRequest),
    Chat { symbol: String },
    Logs,
    Help,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("'{command}' expects {expected} argument(s), got {got}")]
    Arity {
        command: &'static str,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Invalid(#[from] CoreError),
}

impl Command {
    /// Parse the arguments that follow the program name.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, CliError> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let Some((&name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };

        match name {
            "analyze" => {
                let [pair, style, risk, gain] = rest else {
                    return Err(arity("analyze", 4, rest.len()));
                };
                Ok(Command::Analyze(AnalysisRequest::parse(pair, style, risk, gain)?))
            }
            "chat" => {
                if rest.is_empty() {
                    return Err(arity("chat", 1, 0));
                }
                // Allow unquoted multi-word symbols.
                Ok(Command::Chat {
                    symbol: rest.join(" "),
                })
            }
            "logs" => match rest {
                [] => Ok(Command::Logs),
                _ => Err(arity("logs", 0, rest.len())),
            },
            "help" | "-h" | "--help" => Ok(Command::Help),
            other => Err(CliError::UnknownCommand(other.to_string())),
        }
    }
}

fn arity(command: &'static str, expected: usize, got: usize) -> CliError {
    CliError::Arity {
        command,
        expected,
        got,
    }
}
