pub mod adapter;
pub mod unit;

pub use adapter::{AdapterError, ErrorKind, proxy::ProxyClient};
pub use unit::Price;

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub const MAX_SYMBOL_LEN: usize = 12;

/// Upper-cased ticker symbol, e.g. `AAPL` or `BRK.B`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Normalizes user input; `None` when empty, too long or containing
    /// characters no listed symbol uses.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_SYMBOL_LEN {
            return None;
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^'))
        {
            return None;
        }
        Some(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Symbol {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(&raw).ok_or_else(|| format!("invalid symbol {raw:?}"))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a chart or a value display is looking at
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// The account's equity, requires a [`CredentialRef`]
    #[default]
    Portfolio,
    Symbol(Symbol),
}

impl Source {
    pub fn symbol(&self) -> Option<&Symbol> {
        match self {
            Source::Symbol(symbol) => Some(symbol),
            Source::Portfolio => None,
        }
    }

    pub fn needs_credential(&self) -> bool {
        matches!(self, Source::Portfolio)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Portfolio => f.write_str("Portfolio"),
            Source::Symbol(symbol) => write!(f, "{symbol}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    D1,
    W1,
    M1,
    M3,
    Y1,
    #[default]
    All,
}

impl Timeframe {
    pub const ALL: [Timeframe; 6] = [
        Timeframe::D1,
        Timeframe::W1,
        Timeframe::M1,
        Timeframe::M3,
        Timeframe::Y1,
        Timeframe::All,
    ];

    /// History window requested from the service
    pub fn period(self) -> &'static str {
        match self {
            Timeframe::D1 => "1D",
            Timeframe::W1 => "1W",
            Timeframe::M1 => "1M",
            Timeframe::M3 => "3M",
            Timeframe::Y1 => "12M",
            Timeframe::All => "1A",
        }
    }

    /// Bar size requested from the service
    pub fn granularity(self) -> &'static str {
        match self {
            Timeframe::D1 => "15Min",
            Timeframe::W1 => "1H",
            Timeframe::M1 | Timeframe::M3 | Timeframe::Y1 | Timeframe::All => "1D",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Timeframe::D1 => "1D",
            Timeframe::W1 => "1W",
            Timeframe::M1 => "1M",
            Timeframe::M3 => "3M",
            Timeframe::Y1 => "1Y",
            Timeframe::All => "ALL",
        })
    }
}

/// One price observation, `time` in unix milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub time: u64,
    pub price: Price,
}

impl Sample {
    pub fn new(time: u64, price: Price) -> Self {
        Self { time, price }
    }
}

/// Opaque reference to the brokerage credential held by the profile store.
/// Never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRef {
    key: String,
    secret: String,
}

impl CredentialRef {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Option<Self> {
        let (key, secret) = (key.into(), secret.into());
        if key.trim().is_empty() || secret.trim().is_empty() {
            return None;
        }
        Some(Self { key, secret })
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for CredentialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRef").finish_non_exhaustive()
    }
}

/// Accepts either a JSON number or a numeric string
fn de_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
    .ok_or_else(|| serde::de::Error::custom(format!("expected a number, got {value}")))
}
