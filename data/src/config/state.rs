use super::PollInterval;
use super::recent::RecentSymbols;
use crate::util::ok_or_default;

use exchange::{Source, Timeframe};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct State {
    #[serde(deserialize_with = "ok_or_default")]
    pub last_source: Source,
    #[serde(deserialize_with = "ok_or_default")]
    pub timeframe: Timeframe,
    #[serde(deserialize_with = "ok_or_default")]
    pub recent_symbols: RecentSymbols,
    pub proxy_url: Option<String>,
    #[serde(deserialize_with = "ok_or_default")]
    pub poll_interval: PollInterval,
}

impl State {
    pub fn from_parts(
        last_source: Source,
        timeframe: Timeframe,
        recent_symbols: RecentSymbols,
        proxy_url: Option<String>,
        poll_interval: PollInterval,
    ) -> Self {
        State {
            last_source,
            timeframe,
            recent_symbols,
            proxy_url: proxy_url.filter(|url| !url.trim().is_empty()),
            poll_interval,
        }
    }

    /// Repairs values that deserialize fine but can't be used as-is
    pub fn normalized(self) -> Self {
        Self::from_parts(
            self.last_source,
            self.timeframe,
            self.recent_symbols.normalized(),
            self.proxy_url,
            PollInterval::from_secs(self.poll_interval.as_duration().as_secs()),
        )
    }
}
