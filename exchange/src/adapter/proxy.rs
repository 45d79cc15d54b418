//! Adapter for the quote proxy: symbol history, realtime quotes and the
//! portfolio equity series.

use super::AdapterError;
use crate::{CredentialRef, Price, Sample, Source, Timeframe, de_number};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use std::{
    sync::{Arc, LazyLock},
    time::Duration,
};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Live polls always look at the current session in hourly bars
const LIVE_PERIOD: &str = "1D";
const LIVE_GRANULARITY: &str = "1H";

/// The proxy's portfolio route names the credential differently per caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortfolioAuth {
    /// `apikey` / `secret`
    History,
    /// `encryptedKey` / `encryptedSecret`
    Live,
}

impl PortfolioAuth {
    fn param_names(self) -> (&'static str, &'static str) {
        match self {
            PortfolioAuth::History => ("apikey", "secret"),
            PortfolioAuth::Live => ("encryptedKey", "encryptedSecret"),
        }
    }
}

static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Falling back to default http client: {e}");
            reqwest::Client::new()
        })
});

#[derive(Debug, Clone)]
pub struct ProxyClient {
    base_url: Arc<str>,
    credential: Option<CredentialRef>,
}

impl Default for ProxyClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, None)
    }
}

impl ProxyClient {
    pub fn new(base_url: &str, credential: Option<CredentialRef>) -> Self {
        Self {
            base_url: Arc::from(base_url.trim().trim_end_matches('/')),
            credential,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn with_credential(self, credential: Option<CredentialRef>) -> Self {
        Self { credential, ..self }
    }

    /// Ordered (ascending) history for a chart
    pub async fn fetch_history(
        &self,
        source: &Source,
        timeframe: Timeframe,
    ) -> Result<Vec<Sample>, AdapterError> {
        match source {
            Source::Symbol(symbol) => {
                let url = format!("{}/day/{}", self.base_url, symbol);
                let query = [
                    ("period", timeframe.period()),
                    ("timeframe", timeframe.granularity()),
                ];
                let text = get_text(&url, &query).await?;
                parse_history(&text)
            }
            Source::Portfolio => {
                let text = self
                    .get_portfolio(
                        PortfolioAuth::History,
                        timeframe.period(),
                        timeframe.granularity(),
                    )
                    .await?;
                parse_portfolio(&text)
            }
        }
    }

    /// Ordered (ascending) prices of the current session for a value display
    pub async fn fetch_live(&self, feed: &Source) -> Result<Vec<Price>, AdapterError> {
        match feed {
            Source::Symbol(symbol) => {
                let url = format!("{}/realtime-prices/{}", self.base_url, symbol);
                let text = get_text(&url, &[]).await?;
                parse_realtime(&text)
            }
            Source::Portfolio => {
                let text = self
                    .get_portfolio(PortfolioAuth::Live, LIVE_PERIOD, LIVE_GRANULARITY)
                    .await?;
                parse_portfolio(&text).map(|samples| samples.into_iter().map(|s| s.price).collect())
            }
        }
    }

    async fn get_portfolio(
        &self,
        auth: PortfolioAuth,
        period: &str,
        granularity: &str,
    ) -> Result<String, AdapterError> {
        let credential = self
            .credential
            .as_ref()
            .ok_or(AdapterError::MissingCredential)?;

        let url = format!("{}/portfolio", self.base_url);
        let query = portfolio_query(auth, credential, period, granularity);
        get_text(&url, &query).await
    }
}

fn portfolio_query<'a>(
    auth: PortfolioAuth,
    credential: &'a CredentialRef,
    period: &'a str,
    granularity: &'a str,
) -> [(&'static str, &'a str); 4] {
    let (key_param, secret_param) = auth.param_names();
    [
        (key_param, credential.key()),
        (secret_param, credential.secret()),
        ("period", period),
        ("timeframe", granularity),
    ]
}

async fn get_text(url: &str, query: &[(&str, &str)]) -> Result<String, AdapterError> {
    let response = HTTP_CLIENT.get(url).query(query).send().await?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(AdapterError::NotFound(url.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AdapterError::ServerError {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        });
    }

    Ok(response.text().await?)
}

#[derive(Deserialize)]
struct FetchedSample {
    date: String,
    #[serde(deserialize_with = "de_number")]
    price: f64,
}

/// `[{symbol, date, price, volume}, ...]`, any order
pub fn parse_history(text: &str) -> Result<Vec<Sample>, AdapterError> {
    let fetched: Vec<FetchedSample> = serde_json::from_str(text)
        .map_err(|e| AdapterError::ParseError(format!("Failed to parse history: {e}")))?;

    let mut samples = Vec::with_capacity(fetched.len());
    for item in fetched {
        let Some(time) = parse_date(&item.date) else {
            log::warn!("Skipping history sample with unreadable date {:?}", item.date);
            continue;
        };
        samples.push(Sample::new(time, Price::from_f64(item.price)));
    }

    samples.sort_by_key(|s| s.time);
    Ok(samples)
}

#[derive(Deserialize)]
struct FetchedPortfolio {
    #[serde(alias = "timestamps", default)]
    dates: Vec<serde_json::Value>,
    #[serde(default)]
    prices: Vec<Option<f64>>,
}

/// `{dates | timestamps: [...], prices: [...]}`; null prices are skipped
pub fn parse_portfolio(text: &str) -> Result<Vec<Sample>, AdapterError> {
    let fetched: FetchedPortfolio = serde_json::from_str(text)
        .map_err(|e| AdapterError::ParseError(format!("Failed to parse portfolio: {e}")))?;

    if fetched.dates.len() != fetched.prices.len() {
        log::warn!(
            "Portfolio series length mismatch: {} dates, {} prices",
            fetched.dates.len(),
            fetched.prices.len()
        );
    }

    let mut samples: Vec<Sample> = fetched
        .dates
        .iter()
        .zip(fetched.prices)
        .filter_map(|(date, price)| {
            let price = price.filter(|p| p.is_finite())?;
            let time = match date {
                serde_json::Value::Number(n) => n.as_u64().map(epoch_to_millis),
                serde_json::Value::String(s) => parse_date(s),
                _ => None,
            }?;
            Some(Sample::new(time, Price::from_f64(price)))
        })
        .collect();

    samples.sort_by_key(|s| s.time);
    Ok(samples)
}

#[derive(Deserialize)]
struct FetchedQuote {
    #[serde(deserialize_with = "de_number")]
    price: f64,
}

/// `[{price, ...}, ...]`, newest first
pub fn parse_realtime(text: &str) -> Result<Vec<Price>, AdapterError> {
    let fetched: Vec<FetchedQuote> = serde_json::from_str(text)
        .map_err(|e| AdapterError::ParseError(format!("Failed to parse quote: {e}")))?;

    Ok(fetched
        .into_iter()
        .rev()
        .map(|q| Price::from_f64(q.price))
        .collect())
}

/// Numbers below 10^11 are taken as unix seconds, anything larger as millis
fn epoch_to_millis(raw: u64) -> u64 {
    if raw < 100_000_000_000 {
        raw.saturating_mul(1_000)
    } else {
        raw
    }
}

fn parse_date(raw: &str) -> Option<u64> {
    let raw = raw.trim();

    let millis = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        dt.timestamp_millis()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        dt.and_utc().timestamp_millis()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        dt.and_utc().timestamp_millis()
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis()
    } else {
        return None;
    };

    u64::try_from(millis).ok()
}
