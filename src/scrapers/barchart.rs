//! Quote extraction from the barchart.com futures pages
//!
//! The rendered page is only used to establish a session and discover which
//! contracts it lists; the structured prices come from the same core-api
//! call the page itself issues. Each extraction runs in a fresh,
//! call-scoped session (own cookie jar, bounded timeout) that is dropped on
//! every exit path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use serde::Deserialize;

use super::{ExtractionError, QuoteSnapshot, QuoteSource, SourceConfig};
use crate::models::instrument::Instrument;

lazy_static! {
    // Root + month code + two-digit year, e.g. RMX25, KCH26
    static ref CONTRACT_SYMBOL_REGEX: Regex =
        Regex::new(r"^[A-Z]{1,3}[FGHJKMNQUVXZ]\d{2}$").unwrap();
}

const QUOTE_FIELDS: &str =
    "symbol,contractName,openPrice,highPrice,lowPrice,lastPrice,volume,tradeTime,isActive";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct QuotesResponse {
    #[serde(default)]
    count: Option<u32>,
    #[serde(default)]
    total: Option<u32>,
    #[serde(default)]
    data: Vec<RawContractQuote>,
}

// Untrusted external schema: everything beyond the symbol is optional and
// validated before use.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct RawContractQuote {
    symbol: String,
    #[serde(default)]
    contract_name: Option<String>,
    #[serde(default)]
    open_price: Option<f64>,
    #[serde(default)]
    high_price: Option<f64>,
    #[serde(default)]
    low_price: Option<f64>,
    #[serde(default)]
    last_price: Option<f64>,
    #[serde(default)]
    volume: Option<i64>,
    #[serde(default)]
    trade_time: Option<String>,
    #[serde(default)]
    is_active: Option<bool>,
}

pub struct BarchartQuotes {
    config: SourceConfig,
}

impl BarchartQuotes {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    fn quote_page_url(&self, instrument: Instrument) -> String {
        format!(
            "{}/futures/quotes/{}*0/futures-prices",
            self.config.base_url,
            instrument.code()
        )
    }

    fn quotes_api_url(&self) -> String {
        format!("{}/proxies/core-api/v1/quotes/get", self.config.base_url)
    }
}

#[async_trait]
impl QuoteSource for BarchartQuotes {
    async fn fetch_snapshot(
        &self,
        instrument: Instrument,
    ) -> Result<QuoteSnapshot, ExtractionError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .user_agent(BROWSER_USER_AGENT)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        let page_url = self.quote_page_url(instrument);
        tracing::debug!("[{}] loading quote page {}", instrument, page_url);

        let page = client.get(&page_url).send().await?;
        if !page.status().is_success() {
            return Err(ExtractionError::Status(page.status()));
        }
        let html = page.text().await?;

        let symbols = extract_contract_symbols(&html, instrument);
        if symbols.is_empty() {
            return Err(ExtractionError::UnexpectedShape(format!(
                "no {} contract links on quote page",
                instrument
            )));
        }

        let token = xsrf_token(jar.as_ref(), &page_url).ok_or_else(|| {
            ExtractionError::Session("XSRF cookie missing after page load".to_string())
        })?;

        tracing::debug!(
            "[{}] requesting quotes for {} contracts",
            instrument,
            symbols.len()
        );

        let response = client
            .get(self.quotes_api_url())
            .header("x-xsrf-token", token)
            .header("accept", "application/json")
            .query(&[
                ("symbols", symbols.join(",").as_str()),
                ("fields", QUOTE_FIELDS),
                ("raw", "1"),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ExtractionError::Status(response.status()));
        }

        let body = response.text().await?;
        let payload: QuotesResponse =
            serde_json::from_str(&body).map_err(|e| ExtractionError::UnexpectedShape(e.to_string()))?;

        let active = select_active_contract(payload.data, instrument)?;
        snapshot_from_raw(active, instrument)
    }
}

/// Contract symbols the rendered page links to, restricted to the
/// instrument's root.
fn extract_contract_symbols(html: &str, instrument: Instrument) -> Vec<String> {
    let mut symbols = Vec::new();
    let document = Html::parse_document(html);

    if let Ok(selector) = Selector::parse("a[href*='/futures/quotes/']") {
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(tail) = href.split("/futures/quotes/").nth(1) {
                    let symbol = tail
                        .split(|c| c == '/' || c == '?')
                        .next()
                        .unwrap_or(tail)
                        .to_uppercase();
                    if is_contract_of(&symbol, instrument) {
                        symbols.push(symbol);
                    }
                }
            }
        }
    }

    symbols.sort();
    symbols.dedup();
    symbols
}

fn is_contract_of(symbol: &str, instrument: Instrument) -> bool {
    symbol.len() == instrument.code().len() + 3
        && symbol.starts_with(instrument.code())
        && CONTRACT_SYMBOL_REGEX.is_match(symbol)
}

/// The quote API rejects calls without the session's XSRF token echoed back
/// in a header.
fn xsrf_token(jar: &Jar, page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    let header = jar.cookies(&url)?;
    let cookies = header.to_str().ok()?.to_string();

    for cookie in cookies.split("; ") {
        if let Some(value) = cookie.strip_prefix("XSRF-TOKEN=") {
            return Some(decode_cookie_value(value));
        }
    }
    None
}

// The token is stored percent-encoded; the header wants it decoded.
fn decode_cookie_value(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(decoded) = u8::from_str_radix(&raw[i + 1..i + 3], 16) {
                out.push(decoded);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn select_active_contract(
    quotes: Vec<RawContractQuote>,
    instrument: Instrument,
) -> Result<RawContractQuote, ExtractionError> {
    quotes
        .into_iter()
        .find(|quote| quote.is_active.unwrap_or(false) && is_contract_of(&quote.symbol, instrument))
        .ok_or(ExtractionError::NoActiveContract(instrument))
}

fn snapshot_from_raw(
    raw: RawContractQuote,
    instrument: Instrument,
) -> Result<QuoteSnapshot, ExtractionError> {
    let open = require_price("openPrice", raw.open_price)?;
    let high = require_price("highPrice", raw.high_price)?;
    let low = require_price("lowPrice", raw.low_price)?;
    let close = require_price("lastPrice", raw.last_price)?;

    let volume = raw.volume.ok_or_else(|| {
        ExtractionError::UnexpectedShape("volume missing on active contract".to_string())
    })?;
    if volume < 0 {
        return Err(ExtractionError::UnexpectedShape(format!(
            "negative volume on active contract: {}",
            volume
        )));
    }

    let trade_time = raw.trade_time.ok_or_else(|| {
        ExtractionError::UnexpectedShape("tradeTime missing on active contract".to_string())
    })?;
    let date_part = trade_time
        .split(|c| c == 'T' || c == ' ')
        .next()
        .unwrap_or(trade_time.as_str());
    let trade_date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| {
        ExtractionError::UnexpectedShape(format!("unparseable tradeTime: {}", trade_time))
    })?;

    Ok(QuoteSnapshot {
        instrument,
        trade_date,
        open,
        high,
        low,
        close,
        volume,
    })
}

fn require_price(field: &str, value: Option<f64>) -> Result<Decimal, ExtractionError> {
    let value = value.ok_or_else(|| {
        ExtractionError::UnexpectedShape(format!("{} missing on active contract", field))
    })?;
    if !value.is_finite() || value <= 0.0 {
        return Err(ExtractionError::UnexpectedShape(format!(
            "{} is not a positive price: {}",
            field, value
        )));
    }
    Decimal::from_f64_retain(value).ok_or_else(|| {
        ExtractionError::UnexpectedShape(format!("{} is not representable: {}", field, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const FIXTURE: &str = r#"{
        "count": 3,
        "total": 3,
        "data": [
            {
                "symbol": "RMX25",
                "contractName": "Robusta Coffee 10-T",
                "openPrice": 4510.0,
                "highPrice": 4575.0,
                "lowPrice": 4480.0,
                "lastPrice": 4520.0,
                "volume": 180,
                "tradeTime": "2026-08-07",
                "isActive": false
            },
            {
                "symbol": "RMU26",
                "contractName": "Robusta Coffee 10-T",
                "openPrice": 4390.0,
                "highPrice": 4460.0,
                "lowPrice": 4370.0,
                "lastPrice": 4420.0,
                "volume": 9541,
                "tradeTime": "2026-08-07T17:30:00",
                "isActive": true
            },
            {
                "symbol": "KCZ26",
                "contractName": "Coffee",
                "openPrice": 331.5,
                "highPrice": 335.0,
                "lowPrice": 329.1,
                "lastPrice": 333.4,
                "volume": 22140,
                "tradeTime": "2026-08-07",
                "isActive": true
            }
        ]
    }"#;

    fn fixture_quotes() -> Vec<RawContractQuote> {
        serde_json::from_str::<QuotesResponse>(FIXTURE).unwrap().data
    }

    #[test]
    fn test_select_active_contract_by_root() {
        let active = select_active_contract(fixture_quotes(), Instrument::Robusta).unwrap();
        assert_eq!(active.symbol, "RMU26");

        let active = select_active_contract(fixture_quotes(), Instrument::Arabica).unwrap();
        assert_eq!(active.symbol, "KCZ26");
    }

    #[test]
    fn test_no_active_contract_is_an_error() {
        let quotes: Vec<RawContractQuote> = fixture_quotes()
            .into_iter()
            .map(|mut q| {
                q.is_active = Some(false);
                q
            })
            .collect();

        let result = select_active_contract(quotes, Instrument::Robusta);
        assert!(matches!(result, Err(ExtractionError::NoActiveContract(_))));
    }

    #[test]
    fn test_snapshot_from_raw() {
        let active = select_active_contract(fixture_quotes(), Instrument::Robusta).unwrap();
        let snapshot = snapshot_from_raw(active, Instrument::Robusta).unwrap();

        assert_eq!(snapshot.instrument, Instrument::Robusta);
        assert_eq!(
            snapshot.trade_date,
            NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
        );
        assert_eq!(snapshot.open, dec!(4390));
        assert_eq!(snapshot.high, dec!(4460));
        assert_eq!(snapshot.low, dec!(4370));
        assert_eq!(snapshot.close, dec!(4420));
        assert_eq!(snapshot.volume, 9541);
    }

    #[test]
    fn test_missing_close_is_rejected() {
        let mut active = select_active_contract(fixture_quotes(), Instrument::Robusta).unwrap();
        active.last_price = None;

        let result = snapshot_from_raw(active, Instrument::Robusta);
        assert!(matches!(result, Err(ExtractionError::UnexpectedShape(_))));
    }

    #[test]
    fn test_unparseable_trade_time_is_rejected() {
        let mut active = select_active_contract(fixture_quotes(), Instrument::Robusta).unwrap();
        active.trade_time = Some("soon".to_string());

        let result = snapshot_from_raw(active, Instrument::Robusta);
        assert!(matches!(result, Err(ExtractionError::UnexpectedShape(_))));
    }

    #[test]
    fn test_extract_contract_symbols() {
        let html = r#"
            <table>
              <a href="/futures/quotes/RMX25/overview">Robusta Nov '25</a>
              <a href="/futures/quotes/RMF26/overview?tab=prices">Robusta Jan '26</a>
              <a href="/futures/quotes/RMF26/overview">Robusta Jan '26</a>
              <a href="/futures/quotes/KCZ25/overview">Arabica Dec '25</a>
              <a href="/futures/quotes/RM*0/futures-prices">Continuous</a>
            </table>
        "#;

        let symbols = extract_contract_symbols(html, Instrument::Robusta);
        assert_eq!(symbols, vec!["RMF26", "RMX25"]);

        let symbols = extract_contract_symbols(html, Instrument::Arabica);
        assert_eq!(symbols, vec!["KCZ25"]);
    }

    #[test]
    fn test_decode_cookie_value() {
        assert_eq!(decode_cookie_value("abc123"), "abc123");
        assert_eq!(decode_cookie_value("eyJpdiI6%3D%3D"), "eyJpdiI6==");
        assert_eq!(decode_cookie_value("a%2Bb%20c"), "a+b c");
    }
}
