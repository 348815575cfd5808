//! Daily adjusted closes from the Yahoo Finance chart endpoint.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::data::PriceSource;
use crate::domain::{PriceSeries, TimeSeries};
use crate::error::AppError;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (letf-sim)";

pub struct YahooClient {
    client: Client,
}

impl YahooClient {
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl PriceSource for YahooClient {
    fn fetch_prices(
        &self,
        ticker: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, AppError> {
        let period1 = start.map_or(0, unix_seconds);
        // `period2` is exclusive; include the whole end day.
        let period2 = end
            .and_then(|d| d.succ_opt())
            .map_or_else(|| chrono::Utc::now().timestamp(), unix_seconds);

        let url = format!("{BASE_URL}/{ticker}");
        debug!(ticker, period1, period2, "requesting Yahoo chart");
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,splits".to_string()),
            ])
            .send()
            .map_err(|e| AppError::new(4, format!("Yahoo request for {ticker} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Yahoo request for {ticker} failed with status {}.", resp.status()),
            ));
        }

        let body: ChartResponse = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse Yahoo response: {e}")))?;

        let series = prices_from_chart(ticker, body)?.between(start, end);
        info!(ticker, rows = series.len(), "fetched Yahoo prices");
        Ok(series)
    }
}

fn unix_seconds(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Prefer adjusted closes; days with a missing or non-positive price are skipped.
fn prices_from_chart(ticker: &str, body: ChartResponse) -> Result<PriceSeries, AppError> {
    if let Some(err) = body.chart.error {
        return Err(AppError::new(
            4,
            format!("Yahoo error for {ticker}: {} ({})", err.description, err.code),
        ));
    }
    let result = body
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
        .ok_or_else(|| AppError::new(4, format!("No chart data returned for {ticker}.")))?;

    let closes = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|a| a.adjclose)
        .filter(|v| !v.is_empty())
        .or_else(|| result.indicators.quote.into_iter().next().map(|q| q.close))
        .unwrap_or_default();

    // Yahoo occasionally repeats a bar (e.g. a live bar next to the settled
    // one); the later bar wins.
    let mut by_date = BTreeMap::new();
    for (ts, close) in result.timestamp.iter().zip(closes) {
        let Some(price) = close.filter(|p| p.is_finite() && *p > 0.0) else {
            continue;
        };
        let Some(dt) = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0) else {
            continue;
        };
        let date = dt.date_naive();
        if by_date.insert(date, price).is_some() {
            debug!(ticker, %date, "duplicate Yahoo bar; keeping the later one");
        }
    }

    Ok(TimeSeries::from_ordered(by_date.into_iter().collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_adjusted_closes_and_skips_gaps() {
        // 2021-08-30 and 2021-08-31 13:30 UTC (09:30 New York).
        let json = r#"{"chart": {"result": [{
            "meta": {"symbol": "^IXIC", "gmtoffset": -14400},
            "timestamp": [1630330200, 1630416600, 1630503000],
            "indicators": {
                "quote": [{"close": [15265.9, 15259.2, 15309.4]}],
                "adjclose": [{"adjclose": [15265.89, null, 15309.38]}]
            }
        }], "error": null}}"#;
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        let prices = prices_from_chart("^IXIC", body).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices.first_date(), NaiveDate::from_ymd_opt(2021, 8, 30));
        assert_eq!(prices.last().unwrap().1, 15309.38);
    }

    #[test]
    fn repeated_bars_keep_the_later_price() {
        // The last two timestamps fall on the same New York trading day.
        let json = r#"{"chart": {"result": [{
            "meta": {"symbol": "TQQQ", "gmtoffset": -14400},
            "timestamp": [1630330200, 1630416600, 1630440000],
            "indicators": {
                "quote": [{"close": [100.0, 101.0, 102.5]}]
            }
        }], "error": null}}"#;
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        let prices = prices_from_chart("TQQQ", body).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices.get(NaiveDate::from_ymd_opt(2021, 8, 31).unwrap()), Some(&102.5));
    }

    #[test]
    fn chart_errors_surface_as_upstream_failures() {
        let json = r#"{"chart": {"result": null,
            "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        let err = prices_from_chart("NOPE", body).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("delisted"));
    }
}
