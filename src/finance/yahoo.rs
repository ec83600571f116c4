use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

use super::{FinancialDataSource, FinancialRecord, Metric, YearFigures};

const TIMESERIES_URL: &str =
    "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) case-generator/1.0";
pub const MAX_LOOKBACK_YEARS: usize = 50;

fn series_name(metric: Metric) -> &'static str {
    match metric {
        Metric::Revenue => "annualTotalRevenue",
        Metric::NetIncome => "annualNetIncome",
        Metric::OperatingIncome => "annualOperatingIncome",
        Metric::GrossProfit => "annualGrossProfit",
        Metric::CashFlow => "annualOperatingCashFlow",
        Metric::TotalAssets => "annualTotalAssets",
        Metric::TotalLiabilities => "annualTotalLiabilitiesNetMinorityInterest",
        Metric::ShareholderEquity => "annualStockholdersEquity",
    }
}

/// Annual statements from the Yahoo Finance fundamentals timeseries API.
pub struct YahooFinanceSource {
    client: reqwest::Client,
}

impl YahooFinanceSource {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    async fn fetch_raw(&self, ticker: &str, years: usize) -> Result<String, reqwest::Error> {
        let types = Metric::ALL
            .iter()
            .map(|&m| series_name(m))
            .collect::<Vec<_>>()
            .join(",");

        let now = Utc::now();
        let period1 = period_start(now.year(), years);
        let period2 = now.timestamp();

        self.client
            .get(format!("{TIMESERIES_URL}/{ticker}"))
            .query(&[
                ("symbol", ticker.to_string()),
                ("type", types),
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }
}

/// Start of the query window: January 1st, `years + 1` years back, with the
/// lookback capped at [`MAX_LOOKBACK_YEARS`].
fn period_start(current_year: i32, years: usize) -> i64 {
    let lookback = years.min(MAX_LOOKBACK_YEARS) as i32;
    NaiveDate::from_ymd_opt(current_year - lookback - 1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}

impl Default for YahooFinanceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FinancialDataSource for YahooFinanceSource {
    #[tracing::instrument(
        name = "finance yahoo",
        skip(self),
        fields(finance.years_found)
    )]
    async fn fetch(&self, ticker: &str, years: usize) -> FinancialRecord {
        let record = match self.fetch_raw(ticker, years).await {
            Ok(body) => parse_timeseries(&body, years).unwrap_or_else(FinancialRecord::Unavailable),
            Err(err) => FinancialRecord::Unavailable(err.to_string()),
        };

        match &record {
            FinancialRecord::Reported(rows) => {
                tracing::Span::current().record("finance.years_found", rows.len());
            }
            FinancialRecord::Unavailable(reason) => {
                tracing::warn!(ticker, reason = %reason, "financial data unavailable");
            }
        }
        record
    }
}

#[derive(Deserialize)]
struct Envelope {
    timeseries: Timeseries,
}

#[derive(Deserialize)]
struct Timeseries {
    #[serde(default)]
    result: Vec<SeriesResult>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct SeriesResult {
    meta: SeriesMeta,
    #[serde(flatten)]
    series: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct SeriesMeta {
    #[serde(rename = "type", default)]
    types: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Observation {
    as_of_date: String,
    reported_value: Option<ReportedValue>,
}

#[derive(Deserialize)]
struct ReportedValue {
    raw: Option<f64>,
}

/// Folds the per-metric series into year rows, most recent year first,
/// keeping at most `years` rows.
fn parse_timeseries(body: &str, years: usize) -> Result<FinancialRecord, String> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| format!("invalid timeseries payload: {e}"))?;

    if let Some(error) = envelope.timeseries.error.filter(|e| !e.is_null()) {
        return Err(format!("timeseries error: {error}"));
    }

    let metric_by_series: HashMap<&str, Metric> =
        Metric::ALL.iter().map(|&m| (series_name(m), m)).collect();

    let mut by_year: BTreeMap<String, YearFigures> = BTreeMap::new();
    for result in envelope.timeseries.result {
        let Some(series_type) = result.meta.types.first() else {
            continue;
        };
        let Some(&metric) = metric_by_series.get(series_type.as_str()) else {
            continue;
        };
        let Some(raw_points) = result.series.get(series_type) else {
            continue;
        };
        let points: Vec<Option<Observation>> = match serde_json::from_value(raw_points.clone())
        {
            Ok(points) => points,
            Err(err) => {
                tracing::debug!(series = %series_type, error = %err, "skipping malformed series");
                continue;
            }
        };

        for point in points.into_iter().flatten() {
            let Some(value) = point.reported_value.and_then(|v| v.raw) else {
                continue;
            };
            let year: String = point.as_of_date.chars().take(4).collect();
            by_year
                .entry(year.clone())
                .or_insert_with(|| YearFigures::new(year))
                .set(metric, value);
        }
    }

    Ok(FinancialRecord::Reported(
        by_year.into_values().rev().take(years).collect(),
    ))
}
