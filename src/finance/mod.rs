pub mod table;
pub mod ticker;
pub mod yahoo;

pub use table::{NO_FINANCIAL_DATA_TEXT, format_table};
pub use ticker::resolve_ticker;
pub use yahoo::YahooFinanceSource;

/// The eight reported figures tracked per year, in table column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Revenue,
    NetIncome,
    OperatingIncome,
    GrossProfit,
    CashFlow,
    TotalAssets,
    TotalLiabilities,
    ShareholderEquity,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::Revenue,
        Metric::NetIncome,
        Metric::OperatingIncome,
        Metric::GrossProfit,
        Metric::CashFlow,
        Metric::TotalAssets,
        Metric::TotalLiabilities,
        Metric::ShareholderEquity,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Revenue => "Revenue",
            Metric::NetIncome => "Net Income",
            Metric::OperatingIncome => "Operating Income",
            Metric::GrossProfit => "Gross Profit",
            Metric::CashFlow => "Cash Flow",
            Metric::TotalAssets => "Total Assets",
            Metric::TotalLiabilities => "Total Liabilities",
            Metric::ShareholderEquity => "Shareholder Equity",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Reported figures for one fiscal year. Any metric may be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct YearFigures {
    pub year: String,
    values: [Option<f64>; 8],
}

impl YearFigures {
    pub fn new(year: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            values: [None; 8],
        }
    }

    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, value);
        self
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        self.values[metric.index()] = Some(value);
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values[metric.index()]
    }
}

/// Sparse per-year financial snapshot for one company.
///
/// `Reported` keeps years in the order the source produced them; the table
/// renders them in that order. `Unavailable` is the upstream-failure sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum FinancialRecord {
    Reported(Vec<YearFigures>),
    Unavailable(String),
}

impl FinancialRecord {
    pub fn empty() -> Self {
        FinancialRecord::Reported(Vec::new())
    }

    pub fn has_data(&self) -> bool {
        matches!(self, FinancialRecord::Reported(years) if !years.is_empty())
    }
}

impl Default for FinancialRecord {
    fn default() -> Self {
        Self::empty()
    }
}

/// Financial-data collaborator. Failures are folded into
/// [`FinancialRecord::Unavailable`] rather than returned as errors.
#[async_trait::async_trait]
pub trait FinancialDataSource: Send + Sync {
    async fn fetch(&self, ticker: &str, years: usize) -> FinancialRecord;
}
