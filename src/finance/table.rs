use super::{FinancialRecord, Metric, YearFigures};

pub const NO_FINANCIAL_DATA_TEXT: &str = "No financial data available.";

const PLACEHOLDER: &str = "-";
const SEPARATOR: &str = " | ";

/// Renders a record as a pipe-delimited table in millions.
///
/// Zero and NaN values print as the placeholder, same as missing ones.
/// Callers cannot tell a reported zero from an absent figure.
pub fn format_table(record: &FinancialRecord) -> String {
    let years = match record {
        FinancialRecord::Reported(years) if !years.is_empty() => years,
        _ => return NO_FINANCIAL_DATA_TEXT.to_string(),
    };

    let header = std::iter::once("Year")
        .chain(Metric::ALL.iter().map(|m| m.label()))
        .collect::<Vec<_>>()
        .join(SEPARATOR);

    let mut lines = Vec::with_capacity(years.len() + 1);
    lines.push(header);
    lines.extend(years.iter().map(format_row));
    lines.join("\n")
}

fn format_row(figures: &YearFigures) -> String {
    std::iter::once(figures.year.clone())
        .chain(Metric::ALL.iter().map(|&m| format_cell(figures.get(m))))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) if v != 0.0 && !v.is_nan() => format!("{:.2}", v / 1_000_000.0),
        _ => PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> FinancialRecord {
        FinancialRecord::Reported(vec![
            YearFigures::new("2024")
                .with(Metric::Revenue, 39_000_966_000.0)
                .with(Metric::NetIncome, 8_711_631_000.0)
                .with(Metric::TotalAssets, 53_630_374_000.0),
            YearFigures::new("2023")
                .with(Metric::Revenue, 33_723_297_000.0)
                .with(Metric::GrossProfit, 0.0),
        ])
    }

    #[test]
    fn test_empty_and_unavailable_records() {
        assert_eq!(format_table(&FinancialRecord::empty()), NO_FINANCIAL_DATA_TEXT);
        assert_eq!(
            format_table(&FinancialRecord::Unavailable("HTTP 404".into())),
            NO_FINANCIAL_DATA_TEXT
        );
    }

    #[test]
    fn test_header_and_rows() {
        let table = format_table(&sample_record());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Year | Revenue | Net Income | Operating Income | Gross Profit | Cash Flow | Total Assets | Total Liabilities | Shareholder Equity"
        );
        assert_eq!(lines[1], "2024 | 39000.97 | 8711.63 | - | - | - | 53630.37 | - | -");
        assert_eq!(lines[2], "2023 | 33723.30 | - | - | - | - | - | - | -");
    }

    #[test]
    fn test_year_order_follows_record() {
        let record = FinancialRecord::Reported(vec![
            YearFigures::new("2021"),
            YearFigures::new("2023"),
            YearFigures::new("2022"),
        ]);
        let years: Vec<String> = format_table(&record)
            .lines()
            .skip(1)
            .map(|l| l.split(SEPARATOR).next().unwrap().to_string())
            .collect();
        assert_eq!(years, vec!["2021", "2023", "2022"]);
    }

    #[test]
    fn test_zero_and_nan_render_as_placeholder() {
        assert_eq!(format_cell(Some(0.0)), "-");
        assert_eq!(format_cell(Some(f64::NAN)), "-");
        assert_eq!(format_cell(None), "-");
        assert_eq!(format_cell(Some(-1_250_000.0)), "-1.25");
    }

    #[test]
    fn test_formatting_is_deterministic() {
        let record = sample_record();
        assert_eq!(format_table(&record), format_table(&record));
    }
}
