/// Known companies, checked in this order. First match wins.
const COMPANY_TICKERS: &[(&str, &str)] = &[
    ("Netflix", "NFLX"),
    ("Apple", "AAPL"),
    ("Microsoft", "MSFT"),
    ("Tesla", "TSLA"),
    ("Amazon", "AMZN"),
    ("Meta", "META"),
    ("Google", "GOOGL"),
    ("Alphabet", "GOOGL"),
];

/// Looks for a known company name anywhere in `company_reference`,
/// ignoring case. `None` means no financial lookup should be attempted.
pub fn resolve_ticker(company_reference: &str) -> Option<&'static str> {
    let reference = company_reference.to_lowercase();
    COMPANY_TICKERS
        .iter()
        .find(|(name, _)| reference.contains(&name.to_lowercase()))
        .map(|(_, ticker)| *ticker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_embedded_names_case_insensitively() {
        let cases = vec![
            ("Netflix (innovation strategy decisions in 2025)", "NFLX"),
            ("NETFLIX", "NFLX"),
            ("the apple inc. supply chain", "AAPL"),
            ("MicroSoft Azure", "MSFT"),
            ("tesla", "TSLA"),
            ("Amazon Web Services", "AMZN"),
            ("Meta Platforms", "META"),
            ("Alphabet / Google", "GOOGL"),
            ("alphabet", "GOOGL"),
        ];
        for (input, expected) in cases {
            assert_eq!(resolve_ticker(input), Some(expected), "{input}");
        }
    }

    #[test]
    fn test_declaration_order_breaks_ties() {
        assert_eq!(resolve_ticker("Apple vs Netflix"), Some("NFLX"));
        assert_eq!(resolve_ticker("Tesla and Microsoft"), Some("MSFT"));
    }

    #[test]
    fn test_substring_match_is_not_word_bounded() {
        assert_eq!(resolve_ticker("metadata startups"), Some("META"));
    }

    #[test]
    fn test_unknown_company_returns_none() {
        assert_eq!(resolve_ticker("Spotify"), None);
        assert_eq!(resolve_ticker(""), None);
    }
}
