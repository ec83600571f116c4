use super::themes::ThemeSet;

pub const QUALITY_PASS_TEXT: &str = "✅ Case passes core quality checks!";
pub const QUALITY_MISSING_PREFIX: &str = "⚠️ Missing: ";

/// Marker accepted in place of "exhibit" for localised (Ukrainian) output.
const ALT_EXHIBIT_MARKER: &str = "таблиця";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityReport {
    pub missing: Vec<&'static str>,
}

impl QualityReport {
    pub fn passed(&self) -> bool {
        self.missing.is_empty()
    }
}

impl std::fmt::Display for QualityReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.passed() {
            f.write_str(QUALITY_PASS_TEXT)
        } else {
            write!(f, "{QUALITY_MISSING_PREFIX}{}", self.missing.join(", "))
        }
    }
}

/// Heuristic presence checks over a finished case. Advisory only.
pub fn audit(case_text: &str, themes: &ThemeSet) -> QualityReport {
    let lower = case_text.to_lowercase();

    let checks: [(&'static str, bool); 4] = [
        (
            "APA citations",
            case_text.contains('(') && case_text.contains(')'),
        ),
        (
            "Framework mentioned",
            themes.iter().any(|t| lower.contains(t.name())),
        ),
        (
            "Exhibits",
            lower.contains("exhibit") || lower.contains(ALT_EXHIBIT_MARKER),
        ),
        (
            "Finance present",
            case_text.contains('$') || lower.contains("million"),
        ),
    ];

    QualityReport {
        missing: checks
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name)
            .collect(),
    }
}
