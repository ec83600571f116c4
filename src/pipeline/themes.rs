use std::fmt;

/// Thematic emphasis of a case request. Declaration order is significant:
/// it fixes both the order of a [`ThemeSet`] and the prompt block order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    Innovation,
    Financial,
    Strategy,
    Leadership,
    Operations,
    Crisis,
    Ethics,
}

impl Theme {
    pub const ALL: [Theme; 7] = [
        Theme::Innovation,
        Theme::Financial,
        Theme::Strategy,
        Theme::Leadership,
        Theme::Operations,
        Theme::Crisis,
        Theme::Ethics,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Theme::Innovation => "innovation",
            Theme::Financial => "financial",
            Theme::Strategy => "strategy",
            Theme::Leadership => "leadership",
            Theme::Operations => "operations",
            Theme::Crisis => "crisis",
            Theme::Ethics => "ethics",
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Theme::Innovation => &[
                "innovation",
                "r&d",
                "startup",
                "disruption",
                "technology",
                "digital",
            ],
            Theme::Financial => &[
                "valuation",
                "capital",
                "investment",
                "financial",
                "funding",
                "finance",
            ],
            Theme::Strategy => &[
                "strategy",
                "competitive",
                "market",
                "positioning",
                "business model",
            ],
            Theme::Leadership => &["leadership", "management", "culture", "team"],
            Theme::Operations => &["operations", "supply chain", "efficiency", "process"],
            Theme::Crisis => &[
                "crisis",
                "turnaround",
                "emergency",
                "challenge",
                "restructuring",
            ],
            Theme::Ethics => &["ethics", "responsibility", "compliance", "governance"],
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Detected themes, always in [`Theme::ALL`] order and without repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeSet(Vec<Theme>);

impl ThemeSet {
    pub fn contains(&self, theme: Theme) -> bool {
        self.0.contains(&theme)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Theme> + '_ {
        self.0.iter().copied()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(Theme::name).collect()
    }
}

impl FromIterator<Theme> for ThemeSet {
    /// Normalises arbitrary input into vocabulary order.
    fn from_iter<I: IntoIterator<Item = Theme>>(iter: I) -> Self {
        let wanted: Vec<Theme> = iter.into_iter().collect();
        ThemeSet(
            Theme::ALL
                .into_iter()
                .filter(|t| wanted.contains(t))
                .collect(),
        )
    }
}

/// Plain substring matching over the lower-cased request text; no
/// tokenisation, so "team" also matches "steam".
pub fn detect_themes(case_focus: &str, subject: &str, learning_outcomes: &str) -> ThemeSet {
    let combined = format!("{case_focus} {subject} {learning_outcomes}").to_lowercase();
    Theme::ALL
        .into_iter()
        .filter(|theme| theme.keywords().iter().any(|kw| combined.contains(kw)))
        .collect()
}
