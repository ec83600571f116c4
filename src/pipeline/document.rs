use std::fmt;

use uuid::Uuid;

use super::quality::{QualityReport, audit};
use super::themes::ThemeSet;

/// The finished two-part case with its trailing annotation.
#[derive(Debug, Clone)]
pub struct CaseDocument {
    pub id: Uuid,
    pub body: String,
    pub word_count: usize,
    pub quality: QualityReport,
}

impl CaseDocument {
    /// Joins both halves with a blank line, counts whitespace-separated
    /// words and runs the quality audit over the joined body.
    pub fn assemble(id: Uuid, part_one: &str, part_two: &str, themes: &ThemeSet) -> Self {
        let body = format!("{}\n\n{}", part_one.trim(), part_two.trim());
        let word_count = body.split_whitespace().count();
        let quality = audit(&body, themes);

        Self {
            id,
            body,
            word_count,
            quality,
        }
    }
}

impl fmt::Display for CaseDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n\n[Word count: {}]\n{}",
            self.body, self.word_count, self.quality
        )
    }
}
