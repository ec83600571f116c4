use serde::{Deserialize, Serialize};

/// Case types offered to callers. Free text is still accepted.
pub const CASE_TYPES: [&str; 10] = [
    "Decision-making case",
    "Problem-solving case",
    "Leadership/Teamwork case",
    "Crisis management case",
    "Innovation/Change case",
    "Ethics case",
    "Valuation case",
    "Capital Structure case",
    "Investment Decision case",
    "Financial Crisis case",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRequest {
    pub subject: String,
    pub learning_outcomes: String,
    pub case_focus: String,
    pub company_reference: String,
    pub case_type: String,
}
