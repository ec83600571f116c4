//! Prompt documents for the two generation calls and the research brief.
//!
//! Everything here is a pure function of its arguments so prompts can be
//! checked without touching any provider.

use super::request::CaseRequest;
use super::themes::{Theme, ThemeSet, detect_themes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    One,
    Two,
}

fn theme_block(theme: Theme) -> Option<&'static str> {
    match theme {
        Theme::Innovation => Some(
            "\n- Analyze the company's innovation management using frameworks such as \
             Three Horizons, Build-Buy-Partner decisions, R&D investments, and startup partnerships.\n\
             - Show clear examples of innovation portfolio management and resource allocation dilemmas.\n",
        ),
        Theme::Financial => Some(
            "\n- Include a deep dive into financial analysis, capital structure, funding rounds, \
             financial ratios, and comparison with competitors.\n",
        ),
        Theme::Strategy => Some(
            "\n- Evaluate strategic alternatives, market positioning, business model evolution, and partnerships.\n",
        ),
        Theme::Leadership => Some(
            "\n- Describe leadership styles, team dynamics, organizational culture, and decision-making frameworks.\n",
        ),
        Theme::Operations => None,
        Theme::Crisis => Some(
            "\n- Analyze crisis events, turnaround management, stakeholder reactions, and risk mitigation strategies.\n",
        ),
        Theme::Ethics => Some(
            "\n- Include analysis of ethical dilemmas, compliance issues, and corporate governance frameworks.\n",
        ),
    }
}

/// Extra instruction blocks for every detected theme, in vocabulary order.
pub fn special_sections(themes: &ThemeSet) -> String {
    themes.iter().filter_map(theme_block).collect()
}

/// One framework hint, picked by priority innovation > financial > strategy.
fn framework_hint(themes: &ThemeSet, part: Part) -> &'static str {
    let priority = [Theme::Innovation, Theme::Financial, Theme::Strategy];
    let Some(theme) = priority.into_iter().find(|t| themes.contains(*t)) else {
        return "";
    };

    match (theme, part) {
        (Theme::Innovation, Part::One) => {
            "- Use Three Horizons, Build/Buy/Partner, and innovation portfolio frameworks where relevant."
        }
        (Theme::Innovation, Part::Two) => {
            "- Continue using Three Horizons and innovation portfolio frameworks."
        }
        (Theme::Financial, Part::One) => {
            "- Include detailed financial ratio and capital structure analysis."
        }
        (Theme::Financial, Part::Two) => {
            "- Continue detailed financial ratio and capital structure analysis."
        }
        (Theme::Strategy, Part::One) => {
            "- Use frameworks like SWOT, Five Forces, and business model analysis."
        }
        (Theme::Strategy, Part::Two) => {
            "- Apply SWOT, Five Forces, and business model analysis as relevant."
        }
        _ => "",
    }
}

fn request_themes(request: &CaseRequest) -> ThemeSet {
    detect_themes(
        &request.case_focus,
        &request.subject,
        &request.learning_outcomes,
    )
}

fn inputs_block(request: &CaseRequest, financials_table: &str, facts: &str) -> String {
    format!(
        "## INPUTS FOR THIS CASE:
Course: {subject}
Learning Outcomes: {outcomes}
Case Focus: {focus}
Company: {company}
Case Type: {case_type}

## FINANCIAL DATA (from Yahoo Finance, millions USD):
{financials_table}

## VERIFIED FACTS AND TIMELINE (from Perplexity):
{facts}",
        subject = request.subject,
        outcomes = request.learning_outcomes,
        focus = request.case_focus,
        company = request.company_reference,
        case_type = request.case_type,
    )
}

/// Prompt for sections 1-3. Stops before the central challenge.
pub fn build_prompt_one(request: &CaseRequest, financials_table: &str, facts: &str) -> String {
    let themes = request_themes(request);
    let extra_sections = special_sections(&themes);
    let frameworks = framework_hint(&themes, Part::One);
    let inputs = inputs_block(request, financials_table, facts);

    format!(
        "
You are a top Harvard Business School case writer.

Your task: Write the FIRST HALF of a full, authentic Harvard MBA case (OPENING, COMPANY BACKGROUND, SITUATION DEVELOPMENT) totaling 2500-3500 words, using ONLY real, source-verified facts and the company’s actual financials.

## STRUCTURE & WORD COUNT:
1. **OPENING** (600-800 words)
   - Set the scene: specific time/place, drama, tension, protagonist, dilemma.
   - Show what’s at stake; use character’s inner thoughts and dialogue.
2. **COMPANY BACKGROUND** (1200-1500 words)
   - Founding, growth, evolution, culture, org structure, major milestones.
   - Leadership profiles, strategic pivots, industry, competitors, positioning.
   - Major financial events, funding rounds, investor profiles.
3. **SITUATION DEVELOPMENT** (1000-1200 words)
   - Chronology of events leading to the challenge.
   - Key decisions, external threats, market shifts, internal changes.
   - Reactions of board, management, employees, market.

{extra_sections}
{frameworks}

**REQUIREMENTS:**
- Use only the real financial data below (see table).
- All facts, dates, names, numbers, quotes, claims MUST be APA7-cited in-text.
- Use a compelling, vivid Harvard narrative.
- DO NOT go beyond SITUATION DEVELOPMENT — stop after that section.

{inputs}

END OF FIRST HALF. (Do not write further sections yet.)
"
    )
}

/// Prompt for sections 4-9. Embeds the first response verbatim so the
/// second half continues the same narrative.
pub fn build_prompt_two(
    request: &CaseRequest,
    financials_table: &str,
    facts: &str,
    prompt_one_response: &str,
) -> String {
    let themes = request_themes(request);
    let extra_sections = special_sections(&themes);
    let frameworks = framework_hint(&themes, Part::Two);
    let inputs = inputs_block(request, financials_table, facts);

    format!(
        "
You are a top Harvard Business School case writer.

Continue the following case with the SECOND HALF. Start with \"CENTRAL CHALLENGE\" and cover all remaining Harvard MBA case sections, totaling 2500-3500 words.

## STRUCTURE & WORD COUNT:
4. **CENTRAL CHALLENGE** (800-1000 words)
   - All alternatives facing protagonist, pros/cons, stakeholders’ interests, financial/operational constraints. NO solution.
5. **SUPPORTING ANALYSIS** (600-800 words)
   - Quantitative analysis, ratios, benchmarks, SWOT, exhibits reference.
6. **CONCLUSION** (500-600 words)
   - Critical decision moment (cliffhanger). Recap, 5 student discussion questions. NO answer.
7. **EXHIBITS** (6–8 tables/charts, real data, APA7 source)
8. **TEACHING NOTES** (1200–1500 words)
   - Executive summary, learning objectives, teaching plan, questions, sample responses, frameworks.
9. **REFERENCES** (20+ APA7, real sources only)

{extra_sections}
{frameworks}

**REQUIREMENTS:**
- Continue in the same style, timeline, narrative and facts as the first half (see below).
- Use only the real financial data below (see table).
- All facts, dates, names, numbers, quotes, claims MUST be APA7-cited in-text.
- Use compelling, vivid Harvard narrative.
- DO NOT recap or repeat previous sections; continue as seamless case.

## CASE PART 1 (reference for consistency):
{prompt_one_response}

{inputs}

**WARNING:**
- This is the final section. Absolutely no solution or answer to the challenge.
- If you lack data for any section, insert “[Not enough data for this section]”.

**BEGIN SECOND HALF.**
"
    )
}

/// Data-collection brief for the research provider.
pub fn build_research_query(request: &CaseRequest, specialized_sections: &str) -> String {
    format!(
        "
COMPREHENSIVE DATA COLLECTION for Harvard Business School case study

COMPANY: {company}
CASE TYPE: {case_type}
FOCUS: {focus}

{specialized_sections}

1. Exact timeline, key events and decisions (with dates)
2. Company/industry verified facts, primary and secondary sources (URLs, authors, date)
3. Key people, stakeholders, decision makers (with background)
4. Financial/market data (with sources)
5. Market, competition, and regulatory context
6. Strategic and operational details
7. Harvard-style references in APA7

Format as numbered, source-attributed facts (not narrative).
",
        company = request.company_reference,
        case_type = request.case_type,
        focus = request.case_focus,
    )
}
