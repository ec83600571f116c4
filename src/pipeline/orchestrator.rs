use std::sync::Arc;
use std::time::Instant;

use opentelemetry::KeyValue;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::finance::{
    FinancialDataSource, FinancialRecord, YahooFinanceSource, format_table, resolve_ticker,
};
use crate::llm::LlmClient;
use crate::research::{FactSource, PerplexityResearcher};
use crate::telemetry::metrics::{
    CASE_GENERATION_DURATION, CASE_QUALITY_MISSING, CASE_WORD_COUNT, FINANCIAL_DATA_UNAVAILABLE,
};

use super::document::CaseDocument;
use super::prompts;
use super::request::CaseRequest;
use super::themes::detect_themes;

pub const FAILURE_PREFIX: &str = "Error during case generation: ";

/// Displayable case text plus the id it was traced under.
#[derive(Debug, Clone)]
pub struct GeneratedCase {
    pub id: Uuid,
    pub text: String,
}

/// Aborts the wrapped task when the awaiting caller goes away.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs the full case pipeline for one request.
///
/// Cheap to clone; every collaborator sits behind an `Arc` and nothing is
/// shared mutably between requests.
#[derive(Clone)]
pub struct CaseOrchestrator {
    financials: Arc<dyn FinancialDataSource>,
    research: Arc<dyn FactSource>,
    llm: Arc<LlmClient>,
    financial_years: usize,
}

impl CaseOrchestrator {
    pub fn new(
        config: &Config,
        financials: Arc<dyn FinancialDataSource>,
        research: Arc<dyn FactSource>,
        llm: Arc<LlmClient>,
    ) -> Self {
        Self {
            financials,
            research,
            llm,
            financial_years: config.financial_years,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config,
            Arc::new(YahooFinanceSource::new()),
            Arc::new(PerplexityResearcher::new(
                config.perplexity_api_key.as_deref(),
                &config.research_model,
            )),
            Arc::new(LlmClient::from_config(config)),
        )
    }

    /// Always returns displayable text. Errors and panics inside the
    /// pipeline become a single `Error during case generation` line.
    pub async fn generate(&self, request: &CaseRequest) -> String {
        self.generate_case(request).await.text
    }

    /// Like [`generate`](Self::generate), but also hands back the case id
    /// recorded on the `pipeline case` span.
    ///
    /// The pipeline runs on its own task so a panic surfaces as a
    /// `JoinError`. Dropping the returned future aborts that task, so an
    /// abandoned request makes no further provider calls.
    pub async fn generate_case(&self, request: &CaseRequest) -> GeneratedCase {
        let id = Uuid::new_v4();
        let this = self.clone();
        let request = request.clone();
        let mut task = AbortOnDrop(tokio::spawn(
            async move { this.run(&request, id).await }.in_current_span(),
        ));

        let outcome = match (&mut task.0).await {
            Ok(result) => result,
            Err(join_err) => Err(AppError::Pipeline(join_err.to_string())),
        };

        let text = match outcome {
            Ok(document) => document.to_string(),
            Err(err) => {
                tracing::error!(case.id = %id, error = %err, "case generation failed");
                format!("{FAILURE_PREFIX}{err}")
            }
        };
        GeneratedCase { id, text }
    }

    #[tracing::instrument(
        name = "pipeline case",
        skip(self, request, id),
        fields(
            case.id = %id,
            case.company = %request.company_reference,
            case.ticker,
            case.themes,
            case.word_count,
            case.duration_ms,
        )
    )]
    pub async fn run(&self, request: &CaseRequest, id: Uuid) -> Result<CaseDocument, AppError> {
        let start = Instant::now();
        let span = tracing::Span::current();

        // Stage 1: financial table and research facts are independent
        let ticker = resolve_ticker(&request.company_reference);
        if let Some(ticker) = ticker {
            span.record("case.ticker", ticker);
        }
        let (financials_table, facts) =
            tokio::join!(self.financial_table(ticker), self.research_facts(request));

        let themes = detect_themes(
            &request.case_focus,
            &request.subject,
            &request.learning_outcomes,
        );
        span.record("case.themes", themes.names().join(",").as_str());

        // Stage 2: first half
        let prompt_one = prompts::build_prompt_one(request, &financials_table, &facts);
        let part_one = self.llm.complete("part_one", prompt_one).await?;

        // Stage 3: second half, chained on the first half's text
        let prompt_two = prompts::build_prompt_two(request, &financials_table, &facts, &part_one);
        let part_two = self.llm.complete("part_two", prompt_two).await?;

        // Stage 4: assemble and annotate
        let document = CaseDocument::assemble(id, &part_one, &part_two, &themes);

        let duration = start.elapsed();
        CASE_GENERATION_DURATION.record(duration.as_secs_f64(), &[]);
        CASE_WORD_COUNT.record(document.word_count as f64, &[]);
        for check in &document.quality.missing {
            CASE_QUALITY_MISSING.add(1, &[KeyValue::new("case.quality.check", *check)]);
        }

        span.record("case.word_count", document.word_count);
        span.record("case.duration_ms", duration.as_millis() as u64);

        tracing::info!(
            word_count = document.word_count,
            quality_passed = document.quality.passed(),
            "case generated"
        );

        Ok(document)
    }

    #[tracing::instrument(
        name = "pipeline_stage financials",
        skip(self),
        fields(pipeline.stage = "financials", finance.available)
    )]
    async fn financial_table(&self, ticker: Option<&str>) -> String {
        let record = match ticker {
            Some(ticker) => self.financials.fetch(ticker, self.financial_years).await,
            None => FinancialRecord::empty(),
        };

        if let FinancialRecord::Unavailable(reason) = &record {
            FINANCIAL_DATA_UNAVAILABLE.add(1, &[]);
            tracing::debug!(reason = %reason, "continuing without financial data");
        }
        tracing::Span::current().record("finance.available", record.has_data());

        format_table(&record)
    }

    #[tracing::instrument(
        name = "pipeline_stage research",
        skip(self, request),
        fields(pipeline.stage = "research")
    )]
    async fn research_facts(&self, request: &CaseRequest) -> String {
        let query = prompts::build_research_query(request, "");
        self.research.search(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::finance::{Metric, NO_FINANCIAL_DATA_TEXT, YearFigures};
    use crate::llm::{GenerateRequest, GenerateResponse, Provider, ProviderError};
    use crate::pipeline::quality::QUALITY_MISSING_PREFIX;
    use crate::research::{MISSING_KEY_TEXT as RESEARCH_MISSING_KEY, NO_DATA_TEXT};

    #[derive(Default)]
    struct StubFinancials {
        calls: Mutex<Vec<(String, usize)>>,
        record: Option<FinancialRecord>,
    }

    #[async_trait::async_trait]
    impl FinancialDataSource for StubFinancials {
        async fn fetch(&self, ticker: &str, years: usize) -> FinancialRecord {
            self.calls.lock().unwrap().push((ticker.to_string(), years));
            self.record.clone().unwrap_or_default()
        }
    }

    struct StubResearch {
        answer: String,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl FactSource for StubResearch {
        async fn search(&self, query: &str) -> String {
            self.queries.lock().unwrap().push(query.to_string());
            self.answer.clone()
        }
    }

    struct PanickingResearch;

    #[async_trait::async_trait]
    impl FactSource for PanickingResearch {
        async fn search(&self, _query: &str) -> String {
            panic!("research backend exploded");
        }
    }

    /// Hands out scripted replies in order and remembers every prompt.
    struct ScriptedProvider {
        replies: Mutex<Vec<Result<String, ProviderError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl Provider for ScriptedProvider {
        async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, ProviderError> {
            self.prompts.lock().unwrap().push(req.prompt.clone());
            let reply = self.replies.lock().unwrap().remove(0)?;
            Ok(GenerateResponse {
                content: reply,
                model: req.model.clone(),
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: "end_turn".to_string(),
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn netflix_request() -> CaseRequest {
        CaseRequest {
            subject: "Strategic Management".to_string(),
            learning_outcomes: "Analyze strategic decision-making in dynamic industries".to_string(),
            case_focus: "innovation strategy".to_string(),
            company_reference: "Netflix innovation 2025".to_string(),
            case_type: "Innovation/Change case".to_string(),
        }
    }

    struct Harness {
        orchestrator: CaseOrchestrator,
        financials: Arc<StubFinancials>,
        research: Arc<StubResearch>,
        provider: Arc<ScriptedProvider>,
    }

    fn harness(record: Option<FinancialRecord>, replies: Vec<Result<String, ProviderError>>) -> Harness {
        let config = Config::default();
        let financials = Arc::new(StubFinancials {
            record,
            ..Default::default()
        });
        let research = Arc::new(StubResearch {
            answer: "1. Netflix had 301.6 million members in 2024 (Netflix, 2025).".to_string(),
            queries: Mutex::new(Vec::new()),
        });
        let provider = ScriptedProvider::new(replies);
        let llm = LlmClient::new(Some(provider.clone() as Arc<dyn Provider>), &config);
        let orchestrator = CaseOrchestrator::new(
            &config,
            financials.clone(),
            research.clone(),
            Arc::new(llm),
        );
        Harness {
            orchestrator,
            financials,
            research,
            provider,
        }
    }

    const PART_ONE: &str = "  OPENING\nReed Hastings paused (Netflix, 2024). Innovation was everything.\n";
    const PART_TWO: &str = "\nCENTRAL CHALLENGE\nExhibit 1 lists $39 billion in revenue.  ";

    #[tokio::test]
    async fn test_end_to_end_netflix_case() {
        let record = FinancialRecord::Reported(vec![
            YearFigures::new("2024").with(Metric::Revenue, 39_000_966_000.0),
        ]);
        let h = harness(
            Some(record),
            vec![Ok(PART_ONE.to_string()), Ok(PART_TWO.to_string())],
        );

        let text = h.orchestrator.generate(&netflix_request()).await;

        let body = format!("{}\n\n{}", PART_ONE.trim(), PART_TWO.trim());
        let word_count = body.split_whitespace().count();
        let expected_tail = format!("\n\n[Word count: {word_count}]\n");
        assert!(text.starts_with(&format!("{body}{expected_tail}")), "{text}");

        let calls = h.financials.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[("NFLX".to_string(), 5)]);

        let queries = h.research.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert!(queries[0].contains("COMPANY: Netflix innovation 2025"));

        let prompts = h.provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("2024 | 39000.97 | - | -"));
    }

    #[tokio::test]
    async fn test_second_prompt_is_chained_on_first_response() {
        let h = harness(
            None,
            vec![Ok(PART_ONE.to_string()), Ok(PART_TWO.to_string())],
        );

        h.orchestrator.generate(&netflix_request()).await;

        let prompts = h.provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(!prompts[0].contains(PART_ONE));
        assert!(!prompts[0].contains("CENTRAL CHALLENGE"));
        assert!(prompts[1].contains(PART_ONE));
        assert!(prompts[1].contains("CENTRAL CHALLENGE"));
        for prompt in prompts.iter() {
            assert!(prompt.contains(NO_FINANCIAL_DATA_TEXT));
            assert!(prompt.contains("301.6 million members"));
        }
    }

    #[tokio::test]
    async fn test_unknown_company_skips_financial_fetch() {
        let h = harness(None, vec![Ok("one".into()), Ok("two".into())]);
        let request = CaseRequest {
            company_reference: "Acme Regional Bakery".to_string(),
            ..netflix_request()
        };

        h.orchestrator.generate(&request).await;

        assert!(h.financials.calls.lock().unwrap().is_empty());
        let prompts = h.provider.prompts.lock().unwrap();
        assert!(prompts[0].contains(NO_FINANCIAL_DATA_TEXT));
    }

    #[tokio::test]
    async fn test_unavailable_financials_do_not_abort() {
        let h = harness(
            Some(FinancialRecord::Unavailable("HTTP 503".into())),
            vec![Ok("one".into()), Ok("two".into())],
        );

        let text = h.orchestrator.generate(&netflix_request()).await;

        assert!(text.starts_with("one\n\ntwo\n\n[Word count: 2]\n"));
        assert!(h.provider.prompts.lock().unwrap()[0].contains(NO_FINANCIAL_DATA_TEXT));
    }

    #[tokio::test]
    async fn test_provider_error_text_is_treated_as_content() {
        let h = harness(
            None,
            vec![
                Err(ProviderError::Status {
                    status: 529,
                    body: "overloaded".into(),
                }),
                Ok("second half".into()),
            ],
        );

        let text = h.orchestrator.generate(&netflix_request()).await;

        assert!(text.starts_with("API Error: 529. Response: overloaded\n\nsecond half"));
        let prompts = h.provider.prompts.lock().unwrap();
        assert!(prompts[1].contains("API Error: 529. Response: overloaded"));
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_error_text() {
        let h = harness(None, vec![Err(ProviderError::Decode("unexpected eof".into()))]);

        let text = h.orchestrator.generate(&netflix_request()).await;

        assert!(text.starts_with(FAILURE_PREFIX), "{text}");
        assert!(text.contains("unexpected eof"));
        assert_eq!(h.provider.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_panic_inside_pipeline_becomes_error_text() {
        let config = Config::default();
        let orchestrator = CaseOrchestrator::new(
            &config,
            Arc::new(StubFinancials::default()),
            Arc::new(PanickingResearch),
            Arc::new(LlmClient::new(None, &config)),
        );

        let text = orchestrator.generate(&netflix_request()).await;

        assert!(text.starts_with(FAILURE_PREFIX), "{text}");
    }

    #[tokio::test]
    async fn test_missing_credentials_still_produce_text() {
        let config = Config::default();
        let orchestrator = CaseOrchestrator::from_config(&config);
        let request = CaseRequest {
            company_reference: "Acme Regional Bakery".to_string(),
            ..netflix_request()
        };

        let text = orchestrator.generate(&request).await;

        assert!(!text.is_empty());
        assert!(text.contains("Missing CLAUDE_API_KEY"));
        assert!(text.contains("[Word count: 8]"));
        assert!(text.contains(QUALITY_MISSING_PREFIX));
    }

    /// Counts calls on entry, then takes a while to answer.
    struct SlowProvider {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Provider for SlowProvider {
        async fn generate(&self, req: &GenerateRequest) -> Result<GenerateResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(GenerateResponse {
                content: "slow".to_string(),
                model: req.model.clone(),
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: "end_turn".to_string(),
            })
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_dropped_caller_stops_further_generation() {
        let config = Config::default();
        let provider = Arc::new(SlowProvider {
            calls: AtomicUsize::new(0),
        });
        let orchestrator = CaseOrchestrator::new(
            &config,
            Arc::new(StubFinancials::default()),
            Arc::new(PerplexityResearcher::new(None, "sonar")),
            Arc::new(LlmClient::new(Some(provider.clone() as Arc<dyn Provider>), &config)),
        );

        let abandoned =
            tokio::time::timeout(Duration::from_millis(20), orchestrator.generate(&netflix_request()))
                .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(provider.calls.load(Ordering::SeqCst) <= 1);
    }

    #[tokio::test]
    async fn test_case_id_matches_document_id() {
        let h = harness(None, vec![Ok("one".into()), Ok("two".into())]);
        let id = Uuid::new_v4();

        let document = h.orchestrator.run(&netflix_request(), id).await.unwrap();
        assert_eq!(document.id, id);

        let h = harness(None, vec![Ok("one".into()), Ok("two".into())]);
        let first = h.orchestrator.generate_case(&netflix_request()).await;
        assert!(!first.id.is_nil());
        assert!(first.text.starts_with("one\n\ntwo"));
    }

    #[tokio::test]
    async fn test_missing_research_key_reaches_prompts() {
        let config = Config::default();
        let provider = ScriptedProvider::new(vec![Ok("one".into()), Ok("two".into())]);
        let orchestrator = CaseOrchestrator::new(
            &config,
            Arc::new(StubFinancials::default()),
            Arc::new(PerplexityResearcher::new(None, "sonar")),
            Arc::new(LlmClient::new(Some(provider.clone() as Arc<dyn Provider>), &config)),
        );

        orchestrator.generate(&netflix_request()).await;

        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains(RESEARCH_MISSING_KEY));
        assert!(prompts[0].contains(NO_DATA_TEXT));
    }
}
