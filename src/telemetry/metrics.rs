use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
};
use std::sync::LazyLock;

pub static METER: LazyLock<Meter> = LazyLock::new(|| global::meter("case-generator"));

// --- GenAI client metrics ---

pub static GEN_AI_TOKEN_USAGE: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("gen_ai.client.token.usage")
        .with_description("Number of tokens used per LLM call")
        .with_unit("{token}")
        .build()
});

pub static GEN_AI_OPERATION_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("gen_ai.client.operation.duration")
        .with_description("Duration of LLM operations in seconds")
        .with_unit("s")
        .build()
});

pub static GEN_AI_ERROR_COUNT: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("gen_ai.client.error.count")
        .with_description("Number of LLM call errors")
        .with_unit("{error}")
        .build()
});

// --- Domain Metrics ---

pub static CASE_GENERATION_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("case.generation.duration")
        .with_description("Total case generation duration in seconds")
        .with_unit("s")
        .build()
});

pub static CASE_WORD_COUNT: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("case.word_count")
        .with_description("Words in the assembled case body")
        .with_unit("{word}")
        .build()
});

pub static CASE_QUALITY_MISSING: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("case.quality.missing_checks")
        .with_description("Quality checks failed by generated cases")
        .with_unit("{check}")
        .build()
});

pub static FINANCIAL_DATA_UNAVAILABLE: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("case.financial_data.unavailable")
        .with_description("Cases generated without financial data after a fetch failure")
        .with_unit("{case}")
        .build()
});

// --- HTTP Metrics ---

pub static HTTP_REQUESTS_TOTAL: LazyLock<Counter<u64>> = LazyLock::new(|| {
    METER
        .u64_counter("http.requests.total")
        .with_description("Total number of HTTP requests")
        .with_unit("{request}")
        .build()
});

pub static HTTP_REQUEST_DURATION: LazyLock<Histogram<f64>> = LazyLock::new(|| {
    METER
        .f64_histogram("http.request.duration")
        .with_description("HTTP request duration in milliseconds")
        .with_unit("ms")
        .with_boundaries(vec![
            10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 15000.0, 30000.0, 60000.0, 120000.0,
            300000.0,
        ])
        .build()
});
