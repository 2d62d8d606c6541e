//! Integration tests for the extraction pipeline.
//!
//! Provider behaviour is simulated by injecting fake clients through the
//! config (the same seam a caller would use for middleware), so these
//! tests exercise real tier ordering, retry, and fallback logic with
//! zero network access.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use resume2json::pipeline::offline::NO_TEXT_MESSAGE;
use resume2json::providers::{
    ChatClient, ChatRequest, PageImage, ProviderError, VisionClient,
};
use resume2json::{
    extract_resume, extract_resume_with_cancel, PipelineConfig, UploadedDocument,
};
use tokio_util::sync::CancellationToken;

// ── Fakes ────────────────────────────────────────────────────────────────

/// Shared call log, ordered across all fakes in a test.
#[derive(Clone, Default)]
struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Scripted provider responses, consumed in order.
enum Scripted {
    Ok(String),
    RateLimited,
    Transport,
}

fn ok(text: &str) -> Scripted {
    Scripted::Ok(text.to_string())
}

impl Scripted {
    fn realise(self, provider: &str) -> Result<String, ProviderError> {
        match self {
            Scripted::Ok(text) => Ok(text),
            Scripted::RateLimited => Err(ProviderError::RateLimited {
                provider: provider.to_string(),
            }),
            Scripted::Transport => Err(ProviderError::Transport {
                provider: provider.to_string(),
                detail: "connection reset".to_string(),
            }),
        }
    }
}

struct FakeVision {
    log: CallLog,
    script: Mutex<VecDeque<Scripted>>,
}

impl FakeVision {
    fn new(log: CallLog, script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            log,
            script: Mutex::new(script.into()),
        })
    }
}

#[async_trait]
impl VisionClient for FakeVision {
    async fn generate(
        &self,
        model: &str,
        _instruction: &str,
        _pages: &[PageImage],
    ) -> Result<String, ProviderError> {
        self.log.push(format!("vision:{model}"));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Scripted::Transport)
            .realise("gemini")
    }
}

struct FakeChat {
    label: &'static str,
    log: CallLog,
    script: Mutex<VecDeque<Scripted>>,
}

impl FakeChat {
    fn new(label: &'static str, log: CallLog, script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            label,
            log,
            script: Mutex::new(script.into()),
        })
    }
}

#[async_trait]
impl ChatClient for FakeChat {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        self.log.push(format!("{}:{}", self.label, request.model));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Scripted::Transport)
            .realise(self.label)
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

const RESUME_TEXT: &str = "Jane Doe\njane.doe@example.com\n+1 415-555-0100\nEXPERIENCE\nAcme Corp\nBuilt things.\nSKILLS\nPython, Go\n";

const NAMED_JSON: &str = r#"{"name":"Jane Doe","email":"jane.doe@example.com","skills":"Python"}"#;
const UNNAMED_JSON: &str = r#"{"name":"","email":"","phone":"","skills":""}"#;

fn text_doc() -> UploadedDocument {
    UploadedDocument::new(RESUME_TEXT.into(), "text/plain", "cv.txt")
}

fn image_doc() -> UploadedDocument {
    UploadedDocument::new(vec![0x89, 0x50, 0x4E, 0x47], "image/png", "scan.png")
}

/// Config with a short rate-limit backoff so retry tests stay fast.
fn base_config() -> resume2json::config::PipelineConfigBuilder {
    PipelineConfig::builder().rate_limit_backoff(Duration::from_millis(50))
}

// ── Contract tests ───────────────────────────────────────────────────────

#[tokio::test]
async fn record_always_has_full_field_set() {
    for doc in [text_doc(), image_doc(), UploadedDocument::new(vec![], "application/zip", "x.zip")] {
        let record = extract_resume(&doc, &PipelineConfig::default()).await;
        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();
        for field in [
            "name", "email", "phone", "title", "location", "linkedin", "summary",
            "experience", "degree", "institution", "gradYear", "cgpa", "skills", "projects",
        ] {
            assert!(object.contains_key(field), "missing field {field}");
        }
        assert!(!record.experience.is_empty());
    }
}

#[tokio::test]
async fn no_credentials_returns_regex_result() {
    // Nothing configured: no tier but regex is even constructed, so the
    // run cannot make an outbound call.
    let record = extract_resume(&text_doc(), &PipelineConfig::default()).await;
    assert_eq!(record.name, "Jane Doe");
    assert_eq!(record.email, "jane.doe@example.com");
    assert!(record.skills.contains("Python, Go"));
    assert_eq!(record.experience[0].company, "Acme Corp");
}

#[tokio::test]
async fn short_text_yields_explanatory_summary() {
    let doc = UploadedDocument::new(b"hi".to_vec(), "text/plain", "cv.txt");
    let record = extract_resume(&doc, &PipelineConfig::default()).await;
    assert_eq!(record.summary, NO_TEXT_MESSAGE);
    assert_eq!(record.name, "");
    assert_eq!(record.skills, "");
}

// ── Tier ordering ────────────────────────────────────────────────────────

#[tokio::test]
async fn failing_tiers_run_in_priority_order_then_regex() {
    let log = CallLog::default();
    // Vision is configured but the document is plain text, so the vision
    // tier fails at rasterisation without a provider call; A and B then
    // fail at the transport level; regex terminates the run.
    let config = base_config()
        .vision_client(FakeVision::new(log.clone(), vec![]))
        .text_client_a(FakeChat::new("do", log.clone(), vec![Scripted::Transport]))
        .text_client_b(FakeChat::new("nvidia", log.clone(), vec![Scripted::Transport]))
        .build();

    let record = extract_resume(&text_doc(), &config).await;

    assert_eq!(
        log.calls(),
        vec!["do:alibaba-qwen3-32b", "nvidia:moonshotai/kimi-k2.5"]
    );
    // Regex tier reached exactly once and produced the final record.
    assert_eq!(record.name, "Jane Doe");
    assert_eq!(record.experience[0].company, "Acme Corp");
}

#[tokio::test]
async fn vision_success_short_circuits_text_tiers() {
    let log = CallLog::default();
    let config = base_config()
        .vision_client(FakeVision::new(log.clone(), vec![ok(NAMED_JSON)]))
        .text_client_a(FakeChat::new("do", log.clone(), vec![ok(NAMED_JSON)]))
        .build();

    let record = extract_resume(&image_doc(), &config).await;

    assert_eq!(log.calls(), vec!["vision:gemini-2.0-flash-lite"]);
    assert_eq!(record.name, "Jane Doe");
    assert_eq!(record.skills, "Python");
}

#[tokio::test]
async fn vision_transport_error_moves_to_secondary_model() {
    let log = CallLog::default();
    let config = base_config()
        .vision_client(FakeVision::new(
            log.clone(),
            vec![Scripted::Transport, ok(NAMED_JSON)],
        ))
        .build();

    let record = extract_resume(&image_doc(), &config).await;

    // Non-rate-limit error abandons the primary immediately.
    assert_eq!(
        log.calls(),
        vec!["vision:gemini-2.0-flash-lite", "vision:gemini-2.0-flash"]
    );
    assert_eq!(record.name, "Jane Doe");
}

#[tokio::test]
async fn vision_garbage_response_moves_to_secondary_model() {
    let log = CallLog::default();
    let config = base_config()
        .vision_client(FakeVision::new(
            log.clone(),
            vec![ok("I cannot read this resume, sorry."), ok(NAMED_JSON)],
        ))
        .build();

    let record = extract_resume(&image_doc(), &config).await;

    assert_eq!(
        log.calls(),
        vec!["vision:gemini-2.0-flash-lite", "vision:gemini-2.0-flash"]
    );
    assert_eq!(record.name, "Jane Doe");
}

// ── Rate-limit retry ─────────────────────────────────────────────────────

#[tokio::test]
async fn rate_limited_vision_retries_same_model() {
    let log = CallLog::default();
    let config = base_config()
        .vision_client(FakeVision::new(
            log.clone(),
            vec![Scripted::RateLimited, ok(NAMED_JSON)],
        ))
        .build();

    let record = extract_resume(&image_doc(), &config).await;

    // The retry stays on the primary model; the secondary is never tried.
    assert_eq!(
        log.calls(),
        vec!["vision:gemini-2.0-flash-lite", "vision:gemini-2.0-flash-lite"]
    );
    assert_eq!(record.name, "Jane Doe");
}

#[tokio::test]
async fn repeated_rate_limit_exhausts_model_budget() {
    let log = CallLog::default();
    let config = base_config()
        .vision_client(FakeVision::new(
            log.clone(),
            vec![
                Scripted::RateLimited,
                Scripted::RateLimited,
                Scripted::RateLimited,
                Scripted::RateLimited,
            ],
        ))
        .build();

    let record = extract_resume(&image_doc(), &config).await;

    // 2 attempts on the primary, then 2 on the secondary, then fall
    // through (no text tiers; OCR-less image yields the empty record).
    assert_eq!(
        log.calls(),
        vec![
            "vision:gemini-2.0-flash-lite",
            "vision:gemini-2.0-flash-lite",
            "vision:gemini-2.0-flash",
            "vision:gemini-2.0-flash",
        ]
    );
    assert_eq!(record.experience.len(), 1);
}

// ── Name gate ────────────────────────────────────────────────────────────

#[tokio::test]
async fn unnamed_json_fails_the_tier() {
    let log = CallLog::default();
    let config = base_config()
        .text_client_a(FakeChat::new("do", log.clone(), vec![ok(UNNAMED_JSON)]))
        .text_client_b(FakeChat::new("nvidia", log.clone(), vec![ok(NAMED_JSON)]))
        .build();

    let record = extract_resume(&text_doc(), &config).await;

    // Tier A parsed fine but had no name, so tier B was consulted and won.
    assert_eq!(
        log.calls(),
        vec!["do:alibaba-qwen3-32b", "nvidia:moonshotai/kimi-k2.5"]
    );
    assert_eq!(record.name, "Jane Doe");
    assert_eq!(record.skills, "Python");
}

#[tokio::test]
async fn named_json_with_fences_is_accepted() {
    // Fenced, trailing-comma JSON exercises the sanitizer end to end.
    let fenced = "```json\n{\"name\":\"Jane Doe\",\"skills\":\"Go\",}\n```";
    let config = base_config()
        .text_client_a(FakeChat::new("do", CallLog::default(), vec![ok(fenced)]))
        .build();

    let record = extract_resume(&text_doc(), &config).await;
    assert_eq!(record.name, "Jane Doe");
    assert_eq!(record.skills, "Go");
}

// ── Normalisation of tier payloads ───────────────────────────────────────

#[tokio::test]
async fn sparse_tier_payload_is_normalised() {
    let config = base_config()
        .text_client_a(FakeChat::new(
            "do",
            CallLog::default(),
            vec![ok(r#"{"name":"Jane Doe","skills":["Rust","Go"]}"#)],
        ))
        .build();

    let record = extract_resume(&text_doc(), &config).await;

    assert_eq!(record.name, "Jane Doe");
    // Array-valued skills coerced to a joined string.
    assert_eq!(record.skills, "Rust, Go");
    // Missing experience replaced with the placeholder entry.
    assert_eq!(record.experience.len(), 1);
    assert_eq!(record.experience[0].company, "");
}

// ── Cancellation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn cancelled_run_skips_ai_tiers_and_still_returns_a_record() {
    let log = CallLog::default();
    let config = base_config()
        .vision_client(FakeVision::new(log.clone(), vec![ok(NAMED_JSON)]))
        .text_client_a(FakeChat::new("do", log.clone(), vec![ok(NAMED_JSON)]))
        .build();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let record = extract_resume_with_cancel(&text_doc(), &config, cancel).await;

    // No provider was consulted, but the caller still got a record.
    assert!(log.calls().is_empty());
    assert_eq!(record.name, "Jane Doe"); // regex tier result
}

#[tokio::test]
async fn cancellation_aborts_rate_limit_backoff() {
    let log = CallLog::default();
    let config = PipelineConfig::builder()
        // Long backoff: the test only passes quickly if cancellation
        // interrupts the sleep.
        .rate_limit_backoff(Duration::from_secs(30))
        .vision_client(FakeVision::new(
            log.clone(),
            vec![Scripted::RateLimited, ok(NAMED_JSON)],
        ))
        .build();

    let cancel = CancellationToken::new();
    let doc = image_doc();
    let canceller = cancel.clone();
    let run = tokio::spawn(async move {
        extract_resume_with_cancel(&doc, &config, cancel).await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    canceller.cancel();

    let record = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("cancellation must interrupt the backoff")
        .unwrap();

    // Only the first (rate-limited) call happened.
    assert_eq!(log.calls(), vec!["vision:gemini-2.0-flash-lite"]);
    assert_eq!(record.experience.len(), 1);
}
