//! Common utilities for research pipeline tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use research_pipeline::backend::{Backend, BackendError, BackendStream, RoleConfig, StreamEvent};
use research_pipeline::progress::ProgressRenderer;
use research_pipeline_sdk::PipelineLog;
use serde_json::{json, Value};

/// In-memory backend answering each role from a script
///
/// Searches are keyed by their search term. Every call appends to a shared
/// call log so tests can check ordering across stages.
pub struct ScriptedBackend {
    plan: Option<Value>,
    failing_searches: HashSet<String>,
    search_delays: HashMap<String, Duration>,
    report: Option<Value>,
    writer_events: usize,
    writer_gap: Duration,
    artifact: Option<Value>,
    log: Arc<Mutex<Vec<String>>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedBackend {
    /// Backend whose planner proposes one search per term, all succeeding
    pub fn new(terms: &[&str]) -> Self {
        let searches: Vec<Value> = terms
            .iter()
            .map(|term| json!({"query": term, "reason": format!("learn about {term}")}))
            .collect();

        Self {
            plan: Some(json!({ "searches": searches })),
            failing_searches: HashSet::new(),
            search_delays: HashMap::new(),
            report: Some(json!({
                "short_summary": "A short summary.",
                "markdown_report": "# Report\n\nFindings.",
                "follow_up_questions": ["What next?"]
            })),
            writer_events: 3,
            writer_gap: Duration::from_millis(10),
            artifact: Some(json!({ "path": "/tmp/report.pdf" })),
            log: Arc::new(Mutex::new(Vec::new())),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn fail_search(mut self, term: &str) -> Self {
        self.failing_searches.insert(term.to_string());
        self
    }

    pub fn delay_search(mut self, term: &str, delay: Duration) -> Self {
        self.search_delays.insert(term.to_string(), delay);
        self
    }

    pub fn fail_planner(mut self) -> Self {
        self.plan = None;
        self
    }

    pub fn with_plan(mut self, plan: Value) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn fail_writer(mut self) -> Self {
        self.report = None;
        self
    }

    pub fn with_report(mut self, report: Value) -> Self {
        self.report = Some(report);
        self
    }

    pub fn writer_stream(mut self, events: usize, gap: Duration) -> Self {
        self.writer_events = events;
        self.writer_gap = gap;
        self
    }

    pub fn fail_format(mut self) -> Self {
        self.artifact = None;
        self
    }

    /// Every call so far, as `"<role>:<detail>"` entries
    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Inputs the given role received, in call order
    pub fn inputs_for(&self, role: &str) -> Vec<String> {
        let prefix = format!("{role}:input:");
        self.calls()
            .into_iter()
            .filter_map(|entry| entry.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    async fn search(&self, input: &str) -> Result<Value, BackendError> {
        let term = input
            .lines()
            .next()
            .and_then(|line| line.strip_prefix("Search term: "))
            .unwrap_or_default()
            .to_string();

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        self.record(format!("SearchAgent:start:{term}"));

        if let Some(delay) = self.search_delays.get(&term) {
            tokio::time::sleep(*delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.record(format!("SearchAgent:end:{term}"));

        if self.failing_searches.contains(&term) {
            return Err(BackendError::status(500, format!("search for {term} failed")));
        }
        Ok(Value::String(format!("summary of {term}")))
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn invoke(&self, role: &RoleConfig, input: &str) -> Result<Value, BackendError> {
        self.record(format!("{}:input:{}", role.name, input));

        match role.name.as_str() {
            "PlannerAgent" => self
                .plan
                .clone()
                .ok_or_else(|| BackendError::status(503, "planner unavailable")),
            "SearchAgent" => self.search(input).await,
            "FormatAgent" => self
                .artifact
                .clone()
                .ok_or_else(|| BackendError::status(500, "formatter crashed")),
            other => Err(BackendError::config(format!("unexpected role {other}"))),
        }
    }

    async fn invoke_streaming(
        &self,
        role: &RoleConfig,
        input: &str,
    ) -> Result<BackendStream, BackendError> {
        self.record(format!("{}:input:{}", role.name, input));
        self.record(format!("{}:start", role.name));

        let Some(report) = self.report.clone() else {
            return Err(BackendError::status(500, "writer unavailable"));
        };
        let events = self.writer_events;
        let gap = self.writer_gap;

        Ok(Box::pin(async_stream::stream! {
            for i in 0..events {
                tokio::time::sleep(gap).await;
                yield Ok::<_, BackendError>(StreamEvent::Delta(format!("part {i} ")));
            }
            yield Ok::<_, BackendError>(StreamEvent::Completed(report));
        }))
    }
}

/// Renderer that keeps every event it is handed
#[derive(Default)]
pub struct RecordingRenderer(Mutex<Vec<PipelineLog>>);

impl RecordingRenderer {
    pub fn events(&self) -> Vec<PipelineLog> {
        self.0.lock().unwrap().clone()
    }

    /// `(label, done)` for every update of item `id`, in order
    pub fn updates_for(&self, id: &str) -> Vec<(String, bool)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PipelineLog::ItemUpdated {
                    id: item, label, done, ..
                } if item == id => Some((label, done)),
                _ => None,
            })
            .collect()
    }
}

impl ProgressRenderer for RecordingRenderer {
    fn render(&self, event: &PipelineLog) {
        self.0.lock().unwrap().push(event.clone());
    }
}
