//! Tool Dispatcher: the core of one response-processing cycle.
//!
//! Partitions a model response into free text and ordered tool invocations,
//! executes each invocation against the right executor, and logs a result
//! per invocation. One invocation's failure never blocks its siblings:
//! decode errors, executor errors, and unknown tools all become failed
//! results, not aborts.

use providers::catalog;
use providers::gateway::{ContentSegment, ModelResponse};
use shared::convo::{ConversationEntry, Sender};
use shared::tool::{ActionResult, ExecutorError, ToolCall};
use tracing::{debug, info};

use crate::history::HistoryStore;
use crate::transcript::{ActionLog, Transcript};
use executors::{AutomationExecutor, FileExecutor, WebExecutor};

/// Overall outcome of one cycle, for the status indicator. Individual
/// failures are never fatal to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No invocations in the response.
    NoActions,
    AllSucceeded,
    PartialFailure,
    TotalFailure,
}

/// What one cycle produced, returned to the caller. Results are currently
/// log-only; returning them here is the seam where a feedback round-trip to
/// the model could be added.
#[derive(Debug)]
pub struct CycleReport {
    pub assistant_text: Option<String>,
    pub results: Vec<ActionResult>,
    pub outcome: CycleOutcome,
}

pub struct Dispatcher {
    automation: AutomationExecutor,
    files: FileExecutor,
    web: WebExecutor,
}

impl Dispatcher {
    pub fn new(automation: AutomationExecutor, files: FileExecutor, web: WebExecutor) -> Self {
        Self {
            automation,
            files,
            web,
        }
    }

    pub fn automation(&self) -> &AutomationExecutor {
        &self.automation
    }

    pub fn web(&self) -> &WebExecutor {
        &self.web
    }

    /// Process one model response: emit the assistant turn (if any), execute
    /// every invocation in arrival order, and log every result.
    pub async fn process(
        &self,
        response: &ModelResponse,
        transcript: &mut Transcript,
        history: &mut HistoryStore,
        action_log: &mut ActionLog,
    ) -> CycleReport {
        let mut text_parts: Vec<&str> = Vec::new();
        let mut invocations = Vec::new();
        for segment in &response.segments {
            match segment {
                ContentSegment::Text(text) => text_parts.push(text),
                ContentSegment::Invocation(inv) => invocations.push(inv),
            }
        }

        // One assistant entry for the whole response, not one per segment.
        let assistant_text = if text_parts.is_empty() {
            None
        } else {
            Some(text_parts.join("\n"))
        };
        if let Some(text) = &assistant_text {
            let entry = ConversationEntry::new(Sender::Assistant, text.clone());
            transcript.append(entry.clone());
            history.append(entry);
        }

        let mut results = Vec::with_capacity(invocations.len());
        for invocation in invocations {
            debug!(tool = %invocation.name, id = %invocation.id, "dispatching invocation");
            let result = match catalog::decode(invocation) {
                Ok(call) => match self.execute_call(call).await {
                    Ok(outcome) => ActionResult::ok(&invocation.id, outcome),
                    Err(e) => ActionResult::failed(&invocation.id, &e),
                },
                Err(e) => ActionResult::failed(&invocation.id, &e),
            };
            action_log.record_result(&result);
            results.push(result);
        }

        let succeeded = results.iter().filter(|r| r.success).count();
        let outcome = if results.is_empty() {
            CycleOutcome::NoActions
        } else if succeeded == results.len() {
            CycleOutcome::AllSucceeded
        } else if succeeded == 0 {
            CycleOutcome::TotalFailure
        } else {
            CycleOutcome::PartialFailure
        };

        info!(
            invocations = results.len(),
            succeeded,
            ?outcome,
            "cycle processed"
        );

        CycleReport {
            assistant_text,
            results,
            outcome,
        }
    }

    async fn execute_call(&self, call: ToolCall) -> Result<shared::tool::ActionOutcome, ExecutorError> {
        match call {
            ToolCall::Computer(action) => self.automation.execute(action).await,
            ToolCall::File(op) => self.files.execute(op).await,
            ToolCall::Web(op) => self.web.execute(op).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use executors::automation::HeadlessDesktop;
    use providers::gateway::ContentSegment;
    use serde_json::json;
    use shared::tool::ToolInvocation;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        dispatcher: Dispatcher,
        transcript: Transcript,
        history: HistoryStore,
        action_log: ActionLog,
        _dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let history = HistoryStore::load(dir.path().join("history.json"), 20);
            let dispatcher = Dispatcher::new(
                AutomationExecutor::new(Box::new(HeadlessDesktop), Duration::ZERO, true),
                FileExecutor::new(),
                WebExecutor::new(Duration::from_secs(5), "test-agent", 5000),
            );
            Self {
                dispatcher,
                transcript: Transcript::new(),
                history,
                action_log: ActionLog::new(100),
                _dir: dir,
            }
        }

        async fn run(&mut self, segments: Vec<ContentSegment>) -> CycleReport {
            self.dispatcher
                .process(
                    &ModelResponse { segments },
                    &mut self.transcript,
                    &mut self.history,
                    &mut self.action_log,
                )
                .await
        }

        fn file_read(&self, id: &str, path: &str) -> ContentSegment {
            ContentSegment::Invocation(ToolInvocation {
                id: id.into(),
                name: "file_operations".into(),
                arguments: json!({"operation": "read", "file_path": path}),
            })
        }
    }

    #[tokio::test]
    async fn empty_response_is_a_clean_no_op() {
        let mut fx = Fixture::new();
        let report = fx.run(Vec::new()).await;
        assert_eq!(report.outcome, CycleOutcome::NoActions);
        assert!(report.assistant_text.is_none());
        assert!(fx.transcript.is_empty());
        assert!(fx.action_log.is_empty());
    }

    #[tokio::test]
    async fn text_segments_become_one_assistant_entry() {
        let mut fx = Fixture::new();
        let report = fx
            .run(vec![
                ContentSegment::Text("first part".into()),
                ContentSegment::Text("second part".into()),
            ])
            .await;

        assert_eq!(
            report.assistant_text.as_deref(),
            Some("first part\nsecond part")
        );
        assert_eq!(fx.transcript.len(), 1);
        assert_eq!(fx.history.len(), 1);
        assert_eq!(fx.transcript.entries()[0].sender, Sender::Assistant);
    }

    #[tokio::test]
    async fn one_failure_never_blocks_siblings() {
        let mut fx = Fixture::new();
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.txt");
        std::fs::write(&good, "content").unwrap();

        // A (fails: missing file), B (succeeds), C (fails: missing file)
        let segments = vec![
            fx.file_read("inv-a", "/missing/a.txt"),
            fx.file_read("inv-b", good.to_str().unwrap()),
            fx.file_read("inv-c", "/missing/c.txt"),
        ];
        let report = fx.run(segments).await;

        assert_eq!(report.results.len(), 3);
        assert_eq!(report.results[0].invocation_id, "inv-a");
        assert_eq!(report.results[1].invocation_id, "inv-b");
        assert_eq!(report.results[2].invocation_id, "inv-c");
        assert!(!report.results[0].success);
        assert!(report.results[1].success);
        assert!(!report.results[2].success);
        assert_eq!(report.outcome, CycleOutcome::PartialFailure);
        assert_eq!(fx.action_log.len(), 3);
    }

    #[tokio::test]
    async fn unknown_tool_yields_failed_result_without_raising() {
        let mut fx = Fixture::new();
        let report = fx
            .run(vec![ContentSegment::Invocation(ToolInvocation {
                id: "inv-1".into(),
                name: "unknown_tool".into(),
                arguments: json!({}),
            })])
            .await;

        assert_eq!(report.results.len(), 1);
        let result = &report.results[0];
        assert!(!result.success);
        assert!(result.summary.contains("unknown"));
        assert!(result.summary.contains("unknown_tool"));
        assert_eq!(report.outcome, CycleOutcome::TotalFailure);
    }

    #[tokio::test]
    async fn tool_only_response_logs_results_without_assistant_entry() {
        let mut fx = Fixture::new();
        let report = fx.run(vec![fx.file_read("inv-1", "/missing.txt")]).await;

        assert!(report.assistant_text.is_none());
        assert!(fx.transcript.is_empty());
        assert_eq!(fx.action_log.len(), 1);
        assert_eq!(report.results.len(), 1);
    }

    #[tokio::test]
    async fn all_successes_report_all_succeeded() {
        let mut fx = Fixture::new();
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("ok.txt");
        std::fs::write(&file, "x").unwrap();

        let report = fx
            .run(vec![fx.file_read("inv-1", file.to_str().unwrap())])
            .await;
        assert_eq!(report.outcome, CycleOutcome::AllSucceeded);
    }
}
