//! The session: one object owning the gateway, executors, history, and
//! visible records, constructed once at startup and driven one cycle at a
//! time.
//!
//! Only one cycle may be in flight; a submission while busy is rejected
//! with a typed error rather than queued or interleaved. Gateway failures
//! become a chat-visible error entry and leave the session usable.

use providers::gateway::{GatewayError, ModelGateway};
use shared::convo::{Attachment, ConversationEntry, Sender};
use shared::settings::{AppSettings, ConfigError};
use shared::tool::ExecutorError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

use crate::context::ContextBuilder;
use crate::dispatcher::{CycleReport, Dispatcher};
use crate::history::HistoryStore;
use crate::transcript::{ActionLog, Transcript};
use executors::{AutomationExecutor, DesktopBackend, FileExecutor, WebExecutor};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a request is already being processed")]
    Busy,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// Clears the busy flag when a cycle ends, by any path.
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Session {
    gateway: Box<dyn ModelGateway>,
    context: ContextBuilder,
    dispatcher: Dispatcher,
    history: HistoryStore,
    transcript: Transcript,
    action_log: ActionLog,
    busy: AtomicBool,
    pending_attachment: Option<Attachment>,
}

impl Session {
    /// Construct a session from validated settings. Configuration problems
    /// are fatal here, before any cycle begins.
    pub fn new(
        settings: &AppSettings,
        gateway: Box<dyn ModelGateway>,
        desktop: Box<dyn DesktopBackend>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;

        let history_path = settings
            .history_file
            .clone()
            .unwrap_or_else(HistoryStore::default_path);
        let history = HistoryStore::load(history_path, settings.max_history_messages);

        let automation = AutomationExecutor::new(
            desktop,
            Duration::from_millis(settings.automation_pause_ms),
            settings.automation_failsafe,
        );

        let dispatcher = Dispatcher::new(
            automation,
            FileExecutor::new(),
            WebExecutor::new(
                Duration::from_secs(settings.request_timeout_secs),
                &settings.user_agent,
                settings.attachment_text_cap,
            ),
        );

        Ok(Self {
            gateway,
            context: ContextBuilder::new(settings.attachment_text_cap),
            dispatcher,
            history,
            transcript: Transcript::new(),
            action_log: ActionLog::new(settings.action_log_cap),
            busy: AtomicBool::new(false),
            pending_attachment: None,
        })
    }

    /// Run one full cycle for a user submission.
    pub async fn submit(&mut self, message: &str) -> Result<CycleReport, SessionError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SessionError::Busy);
        }
        let _guard = CycleGuard(&self.busy);

        let attachment = self.pending_attachment.take();
        let request = self.context.build(&self.history, message, attachment.clone());

        let mut user_entry = ConversationEntry::new(Sender::User, message);
        if attachment.is_some() {
            user_entry = user_entry.with_attachment();
        }
        self.transcript.append(user_entry.clone());
        self.history.append(user_entry);

        info!(chars = request.text.len(), "submitting cycle");

        let response = match self.gateway.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "gateway request failed");
                // Chat-visible, not persisted: System turns stay out of the
                // durable history.
                self.transcript
                    .append(ConversationEntry::new(Sender::System, format!("Error: {}", e)));
                return Err(e.into());
            }
        };

        let report = self
            .dispatcher
            .process(
                &response,
                &mut self.transcript,
                &mut self.history,
                &mut self.action_log,
            )
            .await;

        // A screenshot action arms the next submission's attachment, the
        // same way a user-initiated capture does.
        if let Some(bytes) = self.dispatcher.automation().take_last_screenshot() {
            self.pending_attachment = Some(Attachment::Screenshot(bytes));
        }

        Ok(report)
    }

    /// Capture the screen now; the image rides with the next submission.
    pub fn capture_screen(&mut self) -> Result<(), SessionError> {
        let bytes = self.dispatcher.automation().capture_screen()?;
        self.action_log
            .record(format!("Screenshot taken ({} bytes)", bytes.len()));
        self.pending_attachment = Some(Attachment::Screenshot(bytes));
        Ok(())
    }

    /// Promote the current page's captured text to the next submission's
    /// attachment.
    pub fn attach_page_text(&mut self) -> Result<(), SessionError> {
        let text = self
            .dispatcher
            .web()
            .current_page_text()
            .ok_or(ExecutorError::NoPageLoaded)?;
        self.action_log
            .record(format!("Attached page content ({} characters)", text.chars().count()));
        self.pending_attachment = Some(Attachment::PageText(text));
        Ok(())
    }

    /// Halt all future automation actions. Does not unwind a running cycle.
    pub fn emergency_stop(&mut self) {
        self.dispatcher.automation().halt();
        self.action_log.record("Emergency stop engaged");
    }

    /// Re-arm automation after an emergency stop.
    pub fn resume_automation(&mut self) {
        self.dispatcher.automation().resume();
        self.action_log.record("Automation resumed");
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn has_pending_attachment(&self) -> bool {
        self.pending_attachment.is_some()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn action_log(&self) -> &ActionLog {
        &self.action_log
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }
}
