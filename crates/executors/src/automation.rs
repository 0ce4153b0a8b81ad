//! Screen and input automation executor.
//!
//! The OS layer lives behind [`DesktopBackend`]; this module owns the policy
//! around it: coordinate validation against the current display bounds, a
//! pacing delay between actions, and an emergency stop that fails future
//! actions without unwinding an in-progress cycle.

use parking_lot::Mutex;
use shared::tool::{ActionOutcome, ComputerAction, ExecutorError, MouseButton};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Capability boundary to the OS input/screen layer. Implementations are
/// impure with respect to mouse/keyboard/display state.
pub trait DesktopBackend: Send + Sync {
    /// Current display size in pixels.
    fn screen_size(&self) -> (i32, i32);

    /// Whether automation is usable at all (e.g. a display is present).
    fn is_available(&self) -> bool {
        true
    }

    fn click(&self, x: i32, y: i32, button: MouseButton, clicks: u32) -> anyhow::Result<()>;
    fn type_text(&self, text: &str) -> anyhow::Result<()>;
    fn scroll(&self, clicks: i32) -> anyhow::Result<()>;
    fn key_press(&self, key: &str) -> anyhow::Result<()>;
    fn move_to(&self, x: i32, y: i32) -> anyhow::Result<()>;
    fn drag(&self, from: (i32, i32), to: (i32, i32)) -> anyhow::Result<()>;

    /// Capture the screen as PNG bytes.
    fn screenshot(&self) -> anyhow::Result<Vec<u8>>;
}

/// A backend for environments without display access. Reports unavailable,
/// so every action comes back as a declared failure rather than a crash.
pub struct HeadlessDesktop;

impl DesktopBackend for HeadlessDesktop {
    fn screen_size(&self) -> (i32, i32) {
        (0, 0)
    }

    fn is_available(&self) -> bool {
        false
    }

    fn click(&self, _: i32, _: i32, _: MouseButton, _: u32) -> anyhow::Result<()> {
        anyhow::bail!("no display")
    }

    fn type_text(&self, _: &str) -> anyhow::Result<()> {
        anyhow::bail!("no display")
    }

    fn scroll(&self, _: i32) -> anyhow::Result<()> {
        anyhow::bail!("no display")
    }

    fn key_press(&self, _: &str) -> anyhow::Result<()> {
        anyhow::bail!("no display")
    }

    fn move_to(&self, _: i32, _: i32) -> anyhow::Result<()> {
        anyhow::bail!("no display")
    }

    fn drag(&self, _: (i32, i32), _: (i32, i32)) -> anyhow::Result<()> {
        anyhow::bail!("no display")
    }

    fn screenshot(&self) -> anyhow::Result<Vec<u8>> {
        anyhow::bail!("no display")
    }
}

/// Executes [`ComputerAction`]s against a [`DesktopBackend`].
pub struct AutomationExecutor {
    backend: Box<dyn DesktopBackend>,
    pause: Duration,
    /// When false, the emergency stop is disarmed and halt() has no effect.
    failsafe: bool,
    halted: Arc<AtomicBool>,
    last_screenshot: Mutex<Option<Vec<u8>>>,
}

impl AutomationExecutor {
    pub fn new(backend: Box<dyn DesktopBackend>, pause: Duration, failsafe: bool) -> Self {
        Self {
            backend,
            pause,
            failsafe,
            halted: Arc::new(AtomicBool::new(false)),
            last_screenshot: Mutex::new(None),
        }
    }

    /// Halt all future automation actions. Does not unwind an in-progress
    /// cycle; actions already dispatched complete, later ones fail.
    pub fn halt(&self) {
        self.halted.store(true, Ordering::SeqCst);
    }

    /// Re-arm automation after an emergency stop.
    pub fn resume(&self) {
        self.halted.store(false, Ordering::SeqCst);
    }

    pub fn is_halted(&self) -> bool {
        self.failsafe && self.halted.load(Ordering::SeqCst)
    }

    /// PNG bytes of the most recent screenshot action, if any.
    pub fn take_last_screenshot(&self) -> Option<Vec<u8>> {
        self.last_screenshot.lock().take()
    }

    /// Capture the screen directly (user-initiated, outside a tool cycle).
    pub fn capture_screen(&self) -> Result<Vec<u8>, ExecutorError> {
        if !self.backend.is_available() {
            return Err(ExecutorError::Unavailable);
        }
        self.backend
            .screenshot()
            .map_err(|e| ExecutorError::Parse(format!("screenshot failed: {}", e)))
    }

    fn check_bounds(&self, x: i32, y: i32) -> Result<(), ExecutorError> {
        let (width, height) = self.backend.screen_size();
        if x < 0 || y < 0 || x > width || y > height {
            return Err(ExecutorError::OutOfBounds { x, y, width, height });
        }
        Ok(())
    }

    pub async fn execute(&self, action: ComputerAction) -> Result<ActionOutcome, ExecutorError> {
        if !self.backend.is_available() {
            return Err(ExecutorError::Unavailable);
        }
        if self.is_halted() {
            return Err(ExecutorError::Halted);
        }

        debug!(kind = action.kind(), "executing computer action");

        let wrap = |e: anyhow::Error, what: &str| ExecutorError::Parse(format!("{}: {}", what, e));

        let outcome = match &action {
            ComputerAction::Click { x, y, button, clicks } => {
                self.check_bounds(*x, *y)?;
                self.backend
                    .click(*x, *y, *button, *clicks)
                    .map_err(|e| wrap(e, "click failed"))?;
                ActionOutcome::summary(format!(
                    "Clicked at ({}, {}) with {:?} button ({} clicks)",
                    x, y, button, clicks
                ))
            }
            ComputerAction::Type { text } => {
                self.backend
                    .type_text(text)
                    .map_err(|e| wrap(e, "type failed"))?;
                ActionOutcome::summary(format!("Typed: {}", text))
            }
            ComputerAction::Scroll { clicks } => {
                self.backend
                    .scroll(*clicks)
                    .map_err(|e| wrap(e, "scroll failed"))?;
                ActionOutcome::summary(format!("Scrolled {} clicks", clicks))
            }
            ComputerAction::KeyPress { key } => {
                self.backend
                    .key_press(key)
                    .map_err(|e| wrap(e, "key press failed"))?;
                ActionOutcome::summary(format!("Pressed key: {}", key))
            }
            ComputerAction::MoveTo { x, y } => {
                self.check_bounds(*x, *y)?;
                self.backend
                    .move_to(*x, *y)
                    .map_err(|e| wrap(e, "move failed"))?;
                ActionOutcome::summary(format!("Moved mouse to ({}, {})", x, y))
            }
            ComputerAction::Drag { from, to } => {
                self.check_bounds(from.0, from.1)?;
                self.check_bounds(to.0, to.1)?;
                self.backend
                    .drag(*from, *to)
                    .map_err(|e| wrap(e, "drag failed"))?;
                ActionOutcome::summary(format!(
                    "Dragged from ({}, {}) to ({}, {})",
                    from.0, from.1, to.0, to.1
                ))
            }
            ComputerAction::Screenshot => {
                let bytes = self
                    .backend
                    .screenshot()
                    .map_err(|e| wrap(e, "screenshot failed"))?;
                let size = bytes.len();
                *self.last_screenshot.lock() = Some(bytes);
                ActionOutcome::summary(format!("Screenshot taken ({} bytes)", size))
            }
        };

        if !self.pause.is_zero() {
            tokio::time::sleep(self.pause).await;
        }

        Ok(outcome)
    }
}
