#![forbid(unsafe_code)]

//! Step-based program runner for the browser.
//!
//! [`StepProgram`] drives a [`Model`] without threads or blocking. The host
//! controls the loop:
//!
//! 1. Push messages via [`StepProgram::push_msg`] (DOM events, async results).
//! 2. Call [`StepProgram::step`] to process the queue.
//! 3. Render the returned view, if any.
//!
//! Commands returned by the model are executed immediately through the
//! [`Host`], in the order a depth-first walk of any batch yields them.

use std::collections::VecDeque;
use std::fmt;

use espejo_runtime::program::{Cmd, Model};

use crate::Host;

/// Misuse of the program lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    AlreadyInitialized,
    NotInitialized,
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInitialized => write!(f, "step program initialized twice"),
            Self::NotInitialized => write!(f, "step program used before init"),
        }
    }
}

impl std::error::Error for StepError {}

/// Result of a single [`StepProgram::step`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult<V> {
    /// Messages taken from the queue during this step.
    pub messages_processed: u32,
    /// Fresh view when anything changed, `None` otherwise.
    pub view: Option<V>,
    /// Monotonic count of rendered views.
    pub frame_idx: u64,
}

/// Host-driven, non-blocking program runner.
///
/// # Lifecycle
///
/// 1. [`StepProgram::new`]: wrap a model and a host.
/// 2. [`StepProgram::init`]: run `Model::init` and get the first view.
/// 3. [`StepProgram::step`]: call after pushing messages.
pub struct StepProgram<M: Model, H: Host> {
    model: M,
    host: H,
    queue: VecDeque<M::Message>,
    initialized: bool,
    dirty: bool,
    frame_idx: u64,
}

impl<M: Model, H: Host> StepProgram<M, H> {
    pub fn new(model: M, host: H) -> Self {
        Self {
            model,
            host,
            queue: VecDeque::new(),
            initialized: false,
            dirty: true,
            frame_idx: 0,
        }
    }

    /// Initialize the model and return the first view.
    ///
    /// Must be called exactly once before [`step`](Self::step).
    pub fn init(&mut self) -> Result<M::View, StepError> {
        if self.initialized {
            return Err(StepError::AlreadyInitialized);
        }
        self.initialized = true;
        let cmd = self.model.init();
        self.execute_cmd(cmd);
        Ok(self.render())
    }

    /// Queue a message for the next [`step`](Self::step).
    pub fn push_msg(&mut self, msg: M::Message) {
        self.queue.push_back(msg);
    }

    /// Process every queued message and render if anything changed.
    pub fn step(&mut self) -> Result<StepResult<M::View>, StepError> {
        if !self.initialized {
            return Err(StepError::NotInitialized);
        }

        let mut messages_processed: u32 = 0;
        while let Some(msg) = self.queue.pop_front() {
            messages_processed += 1;
            tracing::trace!(?msg, "update");
            let cmd = self.model.update(msg);
            self.dirty = true;
            self.execute_cmd(cmd);
        }

        let view = if self.dirty { Some(self.render()) } else { None };
        Ok(StepResult {
            messages_processed,
            view,
            frame_idx: self.frame_idx,
        })
    }

    /// Push one message and step.
    pub fn dispatch(&mut self, msg: M::Message) -> Result<StepResult<M::View>, StepError> {
        self.push_msg(msg);
        self.step()
    }

    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[must_use]
    pub fn frame_idx(&self) -> u64 {
        self.frame_idx
    }

    fn render(&mut self) -> M::View {
        self.dirty = false;
        self.frame_idx += 1;
        self.model.view()
    }

    fn execute_cmd(&mut self, cmd: Cmd) {
        match cmd {
            Cmd::None => {}
            Cmd::Batch(cmds) => {
                for c in cmds {
                    self.execute_cmd(c);
                }
            }
            Cmd::PlayChime => self.host.play_chime(),
            Cmd::RequestCamera(request) => self.host.request_camera(request),
            Cmd::AcceptCamera(request) => self.host.accept_camera(request),
            Cmd::DiscardCamera(request) => self.host.discard_camera(request),
            Cmd::ReleaseCamera => self.host.release_camera(),
            Cmd::StartOverlayLoop(signal) => self.host.start_overlay_loop(signal),
            Cmd::Alert(text) => self.host.alert(&text),
        }
    }
}

impl<M: Model + fmt::Debug, H: Host + fmt::Debug> fmt::Debug for StepProgram<M, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepProgram")
            .field("model", &self.model)
            .field("host", &self.host)
            .field("pending", &self.queue.len())
            .field("initialized", &self.initialized)
            .field("frame_idx", &self.frame_idx)
            .finish()
    }
}
