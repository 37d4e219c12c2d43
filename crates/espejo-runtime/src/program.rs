#![forbid(unsafe_code)]

//! Elm-style model and command vocabulary.
//!
//! A [`Model`] owns all application state. The host feeds it messages, it
//! answers with [`Cmd`]s describing side effects, and the host renders
//! [`Model::view`] whenever something changed.
//!
//! ```text
//! host event ──► Message ──► Model::update ──► Cmd ──► host executes
//!                                  │
//!                                  └──► Model::view ──► DOM
//! ```
//!
//! Everything runs on the single UI thread, so neither messages nor
//! commands need to be `Send`.

use std::fmt;

use crate::camera::CameraRequestId;
use crate::frame_loop::FrameSignal;

/// The application model.
pub trait Model: Sized {
    /// Messages the model reacts to.
    type Message: fmt::Debug + 'static;

    /// Snapshot handed to the host for rendering.
    type View;

    /// Startup commands, executed once before the first view.
    fn init(&mut self) -> Cmd {
        Cmd::none()
    }

    /// Apply one message.
    fn update(&mut self, msg: Self::Message) -> Cmd;

    /// Build the current view.
    fn view(&self) -> Self::View;
}

/// Side effects requested by the model.
#[derive(Default)]
pub enum Cmd {
    /// No operation.
    #[default]
    None,
    /// Execute commands in order.
    Batch(Vec<Cmd>),
    /// Play the confirmation chime. Best effort: hosts skip it silently
    /// when audio is unavailable.
    PlayChime,
    /// Ask the host for a video-only capture stream.
    ///
    /// The host answers with a "camera ready" or "camera failed" message
    /// tagged with the same request, and holds a granted stream until it is
    /// accepted or discarded.
    RequestCamera(CameraRequestId),
    /// Make the held stream for this request the live session.
    AcceptCamera(CameraRequestId),
    /// Stop the held stream for this request. The live session is untouched.
    DiscardCamera(CameraRequestId),
    /// Stop every track of the live session and clear the overlay canvas.
    ReleaseCamera,
    /// Start the overlay redraw loop; the loop ends once the signal stops.
    StartOverlayLoop(FrameSignal),
    /// Show a blocking alert.
    Alert(String),
}

impl fmt::Debug for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::PlayChime => write!(f, "PlayChime"),
            Self::RequestCamera(id) => f.debug_tuple("RequestCamera").field(id).finish(),
            Self::AcceptCamera(id) => f.debug_tuple("AcceptCamera").field(id).finish(),
            Self::DiscardCamera(id) => f.debug_tuple("DiscardCamera").field(id).finish(),
            Self::ReleaseCamera => write!(f, "ReleaseCamera"),
            Self::StartOverlayLoop(signal) => f
                .debug_struct("StartOverlayLoop")
                .field("stopped", &signal.is_stopped())
                .finish(),
            Self::Alert(s) => f.debug_tuple("Alert").field(s).finish(),
        }
    }
}

impl Cmd {
    /// Create a no-op command.
    #[inline]
    pub fn none() -> Self {
        Self::None
    }

    /// Create an alert command.
    #[inline]
    pub fn alert(text: impl Into<String>) -> Self {
        Self::Alert(text.into())
    }

    /// Combine commands, dropping no-ops.
    ///
    /// Collapses to `None` or the single remaining command when possible.
    pub fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|c| !c.is_none()).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.pop().unwrap_or(Self::None),
            _ => Self::Batch(cmds),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Number of leaf commands (batches flattened, `None` excluded).
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Batch(cmds) => cmds.iter().map(Self::count).sum(),
            _ => 1,
        }
    }

    /// Flatten into leaf commands in execution order.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(cmds) => cmds.into_iter().flat_map(Self::flatten).collect(),
            leaf => vec![leaf],
        }
    }
}
