#![forbid(unsafe_code)]

//! Cancellation for per-frame redraw loops.
//!
//! A redraw loop holds a [`FrameSignal`] and checks it on every display
//! refresh tick; whoever started the loop keeps the matching
//! [`FrameTrigger`]. Stopping the trigger (or dropping it) ends the loop at
//! its next tick. Once stopped, a signal never resumes.

use std::cell::Cell;
use std::rc::Rc;

/// Loop-side half: checked once per frame.
#[derive(Debug, Clone)]
pub struct FrameSignal {
    stopped: Rc<Cell<bool>>,
}

impl FrameSignal {
    /// Whether the loop should exit.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// Owner-side half. Stops the loop when told to or when dropped.
#[derive(Debug)]
pub struct FrameTrigger {
    stopped: Rc<Cell<bool>>,
}

impl FrameTrigger {
    /// Signal the loop to stop.
    pub fn stop(&self) {
        self.stopped.set(true);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

impl Drop for FrameTrigger {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Create a connected signal/trigger pair.
#[must_use]
pub fn frame_pair() -> (FrameSignal, FrameTrigger) {
    let stopped = Rc::new(Cell::new(false));
    (
        FrameSignal {
            stopped: Rc::clone(&stopped),
        },
        FrameTrigger { stopped },
    )
}
