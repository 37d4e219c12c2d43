#![forbid(unsafe_code)]

//! `espejo-web` runs the Diario Espejo model under a host-driven loop.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedding environment pushes messages and
//!   executes side effects through the [`Host`] trait.
//! - **No blocking / no threads**: suitable for `wasm32-unknown-unknown`.
//! - **Testable without a browser**: [`RecordingHost`] captures every effect.
//!
//! This crate does not bind to `wasm-bindgen`; `espejo-frontend` implements
//! [`Host`] on top of the DOM and wraps everything in a JS API.

pub mod console_layer;
pub mod step_program;

use espejo_runtime::camera::CameraRequestId;
use espejo_runtime::frame_loop::FrameSignal;

pub use console_layer::{CaptureSink, ConsoleLayer, LogSink};
pub use step_program::{StepError, StepProgram, StepResult};

/// Executes the side effects requested by the model.
///
/// Implementations report asynchronous outcomes (camera granted, camera
/// refused) by pushing messages back into the [`StepProgram`].
///
/// A granted stream is held aside under its request id until the model
/// answers with [`accept_camera`](Host::accept_camera) or
/// [`discard_camera`](Host::discard_camera). Only an accepted stream is
/// ever shown.
pub trait Host {
    /// Play the confirmation chime, best effort.
    fn play_chime(&mut self);

    /// Start acquiring a video-only capture stream for `request`.
    fn request_camera(&mut self, request: CameraRequestId);

    /// Make the stream held for `request` the live session.
    fn accept_camera(&mut self, request: CameraRequestId);

    /// Stop the tracks of the stream held for `request`.
    fn discard_camera(&mut self, request: CameraRequestId);

    /// Stop the live session's tracks and clear the overlay surface.
    fn release_camera(&mut self);

    /// Start the overlay redraw loop, running until `signal` stops.
    fn start_overlay_loop(&mut self, signal: FrameSignal);

    /// Show a blocking alert.
    fn alert(&mut self, text: &str);
}

/// One side effect executed by a [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEffect {
    PlayChime,
    RequestCamera(CameraRequestId),
    AcceptCamera(CameraRequestId),
    DiscardCamera(CameraRequestId),
    ReleaseCamera,
    StartOverlayLoop,
    Alert(String),
}

/// Host that records effects instead of performing them.
#[derive(Debug, Default)]
pub struct RecordingHost {
    effects: Vec<HostEffect>,
    loops: Vec<FrameSignal>,
}

impl RecordingHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Effects in execution order.
    #[must_use]
    pub fn effects(&self) -> &[HostEffect] {
        &self.effects
    }

    /// Drain recorded effects.
    pub fn take_effects(&mut self) -> Vec<HostEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Camera requests in the order they were issued.
    #[must_use]
    pub fn camera_requests(&self) -> Vec<CameraRequestId> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                HostEffect::RequestCamera(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Number of overlay loops still allowed to run.
    #[must_use]
    pub fn running_loops(&self) -> usize {
        self.loops.iter().filter(|s| !s.is_stopped()).count()
    }

    /// Number of overlay loops ever started.
    #[must_use]
    pub fn started_loops(&self) -> usize {
        self.loops.len()
    }
}

impl Host for RecordingHost {
    fn play_chime(&mut self) {
        self.effects.push(HostEffect::PlayChime);
    }

    fn request_camera(&mut self, request: CameraRequestId) {
        self.effects.push(HostEffect::RequestCamera(request));
    }

    fn accept_camera(&mut self, request: CameraRequestId) {
        self.effects.push(HostEffect::AcceptCamera(request));
    }

    fn discard_camera(&mut self, request: CameraRequestId) {
        self.effects.push(HostEffect::DiscardCamera(request));
    }

    fn release_camera(&mut self) {
        self.effects.push(HostEffect::ReleaseCamera);
    }

    fn start_overlay_loop(&mut self, signal: FrameSignal) {
        self.effects.push(HostEffect::StartOverlayLoop);
        self.loops.push(signal);
    }

    fn alert(&mut self, text: &str) {
        self.effects.push(HostEffect::Alert(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use espejo_runtime::frame_loop::frame_pair;
    use pretty_assertions::assert_eq;

    #[test]
    fn recording_host_tracks_loops() {
        let mut host = RecordingHost::new();
        let (signal, trigger) = frame_pair();
        host.start_overlay_loop(signal);
        host.alert("hola");
        assert_eq!(host.running_loops(), 1);
        trigger.stop();
        assert_eq!(host.running_loops(), 0);
        assert_eq!(host.started_loops(), 1);
        assert_eq!(
            host.take_effects(),
            vec![HostEffect::StartOverlayLoop, HostEffect::Alert("hola".into())]
        );
        assert!(host.effects().is_empty());
    }

    #[test]
    fn camera_requests_keep_issue_order() {
        let mut host = RecordingHost::new();
        host.request_camera(CameraRequestId::new(2));
        host.discard_camera(CameraRequestId::new(2));
        host.request_camera(CameraRequestId::new(5));
        assert_eq!(
            host.camera_requests(),
            vec![CameraRequestId::new(2), CameraRequestId::new(5)]
        );
    }
}
