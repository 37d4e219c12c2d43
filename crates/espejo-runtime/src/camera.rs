#![forbid(unsafe_code)]

//! Camera session lifecycle and the effects button.
//!
//! ```text
//!            toggle                 stream ready
//! Inactive ─────────► Requesting ─────────────────► Active
//!    ▲                   │  │                          │
//!    │   stream failed   │  │ toggle / leave module    │ toggle / leave module
//!    ├───────────────────┘  │                          │
//!    └──────────────────────┴──────────────────────────┘
//! ```
//!
//! The controller never holds the stream itself; it tells the host what to
//! do through [`Cmd`]s. While active it owns the [`FrameTrigger`] of the
//! overlay loop, so leaving the active state always stops the loop.
//!
//! Every request carries a fresh [`CameraRequestId`]. Only the stream that
//! answers the pending request is accepted; any other is discarded by the
//! host without touching the live session.

use std::fmt;

use espejo_core::module::ModuleId;

use crate::frame_loop::{FrameTrigger, frame_pair};
use crate::program::Cmd;
use crate::router::{Transition, TransitionHook};

/// Alert shown when capture is refused or unavailable.
pub const CAMERA_DENIED_ALERT: &str =
    "No se pudo acceder a la cámara. Por favor, otorga los permisos necesarios.";

pub const LABEL_LOADING: &str = "Cargando efectos...";
pub const LABEL_ACTIVATE: &str = "Activar Filtros Solares";
pub const LABEL_DEACTIVATE: &str = "Desactivar Efectos";
pub const LABEL_LOAD_ERROR: &str = "Error al cargar efectos";

/// Session state as seen by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraState {
    #[default]
    Inactive,
    /// Waiting for the host to grant (or refuse) a stream.
    Requesting,
    /// Stream live at its native resolution.
    Active { width: u32, height: u32 },
}

impl CameraState {
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

/// Identity of one capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraRequestId(u64);

impl CameraRequestId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for CameraRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Load state of the two overlay images, as far as the button cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum OverlayImages {
    #[default]
    Loading,
    Ready,
    Failed,
}

/// Rendered state of the effects button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectsButton {
    pub label: &'static str,
    pub disabled: bool,
}

/// Owns the camera state machine.
#[derive(Debug, Default)]
pub struct CameraController {
    state: CameraState,
    images: OverlayImages,
    /// Set once the button was enabled with both images present.
    armed: bool,
    /// Request awaiting an answer; `Some` exactly while `Requesting`.
    pending: Option<CameraRequestId>,
    last_request: u64,
    overlay_loop: Option<FrameTrigger>,
}

impl CameraController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> CameraState {
        self.state
    }

    /// Whether an overlay loop is currently allowed to run.
    #[must_use]
    pub fn overlay_running(&self) -> bool {
        self.overlay_loop.as_ref().is_some_and(|t| !t.is_stopped())
    }

    /// Current button label and enablement.
    #[must_use]
    pub fn button(&self) -> EffectsButton {
        match (self.images, self.state) {
            (OverlayImages::Failed, _) => EffectsButton {
                label: LABEL_LOAD_ERROR,
                disabled: true,
            },
            (_, CameraState::Requesting | CameraState::Active { .. }) => EffectsButton {
                label: LABEL_DEACTIVATE,
                disabled: false,
            },
            (OverlayImages::Ready, CameraState::Inactive) if self.armed => EffectsButton {
                label: LABEL_ACTIVATE,
                disabled: false,
            },
            _ => EffectsButton {
                label: LABEL_LOADING,
                disabled: true,
            },
        }
    }

    /// Both overlay images decoded. Arms the button right away when the
    /// camera module is on screen, otherwise on the next visit.
    pub fn images_loaded(&mut self, module_active: bool) {
        if self.images != OverlayImages::Loading {
            return;
        }
        self.images = OverlayImages::Ready;
        if module_active {
            self.armed = true;
        }
    }

    /// An overlay image failed to load. The button stays disabled.
    pub fn images_failed(&mut self) {
        if self.images == OverlayImages::Loading {
            self.images = OverlayImages::Failed;
            self.armed = false;
        }
    }

    /// Button click.
    pub fn toggle(&mut self) -> Cmd {
        if self.button().disabled {
            tracing::debug!(state = ?self.state, "effects button disabled, click ignored");
            return Cmd::none();
        }
        match self.state {
            CameraState::Inactive => {
                self.last_request += 1;
                let request = CameraRequestId(self.last_request);
                self.pending = Some(request);
                self.state = CameraState::Requesting;
                tracing::info!(%request, "requesting camera");
                Cmd::RequestCamera(request)
            }
            CameraState::Requesting | CameraState::Active { .. } => self.deactivate(),
        }
    }

    /// The host obtained a `width`×`height` stream for `request`.
    ///
    /// A stream answering an abandoned or superseded request is discarded
    /// straight away; the live session, if any, is left alone.
    pub fn on_stream_ready(
        &mut self,
        request: CameraRequestId,
        width: u32,
        height: u32,
    ) -> Cmd {
        if self.pending != Some(request) {
            tracing::warn!(%request, state = ?self.state, "stale camera stream, discarding");
            return Cmd::DiscardCamera(request);
        }
        self.pending = None;
        let (signal, trigger) = frame_pair();
        self.overlay_loop = Some(trigger);
        self.state = CameraState::Active { width, height };
        tracing::info!(%request, width, height, "camera active");
        Cmd::batch(vec![
            Cmd::AcceptCamera(request),
            Cmd::StartOverlayLoop(signal),
        ])
    }

    /// The host could not obtain a stream for `request`.
    pub fn on_stream_failed(&mut self, request: CameraRequestId, reason: &str) -> Cmd {
        if self.pending != Some(request) {
            tracing::debug!(%request, reason, "camera failure for abandoned request");
            return Cmd::none();
        }
        self.pending = None;
        self.state = CameraState::Inactive;
        tracing::warn!(reason, "camera access failed");
        Cmd::alert(CAMERA_DENIED_ALERT)
    }

    /// Stop any session. Idempotent.
    pub fn deactivate(&mut self) -> Cmd {
        let previous = std::mem::take(&mut self.state);
        self.pending = None;
        if let Some(trigger) = self.overlay_loop.take() {
            trigger.stop();
        }
        match previous {
            CameraState::Inactive => Cmd::none(),
            CameraState::Requesting => {
                tracing::info!("camera request abandoned");
                Cmd::none()
            }
            CameraState::Active { .. } => {
                tracing::info!("camera deactivated");
                Cmd::ReleaseCamera
            }
        }
    }
}

impl TransitionHook for CameraController {
    fn on_exit(&mut self, transition: Transition) -> Cmd {
        if transition.leaves(ModuleId::ReconociendoImagen) {
            self.deactivate()
        } else {
            Cmd::none()
        }
    }

    fn on_enter(&mut self, transition: Transition) -> Cmd {
        if transition.enters(ModuleId::ReconociendoImagen) && self.images == OverlayImages::Ready
        {
            self.armed = true;
        }
        Cmd::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_loop::FrameSignal;

    fn ready() -> CameraController {
        let mut camera = CameraController::new();
        camera.images_loaded(true);
        camera
    }

    #[test]
    fn button_waits_for_images() {
        let mut camera = CameraController::new();
        assert_eq!(
            camera.button(),
            EffectsButton {
                label: LABEL_LOADING,
                disabled: true
            }
        );
        assert!(camera.toggle().is_none());
        assert_eq!(camera.state(), CameraState::Inactive);
    }

    #[test]
    fn images_loaded_elsewhere_arm_on_enter() {
        let mut camera = CameraController::new();
        camera.images_loaded(false);
        assert!(camera.button().disabled);

        let enter = Transition {
            from: ModuleId::InicioSolar,
            to: ModuleId::ReconociendoImagen,
        };
        let _ = TransitionHook::on_enter(&mut camera, enter);
        assert_eq!(camera.button().label, LABEL_ACTIVATE);
        assert!(!camera.button().disabled);
    }

    #[test]
    fn failed_images_disable_button() {
        let mut camera = CameraController::new();
        camera.images_failed();
        camera.images_loaded(true);
        assert_eq!(
            camera.button(),
            EffectsButton {
                label: LABEL_LOAD_ERROR,
                disabled: true
            }
        );
    }

    fn request(camera: &mut CameraController) -> CameraRequestId {
        match camera.toggle() {
            Cmd::RequestCamera(request) => request,
            other => panic!("expected a camera request, got {other:?}"),
        }
    }

    fn overlay_signal(cmd: Cmd) -> FrameSignal {
        cmd.flatten()
            .into_iter()
            .find_map(|c| match c {
                Cmd::StartOverlayLoop(signal) => Some(signal),
                _ => None,
            })
            .expect("overlay loop started")
    }

    #[test]
    fn toggle_runs_full_cycle() {
        let mut camera = ready();
        let id = request(&mut camera);
        assert_eq!(camera.button().label, LABEL_DEACTIVATE);

        let leaves = camera.on_stream_ready(id, 640, 480).flatten();
        assert!(matches!(leaves[0], Cmd::AcceptCamera(accepted) if accepted == id));
        let signal = overlay_signal(Cmd::Batch(leaves));
        assert!(camera.overlay_running());
        assert_eq!(
            camera.state(),
            CameraState::Active {
                width: 640,
                height: 480
            }
        );

        assert!(matches!(camera.toggle(), Cmd::ReleaseCamera));
        assert!(signal.is_stopped());
        assert_eq!(camera.state(), CameraState::Inactive);
        assert_eq!(camera.button().label, LABEL_ACTIVATE);
    }

    #[test]
    fn every_request_gets_a_fresh_id() {
        let mut camera = ready();
        let first = request(&mut camera);
        let _ = camera.toggle();
        let second = request(&mut camera);
        assert_ne!(first, second);
    }

    #[test]
    fn denied_camera_alerts_and_stays_inactive() {
        let mut camera = ready();
        let id = request(&mut camera);
        let cmd = camera.on_stream_failed(id, "NotAllowedError");
        assert!(matches!(&cmd, Cmd::Alert(text) if text == CAMERA_DENIED_ALERT));
        assert_eq!(camera.state(), CameraState::Inactive);
        assert!(!camera.overlay_running());
    }

    #[test]
    fn late_stream_is_discarded() {
        let mut camera = ready();
        let id = request(&mut camera);
        assert!(camera.deactivate().is_none());
        assert!(matches!(
            camera.on_stream_ready(id, 320, 240),
            Cmd::DiscardCamera(discarded) if discarded == id
        ));
        assert_eq!(camera.state(), CameraState::Inactive);
        assert!(!camera.overlay_running());
    }

    #[test]
    fn superseded_stream_never_becomes_the_session() {
        let mut camera = ready();
        let stale = request(&mut camera);
        let _ = camera.toggle();
        let live = request(&mut camera);

        assert!(matches!(
            camera.on_stream_ready(stale, 640, 480),
            Cmd::DiscardCamera(id) if id == stale
        ));
        assert_eq!(camera.state(), CameraState::Requesting);
        assert!(!camera.overlay_running());

        let signal = overlay_signal(camera.on_stream_ready(live, 1280, 720));
        assert_eq!(
            camera.state(),
            CameraState::Active {
                width: 1280,
                height: 720
            }
        );
        assert!(!signal.is_stopped());
    }

    #[test]
    fn stale_failure_leaves_pending_request_alone() {
        let mut camera = ready();
        let stale = request(&mut camera);
        let _ = camera.toggle();
        let live = request(&mut camera);
        assert!(camera.on_stream_failed(stale, "AbortError").is_none());
        assert_eq!(camera.state(), CameraState::Requesting);
        let _ = camera.on_stream_ready(live, 320, 240);
        assert!(camera.state().is_active());
    }

    #[test]
    fn stream_for_live_session_is_not_accepted_twice() {
        let mut camera = ready();
        let id = request(&mut camera);
        let _ = camera.on_stream_ready(id, 320, 240);
        assert!(matches!(
            camera.on_stream_ready(id, 320, 240),
            Cmd::DiscardCamera(_)
        ));
        assert!(camera.overlay_running());
    }

    #[test]
    fn deactivate_is_idempotent() {
        let mut camera = ready();
        let id = request(&mut camera);
        let _ = camera.on_stream_ready(id, 320, 240);
        assert!(matches!(camera.deactivate(), Cmd::ReleaseCamera));
        assert!(camera.deactivate().is_none());
        assert!(camera.deactivate().is_none());
    }

    #[test]
    fn leaving_module_stops_session() {
        let mut camera = ready();
        let id = request(&mut camera);
        let _ = camera.on_stream_ready(id, 320, 240);
        let leave = Transition {
            from: ModuleId::ReconociendoImagen,
            to: ModuleId::DiarioEspejo,
        };
        let cmd = TransitionHook::on_exit(&mut camera, leave);
        assert!(matches!(cmd, Cmd::ReleaseCamera));
        assert_eq!(camera.state(), CameraState::Inactive);
    }
}
