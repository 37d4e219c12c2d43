//! Camera lifecycle driven through the application model.

use std::collections::HashMap;

use espejo_core::generators::SymbolRng;
use espejo_core::module::ModuleId;
use espejo_core::overlay::Size;
use espejo_runtime::camera::{CAMERA_DENIED_ALERT, LABEL_ACTIVATE, LABEL_DEACTIVATE, LABEL_LOAD_ERROR};
use espejo_runtime::{
    CameraRequestId, CameraState, Cmd, EspejoApp, FrameSignal, MemoryStorage, Model, Msg,
    ProgressStore,
};
use proptest::prelude::*;

fn camera_app() -> EspejoApp {
    let mut app = EspejoApp::new(ProgressStore::new(MemoryStorage::new()), SymbolRng::new(1));
    let img = Size::new(256.0, 256.0);
    let _ = app.update(Msg::OverlayImagesLoaded {
        aura: img,
        third_eye: img,
    });
    let _ = app.update(Msg::Navigate(ModuleId::ReconociendoImagen));
    app
}

fn toggle_request(app: &mut EspejoApp) -> CameraRequestId {
    match app.update(Msg::ToggleEffects) {
        Cmd::RequestCamera(request) => request,
        other => panic!("expected a camera request, got {other:?}"),
    }
}

fn ready(request: CameraRequestId, width: u32, height: u32) -> Msg {
    Msg::CameraReady {
        request,
        width,
        height,
    }
}

fn overlay_signal(cmd: Cmd) -> Option<FrameSignal> {
    cmd.flatten().into_iter().find_map(|c| match c {
        Cmd::StartOverlayLoop(signal) => Some(signal),
        _ => None,
    })
}

#[test]
fn denied_camera_never_starts_overlay() {
    let mut app = camera_app();
    let request = toggle_request(&mut app);

    let cmd = app.update(Msg::CameraFailed {
        request,
        reason: "NotAllowedError".into(),
    });
    let leaves = cmd.flatten();
    assert_eq!(leaves.len(), 1);
    assert!(matches!(&leaves[0], Cmd::Alert(text) if text == CAMERA_DENIED_ALERT));

    assert_eq!(app.view().camera, CameraState::Inactive);
    assert!(!app.camera().overlay_running());
    assert!(app.overlay_plan(Size::new(640.0, 480.0)).is_empty());
    assert_eq!(app.view().effects_button.label, LABEL_ACTIVATE);
}

#[test]
fn leaving_module_releases_camera() {
    let mut app = camera_app();
    let request = toggle_request(&mut app);
    let signal = overlay_signal(app.update(ready(request, 1280, 720))).expect("overlay loop");
    assert_eq!(app.view().effects_button.label, LABEL_DEACTIVATE);

    let cmd = app.update(Msg::Navigate(ModuleId::DiarioEspejo));
    assert!(
        cmd.flatten()
            .iter()
            .any(|c| matches!(c, Cmd::ReleaseCamera))
    );
    assert!(signal.is_stopped());
    assert_eq!(app.view().camera, CameraState::Inactive);

    // Leaving again (from a module without a camera) is harmless.
    let cmd = app.update(Msg::Navigate(ModuleId::InicioSolar));
    assert!(
        !cmd.flatten()
            .iter()
            .any(|c| matches!(c, Cmd::ReleaseCamera))
    );
}

#[test]
fn navigating_away_mid_request_discards_late_stream() {
    let mut app = camera_app();
    let request = toggle_request(&mut app);
    let _ = app.update(Msg::Navigate(ModuleId::InicioSolar));
    let cmd = app.update(ready(request, 640, 480));
    assert!(matches!(cmd, Cmd::DiscardCamera(id) if id == request));
    assert_eq!(app.view().camera, CameraState::Inactive);
}

#[test]
fn reactivating_before_first_grant_keeps_only_the_newest_stream() {
    let mut app = camera_app();
    let first = toggle_request(&mut app);
    assert!(app.update(Msg::ToggleEffects).is_none());
    let second = toggle_request(&mut app);

    // The abandoned request answers first.
    let cmd = app.update(ready(first, 640, 480));
    assert!(matches!(cmd, Cmd::DiscardCamera(id) if id == first));
    assert_eq!(app.view().camera, CameraState::Requesting);
    assert!(!app.camera().overlay_running());

    let leaves = app.update(ready(second, 1280, 720)).flatten();
    assert!(matches!(leaves[0], Cmd::AcceptCamera(id) if id == second));
    assert!(matches!(leaves[1], Cmd::StartOverlayLoop(_)));
    assert_eq!(
        app.view().camera,
        CameraState::Active {
            width: 1280,
            height: 720
        }
    );
    assert!(app.camera().overlay_running());
}

#[test]
fn image_failure_blocks_activation() {
    let mut app = EspejoApp::new(ProgressStore::new(MemoryStorage::new()), SymbolRng::new(1));
    let _ = app.update(Msg::Navigate(ModuleId::ReconociendoImagen));
    let _ = app.update(Msg::OverlayImagesFailed("404".into()));

    let button = app.view().effects_button;
    assert_eq!(button.label, LABEL_LOAD_ERROR);
    assert!(button.disabled);
    assert!(app.update(Msg::ToggleEffects).is_none());
}

// ── Property: sessions match live streams ─────────────────────────────

/// Host stand-in that tracks stream ownership the way the browser shell does.
#[derive(Default)]
struct StreamLedger {
    outstanding: Vec<CameraRequestId>,
    held: HashMap<CameraRequestId, u32>,
    live: Option<u32>,
    granted: u32,
    signals: Vec<FrameSignal>,
}

impl StreamLedger {
    fn execute(&mut self, cmd: Cmd) {
        for leaf in cmd.flatten() {
            match leaf {
                Cmd::RequestCamera(id) => self.outstanding.push(id),
                Cmd::AcceptCamera(id) => {
                    let stream = self.held.remove(&id).expect("accepted stream was held");
                    assert!(self.live.is_none(), "accepted over a live session");
                    self.live = Some(stream);
                }
                Cmd::DiscardCamera(id) => {
                    assert!(self.held.remove(&id).is_some(), "discarded stream was held");
                }
                Cmd::ReleaseCamera => self.live = None,
                Cmd::StartOverlayLoop(signal) => self.signals.push(signal),
                _ => {}
            }
        }
    }

    /// Answer the `pick`-th outstanding request.
    fn answer(&mut self, pick: usize, granted: bool) -> Option<Msg> {
        if self.outstanding.is_empty() {
            return None;
        }
        let request = self.outstanding.remove(pick % self.outstanding.len());
        if granted {
            self.granted += 1;
            self.held.insert(request, self.granted);
            Some(ready(request, 320, 240))
        } else {
            Some(Msg::CameraFailed {
                request,
                reason: "NotReadableError".into(),
            })
        }
    }
}

#[derive(Debug, Clone)]
enum Step {
    Toggle,
    Grant(usize),
    Deny(usize),
    Go(ModuleId),
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::Toggle),
        2 => (0..4usize).prop_map(Step::Grant),
        1 => (0..4usize).prop_map(Step::Deny),
        1 => prop::sample::select(ModuleId::ALL).prop_map(Step::Go),
    ]
}

proptest! {
    #[test]
    fn session_never_survives_outside_camera_module(steps in prop::collection::vec(arb_step(), 1..40)) {
        let mut app = camera_app();
        let mut host = StreamLedger::default();
        for step in steps {
            let on_module = app.active_module() == ModuleId::ReconociendoImagen;
            let msg = match step {
                // The button is hidden with its module.
                Step::Toggle if !on_module => continue,
                Step::Toggle => Msg::ToggleEffects,
                Step::Grant(pick) => match host.answer(pick, true) {
                    Some(msg) => msg,
                    None => continue,
                },
                Step::Deny(pick) => match host.answer(pick, false) {
                    Some(msg) => msg,
                    None => continue,
                },
                Step::Go(module) => Msg::Navigate(module),
            };
            host.execute(app.update(msg));

            // Every granted stream is settled right away.
            prop_assert!(host.held.is_empty());
            prop_assert_eq!(app.view().camera.is_active(), host.live.is_some());
            prop_assert_eq!(app.camera().overlay_running(), host.live.is_some());
            if app.active_module() != ModuleId::ReconociendoImagen {
                prop_assert_eq!(app.view().camera, CameraState::Inactive);
                prop_assert!(host.signals.iter().all(|s| s.is_stopped()));
            }
        }
    }
}
