//! The full application driven through `StepProgram` with a recording host.

use std::rc::Rc;

use espejo_core::diary::{DIARY_DAYS, DayState};
use espejo_core::generators::{ActivationForm, SymbolRng};
use espejo_core::module::ModuleId;
use espejo_core::overlay::Size;
use espejo_runtime::camera::CAMERA_DENIED_ALERT;
use espejo_runtime::persistence::DIARY_PROGRESS_KEY;
use espejo_runtime::{EspejoApp, MemoryStorage, Msg, ProgressStore, StorageBackend};
use espejo_web::{HostEffect, RecordingHost, StepProgram};
use pretty_assertions::assert_eq;

type Program = StepProgram<EspejoApp, RecordingHost>;

fn program(storage: &Rc<MemoryStorage>) -> Program {
    let app = EspejoApp::new(ProgressStore::new(Rc::clone(storage)), SymbolRng::new(5));
    let mut prog = StepProgram::new(app, RecordingHost::new());
    let first = prog.init().expect("first init");
    assert_eq!(first.active, ModuleId::InicioSolar);
    prog
}

fn load_assets(prog: &mut Program) {
    let img = Size::new(512.0, 512.0);
    prog.push_msg(Msg::OverlayImagesLoaded {
        aura: img,
        third_eye: img,
    });
    prog.push_msg(Msg::ChimeLoaded);
    let _ = prog.step().unwrap();
}

#[test]
fn diary_completion_persists_and_chimes() {
    let storage = Rc::new(MemoryStorage::new());
    let mut prog = program(&storage);
    load_assets(&mut prog);

    prog.push_msg(Msg::Navigate(ModuleId::DiarioEspejo));
    prog.push_msg(Msg::DayClicked(0));
    prog.push_msg(Msg::CompleteDayClicked);
    let result = prog.step().unwrap();
    assert_eq!(result.messages_processed, 3);

    let view = result.view.expect("view after changes");
    assert_eq!(view.calendar.cards[0].state, DayState::Completed);
    assert_eq!(view.calendar.cards[1].state, DayState::Current);
    assert_eq!(prog.host().effects(), &[HostEffect::PlayChime]);

    let raw = storage.get(DIARY_PROGRESS_KEY).unwrap().unwrap();
    let flags: Vec<bool> = serde_json::from_str(&raw).unwrap();
    assert_eq!(flags.len(), DIARY_DAYS);
    assert!(flags[0]);
}

#[test]
fn denied_camera_alerts_without_loop() {
    let storage = Rc::new(MemoryStorage::new());
    let mut prog = program(&storage);
    load_assets(&mut prog);

    let _ = prog.dispatch(Msg::Navigate(ModuleId::ReconociendoImagen));
    let _ = prog.dispatch(Msg::ToggleEffects);
    let request = prog.host().camera_requests()[0];
    let _ = prog.dispatch(Msg::CameraFailed {
        request,
        reason: "NotAllowedError".into(),
    });

    assert_eq!(
        prog.host().effects(),
        &[
            HostEffect::RequestCamera(request),
            HostEffect::Alert(CAMERA_DENIED_ALERT.to_string())
        ]
    );
    assert_eq!(prog.host().started_loops(), 0);
}

#[test]
fn overlay_loop_stops_when_leaving_module() {
    let storage = Rc::new(MemoryStorage::new());
    let mut prog = program(&storage);
    load_assets(&mut prog);

    let _ = prog.dispatch(Msg::Navigate(ModuleId::ReconociendoImagen));
    let _ = prog.dispatch(Msg::ToggleEffects);
    let request = prog.host().camera_requests()[0];
    let _ = prog.dispatch(Msg::CameraReady {
        request,
        width: 640,
        height: 480,
    });
    assert_eq!(prog.host().running_loops(), 1);
    assert_eq!(prog.model().overlay_plan(Size::new(640.0, 480.0)).len(), 8);

    let _ = prog.dispatch(Msg::Navigate(ModuleId::DiarioEspejo));
    assert_eq!(prog.host().running_loops(), 0);
    assert_eq!(
        prog.host().effects().last(),
        Some(&HostEffect::ReleaseCamera)
    );
    assert!(prog.model().overlay_plan(Size::new(640.0, 480.0)).is_empty());
}

#[test]
fn only_the_newest_request_becomes_the_session() {
    let storage = Rc::new(MemoryStorage::new());
    let mut prog = program(&storage);
    load_assets(&mut prog);

    let _ = prog.dispatch(Msg::Navigate(ModuleId::ReconociendoImagen));
    prog.push_msg(Msg::ToggleEffects);
    prog.push_msg(Msg::ToggleEffects);
    prog.push_msg(Msg::ToggleEffects);
    let _ = prog.step().unwrap();
    let requests = prog.host().camera_requests();
    assert_eq!(requests.len(), 2);
    let (first, second) = (requests[0], requests[1]);
    assert_ne!(first, second);

    prog.host_mut().take_effects();
    prog.push_msg(Msg::CameraReady {
        request: first,
        width: 320,
        height: 240,
    });
    prog.push_msg(Msg::CameraReady {
        request: second,
        width: 1280,
        height: 720,
    });
    let _ = prog.step().unwrap();

    assert_eq!(
        prog.host().effects(),
        &[
            HostEffect::DiscardCamera(first),
            HostEffect::AcceptCamera(second),
            HostEffect::StartOverlayLoop,
        ]
    );
    assert_eq!(prog.host().running_loops(), 1);
}

#[test]
fn mantras_carry_linear_reveal_delays() {
    let storage = Rc::new(MemoryStorage::new());
    let mut prog = program(&storage);
    let view = prog
        .dispatch(Msg::ActivationSubmitted(ActivationForm {
            name: "Aurora".into(),
            wounds: String::new(),
            beliefs: "escasez".into(),
        }))
        .unwrap()
        .view
        .unwrap();

    let delays: Vec<u64> = view
        .mantras
        .iter()
        .map(|m| m.reveal_delay.as_secs())
        .collect();
    assert_eq!(delays, vec![0, 1, 2]);
    assert_eq!(view.mantras[0].text, "Yo, Aurora, soy un ser de luz infinita.");
}

#[test]
fn idle_step_renders_nothing() {
    let storage = Rc::new(MemoryStorage::new());
    let mut prog = program(&storage);
    let result = prog.step().unwrap();
    assert_eq!(result.view, None);
    assert!(prog.host().effects().is_empty());
}
