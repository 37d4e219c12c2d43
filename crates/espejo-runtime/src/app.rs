#![forbid(unsafe_code)]

//! The Diario Espejo application model.
//!
//! [`EspejoApp`] owns every stateful component (router, diary, camera
//! controller, asset readiness, persistence) and is the only thing the host
//! talks to. Storage is injected at construction so tests run against
//! [`MemoryStorage`](crate::persistence::MemoryStorage).

use espejo_core::assets::AssetCache;
use espejo_core::diary::{Calendar, DetailPanel, Diary, DiaryProgress};
use espejo_core::generators::{
    ActivationForm, Mantra, PowerSymbol, ReconstructionRecord, SymbolRng, generate_mantras,
    generate_symbol,
};
use espejo_core::module::ModuleId;
use espejo_core::overlay::{DrawOp, Size, plan_frame};

use crate::camera::{CameraController, CameraRequestId, CameraState, EffectsButton};
use crate::persistence::ProgressStore;
use crate::program::{Cmd, Model};
use crate::router::{ModuleRouter, Transition, TransitionHook};

/// Status shown when progress could not be written.
pub const SAVE_FAILED_STATUS: &str =
    "No se pudo guardar tu progreso. Seguirá disponible mientras la página esté abierta.";

/// Everything the host can tell the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Navigation link clicked.
    Navigate(ModuleId),
    /// Landing button that leads to the activation module.
    RevealReflection,
    DayClicked(usize),
    CompleteDayClicked,
    ActivationSubmitted(ActivationForm),
    /// `name` is the activation form's name field at submit time.
    ReconstructionSubmitted {
        record: ReconstructionRecord,
        name: String,
    },
    ToggleEffects,
    /// The host holds a stream for `request`.
    CameraReady {
        request: CameraRequestId,
        width: u32,
        height: u32,
    },
    CameraFailed {
        request: CameraRequestId,
        reason: String,
    },
    /// Natural sizes of the decoded overlay images.
    OverlayImagesLoaded {
        aura: Size,
        third_eye: Size,
    },
    OverlayImagesFailed(String),
    ChimeLoaded,
    ChimeFailed(String),
}

/// Snapshot rendered by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct AppView {
    pub active: ModuleId,
    /// Every module with its visibility, in navigation order.
    pub modules: Vec<(ModuleId, bool)>,
    pub calendar: Calendar,
    pub panel: DetailPanel,
    pub effects_button: EffectsButton,
    pub camera: CameraState,
    pub mantras: Vec<Mantra>,
    /// Bumped on every activation submit, so identical output still
    /// replays the fade-in.
    pub mantra_round: u32,
    pub symbol: Option<PowerSymbol>,
    /// Non-blocking notice, e.g. a failed save.
    pub status: Option<String>,
}

/// Reloads the diary whenever its module is entered.
struct DiaryEntry<'a> {
    diary: &'a mut Diary,
    store: &'a ProgressStore,
}

impl TransitionHook for DiaryEntry<'_> {
    fn on_enter(&mut self, transition: Transition) -> Cmd {
        if transition.enters(ModuleId::DiarioEspejo) {
            self.diary.reset(self.store.load_diary_progress());
        }
        Cmd::none()
    }
}

/// Application state.
#[derive(Debug)]
pub struct EspejoApp {
    router: ModuleRouter,
    diary: Diary,
    store: ProgressStore,
    camera: CameraController,
    /// Overlay image sizes and chime readiness; the host keeps the handles.
    assets: AssetCache<Size, ()>,
    rng: SymbolRng,
    mantras: Vec<Mantra>,
    mantra_round: u32,
    symbol: Option<PowerSymbol>,
    status: Option<String>,
}

impl EspejoApp {
    pub fn new(store: ProgressStore, rng: SymbolRng) -> Self {
        Self {
            router: ModuleRouter::new(),
            diary: Diary::default(),
            store,
            camera: CameraController::new(),
            assets: AssetCache::new(),
            rng,
            mantras: Vec::new(),
            mantra_round: 0,
            symbol: None,
            status: None,
        }
    }

    #[must_use]
    pub fn active_module(&self) -> ModuleId {
        self.router.active()
    }

    #[must_use]
    pub fn diary(&self) -> &Diary {
        &self.diary
    }

    #[must_use]
    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    #[must_use]
    pub fn assets(&self) -> &AssetCache<Size, ()> {
        &self.assets
    }

    #[must_use]
    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Draw plan for one overlay frame on a surface of `surface` pixels.
    ///
    /// Empty unless the camera is live and both images are loaded.
    #[must_use]
    pub fn overlay_plan(&self, surface: Size) -> Vec<DrawOp> {
        if !self.camera.state().is_active() {
            return Vec::new();
        }
        plan_frame(
            surface,
            self.assets.aura().ready().copied(),
            self.assets.third_eye().ready().copied(),
        )
    }

    fn navigate(&mut self, target: ModuleId) -> Cmd {
        let mut diary_entry = DiaryEntry {
            diary: &mut self.diary,
            store: &self.store,
        };
        self.router
            .navigate(target, &mut [&mut self.camera, &mut diary_entry])
    }

    fn chime(&self) -> Cmd {
        if self.assets.sound().is_some() {
            Cmd::PlayChime
        } else {
            tracing::debug!("chime not loaded, staying silent");
            Cmd::none()
        }
    }

    fn persist_progress(&mut self, progress: &DiaryProgress) {
        match self.store.save_diary_progress(progress) {
            Ok(()) => self.status = None,
            Err(err) => {
                tracing::error!(error = %err, backend = self.store.backend_name(), "saving diary progress failed");
                self.status = Some(SAVE_FAILED_STATUS.to_string());
            }
        }
    }

    fn complete_day(&mut self) -> Cmd {
        match self.diary.complete_selected() {
            Ok(progress) => {
                self.persist_progress(&progress);
                self.chime()
            }
            Err(err) => {
                tracing::debug!(error = %err, "completion rejected");
                Cmd::none()
            }
        }
    }

    fn reconstruct(&mut self, record: ReconstructionRecord, name: &str) -> Cmd {
        match self.store.save_reconstruction(&record) {
            Ok(()) => self.status = None,
            Err(err) => {
                tracing::error!(error = %err, "saving reconstruction record failed");
                self.status = Some(SAVE_FAILED_STATUS.to_string());
            }
        }
        let symbol = generate_symbol(&record, name, &mut self.rng);
        tracing::info!(glyph = %symbol.glyph, "power symbol generated");
        self.symbol = Some(symbol);
        self.chime()
    }
}

impl Model for EspejoApp {
    type Message = Msg;
    type View = AppView;

    fn init(&mut self) -> Cmd {
        tracing::info!(
            module = %self.router.active(),
            storage = self.store.backend_name(),
            "diario espejo started"
        );
        Cmd::none()
    }

    fn update(&mut self, msg: Msg) -> Cmd {
        match msg {
            Msg::Navigate(target) => self.navigate(target),
            Msg::RevealReflection => self.navigate(ModuleId::ActivacionReflejo),
            Msg::DayClicked(day) => {
                self.diary.select_day(day);
                Cmd::none()
            }
            Msg::CompleteDayClicked => self.complete_day(),
            Msg::ActivationSubmitted(form) => {
                self.mantras = generate_mantras(&form);
                self.mantra_round = self.mantra_round.wrapping_add(1);
                Cmd::none()
            }
            Msg::ReconstructionSubmitted { record, name } => self.reconstruct(record, &name),
            Msg::ToggleEffects => self.camera.toggle(),
            Msg::CameraReady {
                request,
                width,
                height,
            } => self.camera.on_stream_ready(request, width, height),
            Msg::CameraFailed { request, reason } => self.camera.on_stream_failed(request, &reason),
            Msg::OverlayImagesLoaded { aura, third_eye } => {
                if self.assets.set_overlay_images(aura, third_eye) {
                    self.camera
                        .images_loaded(self.router.is_active(ModuleId::ReconociendoImagen));
                }
                Cmd::none()
            }
            Msg::OverlayImagesFailed(reason) => {
                tracing::warn!(reason = %reason, "overlay images failed to load");
                if self.assets.fail_overlay_images(&reason) {
                    self.camera.images_failed();
                }
                Cmd::none()
            }
            Msg::ChimeLoaded => {
                self.assets.set_shimmer(());
                Cmd::none()
            }
            Msg::ChimeFailed(reason) => {
                tracing::warn!(reason = %reason, "chime failed to load");
                self.assets.fail_shimmer(&reason);
                Cmd::none()
            }
        }
    }

    fn view(&self) -> AppView {
        AppView {
            active: self.router.active(),
            modules: self.router.visibility(),
            calendar: self.diary.render(),
            panel: self.diary.panel().clone(),
            effects_button: self.camera.button(),
            camera: self.camera.state(),
            mantras: self.mantras.clone(),
            mantra_round: self.mantra_round,
            symbol: self.symbol.clone(),
            status: self.status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    fn app() -> EspejoApp {
        EspejoApp::new(ProgressStore::new(MemoryStorage::new()), SymbolRng::new(3))
    }

    #[test]
    fn reveal_button_opens_activation() {
        let mut app = app();
        let _ = app.update(Msg::RevealReflection);
        assert_eq!(app.active_module(), ModuleId::ActivacionReflejo);
    }

    #[test]
    fn chime_requires_loaded_sound() {
        let mut app = app();
        let _ = app.update(Msg::Navigate(ModuleId::DiarioEspejo));
        let _ = app.update(Msg::DayClicked(0));
        assert!(app.update(Msg::CompleteDayClicked).is_none());

        let _ = app.update(Msg::ChimeLoaded);
        let _ = app.update(Msg::DayClicked(1));
        assert!(matches!(app.update(Msg::CompleteDayClicked), Cmd::PlayChime));
    }

    #[test]
    fn activation_replaces_previous_mantras() {
        let mut app = app();
        let _ = app.update(Msg::ActivationSubmitted(ActivationForm {
            name: "Sol".into(),
            wounds: "x".into(),
            beliefs: "y".into(),
        }));
        assert_eq!(app.view().mantras.len(), 4);
        let _ = app.update(Msg::ActivationSubmitted(ActivationForm::default()));
        assert_eq!(app.view().mantras.len(), 1);
    }

    #[test]
    fn identical_submissions_still_bump_the_round() {
        let mut app = app();
        let _ = app.update(Msg::ActivationSubmitted(ActivationForm::default()));
        let first = app.view();
        let _ = app.update(Msg::ActivationSubmitted(ActivationForm::default()));
        let second = app.view();
        assert_eq!(first.mantras, second.mantras);
        assert_eq!(second.mantra_round, first.mantra_round + 1);
    }

    #[test]
    fn overlay_plan_needs_live_camera() {
        let mut app = app();
        let img = Size::new(100.0, 50.0);
        let _ = app.update(Msg::OverlayImagesLoaded {
            aura: img,
            third_eye: img,
        });
        let surface = Size::new(640.0, 480.0);
        assert!(app.overlay_plan(surface).is_empty());

        let _ = app.update(Msg::Navigate(ModuleId::ReconociendoImagen));
        let Cmd::RequestCamera(request) = app.update(Msg::ToggleEffects) else {
            panic!("camera request expected");
        };
        let _ = app.update(Msg::CameraReady {
            request,
            width: 640,
            height: 480,
        });
        assert_eq!(app.overlay_plan(surface).len(), 8);
    }
}
