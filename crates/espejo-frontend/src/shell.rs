#![forbid(unsafe_code)]

//! The running page: step program, browser host, DOM view and listeners.
//!
//! Everything lives behind one `Rc<RefCell<Shell>>`. Callbacks that outlive
//! a single event (async loads, the camera request, the overlay loop) hold
//! only a [`Weak`] so dropping the shell tears the page down.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use espejo_runtime::app::{EspejoApp, Msg};
use espejo_runtime::camera::CameraRequestId;
use espejo_runtime::frame_loop::FrameSignal;
use espejo_web::{Host, StepProgram};
use wasm_bindgen_futures::spawn_local;
use web_sys::Document;

use crate::assets::{OverlayImages, SoundPlayer};
use crate::camera::{CameraSurface, open_stream};
use crate::config::FrontendConfig;
use crate::dom::{DomView, Listener};
use crate::frame::run_frames;
use crate::js_error_text;
use crate::sun_stage::SunHandle;

pub type SharedShell = Rc<RefCell<Shell>>;

pub struct Shell {
    program: StepProgram<EspejoApp, BrowserHost>,
    view: DomView,
    listeners: Vec<Listener>,
    sun: Option<SunHandle>,
}

impl Shell {
    /// Build the shell around `app`. Nothing is rendered or wired yet.
    pub fn new(app: EspejoApp, document: Document) -> SharedShell {
        let camera = match CameraSurface::find(&document) {
            Ok(camera) => Some(camera),
            Err(e) => {
                tracing::warn!(error = %js_error_text(&e), "camera elements unavailable");
                None
            }
        };
        Rc::new_cyclic(|weak| {
            RefCell::new(Self {
                program: StepProgram::new(
                    app,
                    BrowserHost {
                        shell: weak.clone(),
                        camera,
                        images: None,
                        sound: None,
                    },
                ),
                view: DomView::new(document),
                listeners: Vec::new(),
                sun: None,
            })
        })
    }

    /// Initialize the model, draw the first view and attach listeners.
    pub fn start(shell: &SharedShell) -> Result<(), String> {
        let weak = Rc::downgrade(shell);
        let mut guard = shell.borrow_mut();
        let this = &mut *guard;
        let view = this.program.init().map_err(|e| e.to_string())?;
        this.view.render(view).map_err(|e| js_error_text(&e))?;
        this.listeners = crate::dom::wire(this.view.document(), move |msg| {
            dispatch(&weak, msg);
        })
            .map_err(|e| js_error_text(&e))?;
        Ok(())
    }

    pub fn set_sun(&mut self, sun: SunHandle) {
        self.sun = Some(sun);
    }

    /// Detach listeners, stop the sun and release the camera.
    pub fn teardown(&mut self) {
        self.listeners.clear();
        drop(self.sun.take());
        self.program.host_mut().release_camera();
        tracing::info!("diario espejo torn down");
    }

    /// Paint one overlay frame from the model's draw plan.
    fn paint_overlay(&self) {
        let host = self.program.host();
        let (Some(camera), Some(images)) = (&host.camera, &host.images) else {
            return;
        };
        let plan = self.program.model().overlay_plan(camera.size());
        if let Err(e) = camera.paint(images, &plan) {
            tracing::debug!(error = %js_error_text(&e), "overlay frame failed");
        }
    }
}

/// Feed `msg` to the program and redraw if the view changed.
///
/// Returns `false` when the message was dropped.
pub fn dispatch(shell: &Weak<RefCell<Shell>>, msg: Msg) -> bool {
    let Some(shell) = shell.upgrade() else {
        tracing::debug!(?msg, "page torn down, message dropped");
        return false;
    };
    let Ok(mut guard) = shell.try_borrow_mut() else {
        tracing::warn!(?msg, "re-entrant dispatch, message dropped");
        return false;
    };
    let this = &mut *guard;
    match this.program.dispatch(msg) {
        Ok(result) => {
            if let Some(view) = result.view
                && let Err(e) = this.view.render(view)
            {
                tracing::warn!(error = %js_error_text(&e), "render failed");
            }
        }
        Err(err) => tracing::error!(error = %err, "dispatch failed"),
    }
    true
}

/// Run `f` on the page's camera surface, if the page and surface still exist.
fn with_camera(shell: &Weak<RefCell<Shell>>, f: impl FnOnce(&mut CameraSurface)) {
    if let Some(shell) = shell.upgrade()
        && let Ok(mut guard) = shell.try_borrow_mut()
        && let Some(camera) = guard.program.host_mut().camera.as_mut()
    {
        f(camera);
    }
}

/// Start loading the overlay images and the chime.
pub fn load_assets(shell: &SharedShell, config: &FrontendConfig) {
    let weak = Rc::downgrade(shell);
    let (aura_url, eye_url) = (config.aura_url.clone(), config.third_eye_url.clone());
    spawn_local(async move {
        let msg = match OverlayImages::load(&aura_url, &eye_url).await {
            Ok(images) => {
                let (aura, third_eye) = images.sizes();
                if let Some(shell) = weak.upgrade() {
                    shell.borrow_mut().program.host_mut().images = Some(images);
                }
                tracing::info!("overlay images loaded");
                Msg::OverlayImagesLoaded { aura, third_eye }
            }
            Err(reason) => Msg::OverlayImagesFailed(reason),
        };
        dispatch(&weak, msg);
    });

    let weak = Rc::downgrade(shell);
    let shimmer_url = config.shimmer_url.clone();
    spawn_local(async move {
        let msg = match SoundPlayer::load(&shimmer_url).await {
            Ok(player) => {
                if let Some(shell) = weak.upgrade() {
                    shell.borrow_mut().program.host_mut().sound = Some(player);
                }
                Msg::ChimeLoaded
            }
            Err(reason) => Msg::ChimeFailed(reason),
        };
        dispatch(&weak, msg);
    });
}

// ─────────────────────────────────────────────────────────────────────────────
// Host
// ─────────────────────────────────────────────────────────────────────────────

/// Executes model commands against browser APIs.
pub struct BrowserHost {
    shell: Weak<RefCell<Shell>>,
    camera: Option<CameraSurface>,
    images: Option<OverlayImages>,
    sound: Option<SoundPlayer>,
}

impl Host for BrowserHost {
    fn play_chime(&mut self) {
        match &self.sound {
            Some(sound) => sound.play(),
            None => tracing::debug!("no chime buffer"),
        }
    }

    fn request_camera(&mut self, request: CameraRequestId) {
        let weak = self.shell.clone();
        if self.camera.is_none() {
            spawn_local(async move {
                dispatch(
                    &weak,
                    Msg::CameraFailed {
                        request,
                        reason: "camera elements missing".into(),
                    },
                );
            });
            return;
        }
        spawn_local(async move {
            let captured = match open_stream().await {
                Ok(captured) => captured,
                Err(reason) => {
                    dispatch(&weak, Msg::CameraFailed { request, reason });
                    return;
                }
            };
            let (width, height) = captured.size();
            // Tracks keep running until stopped, so an unheld stream is stopped here.
            let mut pending = Some(captured);
            with_camera(&weak, |camera| {
                if let Some(captured) = pending.take() {
                    camera.hold(request, captured);
                }
            });
            if let Some(orphan) = pending {
                tracing::debug!(%request, "page gone before stream arrived");
                orphan.stop();
                return;
            }
            let delivered = dispatch(
                &weak,
                Msg::CameraReady {
                    request,
                    width,
                    height,
                },
            );
            if !delivered {
                with_camera(&weak, |camera| camera.discard(request));
            }
        });
    }

    fn accept_camera(&mut self, request: CameraRequestId) {
        if let Some(camera) = self.camera.as_mut()
            && let Err(e) = camera.adopt(request)
        {
            tracing::warn!(error = %js_error_text(&e), %request, "camera stream not adopted");
        }
    }

    fn discard_camera(&mut self, request: CameraRequestId) {
        if let Some(camera) = self.camera.as_mut() {
            camera.discard(request);
        }
    }

    fn release_camera(&mut self) {
        if let Some(camera) = self.camera.as_mut() {
            camera.release();
        }
    }

    fn start_overlay_loop(&mut self, signal: FrameSignal) {
        let weak = self.shell.clone();
        let started = run_frames(signal, move |_| {
            if let Some(shell) = weak.upgrade()
                && let Ok(page) = shell.try_borrow()
            {
                page.paint_overlay();
            }
        });
        if let Err(e) = started {
            tracing::warn!(error = %js_error_text(&e), "overlay loop did not start");
        }
    }

    fn alert(&mut self, text: &str) {
        match web_sys::window() {
            Some(window) => {
                if let Err(e) = window.alert_with_message(text) {
                    tracing::warn!(error = %js_error_text(&e), text, "alert failed");
                }
            }
            None => tracing::warn!(text, "no window for alert"),
        }
    }
}
