#![forbid(unsafe_code)]

//! Landing-page sun: canvas, input and redraw loop around [`SunRenderer`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use espejo_core::scene::SunScene;
use espejo_runtime::frame_loop::{FrameTrigger, frame_pair};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Event, HtmlCanvasElement, HtmlElement, MouseEvent, WheelEvent};

use crate::dom::Listener;
use crate::frame::run_frames;
use crate::markup;
use crate::js_error_text;
use crate::sun::{RendererError, SunRenderer};

/// Why the sun could not start.
#[derive(Debug)]
pub enum MountError {
    MissingContainer,
    Dom(JsValue),
    Gpu(RendererError),
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingContainer => write!(f, "#{} not found", markup::SUN_CONTAINER),
            Self::Dom(value) => write!(f, "DOM error: {}", js_error_text(value)),
            Self::Gpu(err) => err.fmt(f),
        }
    }
}

impl From<JsValue> for MountError {
    fn from(value: JsValue) -> Self {
        Self::Dom(value)
    }
}

impl From<RendererError> for MountError {
    fn from(value: RendererError) -> Self {
        Self::Gpu(value)
    }
}

struct SunStage {
    scene: SunScene,
    renderer: SunRenderer,
    container: HtmlElement,
}

impl SunStage {
    fn container_size(&self) -> (u32, u32) {
        element_size(&self.container)
    }

    fn resize(&mut self) {
        let (width, height) = self.container_size();
        if (width, height) == self.scene.size() {
            return;
        }
        self.scene.resize(width, height);
        self.renderer.resize(width, height);
        tracing::debug!(width, height, "sun viewport resized");
    }

    fn frame(&mut self, now_ms: f64) {
        self.scene.tick(now_ms);
        if let Err(err) = self.renderer.render_frame(&self.scene.frame_uniforms()) {
            tracing::debug!(error = %err, "sun frame skipped, reconfiguring surface");
            let (width, height) = self.scene.size();
            self.renderer.resize(width, height);
        }
    }
}

fn element_size(el: &HtmlElement) -> (u32, u32) {
    (
        el.client_width().max(1) as u32,
        el.client_height().max(1) as u32,
    )
}

/// A running sun. Dropping it stops the loop, detaches the listeners and
/// removes the canvas.
pub struct SunHandle {
    canvas: HtmlCanvasElement,
    _listeners: Vec<Listener>,
    _loop: FrameTrigger,
}

impl Drop for SunHandle {
    fn drop(&mut self) {
        self.canvas.remove();
    }
}

/// Create the canvas inside `#sun-container`, bring up WebGPU and start
/// spinning.
pub async fn mount(document: &Document) -> Result<SunHandle, MountError> {
    let container: HtmlElement = document
        .get_element_by_id(markup::SUN_CONTAINER)
        .ok_or(MountError::MissingContainer)?
        .dyn_into()
        .map_err(JsValue::from)?;
    let (width, height) = element_size(&container);

    let canvas: HtmlCanvasElement = document
        .create_element("canvas")?
        .dyn_into()
        .map_err(JsValue::from)?;
    canvas.set_width(width);
    canvas.set_height(height);
    canvas.style().set_property("display", "block")?;
    container.append_child(&canvas)?;

    let renderer = match SunRenderer::init(canvas.clone(), width, height).await {
        Ok(renderer) => renderer,
        Err(err) => {
            canvas.remove();
            return Err(err.into());
        }
    };
    let stage = Rc::new(RefCell::new(SunStage {
        scene: SunScene::new(width, height),
        renderer,
        container,
    }));

    let listeners = wire(&canvas, &stage)?;
    let (signal, trigger) = frame_pair();
    let looped = Rc::clone(&stage);
    run_frames(signal, move |now| looped.borrow_mut().frame(now))?;

    tracing::info!(width, height, "sun scene running");
    Ok(SunHandle {
        canvas,
        _listeners: listeners,
        _loop: trigger,
    })
}

fn wire(canvas: &HtmlCanvasElement, stage: &Rc<RefCell<SunStage>>) -> Result<Vec<Listener>, JsValue> {
    let mut listeners = Vec::with_capacity(5);

    let s = Rc::clone(stage);
    listeners.push(Listener::attach(canvas, "pointerdown", move |event: Event| {
        if let Some(e) = event.dyn_ref::<MouseEvent>() {
            s.borrow_mut()
                .scene
                .controls
                .pointer_down(e.client_x() as f32, e.client_y() as f32);
        }
    })?);

    let s = Rc::clone(stage);
    listeners.push(Listener::attach(canvas, "pointermove", move |event: Event| {
        if let Some(e) = event.dyn_ref::<MouseEvent>() {
            let mut stage = s.borrow_mut();
            let (_, height) = stage.container_size();
            stage
                .scene
                .controls
                .pointer_move(e.client_x() as f32, e.client_y() as f32, height as f32);
        }
    })?);

    for kind in ["pointerup", "pointerleave"] {
        let s = Rc::clone(stage);
        listeners.push(Listener::attach(canvas, kind, move |_| {
            s.borrow_mut().scene.controls.pointer_up();
        })?);
    }

    let s = Rc::clone(stage);
    listeners.push(Listener::attach(canvas, "wheel", move |event: Event| {
        if let Some(e) = event.dyn_ref::<WheelEvent>()
            && s.borrow_mut().scene.controls.wheel(e.delta_y() as f32)
        {
            event.prevent_default();
        }
    })?);

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let s = Rc::clone(stage);
    listeners.push(Listener::attach(&window, "resize", move |_| {
        s.borrow_mut().resize();
    })?);

    Ok(listeners)
}
