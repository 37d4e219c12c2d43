#![forbid(unsafe_code)]

//! `requestAnimationFrame` loop bound to a [`FrameSignal`].

use std::cell::RefCell;
use std::rc::Rc;

use espejo_runtime::frame_loop::FrameSignal;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;

type FrameCallback = Closure<dyn FnMut(f64)>;

/// Call `frame` once per display refresh until `signal` stops.
///
/// The stop is observed at the start of a tick: the tick after
/// [`FrameTrigger::stop`](espejo_runtime::frame_loop::FrameTrigger::stop)
/// draws nothing and releases the callback.
pub fn run_frames(signal: FrameSignal, mut frame: impl FnMut(f64) + 'static) -> Result<(), JsValue> {
    let slot: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
    let next = Rc::clone(&slot);

    let callback = Closure::new(move |now: f64| {
        if signal.is_stopped() {
            next.borrow_mut().take();
            return;
        }
        frame(now);
        let scheduled = next.borrow().as_ref().map(request_frame);
        if let Some(Err(e)) = scheduled {
            tracing::warn!(error = ?e, "requestAnimationFrame failed, loop ended");
            next.borrow_mut().take();
        }
    });
    request_frame(&callback)?;
    *slot.borrow_mut() = Some(callback);
    Ok(())
}

fn request_frame(callback: &FrameCallback) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    window.request_animation_frame(callback.as_ref().unchecked_ref())?;
    Ok(())
}
