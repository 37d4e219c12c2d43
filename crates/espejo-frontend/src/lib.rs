#![forbid(unsafe_code)]

//! WASM frontend for Diario Espejo.
//!
//! Binds the `espejo-runtime` model to a real page:
//! - DOM rendering and event wiring (`dom`),
//! - `localStorage` persistence (`storage`),
//! - overlay images and the chime (`assets`),
//! - webcam capture and the Canvas2D overlay (`camera`),
//! - the WebGPU landing sun (`sun`, `sun_stage`).
//!
//! JS sees a single class, `DiarioEspejoWeb`. Configuration parsing, page
//! vocabulary and GPU data layout compile on every target so they can be
//! tested natively.

pub mod config;
pub mod markup;
pub mod sun;

#[cfg(target_arch = "wasm32")]
mod assets;
#[cfg(target_arch = "wasm32")]
mod camera;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod frame;
#[cfg(target_arch = "wasm32")]
mod shell;
#[cfg(target_arch = "wasm32")]
mod storage;
#[cfg(target_arch = "wasm32")]
mod sun_stage;
#[cfg(target_arch = "wasm32")]
mod wasm;

pub use config::{ConfigError, FrontendConfig};

#[cfg(target_arch = "wasm32")]
pub use wasm::DiarioEspejoWeb;

/// Best-effort text of a thrown JS value.
#[cfg(target_arch = "wasm32")]
pub(crate) fn js_error_text(value: &wasm_bindgen::JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Native builds compile this crate as a stub so `cargo check --workspace` stays
/// green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct DiarioEspejoWeb;

#[cfg(not(target_arch = "wasm32"))]
impl DiarioEspejoWeb {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self
    }
}
