#![forbid(unsafe_code)]

//! Loading of the decorative assets: two overlay images and the chime.

use espejo_core::overlay::{OverlayLayer, Size};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AudioBuffer, AudioContext, AudioContextState, HtmlImageElement, Response};

use crate::js_error_text;

/// Decoded overlay images, kept by the frontend for drawing.
#[derive(Debug, Clone)]
pub struct OverlayImages {
    pub aura: HtmlImageElement,
    pub third_eye: HtmlImageElement,
}

impl OverlayImages {
    /// Fetch and decode both images concurrently.
    pub async fn load(aura_url: &str, third_eye_url: &str) -> Result<Self, String> {
        let aura = start_image(aura_url)?;
        let third_eye = start_image(third_eye_url)?;
        let aura_decoded = JsFuture::from(aura.decode());
        let eye_decoded = JsFuture::from(third_eye.decode());
        aura_decoded
            .await
            .map_err(|e| format!("{aura_url}: {}", js_error_text(&e)))?;
        eye_decoded
            .await
            .map_err(|e| format!("{third_eye_url}: {}", js_error_text(&e)))?;
        Ok(Self { aura, third_eye })
    }

    #[must_use]
    pub fn get(&self, layer: OverlayLayer) -> &HtmlImageElement {
        match layer {
            OverlayLayer::Aura => &self.aura,
            OverlayLayer::ThirdEye => &self.third_eye,
        }
    }

    /// Natural pixel sizes `(aura, third_eye)`.
    #[must_use]
    pub fn sizes(&self) -> (Size, Size) {
        (natural_size(&self.aura), natural_size(&self.third_eye))
    }
}

fn start_image(url: &str) -> Result<HtmlImageElement, String> {
    let img = HtmlImageElement::new().map_err(|e| js_error_text(&e))?;
    img.set_src(url);
    Ok(img)
}

fn natural_size(img: &HtmlImageElement) -> Size {
    Size::new(f64::from(img.natural_width()), f64::from(img.natural_height()))
}

/// Decoded chime plus the audio context that plays it.
#[derive(Debug, Clone)]
pub struct SoundPlayer {
    context: AudioContext,
    buffer: AudioBuffer,
}

impl SoundPlayer {
    /// Fetch `url` and decode it into an audio buffer.
    pub async fn load(url: &str) -> Result<Self, String> {
        Self::fetch_and_decode(url)
            .await
            .map_err(|e| format!("{url}: {}", js_error_text(&e)))
    }

    async fn fetch_and_decode(url: &str) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let response: Response = JsFuture::from(window.fetch_with_str(url))
            .await?
            .dyn_into()?;
        if !response.ok() {
            return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
        }
        let data: js_sys::ArrayBuffer = JsFuture::from(response.array_buffer()?)
            .await?
            .dyn_into()?;
        let context = AudioContext::new()?;
        let buffer: AudioBuffer = JsFuture::from(context.decode_audio_data(&data)?)
            .await?
            .dyn_into()?;
        Ok(Self { context, buffer })
    }

    /// Play the chime once. Resumes a context suspended by the autoplay policy.
    pub fn play(&self) {
        if self.context.state() == AudioContextState::Suspended {
            let _ = self.context.resume();
        }
        if let Err(e) = self.start_source() {
            tracing::warn!(error = %js_error_text(&e), "chime playback failed");
        }
    }

    fn start_source(&self) -> Result<(), JsValue> {
        let source = self.context.create_buffer_source()?;
        source.set_buffer(Some(&self.buffer));
        source.connect_with_audio_node(&self.context.destination())?;
        source.start()?;
        Ok(())
    }
}
