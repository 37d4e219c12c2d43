#![forbid(unsafe_code)]

//! Webcam capture and the Canvas2D overlay painter.
//!
//! [`CameraSurface`] owns the two elements the recognition module draws on,
//! the `<video id="webcam">` preview and the `<canvas id="effects-canvas">`
//! overlay, plus every stream the page currently holds. A granted stream is
//! first held aside under its request id; only [`CameraSurface::adopt`]
//! attaches it to the preview. Drawing goes through [`OverlayPainter`],
//! which executes the pure draw plan from `espejo_core::overlay`.

use espejo_core::overlay::{DrawOp, OverlayCanvas, Size};
use espejo_runtime::camera::CameraRequestId;
use js_sys::{Array, Function, Promise};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlVideoElement, MediaStream,
    MediaStreamConstraints, MediaStreamTrack,
};

use crate::assets::OverlayImages;
use crate::js_error_text;

pub const VIDEO_ID: &str = "webcam";
pub const CANVAS_ID: &str = "effects-canvas";

/// `HTMLMediaElement.HAVE_METADATA`.
const HAVE_METADATA: u16 = 1;

/// A granted stream with its native resolution, not yet on screen.
#[derive(Debug)]
pub struct CapturedStream {
    stream: MediaStream,
    width: u32,
    height: u32,
}

impl CapturedStream {
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Stop the stream's tracks.
    pub fn stop(self) {
        stop_tracks(&self.stream);
    }
}

/// Preview, overlay canvas, the live stream and any streams held aside.
#[derive(Debug)]
pub struct CameraSurface {
    video: HtmlVideoElement,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    live: Option<MediaStream>,
    held: Vec<(CameraRequestId, CapturedStream)>,
}

impl CameraSurface {
    /// Look up the preview and overlay elements.
    pub fn find(document: &Document) -> Result<Self, JsValue> {
        let video: HtmlVideoElement = document
            .get_element_by_id(VIDEO_ID)
            .ok_or_else(|| JsValue::from_str("missing #webcam"))?
            .dyn_into()?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(CANVAS_ID)
            .ok_or_else(|| JsValue::from_str("missing #effects-canvas"))?
            .dyn_into()?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into()?;
        Ok(Self {
            video,
            canvas,
            ctx,
            live: None,
            held: Vec::new(),
        })
    }

    /// Keep `captured` aside until the model decides on `request`.
    pub fn hold(&mut self, request: CameraRequestId, captured: CapturedStream) {
        self.discard(request);
        self.held.push((request, captured));
    }

    /// Make the stream held for `request` the live session: attach it to the
    /// preview and size the overlay canvas to its native resolution.
    pub fn adopt(&mut self, request: CameraRequestId) -> Result<(), JsValue> {
        let captured = self
            .take_held(request)
            .ok_or_else(|| JsValue::from_str(&format!("no stream held for {request}")))?;
        if let Some(previous) = self.live.take() {
            stop_tracks(&previous);
        }
        self.video.set_src_object(Some(&captured.stream));
        self.canvas.set_width(captured.width);
        self.canvas.set_height(captured.height);
        if let Err(e) = self.video.play() {
            tracing::debug!(error = %js_error_text(&e), "preview autoplay refused");
        }
        self.live = Some(captured.stream);
        Ok(())
    }

    /// Stop the stream held for `request`, if any.
    pub fn discard(&mut self, request: CameraRequestId) {
        if let Some(captured) = self.take_held(request) {
            captured.stop();
            tracing::debug!(%request, "held camera stream stopped");
        }
    }

    /// Stop the live session, detach the preview and clear the overlay.
    pub fn release(&mut self) {
        if let Some(stream) = self.live.take() {
            stop_tracks(&stream);
            self.video.set_src_object(None);
        }
        let size = self.size();
        self.ctx.clear_rect(0.0, 0.0, size.width, size.height);
    }

    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.canvas.width()), f64::from(self.canvas.height()))
    }

    /// Run one overlay frame.
    pub fn paint(&self, images: &OverlayImages, plan: &[DrawOp]) -> Result<(), JsValue> {
        OverlayPainter {
            ctx: &self.ctx,
            size: self.size(),
            images,
        }
        .apply_all(plan)
    }

    fn take_held(&mut self, request: CameraRequestId) -> Option<CapturedStream> {
        let idx = self.held.iter().position(|(id, _)| *id == request)?;
        Some(self.held.swap_remove(idx).1)
    }
}

impl Drop for CameraSurface {
    fn drop(&mut self) {
        if let Some(stream) = self.live.take() {
            stop_tracks(&stream);
        }
        for (_, captured) in self.held.drain(..) {
            captured.stop();
        }
    }
}

/// Stop every track of `stream`.
pub fn stop_tracks(stream: &MediaStream) {
    let tracks: Array = stream.get_tracks();
    for track in tracks.iter() {
        if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
            track.stop();
        }
    }
}

/// Request a video-only stream and read its native resolution.
///
/// The stream is measured on a detached `<video>` so nothing reaches the
/// page preview until it is adopted.
pub async fn open_stream() -> Result<CapturedStream, String> {
    let stream = request_video().await.map_err(|e| js_error_text(&e))?;
    match measure(&stream).await {
        Ok((width, height)) => Ok(CapturedStream {
            stream,
            width,
            height,
        }),
        Err(e) => {
            stop_tracks(&stream);
            Err(js_error_text(&e))
        }
    }
}

async fn request_video() -> Result<MediaStream, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let constraints = MediaStreamConstraints::new();
    constraints.set_video(&JsValue::TRUE);
    constraints.set_audio(&JsValue::FALSE);
    let promise = window
        .navigator()
        .media_devices()?
        .get_user_media_with_constraints(&constraints)?;
    JsFuture::from(promise).await?.dyn_into()
}

async fn measure(stream: &MediaStream) -> Result<(u32, u32), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let video: HtmlVideoElement = document.create_element("video")?.dyn_into()?;
    video.set_muted(true);
    video.set_src_object(Some(stream));
    let loaded = wait_for_metadata(&video).await;
    let size = (video.video_width(), video.video_height());
    video.set_src_object(None);
    loaded.map(|()| size)
}

async fn wait_for_metadata(video: &HtmlVideoElement) -> Result<(), JsValue> {
    if video.ready_state() >= HAVE_METADATA {
        return Ok(());
    }
    let loaded = Promise::new(&mut |resolve: Function, reject: Function| {
        video.set_onloadedmetadata(Some(&resolve));
        video.set_onerror(Some(&reject));
    });
    let result = JsFuture::from(loaded).await;
    video.set_onloadedmetadata(None);
    video.set_onerror(None);
    result.map(|_| ())
}

// ─────────────────────────────────────────────────────────────────────────────
// Painter
// ─────────────────────────────────────────────────────────────────────────────

/// [`OverlayCanvas`] over a 2D rendering context.
pub struct OverlayPainter<'a> {
    ctx: &'a CanvasRenderingContext2d,
    size: Size,
    images: &'a OverlayImages,
}

impl OverlayCanvas for OverlayPainter<'_> {
    type Error = JsValue;

    fn size(&self) -> Size {
        self.size
    }

    fn apply(&mut self, op: &DrawOp) -> Result<(), JsValue> {
        match op {
            DrawOp::Clear(r) => self.ctx.clear_rect(r.x, r.y, r.width, r.height),
            DrawOp::SetBlend(mode) => self.ctx.set_global_composite_operation(mode.as_css())?,
            DrawOp::FillGradient { gradient: g, area } => {
                let fill = self.ctx.create_radial_gradient(
                    g.cx,
                    g.cy,
                    g.inner_radius,
                    g.cx,
                    g.cy,
                    g.outer_radius,
                )?;
                for (offset, color) in g.stops {
                    fill.add_color_stop(offset, color)?;
                }
                self.ctx.set_fill_style_canvas_gradient(&fill);
                self.ctx.fill_rect(area.x, area.y, area.width, area.height);
            }
            DrawOp::SetAlpha(alpha) => self.ctx.set_global_alpha(*alpha),
            DrawOp::DrawImage { layer, dest } => {
                self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
                    self.images.get(*layer),
                    dest.x,
                    dest.y,
                    dest.width,
                    dest.height,
                )?;
            }
        }
        Ok(())
    }
}
