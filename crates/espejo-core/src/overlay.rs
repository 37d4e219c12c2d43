#![forbid(unsafe_code)]

//! Draw plan for the camera "solar filter" overlay.
//!
//! [`plan_frame`] turns the surface size and the two decorative image sizes
//! into an ordered list of [`DrawOp`]s. A host canvas implements
//! [`OverlayCanvas`] and executes them; the plan itself never touches a
//! canvas, which keeps the geometry testable.
//!
//! Layer order per frame:
//!
//! ```text
//! clear → overlay-blended radial tint → source-over
//!       → aura (80% width, alpha 0.8) → third eye (15% width, opaque)
//! ```

/// Tint at the centre of the radial gradient.
pub const TINT_INNER: &str = "rgba(255, 230, 150, 0.1)";
/// Tint at the rim of the radial gradient.
pub const TINT_OUTER: &str = "rgba(240, 196, 60, 0.4)";

const GRADIENT_RADIUS_RATIO: f64 = 0.8;
const AURA_WIDTH_RATIO: f64 = 0.8;
const AURA_LIFT_DIVISOR: f64 = 1.5;
const AURA_ALPHA: f64 = 0.8;
const THIRD_EYE_WIDTH_RATIO: f64 = 0.15;
const THIRD_EYE_LIFT_RATIO: f64 = 0.25;

/// Pixel size of a surface or image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Canvas compositing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    SourceOver,
    Overlay,
}

impl BlendMode {
    /// Value for `globalCompositeOperation`.
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::SourceOver => "source-over",
            Self::Overlay => "overlay",
        }
    }
}

/// Radial gradient between two concentric circles.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub cx: f64,
    pub cy: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
    /// `(offset, css colour)` pairs.
    pub stops: [(f32, &'static str); 2],
}

/// Which decorative image to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayLayer {
    Aura,
    ThirdEye,
}

/// One canvas instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear(Rect),
    SetBlend(BlendMode),
    FillGradient { gradient: RadialGradient, area: Rect },
    SetAlpha(f64),
    DrawImage { layer: OverlayLayer, dest: Rect },
}

/// A drawing surface able to execute [`DrawOp`]s.
pub trait OverlayCanvas {
    type Error;

    /// Current surface size in pixels.
    fn size(&self) -> Size;

    /// Execute one instruction.
    fn apply(&mut self, op: &DrawOp) -> Result<(), Self::Error>;

    /// Execute a whole plan, stopping at the first failure.
    fn apply_all(&mut self, ops: &[DrawOp]) -> Result<(), Self::Error> {
        for op in ops {
            self.apply(op)?;
        }
        Ok(())
    }
}

/// Plan one overlay frame.
///
/// Returns an empty plan when either image is missing or the surface has no
/// area, so the frame is a no-op.
#[must_use]
pub fn plan_frame(surface: Size, aura: Option<Size>, third_eye: Option<Size>) -> Vec<DrawOp> {
    let (Some(_aura), Some(eye)) = (aura, third_eye) else {
        return Vec::new();
    };
    if surface.is_empty() {
        return Vec::new();
    }

    let w = surface.width;
    let h = surface.height;
    let full = Rect {
        x: 0.0,
        y: 0.0,
        width: w,
        height: h,
    };

    vec![
        DrawOp::Clear(full),
        DrawOp::SetBlend(BlendMode::Overlay),
        DrawOp::FillGradient {
            gradient: solar_tint(surface),
            area: full,
        },
        DrawOp::SetBlend(BlendMode::SourceOver),
        DrawOp::SetAlpha(AURA_ALPHA),
        DrawOp::DrawImage {
            layer: OverlayLayer::Aura,
            dest: aura_rect(surface),
        },
        DrawOp::SetAlpha(1.0),
        DrawOp::DrawImage {
            layer: OverlayLayer::ThirdEye,
            dest: third_eye_rect(surface, eye),
        },
    ]
}

/// Radial tint centred on the surface.
#[must_use]
pub fn solar_tint(surface: Size) -> RadialGradient {
    RadialGradient {
        cx: surface.width / 2.0,
        cy: surface.height / 2.0,
        inner_radius: 0.0,
        outer_radius: surface.width * GRADIENT_RADIUS_RATIO,
        stops: [(0.0, TINT_INNER), (1.0, TINT_OUTER)],
    }
}

/// Square aura, centred horizontally and lifted by two thirds of its side.
#[must_use]
pub fn aura_rect(surface: Size) -> Rect {
    let side = surface.width * AURA_WIDTH_RATIO;
    Rect {
        x: (surface.width - side) / 2.0,
        y: surface.height / 2.0 - side / AURA_LIFT_DIVISOR,
        width: side,
        height: side,
    }
}

/// Third eye at 15% of the width with the image's aspect ratio.
#[must_use]
pub fn third_eye_rect(surface: Size, image: Size) -> Rect {
    let width = surface.width * THIRD_EYE_WIDTH_RATIO;
    let height = if image.width > 0.0 {
        image.height / image.width * width
    } else {
        0.0
    };
    Rect {
        x: (surface.width - width) / 2.0,
        y: surface.height / 2.0 - surface.height * THIRD_EYE_LIFT_RATIO,
        width,
        height,
    }
}
