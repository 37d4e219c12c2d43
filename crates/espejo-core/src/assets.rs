#![forbid(unsafe_code)]

//! Write-once cache of decorative assets.
//!
//! Each slot starts [`AssetState::Pending`] and settles exactly once, either
//! to `Ready` or `Failed`. Later writes are ignored so that readers never see
//! an asset change underneath them. A failed slot is a valid terminal state:
//! features that depend on it stay disabled.
//!
//! The cache is generic over the stored handle types so the runtime can track
//! plain metadata (image sizes) while the browser frontend stores the actual
//! decoded elements.

use std::fmt;

/// Default URL of the aura overlay image.
pub const DEFAULT_AURA_URL: &str = "/asset_name.png";
/// Default URL of the third-eye overlay image.
pub const DEFAULT_THIRD_EYE_URL: &str = "/tercer-ojo.png";
/// Default URL of the completion chime.
pub const DEFAULT_SHIMMER_URL: &str = "/shimmering-reveal.mp3";

/// The three decorative assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Aura,
    ThirdEye,
    Shimmer,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [Self::Aura, Self::ThirdEye, Self::Shimmer];

    #[must_use]
    pub const fn default_url(self) -> &'static str {
        match self {
            Self::Aura => DEFAULT_AURA_URL,
            Self::ThirdEye => DEFAULT_THIRD_EYE_URL,
            Self::Shimmer => DEFAULT_SHIMMER_URL,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Aura => "aura",
            Self::ThirdEye => "third-eye",
            Self::Shimmer => "shimmer",
        })
    }
}

/// Load state of one asset.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetState<T> {
    Pending,
    Ready(T),
    Failed(String),
}

impl<T> Default for AssetState<T> {
    fn default() -> Self {
        Self::Pending
    }
}

impl<T> AssetState<T> {
    #[must_use]
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Settle a pending slot. Returns `false` (and leaves the slot alone)
    /// when it was already settled.
    fn settle(&mut self, next: AssetState<T>) -> bool {
        if self.is_settled() {
            return false;
        }
        *self = next;
        true
    }
}

/// Aura image, third-eye image, and shimmer sound.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetCache<I, S> {
    aura: AssetState<I>,
    third_eye: AssetState<I>,
    shimmer: AssetState<S>,
}

impl<I, S> Default for AssetCache<I, S> {
    fn default() -> Self {
        Self {
            aura: AssetState::Pending,
            third_eye: AssetState::Pending,
            shimmer: AssetState::Pending,
        }
    }
}

impl<I, S> AssetCache<I, S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store both overlay images. Returns whether anything changed.
    pub fn set_overlay_images(&mut self, aura: I, third_eye: I) -> bool {
        let a = self.aura.settle(AssetState::Ready(aura));
        let b = self.third_eye.settle(AssetState::Ready(third_eye));
        if !(a && b) {
            tracing::warn!("overlay images already settled, ignoring second load");
        }
        a || b
    }

    /// Mark both overlay images as failed.
    pub fn fail_overlay_images(&mut self, reason: &str) -> bool {
        let a = self.aura.settle(AssetState::Failed(reason.to_string()));
        let b = self
            .third_eye
            .settle(AssetState::Failed(reason.to_string()));
        a || b
    }

    pub fn set_shimmer(&mut self, sound: S) -> bool {
        let changed = self.shimmer.settle(AssetState::Ready(sound));
        if !changed {
            tracing::warn!(asset = %AssetKind::Shimmer, "asset already settled, ignoring");
        }
        changed
    }

    pub fn fail_shimmer(&mut self, reason: &str) -> bool {
        self.shimmer.settle(AssetState::Failed(reason.to_string()))
    }

    #[must_use]
    pub fn aura(&self) -> &AssetState<I> {
        &self.aura
    }

    #[must_use]
    pub fn third_eye(&self) -> &AssetState<I> {
        &self.third_eye
    }

    #[must_use]
    pub fn shimmer(&self) -> &AssetState<S> {
        &self.shimmer
    }

    /// Both overlay images, when both loaded.
    #[must_use]
    pub fn overlay_images(&self) -> Option<(&I, &I)> {
        Some((self.aura.ready()?, self.third_eye.ready()?))
    }

    #[must_use]
    pub fn overlay_ready(&self) -> bool {
        self.overlay_images().is_some()
    }

    #[must_use]
    pub fn overlay_failed(&self) -> bool {
        self.aura.is_failed() || self.third_eye.is_failed()
    }

    #[must_use]
    pub fn sound(&self) -> Option<&S> {
        self.shimmer.ready()
    }
}
