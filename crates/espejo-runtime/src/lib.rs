#![forbid(unsafe_code)]

//! Runtime for Diario Espejo.
//!
//! # Role in the workspace
//! `espejo-runtime` owns application state and turns user input into
//! [`Cmd`]s. It never touches a browser API: side effects (camera access,
//! audio playback, alerts, redraw loops) are described as commands and
//! executed by a host such as `espejo-web`'s step program.
//!
//! # Modules
//! - [`program`]: the [`Model`] trait and the [`Cmd`] vocabulary.
//! - [`persistence`]: [`StorageBackend`] abstraction and the typed
//!   [`ProgressStore`] for diary progress and reconstruction records.
//! - [`router`]: exclusive module activation with transition hooks.
//! - [`camera`]: camera session lifecycle and effects-button state.
//! - [`frame_loop`]: cancellation pair for per-frame redraw loops.
//! - [`app`]: [`EspejoApp`], the model tying everything together.

pub mod app;
pub mod camera;
pub mod frame_loop;
pub mod persistence;
pub mod program;
pub mod router;

pub use app::{AppView, EspejoApp, Msg};
pub use camera::{CameraController, CameraRequestId, CameraState, EffectsButton};
pub use frame_loop::{FrameSignal, FrameTrigger, frame_pair};
pub use persistence::{MemoryStorage, ProgressStore, StorageBackend, StorageError, StorageResult};
pub use program::{Cmd, Model};
pub use router::{ModuleRouter, Transition, TransitionHook};
