#![forbid(unsafe_code)]

//! Core domain types for Diario Espejo.
//!
//! Everything in this crate is host-agnostic and free of I/O:
//! - [`module`]: the closed set of top-level panels and their metadata.
//! - [`diary`]: 21-day progress flags and the day-selection state machine.
//! - [`generators`]: mantra and power-symbol text assembly.
//! - [`overlay`]: per-frame draw plan for the camera filter overlay.
//! - [`scene`]: sphere mesh, matrices, and orbit controls for the sun scene.
//! - [`assets`]: write-once cache of decorative assets.
//!
//! The runtime (`espejo-runtime`) wires these together; the browser frontend
//! only executes what they decide.

pub mod assets;
pub mod diary;
pub mod generators;
pub mod module;
pub mod overlay;
pub mod scene;

pub use assets::{AssetCache, AssetKind, AssetState};
pub use diary::{DayState, Diary, DiaryError, DiaryProgress, DIARY_DAYS};
pub use module::ModuleId;
