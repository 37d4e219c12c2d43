#![forbid(unsafe_code)]

//! Top-level panels ("modules") of the page.
//!
//! Exactly one module is visible at a time. Each module is addressed in the
//! DOM by a fixed element id, which doubles as the `data-target` value on the
//! navigation links.

use std::fmt;
use std::str::FromStr;

/// Identifier of one mutually-exclusive top-level panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModuleId {
    /// Landing panel with the rotating sun.
    #[default]
    InicioSolar,
    /// Mantra generator form.
    ActivacionReflejo,
    /// Webcam filter overlay.
    ReconociendoImagen,
    /// Identity reconstruction form and power symbol.
    ReconstruccionIdentidad,
    /// 21-day affirmation diary.
    DiarioEspejo,
}

impl ModuleId {
    /// All modules in navigation order.
    pub const ALL: &'static [ModuleId] = &[
        Self::InicioSolar,
        Self::ActivacionReflejo,
        Self::ReconociendoImagen,
        Self::ReconstruccionIdentidad,
        Self::DiarioEspejo,
    ];

    /// DOM element id of the panel.
    #[must_use]
    pub const fn dom_id(self) -> &'static str {
        self.meta().dom_id
    }

    /// Human-readable title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        self.meta().title
    }

    /// Registry entry for this module.
    #[must_use]
    pub const fn meta(self) -> &'static ModuleMeta {
        match self {
            Self::InicioSolar => &MODULE_REGISTRY[0],
            Self::ActivacionReflejo => &MODULE_REGISTRY[1],
            Self::ReconociendoImagen => &MODULE_REGISTRY[2],
            Self::ReconstruccionIdentidad => &MODULE_REGISTRY[3],
            Self::DiarioEspejo => &MODULE_REGISTRY[4],
        }
    }

    /// Parse a DOM id (`data-target` value).
    #[must_use]
    pub fn from_dom_id(id: &str) -> Option<Self> {
        MODULE_REGISTRY
            .iter()
            .find(|meta| meta.dom_id == id)
            .map(|meta| meta.id)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dom_id())
    }
}

/// Error returned when a string is not a known module id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModule(pub String);

impl fmt::Display for UnknownModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown module id: {:?}", self.0)
    }
}

impl std::error::Error for UnknownModule {}

impl FromStr for ModuleId {
    type Err = UnknownModule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_dom_id(s).ok_or_else(|| UnknownModule(s.to_string()))
    }
}

/// Registry metadata describing a module.
#[derive(Debug, Clone, Copy)]
pub struct ModuleMeta {
    pub id: ModuleId,
    pub dom_id: &'static str,
    pub title: &'static str,
}

/// Single source of truth for module ordering and DOM ids.
pub const MODULE_REGISTRY: &[ModuleMeta] = &[
    ModuleMeta {
        id: ModuleId::InicioSolar,
        dom_id: "inicio-solar",
        title: "Inicio Solar",
    },
    ModuleMeta {
        id: ModuleId::ActivacionReflejo,
        dom_id: "activacion-reflejo",
        title: "Activación del Reflejo",
    },
    ModuleMeta {
        id: ModuleId::ReconociendoImagen,
        dom_id: "reconociendo-imagen",
        title: "Reconocimiento de Imagen",
    },
    ModuleMeta {
        id: ModuleId::ReconstruccionIdentidad,
        dom_id: "reconstruccion-identidad",
        title: "Reconstrucción de Identidad",
    },
    ModuleMeta {
        id: ModuleId::DiarioEspejo,
        dom_id: "diario-espejo",
        title: "Diario Espejo 21 Días",
    },
];
