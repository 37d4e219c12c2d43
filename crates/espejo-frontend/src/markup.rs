#![forbid(unsafe_code)]

//! Page vocabulary shared by the DOM binding: element ids, classes, and the
//! per-section diff that decides what to redraw.

use std::time::Duration;

use espejo_runtime::app::AppView;

// Element ids.
pub const REVEAL_BUTTON: &str = "ver-reflejo-btn";
pub const SUN_CONTAINER: &str = "sun-container";
pub const ACTIVATION_FORM: &str = "activacion-form";
pub const NAME_FIELD: &str = "nombre";
pub const WOUNDS_FIELD: &str = "heridas";
pub const BELIEFS_FIELD: &str = "creencias";
pub const MANTRAS_CONTAINER: &str = "mantras-container";
pub const CALENDAR: &str = "diario-calendario";
pub const AFFIRMATION_PANEL: &str = "afirmacion-diaria-container";
pub const AFFIRMATION_TITLE: &str = "afirmacion-titulo";
pub const AFFIRMATION_TEXT: &str = "afirmacion-texto";
pub const COMPLETE_DAY_BUTTON: &str = "completar-dia-btn";
pub const RECONSTRUCTION_FORM: &str = "reconstruccion-form";
pub const WHO_I_WAS_FIELD: &str = "quien-fui";
pub const WHO_BROKE_FIELD: &str = "quien-rompio";
pub const WHO_I_AM_FIELD: &str = "quien-soy";
pub const SYMBOL_CONTAINER: &str = "simbolo-container";
pub const SYMBOL_GLYPH: &str = "simbolo-display";
pub const SYMBOL_TEXT: &str = "simbolo-texto";
pub const EFFECTS_BUTTON: &str = "activate-effects-btn";
/// Save-failure notice, created inside the diary module on first use.
pub const STATUS: &str = "diario-estado";

// Classes and attributes.
pub const NAV_LINK_SELECTOR: &str = ".nav-link";
pub const DAY_CARD_SELECTOR: &str = ".day-card";
pub const DAY_CARD_CLASS: &str = "day-card";
pub const MANTRA_CLASS: &str = "mantra";
pub const ACTIVE_CLASS: &str = "active";
pub const VISIBLE_CLASS: &str = "visible";
pub const STATUS_CLASS: &str = "status";
pub const TARGET_ATTR: &str = "data-target";
pub const DAY_ATTR: &str = "data-day";

/// CSS `display` value.
#[must_use]
pub const fn display(visible: bool) -> &'static str {
    if visible { "block" } else { "none" }
}

/// `animation-delay` for a mantra, in whole or fractional seconds.
#[must_use]
pub fn animation_delay(delay: Duration) -> String {
    format!("{}s", delay.as_secs_f64())
}

/// Day index from a `data-day` attribute.
#[must_use]
pub fn parse_day(attr: &str) -> Option<usize> {
    attr.trim().parse().ok()
}

/// Sections of the page that differ between two views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewDiff {
    pub modules: bool,
    pub calendar: bool,
    pub panel: bool,
    pub effects_button: bool,
    pub mantras: bool,
    pub symbol: bool,
    pub status: bool,
}

impl ViewDiff {
    /// Everything, for the first render.
    pub const ALL: Self = Self {
        modules: true,
        calendar: true,
        panel: true,
        effects_button: true,
        mantras: true,
        symbol: true,
        status: true,
    };

    /// Compare `next` against the previously rendered view.
    #[must_use]
    pub fn between(previous: Option<&AppView>, next: &AppView) -> Self {
        let Some(prev) = previous else {
            return Self::ALL;
        };
        Self {
            modules: prev.active != next.active || prev.modules != next.modules,
            calendar: prev.calendar != next.calendar,
            panel: prev.panel != next.panel,
            effects_button: prev.effects_button != next.effects_button,
            mantras: prev.mantras != next.mantras || prev.mantra_round != next.mantra_round,
            symbol: prev.symbol != next.symbol,
            status: prev.status != next.status,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
