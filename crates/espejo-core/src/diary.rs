#![forbid(unsafe_code)]

//! 21-day affirmation diary.
//!
//! # Invariants
//!
//! 1. The *current* day is the lowest index whose flag is still `false`, or
//!    `None` once every day is complete.
//! 2. Only the current day can become completed, so flags fill in ascending
//!    order.
//! 3. A day can only be completed after it was selected, and completing it
//!    clears the selection and hides the detail panel.
//! 4. Selecting a locked day never changes the selection.
//!
//! [`DiaryProgress`] is the persisted part (a JSON array of 21 booleans);
//! [`Diary`] layers the selection and detail panel on top of it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of days in the diary.
pub const DIARY_DAYS: usize = 21;

/// Fixed affirmation for each day, in order.
pub const AFFIRMATIONS: [&str; DIARY_DAYS] = [
    "Me amo y me acepto completa e incondicionalmente, aquí y ahora.",
    "Cada célula de mi cuerpo vibra con energía, salud y vitalidad.",
    "Soy un imán para la abundancia, la prosperidad y las oportunidades maravillosas.",
    "Libero mi pasado con gratitud y abrazo mi futuro con esperanza.",
    "Confío en mi intuición; es mi brújula interna que me guía hacia mi bien supremo.",
    "Mi creatividad es infinita y se expresa fácilmente a través de mí.",
    "Perdono a todos, incluido a mí mismo, para liberar el peso del resentimiento.",
    "Merezco todo lo bueno que la vida tiene para ofrecer, sin excepciones.",
    "Mi corazón está abierto para dar y recibir amor de forma ilimitada.",
    "Soy fuerte, resiliente y capaz de superar cualquier desafío que se presente.",
    "Atraigo relaciones sanas, amorosas y que me apoyan en mi crecimiento.",
    "Agradezco por las bendiciones en mi vida y por las que están por llegar.",
    "Mi voz es valiosa y mis opiniones merecen ser escuchadas con respeto.",
    "Tomo decisiones alineadas con mi alma y mi propósito de vida.",
    "El universo conspira a mi favor para que logre mis sueños más profundos.",
    "Mi paz interior es mi prioridad y la cultivo cada día con mis pensamientos.",
    "Soy el arquitecto de mi realidad y construyo una vida llena de alegría y significado.",
    "Reconozco y honro la luz divina que reside dentro de mí.",
    "Cada día es una nueva oportunidad para ser mi mejor versión.",
    "Mi energía positiva transforma mi entorno y eleva a quienes me rodean.",
    "Estoy completo, soy suficiente y mi existencia es un regalo para el mundo.",
];

// ─────────────────────────────────────────────────────────────────────────────
// Progress
// ─────────────────────────────────────────────────────────────────────────────

/// Completion flags for the 21 days. Serialized as a plain JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiaryProgress {
    days: [bool; DIARY_DAYS],
}

impl DiaryProgress {
    /// Progress with no completed days.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            days: [false; DIARY_DAYS],
        }
    }

    /// Build progress from raw flags.
    #[must_use]
    pub const fn from_flags(days: [bool; DIARY_DAYS]) -> Self {
        Self { days }
    }

    /// Build progress from a slice of flags of exactly [`DIARY_DAYS`] entries.
    ///
    /// Returns `None` for any other length.
    #[must_use]
    pub fn from_slice(flags: &[bool]) -> Option<Self> {
        let days: [bool; DIARY_DAYS] = flags.try_into().ok()?;
        Some(Self { days })
    }

    /// Raw flags.
    #[must_use]
    pub const fn flags(&self) -> &[bool; DIARY_DAYS] {
        &self.days
    }

    /// Whether `day` is completed. Out-of-range days are never completed.
    #[must_use]
    pub fn is_completed(&self, day: usize) -> bool {
        self.days.get(day).copied().unwrap_or(false)
    }

    /// The lowest day not yet completed, or `None` when all are done.
    #[must_use]
    pub fn current_day(&self) -> Option<usize> {
        self.days.iter().position(|done| !done)
    }

    /// Derived state of `day`, or `None` when out of range.
    #[must_use]
    pub fn day_state(&self, day: usize) -> Option<DayState> {
        let done = *self.days.get(day)?;
        Some(if done {
            DayState::Completed
        } else if self.current_day() == Some(day) {
            DayState::Current
        } else {
            DayState::Locked
        })
    }

    /// Number of completed days.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.days.iter().filter(|done| **done).count()
    }

    /// Whether all days are complete.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.current_day().is_none()
    }

    fn mark(&mut self, day: usize) {
        self.days[day] = true;
    }
}

/// Visual state of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayState {
    Locked,
    Current,
    Completed,
}

impl DayState {
    /// CSS class used on the day card.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Current => "current",
            Self::Completed => "completed",
        }
    }

    /// Whether the day can be opened.
    #[must_use]
    pub const fn is_selectable(self) -> bool {
        !matches!(self, Self::Locked)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendered calendar
// ─────────────────────────────────────────────────────────────────────────────

/// One rendered day card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCard {
    pub index: usize,
    /// `Día n`, one-based.
    pub label: String,
    pub state: DayState,
}

/// Full rendered calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    pub cards: Vec<DayCard>,
    pub current: Option<usize>,
}

/// Contents of the affirmation detail panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetailPanel {
    #[default]
    Hidden,
    Shown {
        title: String,
        /// Affirmation wrapped in double quotes.
        text: String,
        /// Whether the "complete day" action is offered.
        show_complete: bool,
    },
}

impl DetailPanel {
    #[must_use]
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Shown { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Rejected diary operation. The diary is unchanged whenever one is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiaryError {
    /// Day index past the end of the diary.
    OutOfRange { day: usize },
    /// Day is not the currently selected one.
    NotSelected { day: usize, selected: Option<usize> },
    /// Day was already completed.
    AlreadyCompleted { day: usize },
}

impl fmt::Display for DiaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { day } => {
                write!(f, "day {day} is outside the {DIARY_DAYS}-day diary")
            }
            Self::NotSelected {
                day,
                selected: Some(selected),
            } => write!(f, "day {day} is not selected (selected: {selected})"),
            Self::NotSelected {
                day,
                selected: None,
            } => write!(f, "day {day} is not selected (no selection)"),
            Self::AlreadyCompleted { day } => write!(f, "day {day} is already completed"),
        }
    }
}

impl std::error::Error for DiaryError {}

// ─────────────────────────────────────────────────────────────────────────────
// State machine
// ─────────────────────────────────────────────────────────────────────────────

/// Diary progress plus the day currently opened in the detail panel.
#[derive(Debug, Clone, Default)]
pub struct Diary {
    progress: DiaryProgress,
    selected: Option<usize>,
    panel: DetailPanel,
}

impl Diary {
    /// Create a diary over existing progress with nothing selected.
    #[must_use]
    pub fn new(progress: DiaryProgress) -> Self {
        Self {
            progress,
            selected: None,
            panel: DetailPanel::Hidden,
        }
    }

    /// Replace progress (e.g. after reloading from storage).
    ///
    /// Clears the selection and hides the detail panel.
    pub fn reset(&mut self, progress: DiaryProgress) {
        *self = Self::new(progress);
    }

    #[must_use]
    pub const fn progress(&self) -> &DiaryProgress {
        &self.progress
    }

    /// Day currently opened in the detail panel.
    #[must_use]
    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub const fn panel(&self) -> &DetailPanel {
        &self.panel
    }

    /// Render the calendar. Recomputes the current day on every call.
    #[must_use]
    pub fn render(&self) -> Calendar {
        let current = self.progress.current_day();
        let cards = (0..DIARY_DAYS)
            .map(|index| {
                let state = if self.progress.is_completed(index) {
                    DayState::Completed
                } else if Some(index) == current {
                    DayState::Current
                } else {
                    DayState::Locked
                };
                DayCard {
                    index,
                    label: format!("Día {}", index + 1),
                    state,
                }
            })
            .collect();
        Calendar { cards, current }
    }

    /// Open `day` in the detail panel.
    ///
    /// Locked or out-of-range days hide the panel and leave the selection
    /// untouched; the returned state is `None` in that case.
    pub fn select_day(&mut self, day: usize) -> Option<DayState> {
        let state = self.progress.day_state(day).filter(|s| s.is_selectable());
        let Some(state) = state else {
            tracing::debug!(day, "ignored selection of locked day");
            self.panel = DetailPanel::Hidden;
            return None;
        };

        self.selected = Some(day);
        self.panel = DetailPanel::Shown {
            title: format!("Afirmación del Día {}", day + 1),
            text: format!("\"{}\"", AFFIRMATIONS[day]),
            show_complete: state != DayState::Completed,
        };
        Some(state)
    }

    /// Mark the selected day as completed.
    ///
    /// On success the selection is cleared, the panel hidden, and the
    /// updated progress returned so the caller can persist it.
    pub fn complete_day(&mut self, day: usize) -> Result<DiaryProgress, DiaryError> {
        if day >= DIARY_DAYS {
            return Err(DiaryError::OutOfRange { day });
        }
        if self.selected != Some(day) {
            return Err(DiaryError::NotSelected {
                day,
                selected: self.selected,
            });
        }
        if self.progress.is_completed(day) {
            return Err(DiaryError::AlreadyCompleted { day });
        }

        self.progress.mark(day);
        self.selected = None;
        self.panel = DetailPanel::Hidden;
        tracing::info!(
            day,
            completed = self.progress.completed_count(),
            "diary day completed"
        );
        Ok(self.progress)
    }

    /// Complete whichever day is selected.
    pub fn complete_selected(&mut self) -> Result<DiaryProgress, DiaryError> {
        match self.selected {
            Some(day) => self.complete_day(day),
            None => Err(DiaryError::NotSelected {
                day: self.progress.current_day().unwrap_or(DIARY_DAYS),
                selected: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress_with(completed: usize) -> DiaryProgress {
        let mut flags = [false; DIARY_DAYS];
        for flag in flags.iter_mut().take(completed) {
            *flag = true;
        }
        DiaryProgress::from_flags(flags)
    }

    #[test]
    fn fresh_progress_starts_at_day_zero() {
        let diary = Diary::default();
        let calendar = diary.render();
        assert_eq!(calendar.current, Some(0));
        assert_eq!(calendar.cards[0].state, DayState::Current);
        assert!(
            calendar.cards[1..]
                .iter()
                .all(|c| c.state == DayState::Locked)
        );
        assert_eq!(calendar.cards[0].label, "Día 1");
        assert_eq!(calendar.cards[20].label, "Día 21");
    }

    #[test]
    fn completing_day_zero_advances_current() {
        let mut diary = Diary::default();
        assert_eq!(diary.select_day(0), Some(DayState::Current));
        let progress = diary.complete_day(0).unwrap();
        assert!(progress.is_completed(0));
        assert_eq!(progress.current_day(), Some(1));
        assert_eq!(diary.selected(), None);
        assert!(!diary.panel().is_visible());

        let calendar = diary.render();
        assert_eq!(calendar.cards[0].state, DayState::Completed);
        assert_eq!(calendar.cards[1].state, DayState::Current);
    }

    #[test]
    fn last_day_completion_finishes_diary() {
        let mut diary = Diary::new(progress_with(20));
        assert_eq!(diary.render().current, Some(20));
        diary.select_day(20);
        let progress = diary.complete_day(20).unwrap();
        assert!(progress.is_finished());
        assert_eq!(diary.render().current, None);
        assert!(
            diary
                .render()
                .cards
                .iter()
                .all(|c| c.state == DayState::Completed)
        );
    }

    #[test]
    fn locked_selection_hides_panel_and_keeps_selection() {
        let mut diary = Diary::new(progress_with(3));
        diary.select_day(1);
        assert!(diary.panel().is_visible());

        assert_eq!(diary.select_day(10), None);
        assert_eq!(diary.selected(), Some(1));
        assert_eq!(diary.panel(), &DetailPanel::Hidden);
    }

    #[test]
    fn out_of_range_selection_is_ignored() {
        let mut diary = Diary::default();
        assert_eq!(diary.select_day(DIARY_DAYS), None);
        assert_eq!(diary.selected(), None);
    }

    #[test]
    fn completed_day_panel_hides_complete_action() {
        let mut diary = Diary::new(progress_with(2));
        diary.select_day(0);
        match diary.panel() {
            DetailPanel::Shown {
                title,
                text,
                show_complete,
            } => {
                assert_eq!(title, "Afirmación del Día 1");
                assert_eq!(text, &format!("\"{}\"", AFFIRMATIONS[0]));
                assert!(!show_complete);
            }
            DetailPanel::Hidden => panic!("panel should be visible"),
        }

        diary.select_day(2);
        assert!(matches!(
            diary.panel(),
            DetailPanel::Shown {
                show_complete: true,
                ..
            }
        ));
    }

    #[test]
    fn complete_requires_selection() {
        let mut diary = Diary::default();
        assert_eq!(
            diary.complete_day(0),
            Err(DiaryError::NotSelected {
                day: 0,
                selected: None
            })
        );
        assert!(!diary.progress().is_completed(0));
    }

    #[test]
    fn complete_rejects_already_completed_day() {
        let mut diary = Diary::new(progress_with(4));
        diary.select_day(2);
        assert_eq!(
            diary.complete_day(2),
            Err(DiaryError::AlreadyCompleted { day: 2 })
        );
        assert_eq!(diary.selected(), Some(2));
    }

    #[test]
    fn complete_rejects_other_day_than_selected() {
        let mut diary = Diary::new(progress_with(4));
        diary.select_day(4);
        assert!(matches!(
            diary.complete_day(3),
            Err(DiaryError::NotSelected { .. })
        ));
        assert_eq!(
            diary.complete_day(99),
            Err(DiaryError::OutOfRange { day: 99 })
        );
    }

    #[test]
    fn reset_clears_selection() {
        let mut diary = Diary::default();
        diary.select_day(0);
        diary.reset(progress_with(5));
        assert_eq!(diary.selected(), None);
        assert_eq!(diary.panel(), &DetailPanel::Hidden);
        assert_eq!(diary.render().current, Some(5));
    }

    #[test]
    fn progress_serializes_as_plain_array() {
        let json = serde_json::to_string(&progress_with(1)).unwrap();
        assert!(json.starts_with("[true,false"));
        let back: DiaryProgress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, progress_with(1));
    }

    #[test]
    fn wrong_length_slice_is_rejected() {
        assert!(DiaryProgress::from_slice(&[true; 20]).is_none());
        assert!(DiaryProgress::from_slice(&[false; DIARY_DAYS]).is_some());
    }

    #[test]
    fn gaps_are_detected() {
        let mut flags = [false; DIARY_DAYS];
        flags[0] = true;
        flags[2] = true;
        let progress = DiaryProgress::from_flags(flags);
        assert_eq!(progress.current_day(), Some(1));
        assert_eq!(progress.completed_count(), 2);
        assert_eq!(progress.day_state(2), Some(DayState::Completed));
        let prefix = progress_with(7);
        assert_eq!(prefix.current_day(), Some(prefix.completed_count()));
    }

    #[test]
    fn error_display() {
        assert_eq!(
            DiaryError::AlreadyCompleted { day: 3 }.to_string(),
            "day 3 is already completed"
        );
        assert_eq!(
            DiaryError::OutOfRange { day: 30 }.to_string(),
            "day 30 is outside the 21-day diary"
        );
    }
}
