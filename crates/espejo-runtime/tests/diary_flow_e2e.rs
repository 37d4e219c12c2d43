//! End-to-end diary flows through the application model.
//!
//! Storage is a shared `MemoryStorage` so each test can inspect what was
//! persisted after driving the model with messages.

use std::rc::Rc;

use espejo_core::diary::{DIARY_DAYS, DayState, DetailPanel};
use espejo_core::generators::{ReconstructionRecord, SymbolRng};
use espejo_core::module::ModuleId;
use espejo_runtime::app::SAVE_FAILED_STATUS;
use espejo_runtime::persistence::{DIARY_PROGRESS_KEY, RECONSTRUCTION_KEY};
use espejo_runtime::{
    Cmd, EspejoApp, MemoryStorage, Model, Msg, ProgressStore, StorageBackend, StorageError,
    StorageResult,
};
use pretty_assertions::assert_eq;

fn app_with(storage: &Rc<MemoryStorage>) -> EspejoApp {
    EspejoApp::new(ProgressStore::new(Rc::clone(storage)), SymbolRng::new(11))
}

fn stored_flags(storage: &MemoryStorage) -> Vec<bool> {
    let raw = storage
        .get(DIARY_PROGRESS_KEY)
        .unwrap()
        .expect("progress persisted");
    serde_json::from_str(&raw).unwrap()
}

fn states(app: &EspejoApp) -> Vec<DayState> {
    app.view().calendar.cards.iter().map(|c| c.state).collect()
}

#[test]
fn fresh_visit_completes_first_day() {
    let storage = Rc::new(MemoryStorage::new());
    let mut app = app_with(&storage);
    let _ = app.update(Msg::Navigate(ModuleId::DiarioEspejo));

    let view = app.view();
    assert_eq!(view.active, ModuleId::DiarioEspejo);
    assert_eq!(view.calendar.current, Some(0));
    assert_eq!(view.panel, DetailPanel::Hidden);

    let _ = app.update(Msg::DayClicked(0));
    assert!(app.view().panel.is_visible());
    let _ = app.update(Msg::CompleteDayClicked);

    let view = app.view();
    assert_eq!(view.calendar.current, Some(1));
    assert_eq!(view.panel, DetailPanel::Hidden);
    assert_eq!(app.diary().selected(), None);

    let flags = stored_flags(&storage);
    assert_eq!(flags.len(), DIARY_DAYS);
    assert!(flags[0]);
    assert!(flags[1..].iter().all(|f| !f));
}

#[test]
fn completing_last_day_finishes_diary() {
    let mut flags = vec![true; DIARY_DAYS];
    flags[20] = false;
    let storage = Rc::new(MemoryStorage::with_entries([(
        DIARY_PROGRESS_KEY,
        serde_json::to_string(&flags).unwrap(),
    )]));
    let mut app = app_with(&storage);
    let _ = app.update(Msg::Navigate(ModuleId::DiarioEspejo));
    assert_eq!(app.view().calendar.current, Some(20));

    let _ = app.update(Msg::DayClicked(20));
    let _ = app.update(Msg::CompleteDayClicked);

    assert_eq!(app.view().calendar.current, None);
    assert!(states(&app).iter().all(|s| *s == DayState::Completed));
    assert!(stored_flags(&storage).iter().all(|f| *f));
}

#[test]
fn locked_click_keeps_selection_and_hides_panel() {
    let storage = Rc::new(MemoryStorage::new());
    let mut app = app_with(&storage);
    let _ = app.update(Msg::Navigate(ModuleId::DiarioEspejo));
    let _ = app.update(Msg::DayClicked(0));
    let _ = app.update(Msg::DayClicked(5));

    assert_eq!(app.diary().selected(), Some(0));
    assert_eq!(app.view().panel, DetailPanel::Hidden);

    // The hidden selection can still be completed.
    let _ = app.update(Msg::CompleteDayClicked);
    assert!(stored_flags(&storage)[0]);
}

#[test]
fn completing_without_selection_changes_nothing() {
    let storage = Rc::new(MemoryStorage::new());
    let mut app = app_with(&storage);
    let _ = app.update(Msg::Navigate(ModuleId::DiarioEspejo));
    assert!(app.update(Msg::CompleteDayClicked).is_none());
    assert!(storage.get(DIARY_PROGRESS_KEY).unwrap().is_none());
}

#[test]
fn reentering_diary_reloads_and_clears_selection() {
    let storage = Rc::new(MemoryStorage::new());
    let mut app = app_with(&storage);
    let _ = app.update(Msg::Navigate(ModuleId::DiarioEspejo));
    let _ = app.update(Msg::DayClicked(0));
    let _ = app.update(Msg::CompleteDayClicked);
    let _ = app.update(Msg::DayClicked(1));

    // Another tab wrote more progress meanwhile.
    let mut flags = vec![false; DIARY_DAYS];
    flags[..4].fill(true);
    storage
        .set(DIARY_PROGRESS_KEY, &serde_json::to_string(&flags).unwrap())
        .unwrap();

    let _ = app.update(Msg::Navigate(ModuleId::InicioSolar));
    let _ = app.update(Msg::Navigate(ModuleId::DiarioEspejo));
    assert_eq!(app.diary().selected(), None);
    assert_eq!(app.view().calendar.current, Some(4));
}

#[test]
fn corrupt_storage_starts_fresh() {
    let storage = Rc::new(MemoryStorage::with_entries([(
        DIARY_PROGRESS_KEY,
        "[true, false]",
    )]));
    let mut app = app_with(&storage);
    let _ = app.update(Msg::Navigate(ModuleId::DiarioEspejo));
    assert_eq!(app.view().calendar.current, Some(0));
}

/// Backend whose writes always fail.
struct ReadOnly;

impl StorageBackend for ReadOnly {
    fn name(&self) -> &str {
        "ReadOnly"
    }
    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Ok(None)
    }
    fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Backend("QuotaExceededError".into()))
    }
}

#[test]
fn failed_save_keeps_progress_and_reports_status() {
    let mut app = EspejoApp::new(ProgressStore::new(ReadOnly), SymbolRng::new(0));
    let _ = app.update(Msg::Navigate(ModuleId::DiarioEspejo));
    let _ = app.update(Msg::DayClicked(0));
    let _ = app.update(Msg::CompleteDayClicked);

    let view = app.view();
    assert_eq!(view.calendar.current, Some(1));
    assert_eq!(view.status.as_deref(), Some(SAVE_FAILED_STATUS));
}

#[test]
fn reconstruction_persists_record_and_embeds_essence() {
    let storage = Rc::new(MemoryStorage::new());
    let mut app = app_with(&storage);
    let _ = app.update(Msg::ChimeLoaded);
    let record = ReconstructionRecord {
        quien_fui: "sombra".into(),
        quien_rompio: "el olvido".into(),
        quien_soy: "Fénix renacida".into(),
    };
    let cmd = app.update(Msg::ReconstructionSubmitted {
        record: record.clone(),
        name: String::new(),
    });
    assert!(matches!(cmd, Cmd::PlayChime));

    let symbol = app.view().symbol.expect("symbol generated");
    assert_eq!(
        symbol.mantra,
        "Yo, Ser de Luz, transmuto mi pasado. Desde la esencia de 'Fénix', forjo mi nuevo símbolo de poder."
    );
    let raw = storage.get(RECONSTRUCTION_KEY).unwrap().unwrap();
    let saved: ReconstructionRecord = serde_json::from_str(&raw).unwrap();
    assert_eq!(saved, record);
}

#[test]
fn same_seed_same_glyph() {
    let record = ReconstructionRecord {
        quien_soy: "Luz".into(),
        ..Default::default()
    };
    let glyph = |seed| {
        let mut app = EspejoApp::new(
            ProgressStore::new(MemoryStorage::new()),
            SymbolRng::new(seed),
        );
        let _ = app.update(Msg::ReconstructionSubmitted {
            record: record.clone(),
            name: "Ana".into(),
        });
        app.view().symbol.map(|s| s.glyph)
    };
    assert_eq!(glyph(99), glyph(99));
}
