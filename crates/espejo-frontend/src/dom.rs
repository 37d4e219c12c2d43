#![forbid(unsafe_code)]

//! DOM binding: draws [`AppView`]s and turns page events into [`Msg`]s.
//!
//! Rendering is incremental per section (see [`ViewDiff`]) so that, for
//! example, completing a diary day does not restart the mantra fade-in.
//! Generated text is always written as text content.

use espejo_core::diary::{Calendar, DetailPanel};
use espejo_core::generators::{ActivationForm, Mantra, PowerSymbol, ReconstructionRecord};
use espejo_core::module::ModuleId;
use espejo_runtime::app::{AppView, Msg};
use espejo_runtime::camera::EffectsButton;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, Event, EventTarget, HtmlButtonElement, HtmlElement, HtmlInputElement,
    HtmlTextAreaElement,
};

use crate::markup::{self, ViewDiff};

// ─────────────────────────────────────────────────────────────────────────────
// Listeners
// ─────────────────────────────────────────────────────────────────────────────

/// An attached event listener, detached on drop.
pub struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn attach(
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, JsValue> {
        let callback: Closure<dyn FnMut(Event)> = Closure::new(handler);
        target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            kind,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.callback.as_ref().unchecked_ref());
    }
}

/// Attach the page listeners. Each one hands its message to `send`.
pub fn wire(
    document: &Document,
    send: impl Fn(Msg) + Clone + 'static,
) -> Result<Vec<Listener>, JsValue> {
    let mut listeners = Vec::new();

    let links = document.query_selector_all(markup::NAV_LINK_SELECTOR)?;
    for i in 0..links.length() {
        let Some(link) = links.item(i) else { continue };
        let send = send.clone();
        listeners.push(Listener::attach(&link, "click", move |event: Event| {
            event.prevent_default();
            let target = event
                .current_target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| el.get_attribute(markup::TARGET_ATTR));
            match target.as_deref().and_then(ModuleId::from_dom_id) {
                Some(module) => send(Msg::Navigate(module)),
                None => tracing::warn!(data_target = ?target, "navigation link without a known module"),
            }
        })?);
    }

    if let Some(button) = document.get_element_by_id(markup::REVEAL_BUTTON) {
        let send = send.clone();
        listeners.push(Listener::attach(&button, "click", move |_| {
            send(Msg::RevealReflection)
        })?);
    }

    if let Some(form) = document.get_element_by_id(markup::ACTIVATION_FORM) {
        let send = send.clone();
        let doc = document.clone();
        listeners.push(Listener::attach(&form, "submit", move |event: Event| {
            event.prevent_default();
            send(Msg::ActivationSubmitted(ActivationForm {
                name: field_value(&doc, markup::NAME_FIELD),
                wounds: field_value(&doc, markup::WOUNDS_FIELD),
                beliefs: field_value(&doc, markup::BELIEFS_FIELD),
            }));
        })?);
    }

    if let Some(calendar) = document.get_element_by_id(markup::CALENDAR) {
        let send = send.clone();
        listeners.push(Listener::attach(&calendar, "click", move |event: Event| {
            let day = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| el.closest(markup::DAY_CARD_SELECTOR).ok().flatten())
                .and_then(|card| card.get_attribute(markup::DAY_ATTR))
                .and_then(|attr| markup::parse_day(&attr));
            if let Some(day) = day {
                send(Msg::DayClicked(day));
            }
        })?);
    }

    if let Some(button) = document.get_element_by_id(markup::COMPLETE_DAY_BUTTON) {
        let send = send.clone();
        listeners.push(Listener::attach(&button, "click", move |_| {
            send(Msg::CompleteDayClicked)
        })?);
    }

    if let Some(form) = document.get_element_by_id(markup::RECONSTRUCTION_FORM) {
        let send = send.clone();
        let doc = document.clone();
        listeners.push(Listener::attach(&form, "submit", move |event: Event| {
            event.prevent_default();
            send(Msg::ReconstructionSubmitted {
                record: ReconstructionRecord {
                    quien_fui: field_value(&doc, markup::WHO_I_WAS_FIELD),
                    quien_rompio: field_value(&doc, markup::WHO_BROKE_FIELD),
                    quien_soy: field_value(&doc, markup::WHO_I_AM_FIELD),
                },
                name: field_value(&doc, markup::NAME_FIELD),
            });
        })?);
    }

    if let Some(button) = document.get_element_by_id(markup::EFFECTS_BUTTON) {
        listeners.push(Listener::attach(&button, "click", move |_| {
            send(Msg::ToggleEffects)
        })?);
    }

    tracing::debug!(count = listeners.len(), "page listeners attached");
    Ok(listeners)
}

/// Current value of an `<input>` or `<textarea>`, empty when missing.
fn field_value(document: &Document, id: &str) -> String {
    let Some(el) = document.get_element_by_id(id) else {
        tracing::debug!(id, "form field missing");
        return String::new();
    };
    if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
        input.value()
    } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
        area.value()
    } else {
        String::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Draws views into the page, remembering the last one.
pub struct DomView {
    document: Document,
    last: Option<AppView>,
}

impl DomView {
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document,
            last: None,
        }
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Bring the page in line with `view`.
    pub fn render(&mut self, view: AppView) -> Result<(), JsValue> {
        let diff = ViewDiff::between(self.last.as_ref(), &view);
        if diff.modules {
            self.render_modules(&view)?;
        }
        if diff.calendar {
            self.render_calendar(&view.calendar)?;
        }
        if diff.panel {
            self.render_panel(&view.panel)?;
        }
        if diff.effects_button {
            self.render_effects_button(view.effects_button);
        }
        if diff.mantras {
            self.render_mantras(&view.mantras)?;
        }
        if diff.symbol
            && let Some(symbol) = &view.symbol
        {
            self.render_symbol(symbol)?;
        }
        if diff.status {
            self.render_status(view.status.as_deref())?;
        }
        self.last = Some(view);
        Ok(())
    }

    fn by_id(&self, id: &str) -> Option<Element> {
        let el = self.document.get_element_by_id(id);
        if el.is_none() {
            tracing::debug!(id, "element missing, section skipped");
        }
        el
    }

    fn html_by_id(&self, id: &str) -> Option<HtmlElement> {
        self.by_id(id).and_then(|el| el.dyn_into().ok())
    }

    fn render_modules(&self, view: &AppView) -> Result<(), JsValue> {
        for &(module, visible) in &view.modules {
            if let Some(el) = self.html_by_id(module.dom_id()) {
                el.style().set_property("display", markup::display(visible))?;
                el.class_list()
                    .toggle_with_force(markup::ACTIVE_CLASS, visible)?;
            }
        }
        let links = self.document.query_selector_all(markup::NAV_LINK_SELECTOR)?;
        for i in 0..links.length() {
            let Some(link) = links.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let active = link.get_attribute(markup::TARGET_ATTR).as_deref()
                == Some(view.active.dom_id());
            link.class_list()
                .toggle_with_force(markup::ACTIVE_CLASS, active)?;
        }
        Ok(())
    }

    fn render_calendar(&self, calendar: &Calendar) -> Result<(), JsValue> {
        let Some(container) = self.by_id(markup::CALENDAR) else {
            return Ok(());
        };
        container.set_inner_html("");
        for card in &calendar.cards {
            let el = self.document.create_element("div")?;
            el.class_list()
                .add_2(markup::DAY_CARD_CLASS, card.state.css_class())?;
            el.set_attribute(markup::DAY_ATTR, &card.index.to_string())?;
            let label = self.document.create_element("span")?;
            label.set_text_content(Some(&card.label));
            el.append_child(&label)?;
            el.append_with_str_1(&(card.index + 1).to_string())?;
            container.append_child(&el)?;
        }
        Ok(())
    }

    fn render_panel(&self, panel: &DetailPanel) -> Result<(), JsValue> {
        let Some(container) = self.html_by_id(markup::AFFIRMATION_PANEL) else {
            return Ok(());
        };
        match panel {
            DetailPanel::Hidden => {
                container.style().set_property("display", markup::display(false))?;
            }
            DetailPanel::Shown {
                title,
                text,
                show_complete,
            } => {
                if let Some(el) = self.by_id(markup::AFFIRMATION_TITLE) {
                    el.set_text_content(Some(title));
                }
                if let Some(el) = self.by_id(markup::AFFIRMATION_TEXT) {
                    el.set_text_content(Some(text));
                }
                if let Some(button) = self.html_by_id(markup::COMPLETE_DAY_BUTTON) {
                    button
                        .style()
                        .set_property("display", markup::display(*show_complete))?;
                }
                container.style().set_property("display", markup::display(true))?;
            }
        }
        Ok(())
    }

    fn render_effects_button(&self, state: EffectsButton) {
        let Some(button) = self
            .by_id(markup::EFFECTS_BUTTON)
            .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok())
        else {
            return;
        };
        button.set_text_content(Some(state.label));
        button.set_disabled(state.disabled);
    }

    fn render_mantras(&self, mantras: &[Mantra]) -> Result<(), JsValue> {
        let Some(container) = self.by_id(markup::MANTRAS_CONTAINER) else {
            return Ok(());
        };
        container.set_inner_html("");
        for mantra in mantras {
            let p: HtmlElement = self.document.create_element("p")?.dyn_into()?;
            p.set_class_name(markup::MANTRA_CLASS);
            p.set_text_content(Some(&mantra.text));
            p.style()
                .set_property("animation-delay", &markup::animation_delay(mantra.reveal_delay))?;
            container.append_child(&p)?;
        }
        Ok(())
    }

    fn render_symbol(&self, symbol: &PowerSymbol) -> Result<(), JsValue> {
        let Some(container) = self.by_id(markup::SYMBOL_CONTAINER) else {
            return Ok(());
        };
        container.set_inner_html("");
        let glyph = self.document.create_element("div")?;
        glyph.set_id(markup::SYMBOL_GLYPH);
        glyph.set_text_content(Some(&symbol.glyph.to_string()));
        let text = self.document.create_element("p")?;
        text.set_id(markup::SYMBOL_TEXT);
        text.set_text_content(Some(&symbol.mantra));
        container.append_child(&glyph)?;
        container.append_child(&text)?;
        container.class_list().add_1(markup::VISIBLE_CLASS)?;
        Ok(())
    }

    fn render_status(&self, status: Option<&str>) -> Result<(), JsValue> {
        let el = match self.document.get_element_by_id(markup::STATUS) {
            Some(el) => el,
            None if status.is_none() => return Ok(()),
            None => {
                let Some(module) = self.by_id(ModuleId::DiarioEspejo.dom_id()) else {
                    return Ok(());
                };
                let el = self.document.create_element("p")?;
                el.set_id(markup::STATUS);
                el.set_class_name(markup::STATUS_CLASS);
                module.append_child(&el)?;
                el
            }
        };
        el.set_text_content(status);
        if let Some(html) = el.dyn_ref::<HtmlElement>() {
            html.style()
                .set_property("display", markup::display(status.is_some()))?;
        }
        Ok(())
    }
}
