#![forbid(unsafe_code)]

//! Text generators for the mantra and power-symbol forms.
//!
//! Both generators are pure: the caller reads the form fields, passes them
//! in, and replaces whatever was previously displayed with the result.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Statement appended to every mantra list.
pub const CLOSING_MANTRA: &str = "Mi reflejo es el de la perfección divina del Sol.";

/// Name used in the power-symbol mantra when the name field is empty.
pub const DEFAULT_NAME: &str = "Ser de Luz";

/// Delay between consecutive mantra reveals.
pub const MANTRA_REVEAL_STEP: Duration = Duration::from_secs(1);

/// Glyphs a power symbol is drawn from.
pub const SYMBOL_GLYPHS: [char; 5] = ['✧', '✦', '☼', '❂', '✨'];

// ─────────────────────────────────────────────────────────────────────────────
// Activation mantras
// ─────────────────────────────────────────────────────────────────────────────

/// Fields of the activation form, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationForm {
    pub name: String,
    pub wounds: String,
    pub beliefs: String,
}

/// One generated statement with its fade-in delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mantra {
    pub text: String,
    pub reveal_delay: Duration,
}

/// Assemble mantras from the activation form.
///
/// Empty fields contribute nothing; the closing statement is always last.
#[must_use]
pub fn generate_mantras(form: &ActivationForm) -> Vec<Mantra> {
    let mut lines = Vec::with_capacity(4);
    if !form.name.is_empty() {
        lines.push(format!("Yo, {}, soy un ser de luz infinita.", form.name));
    }
    if !form.wounds.is_empty() {
        lines.push("Transformo mis heridas en sabiduría y poder.".to_string());
    }
    if !form.beliefs.is_empty() {
        lines.push("Libero todas las creencias que no sirven a mi más alto bien.".to_string());
    }
    lines.push(CLOSING_MANTRA.to_string());

    lines
        .into_iter()
        .enumerate()
        .map(|(i, text)| Mantra {
            text,
            reveal_delay: MANTRA_REVEAL_STEP.saturating_mul(i as u32),
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity reconstruction
// ─────────────────────────────────────────────────────────────────────────────

/// Raw answers of the reconstruction form, stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconstructionRecord {
    /// Who I was.
    pub quien_fui: String,
    /// What broke me.
    pub quien_rompio: String,
    /// Who I am now.
    pub quien_soy: String,
}

impl ReconstructionRecord {
    /// First whitespace-delimited word of the who-I-am answer.
    #[must_use]
    pub fn essence_token(&self) -> &str {
        self.quien_soy.split_whitespace().next().unwrap_or("")
    }
}

/// Generated glyph and mantra.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerSymbol {
    pub glyph: char,
    pub mantra: String,
}

/// Small xorshift64 generator for glyph choice.
///
/// Seeded by the host (clock or configuration) so tests stay deterministic.
#[derive(Debug, Clone)]
pub struct SymbolRng {
    state: u64,
}

impl SymbolRng {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        // Zero is a fixed point of xorshift.
        Self {
            state: seed.wrapping_add(1),
        }
    }

    /// Next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Index in `0..len`; `len` must be non-zero.
    pub fn next_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }
}

/// Build the power symbol for a reconstruction submission.
///
/// `name` comes from the activation form; an empty name falls back to
/// [`DEFAULT_NAME`].
#[must_use]
pub fn generate_symbol(
    record: &ReconstructionRecord,
    name: &str,
    rng: &mut SymbolRng,
) -> PowerSymbol {
    let name = if name.is_empty() { DEFAULT_NAME } else { name };
    let glyph = SYMBOL_GLYPHS[rng.next_index(SYMBOL_GLYPHS.len())];
    let mantra = format!(
        "Yo, {name}, transmuto mi pasado. Desde la esencia de '{}', forjo mi nuevo símbolo de poder.",
        record.essence_token()
    );
    PowerSymbol { glyph, mantra }
}
