//! Decomposition of composite listing labels
//!
//! The iteration listing labels every row with one string carrying three
//! fields, e.g.
//! `Fizik Mühendisliği Lisans Programı (%100 İngilizce) 2010-2011 / Güz Dönemi Sonrası`:
//! the program name, a language-variant marker, and the iteration label.
//!
//! Rules, applied in order:
//! 1. The first run of four digits starts the iteration label; everything
//!    before it is the pre-iteration part.
//! 2. Inside the pre-iteration part (or the whole label when there is no
//!    year), a percentage marker (`%100` or `100%`) starts the variant
//!    qualifier. The program name is what precedes it, with a dangling
//!    opening parenthesis removed. Without a marker the whole pre-iteration
//!    part is the name.
//! 3. No year means a single-iteration program: the iteration label is
//!    [`DEFAULT_ITERATION_LABEL`].
//! 4. A name that comes out empty falls back to the raw label.
//!
//! Both marker placements (`%100` and `100%`, parenthesised or not) go
//! through the same rules; neither format is special-cased.

use regex::Regex;
use std::sync::LazyLock;

/// Iteration label for programs that only ever had one curriculum
pub const DEFAULT_ITERATION_LABEL: &str = "Tüm Öğrenciler İçin";

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").expect("valid regex"));
static PERCENT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%\d+|\d+%").expect("valid regex"));

/// Result of splitting a listing label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLabel {
    pub program_name: String,
    pub iteration_label: String,
}

/// Splits a listing label into program name and iteration label
///
/// Total: every input produces a non-empty program name unless the input
/// itself is blank.
///
/// # Examples
///
/// ```
/// use curriculum_harvester::plan::{normalize_label, DEFAULT_ITERATION_LABEL};
///
/// let label = normalize_label("Peyzaj Mimarlığı Lisans Programı");
/// assert_eq!(label.program_name, "Peyzaj Mimarlığı Lisans Programı");
/// assert_eq!(label.iteration_label, DEFAULT_ITERATION_LABEL);
/// ```
pub fn normalize_label(raw: &str) -> NormalizedLabel {
    let (pre_iteration, iteration) = match YEAR.find(raw) {
        Some(year) => (&raw[..year.start()], Some(raw[year.start()..].trim())),
        None => (raw, None),
    };

    let name = match PERCENT_MARKER.find(pre_iteration) {
        Some(marker) => &pre_iteration[..marker.start()],
        None => pre_iteration,
    };
    let name = strip_dangling_paren(name);

    let program_name = if name.is_empty() {
        tracing::debug!("No program name before the iteration in \"{}\"", raw);
        raw.trim().to_string()
    } else {
        name.to_string()
    };

    let iteration_label = match iteration {
        Some(iteration) if !iteration.is_empty() => iteration.to_string(),
        _ => DEFAULT_ITERATION_LABEL.to_string(),
    };

    NormalizedLabel {
        program_name,
        iteration_label,
    }
}

/// `"Name ("` → `"Name"`, for markers written as `(%100 İngilizce)`
fn strip_dangling_paren(name: &str) -> &str {
    let mut name = name.trim();
    while let Some(rest) = name.strip_suffix('(') {
        name = rest.trim_end();
    }
    name
}

/// Builds the composite program key `"{name} ({variant})"`
///
/// Doubled parentheses left over from variants that already carry their own
/// are collapsed to a single pair.
pub fn program_key(program_name: &str, variant: &str) -> String {
    let mut key = format!("{} ({})", program_name.trim(), variant.trim());
    for (doubled, single) in [("( (", "("), ("((", "("), ("))", ")")] {
        while key.contains(doubled) {
            key = key.replace(doubled, single);
        }
    }
    key
}

/// Splits a composite key back into `(name, variant)` at its last `" ("`
pub fn split_program_key(key: &str) -> Option<(&str, &str)> {
    let (name, variant) = key.rsplit_once(" (")?;
    let variant = variant.strip_suffix(')')?;
    Some((name, variant))
}
