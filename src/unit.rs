//! Pluggable unit handling.
//!
//! By default unit labels on [`Number`](crate::Number)s are opaque
//! strings: two numbers compare equal only when their labels match
//! exactly. A process may install a [`UnitRegistry`] once at startup to
//! reinterpret labels (for example to treat `celsius` and `°C` as the
//! same unit). The registry changes how units are *compared*, never how
//! they appear on the wire.

use once_cell::sync::OnceCell;

/// A capability for canonicalizing unit labels.
pub trait UnitRegistry: Send + Sync {
    /// Return the canonical spelling for a unit label, or `None` if the
    /// registry does not know the unit (it is then left as-is).
    fn canonical(&self, unit: &str) -> Option<String>;
}

static REGISTRY: OnceCell<Box<dyn UnitRegistry>> = OnceCell::new();

/// Install the process-wide unit registry. May be called at most once,
/// before any unit-sensitive comparison; returns false if a registry
/// was already installed.
pub fn install_unit_registry(registry: Box<dyn UnitRegistry>) -> bool {
    REGISTRY.set(registry).is_ok()
}

/// Canonicalize a unit label through the installed registry, or return
/// it unchanged when no registry is installed.
pub(crate) fn canonical_unit(unit: &str) -> String {
    match REGISTRY.get() {
        Some(registry) => registry
            .canonical(unit)
            .unwrap_or_else(|| unit.to_owned()),
        None => unit.to_owned(),
    }
}
