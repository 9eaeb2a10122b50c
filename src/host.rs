//! Host Integration
//!
//! The interpreter core is host-agnostic; the embedding supplies a `Host`
//! implementation to bridge a key/value store for root-scope variables and
//! to signal cooperative interruption (e.g. Ctrl-C in a console host).
//! Root-vs-host precedence is a policy of the embedding, not a language
//! feature, which is why it lives behind this seam.

/// Callbacks the interpreter consults at well-defined points. All methods
/// have no-op defaults, so a host only overrides what it needs.
pub trait Host {
    /// Called whenever a root-scoped variable is written. Returning `false`
    /// rejects the write and aborts the assignment.
    fn set_root_var(&mut self, _name: &[u8], _value: &[u8]) -> bool {
        true
    }

    /// Consulted when a variable resolves to the root scope (or not at
    /// all). A `Some` result takes precedence over the interpreter's own
    /// root binding.
    fn get_root_var(&self, _name: &[u8]) -> Option<Vec<u8>> {
        None
    }

    /// Polled at the top of each command-dispatch iteration and before
    /// expression evaluation. Returning `true` raises an interrupted error.
    fn interrupted(&self) -> bool {
        false
    }
}

/// The default host: stores nothing, rejects nothing, never interrupts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHost;

impl Host for NoopHost {}
