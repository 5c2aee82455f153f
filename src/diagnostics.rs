//! Non-fatal warning channel used by the Verifier and Codec.
//!
//! The crate is `no_std`-capable, so it cannot reach for `log` or `tracing`
//! unconditionally. `Diagnostics` is the minimal seam instead: callers implement
//! `warn`, and the Verifier/Codec take `&mut dyn Diagnostics` rather than calling a
//! global logger. A `std`-only default sink prints to `stderr`.

use alloc::string::String;

/// One non-fatal condition raised while verifying or coding an HDU.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A mandatory geometry keyword (`BITPIX`, `NAXISn`, `PCOUNT`, `GCOUNT`) did not
    /// match the data's actual shape; the card was overwritten with the computed
    /// value.
    GeometryRepaired {
        keyword: String,
        found: String,
        repaired: String,
    },
    /// A pointer-column repeat count outside `{0,1}` was clamped to 1.
    RepeatClamped { column: usize, found: usize },
    /// Any other condition worth surfacing but not worth a hard error.
    Other(String),
}

impl core::fmt::Display for Warning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Warning::GeometryRepaired {
                keyword,
                found,
                repaired,
            } => write!(
                f,
                "{keyword} was {found}, repaired to {repaired} to match data geometry"
            ),
            Warning::RepeatClamped { column, found } => write!(
                f,
                "column {column}: pointer repeat count {found} clamped to 1"
            ),
            Warning::Other(msg) => write!(f, "{msg}"),
        }
    }
}

/// Side channel for non-fatal warnings. Implement this to route diagnostics into an
/// application's own logging; the default `std` sink just prints to `stderr`.
pub trait Diagnostics {
    fn warn(&mut self, warning: Warning);
}

/// A `Diagnostics` sink that discards everything. Used where no caller-supplied sink
/// is available and silence is acceptable (e.g. construction paths that never repair
/// anything by definition).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn warn(&mut self, _warning: Warning) {}
}

/// The default `std`-only sink: writes each warning to `stderr`, matching the
/// "standard diagnostic output by default" contract.
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrDiagnostics;

#[cfg(feature = "std")]
impl Diagnostics for StderrDiagnostics {
    fn warn(&mut self, warning: Warning) {
        eprintln!("warning: {warning}");
    }
}
