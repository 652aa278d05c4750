//! Report renderers for command results.
//!
//! - [`terminal`] — colored summary boxes and tables; respects `--verbose` / `--quiet`.
//!
//! JSON output needs no renderer: every result type is `Serialize`.

pub mod terminal;
