//! Shared utilities for the Aplan translator.
mod counters;
mod errors;
mod id;
mod out_file;
mod span;

pub mod format;
pub mod math;

pub use counters::{CounterKind, Counters};
pub use errors::{AplanResult, Error};
pub use id::Id;
pub use out_file::OutputFile;
pub use span::Span;
