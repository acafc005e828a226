//! Emission backends for the Aplan translator.
//!
//! Each backend streams one of the four artifacts of a translation run
//! from a resolved [aplan_ir::Context]; [emit_project] drives all four.
mod act;
mod behp;
mod env;
mod evt;
mod project;
mod traits;

pub use act::ActBackend;
pub use behp::BehBackend;
pub use env::EnvBackend;
pub use evt::EvtBackend;
pub use project::emit_project;
pub use traits::Backend;
