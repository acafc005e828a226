//! Defines the interface for emission backends.
use aplan_ir::Context;
use aplan_utils::{AplanResult, Error, OutputFile};

/// A backend that turns a resolved translation context into one textual
/// artifact. No partial artifact is valid: any failure aborts the run.
pub trait Backend {
    /// The name of this backend.
    fn name(&self) -> &'static str;

    /// Checks whether the context is amenable to this backend.
    fn validate(ctx: &Context) -> AplanResult<()>;

    /// Transforms the context into the artifact text.
    fn emit(ctx: &Context, file: &mut OutputFile) -> AplanResult<()>;

    /// Convenience function that validates and emits.
    fn run(&self, ctx: &Context, mut file: OutputFile) -> AplanResult<()> {
        Self::validate(ctx)?;
        Self::emit(ctx, &mut file)
    }
}

/// Shared validation: every unit must carry the upper-cased, non-empty
/// identifier the construction phase establishes.
pub(crate) fn validate_units(ctx: &Context) -> AplanResult<()> {
    for unit in ctx.design_units.iter() {
        let identifier = unit.identifier();
        if identifier.is_empty() {
            return Err(Error::invariant_violation(
                "design unit with an empty identifier",
            ));
        }
        if identifier.as_str() != identifier.as_str().to_uppercase() {
            return Err(Error::invariant_violation(format!(
                "design unit identifier `{identifier}` is not upper-case"
            )));
        }
    }
    Ok(())
}
