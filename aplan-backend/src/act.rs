//! Action backend: every unit's action definitions.
use crate::traits::{validate_units, Backend};
use aplan_ir::{Context, ElementTag};
use aplan_utils::{AplanResult, OutputFile};
use itertools::Itertools;
use std::io::Write;

#[derive(Default)]
pub struct ActBackend;

impl Backend for ActBackend {
    fn name(&self) -> &'static str {
        "act"
    }

    fn validate(ctx: &Context) -> AplanResult<()> {
        validate_units(ctx)
    }

    fn emit(ctx: &Context, file: &mut OutputFile) -> AplanResult<()> {
        let f = &mut file.get_write()?;
        let actions = ctx
            .design_units
            .iter_excluding(ElementTag::Object)
            .map(|unit| unit.actions.borrow().render_all())
            .join(",\n");
        write!(f, "{actions}")?;
        Ok(())
    }
}
