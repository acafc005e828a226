//! Event-description backend: one event per input port across all units.
use crate::traits::{validate_units, Backend};
use aplan_ir::{Context, EntityNode, TypeContext};
use aplan_utils::{AplanResult, OutputFile};
use std::io::Write;

#[derive(Default)]
pub struct EvtBackend;

impl Backend for EvtBackend {
    fn name(&self) -> &'static str {
        "evt"
    }

    fn validate(ctx: &Context) -> AplanResult<()> {
        validate_units(ctx)
    }

    fn emit(ctx: &Context, file: &mut OutputFile) -> AplanResult<()> {
        let f = &mut file.get_write()?;
        writeln!(f, "events(")?;
        for unit in ctx.design_units.iter() {
            for port in unit.declarations.borrow().input_ports() {
                writeln!(
                    f,
                    "\ts_{}:obj(x1:{});",
                    port.entity().display_name(),
                    port.project_type(TypeContext::None)
                )?;
            }
        }
        write!(f, ");")?;
        Ok(())
    }
}
