//! Behavior backend: the unit behavior formulas together with the
//! protocol definitions they reference.
use crate::traits::{validate_units, Backend};
use aplan_ir::{
    Behavior, BodyElementSequence, Context, DesignUnit, ElementTag,
    EntityNode, Related,
};
use aplan_utils::{format, AplanResult, Error, Id, OutputFile};
use itertools::Itertools;
use std::io::Write;

#[derive(Default)]
pub struct BehBackend;

/// A call-style element whose callee exists in the unit but is still
/// symbolic means link resolution never ran; the rendered body would
/// carry the raw call text.
fn check_sequence(
    unit: &DesignUnit,
    sequence: &BodyElementSequence,
) -> AplanResult<()> {
    let actions = unit.actions.borrow();
    for element in sequence.iter() {
        if let Related::Nested(nested) = &element.related {
            check_sequence(unit, nested)?;
            continue;
        }
        if matches!(element.related, Related::Resolved(_)) {
            continue;
        }
        let identifier = element.entity().identifier;
        if let Some(name) = format::extract_call_name(identifier.as_str()) {
            if actions.get(Id::new(&name)).is_some() {
                return Err(Error::invariant_violation(format!(
                    "call `{identifier}` in `{}` is unresolved; link \
                     resolution must run before emission",
                    unit.identifier()
                )));
            }
        }
    }
    Ok(())
}

fn check_unit_links(unit: &DesignUnit) -> AplanResult<()> {
    for protocol in unit.out_of_block_elements.borrow().iter() {
        check_sequence(unit, &protocol.body)?;
    }
    for structure in unit.structures.borrow().iter() {
        for behavior in structure.borrow().behavior() {
            if let Behavior::Protocol(protocol) = behavior {
                check_sequence(unit, &protocol.body)?;
            }
        }
    }
    Ok(())
}

impl Backend for BehBackend {
    fn name(&self) -> &'static str {
        "behp"
    }

    fn validate(ctx: &Context) -> AplanResult<()> {
        validate_units(ctx)?;
        for unit in ctx.design_units.iter() {
            check_unit_links(unit)?;
        }
        Ok(())
    }

    fn emit(ctx: &Context, file: &mut OutputFile) -> AplanResult<()> {
        let f = &mut file.get_write()?;
        let behaviour = ctx
            .design_units
            .iter_excluding(ElementTag::Object)
            .map(|unit| {
                // The orchestration formula, then the definitions of the
                // protocols it names.
                let parts = [
                    unit.render_behavior(),
                    unit.structures.borrow().render_all(),
                    unit.out_of_block_elements.borrow().render_all(),
                ];
                let joined = parts.join("\n");
                format::remove_trailing_comma(&joined).to_string()
            })
            .join(",\n");
        write!(f, "{behaviour}")?;
        Ok(())
    }
}
