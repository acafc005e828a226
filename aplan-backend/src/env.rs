//! Environment-description backend: types, agent types, and agents of
//! the translated design.
use crate::traits::{validate_units, Backend};
use aplan_ir::{Context, DeclFilter, DeclKind, ElementTag, EntityNode, TypeContext};
use aplan_utils::{AplanResult, OutputFile};
use itertools::Itertools;
use std::io::Write;

#[derive(Default)]
pub struct EnvBackend;

impl Backend for EnvBackend {
    fn name(&self) -> &'static str {
        "env"
    }

    fn validate(ctx: &Context) -> AplanResult<()> {
        validate_units(ctx)
    }

    fn emit(ctx: &Context, file: &mut OutputFile) -> AplanResult<()> {
        let f = &mut file.get_write()?;
        writeln!(f, "environment (")?;

        // Types: the run-wide typedefs followed by each unit's own.
        writeln!(f, "\ttypes : obj (")?;
        let type_blocks = std::iter::once(ctx.typedefs.render_block())
            .chain(
                ctx.design_units
                    .iter()
                    .map(|unit| unit.typedefs.render_block()),
            )
            .filter(|block| !block.is_empty())
            .join(",\n");
        if type_blocks.is_empty() {
            writeln!(f, "\t\t\tNil")?;
        } else {
            writeln!(f, "{type_blocks}")?;
        }
        writeln!(f, "\t);")?;

        writeln!(f, "\tattributes : obj (Nil);")?;

        // Agent types: one object per unit, object units excluded.
        writeln!(f, "\tagent_types : obj (")?;
        for unit in ctx.design_units.iter_excluding(ElementTag::Object) {
            writeln!(f, "\t\t{} : obj (", unit.identifier())?;
            let decls = unit
                .declarations
                .borrow()
                .filter(&DeclFilter::new().exclude_kind(DeclKind::EnumType));
            if decls.is_empty() {
                writeln!(f, "\t\t\tNil")?;
            } else {
                let members = decls
                    .iter()
                    .map(|decl| {
                        format!(
                            "\t\t\t{}:{}",
                            decl.entity().display_name(),
                            decl.project_type(TypeContext::None)
                        )
                    })
                    .join(",\n");
                writeln!(f, "{members}")?;
            }
            writeln!(f, "\t\t),")?;
        }
        writeln!(f, "\t\tENVIRONMENT:obj(Nil)")?;
        writeln!(f, "\t);")?;

        // Agents: class units have no standalone agent.
        writeln!(f, "\tagents : obj (")?;
        for unit in ctx.design_units.iter_excluding(ElementTag::Class) {
            writeln!(
                f,
                "\t\t{} : obj ({}),",
                unit.identifier(),
                unit.unique_name
            )?;
        }
        writeln!(f, "\t\tENVIRONMENT : obj (env)")?;
        writeln!(f, "\t);")?;

        writeln!(f, "\taxioms : obj (Nil);")?;
        writeln!(f, "\tlogic_formula : obj (1)")?;
        write!(f, ");")?;
        Ok(())
    }
}
