//! Named type definitions: enums, structs, and unions.
use crate::{
    DeclKind, DeclarationCollection, ElementTag, Entity, EntityCollection,
    EntityNode, TypeContext,
};
use aplan_utils::{Counters, Id, Span};
use itertools::Itertools;

/// A type definition. `unique_name` is the design-wide name the target
/// language sees; `identifier` is the source-level name declarations
/// refer to.
#[derive(Clone, Debug)]
pub struct Typedef {
    entity: Entity,
    pub unique_name: Id,
    /// One of `EnumType`, `StructType`, `UnionType`.
    pub data_type: DeclKind,
    pub members: DeclarationCollection,
    pub file_path: String,
}

impl Typedef {
    pub fn new(
        counters: &mut Counters,
        identifier: impl Into<Id>,
        unique_name: impl Into<Id>,
        span: Span,
        file_path: impl Into<String>,
        data_type: DeclKind,
        tag: ElementTag,
    ) -> Self {
        Typedef {
            entity: Entity::new(identifier, span, tag, counters),
            unique_name: unique_name.into(),
            data_type,
            members: DeclarationCollection::new(),
            file_path: file_path.into(),
        }
    }

    pub fn has_member(&self, identifier: Id) -> bool {
        self.members.get(identifier).is_some()
    }

    /// Render this definition for the environment artifact. Enums list
    /// their member names; structs and unions list `member:type` pairs.
    pub fn render(&self) -> String {
        const INDENT: &str = "\t\t\t";
        let mut result = format!("{}:", self.unique_name);
        match self.data_type {
            DeclKind::EnumType => {
                result.push_str("(\n");
                result.push_str(INDENT);
                result.push_str(
                    &self
                        .members
                        .iter()
                        .map(|m| m.entity().display_name())
                        .join(&format!(",\n{INDENT}")),
                );
                result.push_str("\n\t\t)");
            }
            DeclKind::StructType | DeclKind::UnionType => {
                result.push_str(" obj (\n");
                result.push_str(INDENT);
                result.push_str(
                    &self
                        .members
                        .iter()
                        .map(|m| m.project_type(TypeContext::StructMember))
                        .join(&format!(",\n{INDENT}")),
                );
                result.push_str("\n\t\t)");
            }
            kind => {
                // Only the three aggregate kinds are constructible here.
                debug_assert!(false, "typedef with non-type kind {kind:?}");
            }
        }
        result
    }
}

impl EntityNode for Typedef {
    fn entity(&self) -> &Entity {
        &self.entity
    }
    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

/// The typedef registry of a unit or of the whole translation.
pub type TypedefCollection = EntityCollection<Typedef>;

impl TypedefCollection {
    /// Render every definition as an indented block for the environment
    /// artifact's `types` section.
    pub fn render_block(&self) -> String {
        self.iter().map(|t| format!("\t\t{}", t.render())).join(",\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Declaration;

    #[test]
    fn enum_rendering() {
        let mut counters = Counters::new();
        let mut td = Typedef::new(
            &mut counters,
            "state_t",
            "CTRL_STATE_T",
            Span::UNKNOWN,
            "ctrl.sv",
            DeclKind::EnumType,
            ElementTag::None,
        );
        for (name, span) in [("IDLE", Span::new(1, 4)), ("BUSY", Span::new(5, 8))] {
            td.members.insert(Declaration::new(
                &mut counters,
                DeclKind::Enum,
                name,
                span,
                ElementTag::None,
            ));
        }
        assert_eq!(
            td.render(),
            "CTRL_STATE_T:(\n\t\t\tIDLE,\n\t\t\tBUSY\n\t\t)"
        );
    }

    #[test]
    fn struct_rendering_projects_member_types() {
        let mut counters = Counters::new();
        let mut td = Typedef::new(
            &mut counters,
            "packet_t",
            "BUS_PACKET_T",
            Span::UNKNOWN,
            "bus.sv",
            DeclKind::StructType,
            ElementTag::None,
        );
        let mut data = Declaration::new(
            &mut counters,
            DeclKind::Logic,
            "data",
            Span::new(1, 4),
            ElementTag::None,
        );
        data.size = 8;
        td.members.insert(data);
        let valid = Declaration::new(
            &mut counters,
            DeclKind::Bit,
            "valid",
            Span::new(5, 9),
            ElementTag::None,
        );
        td.members.insert(valid);
        assert_eq!(
            td.render(),
            "BUS_PACKET_T: obj (\n\t\t\tvalid:bool,\n\t\t\tdata:Bits 8\n\t\t)"
        );
    }
}
