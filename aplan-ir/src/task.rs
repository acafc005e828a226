//! Callable task units: a structure body, parameters, and a
//! postcondition.
use crate::{
    ActionParts, ElementTag, Entity, EntityCollection, EntityNode, ParamList,
    Structure, RRC,
};
use aplan_utils::{Counters, Id, Span};

/// A task or function of a design unit. The namespace level the task was
/// declared at doubles as the numeric suffix of its display name.
#[derive(Clone, Debug)]
pub struct Task {
    entity: Entity,
    /// The behavioral body; shared with the unit's structure collection.
    pub structure: Option<RRC<Structure>>,
    pub postcondition: ActionParts,
    pub params: ParamList,
    /// Parameters at the declaration site, before call-site rewriting.
    pub initial_params: ParamList,
}

impl Task {
    pub fn new(
        counters: &mut Counters,
        identifier: impl Into<Id>,
        span: Span,
        namespace_level: Option<u32>,
    ) -> Self {
        let mut entity =
            Entity::new(identifier, span, ElementTag::Task, counters);
        entity.suffix = namespace_level;
        Task {
            entity,
            structure: None,
            postcondition: ActionParts::new(),
            params: ParamList::new(),
            initial_params: ParamList::new(),
        }
    }

    /// True when the parameter list carries the conventional return slot
    /// `return_<task identifier>`.
    pub fn has_return_param(&self) -> bool {
        let return_name = format!("return_{}", self.entity.identifier);
        self.params
            .iter()
            .any(|p| p.entity().identifier == return_name)
    }
}

impl EntityNode for Task {
    fn entity(&self) -> &Entity {
        &self.entity
    }
    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    fn render_name(&self) -> String {
        self.entity.identifier.to_string()
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.structure {
            Some(structure) => write!(
                f,
                "{}({})",
                structure.borrow().entity().identifier,
                self.params
            ),
            None => write!(f, "{}({})", self.entity.identifier, self.params),
        }
    }
}

/// The tasks of one design unit.
pub type TaskCollection = EntityCollection<Task>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Param;

    #[test]
    fn return_param_is_found_by_convention() {
        let mut counters = Counters::new();
        let mut task =
            Task::new(&mut counters, "checksum", Span::UNKNOWN, None);
        assert!(!task.has_return_param());
        task.params.insert(Param::new(
            &mut counters,
            "data",
            "Bits 32",
            Span::UNKNOWN,
            "",
        ));
        task.params.insert(Param::new(
            &mut counters,
            "return_checksum",
            "Bits 8",
            Span::UNKNOWN,
            "",
        ));
        assert!(task.has_return_param());
    }

    #[test]
    fn display_prefers_the_structure_name() {
        let mut counters = Counters::new();
        let mut task = Task::new(&mut counters, "send", Span::UNKNOWN, None);
        task.params.insert(Param::new(
            &mut counters,
            "x",
            "var",
            Span::UNKNOWN,
            "",
        ));
        assert_eq!(task.to_string(), "send(x)");
        let structure = Structure::new(
            &mut counters,
            "send_body",
            Span::UNKNOWN,
            ElementTag::Task,
        );
        task.structure = Some(crate::rrc(structure));
        assert_eq!(task.to_string(), "send_body(x)");
    }
}
