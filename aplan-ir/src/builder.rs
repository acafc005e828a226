//! IR builder: the convenience layer the front end drives while walking
//! source text. Each method constructs one node, stamps it with the
//! per-run counters, and files it into the right collection of the unit
//! under construction.
use crate::{
    Action, BodyElement, DeclKind, Declaration, DesignUnit, ElementTag,
    EntityNode, Param, ParamList, Protocol, Related, Structure, Task,
    Typedef, ValueParam, RRC,
};
use aplan_utils::{CounterKind, Counters, Id, Span};

/// Builds IR nodes into one design unit.
pub struct UnitBuilder<'a> {
    pub unit: &'a mut DesignUnit,
    pub counters: &'a mut Counters,
}

impl<'a> UnitBuilder<'a> {
    pub fn new(unit: &'a mut DesignUnit, counters: &'a mut Counters) -> Self {
        UnitBuilder { unit, counters }
    }

    /// Add a declaration; duplicate inserts report the existing entry.
    pub fn add_declaration(
        &mut self,
        data_type: DeclKind,
        identifier: impl Into<Id>,
        span: Span,
    ) -> (bool, usize) {
        let decl = Declaration::new(
            self.counters,
            data_type,
            identifier,
            span,
            ElementTag::None,
        );
        self.unit.declarations.borrow_mut().insert(decl)
    }

    /// Add an input port declaration of `size` bits.
    pub fn add_input_port(
        &mut self,
        identifier: impl Into<Id>,
        span: Span,
        size: u64,
    ) -> (bool, usize) {
        let mut decl = Declaration::new(
            self.counters,
            DeclKind::Inport,
            identifier,
            span,
            ElementTag::None,
        );
        decl.size = size;
        self.unit.declarations.borrow_mut().insert(decl)
    }

    pub fn add_typedef(
        &mut self,
        identifier: impl Into<Id>,
        unique_name: impl Into<Id>,
        span: Span,
        file_path: impl Into<String>,
        data_type: DeclKind,
    ) -> (bool, usize) {
        let typedef = Typedef::new(
            self.counters,
            identifier,
            unique_name,
            span,
            file_path,
            data_type,
            ElementTag::None,
        );
        self.unit.typedefs.insert(typedef)
    }

    /// Create an action named `<prefix>_<n>` from the counter of its
    /// kind, increment the counter, and register the action.
    pub fn add_action(
        &mut self,
        prefix: &str,
        counter: CounterKind,
        span: Span,
    ) -> RRC<Action> {
        let number = self.counters.get(counter);
        self.counters.increment(counter);
        let mut action = Action::new(
            self.counters,
            format!("{prefix}_{number}"),
            span,
            ElementTag::Action,
        );
        action.set_description_name(format!("{prefix}_{number}"));
        self.unit.actions.borrow_mut().insert(action)
    }

    /// Register a structure; the handle points into the unit's
    /// collection.
    pub fn add_structure(
        &mut self,
        structure: Structure,
    ) -> Option<RRC<Structure>> {
        let id = structure.entity().identifier;
        let (inserted, _) = self.unit.structures.borrow_mut().insert(structure);
        if inserted {
            self.unit.structures.borrow().get(id)
        } else {
            None
        }
    }

    /// Register a task whose body is the structure named
    /// `structure_identifier`, when one exists.
    pub fn add_task(
        &mut self,
        identifier: impl Into<Id>,
        span: Span,
        namespace_level: Option<u32>,
        structure_identifier: Option<Id>,
    ) -> (bool, usize) {
        let mut task =
            Task::new(self.counters, identifier, span, namespace_level);
        if let Some(id) = structure_identifier {
            task.structure = self.unit.structures.borrow().get(id);
        }
        self.unit.tasks.borrow_mut().insert(task)
    }

    /// Add a top-level concurrent protocol and return its index.
    pub fn add_out_of_block(
        &mut self,
        identifier: impl Into<Id>,
        tag: ElementTag,
        params: ParamList,
    ) -> (bool, usize) {
        let protocol =
            Protocol::new(self.counters, identifier, Span::UNKNOWN, tag, params);
        self.unit.out_of_block_elements.borrow_mut().insert(protocol)
    }

    /// Append a call-style element to the out-of-block protocol at
    /// `index`. The element stays symbolic until link resolution.
    pub fn add_call_element(
        &mut self,
        index: usize,
        call: impl Into<Id>,
        tag: ElementTag,
    ) {
        let element =
            BodyElement::new(self.counters, call, tag, Related::None);
        let mut protocols = self.unit.out_of_block_elements.borrow_mut();
        let id = protocols.by_index(index).entity().identifier;
        if let Some(protocol) = protocols.get_mut(id) {
            protocol.add_body_element(element);
        }
    }

    pub fn add_value_param(
        &mut self,
        identifier: impl Into<Id>,
        span: Span,
        value: i64,
        expression: Option<String>,
    ) -> usize {
        let param =
            ValueParam::new(self.counters, identifier, span, value, expression);
        self.unit.value_params.borrow_mut().insert(param)
    }

    pub fn add_input_param(
        &mut self,
        identifier: impl Into<Id>,
        param_type: impl Into<String>,
        span: Span,
    ) -> (bool, usize) {
        let param =
            Param::new(self.counters, identifier, param_type, span, "");
        self.unit.input_params.insert(param)
    }
}
