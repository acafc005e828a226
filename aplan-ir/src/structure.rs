//! Structural blocks: procedural scopes that own a list of behaviors
//! (protocols or nested structures) and render to control-flow formulas.
use crate::{
    rrc, ActionCollection, BodyElement, ElementTag, Entity, EntityNode,
    ParamList, Protocol, RRC,
};
use aplan_utils::{CounterKind, Counters, Id, Span};
use itertools::Itertools;

/// Branch bookkeeping for a conditional block; consumed by the builder,
/// not by the renderer.
#[derive(Clone, Debug, Default)]
pub struct IfInfo {
    pub if_count: u32,
    pub else_count: u32,
    pub last_step: u32,
    pub step: u32,
}

impl IfInfo {
    pub fn set_cond_count(&mut self, if_count: u32, else_count: u32) {
        self.if_count = if_count;
        self.else_count = else_count;
        if self.else_count == self.if_count {
            self.last_step = if_count + 1;
        }
        self.step = 1;
    }
}

/// Case-item bookkeeping for a case block.
#[derive(Clone, Debug, Default)]
pub struct CaseInfo {
    pub expression: String,
    pub init_case_count: u32,
    pub case_count: u32,
}

impl CaseInfo {
    pub fn set_case_count(&mut self, count: u32) {
        self.init_case_count = count;
        self.case_count = count;
    }
}

/// The specialization of a structure.
#[derive(Clone, Debug, Default)]
pub enum StructureKind {
    #[default]
    Plain,
    Always {
        sensitivity: Option<String>,
    },
    If(IfInfo),
    Case(CaseInfo),
    Loop,
    Forever,
    While,
}

/// One behavior owned by a structure.
#[derive(Clone, Debug)]
pub enum Behavior {
    Protocol(Protocol),
    Structure(RRC<Structure>),
}

/// A structural block. Its display suffix is drawn from the structure
/// counter at construction, so every block in a run gets a distinct name.
#[derive(Clone, Debug)]
pub struct Structure {
    entity: Entity,
    pub kind: StructureKind,
    behavior: Vec<Behavior>,
    pub params: ParamList,
    /// Raw parameter text that overrides `params` in the rendered name.
    pub additional_params: Option<String>,
    /// Protocols added inside a task keep only their explicit parameters.
    pub inside_task: bool,
}

impl Structure {
    pub fn new(
        counters: &mut Counters,
        identifier: impl Into<Id>,
        span: Span,
        tag: ElementTag,
    ) -> Self {
        let mut entity = Entity::new(identifier, span, tag, counters);
        entity.suffix = Some(counters.get(CounterKind::Struct) as u32);
        counters.increment(CounterKind::Struct);
        Structure {
            entity,
            kind: StructureKind::Plain,
            behavior: Vec::new(),
            params: ParamList::new(),
            additional_params: None,
            inside_task: false,
        }
    }

    pub fn always(
        counters: &mut Counters,
        identifier: impl Into<Id>,
        sensitivity: Option<String>,
        span: Span,
    ) -> Self {
        let mut structure =
            Self::new(counters, identifier, span, ElementTag::None);
        structure.kind = StructureKind::Always { sensitivity };
        structure
    }

    pub fn if_stmt(
        counters: &mut Counters,
        identifier: impl Into<Id>,
        span: Span,
    ) -> Self {
        let mut structure =
            Self::new(counters, identifier, span, ElementTag::IfStatement);
        structure.kind = StructureKind::If(IfInfo::default());
        structure
    }

    pub fn case_stmt(
        counters: &mut Counters,
        identifier: impl Into<Id>,
        span: Span,
    ) -> Self {
        let mut structure =
            Self::new(counters, identifier, span, ElementTag::CaseStatement);
        structure.kind = StructureKind::Case(CaseInfo::default());
        structure
    }

    pub fn loop_stmt(
        counters: &mut Counters,
        identifier: impl Into<Id>,
        span: Span,
    ) -> Self {
        let mut structure =
            Self::new(counters, identifier, span, ElementTag::Loop);
        structure.kind = StructureKind::Loop;
        structure
    }

    pub fn forever_stmt(
        counters: &mut Counters,
        identifier: impl Into<Id>,
        span: Span,
    ) -> Self {
        let mut structure =
            Self::new(counters, identifier, span, ElementTag::Forever);
        structure.kind = StructureKind::Forever;
        structure
    }

    pub fn while_stmt(
        counters: &mut Counters,
        identifier: impl Into<Id>,
        span: Span,
    ) -> Self {
        let mut structure =
            Self::new(counters, identifier, span, ElementTag::While);
        structure.kind = StructureKind::While;
        structure
    }

    pub fn is_always(&self) -> bool {
        matches!(self.kind, StructureKind::Always { .. })
    }

    pub fn behavior(&self) -> &[Behavior] {
        &self.behavior
    }

    pub fn behavior_len(&self) -> usize {
        self.behavior.len()
    }

    pub fn last_behavior_index(&self) -> Option<usize> {
        self.behavior.len().checked_sub(1)
    }

    pub fn push_behavior(&mut self, behavior: Behavior) -> usize {
        self.behavior.push(behavior);
        self.behavior.len() - 1
    }

    pub fn insert_behavior(&mut self, index: usize, behavior: Behavior) {
        self.behavior.insert(index, behavior);
    }

    /// Create a protocol and append it to this structure's behavior. The
    /// protocol's parameters merge the structure's own with `params`,
    /// unless the structure sits inside a task, where only the explicit
    /// parameters survive.
    pub fn add_protocol(
        &mut self,
        counters: &mut Counters,
        identifier: impl Into<Id>,
        tag: ElementTag,
        params: Option<&ParamList>,
    ) -> usize {
        let mut protocol_params = ParamList::new();
        if !self.inside_task {
            protocol_params.extend(&self.params);
            if let Some(params) = params {
                protocol_params.extend(params);
            }
        } else if let Some(params) = params {
            protocol_params = params.clone();
        }
        let protocol = Protocol::new(
            counters,
            identifier,
            Span::UNKNOWN,
            tag,
            protocol_params,
        );
        self.push_behavior(Behavior::Protocol(protocol))
    }

    /// Append the opening protocol of this structure, named after the
    /// structure and the current value of `counter`.
    pub fn add_init_protocol(
        &mut self,
        counters: &mut Counters,
        counter: CounterKind,
    ) -> usize {
        let identifier =
            format!("{}_{}", self.entity.identifier, counters.get(counter));
        let params = self.params.clone();
        let tag = self.entity.tag;
        self.add_protocol(counters, identifier, tag, Some(&params))
    }

    /// Append a body element to the most recently added behavior.
    pub fn add_body_element(&mut self, element: BodyElement) {
        match self.behavior.last_mut() {
            Some(Behavior::Protocol(protocol)) => {
                protocol.add_body_element(element);
            }
            Some(Behavior::Structure(structure)) => {
                structure.borrow_mut().add_body_element(element);
            }
            None => {
                log::warn!(
                    "dropping body element for `{}`: structure has no behavior",
                    self.entity.identifier
                );
            }
        }
    }

    /// Rendered name: the numeric suffix appears only when non-zero, and
    /// raw parameter text overrides the structured list.
    pub fn render_name(&self, include_params: bool) -> String {
        let mut name = self.entity.identifier.to_string();
        if let Some(suffix) = self.entity.suffix.filter(|s| *s != 0) {
            name = format!("{name}_{suffix}");
        }
        if include_params {
            if let Some(additional) = &self.additional_params {
                name = format!("{name}({additional})");
            } else if !self.params.is_empty() {
                name = format!("{name}({})", self.params);
            }
        }
        name
    }

    /// The formula an always block contributes to the unit behavior:
    /// `Sensetive(<name>, <list>)` when a sensitivity list is present.
    pub fn sensitivity_formula(&self) -> String {
        match &self.kind {
            StructureKind::Always {
                sensitivity: Some(sensitivity),
            } => {
                format!("Sensetive({}, {sensitivity})", self.render_name(true))
            }
            _ => self.render_name(true),
        }
    }

    /// Cascade link resolution through every owned behavior.
    pub fn resolve_links(&mut self, actions: &ActionCollection) {
        for behavior in &mut self.behavior {
            match behavior {
                Behavior::Protocol(protocol) => {
                    protocol.resolve_links(actions)
                }
                Behavior::Structure(structure) => {
                    structure.borrow_mut().resolve_links(actions)
                }
            }
        }
    }

    /// A copy whose nested structures are independent and whose resolved
    /// bindings are dropped for re-linking.
    pub fn deep_copy(&self) -> Structure {
        let mut copy = self.clone();
        copy.behavior = self
            .behavior
            .iter()
            .map(|b| match b {
                Behavior::Protocol(protocol) => {
                    Behavior::Protocol(protocol.deep_copy())
                }
                Behavior::Structure(structure) => Behavior::Structure(rrc(
                    structure.borrow().deep_copy(),
                )),
            })
            .collect();
        copy
    }
}

impl EntityNode for Structure {
    fn entity(&self) -> &Entity {
        &self.entity
    }
    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    fn render_name(&self) -> String {
        Structure::render_name(self, true)
    }
}

impl std::fmt::Display for Structure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .behavior
            .iter()
            .map(|b| match b {
                Behavior::Protocol(protocol) => protocol.to_string(),
                Behavior::Structure(structure) => {
                    structure.borrow().to_string()
                }
            })
            .join("\n");
        write!(f, "{}", rendered.trim())
    }
}

/// The structures of one design unit, unique by identifier.
#[derive(Clone, Debug, Default)]
pub struct StructureCollection {
    elements: Vec<RRC<Structure>>,
}

impl StructureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RRC<Structure>> {
        self.elements.iter()
    }

    /// Insert `structure`, rejecting duplicate identifiers.
    pub fn insert(&mut self, structure: Structure) -> (bool, usize) {
        let id = structure.entity.identifier;
        if let Some(index) = self.index_of(id) {
            log::warn!("duplicate structure `{id}` rejected");
            return (false, index);
        }
        self.elements.push(rrc(structure));
        (true, self.elements.len() - 1)
    }

    pub fn get(&self, identifier: Id) -> Option<RRC<Structure>> {
        self.elements
            .iter()
            .find(|s| s.borrow().entity.identifier == identifier)
            .cloned()
    }

    pub fn index_of(&self, identifier: Id) -> Option<usize> {
        self.elements
            .iter()
            .position(|s| s.borrow().entity.identifier == identifier)
    }

    pub fn by_index(&self, index: usize) -> RRC<Structure> {
        self.elements[index].clone()
    }

    pub fn last(&self) -> Option<RRC<Structure>> {
        self.elements.last().cloned()
    }

    /// Always blocks with a non-empty behavior.
    pub fn always_list(&self) -> Vec<RRC<Structure>> {
        self.elements
            .iter()
            .filter(|s| {
                let s = s.borrow();
                s.is_always() && !s.behavior.is_empty()
            })
            .cloned()
            .collect()
    }

    /// Structures that are neither always blocks nor task bodies, with a
    /// non-empty behavior.
    pub fn plain_structures(&self) -> Vec<RRC<Structure>> {
        self.elements
            .iter()
            .filter(|s| {
                let s = s.borrow();
                !s.is_always()
                    && s.entity.tag != ElementTag::Task
                    && !s.behavior.is_empty()
            })
            .cloned()
            .collect()
    }

    pub fn resolve_links(&mut self, actions: &ActionCollection) {
        for structure in &self.elements {
            structure.borrow_mut().resolve_links(actions);
        }
    }

    /// Structures admitted by `filter`; the filtered elements stay
    /// shared, an empty filter yields an independent copy.
    pub fn filter(&self, filter: &crate::Filter) -> Self {
        if filter.is_empty() {
            return self.deep_copy();
        }
        StructureCollection {
            elements: self
                .elements
                .iter()
                .filter(|s| filter.admits(&*s.borrow()))
                .cloned()
                .collect(),
        }
    }

    pub fn deep_copy(&self) -> Self {
        StructureCollection {
            elements: self
                .elements
                .iter()
                .map(|s| rrc(s.borrow().deep_copy()))
                .collect(),
        }
    }

    /// Every structure's protocol definitions, newline-joined.
    pub fn render_all(&self) -> String {
        self.elements
            .iter()
            .map(|s| s.borrow().to_string())
            .join("\n")
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_structure_renders_without_suffix() {
        let mut counters = Counters::new();
        let first =
            Structure::new(&mut counters, "always_comb", Span::UNKNOWN, ElementTag::None);
        let second =
            Structure::new(&mut counters, "always_ff", Span::UNKNOWN, ElementTag::None);
        // The structure counter starts at zero and a zero suffix is
        // suppressed in the rendered name.
        assert_eq!(first.render_name(true), "always_comb");
        assert_eq!(second.render_name(true), "always_ff_1");
    }

    #[test]
    fn sensitivity_formula_wraps_name() {
        let mut counters = Counters::new();
        let plain = Structure::always(
            &mut counters,
            "proc",
            None,
            Span::UNKNOWN,
        );
        assert_eq!(plain.sensitivity_formula(), "proc");
        let clocked = Structure::always(
            &mut counters,
            "proc",
            Some("posedge_clk".to_string()),
            Span::UNKNOWN,
        );
        assert_eq!(
            clocked.sensitivity_formula(),
            "Sensetive(proc_1, posedge_clk)"
        );
    }

    #[test]
    fn add_protocol_merges_parameters_unless_inside_task() {
        let mut counters = Counters::new();
        let mut structure =
            Structure::new(&mut counters, "blk", Span::UNKNOWN, ElementTag::None);
        structure.params.insert(crate::Param::new(
            &mut counters,
            "clk",
            "Bits 1",
            Span::UNKNOWN,
            "",
        ));
        let mut extra = ParamList::new();
        extra.insert(crate::Param::new(
            &mut counters,
            "x",
            "int",
            Span::UNKNOWN,
            "",
        ));
        structure.add_protocol(
            &mut counters,
            "blk_1",
            ElementTag::Protocol,
            Some(&extra),
        );
        let Behavior::Protocol(protocol) = &structure.behavior()[0] else {
            panic!("expected a protocol behavior");
        };
        assert_eq!(protocol.params.len(), 2);

        structure.inside_task = true;
        structure.add_protocol(
            &mut counters,
            "blk_2",
            ElementTag::Protocol,
            Some(&extra),
        );
        let Behavior::Protocol(protocol) = &structure.behavior()[1] else {
            panic!("expected a protocol behavior");
        };
        assert_eq!(protocol.params.len(), 1);
    }

    #[test]
    fn structure_lists_split_by_kind() {
        let mut counters = Counters::new();
        let mut structures = StructureCollection::new();

        let mut always = Structure::always(
            &mut counters,
            "ff",
            Some("clk".to_string()),
            Span::UNKNOWN,
        );
        always.add_protocol(&mut counters, "ff_0", ElementTag::Protocol, None);
        structures.insert(always);

        let mut task_body =
            Structure::new(&mut counters, "do_send", Span::UNKNOWN, ElementTag::Task);
        task_body.add_protocol(
            &mut counters,
            "do_send_0",
            ElementTag::Protocol,
            None,
        );
        structures.insert(task_body);

        let mut plain =
            Structure::new(&mut counters, "init_blk", Span::UNKNOWN, ElementTag::None);
        plain.add_protocol(
            &mut counters,
            "init_blk_0",
            ElementTag::Protocol,
            None,
        );
        structures.insert(plain);

        // An empty structure shows up in neither list.
        structures.insert(Structure::new(
            &mut counters,
            "empty",
            Span::UNKNOWN,
            ElementTag::None,
        ));

        assert_eq!(structures.always_list().len(), 1);
        let plain_names: Vec<_> = structures
            .plain_structures()
            .iter()
            .map(|s| s.borrow().entity().identifier.to_string())
            .collect();
        assert_eq!(plain_names, vec!["init_blk"]);
    }

    #[test]
    fn conditional_bookkeeping() {
        let mut info = IfInfo::default();
        info.set_cond_count(2, 2);
        assert_eq!(info.last_step, 3);
        assert_eq!(info.step, 1);

        let mut case = CaseInfo::default();
        case.set_case_count(4);
        assert_eq!(case.init_case_count, 4);
        assert_eq!(case.case_count, 4);
    }

    #[test]
    fn duplicate_structures_are_rejected() {
        let mut counters = Counters::new();
        let mut structures = StructureCollection::new();
        assert!(structures
            .insert(Structure::new(
                &mut counters,
                "blk",
                Span::UNKNOWN,
                ElementTag::None
            ))
            .0);
        let (inserted, index) = structures.insert(Structure::new(
            &mut counters,
            "blk",
            Span::UNKNOWN,
            ElementTag::None,
        ));
        assert!(!inserted);
        assert_eq!(index, 0);
    }
}
