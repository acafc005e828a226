//! Per-compilation-unit aggregation and the unit behavior formula.
use crate::{
    rrc, Action, ActionCollection, DeclarationCollection, ElementTag, Entity,
    EntityNode, ParamList, Protocol, ProtocolCollection, Structure,
    StructureCollection, TaskCollection, Typedef, TypedefCollection,
    ValueParamCollection, RRC,
};
use aplan_utils::{format, CounterKind, Counters, Id, Span};
use itertools::Itertools;

/// One top-level compilation scope: a module, class, package, or object.
///
/// The identifier is upper-cased at construction; `unique_name` tells
/// instances of the same unit apart. The collections a template copy
/// shares with its original are reference-counted; `copy` duplicates
/// them, `copy_part` aliases them.
#[derive(Debug)]
pub struct DesignUnit {
    entity: Entity,
    pub unique_name: Id,
    unique_name_upper: Id,
    pub declarations: RRC<DeclarationCollection>,
    pub typedefs: TypedefCollection,
    pub actions: RRC<ActionCollection>,
    pub structures: RRC<StructureCollection>,
    /// Top-level concurrent protocols, outside any procedural block.
    pub out_of_block_elements: RRC<ProtocolCollection>,
    pub value_params: RRC<ValueParamCollection>,
    pub input_params: ParamList,
    pub tasks: RRC<TaskCollection>,
    pub nested_units: RRC<DesignUnitCollection>,
}

/// One result of a heterogeneous identifier search across a unit.
#[derive(Clone, Debug)]
pub enum UnitItem {
    Typedef(Typedef),
    Declaration(crate::Declaration),
    DeclarationAction(RRC<Action>),
    Task(crate::Task),
    TaskStructure(RRC<Structure>),
    ValueParam(crate::ValueParam),
}

impl DesignUnit {
    pub fn new(
        counters: &mut Counters,
        identifier: impl AsRef<str>,
        span: Span,
        unique_name: impl Into<Id>,
        tag: ElementTag,
    ) -> Self {
        let mut entity = Entity::new(
            identifier.as_ref().to_uppercase(),
            span,
            tag,
            counters,
        );
        entity.suffix = Some(counters.get(CounterKind::Struct) as u32);
        counters.increment(CounterKind::Struct);
        let unique_name = unique_name.into();
        DesignUnit {
            entity,
            unique_name,
            unique_name_upper: unique_name.to_uppercase(),
            declarations: rrc(DeclarationCollection::new()),
            typedefs: TypedefCollection::new(),
            actions: rrc(ActionCollection::new()),
            structures: rrc(StructureCollection::new()),
            out_of_block_elements: rrc(ProtocolCollection::new()),
            value_params: rrc(ValueParamCollection::new()),
            input_params: ParamList::new(),
            tasks: rrc(TaskCollection::new()),
            nested_units: rrc(DesignUnitCollection::new()),
        }
    }

    pub fn identifier(&self) -> Id {
        self.entity.identifier
    }

    pub fn tag(&self) -> ElementTag {
        self.entity.tag
    }

    pub fn sequence(&self) -> u64 {
        self.entity.sequence
    }

    pub fn unique_name_upper(&self) -> Id {
        self.unique_name_upper
    }

    pub fn has_out_of_block_elements(&self) -> bool {
        !self.out_of_block_elements.borrow().is_empty()
    }

    /// The unit's formal parameter tuple, or nothing.
    pub fn input_params_formula(&self) -> String {
        if self.input_params.is_empty() {
            String::new()
        } else {
            format!("({})", self.input_params)
        }
    }

    /// Rewrite every declared identifier in `input` to an agent
    /// attribute access. Class units address their state through an
    /// object pointer; other units through their unique name.
    pub fn qualify_names(
        &self,
        input: &str,
        packages: &[&DesignUnit],
    ) -> String {
        let prefix = if self.entity.tag == ElementTag::Class {
            "object_pointer".to_string()
        } else {
            self.unique_name.to_string()
        };
        let mut result = input.to_string();
        for decl in self.declarations.borrow().iter() {
            result = format::replace_whole_word(
                &result,
                decl.entity().identifier.as_str(),
                &format!("{prefix}.{}", decl.entity().display_name()),
            );
        }
        for package in packages {
            let package_prefix = if self.entity.tag == ElementTag::Class {
                "object_pointer".to_string()
            } else {
                package.unique_name.to_string()
            };
            for decl in package.declarations.borrow().iter() {
                result = format::replace_whole_word(
                    &result,
                    decl.entity().identifier.as_str(),
                    &format!(
                        "{package_prefix}.{}",
                        decl.entity().identifier
                    ),
                );
            }
        }
        result
    }

    /// Everything named `identifier` across the unit's registries,
    /// together with the elements hanging off each hit.
    pub fn find_by_identifier(&self, identifier: Id) -> Vec<UnitItem> {
        let mut result = Vec::new();
        for typedef in self.typedefs.iter() {
            if typedef.entity().identifier == identifier {
                result.push(UnitItem::Typedef(typedef.clone()));
            }
        }
        for decl in self.declarations.borrow().iter() {
            if decl.entity().identifier == identifier {
                result.push(UnitItem::Declaration(decl.clone()));
                if decl.data_type != crate::DeclKind::EnumType
                    && !decl.expression.is_empty()
                {
                    if let Some(action) = &decl.action {
                        result.push(UnitItem::DeclarationAction(
                            action.clone(),
                        ));
                    }
                }
            }
        }
        for task in self.tasks.borrow().iter() {
            if task.entity().identifier == identifier {
                result.push(UnitItem::Task(task.clone()));
                if let Some(structure) = &task.structure {
                    result
                        .push(UnitItem::TaskStructure(structure.clone()));
                }
            }
        }
        for param in self.value_params.borrow().iter() {
            if param.entity().identifier == identifier {
                result.push(UnitItem::ValueParam(param.clone()));
            }
        }
        result
    }

    /// Bind every call-style body element in this unit to its action.
    /// Runs after all of the unit's actions exist; re-running is a
    /// no-op for elements already bound.
    pub fn resolve_links(&self) {
        let actions = self.actions.borrow();
        self.structures.borrow_mut().resolve_links(&actions);
        self.out_of_block_elements
            .borrow_mut()
            .resolve_links(&actions);
        drop(actions);
        for unit in self.nested_units.borrow().iter() {
            unit.resolve_links();
        }
    }

    /// Assemble the unit's top-level behavior formula: the MAIN, ALWAYS,
    /// STRUCT, and INIT parts, orchestrated into `B_<UNIT>` with the
    /// parts joined in INIT, STRUCT, ALWAYS, MAIN order.
    pub fn render_behavior(&self) -> String {
        let params = self.input_params_formula();

        // MAIN: the out-of-block elements in creation order.
        let protocols = self.out_of_block_elements.borrow();
        let mut elements: Vec<&Protocol> = protocols.iter().collect();
        elements.sort_by_key(|p| p.entity().sequence);
        let mut main_body = String::new();
        for (index, element) in elements.iter().enumerate() {
            if index > 0 {
                if element.entity().tag == ElementTag::ModuleCall {
                    main_body.push(';');
                } else {
                    main_body.push_str(" || ");
                }
                let prev = elements[index - 1];
                if prev.entity().tag == ElementTag::AssignOutOfBlock
                    && Self::is_module_side(element.entity().tag)
                {
                    main_body.push('(');
                }
            }
            main_body.push_str(&element.render_name());
            if let Some(next) = elements.get(index + 1) {
                if next.entity().tag == ElementTag::AssignOutOfBlock
                    && Self::is_module_side(element.entity().tag)
                {
                    main_body.push(')');
                }
            }
        }
        let (main_line, main_name) = if main_body.is_empty() {
            (None, None)
        } else {
            let name =
                format!("MAIN_{}{}", self.unique_name_upper, params);
            (Some(format!("{name} = ({main_body})")), Some(name))
        };

        // ALWAYS: sensitivity formulas of the non-empty always blocks.
        let always_body = self
            .structures
            .borrow()
            .always_list()
            .iter()
            .map(|s| s.borrow().sensitivity_formula())
            .join(" || ");

        // STRUCT: the remaining non-task structures, by name.
        let struct_body = self
            .structures
            .borrow()
            .plain_structures()
            .iter()
            .map(|s| s.borrow().render_name(true))
            .join(" || ");

        // INIT: initializer expressions in creation order.
        let declarations = self.declarations.borrow();
        let mut initialized = declarations.with_expressions();
        initialized.sort_by_key(|d| d.entity().sequence);
        let init_body =
            initialized.iter().map(|d| d.expression.as_str()).join(".");
        let (init_line, init_name) = if init_body.is_empty() {
            (None, None)
        } else {
            let name =
                format!("INIT_{}{}", self.unique_name_upper, params);
            (Some(format!("{name} = {init_body}")), Some(name))
        };

        // Orchestration: whichever parts exist, strictly in INIT,
        // STRUCT, ALWAYS, MAIN order.
        let mut b_parts: Vec<String> = Vec::new();
        if let Some(name) = init_name {
            b_parts.push(name);
        }
        if !struct_body.is_empty() {
            b_parts.push(struct_body);
        }
        if !always_body.is_empty() {
            b_parts.push(always_body);
        }
        if let Some(name) = main_name {
            b_parts.push(name);
        }
        let b_body = b_parts.join(" || ");

        let mut lines: Vec<String> = Vec::new();
        if !b_body.is_empty() {
            lines.push(format!(
                "B_{}{} = {{{b_body}}},",
                self.unique_name_upper, params
            ));
        }
        if let Some(line) = init_line {
            lines.push(format!("{line},"));
        }
        if let Some(line) = main_line {
            lines.push(format!("{line},"));
        }
        let joined = lines.join("\n");
        format::remove_trailing_comma(joined.trim()).to_string()
    }

    fn is_module_side(tag: ElementTag) -> bool {
        tag == ElementTag::ModuleCall || tag == ElementTag::ModuleAssign
    }

    /// A fully independent copy. Every child collection is duplicated
    /// and link resolution re-runs so resolved references point at the
    /// copy's own actions, and task bodies at the copy's own structures.
    pub fn copy(&self) -> DesignUnit {
        let unit = DesignUnit {
            entity: self.entity.clone(),
            unique_name: self.unique_name,
            unique_name_upper: self.unique_name_upper,
            declarations: rrc(self.declarations.borrow().deep_copy()),
            typedefs: self.typedefs.clone(),
            actions: rrc(self.actions.borrow().deep_copy()),
            structures: rrc(self.structures.borrow().deep_copy()),
            out_of_block_elements: rrc(
                self.out_of_block_elements.borrow().deep_copy(),
            ),
            value_params: rrc(self.value_params.borrow().clone()),
            input_params: self.input_params.clone(),
            tasks: rrc(self.tasks.borrow().clone()),
            nested_units: rrc(self.nested_units.borrow().deep_copy()),
        };
        {
            // Task bodies must alias the copied structures, not the
            // originals.
            let structures = unit.structures.borrow();
            let mut tasks = unit.tasks.borrow_mut();
            for task in tasks.iter_mut() {
                if let Some(structure) = &task.structure {
                    let id = structure.borrow().entity().identifier;
                    task.structure = structures.get(id);
                }
            }
        }
        unit.resolve_links();
        unit
    }

    /// The template copy: child collections are shared with the
    /// original. Mutating a shared collection through either unit is
    /// visible through both; callers own that hazard.
    pub fn copy_part(&self) -> DesignUnit {
        DesignUnit {
            entity: self.entity.clone(),
            unique_name: self.unique_name,
            unique_name_upper: self.unique_name_upper,
            declarations: self.declarations.clone(),
            typedefs: self.typedefs.clone(),
            actions: self.actions.clone(),
            structures: self.structures.clone(),
            out_of_block_elements: self.out_of_block_elements.clone(),
            value_params: self.value_params.clone(),
            input_params: self.input_params.clone(),
            tasks: self.tasks.clone(),
            nested_units: self.nested_units.clone(),
        }
    }
}

/// The design units of a translation run, unique by `unique_name`.
#[derive(Debug, Default)]
pub struct DesignUnitCollection {
    elements: Vec<DesignUnit>,
}

impl DesignUnitCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DesignUnit> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, DesignUnit> {
        self.elements.iter_mut()
    }

    /// Units whose tag differs from `tag`, in insertion order.
    pub fn iter_excluding(
        &self,
        tag: ElementTag,
    ) -> impl Iterator<Item = &DesignUnit> {
        self.elements.iter().filter(move |u| u.entity.tag != tag)
    }

    pub fn insert(&mut self, unit: DesignUnit) -> (bool, usize) {
        if let Some(index) = self
            .elements
            .iter()
            .position(|u| u.unique_name == unit.unique_name)
        {
            log::warn!(
                "duplicate design unit `{}` rejected",
                unit.unique_name
            );
            return (false, index);
        }
        self.elements.push(unit);
        (true, self.elements.len() - 1)
    }

    pub fn by_index(&self, index: usize) -> &DesignUnit {
        &self.elements[index]
    }

    pub fn by_index_mut(&mut self, index: usize) -> &mut DesignUnit {
        &mut self.elements[index]
    }

    pub fn find_by_unique_name(&self, name: Id) -> Option<&DesignUnit> {
        self.elements.iter().find(|u| u.unique_name == name)
    }

    pub fn deep_copy(&self) -> Self {
        DesignUnitCollection {
            elements: self.elements.iter().map(|u| u.copy()).collect(),
        }
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeclKind, Declaration};

    fn unit(counters: &mut Counters, name: &str, uniq: &str) -> DesignUnit {
        DesignUnit::new(
            counters,
            name,
            Span::UNKNOWN,
            uniq,
            ElementTag::Module,
        )
    }

    fn out_of_block(
        unit: &DesignUnit,
        counters: &mut Counters,
        name: &str,
        tag: ElementTag,
    ) {
        let protocol = Protocol::new(
            counters,
            name,
            Span::UNKNOWN,
            tag,
            ParamList::new(),
        );
        unit.out_of_block_elements.borrow_mut().insert(protocol);
    }

    #[test]
    fn identifier_is_upper_cased() {
        let mut counters = Counters::new();
        let unit = unit(&mut counters, "fifo_ctrl", "fifo_ctrl_0");
        assert_eq!(unit.identifier(), "FIFO_CTRL");
        assert_eq!(unit.unique_name, "fifo_ctrl_0");
        assert_eq!(unit.unique_name_upper(), "FIFO_CTRL_0");
    }

    #[test]
    fn behavior_with_only_main_has_no_leading_join() {
        let mut counters = Counters::new();
        let u = unit(&mut counters, "top", "top");
        out_of_block(&u, &mut counters, "assign_1", ElementTag::AssignOutOfBlock);
        let rendered = u.render_behavior();
        let mut lines = rendered.lines();
        assert_eq!(lines.next().unwrap(), "B_TOP = {MAIN_TOP},");
        assert_eq!(lines.next().unwrap(), "MAIN_TOP = (assign_1)");
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn behavior_parts_join_in_init_struct_always_main_order() {
        let mut counters = Counters::new();
        let u = unit(&mut counters, "top", "top");
        out_of_block(&u, &mut counters, "call_1", ElementTag::ModuleCall);

        let mut init_decl = Declaration::new(
            &mut counters,
            DeclKind::Reg,
            "cnt",
            Span::new(1, 4),
            ElementTag::None,
        );
        init_decl.expression = "cnt = 0".to_string();
        u.declarations.borrow_mut().insert(init_decl);

        let mut always = Structure::always(
            &mut counters,
            "ff",
            Some("clk".to_string()),
            Span::UNKNOWN,
        );
        always.add_protocol(
            &mut counters,
            "ff_b",
            ElementTag::Protocol,
            None,
        );
        u.structures.borrow_mut().insert(always);

        let mut plain = Structure::new(
            &mut counters,
            "gen_blk",
            Span::UNKNOWN,
            ElementTag::None,
        );
        plain.add_protocol(
            &mut counters,
            "gen_b",
            ElementTag::Protocol,
            None,
        );
        u.structures.borrow_mut().insert(plain);

        let rendered = u.render_behavior();
        let first_line = rendered.lines().next().unwrap();
        let ff_name = {
            let structures = u.structures.borrow();
            let always = structures.get(aplan_utils::Id::new("ff")).unwrap();
            let name = always.borrow().render_name(true);
            name
        };
        let gen_name = {
            let structures = u.structures.borrow();
            let plain =
                structures.get(aplan_utils::Id::new("gen_blk")).unwrap();
            let name = plain.borrow().render_name(true);
            name
        };
        assert_eq!(
            first_line,
            format!(
                "B_TOP = {{INIT_TOP || {gen_name} || Sensetive({ff_name}, clk) || MAIN_TOP}},"
            )
        );
        assert!(rendered.contains("INIT_TOP = cnt = 0,"));
        assert!(rendered.ends_with("MAIN_TOP = (call_1)"));
    }

    #[test]
    fn main_section_orders_by_sequence_and_separators() {
        let mut counters = Counters::new();
        let u = unit(&mut counters, "top", "top");
        out_of_block(&u, &mut counters, "assign_a", ElementTag::AssignOutOfBlock);
        out_of_block(&u, &mut counters, "u1_call", ElementTag::ModuleCall);
        out_of_block(&u, &mut counters, "assign_b", ElementTag::AssignOutOfBlock);
        let rendered = u.render_behavior();
        // A module call after an out-of-block assignment is parenthesized
        // and separated with a semicolon; the assignment after it joins
        // concurrently again.
        assert!(rendered.contains("MAIN_TOP = (assign_a;(u1_call) || assign_b)"));
    }

    #[test]
    fn qualified_names_use_the_unit_prefix() {
        let mut counters = Counters::new();
        let u = unit(&mut counters, "top", "top_inst");
        let mut decl = Declaration::new(
            &mut counters,
            DeclKind::Reg,
            "cnt",
            Span::new(1, 4),
            ElementTag::None,
        );
        decl.set_namespace_level(Some(1));
        u.declarations.borrow_mut().insert(decl);
        assert_eq!(
            u.qualify_names("cnt + cnt_total", &[]),
            "top_inst.cnt_1 + cnt_total"
        );
    }

    #[test]
    fn identifier_search_spans_the_registries() {
        let mut counters = Counters::new();
        let u = unit(&mut counters, "top", "top");
        u.declarations.borrow_mut().insert(Declaration::new(
            &mut counters,
            DeclKind::Wire,
            "data",
            Span::new(1, 4),
            ElementTag::None,
        ));
        u.value_params.borrow_mut().insert(crate::ValueParam::new(
            &mut counters,
            "data",
            Span::new(9, 12),
            4,
            None,
        ));
        let hits = u.find_by_identifier(aplan_utils::Id::new("data"));
        assert_eq!(hits.len(), 2);
        assert!(matches!(hits[0], UnitItem::Declaration(_)));
        assert!(matches!(hits[1], UnitItem::ValueParam(_)));
    }

    #[test]
    fn deep_copy_is_independent() {
        let mut counters = Counters::new();
        let u = unit(&mut counters, "top", "top");
        u.declarations.borrow_mut().insert(Declaration::new(
            &mut counters,
            DeclKind::Wire,
            "data",
            Span::new(1, 4),
            ElementTag::None,
        ));
        let copied = u.copy();
        copied.declarations.borrow_mut().insert(Declaration::new(
            &mut counters,
            DeclKind::Wire,
            "extra",
            Span::new(9, 14),
            ElementTag::None,
        ));
        assert_eq!(u.declarations.borrow().len(), 1);
        assert_eq!(copied.declarations.borrow().len(), 2);
    }

    #[test]
    fn copy_part_aliases_children() {
        let mut counters = Counters::new();
        let u = unit(&mut counters, "top", "top");
        let partial = u.copy_part();
        partial.declarations.borrow_mut().insert(Declaration::new(
            &mut counters,
            DeclKind::Wire,
            "data",
            Span::new(1, 4),
            ElementTag::None,
        ));
        // The declaration registry is the same object in both units.
        assert_eq!(u.declarations.borrow().len(), 1);
        assert!(std::rc::Rc::ptr_eq(&u.declarations, &partial.declarations));
    }

    #[test]
    fn copied_unit_rebinds_resolved_references() {
        let mut counters = Counters::new();
        let u = unit(&mut counters, "top", "top");
        let mut action = Action::new(
            &mut counters,
            "send",
            Span::UNKNOWN,
            ElementTag::Action,
        );
        action.set_description_name("send");
        u.actions.borrow_mut().insert(action);

        let mut protocol = Protocol::new(
            &mut counters,
            "loop_0",
            Span::UNKNOWN,
            ElementTag::Protocol,
            ParamList::new(),
        );
        protocol.add_body_element(crate::BodyElement::new(
            &mut counters,
            "send(x)",
            ElementTag::Action,
            crate::Related::None,
        ));
        u.out_of_block_elements.borrow_mut().insert(protocol);
        u.resolve_links();

        let copied = u.copy();
        let copied_protocols = copied.out_of_block_elements.borrow();
        let element = copied_protocols.by_index(0).body.by_index(0);
        let crate::Related::Resolved(action) = &element.related else {
            panic!("copied element lost its binding");
        };
        // The binding points at the copy's action, not the original's.
        let original_action =
            u.actions.borrow().get(aplan_utils::Id::new("send")).unwrap();
        assert!(!std::rc::Rc::ptr_eq(action, &original_action));
    }

    #[test]
    fn resolve_links_twice_keeps_rendering_stable() {
        let mut counters = Counters::new();
        let u = unit(&mut counters, "top", "top");
        let mut action = Action::new(
            &mut counters,
            "send",
            Span::UNKNOWN,
            ElementTag::Action,
        );
        action.set_description_name("send");
        u.actions.borrow_mut().insert(action);
        let mut protocol = Protocol::new(
            &mut counters,
            "loop_0",
            Span::UNKNOWN,
            ElementTag::Protocol,
            ParamList::new(),
        );
        protocol.add_body_element(crate::BodyElement::new(
            &mut counters,
            "send(x)",
            ElementTag::Action,
            crate::Related::None,
        ));
        u.out_of_block_elements.borrow_mut().insert(protocol);

        u.resolve_links();
        let once = u.out_of_block_elements.borrow().render_all();
        u.resolve_links();
        let twice = u.out_of_block_elements.borrow().render_all();
        assert_eq!(once, twice);
    }
}
