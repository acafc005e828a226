//! Body elements, ordered body sequences, and named protocols.
use crate::{
    Action, ActionCollection, ElementTag, Entity, EntityCollection,
    EntityNode, ParamList, RRC,
};
use aplan_utils::{format, Counters, Id, Span};
use itertools::Itertools;

/// What a body element stands for once construction and linking are done.
/// Starts out `None` or `Symbolic`; link resolution rewrites call-style
/// elements to `Resolved`.
#[derive(Clone, Debug, Default)]
pub enum Related {
    #[default]
    None,
    /// A symbolically referenced entity whose rendered name substitutes
    /// for its identifier inside the element's own text.
    Symbolic(Entity),
    /// A nested block rendered in place of the element's own text.
    Nested(BodyElementSequence),
    /// A concrete action bound by link resolution.
    Resolved(RRC<Action>),
}

/// One statement or sub-block of a protocol body.
#[derive(Clone, Debug)]
pub struct BodyElement {
    entity: Entity,
    pub params: ParamList,
    pub related: Related,
}

impl BodyElement {
    pub fn new(
        counters: &mut Counters,
        identifier: impl Into<Id>,
        tag: ElementTag,
        related: Related,
    ) -> Self {
        BodyElement {
            entity: Entity::new(identifier, Span::UNKNOWN, tag, counters),
            params: ParamList::new(),
            related,
        }
    }
}

impl EntityNode for BodyElement {
    fn entity(&self) -> &Entity {
        &self.entity
    }
    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    fn render_name(&self) -> String {
        if self.params.is_empty() {
            self.entity.identifier.to_string()
        } else {
            format!("{}({})", self.entity.identifier, self.params)
        }
    }
}

/// An ordered sequence of body elements that renders to one control-flow
/// formula.
#[derive(Clone, Debug)]
pub struct BodyElementSequence {
    elements: Vec<BodyElement>,
    /// Tag of the sequence itself; a `Generate` sequence joins all of its
    /// elements concurrently.
    pub tag: ElementTag,
}

impl BodyElementSequence {
    pub fn new(tag: ElementTag) -> Self {
        BodyElementSequence {
            elements: Vec::new(),
            tag,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BodyElement> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, BodyElement> {
        self.elements.iter_mut()
    }

    pub fn by_index(&self, index: usize) -> &BodyElement {
        &self.elements[index]
    }

    pub fn push(&mut self, element: BodyElement) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    /// Render the sequence. `trailing_comma` appends a comma after the
    /// last element.
    ///
    /// At most one parenthesis group is pending at a time: the group an
    /// `IfConditionLeft` opens stays unclosed until its matching
    /// `IfConditionRight` arrives. Nested open conditionals at one
    /// rendering level are not constructible, so this is a single flag
    /// rather than a stack.
    pub fn render(&self, trailing_comma: bool) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut pending_group = false;

        for (index, element) in self.elements.iter().enumerate() {
            let prev = match index {
                0 => None,
                i => Some(&self.elements[i - 1]),
            };
            let mut needs_group = false;

            if let Some(prev) = prev {
                if self.tag == ElementTag::Generate {
                    parts.push(" || ".to_string());
                } else if element.entity.tag == ElementTag::Forever {
                    parts.push(";".to_string());
                } else if element.entity.tag == ElementTag::IfConditionRight
                    && prev.entity.tag == ElementTag::IfConditionLeft
                {
                    parts.push(" + ".to_string());
                } else if prev.entity.tag == ElementTag::Action
                    && (element.entity.tag == ElementTag::Action
                        || element.entity.tag == ElementTag::Protocol)
                {
                    parts.push(".".to_string());
                } else {
                    needs_group = true;
                    parts.push(";".to_string());
                }
            }

            let mut text = element.render_name();
            match &element.related {
                Related::None => {}
                Related::Symbolic(entity) => {
                    text = format::replace_whole_word(
                        &text,
                        entity.identifier.as_str(),
                        &entity.display_name(),
                    );
                }
                Related::Nested(sequence) => {
                    text = sequence.render(false);
                }
                Related::Resolved(action) => {
                    text = action.borrow().render_name(true, false);
                }
            }

            if element.entity.tag == ElementTag::Forever {
                parts.push(format!("{{{text}}}"));
            } else if !needs_group {
                parts.push(text);
            } else if element.entity.tag == ElementTag::IfConditionLeft {
                pending_group = true;
                parts.push(format!("({text}"));
            } else {
                parts.push(format!("({text})"));
            }

            if pending_group
                && element.entity.tag == ElementTag::IfConditionRight
            {
                parts.push(")".to_string());
                pending_group = false;
            }

            if index == self.elements.len() - 1 && trailing_comma {
                parts.push(",".to_string());
            }
        }
        parts.concat()
    }

    /// Bind call-style elements to the actions they name. Elements that
    /// are already resolved are left untouched, making the pass
    /// idempotent.
    pub fn resolve_links(&mut self, actions: &ActionCollection) {
        for element in &mut self.elements {
            if matches!(element.related, Related::Resolved(_)) {
                continue;
            }
            let Some(name) =
                format::extract_call_name(element.entity.identifier.as_str())
            else {
                continue;
            };
            if let Some(action) = actions.get(Id::new(&name)) {
                log::debug!(
                    "bound `{}` to action `{name}`",
                    element.entity.identifier
                );
                element.related = Related::Resolved(action);
            }
        }
    }

    /// Drop resolved bindings so a copied sequence can be re-linked
    /// against its own unit's actions.
    pub fn unresolve(&mut self) {
        for element in &mut self.elements {
            if matches!(element.related, Related::Resolved(_)) {
                element.related = Related::None;
            }
            if let Related::Nested(sequence) = &mut element.related {
                sequence.unresolve();
            }
        }
    }
}

/// A named, parameterized body sequence.
#[derive(Clone, Debug)]
pub struct Protocol {
    entity: Entity,
    pub params: ParamList,
    pub body: BodyElementSequence,
}

impl Protocol {
    pub fn new(
        counters: &mut Counters,
        identifier: impl Into<Id>,
        span: Span,
        tag: ElementTag,
        params: ParamList,
    ) -> Self {
        Protocol {
            entity: Entity::new(identifier, span, tag, counters),
            params,
            body: BodyElementSequence::new(ElementTag::None),
        }
    }

    pub fn add_body_element(&mut self, element: BodyElement) -> usize {
        self.body.push(element)
    }

    pub fn resolve_links(&mut self, actions: &ActionCollection) {
        self.body.resolve_links(actions);
    }

    /// A copy with resolved bindings dropped, for re-linking inside a
    /// copied unit.
    pub fn deep_copy(&self) -> Protocol {
        let mut copy = self.clone();
        copy.body.unresolve();
        copy
    }
}

impl EntityNode for Protocol {
    fn entity(&self) -> &Entity {
        &self.entity
    }
    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    fn render_name(&self) -> String {
        let mut name = self.entity.display_name();
        if !self.params.is_empty() {
            name = format!("{name}({})", self.params);
        }
        name
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.render_name(), self.body.render(true))
    }
}

/// The top-level concurrent protocols of a design unit.
pub type ProtocolCollection = EntityCollection<Protocol>;

impl ProtocolCollection {
    pub fn resolve_links(&mut self, actions: &ActionCollection) {
        for protocol in self.iter_mut() {
            protocol.resolve_links(actions);
        }
    }

    /// A copy with resolved bindings dropped.
    pub fn deep_copy(&self) -> Self {
        let mut copy = Self::new();
        for protocol in self.iter() {
            copy.insert(protocol.deep_copy());
        }
        copy
    }

    /// All protocol definitions, one per line, final trailing comma
    /// removed.
    pub fn render_all(&self) -> String {
        let joined = self.iter().map(|p| p.to_string()).join("\n");
        format::remove_trailing_comma(&joined).to_string()
    }
}
