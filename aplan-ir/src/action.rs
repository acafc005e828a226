//! Guarded state transitions and their content-addressed registry.
use crate::{rrc, ElementTag, Entity, EntityNode, ParamList, TokenSequence, RRC};
use aplan_utils::{format, Counters, Id, Span};
use itertools::Itertools;
use std::cell::OnceCell;
use std::collections::HashSet;

/// Loose fragments of formula text collected for a postcondition.
#[derive(Clone, Debug, Default)]
pub struct ActionParts {
    pub body: Vec<String>,
}

impl ActionParts {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Display for ActionParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.body.iter().join("; "))
    }
}

/// A guarded state transition: precondition, postcondition, and a
/// human-readable description assembled from deduplicated fragments.
///
/// Two actions are equal when their rendered bodies are equal, which
/// makes the type content-addressed for deduplication. The rendered body
/// is cached; every mutating accessor drops the cache.
#[derive(Clone, Debug)]
pub struct Action {
    entity: Entity,
    precondition: TokenSequence,
    postcondition: TokenSequence,
    description_start: Vec<String>,
    description_action_name: String,
    description_end: Vec<String>,
    exist_params: ParamList,
    params: ParamList,
    rendered: OnceCell<String>,
}

impl Action {
    pub fn new(
        counters: &mut Counters,
        identifier: impl Into<Id>,
        span: Span,
        tag: ElementTag,
    ) -> Self {
        Action {
            entity: Entity::new(identifier, span, tag, counters),
            precondition: TokenSequence::new(ElementTag::Precondition),
            postcondition: TokenSequence::new(ElementTag::Postcondition),
            description_start: Vec::new(),
            description_action_name: String::new(),
            description_end: Vec::new(),
            exist_params: ParamList::new(),
            params: ParamList::new(),
            rendered: OnceCell::new(),
        }
    }

    pub fn precondition(&self) -> &TokenSequence {
        &self.precondition
    }

    pub fn precondition_mut(&mut self) -> &mut TokenSequence {
        self.rendered.take();
        &mut self.precondition
    }

    pub fn postcondition(&self) -> &TokenSequence {
        &self.postcondition
    }

    pub fn postcondition_mut(&mut self) -> &mut TokenSequence {
        self.rendered.take();
        &mut self.postcondition
    }

    pub fn params(&self) -> &ParamList {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParamList {
        self.rendered.take();
        &mut self.params
    }

    pub fn exist_params(&self) -> &ParamList {
        &self.exist_params
    }

    pub fn exist_params_mut(&mut self) -> &mut ParamList {
        self.rendered.take();
        &mut self.exist_params
    }

    pub fn set_description_name(&mut self, name: impl Into<String>) {
        self.rendered.take();
        self.description_action_name = name.into();
    }

    pub fn add_description_start(&mut self, fragment: impl Into<String>) {
        self.rendered.take();
        self.description_start.push(fragment.into());
    }

    pub fn add_description_end(&mut self, fragment: impl Into<String>) {
        self.rendered.take();
        self.description_end.push(fragment.into());
    }

    /// Adopt every parameter that the rendered precondition or
    /// postcondition references.
    pub fn bind_params_from_body(&mut self, params: &ParamList) {
        let pre = self.precondition.render();
        let post = self.postcondition.render();
        let adopted: Vec<_> = params
            .iter()
            .filter(|p| {
                let name = p.entity().identifier.as_str();
                format::contains_whole_word(&pre, name)
                    || format::contains_whole_word(&post, name)
            })
            .cloned()
            .collect();
        if adopted.is_empty() {
            return;
        }
        self.rendered.take();
        for param in adopted {
            self.params.insert(param);
        }
    }

    /// Name of the action as call sites render it. The numeric suffix
    /// only appears when non-zero.
    pub fn render_name(&self, include_params: bool, to_upper: bool) -> String {
        let mut name = if to_upper {
            self.entity.identifier.as_str().to_uppercase()
        } else {
            self.entity.identifier.to_string()
        };
        if let Some(suffix) = self.entity.suffix.filter(|s| *s != 0) {
            name = format!("{name}_{suffix}");
        }
        if include_params && !self.params.is_empty() {
            name = format!("{name}({})", self.params);
        }
        name
    }

    /// The rendered body of this action, cached after the first call.
    pub fn body(&self) -> &str {
        self.rendered.get_or_init(|| self.render_body())
    }

    fn description(&self) -> String {
        fn joined_unique(fragments: &[String]) -> String {
            let mut seen = HashSet::new();
            fragments
                .iter()
                .filter(|f| seen.insert(f.as_str()))
                .join("; ")
        }
        format!(
            "{}:action '{} ({})'",
            joined_unique(&self.description_start),
            self.description_action_name,
            joined_unique(&self.description_end),
        )
    }

    fn render_body(&self) -> String {
        let description = self.description();
        let precondition = self.precondition.render();
        let postcondition = self.postcondition.render();
        if !self.exist_params.is_empty() {
            format!(
                " = ( Exist ({}) (\n\t\t({})->\n\t\t(\"{};\")\n\t\t({})))",
                self.exist_params, precondition, description, postcondition,
            )
        } else if !self.params.is_empty() {
            format!(
                "({}) = (\n\t\t({})->\n\t\t(\"{};\")\n\t\t({}))",
                self.params, precondition, description, postcondition,
            )
        } else {
            format!(
                " = (\n\t\t({})->\n\t\t(\"{};\")\n\t\t({}))",
                precondition, description, postcondition,
            )
        }
    }
}

impl EntityNode for Action {
    fn entity(&self) -> &Entity {
        &self.entity
    }
    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }

    fn render_name(&self) -> String {
        Action::render_name(self, true, false)
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.body() == other.body()
    }
}

impl Eq for Action {}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{},", self.entity.identifier, self.body())
    }
}

/// The actions of one design unit. Identifiers are made unique by the
/// builder's counters, so insertion appends; content-level deduplication
/// goes through [ActionCollection::find_duplicate].
#[derive(Clone, Debug, Default)]
pub struct ActionCollection {
    elements: Vec<RRC<Action>>,
}

impl ActionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RRC<Action>> {
        self.elements.iter()
    }

    /// Append `action` and return a handle to it.
    pub fn insert(&mut self, action: Action) -> RRC<Action> {
        let handle = rrc(action);
        self.elements.push(handle.clone());
        handle
    }

    pub fn get(&self, identifier: Id) -> Option<RRC<Action>> {
        self.elements
            .iter()
            .find(|a| a.borrow().entity.identifier == identifier)
            .cloned()
    }

    /// The element whose rendered body equals `action`'s, together with
    /// its identifier and span.
    pub fn find_duplicate(
        &self,
        action: &Action,
    ) -> Option<(RRC<Action>, Id, Span)> {
        self.elements
            .iter()
            .find(|a| *a.borrow() == *action)
            .map(|a| {
                let (id, span) = {
                    let inner = a.borrow();
                    (inner.entity.identifier, inner.entity.span)
                };
                (a.clone(), id, span)
            })
    }

    pub fn by_span(&self, span: Span) -> Option<RRC<Action>> {
        self.elements
            .iter()
            .find(|a| a.borrow().entity.span == span)
            .cloned()
    }

    /// A new collection of the actions admitted by `filter`; an empty
    /// filter yields an independent copy of everything.
    pub fn filter(&self, filter: &crate::Filter) -> Self {
        if filter.is_empty() {
            return self.deep_copy();
        }
        ActionCollection {
            elements: self
                .elements
                .iter()
                .filter(|a| filter.admits(&*a.borrow()))
                .map(|a| rrc(a.borrow().clone()))
                .collect(),
        }
    }

    /// A copy whose actions are independent of the original's.
    pub fn deep_copy(&self) -> Self {
        ActionCollection {
            elements: self
                .elements
                .iter()
                .map(|a| rrc(a.borrow().clone()))
                .collect(),
        }
    }

    /// All actions, one per line, with the final trailing comma removed.
    pub fn render_all(&self) -> String {
        let joined =
            self.elements.iter().map(|a| a.borrow().to_string()).join("\n");
        format::remove_trailing_comma(&joined).to_string()
    }
}
