//! The identity kernel: every IR node carries an [Entity] header, and the
//! ordered, identifier-indexed containers are built on [EntityCollection].
use crate::ElementTag;
use aplan_utils::{Counters, Id, Span};

/// Common header of every IR node: an identifier, a globally unique
/// creation sequence, the source span the node was parsed from, a variant
/// tag, and an optional numeric suffix that participates in the display
/// name.
#[derive(Clone, Debug)]
pub struct Entity {
    pub identifier: Id,
    pub sequence: u64,
    pub span: Span,
    pub tag: ElementTag,
    pub suffix: Option<u32>,
}

impl Entity {
    /// Create a header, drawing the creation sequence from the per-run
    /// counter registry.
    pub fn new(
        identifier: impl Into<Id>,
        span: Span,
        tag: ElementTag,
        counters: &mut Counters,
    ) -> Self {
        Entity {
            identifier: identifier.into(),
            sequence: counters.next_sequence(),
            span,
            tag,
            suffix: None,
        }
    }

    /// The display name: `identifier` or `identifier_suffix`.
    pub fn display_name(&self) -> String {
        match self.suffix {
            Some(suffix) => format!("{}_{}", self.identifier, suffix),
            None => self.identifier.to_string(),
        }
    }
}

/// An IR node with an [Entity] header.
pub trait EntityNode: Clone {
    fn entity(&self) -> &Entity;
    fn entity_mut(&mut self) -> &mut Entity;

    /// Rendered name of the node; nodes with parameters or structural
    /// suffix rules override this.
    fn render_name(&self) -> String {
        self.entity().display_name()
    }
}

/// Filtering criteria for [EntityCollection::filter]. Exclusion criteria
/// are checked before inclusion criteria.
#[derive(Default, Clone)]
pub struct Filter {
    pub include_tag: Option<ElementTag>,
    pub exclude_tag: Option<ElementTag>,
    pub include_id: Option<Id>,
    pub exclude_id: Option<Id>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_tag(mut self, tag: ElementTag) -> Self {
        self.include_tag = Some(tag);
        self
    }

    pub fn exclude_tag(mut self, tag: ElementTag) -> Self {
        self.exclude_tag = Some(tag);
        self
    }

    pub fn include_id(mut self, id: impl Into<Id>) -> Self {
        self.include_id = Some(id.into());
        self
    }

    pub fn exclude_id(mut self, id: impl Into<Id>) -> Self {
        self.exclude_id = Some(id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.include_tag.is_none()
            && self.exclude_tag.is_none()
            && self.include_id.is_none()
            && self.exclude_id.is_none()
    }

    /// True when `node` survives this filter.
    pub fn admits<T: EntityNode>(&self, node: &T) -> bool {
        let entity = node.entity();
        if let Some(tag) = self.exclude_tag {
            if entity.tag == tag {
                return false;
            }
        }
        if let Some(id) = self.exclude_id {
            if entity.identifier == id {
                return false;
            }
        }
        if let Some(tag) = self.include_tag {
            if entity.tag != tag {
                return false;
            }
        }
        if let Some(id) = self.include_id {
            if entity.identifier != id {
                return false;
            }
        }
        true
    }
}

/// An ordered container of IR nodes, indexed by identifier. Inserting a
/// node whose identifier is already present is rejected and reports the
/// existing element instead.
#[derive(Clone, Debug)]
pub struct EntityCollection<T> {
    elements: Vec<T>,
}

impl<T: EntityNode> EntityCollection<T> {
    pub fn new() -> Self {
        EntityCollection { elements: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.elements.iter_mut()
    }

    /// Insert `element`, keeping identifiers unique: a duplicate insert
    /// returns `(false, existing_index)`, a fresh insert appends and
    /// returns `(true, new_index)`.
    pub fn insert(&mut self, element: T) -> (bool, usize) {
        if let Some(index) = self.index_of(element.entity().identifier) {
            log::warn!(
                "duplicate identifier `{}` rejected",
                element.entity().identifier
            );
            return (false, index);
        }
        self.elements.push(element);
        (true, self.elements.len() - 1)
    }

    pub fn get(&self, identifier: Id) -> Option<&T> {
        self.elements
            .iter()
            .find(|e| e.entity().identifier == identifier)
    }

    pub fn get_mut(&mut self, identifier: Id) -> Option<&mut T> {
        self.elements
            .iter_mut()
            .find(|e| e.entity().identifier == identifier)
    }

    pub fn index_of(&self, identifier: Id) -> Option<usize> {
        self.elements
            .iter()
            .position(|e| e.entity().identifier == identifier)
    }

    pub fn by_index(&self, index: usize) -> &T {
        &self.elements[index]
    }

    pub fn last(&self) -> Option<&T> {
        self.elements.last()
    }

    pub fn remove(&mut self, index: usize) -> T {
        self.elements.remove(index)
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// A new collection of the elements admitted by `filter`; an empty
    /// filter yields a copy of the whole collection.
    pub fn filter(&self, filter: &Filter) -> Self {
        if filter.is_empty() {
            return self.clone();
        }
        EntityCollection {
            elements: self
                .elements
                .iter()
                .filter(|e| filter.admits(*e))
                .cloned()
                .collect(),
        }
    }

    /// True when `span` lies within the span of an element already in the
    /// collection. Token streams use this to reject re-insertion of
    /// nested expression fragments.
    pub fn contains_span(&self, span: Span) -> bool {
        self.elements.iter().any(|e| e.entity().span.contains(span))
    }
}

impl<T: EntityNode> Default for EntityCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: EntityNode> IntoIterator for &'a EntityCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
