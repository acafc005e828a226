//! Named storage declarations and their registry.
use crate::{rrc, Action, ElementTag, Entity, EntityNode, Filter, RRC};
use aplan_utils::{format, Counters, Id, Span};

/// The storage kind of a declaration.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DeclKind {
    Wire,
    Int,
    Reg,
    Logic,
    String,
    Bit,
    Time,
    Real,
    Array,
    Inport,
    Outport,
    /// Instance of an enumerated type.
    Enum,
    /// Definition of an enumerated type.
    EnumType,
    Struct,
    StructType,
    Union,
    UnionType,
    Class,
    #[default]
    None,
}

impl DeclKind {
    /// Map a source type name onto a kind: built-in names first, then the
    /// unit's typedefs, then known design units (which type as classes).
    pub fn resolve<'a>(
        type_str: &str,
        typedefs: impl Iterator<Item = &'a crate::Typedef>,
        unit_names: impl Iterator<Item = Id>,
    ) -> DeclKind {
        match type_str {
            "int" => return DeclKind::Int,
            "real" => return DeclKind::Real,
            "time" => return DeclKind::Time,
            "reg" => return DeclKind::Reg,
            "logic" | "std_logic" => return DeclKind::Logic,
            "wire" => return DeclKind::Wire,
            "string" => return DeclKind::String,
            "bit" => return DeclKind::Bit,
            _ => {}
        }
        for typedef in typedefs {
            if typedef.entity().identifier == type_str {
                return match typedef.data_type {
                    DeclKind::EnumType => DeclKind::Enum,
                    DeclKind::StructType => DeclKind::Struct,
                    DeclKind::UnionType => DeclKind::Union,
                    _ => DeclKind::None,
                };
            }
        }
        for name in unit_names {
            if name == type_str {
                return DeclKind::Class;
            }
        }
        DeclKind::None
    }
}

/// Context the declaration's type string is projected in.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TypeContext {
    #[default]
    None,
    /// Member of a struct/union typedef; the projection is prefixed by
    /// the member identifier.
    StructMember,
    /// Parameter position; dimensioned bit vectors collapse to their
    /// element type.
    Parameter,
}

/// A single named storage or port declaration. The namespace level the
/// declaration was parsed at doubles as the numeric suffix of its display
/// name.
#[derive(Clone, Debug)]
pub struct Declaration {
    entity: Entity,
    pub data_type: DeclKind,
    /// Initializer expression, already rendered to formula text.
    pub expression: String,
    pub size_expr: String,
    pub size: u64,
    pub dim_expr: String,
    pub dim_size: u64,
    /// The initialization action tied to this declaration, if any.
    pub action: Option<RRC<Action>>,
    /// Name of the owning struct when this declaration is a member.
    pub struct_owner: Option<Id>,
    pub file_path: String,
}

impl Declaration {
    pub fn new(
        counters: &mut Counters,
        data_type: DeclKind,
        identifier: impl Into<Id>,
        span: Span,
        tag: ElementTag,
    ) -> Self {
        Declaration {
            entity: Entity::new(identifier, span, tag, counters),
            data_type,
            expression: String::new(),
            size_expr: String::new(),
            size: 0,
            dim_expr: String::new(),
            dim_size: 0,
            action: None,
            struct_owner: None,
            file_path: String::new(),
        }
    }

    pub fn namespace_level(&self) -> Option<u32> {
        self.entity.suffix
    }

    pub fn set_namespace_level(&mut self, level: Option<u32>) {
        self.entity.suffix = level;
    }

    /// A copy whose associated action is independent of the original's.
    pub fn deep_copy(&self) -> Declaration {
        let mut copy = self.clone();
        copy.action = self.action.as_ref().map(|a| rrc(a.borrow().clone()));
        copy
    }

    /// Project this declaration onto its target-language type string.
    pub fn project_type(&self, context: TypeContext) -> String {
        let mut result = String::new();
        if context == TypeContext::StructMember {
            result.push_str(&format!("{}:", self.entity.identifier));
        }
        match self.data_type {
            DeclKind::Int => {
                if self.dim_size > 0 {
                    result.push_str("(int) -> int");
                } else {
                    result.push_str("int");
                }
            }
            DeclKind::Real => {
                if self.dim_size > 0 {
                    result.push_str("(float) -> float");
                } else {
                    result.push_str("float");
                }
            }
            DeclKind::Array => result.push_str(&self.size_expr),
            DeclKind::Inport
            | DeclKind::Outport
            | DeclKind::Wire
            | DeclKind::Reg
            | DeclKind::Logic
            | DeclKind::Bit => {
                if self.dim_size > 0 {
                    if context == TypeContext::Parameter {
                        result.push_str(&format!("Bits {}", self.size));
                    } else {
                        result.push_str(&format!(
                            "(Bits {}) -> Bits {}",
                            self.size, self.dim_size
                        ));
                    }
                } else if self.size > 0 {
                    result.push_str(&format!("Bits {}", self.size));
                } else {
                    result.push_str("bool");
                }
            }
            DeclKind::String => result.push_str("string"),
            DeclKind::Time => result.push_str("Bits 64"),
            // Instances of user-defined types project to the referenced
            // type name carried in the size expression.
            DeclKind::Class
            | DeclKind::Enum
            | DeclKind::Struct
            | DeclKind::Union => result.push_str(&self.size_expr),
            DeclKind::EnumType
            | DeclKind::StructType
            | DeclKind::UnionType
            | DeclKind::None => {}
        }
        result
    }
}

impl EntityNode for Declaration {
    fn entity(&self) -> &Entity {
        &self.entity
    }
    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

/// Filtering criteria for [DeclarationCollection::filter].
#[derive(Default, Clone)]
pub struct DeclFilter {
    pub base: Filter,
    pub file_path: Option<String>,
    pub include_kind: Option<DeclKind>,
    pub exclude_kind: Option<DeclKind>,
}

impl DeclFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_kind(mut self, kind: DeclKind) -> Self {
        self.include_kind = Some(kind);
        self
    }

    pub fn exclude_kind(mut self, kind: DeclKind) -> Self {
        self.exclude_kind = Some(kind);
        self
    }

    pub fn file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.base.is_empty()
            && self.file_path.is_none()
            && self.include_kind.is_none()
            && self.exclude_kind.is_none()
    }

    fn admits(&self, decl: &Declaration) -> bool {
        if let Some(kind) = self.exclude_kind {
            if decl.data_type == kind {
                return false;
            }
        }
        if !self.base.admits(decl) {
            return false;
        }
        if let Some(kind) = self.include_kind {
            if decl.data_type != kind {
                return false;
            }
        }
        if let Some(path) = &self.file_path {
            if decl.file_path != *path {
                return false;
            }
        }
        true
    }
}

/// The declaration registry of one design unit.
///
/// The collection is kept sorted by descending identifier length so the
/// whole-word substitutions below always try the longest names first.
/// Two declarations are duplicates iff they share an identifier or a
/// source span at the same namespace level.
#[derive(Clone, Debug, Default)]
pub struct DeclarationCollection {
    elements: Vec<Declaration>,
}

impl DeclarationCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Declaration> {
        self.elements.iter()
    }

    pub fn by_index(&self, index: usize) -> &Declaration {
        &self.elements[index]
    }

    pub fn get(&self, identifier: Id) -> Option<&Declaration> {
        self.elements
            .iter()
            .find(|e| e.entity.identifier == identifier)
    }

    pub fn index_of(&self, identifier: Id) -> Option<usize> {
        self.elements
            .iter()
            .position(|e| e.entity.identifier == identifier)
    }

    /// Insert `decl` unless a duplicate exists; sorted insertion keeps
    /// the descending-length invariant without a full re-sort.
    pub fn insert(&mut self, decl: Declaration) -> (bool, usize) {
        let duplicate = self.elements.iter().position(|e| {
            (e.entity.identifier == decl.entity.identifier
                || e.entity.span == decl.entity.span)
                && e.entity.suffix == decl.entity.suffix
        });
        if let Some(index) = duplicate {
            log::warn!(
                "duplicate declaration `{}` rejected",
                decl.entity.identifier
            );
            return (false, index);
        }
        let len = decl.entity.identifier.len();
        let index = self
            .elements
            .partition_point(|e| e.entity.identifier.len() >= len);
        self.elements.insert(index, decl);
        (true, index)
    }

    /// A deep copy: every declaration's associated action is duplicated.
    pub fn deep_copy(&self) -> Self {
        DeclarationCollection {
            elements: self.elements.iter().map(|e| e.deep_copy()).collect(),
        }
    }

    pub fn filter(&self, filter: &DeclFilter) -> Self {
        if filter.is_empty() {
            return self.deep_copy();
        }
        DeclarationCollection {
            elements: self
                .elements
                .iter()
                .filter(|e| filter.admits(e))
                .cloned()
                .collect(),
        }
    }

    /// Declarations carrying an initializer expression (enum type
    /// definitions never do).
    pub fn with_expressions(&self) -> Vec<&Declaration> {
        self.elements
            .iter()
            .filter(|e| {
                !e.expression.is_empty() && e.data_type != DeclKind::EnumType
            })
            .collect()
    }

    pub fn input_ports(&self) -> Vec<&Declaration> {
        self.elements
            .iter()
            .filter(|e| e.data_type == DeclKind::Inport)
            .collect()
    }

    /// The declaration named `identifier` if it is dimensioned.
    pub fn find_dimensioned(&self, identifier: Id) -> Option<&Declaration> {
        self.get(identifier).filter(|e| e.dim_size > 0)
    }

    /// Replace every declared identifier occurring in `expression` with
    /// its display name. The descending-length order guarantees that a
    /// name which is a prefix of another never matches first.
    pub fn substitute_names(&self, expression: &str) -> String {
        let mut result = expression.to_string();
        for element in &self.elements {
            result = format::replace_whole_word(
                &result,
                element.entity.identifier.as_str(),
                &element.entity.display_name(),
            );
        }
        result
    }

    /// Replace the first declared identifier found in `expression`,
    /// reporting which declaration matched.
    pub fn substitute_first(
        &self,
        expression: &str,
    ) -> (String, Option<&Declaration>) {
        for element in &self.elements {
            let (replaced, changed) = format::replace_whole_word_first(
                expression,
                element.entity.identifier.as_str(),
                &element.entity.display_name(),
            );
            if changed {
                return (replaced, Some(element));
            }
        }
        (expression.to_string(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(
        counters: &mut Counters,
        kind: DeclKind,
        id: &str,
        span: Span,
        level: Option<u32>,
    ) -> Declaration {
        let mut decl =
            Declaration::new(counters, kind, id, span, ElementTag::None);
        decl.set_namespace_level(level);
        decl
    }

    #[test]
    fn duplicate_same_identifier_and_level_is_rejected() {
        let mut counters = Counters::new();
        let mut decls = DeclarationCollection::new();
        let first = decl(
            &mut counters,
            DeclKind::Wire,
            "data",
            Span::new(1, 4),
            Some(0),
        );
        let again = decl(
            &mut counters,
            DeclKind::Wire,
            "data",
            Span::new(9, 12),
            Some(0),
        );
        assert!(decls.insert(first).0);
        let (inserted, index) = decls.insert(again);
        assert!(!inserted);
        assert_eq!(index, 0);
        assert_eq!(decls.len(), 1);
    }

    #[test]
    fn same_identifier_at_other_level_is_distinct() {
        let mut counters = Counters::new();
        let mut decls = DeclarationCollection::new();
        decls.insert(decl(
            &mut counters,
            DeclKind::Wire,
            "data",
            Span::new(1, 4),
            Some(0),
        ));
        let (inserted, _) = decls.insert(decl(
            &mut counters,
            DeclKind::Wire,
            "data",
            Span::new(9, 12),
            Some(1),
        ));
        assert!(inserted);
        assert_eq!(decls.len(), 2);
    }

    #[test]
    fn collection_stays_sorted_longest_first() {
        let mut counters = Counters::new();
        let mut decls = DeclarationCollection::new();
        for (id, span) in
            [("a", Span::new(1, 2)), ("abc", Span::new(3, 6)), ("ab", Span::new(7, 9))]
        {
            decls.insert(decl(&mut counters, DeclKind::Reg, id, span, None));
        }
        let names: Vec<_> =
            decls.iter().map(|d| d.entity().identifier.as_str()).collect();
        assert_eq!(names, vec!["abc", "ab", "a"]);
    }

    #[test]
    fn longest_match_substitution_never_splits_identifiers() {
        let mut counters = Counters::new();
        let mut decls = DeclarationCollection::new();
        let mut a = decl(&mut counters, DeclKind::Reg, "a", Span::new(1, 2), None);
        a.set_namespace_level(Some(1));
        let mut ab =
            decl(&mut counters, DeclKind::Reg, "ab", Span::new(3, 5), None);
        ab.set_namespace_level(Some(2));
        decls.insert(a);
        decls.insert(ab);
        assert_eq!(decls.substitute_names("ab + a"), "ab_2 + a_1");
    }

    #[test]
    fn kind_resolution_prefers_builtins() {
        use crate::Typedef;
        let mut counters = Counters::new();
        let td = Typedef::new(
            &mut counters,
            "state_t",
            "STATE_T",
            Span::UNKNOWN,
            "ctrl.sv",
            DeclKind::EnumType,
            ElementTag::None,
        );
        let typedefs = vec![td];
        assert_eq!(
            DeclKind::resolve("logic", typedefs.iter(), std::iter::empty()),
            DeclKind::Logic
        );
        assert_eq!(
            DeclKind::resolve("state_t", typedefs.iter(), std::iter::empty()),
            DeclKind::Enum
        );
        assert_eq!(
            DeclKind::resolve(
                "fifo",
                typedefs.iter(),
                [Id::new("fifo")].into_iter()
            ),
            DeclKind::Class
        );
        assert_eq!(
            DeclKind::resolve("mystery", typedefs.iter(), std::iter::empty()),
            DeclKind::None
        );
    }

    #[test]
    fn type_projection_table() {
        let mut counters = Counters::new();
        let mut d = decl(
            &mut counters,
            DeclKind::Logic,
            "bus",
            Span::UNKNOWN,
            None,
        );
        assert_eq!(d.project_type(TypeContext::None), "bool");
        d.size = 8;
        assert_eq!(d.project_type(TypeContext::None), "Bits 8");
        d.dim_size = 4;
        assert_eq!(d.project_type(TypeContext::None), "(Bits 8) -> Bits 4");
        assert_eq!(d.project_type(TypeContext::Parameter), "Bits 8");
        assert_eq!(d.project_type(TypeContext::StructMember), "bus:(Bits 8) -> Bits 4");

        let mut t =
            decl(&mut counters, DeclKind::Time, "now", Span::UNKNOWN, None);
        assert_eq!(t.project_type(TypeContext::None), "Bits 64");
        t.data_type = DeclKind::Int;
        assert_eq!(t.project_type(TypeContext::None), "int");
        t.data_type = DeclKind::Struct;
        t.size_expr = "packet_t".to_string();
        assert_eq!(t.project_type(TypeContext::None), "packet_t");
    }
}
