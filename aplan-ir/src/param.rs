//! Formal parameters and elaboration-time value parameters.
use crate::{ElementTag, Entity, EntityNode};
use aplan_utils::{format, math, AplanResult, Counters, Error, Id, Span};
use itertools::Itertools;
use linked_hash_map::LinkedHashMap;

/// A formal parameter of an action, protocol, structure, or task.
#[derive(Clone, Debug)]
pub struct Param {
    entity: Entity,
    pub param_type: String,
    /// Identifier used in rendered formulas; defaults to the identifier,
    /// optionally prefixed by the owning action's name, and may be
    /// replaced by a generated short name.
    pub unique_identifier: Id,
    pub module_qualifier: Option<Id>,
}

impl Param {
    pub fn new(
        counters: &mut Counters,
        identifier: impl Into<Id>,
        param_type: impl Into<String>,
        span: Span,
        action_prefix: &str,
    ) -> Self {
        let identifier = identifier.into();
        let unique_identifier = if action_prefix.is_empty() {
            identifier
        } else {
            Id::new(format!("{action_prefix}_{identifier}"))
        };
        Param {
            entity: Entity::new(identifier, span, ElementTag::None, counters),
            param_type: param_type.into(),
            unique_identifier,
            module_qualifier: None,
        }
    }
}

impl EntityNode for Param {
    fn entity(&self) -> &Entity {
        &self.entity
    }
    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `var`-kinded parameters render bare.
        if self.param_type.contains("var") {
            write!(f, "{}", self.entity.identifier)
        } else {
            write!(f, "{}:{}", self.unique_identifier, self.param_type)
        }
    }
}

/// Ordered, identifier-unique parameter list.
#[derive(Clone, Debug, Default)]
pub struct ParamList {
    elements: LinkedHashMap<Id, Param>,
}

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.elements.values()
    }

    /// Insert `param`; a duplicate identifier is rejected with the index
    /// of the element already present.
    pub fn insert(&mut self, param: Param) -> (bool, usize) {
        let id = param.entity.identifier;
        if let Some(index) = self.index_of(id) {
            return (false, index);
        }
        self.elements.insert(id, param);
        (true, self.elements.len() - 1)
    }

    pub fn get(&self, identifier: Id) -> Option<&Param> {
        self.elements.get(&identifier)
    }

    pub fn index_of(&self, identifier: Id) -> Option<usize> {
        self.elements.keys().position(|k| *k == identifier)
    }

    pub fn by_index(&self, index: usize) -> Option<&Param> {
        self.elements.values().nth(index)
    }

    /// Merge `other` into this list, keeping first definitions.
    pub fn extend(&mut self, other: &ParamList) {
        for param in other.iter() {
            self.insert(param.clone());
        }
    }

    /// `(a, b, c)` over the first `count` parameter identifiers. Asking
    /// for more parameters than the list holds is an error.
    pub fn identifier_tuple(&self, count: usize) -> AplanResult<String> {
        if self.elements.is_empty() {
            return Ok(String::new());
        }
        if count > self.elements.len() {
            return Err(Error::invariant_violation(format!(
                "expected {} parameters but the list holds {}",
                count,
                self.elements.len()
            )));
        }
        Ok(format!(
            "({})",
            self.elements
                .keys()
                .take(count)
                .map(|id| id.as_str())
                .join(", ")
        ))
    }

    /// Short alphabetic name for a parameter position: a, b, ..., z, aa,
    /// ab, ...
    pub fn alphabetic_name(index: usize) -> String {
        const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
        let base = ALPHABET.len() as i64;
        let mut name = String::new();
        let mut index = index as i64;
        loop {
            name.insert(0, ALPHABET[(index % base) as usize] as char);
            index = index / base - 1;
            if index < 0 {
                break;
            }
        }
        name
    }

    /// Replace every parameter's rendered identifier with a generated
    /// short name based on its position.
    pub fn assign_generated_names(&mut self) {
        for (index, (_, param)) in self.elements.iter_mut().enumerate() {
            param.unique_identifier = Id::new(Self::alphabetic_name(index));
        }
    }
}

impl std::fmt::Display for ParamList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.elements.values().join(", "))
    }
}

/// A parameter carrying an elaboration-time integer value, possibly
/// described by an expression over other value parameters.
#[derive(Clone, Debug)]
pub struct ValueParam {
    entity: Entity,
    pub value: i64,
    pub expression: Option<String>,
}

impl ValueParam {
    pub fn new(
        counters: &mut Counters,
        identifier: impl Into<Id>,
        span: Span,
        value: i64,
        expression: Option<String>,
    ) -> Self {
        ValueParam {
            entity: Entity::new(identifier, span, ElementTag::None, counters),
            value,
            expression,
        }
    }
}

impl EntityNode for ValueParam {
    fn entity(&self) -> &Entity {
        &self.entity
    }
    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

impl std::fmt::Display for ValueParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.expression {
            Some(expr) => write!(f, "{} = {}", self.entity.identifier, expr),
            None => write!(f, "{} = {}", self.entity.identifier, self.value),
        }
    }
}

/// Value parameters of one design unit. Unlike the other collections this
/// one permits duplicate identifiers and keeps its elements sorted by
/// descending identifier length, so greedy textual substitution always
/// matches the longest name first.
#[derive(Clone, Debug, Default)]
pub struct ValueParamCollection {
    elements: Vec<ValueParam>,
}

impl ValueParamCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValueParam> {
        self.elements.iter()
    }

    pub fn by_index(&self, index: usize) -> &ValueParam {
        &self.elements[index]
    }

    pub fn get(&self, identifier: Id) -> Option<&ValueParam> {
        self.elements
            .iter()
            .find(|e| e.entity.identifier == identifier)
    }

    /// Sorted insertion keeping descending identifier length; returns the
    /// index the element landed on.
    pub fn insert(&mut self, param: ValueParam) -> usize {
        let len = param.entity.identifier.len();
        let index = self
            .elements
            .partition_point(|e| e.entity.identifier.len() >= len);
        self.elements.insert(index, param);
        index
    }

    /// Replace every whole-word reference to a value parameter inside
    /// `expression` by its numeric value.
    pub fn substitute_values(&self, expression: &str) -> String {
        let mut result = expression.to_string();
        for element in &self.elements {
            result = format::replace_whole_word(
                &result,
                element.entity.identifier.as_str(),
                &element.value.to_string(),
            );
        }
        result
    }

    /// Evaluate the expression of the parameter at `index`, store the
    /// value back, and return it. Malformed expressions are fatal.
    pub fn evaluate(&mut self, index: usize) -> AplanResult<i64> {
        let (span, expression) = {
            let param = &self.elements[index];
            (param.entity.span, param.expression.clone())
        };
        let Some(expression) = expression else {
            return Ok(self.elements[index].value);
        };
        if expression.is_empty() {
            return Ok(self.elements[index].value);
        }
        let substituted = self.substitute_values(&expression);
        let value = math::eval_int_expr(&substituted)
            .map_err(|e| e.with_span(span))?;
        self.elements[index].value = value;
        Ok(value)
    }
}

impl std::fmt::Display for ValueParamCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.elements.iter().join(",\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_render_by_kind() {
        let mut counters = Counters::new();
        let input =
            Param::new(&mut counters, "clk", "Bits 1", Span::UNKNOWN, "");
        assert_eq!(input.to_string(), "clk:Bits 1");
        let var = Param::new(&mut counters, "i", "var", Span::UNKNOWN, "");
        assert_eq!(var.to_string(), "i");
        let prefixed =
            Param::new(&mut counters, "x", "int", Span::UNKNOWN, "send");
        assert_eq!(prefixed.to_string(), "send_x:int");
    }

    #[test]
    fn alphabetic_names_wrap_like_spreadsheet_columns() {
        assert_eq!(ParamList::alphabetic_name(0), "a");
        assert_eq!(ParamList::alphabetic_name(25), "z");
        assert_eq!(ParamList::alphabetic_name(26), "aa");
        assert_eq!(ParamList::alphabetic_name(27), "ab");
    }

    #[test]
    fn identifier_tuple_checks_arity() {
        let mut counters = Counters::new();
        let mut params = ParamList::new();
        params.insert(Param::new(&mut counters, "a", "int", Span::UNKNOWN, ""));
        params.insert(Param::new(&mut counters, "b", "int", Span::UNKNOWN, ""));
        assert_eq!(params.identifier_tuple(2).unwrap(), "(a, b)");
        assert!(params.identifier_tuple(3).is_err());
    }

    #[test]
    fn value_params_sort_longest_first() {
        let mut counters = Counters::new();
        let mut params = ValueParamCollection::new();
        params.insert(ValueParam::new(
            &mut counters,
            "W",
            Span::UNKNOWN,
            8,
            None,
        ));
        params.insert(ValueParam::new(
            &mut counters,
            "WIDTH",
            Span::UNKNOWN,
            32,
            None,
        ));
        params.insert(ValueParam::new(
            &mut counters,
            "WID",
            Span::UNKNOWN,
            16,
            None,
        ));
        let names: Vec<_> = params
            .iter()
            .map(|p| p.entity().identifier.as_str())
            .collect();
        assert_eq!(names, vec!["WIDTH", "WID", "W"]);
        // Longest-first order makes greedy substitution safe.
        assert_eq!(params.substitute_values("WIDTH + WID + W"), "32 + 16 + 8");
    }

    #[test]
    fn evaluation_substitutes_and_stores() {
        let mut counters = Counters::new();
        let mut params = ValueParamCollection::new();
        params.insert(ValueParam::new(
            &mut counters,
            "WIDTH",
            Span::UNKNOWN,
            8,
            None,
        ));
        let index = params.insert(ValueParam::new(
            &mut counters,
            "MSB",
            Span::UNKNOWN,
            0,
            Some("WIDTH - 1".to_string()),
        ));
        assert_eq!(params.evaluate(index).unwrap(), 7);
        assert_eq!(params.by_index(index).value, 7);
    }

    #[test]
    fn malformed_expression_is_fatal() {
        let mut counters = Counters::new();
        let mut params = ValueParamCollection::new();
        let index = params.insert(ValueParam::new(
            &mut counters,
            "BAD",
            Span::new(4, 9),
            0,
            Some("undefined_name + 1".to_string()),
        ));
        let err = params.evaluate(index).unwrap_err();
        assert_eq!(err.span(), Some(Span::new(4, 9)));
    }
}
