//! The flattened expression model: a token stream with per-token
//! formatting annotations, rendered left-to-right into normalized
//! formula text.
use crate::{ElementTag, Entity, EntityNode};
use aplan_utils::{format, Counters, Id, Span};

/// Range-selection wrapping applied to a token's display text.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RangeSelect {
    #[default]
    None,
    /// Opens a range: `(x`.
    Start,
    /// Closes a range: `x)`.
    End,
    /// A complete range: `(x)`.
    StartEnd,
}

/// One token of a flattened expression.
#[derive(Clone, Debug)]
pub struct Token {
    entity: Entity,
    /// Instance qualification: `instance.signal`.
    pub module_qualifier: Option<Id>,
    /// True when this token is a bit index into its predecessor.
    pub bit_select: bool,
    pub range_select: RangeSelect,
}

impl Token {
    pub fn new(
        counters: &mut Counters,
        identifier: impl Into<Id>,
        span: Span,
        tag: ElementTag,
    ) -> Self {
        Token {
            entity: Entity::new(identifier, span, tag, counters),
            module_qualifier: None,
            bit_select: false,
            range_select: RangeSelect::None,
        }
    }

    fn identifier(&self) -> Id {
        self.entity.identifier
    }

    /// Display text of this token: module qualification, then range
    /// wrapping, then bit-selection wrapping. A numeric bit index closes
    /// over itself (`(3)`); a symbolic one closes the `BGET(` call its
    /// predecessor opened (`, idx)`).
    pub fn resolved_text(&self) -> String {
        let mut result = self.identifier().to_string();
        if let Some(qualifier) = self.module_qualifier {
            result = format!("{qualifier}.{result}");
        }
        match self.range_select {
            RangeSelect::StartEnd => result = format!("({result})"),
            RangeSelect::Start => result = format!("({result}"),
            RangeSelect::End => result = format!("{result})"),
            RangeSelect::None => {}
        }
        if self.bit_select {
            if format::is_numeric(self.identifier().as_str()) {
                result = format!("({result})");
            } else {
                result = format!(", {result})");
            }
        }
        result
    }
}

impl EntityNode for Token {
    fn entity(&self) -> &Entity {
        &self.entity
    }
    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.entity
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

const UNARY_OPERATORS: [&str; 2] = ["~", "!"];

/// An ordered token stream plus the purpose it renders for. A stream
/// whose purpose is `Precondition` gets the `BGET(..) == 1` boolean
/// normalization applied to its resolved tokens.
#[derive(Clone, Debug)]
pub struct TokenSequence {
    elements: Vec<Token>,
    pub purpose: ElementTag,
    /// Kind of operation this stream forms; builder bookkeeping.
    pub op_tag: ElementTag,
}

impl TokenSequence {
    pub fn new(purpose: ElementTag) -> Self {
        TokenSequence {
            elements: Vec::new(),
            purpose,
            op_tag: ElementTag::None,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.elements.iter()
    }

    pub fn by_index(&self, index: usize) -> &Token {
        &self.elements[index]
    }

    pub fn last(&self) -> Option<&Token> {
        self.elements.last()
    }

    pub fn is_assign(&self) -> bool {
        self.op_tag == ElementTag::Assign
            || self.op_tag == ElementTag::AssignSensetive
    }

    /// Append `token`. A token whose span is nested inside an already
    /// present token's span is a re-insertion of an inner expression
    /// fragment and is rejected; the index of the last element is
    /// returned instead.
    pub fn push(&mut self, token: Token) -> usize {
        if !token.entity.span.is_unknown()
            && !self.elements.is_empty()
            && self
                .elements
                .iter()
                .any(|e| e.entity.span.contains(token.entity.span))
        {
            return self.elements.len() - 1;
        }
        self.elements.push(token);
        self.elements.len() - 1
    }

    /// Render the stream to normalized expression text.
    ///
    /// One boolean tracks the single pending implicit group opened after
    /// a unary negation; nested pending groups are not constructible, so
    /// this is deliberately not a bracket stack.
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut open_unary_group = false;

        for (index, token) in self.elements.iter().enumerate() {
            let prev = match index {
                0 => None,
                i => Some(&self.elements[i - 1]),
            };

            // A pending unary group closes as soon as an operator token
            // arrives.
            if open_unary_group && token.entity.tag == ElementTag::Operator {
                parts.push(")".to_string());
                open_unary_group = false;
            }

            if let Some(prev) = prev {
                let no_space_before = token.entity.tag == ElementTag::Dot
                    || token.entity.tag == ElementTag::Semicolon
                    || token.bit_select
                    || token.range_select != RangeSelect::None
                    || (token.identifier() == "("
                        && prev.entity.tag == ElementTag::Identifier);
                let prev_is_unary =
                    UNARY_OPERATORS.contains(&prev.identifier().as_str());
                let no_space_after =
                    prev.entity.tag == ElementTag::Dot || prev_is_unary;
                if !no_space_before && !no_space_after {
                    parts.push(" ".to_string());
                }
                // The implicit group a unary negation opens around its
                // operand.
                if prev_is_unary
                    && !open_unary_group
                    && !token.identifier().as_str().contains('(')
                {
                    parts.push("(".to_string());
                    open_unary_group = true;
                }
            }

            let mut text = token.resolved_text();
            match token.entity.tag {
                ElementTag::Array => text.push_str(".value"),
                ElementTag::ArraySize => text.push_str(".size"),
                _ => {}
            }

            // A symbolic bit index on the next token turns this one into
            // the opening of a BGET call; the index token closes it.
            if let Some(next) = self.elements.get(index + 1) {
                if next.bit_select
                    && !format::is_numeric(next.identifier().as_str())
                {
                    text = format!("BGET({text}");
                }
            }

            if self.purpose == ElementTag::Precondition {
                text = format::equate_bget(&text);
            }

            if format::is_lone_pipe(&text)
                && prev.is_some_and(|p| p.entity.tag == ElementTag::Operator)
            {
                // A lone `|` after an operator needs its left operand
                // synthesized from the head of the stream.
                let first = self.elements[0].resolved_text();
                text = format!("{first} {text}");
            }

            let ident = token.identifier();
            match prev {
                Some(prev) if ident.as_str().contains("++") => {
                    Self::desugar_step(&mut parts, prev, '+');
                }
                Some(prev) if ident.as_str().contains("--") => {
                    Self::desugar_step(&mut parts, prev, '-');
                }
                _ if token.entity.tag == ElementTag::Semicolon
                    && index != self.elements.len() - 1 =>
                {
                    parts.push(format!("{text}\n\t\t"));
                }
                _ => parts.push(text),
            }
        }

        if open_unary_group {
            parts.push(")".to_string());
        }
        parts.concat()
    }

    /// Rewrite `x ++` / `x --` as an assignment step, consuming the
    /// predecessor's own emission entirely.
    fn desugar_step(parts: &mut Vec<String>, prev: &Token, op: char) {
        if parts.last().is_some_and(|p| p.as_str() == " ") {
            parts.pop();
        }
        parts.pop();
        if parts.last().is_some_and(|p| p.as_str() == " ") {
            parts.pop();
        }
        parts.push(format!("= {} {op} 1", prev.resolved_text()));
    }
}

impl std::fmt::Display for TokenSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}
