use std::cell::RefCell;
use std::rc::Rc;

/// Alias for a RefCell contained in an Rc reference.
#[allow(clippy::upper_case_acronyms)]
pub type RRC<T> = Rc<RefCell<T>>;

/// Construct a new RRC.
pub fn rrc<T>(t: T) -> RRC<T> {
    Rc::new(RefCell::new(t))
}

/// Variant tag carried by every IR node. The tag classifies the node for
/// the renderers: it selects separators between body elements, the
/// formula a structure contributes to, and which units an emission
/// backend includes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash)]
pub enum ElementTag {
    #[default]
    None,
    Action,
    Array,
    ArraySize,
    Assert,
    Assign,
    AssignArrayForCall,
    AssignForCall,
    AssignOutOfBlock,
    AssignSensetive,
    CaseStatement,
    Class,
    Condition,
    Dot,
    Forever,
    Function,
    Generate,
    Identifier,
    IfConditionLeft,
    IfConditionRight,
    IfStatement,
    Loop,
    Module,
    ModuleAssign,
    ModuleCall,
    Object,
    Operator,
    Postcondition,
    Precondition,
    Protocol,
    Repeat,
    Semicolon,
    Task,
    While,
}

impl std::fmt::Display for ElementTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
