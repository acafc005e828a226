//! The semantic intermediate representation of the Aplan translator and
//! its deterministic renderers.
//!
//! Construction is two-phase: the front end populates the collections of
//! each [DesignUnit] through builder calls, then link resolution binds
//! symbolic call sites to concrete [Action]s, and only then do the
//! rendering methods produce target-language text bottom-up.
mod action;
mod builder;
mod common;
mod context;
mod declaration;
mod design_unit;
mod entity;
mod expr;
mod param;
mod protocol;
mod structure;
mod task;
mod typedef;

pub use action::{Action, ActionCollection, ActionParts};
pub use builder::UnitBuilder;
pub use common::{rrc, ElementTag, RRC};
pub use context::Context;
pub use declaration::{
    DeclFilter, DeclKind, Declaration, DeclarationCollection, TypeContext,
};
pub use design_unit::{DesignUnit, DesignUnitCollection, UnitItem};
pub use entity::{Entity, EntityCollection, EntityNode, Filter};
pub use expr::{RangeSelect, Token, TokenSequence};
pub use param::{Param, ParamList, ValueParam, ValueParamCollection};
pub use protocol::{
    BodyElement, BodyElementSequence, Protocol, ProtocolCollection, Related,
};
pub use structure::{
    Behavior, CaseInfo, IfInfo, Structure, StructureCollection, StructureKind,
};
pub use task::{Task, TaskCollection};
pub use typedef::{Typedef, TypedefCollection};
