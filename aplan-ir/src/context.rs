//! The per-run translation context. This is the top-level object for a
//! translation: it owns every design unit, the shared typedefs, and the
//! counter registry, so two runs never share state.
use crate::{DesignUnitCollection, TypedefCollection};
use aplan_utils::Counters;

/// State of one translation run.
#[derive(Default)]
pub struct Context {
    /// The design units of this run.
    pub design_units: DesignUnitCollection,
    /// Type definitions declared outside any unit.
    pub typedefs: TypedefCollection,
    /// Per-run counter registry; the source of every generated suffix
    /// and creation sequence.
    pub counters: Counters,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the context between independent runs: counters return to
    /// their initial values and the registries empty.
    pub fn reinit(&mut self) {
        self.counters.reinit();
        self.design_units.clear();
        self.typedefs.clear();
    }

    /// Run link resolution once over every unit. Must happen after the
    /// construct phase completes and before rendering.
    pub fn resolve_all_links(&mut self) {
        for unit in self.design_units.iter() {
            unit.resolve_links();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DesignUnit, ElementTag};
    use aplan_utils::Span;

    #[test]
    fn reinit_clears_run_state() {
        let mut ctx = Context::new();
        let unit = DesignUnit::new(
            &mut ctx.counters,
            "top",
            Span::UNKNOWN,
            "top",
            ElementTag::Module,
        );
        ctx.design_units.insert(unit);
        ctx.reinit();
        assert!(ctx.design_units.is_empty());
        assert_eq!(
            ctx.counters.get(aplan_utils::CounterKind::Sequence),
            0
        );
    }

    #[test]
    fn contexts_do_not_share_counters() {
        let mut first = Context::new();
        let mut second = Context::new();
        DesignUnit::new(
            &mut first.counters,
            "a",
            Span::UNKNOWN,
            "a",
            ElementTag::Module,
        );
        let unit = DesignUnit::new(
            &mut second.counters,
            "b",
            Span::UNKNOWN,
            "b",
            ElementTag::Module,
        );
        // The second context's numbering starts fresh.
        assert_eq!(unit.sequence(), 0);
    }
}
