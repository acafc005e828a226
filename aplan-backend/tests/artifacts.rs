//! End-to-end artifact fixtures: build a small unit through the builder
//! API, resolve links, and check the four emitted files byte-for-byte.
use aplan_backend::emit_project;
use aplan_ir::{
    Context, DesignUnit, ElementTag, ParamList, Token, UnitBuilder,
};
use aplan_utils::{CounterKind, Span};

fn build_context() -> Context {
    let mut ctx = Context::new();
    let mut unit = DesignUnit::new(
        &mut ctx.counters,
        "ctrl",
        Span::UNKNOWN,
        "ctrl_0",
        ElementTag::Module,
    );

    let action = {
        let mut builder = UnitBuilder::new(&mut unit, &mut ctx.counters);
        builder.add_input_port("req", Span::new(1, 4), 1);
        let action = builder.add_action(
            "assign",
            CounterKind::Assignment,
            Span::new(10, 20),
        );
        let (_, index) = builder.add_out_of_block(
            "main_loop",
            ElementTag::Protocol,
            ParamList::new(),
        );
        builder.add_call_element(index, "assign_1(x)", ElementTag::Action);
        action
    };
    {
        let mut action = action.borrow_mut();
        action.precondition_mut().push(Token::new(
            &mut ctx.counters,
            "1",
            Span::UNKNOWN,
            ElementTag::Identifier,
        ));
        action.postcondition_mut().push(Token::new(
            &mut ctx.counters,
            "ack = 1",
            Span::UNKNOWN,
            ElementTag::Identifier,
        ));
    }

    ctx.design_units.insert(unit);
    ctx.resolve_all_links();
    ctx
}

#[test]
fn emit_project_writes_the_four_artifacts() {
    let ctx = build_context();
    let dir = std::env::temp_dir()
        .join(format!("aplan-artifacts-{}", std::process::id()));
    emit_project(&ctx, &dir).unwrap();
    let read = |name: &str| std::fs::read_to_string(dir.join(name)).unwrap();

    assert_eq!(
        read("project.evt_descript"),
        "events(\n\ts_req:obj(x1:Bits 1);\n);"
    );

    assert_eq!(
        read("project.env_descript"),
        "environment (\n\
         \ttypes : obj (\n\
         \t\t\tNil\n\
         \t);\n\
         \tattributes : obj (Nil);\n\
         \tagent_types : obj (\n\
         \t\tCTRL : obj (\n\
         \t\t\treq:Bits 1\n\
         \t\t),\n\
         \t\tENVIRONMENT:obj(Nil)\n\
         \t);\n\
         \tagents : obj (\n\
         \t\tCTRL : obj (ctrl_0),\n\
         \t\tENVIRONMENT : obj (env)\n\
         \t);\n\
         \taxioms : obj (Nil);\n\
         \tlogic_formula : obj (1)\n\
         );"
    );

    assert_eq!(
        read("project.act"),
        "assign_1 = (\n\t\t(1)->\n\t\t(\":action 'assign_1 ();\")\n\t\t(ack = 1))"
    );

    assert_eq!(
        read("project.behp"),
        "B_CTRL_0 = {MAIN_CTRL_0},\n\
         MAIN_CTRL_0 = (main_loop)\n\
         \n\
         main_loop = assign_1"
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn object_units_are_excluded_from_act_and_behp() {
    use aplan_backend::{ActBackend, Backend, BehBackend};
    use aplan_utils::OutputFile;

    let mut ctx = build_context();
    let object = DesignUnit::new(
        &mut ctx.counters,
        "cfg",
        Span::UNKNOWN,
        "cfg_0",
        ElementTag::Object,
    );
    ctx.design_units.insert(object);

    let dir = std::env::temp_dir()
        .join(format!("aplan-objects-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let act_path = dir.join("project.act");
    let behp_path = dir.join("project.behp");
    ActBackend
        .run(&ctx, OutputFile::file(act_path.clone()))
        .unwrap();
    BehBackend
        .run(&ctx, OutputFile::file(behp_path.clone()))
        .unwrap();

    // The object unit contributes no actions and no behavior entry.
    let act = std::fs::read_to_string(&act_path).unwrap();
    assert!(!act.contains("CFG"));
    let behp = std::fs::read_to_string(&behp_path).unwrap();
    assert!(!behp.contains("CFG"));
    assert!(behp.starts_with("B_CTRL_0"));

    std::fs::remove_dir_all(&dir).ok();
}
