//! End-to-end tests against the literal scenarios named in the
//! specification: compile a surface program all the way through
//! `dioc_opt::compile`, check the rendered artifacts, then hand the
//! rendered machine file to `dioc_interp::Evaluator` and check the
//! standalone evaluator agrees with the schedule the compiler produced.

use std::collections::BTreeMap;

use proptest::prop_assert_eq;

use dioc_frontend::DiocParser;
use dioc_ir::printer::{render_machine_file, render_report, ReportData};
use dioc_interp::Evaluator;
use dioc_utils::Id;

fn compile_src(src: &str) -> dioc_opt::CompileOutput {
    let program = DiocParser::parse_str(src).expect("program should parse");
    dioc_opt::compile(&program).expect("program should compile")
}

fn render_machine_string(out: &dioc_opt::CompileOutput) -> String {
    let mut s = String::new();
    render_machine_file(&mut s, &out.machine_assignments);
    s
}

#[test]
fn identity_step() {
    let out = compile_src("(program (state x) (loop (block (assign = x x))))");
    assert_eq!(render_machine_string(&out), "x[t+1] := x\n");

    let ev = Evaluator::load(&render_machine_string(&out)).unwrap();
    let next = ev
        .step(&BTreeMap::from([(Id::new("x"), 7)]), &BTreeMap::new())
        .unwrap();
    assert_eq!(next[&Id::new("x")], 7);
}

#[test]
fn unconditional_counter() {
    let out = compile_src("(program (state x) (loop (block (assign = x (+ x 1)))))");
    assert_eq!(render_machine_string(&out), "x[t+1] := +(x, 1)\n");
    assert_eq!(out.poly_system.len(), 1);
    assert_eq!(out.witness_count, 0);

    let ev = Evaluator::load(&render_machine_string(&out)).unwrap();
    let steps: Vec<BTreeMap<Id, i64>> = (0..5).map(|_| BTreeMap::new()).collect();
    let trace = ev
        .simulate(BTreeMap::from([(Id::new("x"), 0)]), &steps)
        .unwrap();
    let xs: Vec<i64> = trace.iter().map(|s| s[&Id::new("x")]).collect();
    assert_eq!(xs, vec![1, 2, 3, 4, 5]);
}

#[test]
fn conditional_clamp_matches_direct_evaluation_via_the_compiled_schedule() {
    let src = r#"(program
        (state p)
        (loop (block
            (if (&& (== k 'w') (> p 1))
                (block (update p --))))))"#;
    let out = compile_src(src);
    assert!(out.input_vars.contains(&Id::new("k")));
    assert!(out.witness_count > 0);

    let ev = Evaluator::load(&render_machine_string(&out)).unwrap();

    let cases = [
        (5_i64, b'w' as i64, 4_i64),
        (1, b'w' as i64, 1),
        (5, b's' as i64, 5),
    ];
    for (p, k, expected) in cases {
        let next = ev
            .step(
                &BTreeMap::from([(Id::new("p"), p)]),
                &BTreeMap::from([(Id::new("k"), k)]),
            )
            .unwrap();
        assert_eq!(next[&Id::new("p")], expected, "p={p} k={k}");
    }
}

#[test]
fn repeated_subexpression_is_extracted_into_a_shared_alias() {
    let src = r#"(program
        (state b d)
        (loop (block
            (assign = b (+ beta gamma))
            (assign = d (+ beta gamma)))))"#;
    let out = compile_src(src);
    assert_eq!(out.aliases.len(), 1);

    let mut report = String::new();
    render_report(
        &mut report,
        &ReportData {
            state_vars: out.state_vars.clone(),
            input_vars: out.input_vars.clone(),
            unoptimized: &out.unoptimized,
            aliases: &out.aliases,
            optimized: &out.optimized,
            poly_system: &out.poly_system,
        },
    );
    assert!(report.contains("=== Common Subexpression Definitions ==="));
    assert!(report.contains("C₀"));

    let ev = Evaluator::load(&render_machine_string(&out)).unwrap();
    let next = ev
        .step(
            &BTreeMap::new(),
            &BTreeMap::from([(Id::new("beta"), 2), (Id::new("gamma"), 3)]),
        )
        .unwrap();
    assert_eq!(next[&Id::new("b")], 5);
    assert_eq!(next[&Id::new("d")], 5);
}

#[test]
fn unsupported_construct_compiles_to_an_opaque_input_instead_of_aborting() {
    let src = r#"(program (state x) (loop (block (opaque "x"))))"#;
    let out = compile_src(src);
    assert!(out.input_vars.contains(&Id::new("opq_0")));
    assert_eq!(render_machine_string(&out), "x[t+1] := opq_0\n");

    let ev = Evaluator::load(&render_machine_string(&out)).unwrap();
    let next = ev
        .step(
            &BTreeMap::from([(Id::new("x"), 0)]),
            &BTreeMap::from([(Id::new("opq_0"), 42)]),
        )
        .unwrap();
    assert_eq!(next[&Id::new("x")], 42);
}

#[test]
fn cse_is_idempotent_on_its_own_output() {
    let src = r#"(program
        (state b d)
        (loop (block
            (assign = b (+ beta gamma))
            (assign = d (+ beta gamma)))))"#;
    let out = compile_src(src);
    assert_eq!(out.aliases.len(), 1);

    // Re-running CSE on its own optimized output must be a no-op: F' now
    // only holds leaf references to the alias it already extracted, leaves
    // are never counted as candidates, so nothing further is found or
    // rewritten.
    let recompiled = dioc_opt::passes::cse::cse(&out.optimized);
    assert!(recompiled.aliases.is_empty());
    for v in out.optimized.sorted_vars() {
        assert_eq!(recompiled.f.get(v), out.optimized.get(v));
    }
}

#[test]
fn cyclic_program_is_rejected_before_it_ever_reaches_the_evaluator() {
    let src = "(program (state a b) (loop (block (assign = a b) (assign = b a))))";
    let program = DiocParser::parse_str(src).unwrap();
    let result = dioc_opt::compile(&program);
    assert!(result.is_err());
}

proptest::proptest! {
    /// The `if (== j k) ... else ...` lowering must agree with direct
    /// integer equality for any pair of input values, including the
    /// degenerate `j == k` case the Polynomial Reducer's witness-based
    /// `==` rule has to get right.
    #[test]
    fn equality_branch_matches_plain_integer_equality(j in -20i64..20, k in -20i64..20) {
        let src = "(program (state x) \
            (loop (block (if (== j k) (block (assign = x 1)) (block (assign = x 0))))))";
        let out = compile_src(src);
        let ev = Evaluator::load(&render_machine_string(&out)).unwrap();

        let next = ev
            .step(
                &BTreeMap::from([(Id::new("x"), 0)]),
                &BTreeMap::from([(Id::new("j"), j), (Id::new("k"), k)]),
            )
            .unwrap();
        prop_assert_eq!(next[&Id::new("x")], (j == k) as i64);
    }

    /// Same, for `<` -- exercises the four-square lowering used for the
    /// strict comparison operators.
    #[test]
    fn less_than_branch_matches_plain_integer_comparison(j in -20i64..20, k in -20i64..20) {
        let src = "(program (state x) \
            (loop (block (if (< j k) (block (assign = x 1)) (block (assign = x 0))))))";
        let out = compile_src(src);
        let ev = Evaluator::load(&render_machine_string(&out)).unwrap();

        let next = ev
            .step(
                &BTreeMap::from([(Id::new("x"), 0)]),
                &BTreeMap::from([(Id::new("j"), j), (Id::new("k"), k)]),
            )
            .unwrap();
        prop_assert_eq!(next[&Id::new("x")], (j < k) as i64);
    }
}
