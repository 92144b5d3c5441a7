// tests/resolver.rs

use std::rc::Rc;

use taskdag::config::load_from_str;
use taskdag::dag::TaskDag;
use taskdag::errors::DagError;
use taskdag::task::ProductRef;
use taskdag_test_utils::init_tracing;
use taskdag_test_utils::probe::{probe_registry, RunLog};

fn parse(input: &str) -> TaskDag {
    let log = RunLog::new();
    TaskDag::parse(&probe_registry(&log), load_from_str(input).unwrap()).unwrap()
}

/// Product bound to requirement `requirement` of task `task`.
fn binding(dag: &TaskDag, task: &str, requirement: &str) -> ProductRef {
    let task = dag.task(task).unwrap();
    let req = task
        .products()
        .iter()
        .flat_map(|p| p.requirements())
        .find(|r| r.name() == requirement)
        .unwrap();
    Rc::clone(req.product().expect("requirement should be bound"))
}

fn bound_to(dag: &TaskDag, task: &str, requirement: &str, producer: &str, product: &str) -> bool {
    let expected = dag.product(producer, product).unwrap();
    Rc::ptr_eq(&binding(dag, task, requirement), &expected)
}

/// Unwrap the single resolution error.
fn single_error(dag: &mut TaskDag) -> DagError {
    match dag.resolve() {
        Err(DagError::Resolution(mut errors)) => {
            assert_eq!(errors.len(), 1, "errors: {errors:?}");
            errors.remove(0)
        }
        Err(e) => panic!("Expected Resolution error, got: {:?}", e),
        Ok(()) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn explicit_from_binds_named_products() {
    init_tracing();
    let mut dag = parse(
        r#"
[[scalar]]
name = "T1"
value = 1.0
product = "val1"

[[scalar]]
name = "T2"
value = 1.0
product = "energy"

[compare]
using.val1.from = "T1"
using.val2.from = "T2:energy"
"#,
    );

    dag.resolve().unwrap();

    assert!(bound_to(&dag, "compare", "val1", "T1", "val1"));
    assert!(bound_to(&dag, "compare", "val2", "T2", "energy"));
    assert!(dag.product("T1", "val1").unwrap().is_used());
}

#[test]
fn literal_binding_synthesizes_an_existing_scalar() {
    init_tracing();
    let mut dag = parse(
        r#"
[compare]
using.val1."=" = 2.5
using.val2."=" = 3
"#,
    );

    dag.resolve().unwrap();

    let val1 = binding(&dag, "compare", "val1");
    assert!(val1.exists());
    assert_eq!(*val1.value::<f64>().unwrap(), 2.5);
    assert_eq!(*binding(&dag, "compare", "val2").value::<f64>().unwrap(), 3.0);
    assert!(dag.task("compare").unwrap().is_ready());
}

#[test]
fn references_resolve_relative_to_the_task_context() {
    init_tracing();
    let mut dag = parse(
        r#"
[[scalar]]
name = "T1"
value = 1.0
product = "val2"

[section.a.scalar]
name = "T1"
value = 2.0
product = "val1"

[section.a.compare]
using.val1.from = "T1"
using.val2.from = ".T1"
"#,
    );

    dag.resolve().unwrap();

    assert!(bound_to(&dag, "a.compare", "val1", "a.T1", "val1"));
    assert!(bound_to(&dag, "a.compare", "val2", "T1", "val2"));
}

#[test]
fn dotted_references_are_absolute() {
    init_tracing();
    let mut dag = parse(
        r#"
[section.b.scalar]
name = "S"
value = 1.0
product = "val1"

[section.a.compare]
using.val1.from = "b.S"
using.val2."=" = 1.0
"#,
    );

    dag.resolve().unwrap();
    assert!(bound_to(&dag, "a.compare", "val1", "b.S", "val1"));
}

#[test]
fn missing_referenced_task_is_reported() {
    init_tracing();
    let mut dag = parse(
        r#"
[section.a.compare]
using.val1.from = "nope"
using.val2."=" = 1.0
"#,
    );

    match single_error(&mut dag) {
        DagError::TaskNotFound { task, reference } => {
            assert_eq!(task, "a.compare");
            assert_eq!(reference, "a.nope");
        }
        e => panic!("Expected TaskNotFound, got: {:?}", e),
    }
}

#[test]
fn missing_referenced_product_is_reported() {
    init_tracing();
    let mut dag = parse(
        r#"
[scalar]
name = "T1"
value = 1.0

[compare]
using.val1.from = "T1"
using.val2."=" = 1.0
"#,
    );

    match single_error(&mut dag) {
        DagError::ProductNotFound { task, product } => {
            assert_eq!(task, "T1");
            assert_eq!(product, "val1");
        }
        e => panic!("Expected ProductNotFound, got: {:?}", e),
    }
}

#[test]
fn product_type_must_match_requirement() {
    init_tracing();
    let mut dag = parse(
        r#"
[probe]
name = "P"
produces = ["matrix:val1"]

[compare]
using.val1.from = "P"
using.val2."=" = 1.0
"#,
    );

    match single_error(&mut dag) {
        DagError::ProductTypeMismatch {
            task,
            requirement,
            expected,
            found,
            ..
        } => {
            assert_eq!(task, "compare");
            assert_eq!(requirement, "val1");
            assert_eq!(expected, "double");
            assert_eq!(found, "matrix");
        }
        e => panic!("Expected ProductTypeMismatch, got: {:?}", e),
    }
}

#[test]
fn literal_for_non_scalar_requirement_is_rejected() {
    init_tracing();
    let mut dag = parse(
        r#"
[probe]
name = "C"
requires = ["matrix:fock"]
using.fock."=" = 1.0
"#,
    );

    match single_error(&mut dag) {
        DagError::LiteralForNonScalar { task, requirement, ty } => {
            assert_eq!(task, "C");
            assert_eq!(requirement, "fock");
            assert_eq!(ty, "matrix");
        }
        e => panic!("Expected LiteralForNonScalar, got: {:?}", e),
    }
}

#[test]
fn using_an_unknown_requirement_is_reported() {
    init_tracing();
    let mut dag = parse(
        r#"
[compare]
using.val1."=" = 1.0
using.val2."=" = 1.0
using.val3."=" = 1.0
"#,
    );

    match single_error(&mut dag) {
        DagError::UnknownRequirement { task, requirement } => {
            assert_eq!(task, "compare");
            assert_eq!(requirement, "val3");
        }
        e => panic!("Expected UnknownRequirement, got: {:?}", e),
    }
}

#[test]
fn same_named_requirements_must_share_a_type() {
    init_tracing();
    let mut dag = parse(
        r#"
[[probe]]
name = "P"
produces = ["matrix:x"]

[[probe]]
name = "C"
produces = ["out:a", "out:b"]
requires = ["matrix:x", "vector:x"]
using.x.from = "P"
"#,
    );

    match single_error(&mut dag) {
        DagError::RequirementTypeConflict { task, requirement } => {
            assert_eq!(task, "C");
            assert_eq!(requirement, "x");
        }
        e => panic!("Expected RequirementTypeConflict, got: {:?}", e),
    }
}

#[test]
fn malformed_binding_is_reported() {
    init_tracing();
    let mut dag = parse(
        r#"
[compare]
using.val1.from = "a:b:c"
using.val2."=" = 1.0
"#,
    );

    match single_error(&mut dag) {
        DagError::InvalidBinding { task, requirement, .. } => {
            assert_eq!(task, "compare");
            assert_eq!(requirement, "val1");
        }
        e => panic!("Expected InvalidBinding, got: {:?}", e),
    }
}

#[test]
fn explicit_binding_wins_over_greedy() {
    init_tracing();
    let mut dag = parse(
        r#"
[[probe]]
name = "A"
produces = ["matrix:m"]

[[probe]]
name = "B"
produces = ["matrix:m"]

[[probe]]
name = "C"
requires = ["matrix:m"]
using.m.from = "B"

[[probe]]
name = "D"
requires = ["matrix:m"]
"#,
    );

    dag.resolve().unwrap();

    assert!(bound_to(&dag, "C", "m", "B", "m"));
    // Greedy takes the first matching product in task order.
    assert!(bound_to(&dag, "D", "m", "A", "m"));
}

#[test]
fn greedy_looks_outward_never_inward() {
    init_tracing();
    let mut dag = parse(
        r#"
[probe]
name = "Root"
produces = ["basis:b"]

[section.a.probe]
name = "Mid"
produces = ["matrix:m"]

[section.a.section.b.probe]
name = "Leaf"
requires = ["basis:b", "matrix:m"]
"#,
    );

    dag.resolve().unwrap();

    assert!(bound_to(&dag, "a.b.Leaf", "b", "Root", "b"));
    assert!(bound_to(&dag, "a.b.Leaf", "m", "a.Mid", "m"));
}

#[test]
fn greedy_never_binds_to_a_deeper_context() {
    init_tracing();
    let mut dag = parse(
        r#"
[probe]
name = "Top"
requires = ["matrix:m"]

[section.a.probe]
name = "Inner"
produces = ["matrix:m"]
"#,
    );

    match single_error(&mut dag) {
        DagError::Unresolved { task, requirement, ty } => {
            assert_eq!(task, "Top");
            assert_eq!(requirement, "m");
            assert_eq!(ty, "matrix");
        }
        e => panic!("Expected Unresolved, got: {:?}", e),
    }
}

#[test]
fn greedy_does_not_bind_sibling_sections() {
    init_tracing();
    let mut dag = parse(
        r#"
[section.a.probe]
name = "P"
produces = ["matrix:m"]

[section.b.probe]
name = "C"
requires = ["matrix:m"]
"#,
    );

    match single_error(&mut dag) {
        DagError::Unresolved { task, .. } => assert_eq!(task, "b.C"),
        e => panic!("Expected Unresolved, got: {:?}", e),
    }
}

#[test]
fn greedy_forwards_an_already_bound_requirement() {
    init_tracing();
    // `C` cannot see `x.B`, but `M` (visible) already consumes x.B's basis.
    let mut dag = parse(
        r#"
[[probe]]
name = "M"
produces = ["matrix:m"]
requires = ["basis:b"]
using.b.from = "x.B"

[[probe]]
name = "C"
requires = ["basis:b"]

[section.x.probe]
name = "B"
produces = ["basis:b"]
"#,
    );

    dag.resolve().unwrap();

    assert!(bound_to(&dag, "M", "b", "x.B", "b"));
    assert!(bound_to(&dag, "C", "b", "x.B", "b"));
}

#[test]
fn greedy_never_binds_a_task_to_itself() {
    init_tracing();
    let mut dag = parse(
        r#"
[probe]
name = "Self"
produces = ["matrix:m"]
requires = ["matrix:m"]
"#,
    );

    match single_error(&mut dag) {
        DagError::Unresolved { task, .. } => assert_eq!(task, "Self"),
        e => panic!("Expected Unresolved, got: {:?}", e),
    }
}

#[test]
fn scalar_requirements_must_be_explicit() {
    init_tracing();
    let mut dag = parse(
        r#"
[scalar]
value = 1.0
product = "val1"

[compare]
"#,
    );

    match dag.resolve() {
        Err(DagError::Resolution(errors)) => {
            assert_eq!(errors.len(), 2, "errors: {errors:?}");
            for (err, name) in errors.iter().zip(["val1", "val2"]) {
                match err {
                    DagError::UnboundScalar { task, requirement } => {
                        assert_eq!(task, "compare");
                        assert_eq!(requirement, name);
                    }
                    e => panic!("Expected UnboundScalar, got: {:?}", e),
                }
            }
        }
        other => panic!("Expected Resolution error, got: {:?}", other),
    }
}

#[test]
fn resolving_twice_keeps_bindings() {
    init_tracing();
    let mut dag = parse(
        r#"
[[probe]]
name = "A"
produces = ["matrix:m"]

[[probe]]
name = "B"
produces = ["matrix:m"]

[[probe]]
name = "C"
requires = ["matrix:m"]
using.m.from = "B"
"#,
    );

    dag.resolve().unwrap();
    dag.resolve().unwrap();

    assert!(bound_to(&dag, "C", "m", "B", "m"));
}
