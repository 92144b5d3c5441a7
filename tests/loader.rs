// tests/loader.rs

use std::io::Write;

use tempfile::NamedTempFile;
use taskdag::config::load_from_path;
use taskdag::dag::TaskDag;
use taskdag::errors::DagError;
use taskdag::task::{ExecutionContext, TaskRegistry};
use taskdag_test_utils::init_tracing;

#[test]
fn dag_loads_from_file_and_runs() {
    init_tracing();
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[[scalar]]
name = "reference"
value = -76.0267
product = "val1"

[section.scf.scalar]
name = "energy"
value = -76.02671
product = "val2"

[section.scf.compare]
tolerance = 1e-4
using.val1.from = ".reference"
using.val2.from = "energy"
"#
    )
    .unwrap();

    let mut dag = TaskDag::from_path(&TaskRegistry::with_builtins(), file.path()).unwrap();
    assert_eq!(
        dag.pending_names(),
        vec!["scf.energy", "scf.compare", "reference"]
    );

    let report = dag.execute(&mut ExecutionContext::new()).unwrap();
    assert_eq!(report.round_of("scf.compare"), Some(1));
    assert!(*dag.product("scf.compare", "match").unwrap().value::<bool>().unwrap());
}

#[test]
fn file_order_is_preserved() {
    init_tracing();
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[zeta]
a = 1

[alpha]
b = 2
"#
    )
    .unwrap();

    let input = load_from_path(file.path()).unwrap();
    let keys: Vec<&str> = input.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["zeta", "alpha"]);
}

#[test]
fn invalid_toml_returns_structured_error() {
    init_tracing();
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[scalar\nvalue = 1.0\n").unwrap();

    match TaskDag::from_path(&TaskRegistry::with_builtins(), file.path()) {
        Err(DagError::TomlError(_)) => {}
        Err(e) => panic!("Expected TomlError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn missing_file_returns_io_error() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");

    match TaskDag::from_path(&TaskRegistry::with_builtins(), &path) {
        Err(DagError::IoError(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        Err(e) => panic!("Expected IoError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}
