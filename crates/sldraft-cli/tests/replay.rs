use std::{fs, path::Path};

use tempfile::tempdir;

use sldraft_cli::{Args, CliError, run};
use sldraft_core::Diagram;

fn args(dir: &Path, script: &str) -> Args {
    let script_path = dir.join("script.json");
    fs::write(&script_path, script).unwrap();
    let config_path = dir.join("sldraft.toml");
    fs::write(&config_path, "default_layer = \"Power\"\nsnap_to_grid = false\n").unwrap();
    Args {
        input: None,
        script: script_path,
        output: Some(dir.join("out.json")),
        config: Some(config_path),
        catalog: None,
        log_level: "off".to_string(),
    }
}

fn output(dir: &Path) -> Diagram {
    Diagram::from_json(&fs::read_to_string(dir.join("out.json")).unwrap()).unwrap()
}

#[test]
fn test_replay_writes_diagram() {
    let dir = tempdir().unwrap();
    let args = args(
        dir.path(),
        r#"[
            { "action": "add_component", "alias": "xfmr", "kind": "transformer",
              "x": 0, "y": 0, "width": 40, "height": 40 },
            { "action": "add_component", "alias": "mdp", "kind": "panel",
              "x": 100, "y": 0, "width": 40, "height": 80 },
            { "action": "connect", "from": "xfmr", "to": "mdp" },
            { "action": "pointer_down", "x": 110, "y": 10 },
            { "action": "pointer_move", "x": 130, "y": 50 },
            { "action": "pointer_up", "x": 130, "y": 50 }
        ]"#,
    );

    let report = run(&args).unwrap();
    assert_eq!(report.steps, 6);
    assert!(report.failures.is_empty());

    let diagram = output(dir.path());
    assert_eq!(diagram.len(), 2);
    assert_eq!(diagram.connection_count(), 1);
    let panel = diagram
        .components()
        .find(|c| c.kind == "panel")
        .unwrap();
    assert_eq!(panel.position.x, 120.0);
    assert_eq!(panel.position.y, 40.0);
}

#[test]
fn test_undo_in_script() {
    let dir = tempdir().unwrap();
    let args = args(
        dir.path(),
        r#"[
            { "action": "add_component", "kind": "meter", "x": 0, "y": 0, "width": 10, "height": 10 },
            { "action": "add_component", "kind": "meter", "x": 50, "y": 0, "width": 10, "height": 10 },
            { "action": "undo" }
        ]"#,
    );
    run(&args).unwrap();
    assert_eq!(output(dir.path()).len(), 1);
}

#[test]
fn test_failed_steps_are_reported() {
    let dir = tempdir().unwrap();
    let args = args(
        dir.path(),
        r#"[
            { "action": "place", "template": "qo-100a", "x": 0, "y": 0 },
            { "action": "connect", "from": "a", "to": "b" }
        ]"#,
    );
    let report = run(&args).unwrap();
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].action, "place");
    assert!(output(dir.path()).is_empty());
}

#[test]
fn test_place_from_catalog_and_input_diagram() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.json");
    fs::write(&input, Diagram::named("Service").to_json().unwrap()).unwrap();
    let catalog = dir.path().join("catalog.json");
    fs::write(
        &catalog,
        r#"[{ "id": "qo-100a", "kind": "breaker",
              "default_size": { "width": 20.0, "height": 40.0 },
              "properties": { "trip_amps": 100 } }]"#,
    )
    .unwrap();

    let mut args = args(
        dir.path(),
        r#"[{ "action": "place", "template": "qo-100a", "x": 30, "y": 30, "alias": "cb" }]"#,
    );
    args.input = Some(input);
    args.catalog = Some(catalog);

    let report = run(&args).unwrap();
    assert!(report.failures.is_empty());

    let diagram = output(dir.path());
    assert_eq!(diagram.metadata.name, "Service");
    let breaker = diagram.components().next().unwrap();
    assert_eq!(breaker.kind, "breaker");
    assert_eq!(breaker.property("trip_amps"), Some(&serde_json::json!(100)));
}

#[test]
fn test_invalid_script_is_an_error() {
    let dir = tempdir().unwrap();
    let args = args(dir.path(), r#"[{ "action": "teleport" }]"#);
    assert!(matches!(run(&args), Err(CliError::Script { .. })));
}

#[test]
fn test_missing_input_is_an_error() {
    let dir = tempdir().unwrap();
    let mut args = args(dir.path(), "[]");
    args.input = Some(dir.path().join("missing.json"));
    assert!(matches!(run(&args), Err(CliError::Read { .. })));
}
