#![cfg(unix)]

use babel_jest::{
    create_transformer, CommandCompiler, Compiler, CompilerOptions, EnvContext, LoadOptions,
    ProcessOutput, ProjectConfig, TransformError,
};
use serde_json::json;
use std::sync::Arc;

/// A compiler that drains its request and prints `response`.
fn replying(response: &str) -> CommandCompiler {
    let script = format!("cat > /dev/null; printf '%s' '{response}'");
    CommandCompiler::new("sh", ["-c".to_string(), script])
}

fn load() -> LoadOptions {
    LoadOptions {
        cwd: "/repo".into(),
        filename: "/repo/a.js".into(),
        config: Default::default(),
    }
}

#[test]
fn null_result_means_ignored() {
    let c = replying(r#"{"result":null}"#);
    assert!(c.load_partial_config(&load()).unwrap().is_none());
}

#[test]
fn partial_config_is_parsed() {
    let c = replying(
        r#"{"result":{"options":{"plugins":["p"],"presets":[]},"config":"/repo/babel.config.json"}}"#,
    );
    let partial = c.load_partial_config(&load()).unwrap().unwrap();
    assert_eq!(partial.options.plugins[0].name(), Some("p"));
    assert_eq!(partial.config.as_deref(), Some("/repo/babel.config.json"));
    assert!(partial.babelrc.is_none());
}

#[test]
fn bridge_plugin_shapes_survive_load() {
    let c = replying(
        r#"{"result":{"options":{"plugins":["/n/a.js",["/n/b.js",{},"second-b"],{"bjx:inline":0,"name":null,"dirname":"/repo","options":null}],"presets":[]}}}"#,
    );
    let partial = c.load_partial_config(&load()).unwrap().unwrap();
    let plugins = &partial.options.plugins;
    assert_eq!(plugins.len(), 3);
    assert_eq!(plugins[1].unique_name(), Some("second-b"));
    assert_eq!(plugins[2].name(), None);

    // the placeholder goes back to the bridge untouched
    let back = serde_json::to_value(&partial.options).unwrap();
    assert_eq!(back["plugins"][2]["bjx:inline"], 0);
    assert_eq!(back["plugins"][2]["dirname"], "/repo");
    assert_eq!(back["plugins"][1], json!(["/n/b.js", {}, "second-b"]));
}

#[test]
fn transform_result_is_parsed() {
    let c = replying(r#"{"result":{"code":"var x = 1;","map":{"version":3}}}"#);
    let out = c
        .transform("const x = 1;", &CompilerOptions::default())
        .unwrap()
        .unwrap();
    assert_eq!(out.code.as_deref(), Some("var x = 1;"));
    assert_eq!(out.map, Some(json!({"version": 3})));
}

#[test]
fn non_string_code_is_treated_as_absent() {
    let c = replying(r#"{"result":{"code":null,"map":null}}"#);
    let out = c
        .transform("x", &CompilerOptions::default())
        .unwrap()
        .unwrap();
    assert!(out.code.is_none());
    assert!(out.map.is_none());
}

#[test]
fn error_response_propagates_message() {
    let c = replying(r#"{"error":"Unknown plugin \"nope\""}"#);
    let err = c.load_partial_config(&load()).unwrap_err();
    assert!(err.to_string().contains("Unknown plugin"), "{err}");
}

#[test]
fn failing_process_reports_stderr() {
    let c = CommandCompiler::new("sh", ["-c", "cat > /dev/null; echo boom >&2; exit 3"]);
    let err = c
        .transform("x", &CompilerOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("boom"), "{err}");
}

#[test]
fn early_exit_on_large_input_still_reports_stderr() {
    // exits without reading, so writing 4 MiB hits a closed pipe
    let c = CommandCompiler::new(
        "sh",
        ["-c", "echo 'Cannot find module @babel/core' >&2; exit 1"],
    );
    let src = "x".repeat(4 << 20);
    let err = c
        .transform(&src, &CompilerOptions::default())
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Cannot find module"), "{err:#}");
    assert!(msg.contains("exited with"), "{err:#}");
}

#[test]
fn missing_program_is_an_error() {
    let c = CommandCompiler::new("definitely-not-a-real-compiler-binary", Vec::<String>::new());
    assert!(c.load_partial_config(&load()).is_err());
}

#[test]
fn compiler_errors_pass_through_transformer() {
    let c = replying(r#"{"error":"syntax error"}"#);
    let t = create_transformer(Arc::new(c), None).with_env(EnvContext::default());
    let project = ProjectConfig {
        cwd: "/repo".into(),
        root_dir: "/repo".into(),
    };
    let err = t.process("x", "/repo/a.js", &project, None).unwrap_err();
    assert!(matches!(err, TransformError::Compiler(_)));
    assert_eq!(err.to_string(), "syntax error");
}

#[test]
fn transformer_falls_back_when_command_returns_no_code() {
    // same script answers both calls: a partial config for the load and,
    // read as a transform result, an object without code
    let c = replying(r#"{"result":{"options":{"plugins":[]}}}"#);
    let t = create_transformer(Arc::new(c), None).with_env(EnvContext::default());
    let project = ProjectConfig {
        cwd: "/repo".into(),
        root_dir: "/repo".into(),
    };
    let out = t.process("const x = 1;", "/repo/a.js", &project, None).unwrap();
    assert_eq!(out, ProcessOutput::Unchanged("const x = 1;".into()));
}
