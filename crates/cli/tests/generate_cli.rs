//! Integration tests for `tfl-opgen generate`.
//!
//! Each test lays out its inputs in a temporary directory and drives the CLI
//! entry point in-process.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const REGISTRY: &str = r#"
# subset of ops.pbtxt
op {
  name: "AddV2"
  input_arg { name: "x" type_attr: "T" }
  input_arg { name: "y" type_attr: "T" }
  output_arg { name: "z" type_attr: "T" }
  attr {
    name: "T"
    type: "type"
    allowed_values { list { type: DT_FLOAT type: DT_INT32 } }
  }
  is_commutative: true
}
op {
  name: "ConcatV2"
  input_arg { name: "values" type_attr: "T" number_attr: "N" }
  input_arg { name: "axis" type_attr: "Tidx" }
  output_arg { name: "output" type_attr: "T" }
  attr { name: "N" type: "int" has_minimum: true minimum: 2 }
  attr { name: "T" type: "type" }
  attr { name: "Tidx" type: "type" default_value { type: DT_INT32 } }
}
op {
  name: "LeakyRelu"
  input_arg { name: "features" type_attr: "T" }
  output_arg { name: "activations" type_attr: "T" }
  attr { name: "alpha" type: "float" default_value { f: 0.2 } }
  attr { name: "T" type: "type" default_value { type: DT_FLOAT } }
}
op {
  name: "_Retval"
  input_arg { name: "input" type_attr: "T" }
  attr { name: "T" type: "type" }
  attr { name: "index" type: "int" }
}
"#;

const REGISTRY_JSON: &str = r#"{
  "op": [
    {
      "name": "Unique",
      "inputArg": [{ "name": "x", "typeAttr": "T" }],
      "outputArg": [
        { "name": "y", "typeAttr": "T" },
        { "name": "idx", "typeAttr": "out_idx" }
      ],
      "attr": [
        { "name": "T", "type": "type" },
        { "name": "out_idx", "type": "type", "defaultValue": { "type": "DT_INT32" } }
      ]
    }
  ]
}"#;

fn run(args: &[&str]) -> i32 {
    let mut argv = vec!["tfl-opgen".to_string(), "generate".to_string()];
    argv.extend(args.iter().map(|a| (*a).to_string()));
    tfl_opgen_cli::run(argv)
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_generates_module_from_pbtxt() {
    let dir = TempDir::new().unwrap();
    let registry = write(dir.path(), "ops.pbtxt", REGISTRY);
    let output = dir.path().join("lua").join("tfl").join("raw_ops.lua");

    let code = run(&[
        "--registry",
        path_arg(&registry),
        "--output",
        path_arg(&output),
    ]);
    assert_eq!(code, 0);

    let lua = fs::read_to_string(&output).unwrap();
    assert!(lua.starts_with("--- TensorFlow raw_ops mappings\nlocal M = {}\n"));
    assert!(lua.contains("function M.add_v2(x, y)\n"));
    assert!(lua.contains("function M.concat_v2(values, axis, Tidx)\n"));
    assert!(lua.contains("\top:setAttrInt(\"N\", #values)\n"));
    assert!(lua.contains("function M.leaky_relu(features, alpha)\n"));
    assert!(lua.contains("\tif alpha == nil then alpha = 2.0000e-01 end\n"));
    assert!(!lua.contains("_Retval"));
    assert!(lua.ends_with("\nreturn M\n"));
}

#[test]
fn test_names_file_and_docs_directory() {
    let dir = TempDir::new().unwrap();
    let registry = write(dir.path(), "ops.pbtxt", REGISTRY);
    let names = write(
        dir.path(),
        "raw_ops.txt",
        "# reflected from tf.raw_ops\nLeakyRelu\nAddV2\n_Retval\n",
    );
    write(
        dir.path(),
        "docs/AddV2.txt",
        "Returns x + y element-wise.\n\n  Args:\n    x: A `Tensor`.\n    y: A `Tensor`. Must have the same type as `x`.\n\n  Returns:\n    A `Tensor`. Has the same type as `x`.\n",
    );
    write(dir.path(), "docs/notes.md", "ignored");
    let output = dir.path().join("raw_ops.lua");

    let code = run(&[
        "--registry",
        path_arg(&registry),
        "--names",
        path_arg(&names),
        "--docs",
        path_arg(&dir.path().join("docs")),
        "--output",
        path_arg(&output),
    ]);
    assert_eq!(code, 0);

    let lua = fs::read_to_string(&output).unwrap();
    assert!(lua.contains(
        "--- Returns x + y element-wise.\n\
         ---@param x tfl.Tensor @A `Tensor`.\n\
         ---@param y tfl.Tensor @A `Tensor`. Must have the same type as `x`.\n\
         ---@return tfl.Tensor @ A `Tensor`. Has the same type as `x`.\n\
         function M.add_v2(x, y)\n"
    ));
    assert!(!lua.contains("concat_v2"));
    assert!(lua.find("M.add_v2").unwrap() < lua.find("M.leaky_relu").unwrap());
}

#[test]
fn test_json_registry_with_yaml_docs() {
    let dir = TempDir::new().unwrap();
    let registry = write(dir.path(), "ops.json", REGISTRY_JSON);
    let docs = write(
        dir.path(),
        "docs.yaml",
        "Unique: |\n  Finds unique elements in a 1-D tensor.\n  Returns:\n    A tuple of `Tensor` objects (y, idx).\n",
    );
    let output = dir.path().join("raw_ops.lua");

    let code = run(&[
        "--registry",
        path_arg(&registry),
        "--docs",
        path_arg(&docs),
        "--output",
        path_arg(&output),
    ]);
    assert_eq!(code, 0);

    let lua = fs::read_to_string(&output).unwrap();
    assert!(lua.contains("--- Finds unique elements in a 1-D tensor.\n"));
    assert!(lua.contains("---@return tfl.Tensor[] @ A tuple of `Tensor` objects (y, idx).\n"));
    assert!(lua.contains("\tif out_idx == nil then out_idx = 3 end\n"));
    assert!(lua.contains("\treturn wrap_result_list(op:execute())\n"));
}

#[test]
fn test_config_file_with_cli_override() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "ops.pbtxt", REGISTRY);
    write(dir.path(), "names.txt", "AddV2\n");
    let config = write(
        dir.path(),
        "tfl-opgen.toml",
        "registry = \"ops.pbtxt\"\nnames = \"names.txt\"\noutput = \"from_config.lua\"\n",
    );
    let output = dir.path().join("override.lua");

    let code = run(&[
        "--config",
        path_arg(&config),
        "--output",
        path_arg(&output),
    ]);
    assert_eq!(code, 0);
    assert!(output.exists());
    assert!(!dir.path().join("from_config.lua").exists());
    let lua = fs::read_to_string(&output).unwrap();
    assert!(lua.contains("function M.add_v2(x, y)\n"));
    assert!(!lua.contains("leaky_relu"));
}

#[test]
fn test_check_mode() {
    let dir = TempDir::new().unwrap();
    let registry = write(dir.path(), "ops.pbtxt", REGISTRY);
    let output = dir.path().join("raw_ops.lua");
    let base = ["--registry", path_arg(&registry), "--output", path_arg(&output)];

    // nothing to compare against yet
    let mut check = base.to_vec();
    check.push("--check");
    assert_eq!(run(&check), 1);
    assert!(!output.exists());

    assert_eq!(run(&base), 0);
    assert_eq!(run(&check), 0);

    fs::write(&output, "-- stale\n").unwrap();
    assert_eq!(run(&check), 1);
    assert_eq!(fs::read_to_string(&output).unwrap(), "-- stale\n");
}

#[test]
fn test_regeneration_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let registry = write(dir.path(), "ops.pbtxt", REGISTRY);
    let first = dir.path().join("first.lua");
    let second = dir.path().join("second.lua");

    assert_eq!(run(&["--registry", path_arg(&registry), "-o", path_arg(&first)]), 0);
    assert_eq!(run(&["--registry", path_arg(&registry), "-o", path_arg(&second)]), 0);
    assert_eq!(
        fs::read(&first).unwrap(),
        fs::read(&second).unwrap()
    );
}

#[test]
fn test_unresolved_name_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let registry = write(dir.path(), "ops.pbtxt", REGISTRY);
    let names = write(dir.path(), "names.txt", "AddV2\nSub\n");
    let output = dir.path().join("raw_ops.lua");

    let code = run(&[
        "--registry",
        path_arg(&registry),
        "--names",
        path_arg(&names),
        "--output",
        path_arg(&output),
    ]);
    assert_eq!(code, 1);
    assert!(!output.exists());
}

#[test]
fn test_unsupported_attribute_kind_fails() {
    let dir = TempDir::new().unwrap();
    let registry = write(
        dir.path(),
        "ops.pbtxt",
        "op { name: \"Bad\" attr { name: \"values\" type: \"list(tensor)\" } }",
    );
    let output = dir.path().join("raw_ops.lua");

    let code = run(&["--registry", path_arg(&registry), "--output", path_arg(&output)]);
    assert_eq!(code, 1);
    assert!(!output.exists());
}

#[test]
fn test_malformed_registry_fails() {
    let dir = TempDir::new().unwrap();
    let registry = write(dir.path(), "ops.pbtxt", "op { name: \"AddV2\"");
    let output = dir.path().join("raw_ops.lua");

    let code = run(&["--registry", path_arg(&registry), "--output", path_arg(&output)]);
    assert_eq!(code, 1);
}

#[test]
fn test_missing_output_setting_fails() {
    let dir = TempDir::new().unwrap();
    let registry = write(dir.path(), "ops.pbtxt", REGISTRY);
    assert_eq!(run(&["--registry", path_arg(&registry)]), 1);
}
