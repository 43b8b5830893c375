//! Integration tests for md2nb conversion

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::{TempDir, tempdir};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Command for the md2nb binary, run from a scratch directory so no
/// stray `_md2nb.toml` is picked up
fn md2nb(cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_md2nb"));
    cmd.current_dir(cwd).env_remove("RUST_LOG");
    cmd
}

/// Run md2nb on a fixture file and return the written notebook
fn convert_fixture(name: &str, args: &[&str]) -> String {
    let dir = tempdir().unwrap();
    let input = fixtures_dir().join(format!("{}.md", name));
    let output = dir.path().join(format!("{}.ipynb", name));

    let status = md2nb(dir.path())
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .args(args)
        .status()
        .expect("Failed to run md2nb");
    assert!(status.success(), "md2nb failed with status: {}", status);

    fs::read_to_string(&output).expect("Failed to read output file")
}

fn run_with_stdin(dir: &TempDir, args: &[&str], stdin: &[u8]) -> Output {
    let mut child = md2nb(dir.path())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to run md2nb");
    child.stdin.take().unwrap().write_all(stdin).unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn test_simple_conversion() {
    let output = convert_fixture("simple", &["-q"]);
    insta::assert_snapshot!(output, @r###"
    {
      "cells": [
        {
          "cell_type": "markdown",
          "metadata": {},
          "source": [
            "Preamble before any heading.\n",
            "\n"
          ]
        },
        {
          "cell_type": "markdown",
          "metadata": {},
          "source": [
            "# Introduction\n",
            "Some text.\n",
            "\n",
            "## Details\n",
            "More text.\n"
          ]
        },
        {
          "cell_type": "markdown",
          "metadata": {},
          "source": [
            "# Usage\n",
            "Run it.\n"
          ]
        }
      ],
      "metadata": {},
      "nbformat": 4,
      "nbformat_minor": 4
    }
    "###);
}

#[test]
fn test_non_ascii_conversion() {
    let output = convert_fixture("chinese", &["-q"]);
    insta::assert_snapshot!(output, @r##"
    {
      "cells": [
        {
          "cell_type": "markdown",
          "metadata": {},
          "source": [
            "# 简介\n",
            "这是一个示例文档。\n",
            "\n"
          ]
        },
        {
          "cell_type": "markdown",
          "metadata": {},
          "source": [
            "# 安装\n",
            "pip install notebook\n"
          ]
        }
      ],
      "metadata": {},
      "nbformat": 4,
      "nbformat_minor": 4
    }
    "##);
}

#[test]
fn test_no_heading_is_one_cell() {
    let output = convert_fixture("no_heading", &["-q"]);
    let notebook: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(
        notebook["cells"][0]["source"],
        serde_json::json!(["just a paragraph\n", "with two lines\n"])
    );
    assert_eq!(notebook["cells"].as_array().unwrap().len(), 1);
}

#[test]
fn test_default_output_path() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("notes.md");
    fs::copy(fixtures_dir().join("simple.md"), &input).unwrap();

    let output = md2nb(dir.path()).arg(&input).output().unwrap();
    assert!(output.status.success());

    let expected = dir.path().join("notes.ipynb");
    assert!(expected.exists());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap().trim_end(),
        expected.display().to_string()
    );
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("(3 cells)"), "stderr: {}", stderr);
}

#[test]
fn test_crlf_terminators_preserved() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("crlf.md");
    fs::write(&input, "# A\r\nbody\r\n# B\r\n").unwrap();

    let status = md2nb(dir.path()).arg(&input).arg("-q").status().unwrap();
    assert!(status.success());

    let content = fs::read_to_string(dir.path().join("crlf.ipynb")).unwrap();
    let notebook: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(
        notebook["cells"],
        serde_json::json!([
            {"cell_type": "markdown", "metadata": {}, "source": ["# A\r\n", "body\r\n"]},
            {"cell_type": "markdown", "metadata": {}, "source": ["# B\r\n"]}
        ])
    );
}

#[test]
fn test_stdin_to_stdout() {
    let dir = tempdir().unwrap();
    let output = run_with_stdin(&dir, &[], b"# A\n# B\ntext\n");
    assert!(output.status.success());

    let notebook: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        notebook["cells"][0]["source"],
        serde_json::json!(["# A\n"])
    );
    assert_eq!(
        notebook["cells"][1]["source"],
        serde_json::json!(["# B\n", "text\n"])
    );
}

#[test]
fn test_empty_stdin() {
    let dir = tempdir().unwrap();
    let output = run_with_stdin(&dir, &["-"], b"");
    assert!(output.status.success());
    insta::assert_snapshot!(String::from_utf8(output.stdout).unwrap(), @r#"
    {
      "cells": [],
      "metadata": {},
      "nbformat": 4,
      "nbformat_minor": 4
    }
    "#);
}

#[test]
fn test_stdin_to_file() {
    let dir = tempdir().unwrap();
    let output = run_with_stdin(&dir, &["-o", "out/piped.ipynb", "-q"], b"hello\n");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(dir.path().join("out/piped.ipynb").exists());
}

#[test]
fn test_invalid_utf8_input() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("latin1.md");
    fs::write(&input, b"# Caf\xE9\n").unwrap();

    let output = md2nb(dir.path()).arg(&input).output().unwrap();
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("is not valid UTF-8 text"), "stderr: {}", stderr);
    assert!(!dir.path().join("latin1.ipynb").exists());
}

#[test]
fn test_missing_input() {
    let dir = tempdir().unwrap();
    let output = md2nb(dir.path()).arg("missing.md").output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Input path does not exist: missing.md"));
}

#[test]
fn test_directory_conversion() {
    let dir = tempdir().unwrap();
    let output_dir = dir.path().join("notebooks");

    let status = md2nb(dir.path())
        .arg(fixtures_dir())
        .arg("-o")
        .arg(&output_dir)
        .arg("-q")
        .status()
        .expect("Failed to run md2nb");
    assert!(status.success(), "md2nb directory conversion failed");

    let mut files: Vec<_> = fs::read_dir(&output_dir)
        .expect("Failed to read output dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    files.sort();

    assert_eq!(
        files,
        vec!["chinese.ipynb", "no_heading.ipynb", "simple.ipynb"]
    );
}

#[test]
fn test_directory_with_failure() {
    let dir = tempdir().unwrap();
    let input_dir = dir.path().join("docs");
    fs::create_dir(&input_dir).unwrap();
    fs::write(input_dir.join("good.md"), "# Good\n").unwrap();
    fs::write(input_dir.join("bad.md"), b"\xFF").unwrap();

    let output = md2nb(dir.path()).arg(&input_dir).output().unwrap();
    assert!(!output.status.success());
    assert!(input_dir.join("good.ipynb").exists());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Converted 1 files, 1 failed"), "stderr: {}", stderr);
    assert!(stderr.contains("1 files failed to convert"));
}

#[test]
fn test_output_equal_to_input_is_refused() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.md"), "# Notes\n").unwrap();

    let output = md2nb(dir.path())
        .args(["./notes.md", "-o", "notes.md"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(
        stderr.contains("Output would overwrite the input file"),
        "stderr: {}",
        stderr
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("notes.md")).unwrap(),
        "# Notes\n"
    );
}

#[test]
fn test_directory_output_extension_matching_input() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("_md2nb.toml"),
        "[output]\nextension = \"md\"\n",
    )
    .unwrap();
    let docs = dir.path().join("docs");
    fs::create_dir(&docs).unwrap();
    fs::write(docs.join("notes.md"), "# Notes\n").unwrap();

    let output = md2nb(dir.path()).arg("docs").output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Converted 0 files, 1 failed"), "stderr: {}", stderr);
    assert_eq!(fs::read_to_string(docs.join("notes.md")).unwrap(), "# Notes\n");
}

#[test]
fn test_config_file_settings() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("_md2nb.toml"),
        "[input]\nextensions = [\"markdown\"]\nrecursive = true\n\n[output]\nextension = \"json\"\n",
    )
    .unwrap();
    let docs = dir.path().join("docs");
    fs::create_dir_all(docs.join("nested")).unwrap();
    fs::write(docs.join("nested/page.markdown"), "# Page\n").unwrap();
    fs::write(docs.join("skipped.md"), "# Skipped\n").unwrap();

    let status = md2nb(dir.path()).arg("docs").arg("-q").status().unwrap();
    assert!(status.success());

    assert!(docs.join("nested/page.json").exists());
    assert!(!docs.join("skipped.json").exists());
}

#[test]
fn test_invalid_config_file() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    fs::write(&config, "[output]\nextension = \".ipynb\"\n").unwrap();
    fs::write(dir.path().join("doc.md"), "text\n").unwrap();

    let output = md2nb(dir.path())
        .arg("doc.md")
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Invalid config file"), "stderr: {}", stderr);
}

#[test]
fn test_init_config() {
    let dir = tempdir().unwrap();

    let status = md2nb(dir.path()).arg("init").status().unwrap();
    assert!(status.success(), "md2nb init failed");

    let content = fs::read_to_string(dir.path().join("_md2nb.toml")).unwrap();
    assert!(content.starts_with("#:schema ./md2nb.schema.json\n"));
    assert!(content.contains("[input]"));
    assert!(content.contains("extension = \"ipynb\""));

    // A second run refuses to overwrite without --force
    let output = md2nb(dir.path()).arg("init").output().unwrap();
    assert!(!output.status.success());
    let status = md2nb(dir.path()).args(["init", "--force"]).status().unwrap();
    assert!(status.success());
}

#[test]
fn test_init_schema() {
    let dir = tempdir().unwrap();
    let output = md2nb(dir.path())
        .args(["init", "--schema"])
        .output()
        .unwrap();
    assert!(output.status.success(), "md2nb init --schema failed");

    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(schema["title"], "Config");
    assert!(!dir.path().join("_md2nb.toml").exists());
}
