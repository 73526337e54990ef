//! Integration tests for the blockdeck CLI
//!
//! Runs the built binary against presentations written to a temp directory.

use anyhow::Result;
use blockdeck::{extract_blocks, Bounds, Element, ElementKind, Presentation, TextBody};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

fn get_cli_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_blockdeck"))
}

fn setup_temp_dir() -> TempDir {
    tempdir().expect("Failed to create temp directory")
}

fn run_cli_command(args: &[&str]) -> Result<std::process::Output> {
    let output = Command::new(get_cli_path())
        .args(args)
        .env_remove("RUST_LOG")
        .output()?;
    Ok(output)
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// Single-slide block with a title token and an author token
fn write_block(dir: &Path) -> PathBuf {
    let mut block = Presentation::with_blank_slide().unwrap();
    let slide = block.slide_mut(0).unwrap();
    slide.insert_element(Element::text_box(
        Bounds::from_inches(1.0, 1.0, 8.0, 1.0),
        TextBody::from_text("{{title.main}}"),
    ));
    slide.insert_element(Element::text_box(
        Bounds::from_inches(1.0, 2.5, 8.0, 1.0),
        TextBody::from_text("By {{text.author}}"),
    ));
    let path = dir.join("block.pptx");
    block.save_to_file(&path).unwrap();
    path
}

fn assert_pptx_exists_and_valid(path: &Path) -> Presentation {
    assert!(path.exists(), "File should exist: {}", path.display());
    let content = fs::read(path).expect("Failed to read output");
    assert!(content.starts_with(b"PK"), "Output should be a zip container");
    Presentation::open(&content).expect("Output should reopen")
}

#[test]
fn test_cli_new_command() {
    let temp_dir = setup_temp_dir();
    let output_path = temp_dir.path().join("deck.pptx");

    let output = run_cli_command(&["new", "-o", path_str(&output_path), "-s", "3"]).unwrap();

    assert!(output.status.success(), "Command should succeed");
    let deck = assert_pptx_exists_and_valid(&output_path);
    assert_eq!(deck.slide_count(), 3);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("with 3 slides"));
}

#[test]
fn test_cli_extract_descriptors_to_stdout() {
    let temp_dir = setup_temp_dir();
    let block = write_block(temp_dir.path());

    let output = run_cli_command(&["extract", path_str(&block)]).unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let keys: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["main", "author"]);
    assert_eq!(json[0]["type"], "text");
    assert_eq!(json[0]["tokens"][0]["rawText"], "{{title.main}}");
}

#[test]
fn test_cli_extract_fields_to_file() {
    let temp_dir = setup_temp_dir();
    let block = write_block(temp_dir.path());
    let fields_path = temp_dir.path().join("fields.json");

    let output = run_cli_command(&[
        "extract",
        path_str(&block),
        "--fields",
        "-o",
        path_str(&fields_path),
    ])
    .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&fields_path).unwrap()).unwrap();
    assert_eq!(json[1]["fieldKey"], "author");
    assert_eq!(json[1]["orderIndex"], 1);
    assert_eq!(json[1]["metadata"]["label"], "text");
}

#[test]
fn test_cli_compose_then_fill_from_values() {
    let temp_dir = setup_temp_dir();
    let block = write_block(temp_dir.path());
    let deck_path = temp_dir.path().join("deck.pptx");
    let composed = temp_dir.path().join("composed.pptx");
    let filled = temp_dir.path().join("filled.pptx");
    let values = temp_dir.path().join("values.json");

    assert!(run_cli_command(&["new", "-o", path_str(&deck_path)])
        .unwrap()
        .status
        .success());

    let output = run_cli_command(&[
        "compose",
        path_str(&deck_path),
        "-b",
        path_str(&block),
        "-o",
        path_str(&composed),
    ])
    .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Copied 2 elements"));
    let deck = assert_pptx_exists_and_valid(&composed);
    let tokens: Vec<String> = extract_blocks(&deck)
        .iter()
        .flat_map(|d| d.tokens.iter().map(|t| t.key()))
        .collect();
    assert_eq!(tokens, vec!["title.main", "text.author"]);

    fs::write(
        &values,
        r#"{"title.main": "Quarterly review", "author": "Finance"}"#,
    )
    .unwrap();
    let output = run_cli_command(&[
        "fill",
        path_str(&composed),
        "-v",
        path_str(&values),
        "-b",
        path_str(&block),
        "-o",
        path_str(&filled),
    ])
    .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let deck = assert_pptx_exists_and_valid(&filled);
    let texts: Vec<String> = deck.slide(0).unwrap().elements().iter().filter_map(|e| e.text()).collect();
    assert_eq!(texts, vec!["Quarterly review", "Finance"]);
}

#[test]
fn test_cli_fill_falls_back_to_replace() {
    let temp_dir = setup_temp_dir();
    let block = write_block(temp_dir.path());
    let placements = temp_dir.path().join("placements.json");
    let config = temp_dir.path().join("layout.json");
    let filled = temp_dir.path().join("filled.pptx");

    fs::write(
        &placements,
        r#"[{"text": "Replaced title", "orderIndex": 0, "key": "title.main"}]"#,
    )
    .unwrap();
    // margins wider than the slide
    fs::write(&config, r#"{"marginLeft": 6.0, "marginRight": 6.0}"#).unwrap();

    let output = run_cli_command(&[
        "fill",
        path_str(&block),
        "-v",
        path_str(&placements),
        "--layout-config",
        path_str(&config),
        "-o",
        path_str(&filled),
    ])
    .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("replacing tokens in place"));

    let deck = assert_pptx_exists_and_valid(&filled);
    let texts: Vec<String> = deck.slide(0).unwrap().elements().iter().filter_map(|e| e.text()).collect();
    assert_eq!(texts, vec!["Replaced title", "By {{text.author}}"]);
}

#[test]
fn test_cli_replace_command() {
    let temp_dir = setup_temp_dir();
    let block = write_block(temp_dir.path());
    let output_path = temp_dir.path().join("replaced.pptx");

    let output = run_cli_command(&[
        "replace",
        path_str(&block),
        "-o",
        path_str(&output_path),
        "--set",
        "text.author=Ada",
        "--set",
        "title.main=Report",
    ])
    .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Replaced 2 tokens in 2 elements"));

    let deck = assert_pptx_exists_and_valid(&output_path);
    let texts: Vec<String> = deck.slide(0).unwrap().elements().iter().filter_map(|e| e.text()).collect();
    assert_eq!(texts, vec!["Report", "By Ada"]);
}

#[test]
fn test_cli_replace_rejects_malformed_pair() {
    let temp_dir = setup_temp_dir();
    let block = write_block(temp_dir.path());
    let output_path = temp_dir.path().join("out.pptx");

    let output = run_cli_command(&[
        "replace",
        path_str(&block),
        "-o",
        path_str(&output_path),
        "--set",
        "novalue",
    ])
    .unwrap();
    assert!(!output.status.success());
    assert!(!output_path.exists());
}

#[test]
fn test_cli_preview_command() {
    let temp_dir = setup_temp_dir();
    let block = write_block(temp_dir.path());
    let png = temp_dir.path().join("slide.png");

    let output = run_cli_command(&[
        "preview",
        path_str(&block),
        "-o",
        path_str(&png),
        "--width",
        "400",
        "--height",
        "300",
    ])
    .unwrap();
    assert!(output.status.success());
    let bytes = fs::read(&png).unwrap();
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[test]
fn test_cli_slide_management() {
    let temp_dir = setup_temp_dir();
    let block = write_block(temp_dir.path());
    let cloned = temp_dir.path().join("cloned.pptx");
    let added = temp_dir.path().join("added.pptx");
    let deleted = temp_dir.path().join("deleted.pptx");

    let output = run_cli_command(&[
        "clone-slide",
        path_str(&block),
        "-n",
        "1",
        "-o",
        path_str(&cloned),
    ])
    .unwrap();
    assert!(output.status.success());
    let deck = assert_pptx_exists_and_valid(&cloned);
    assert_eq!(deck.slide_count(), 2);
    assert_eq!(
        deck.slide(1).unwrap().elements().iter().map(Element::kind).collect::<Vec<_>>(),
        vec![ElementKind::Text, ElementKind::Text]
    );

    let output = run_cli_command(&["add-slide", path_str(&cloned), "-o", path_str(&added)]).unwrap();
    assert!(output.status.success());
    assert_eq!(assert_pptx_exists_and_valid(&added).slide_count(), 3);

    let output = run_cli_command(&[
        "delete-slide",
        path_str(&added),
        "-n",
        "1",
        "-o",
        path_str(&deleted),
    ])
    .unwrap();
    assert!(output.status.success());
    assert_eq!(assert_pptx_exists_and_valid(&deleted).slide_count(), 2);
}

#[test]
fn test_cli_info_command() {
    let temp_dir = setup_temp_dir();
    let block = write_block(temp_dir.path());

    let output = run_cli_command(&["info", path_str(&block), "--detailed"]).unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Slide size: 10.00\" x 7.50\""));
    assert!(stdout.contains("Slides: 1"));
    assert!(stdout.contains("{{title.main}}"));
}

#[test]
fn test_cli_slide_zero_is_rejected() {
    let temp_dir = setup_temp_dir();
    let block = write_block(temp_dir.path());
    let output_path = temp_dir.path().join("out.pptx");

    let output = run_cli_command(&[
        "delete-slide",
        path_str(&block),
        "-n",
        "0",
        "-o",
        path_str(&output_path),
    ])
    .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Slide numbers start at 1"));
}

#[test]
fn test_cli_invalid_input_fails() {
    let temp_dir = setup_temp_dir();
    let bogus = temp_dir.path().join("bogus.pptx");
    fs::write(&bogus, b"not a zip").unwrap();

    let output = run_cli_command(&["info", path_str(&bogus)]).unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to open"));
}

#[test]
fn test_cli_help_lists_commands() {
    let output = run_cli_command(&["--help"]).unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["extract", "compose", "fill", "replace", "preview", "clone-slide"] {
        assert!(stdout.contains(command), "help should list {command}");
    }
}
