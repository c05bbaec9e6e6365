//! File round-trips through the CLI command layer.

#![allow(clippy::unwrap_used, clippy::panic)]

use clap::Parser;
use menurank::cli::{Cli, Commands, load_session, parse_order, run_reorder};
use menurank::config::AppConfig;
use menurank_core::{CategoryPath, EntryId, MenuRankError};
use std::fs;

const OFFER: &str = include_str!("../../../crates/menurank-core/tests/fixtures/offer.xml");
const ZIMOWE: &str = "SKLEP\\Kurtki\\Zimowe";

fn write_offer(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("products_export.xml");
    fs::write(&path, OFFER).unwrap();
    path
}

#[test]
fn parse_order_trims_and_skips_blanks() {
    assert_eq!(
        parse_order(" 1, 3,,2 "),
        vec![EntryId::from("1"), EntryId::from("3"), EntryId::from("2")]
    );
    assert!(parse_order(" , ").is_empty());
}

#[test]
fn load_session_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_offer(&dir);

    let session = load_session(&AppConfig::default(), &path).unwrap();
    let document = session.document().unwrap();
    assert_eq!(document.entries().len(), 3);
    assert!(document.has_category(&CategoryPath::from(ZIMOWE)));
}

#[test]
fn load_session_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_session(&AppConfig::default(), &dir.path().join("absent.xml")).unwrap_err();
    assert!(matches!(err, MenuRankError::Io(_)));
}

#[test]
fn load_session_rejects_directory() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_session(&AppConfig::default(), dir.path()).unwrap_err();
    assert!(matches!(err, MenuRankError::Io(_)));
}

#[test]
fn reorder_writes_patched_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_offer(&dir);
    let output = dir.path().join("updated_products.xml");

    let outcome = run_reorder(
        &AppConfig::default(),
        &input,
        ZIMOWE,
        "5235,5180,77",
        Some(30),
        &output,
    )
    .unwrap();

    assert_eq!(outcome.applied, 3);
    assert!(outcome.is_complete());

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written, outcome.text);
    assert!(written.contains(r#"textid="SKLEP\Kurtki\Zimowe" iaiext:priority_menu="30""#));
    assert!(written.contains(r#"textid="SKLEP\Kurtki\Zimowe" iaiext:priority_menu="29""#));
    assert!(written.contains(r#"textId="SKLEP\Kurtki\Zimowe" level='28'"#));

    // Input untouched.
    assert_eq!(fs::read_to_string(&input).unwrap(), OFFER);

    // The written file loads back with the new order.
    let mut session = load_session(&AppConfig::default(), &output).unwrap();
    let view: Vec<String> = session
        .select(CategoryPath::from(ZIMOWE))
        .unwrap()
        .iter()
        .map(|e| e.id.to_string())
        .collect();
    assert_eq!(view, vec!["5235", "5180", "77"]);
}

#[test]
fn reorder_empty_order_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_offer(&dir);
    let output = dir.path().join("out.xml");

    let err = run_reorder(&AppConfig::default(), &input, ZIMOWE, " , ", None, &output).unwrap_err();
    assert!(matches!(err, MenuRankError::InvalidOrder(_)));
    assert!(!output.exists());
}

#[test]
fn reorder_unknown_entry_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_offer(&dir);
    let output = dir.path().join("out.xml");

    let err = run_reorder(&AppConfig::default(), &input, ZIMOWE, "9001", None, &output).unwrap_err();
    assert!(matches!(err, MenuRankError::UnknownEntry(_, _)));
    assert!(!output.exists());
}

#[test]
fn reorder_into_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_offer(&dir);
    let output = dir.path().join("nope").join("out.xml");

    let err = run_reorder(&AppConfig::default(), &input, ZIMOWE, "77", None, &output).unwrap_err();
    assert!(matches!(err, MenuRankError::Io(_)));
}

#[test]
fn cli_parses_reorder() {
    let cli = Cli::try_parse_from([
        "menurank",
        "--quiet",
        "reorder",
        "-f",
        "in.xml",
        "-c",
        ZIMOWE,
        "--order",
        "1,2",
    ])
    .unwrap();

    assert!(cli.quiet);
    match cli.command {
        Commands::Reorder { base, output, order, .. } => {
            assert!(base.is_none());
            assert_eq!(order, "1,2");
            assert_eq!(output.to_string_lossy(), "updated_products.xml");
        }
        other => panic!("unexpected command {other:?}"),
    }
}
