//! # CLI Command Implementations

use crate::api::{self, AppState, ViewResponse};
use crate::config::AppConfig;
use menurank_core::{
    CategoryPath, EntryId, MenuRankError, PatchOutcome, Session, primitives::MAX_DOCUMENT_SIZE,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), MenuRankError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| MenuRankError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(MenuRankError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, MenuRankError> {
    let canonical = path.canonicalize().map_err(|e| {
        MenuRankError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(MenuRankError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent of an output path and require a directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, MenuRankError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        MenuRankError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(MenuRankError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| MenuRankError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// SHARED HELPERS
// =============================================================================

/// Read and parse an export file into a fresh session.
pub fn load_session(config: &AppConfig, file: &Path) -> Result<Session, MenuRankError> {
    let path = validate_file_path(file)?;
    validate_file_size(&path, MAX_DOCUMENT_SIZE as u64)?;

    let raw = std::fs::read_to_string(&path)
        .map_err(|e| MenuRankError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;

    let mut session = config.session();
    session.load(raw)?;
    Ok(session)
}

/// Split a comma-separated id list; blanks are ignored.
pub fn parse_order(order: &str) -> Vec<EntryId> {
    order
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(EntryId::from)
        .collect()
}

/// Reorder `category` in `file` and write the patched text to `output`.
pub fn run_reorder(
    config: &AppConfig,
    file: &Path,
    category: &str,
    order: &str,
    base: Option<i64>,
    output: &Path,
) -> Result<PatchOutcome, MenuRankError> {
    let mut config = config.clone();
    if let Some(base) = base {
        config.ledger.base = base;
    }

    let order = parse_order(order);
    if order.is_empty() {
        return Err(MenuRankError::InvalidOrder("order is empty".to_string()));
    }

    let mut session = load_session(&config, file)?;
    session.reorder(&CategoryPath::from(category), &order)?;
    let outcome = session.render()?;

    let output = validate_output_path(output)?;
    std::fs::write(&output, &outcome.text)
        .map_err(|e| MenuRankError::Io(format!("Cannot write '{}': {}", output.display(), e)))?;

    tracing::info!(
        applied = outcome.applied,
        skipped = outcome.skipped.len(),
        "Wrote {}",
        output.display()
    );
    Ok(outcome)
}

fn print_json(value: &impl serde::Serialize) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// CATEGORIES COMMAND
// =============================================================================

/// List categories with entry counts.
pub fn cmd_categories(config: &AppConfig, file: &Path, json_mode: bool) -> Result<(), MenuRankError> {
    let session = load_session(config, file)?;
    let document = session.document()?;

    if json_mode {
        let categories: Vec<api::CategoryJson> = document
            .categories()
            .iter()
            .map(|c| api::CategoryJson {
                path: c.to_string(),
                depth: c.depth(),
                entries: document.count_in(c),
            })
            .collect();
        print_json(&api::CategoriesResponse { categories });
        return Ok(());
    }

    println!("Categories in {}", file.display());
    println!("==========");
    for category in document.categories() {
        println!("{:>6}  {}", document.count_in(category), category);
    }
    println!();
    println!(
        "{} entries, {} categories",
        document.entries().len(),
        document.categories().len()
    );

    Ok(())
}

// =============================================================================
// VIEW COMMAND
// =============================================================================

/// Show one category in display order.
pub fn cmd_view(
    config: &AppConfig,
    file: &Path,
    category: &str,
    json_mode: bool,
) -> Result<(), MenuRankError> {
    let mut session = load_session(config, file)?;
    let category = CategoryPath::from(category);
    let view = session.select(category.clone())?;
    let response = ViewResponse::new(&category, &view);

    if json_mode {
        print_json(&response);
        return Ok(());
    }

    println!("{}", category);
    println!("==========");
    for (rank, row) in response.entries.iter().enumerate() {
        let marker = if row.declared { "" } else { " (undeclared)" };
        println!(
            "{:>4}. {:<12} {:>8}{}  {}",
            rank + 1,
            row.id,
            row.priority,
            marker,
            row.code.as_deref().unwrap_or("")
        );
    }

    Ok(())
}

// =============================================================================
// REORDER COMMAND
// =============================================================================

/// Reorder, patch and write; reports skipped edits.
pub fn cmd_reorder(
    config: &AppConfig,
    file: &Path,
    category: &str,
    order: &str,
    base: Option<i64>,
    output: &Path,
    json_mode: bool,
) -> Result<(), MenuRankError> {
    let outcome = run_reorder(config, file, category, order, base, output)?;

    if json_mode {
        let report = serde_json::json!({
            "output": output.to_string_lossy(),
            "applied": outcome.applied,
            "skipped": outcome.skipped,
            "generated_refreshed": outcome.generated_refreshed,
        });
        print_json(&report);
        return Ok(());
    }

    println!("Wrote {} ({} priorities changed)", output.display(), outcome.applied);
    for skipped in &outcome.skipped {
        println!(
            "  skipped {} in {}: {}",
            skipped.edit.entry, skipped.edit.path, skipped.reason
        );
    }

    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    config: &AppConfig,
    host: Option<String>,
    port: Option<u16>,
    file: Option<&Path>,
) -> Result<(), MenuRankError> {
    let session = match file {
        Some(file) => load_session(config, file)?,
        None => config.session(),
    };
    let state = AppState::from_config(config, session)?;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    println!("MenuRank Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Base:     {}", config.ledger.base);
    if let Some(file) = file {
        println!("  Document: {}", file.display());
    }
    println!();
    println!("Endpoints:");
    println!("  POST   /document         - Load an export document");
    println!("  GET    /categories       - List categories");
    println!("  POST   /ledger/view      - View a category");
    println!("  POST   /ledger/reorder   - Reorder a category");
    println!("  GET    /export/download  - Download updated_products.xml");
    println!("  POST   /publish          - Send priorities to the gateway");
    println!("  GET    /health           - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state).await
}
