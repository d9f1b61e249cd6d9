use crate::cli::DocumentArgs;
use crate::lock::DocumentLock;
use crate::support::{exit_with_error, load_config_or_exit, print_json};
use serde_json::json;
use statuspage_core::{assign_missing_ids, load_raw_from_path, save_raw_to_path};

pub fn run(document: DocumentArgs, dry_run: bool, json_output: bool) {
    let config = load_config_or_exit(&document);
    let path = config.data_path;
    if !path.exists() {
        exit_with_error(format!("status document not found: {}", path.display()));
    }

    let _lock = DocumentLock::acquire(&path).unwrap_or_else(|e| exit_with_error(e));
    let mut raw = load_raw_from_path(&path)
        .unwrap_or_else(|e| exit_with_error(format!("failed to load {}: {e}", path.display())));
    let assigned = assign_missing_ids(&mut raw).unwrap_or_else(|e| exit_with_error(e));

    let written = !dry_run && !assigned.is_empty();
    if written {
        save_raw_to_path(&raw, &path).unwrap_or_else(|e| exit_with_error(e));
    }

    if json_output {
        print_json(&json!({
            "action": "add-ids",
            "dataPath": path.display().to_string(),
            "dryRun": dry_run,
            "written": written,
            "assigned": assigned
        }));
        return;
    }

    println!("statuspage add-ids");
    println!("  Data: {}", path.display());
    if assigned.is_empty() {
        println!("  Every event already has an id");
        return;
    }
    for entry in &assigned {
        println!("  {} -> {} ({})", entry.title, entry.id, entry.section);
    }
    if dry_run {
        println!("  Dry run: document not written");
    }
}
