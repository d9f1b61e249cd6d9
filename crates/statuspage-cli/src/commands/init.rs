use crate::support::{DEFAULT_CONFIG_PATH, exit_with_error, print_json, yes_no};
use serde_json::json;
use statuspage_core::{EventCollection, PublishConfig, save_to_path};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct InitOutcome {
    pub root: PathBuf,
    pub data_path: PathBuf,
    pub config_path: PathBuf,
    pub created_root: bool,
    pub created_data_file: bool,
    pub created_config_file: bool,
}

/// Create `root` with an empty status document and a default config.
///
/// Existing files are left untouched.
pub fn init_layout(path: impl AsRef<Path>) -> Result<InitOutcome, String> {
    let root = path.as_ref().to_path_buf();

    let mut created_root = false;
    if !root.exists() {
        fs::create_dir_all(&root)
            .map_err(|e| format!("failed to create init path {}: {e}", root.display()))?;
        created_root = true;
    }
    if !root.is_dir() {
        return Err(format!("init path is not a directory: {}", root.display()));
    }

    let config = PublishConfig::default();
    let data_path = root.join(&config.data_path);
    if data_path.exists() && !data_path.is_file() {
        return Err(format!(
            "status document path exists but is not a file: {}",
            data_path.display()
        ));
    }
    let mut created_data_file = false;
    if !data_path.exists() {
        save_to_path(&EventCollection::new(), &data_path)
            .map_err(|e| format!("failed to initialize {}: {e}", data_path.display()))?;
        created_data_file = true;
    }

    let config_path = root.join(DEFAULT_CONFIG_PATH);
    let mut created_config_file = false;
    if !config_path.exists() {
        let text = config.to_toml_string().map_err(|e| e.to_string())?;
        fs::write(&config_path, text)
            .map_err(|e| format!("failed to write {}: {e}", config_path.display()))?;
        created_config_file = true;
    }

    Ok(InitOutcome {
        root,
        data_path,
        config_path,
        created_root,
        created_data_file,
        created_config_file,
    })
}

pub fn run(path: String, json_output: bool) {
    let outcome = init_layout(&path).unwrap_or_else(|e| exit_with_error(e));

    if json_output {
        print_json(&json!({
            "action": "init",
            "root": outcome.root.display().to_string(),
            "dataPath": outcome.data_path.display().to_string(),
            "configPath": outcome.config_path.display().to_string(),
            "createdRoot": outcome.created_root,
            "createdDataFile": outcome.created_data_file,
            "createdConfigFile": outcome.created_config_file
        }));
        return;
    }

    println!("statuspage init {path}");
    println!();
    println!("  root: {}", outcome.root.display());
    println!("  status document: {}", outcome.data_path.display());
    println!("  config: {}", outcome.config_path.display());
    println!("  created root: {}", yes_no(outcome.created_root));
    println!(
        "  created status document: {}",
        yes_no(outcome.created_data_file)
    );
    println!("  created config: {}", yes_no(outcome.created_config_file));
}
