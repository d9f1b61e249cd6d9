use crate::cli::{DocumentArgs, IncidentArgs};
use crate::lock::{LockedMutationError, mutate_document};
use serde::Serialize;
use statuspage_core::{
    Authorization, EventCollection, PublishConfig, ShapeFields, load_from_path,
};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_CONFIG_PATH: &str = "statuspage.toml";
/// Editor recorded when neither `--editor` nor `$USER` names one.
const FALLBACK_EDITOR: &str = "statuspage";

pub fn exit_with_error(message: impl Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

/// Config from `--config`, else `./statuspage.toml` when present, else
/// defaults. `--data` overrides the configured document path.
pub fn load_config_or_exit(args: &DocumentArgs) -> PublishConfig {
    let mut config = match resolve_config_path(args.config.as_deref()) {
        Some(path) => PublishConfig::from_path(&path).unwrap_or_else(|e| exit_with_error(e)),
        None => PublishConfig::default(),
    };
    if let Some(data) = &args.data {
        config.data_path = PathBuf::from(data);
    }
    config
}

fn resolve_config_path(requested: Option<&str>) -> Option<PathBuf> {
    match requested {
        Some(path) => Some(PathBuf::from(path)),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            default.is_file().then_some(default)
        }
    }
}

pub fn load_collection_or_exit(path: &Path) -> EventCollection {
    if !path.exists() {
        exit_with_error(format!(
            "status document not found: {} (run `statuspage init`)",
            path.display()
        ));
    }
    load_from_path(path)
        .unwrap_or_else(|e| exit_with_error(format!("failed to load {}: {e}", path.display())))
}

/// Lock, load, mutate and save the document, exiting on any failure.
pub fn mutate_document_or_exit<T, E, F>(path: &Path, mutator: F) -> T
where
    E: Display,
    F: FnOnce(&mut EventCollection) -> Result<(T, bool), E>,
{
    if !path.exists() {
        exit_with_error(format!(
            "status document not found: {} (run `statuspage init`)",
            path.display()
        ));
    }
    mutate_document(path, mutator).unwrap_or_else(|e: LockedMutationError<E>| exit_with_error(e))
}

/// Decide whether `editor` may mutate the document.
///
/// With an `editors` allow-list in config the editor must be on it.
/// Without one, the local user is trusted.
pub fn authorize(config: &PublishConfig, editor: Option<String>) -> Authorization {
    let editor = editor
        .or_else(|| std::env::var("USER").ok())
        .filter(|e| !e.trim().is_empty());

    if config.editors.is_empty() {
        Authorization::granted(editor.unwrap_or_else(|| FALLBACK_EDITOR.to_string()))
    } else {
        Authorization::from_allow_list(editor.as_deref(), &config.editors)
    }
}

/// Editor name for a granted mutation; exits when denied.
pub fn require_editor_or_exit(authorization: &Authorization) -> String {
    match authorization {
        Authorization::Granted { editor } => editor.clone(),
        Authorization::Denied { reason } => exit_with_error(format!("unauthorized: {reason}")),
    }
}

pub fn parse_or_exit<T>(label: &str, value: &str) -> T
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .unwrap_or_else(|e| exit_with_error(format!("invalid {label} `{value}`: {e}")))
}

pub fn shape_fields(args: IncidentArgs) -> ShapeFields {
    ShapeFields {
        system_status: args.system_status,
        user_impact: args.user_impact,
        start: args.start,
        closed: args.closed,
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => exit_with_error(format!("failed to render JSON: {e}")),
    }
}

pub fn yes_no(ok: bool) -> &'static str {
    if ok { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allow_list_trusts_named_editor() {
        let config = PublishConfig::default();
        assert_eq!(
            authorize(&config, Some("alice".to_string())).editor(),
            Some("alice")
        );
    }

    #[test]
    fn allow_list_rejects_unknown_editor() {
        let config = PublishConfig {
            editors: vec!["alice".to_string()],
            ..PublishConfig::default()
        };
        assert!(matches!(
            authorize(&config, Some("mallory".to_string())),
            Authorization::Denied { .. }
        ));
        assert_eq!(
            authorize(&config, Some("alice".to_string())).editor(),
            Some("alice")
        );
    }

    #[test]
    fn data_flag_overrides_config() {
        let args = DocumentArgs {
            data: Some("elsewhere.yml".to_string()),
            config: None,
        };
        let config = load_config_or_exit(&args);
        assert_eq!(config.data_path, PathBuf::from("elsewhere.yml"));
    }
}
