use crate::cli::DocumentArgs;
use crate::support::{exit_with_error, load_collection_or_exit, load_config_or_exit, print_json};
use chrono::Utc;
use serde_json::json;
use statuspage_core::{Publication, Section, aggregate};
use std::path::PathBuf;

pub struct Args {
    pub document: DocumentArgs,
    pub out: Option<String>,
    pub dev: bool,
    pub feed_url: Option<String>,
    pub json: bool,
}

pub fn run(args: Args) {
    let mut config = load_config_or_exit(&args.document);
    if let Some(out) = args.out {
        config.out_dir = PathBuf::from(out);
    }
    if let Some(feed_url) = args.feed_url {
        config.feed_url = feed_url;
    }
    config.dev |= args.dev;

    let collection = load_collection_or_exit(&config.data_path);
    let now = Utc::now();
    let publication =
        Publication::build(&collection, &config, now).unwrap_or_else(|e| exit_with_error(e));
    let written = publication
        .write_to(&config.out_dir)
        .unwrap_or_else(|e| exit_with_error(e));

    let service_status = aggregate(collection.section(Section::Current));
    let affected = service_status.affected().count();

    if args.json {
        print_json(&json!({
            "action": "generate",
            "dataPath": config.data_path.display().to_string(),
            "outDir": config.out_dir.display().to_string(),
            "dev": config.dev,
            "feedUrl": config.feed_url,
            "written": written
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>(),
            "events": collection.len(),
            "affectedProducts": affected
        }));
    } else {
        println!("statuspage generate");
        println!("  Data: {}", config.data_path.display());
        println!("  Events: {}", collection.len());
        println!("  Affected products: {affected}");
        for path in &written {
            println!("  Wrote: {}", path.display());
        }
    }
}
