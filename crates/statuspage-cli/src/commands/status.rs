use crate::cli::DocumentArgs;
use crate::support::{load_collection_or_exit, load_config_or_exit, print_json};
use serde_json::json;
use statuspage_core::{Section, aggregate};

pub fn run(document: DocumentArgs, json_output: bool) {
    let config = load_config_or_exit(&document);
    let collection = load_collection_or_exit(&config.data_path);
    let service_status = aggregate(collection.section(Section::Current));

    if json_output {
        let sections = collection
            .counts()
            .iter()
            .map(|(section, count)| (section.as_str().to_string(), json!(count)))
            .collect::<serde_json::Map<_, _>>();
        print_json(&json!({
            "action": "status",
            "dataPath": config.data_path.display().to_string(),
            "sections": sections,
            "serviceStatus": service_status
        }));
        return;
    }

    println!("statuspage status");
    println!("  Data: {}", config.data_path.display());
    for (section, count) in collection.counts() {
        println!("  {section}: {count}");
    }
    if service_status.is_empty() {
        println!("  All products operational");
    } else {
        println!("  Products:");
        for (product, status) in service_status.iter() {
            println!("    - {product}: {status}");
        }
    }
}
