use crate::cli::{DocumentArgs, EventCommands, IncidentArgs};
use crate::support::{
    authorize, exit_with_error, load_collection_or_exit, load_config_or_exit,
    mutate_document_or_exit, parse_or_exit, print_json, require_editor_or_exit, shape_fields,
};
use chrono::Utc;
use serde_json::json;
use statuspage_core::{
    Event, EventDraft, EventForm, EventId, Section, SectionError, Update, add_update,
    apply_form, create_event, delete_event, move_section_with, timestamp,
};
use std::path::Path;

pub fn run(command: EventCommands) {
    match command {
        EventCommands::Show { id, document, json } => run_show(EventId(id), document, json),

        EventCommands::Add {
            title,
            section,
            body,
            products,
            incident,
            document,
            editor,
            json,
        } => run_add(
            title, section, body, products, incident, document, editor, json,
        ),

        EventCommands::Move {
            id,
            to,
            from,
            incident,
            document,
            editor,
            json,
        } => run_move(EventId(id), to, from, incident, document, editor, json),

        EventCommands::Edit {
            id,
            fields,
            document,
            editor,
            json,
        } => run_edit(EventId(id), fields, document, editor, json),

        EventCommands::Update {
            id,
            title,
            body,
            time,
            document,
            editor,
            json,
        } => run_update(EventId(id), title, body, time, document, editor, json),

        EventCommands::Delete {
            id,
            document,
            editor,
            json,
        } => run_delete(EventId(id), document, editor, json),
    }
}

fn run_show(id: EventId, document: DocumentArgs, json_output: bool) {
    let config = load_config_or_exit(&document);
    let collection = load_collection_or_exit(&config.data_path);
    let Some(section) = collection.section_of(id) else {
        exit_with_error(format!("event not found: {id}"));
    };
    let Some(event) = collection.event(id) else {
        exit_with_error(format!("event not found: {id}"));
    };

    if json_output {
        print_json(&json!({
            "action": "event.show",
            "section": section,
            "event": event
        }));
        return;
    }

    println!("statuspage event show {id}");
    print_event(section, event);
}

fn print_event(section: Section, event: &Event) {
    println!("  {} [{}] {}", event.id, event.status(), event.title);
    println!("  Section: {section}");
    if !event.products.is_empty() {
        println!("  Products: {}", event.products.join(", "));
    }
    if let Some(incident) = event.kind.incident() {
        println!("  System status: {}", incident.system_status);
        println!("  User impact: {}", incident.user_impact);
    }
    if let Some(start) = event.start() {
        println!("  Start: {start}");
    }
    if let Some(closed) = event.closed() {
        println!("  Closed: {closed}");
    }
    if !event.body.trim().is_empty() {
        println!();
        for line in event.body.trim_end().lines() {
            println!("    {line}");
        }
    }
    for update in &event.updates {
        println!();
        println!("  {} {}", update.time, update.title);
        for line in update.body.trim_end().lines() {
            println!("    {line}");
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_add(
    title: String,
    section: String,
    body: String,
    products: Vec<String>,
    incident: IncidentArgs,
    document: DocumentArgs,
    editor: Option<String>,
    json_output: bool,
) {
    let config = load_config_or_exit(&document);
    let editor = require_editor_or_exit(&authorize(&config, editor));
    let section: Section = parse_or_exit("section", &section);

    let mut fields = shape_fields(incident);
    if !section.is_info() && fields.start.is_none() {
        fields.start = Some(timestamp::format_stored(Utc::now()));
    }
    let draft = EventDraft {
        title,
        body,
        products,
        fields,
        updates: Vec::new(),
    };

    let path = config.data_path.as_path();
    let id = mutate_document_or_exit(path, |collection| {
        create_event(collection, section, draft).map(|id| (id, true))
    });
    tracing::info!(%id, %section, %editor, "added event");

    if json_output {
        print_json(&json!({
            "action": "event.add",
            "dataPath": path.display().to_string(),
            "id": id,
            "section": section,
            "editor": editor
        }));
    } else {
        println!(
            "statuspage event add\n  Added: {id} [{section}]\n  Path: {}",
            path.display()
        );
    }
}

fn run_move(
    id: EventId,
    to: String,
    from: Option<String>,
    incident: IncidentArgs,
    document: DocumentArgs,
    editor: Option<String>,
    json_output: bool,
) {
    let config = load_config_or_exit(&document);
    let editor = require_editor_or_exit(&authorize(&config, editor));
    let to: Section = parse_or_exit("section", &to);
    let from: Option<Section> = from.map(|from| parse_or_exit("section", &from));
    let fields = (!incident.is_empty()).then(|| shape_fields(incident));

    let path = config.data_path.as_path();
    let from = mutate_document_or_exit(path, |collection| -> Result<_, SectionError> {
        let from = match from {
            Some(from) => from,
            None => collection
                .section_of(id)
                .ok_or(SectionError::EventNotFound(id))?,
        };
        move_section_with(collection, id, from, to, fields).map(|()| (from, true))
    });
    tracing::info!(%id, %from, %to, %editor, "moved event");

    report_mutation(
        "event.move",
        path,
        id,
        json!({ "from": from, "to": to, "editor": editor }),
        json_output,
        &format!("Moved: {id} {from} -> {to}"),
    );
}

fn run_edit(
    id: EventId,
    fields: Vec<String>,
    document: DocumentArgs,
    editor: Option<String>,
    json_output: bool,
) {
    let config = load_config_or_exit(&document);
    let authorization = authorize(&config, editor);

    let pairs = fields
        .iter()
        .map(|field| {
            field.split_once('=').unwrap_or_else(|| {
                exit_with_error(format!("invalid field `{field}`: expected KEY=VALUE"))
            })
        })
        .collect::<Vec<_>>();
    let form = EventForm::from_pairs(pairs).unwrap_or_else(|e| exit_with_error(e));

    let path = config.data_path.as_path();
    let outcome = mutate_document_or_exit(path, |collection| {
        apply_form(collection, id, form, &authorization).map(|outcome| (outcome, true))
    });

    if json_output {
        print_json(&json!({
            "action": "event.edit",
            "dataPath": path.display().to_string(),
            "outcome": outcome
        }));
        return;
    }

    println!("statuspage event edit");
    println!("  Edited: {id} [{}] by {}", outcome.section, outcome.editor);
    if let Some(from) = outcome.moved_from {
        println!("  Moved: {from} -> {}", outcome.section);
    }
    println!("  Updates: {}", outcome.updates);
    println!("  Path: {}", path.display());
}

fn run_update(
    id: EventId,
    title: String,
    body: String,
    time: Option<String>,
    document: DocumentArgs,
    editor: Option<String>,
    json_output: bool,
) {
    let config = load_config_or_exit(&document);
    let editor = require_editor_or_exit(&authorize(&config, editor));
    let time = time.unwrap_or_else(|| timestamp::format_stored(Utc::now()));
    if !timestamp::is_valid(&time) {
        exit_with_error(format!(
            "invalid update time `{time}`: expected YYYY-MM-DD HH:MM"
        ));
    }

    let path = config.data_path.as_path();
    let update = Update::new(title, time.clone(), body);
    mutate_document_or_exit(path, |collection| {
        add_update(collection, id, update).map(|()| ((), true))
    });
    tracing::info!(%id, %editor, "added update");

    report_mutation(
        "event.update",
        path,
        id,
        json!({ "time": time, "editor": editor }),
        json_output,
        &format!("Updated: {id} at {time}"),
    );
}

fn run_delete(id: EventId, document: DocumentArgs, editor: Option<String>, json_output: bool) {
    let config = load_config_or_exit(&document);
    let editor = require_editor_or_exit(&authorize(&config, editor));

    let path = config.data_path.as_path();
    let (section, event) = mutate_document_or_exit(path, |collection| {
        delete_event(collection, id).map(|removed| (removed, true))
    });
    tracing::info!(%id, %section, %editor, "deleted event");

    report_mutation(
        "event.delete",
        path,
        id,
        json!({ "section": section, "title": event.title, "editor": editor }),
        json_output,
        &format!("Deleted: {id} [{section}] {}", event.title),
    );
}

fn report_mutation(
    action: &str,
    path: &Path,
    id: EventId,
    details: serde_json::Value,
    json_output: bool,
    summary: &str,
) {
    if json_output {
        let mut payload = json!({
            "action": action,
            "dataPath": path.display().to_string(),
            "id": id
        });
        if let (serde_json::Value::Object(map), serde_json::Value::Object(extra)) =
            (&mut payload, details)
        {
            map.extend(extra);
        }
        print_json(&payload);
    } else {
        println!("statuspage {}", action.replace('.', " "));
        println!("  {summary}");
        println!("  Path: {}", path.display());
    }
}
