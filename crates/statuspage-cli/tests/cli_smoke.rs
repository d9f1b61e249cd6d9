use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "statuspage-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Run the binary with `dir` as working directory, so `./statuspage.toml`
/// and the relative `data.yml` resolve inside it.
fn run_statuspage<I, S>(dir: &Path, args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_statuspage");
    Command::new(bin)
        .current_dir(dir)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("statuspage command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn init_workspace(prefix: &str) -> TempDirGuard {
    let tmp = TempDirGuard::new(prefix);
    let output = run_statuspage(tmp.path(), ["init", ".", "--json"]);
    assert_success(&output);
    tmp
}

fn add_web_outage(dir: &Path) -> u64 {
    let output = run_statuspage(
        dir,
        [
            "event",
            "add",
            "Web outage",
            "--product",
            "web",
            "--system-status",
            "Load balancer down",
            "--user-impact",
            "outage",
            "--start",
            "2024-06-01 08:00",
            "--editor",
            "noc",
            "--json",
        ],
    );
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["action"], "event.add");
    assert_eq!(payload["section"], "current");
    payload["id"].as_u64().expect("id should be numeric")
}

fn status_json(dir: &Path) -> Value {
    let output = run_statuspage(dir, ["status", "--json"]);
    assert_success(&output);
    parse_json_stdout(&output)
}

#[test]
fn init_creates_document_and_config() {
    let tmp = TempDirGuard::new("init");
    let output = run_statuspage(tmp.path(), ["init", "site", "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["action"], "init");
    assert_eq!(payload["createdDataFile"], true);
    assert_eq!(payload["createdConfigFile"], true);
    assert!(tmp.path().join("site/data.yml").is_file());
    assert!(tmp.path().join("site/statuspage.toml").is_file());

    let again = run_statuspage(tmp.path(), ["init", "site", "--json"]);
    assert_success(&again);
    assert_eq!(parse_json_stdout(&again)["createdDataFile"], false);
}

#[test]
fn event_lifecycle_drives_service_status() {
    let tmp = init_workspace("lifecycle");
    let id = add_web_outage(tmp.path());
    assert_eq!(id, 1);

    let status = status_json(tmp.path());
    assert_eq!(status["serviceStatus"]["web"], "outage");
    assert_eq!(status["sections"]["current"], 1);

    let update = run_statuspage(
        tmp.path(),
        [
            "event",
            "update",
            "1",
            "Investigating",
            "--time",
            "2024-06-01 09:00",
            "--body",
            "Vendor contacted",
        ],
    );
    assert_success(&update);

    let moved = run_statuspage(tmp.path(), ["event", "move", "1", "--to", "past", "--json"]);
    assert_success(&moved);
    let moved = parse_json_stdout(&moved);
    assert_eq!(moved["from"], "current");
    assert_eq!(moved["to"], "past");

    let status = status_json(tmp.path());
    assert!(
        status["serviceStatus"]
            .as_object()
            .is_some_and(|map| map.is_empty())
    );

    let shown = run_statuspage(tmp.path(), ["event", "show", "1", "--json"]);
    assert_success(&shown);
    let shown = parse_json_stdout(&shown);
    assert_eq!(shown["section"], "past");
    assert_eq!(shown["event"]["status"], "outage");
    assert_eq!(shown["event"]["updates"][0]["title"], "Investigating");

    let deleted = run_statuspage(tmp.path(), ["event", "delete", "1", "--json"]);
    assert_success(&deleted);
    assert_eq!(parse_json_stdout(&deleted)["section"], "past");
    assert_failure(&run_statuspage(tmp.path(), ["event", "show", "1"]));
}

#[test]
fn edit_sets_status_from_user_impact() {
    let tmp = init_workspace("edit");
    let id = add_web_outage(tmp.path()).to_string();

    let output = run_statuspage(
        tmp.path(),
        [
            "event",
            "edit",
            id.as_str(),
            "--set",
            "user_impact=degraded",
            "--set",
            "new_update_title=Partially restored",
            "--set",
            "new_update_time=2024-06-01 10:00",
            "--json",
        ],
    );
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["outcome"]["section"], "current");
    assert_eq!(payload["outcome"]["updates"], 1);

    let status = status_json(tmp.path());
    assert_eq!(status["serviceStatus"]["web"], "degraded");
}

#[test]
fn edit_outside_allow_list_is_rejected() {
    let tmp = init_workspace("allow-list");
    fs::write(
        tmp.path().join("statuspage.toml"),
        "editors = [\"alice\"]\n",
    )
    .expect("config should be written");

    let denied = run_statuspage(
        tmp.path(),
        ["event", "add", "Maintenance", "--editor", "mallory"],
    );
    assert_failure(&denied);
    assert!(stderr_text(&denied).contains("unauthorized"));

    let id = {
        let output = run_statuspage(
            tmp.path(),
            [
                "event",
                "add",
                "Router upgrade",
                "--section",
                "planned",
                "--system-status",
                "Scheduled",
                "--user-impact",
                "maintenance",
                "--editor",
                "alice",
                "--json",
            ],
        );
        assert_success(&output);
        parse_json_stdout(&output)["id"].to_string()
    };

    let before = fs::read_to_string(tmp.path().join("data.yml")).expect("read document");
    let denied = run_statuspage(
        tmp.path(),
        [
            "event",
            "edit",
            id.as_str(),
            "--set",
            "title=Hijacked",
            "--editor",
            "mallory",
        ],
    );
    assert_failure(&denied);
    assert!(stderr_text(&denied).contains("unauthorized"));
    let after = fs::read_to_string(tmp.path().join("data.yml")).expect("read document");
    assert_eq!(before, after);
}

#[test]
fn moving_notice_out_of_info_requires_incident_fields() {
    let tmp = init_workspace("info-move");
    let added = run_statuspage(
        tmp.path(),
        ["event", "add", "Welcome", "--section", "info", "--json"],
    );
    assert_success(&added);

    let missing = run_statuspage(tmp.path(), ["event", "move", "1", "--to", "current"]);
    assert_failure(&missing);
    assert!(stderr_text(&missing).contains("missing required field"));

    let moved = run_statuspage(
        tmp.path(),
        [
            "event",
            "move",
            "1",
            "--to",
            "current",
            "--start",
            "2024-06-01 08:00",
            "--system-status",
            "Investigating",
            "--user-impact",
            "degraded",
        ],
    );
    assert_success(&moved);
}

#[test]
fn generate_writes_feeds_and_snapshot() {
    let tmp = init_workspace("generate");
    add_web_outage(tmp.path());

    let output = run_statuspage(
        tmp.path(),
        [
            "generate",
            "--out",
            "public",
            "--feed-url",
            "https://status.example/feed.xml",
            "--json",
        ],
    );
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["written"].as_array().map(Vec::len), Some(4));

    let out = tmp.path().join("public");
    let feed = fs::read_to_string(out.join("feed.xml")).expect("feed.xml should exist");
    assert!(feed.contains("<id>https://status.example/feed.xml1</id>"));
    assert!(feed.contains("<title>[outage] Web outage</title>"));

    let planned = fs::read_to_string(out.join("planned.xml")).expect("planned.xml should exist");
    assert!(!planned.contains("<entry>"));

    let snapshot: Value = serde_json::from_str(
        &fs::read_to_string(out.join("feed.json")).expect("feed.json should exist"),
    )
    .expect("feed.json should parse");
    assert_eq!(snapshot["service_status"]["web"], "outage");
    assert!(snapshot.get("static_prefix").is_none());

    let status: Value = serde_json::from_str(
        &fs::read_to_string(out.join("status.json")).expect("status.json should exist"),
    )
    .expect("status.json should parse");
    assert_eq!(status["service_status"]["web"], "outage");
}

#[test]
fn add_ids_numbers_legacy_records() {
    let tmp = TempDirGuard::new("add-ids");
    let data = tmp.path().join("data.yml");
    let legacy = "\
current:
  - title: Mail delays
    body: Queue backlog
    status: degraded
    system_status: queue
    user_impact: degraded
    products: [mail]
    start: 2024-06-01 08:00
past:
  - id: 7
    title: Old outage
    body: ''
    status: operational
    system_status: fixed
    user_impact: operational
    start: 2024-05-01 08:00
info:
  - title: Welcome
    body: Hello
";
    fs::write(&data, legacy).expect("legacy document should be written");

    let dry = run_statuspage(tmp.path(), ["add-ids", "--dry-run", "--json"]);
    assert_success(&dry);
    let dry = parse_json_stdout(&dry);
    assert_eq!(dry["assigned"].as_array().map(Vec::len), Some(2));
    assert_eq!(dry["written"], false);
    assert_eq!(fs::read_to_string(&data).expect("read document"), legacy);

    let output = run_statuspage(tmp.path(), ["add-ids", "--json"]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["written"], true);
    let ids: Vec<u64> = payload["assigned"]
        .as_array()
        .expect("assigned should be an array")
        .iter()
        .filter_map(|entry| entry["id"].as_u64())
        .collect();
    assert_eq!(ids, vec![8, 9]);

    let status = status_json(tmp.path());
    assert_eq!(status["serviceStatus"]["mail"], "degraded");
}

#[test]
fn held_lock_blocks_mutation() {
    let tmp = init_workspace("lock");
    let lock = tmp.path().join("data.yml.lock");
    fs::write(&lock, "pid=0\n").expect("lock should be written");

    let output = run_statuspage(tmp.path(), ["event", "add", "Blocked", "--section", "info"]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("lock busy"));

    fs::remove_file(&lock).expect("lock should be removed");
    assert_success(&run_statuspage(
        tmp.path(),
        ["event", "add", "Unblocked", "--section", "info"],
    ));
}

#[test]
fn missing_document_is_reported() {
    let tmp = TempDirGuard::new("missing");
    let output = run_statuspage(tmp.path(), ["status"]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("status document not found"));
}
