use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "statuspage",
    about = "Status page catalog: edit events, derive service status, publish feeds",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the status document and its settings live.
#[derive(Args, Debug, Clone, Default)]
pub struct DocumentArgs {
    /// Path to the status document (overrides `data_path` from config)
    #[arg(long)]
    pub data: Option<String>,

    /// Path to a TOML config file (default: ./statuspage.toml when present)
    #[arg(long)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render feeds, page snapshot and status summary into the output directory
    Generate {
        #[command(flatten)]
        document: DocumentArgs,

        /// Output directory (overrides `out_dir` from config)
        #[arg(long)]
        out: Option<String>,

        /// Render for local development (absolute static asset prefix)
        #[arg(long)]
        dev: bool,

        /// General feed URL (overrides `feed_url` from config)
        #[arg(long)]
        feed_url: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Assign ids to records that lack one
    AddIds {
        #[command(flatten)]
        document: DocumentArgs,

        /// Report assignments without writing the document
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show derived per-product status and section counts
    Status {
        #[command(flatten)]
        document: DocumentArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Event catalog operations
    Event {
        #[command(subcommand)]
        command: EventCommands,
    },

    /// Create an empty status document and default config
    Init {
        /// Directory to initialize
        #[arg(default_value = ".")]
        path: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Section-dependent incident fields.
#[derive(Args, Debug, Clone, Default)]
pub struct IncidentArgs {
    /// Free-text description of the technical state
    #[arg(long)]
    pub system_status: Option<String>,

    /// User impact; also becomes the event status
    #[arg(long)]
    pub user_impact: Option<String>,

    /// Start time (YYYY-MM-DD HH:MM)
    #[arg(long)]
    pub start: Option<String>,

    /// Closed time (YYYY-MM-DD HH:MM); an empty value clears it
    #[arg(long)]
    pub closed: Option<String>,
}

impl IncidentArgs {
    pub fn is_empty(&self) -> bool {
        self.system_status.is_none()
            && self.user_impact.is_none()
            && self.start.is_none()
            && self.closed.is_none()
    }
}

#[derive(Subcommand)]
pub enum EventCommands {
    /// Show one event
    Show {
        /// Event id
        id: u64,

        #[command(flatten)]
        document: DocumentArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a new event at the front of a section
    Add {
        /// Event title
        title: String,

        /// Target section: current, planned, past or info
        #[arg(long, default_value = "current")]
        section: String,

        /// Event body
        #[arg(long, default_value = "")]
        body: String,

        /// Affected product (repeatable)
        #[arg(long = "product")]
        products: Vec<String>,

        #[command(flatten)]
        incident: IncidentArgs,

        #[command(flatten)]
        document: DocumentArgs,

        /// Editor identity (default: $USER)
        #[arg(long)]
        editor: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move an event to another section
    Move {
        /// Event id
        id: u64,

        /// Target section
        #[arg(long)]
        to: String,

        /// Section the event is expected in (default: wherever it is)
        #[arg(long)]
        from: Option<String>,

        #[command(flatten)]
        incident: IncidentArgs,

        #[command(flatten)]
        document: DocumentArgs,

        /// Editor identity (default: $USER)
        #[arg(long)]
        editor: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply form fields to an event
    Edit {
        /// Event id
        id: u64,

        /// Form field (repeatable), e.g. `--set user_impact=degraded`
        #[arg(long = "set", value_name = "KEY=VALUE")]
        fields: Vec<String>,

        #[command(flatten)]
        document: DocumentArgs,

        /// Editor identity (default: $USER)
        #[arg(long)]
        editor: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Attach an update to an event
    Update {
        /// Event id
        id: u64,

        /// Update title
        title: String,

        /// Update body
        #[arg(long, default_value = "")]
        body: String,

        /// Update time (YYYY-MM-DD HH:MM, default: now)
        #[arg(long)]
        time: Option<String>,

        #[command(flatten)]
        document: DocumentArgs,

        /// Editor identity (default: $USER)
        #[arg(long)]
        editor: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete an event
    Delete {
        /// Event id
        id: u64,

        #[command(flatten)]
        document: DocumentArgs,

        /// Editor identity (default: $USER)
        #[arg(long)]
        editor: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
