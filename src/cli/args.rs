use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "spotview",
    version,
    about = "browse spots from a spots API",
    long_about = "spotview talks to a spots backend: it lists spots as cards, filters them by category and drives the register/login/logout endpoints.\n\nExamples:\n  spotview\n  spotview category \"Lauko treniruokliai\"\n  spotview login --email me@example.com --password Secret123\n  spotview category \"Slaptos vietos\" -o secret.html\n\nTip: Use --config to persist the API base and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        global = true,
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        global = true,
        help_heading = "Output",
        help = "Write the rendered spots to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        global = true,
        help_heading = "Output",
        help = "Output format (text, json, html)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'a',
        long = "api",
        visible_alias = "api-base",
        value_name = "URL",
        global = true,
        help_heading = "Input",
        help = "Base URL of the spots API (e.g. http://localhost:8080)."
    )]
    pub api_base: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.spotview/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 's',
        long = "ses",
        visible_alias = "session",
        value_name = "FILE",
        global = true,
        help_heading = "Session",
        help = "Session cookie file (defaults to ~/.spotview/session.json)."
    )]
    pub session: Option<String>,

    #[arg(
        long = "ephemeral",
        global = true,
        help_heading = "Session",
        help = "Keep the session in memory only; nothing is read from or written to disk."
    )]
    pub ephemeral: bool,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'H',
        long = "hdr",
        visible_alias = "header",
        value_name = "HEADER",
        action = ArgAction::Append,
        global = true,
        help_heading = "HTTP",
        help = "Add a header to all requests (format: 'Key: Value', repeatable)."
    )]
    pub header: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch the default spot list and render it (the default).
    Load,
    /// Show the spots of one category (Gamta, "Lauko treniruokliai", "Slaptos vietos").
    Category {
        #[arg(value_name = "LABEL")]
        label: String,
    },
    /// Check that the backend is up.
    Health,
    /// Dump the public spot list.
    Spots,
    /// Dump the public nature spots.
    Nature,
    /// Dump the public outdoor gym spots.
    Trainers,
    /// Dump the secret spots (needs a login).
    Secret,
    /// Dump every spot, secret ones included (needs a login).
    Protected,
    /// Dump one spot by id.
    Spot {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Create an account.
    Register(RegisterArgs),
    /// Log in and keep the session cookie.
    Login(LoginArgs),
    /// Show the logged in user.
    Me,
    /// End the session.
    Logout,
    /// Load spots, health and the current user at once.
    Dashboard,
    /// Write a default config file if there is none yet.
    Init,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RegisterArgs {
    #[arg(long, value_name = "EMAIL")]
    pub email: String,

    #[arg(long, value_name = "PASSWORD")]
    pub password: String,

    #[arg(long = "confirm", visible_alias = "confirm-password", value_name = "PASSWORD")]
    pub confirm_password: String,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct LoginArgs {
    #[arg(long, value_name = "EMAIL")]
    pub email: String,

    #[arg(long, value_name = "PASSWORD")]
    pub password: String,
}
