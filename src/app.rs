use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::cli::args::{CliArgs, Command};
use crate::cli::validation;
use crate::client::{self, ApiClient, ClientOptions};
use crate::config::{self, ConfigFile};
use crate::page::{Action, Button, Page};
use crate::render::{self, OutputFormat};
use crate::session::Session;

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn print_tag(tag: &str, message: &str, no_color: bool) {
    if no_color {
        println!("[{tag}] {message}");
        return;
    }
    println!(
        "{}{}{} {}",
        "[".bold().white(),
        tag.bold().yellow(),
        "]".bold().white(),
        message.bold().white()
    );
}

#[derive(Clone, Debug)]
struct RunConfig {
    command: Command,
    config_path: Option<PathBuf>,
    api_base: String,
    session_path: Option<PathBuf>,
    proxy: Option<String>,
    headers: Vec<(String, String)>,
    output: Option<String>,
    output_format: Option<OutputFormat>,
    no_color: bool,
    verbose: u8,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };
    let verbose = args.verbose.max(cfg.verbose.unwrap_or(0));

    let api_base = args
        .api_base
        .or(cfg.api_base)
        .unwrap_or_else(|| config::DEFAULT_API_BASE.to_string());
    let api_base = api_base.trim().to_string();
    reqwest::Url::parse(&api_base).map_err(|e| format!("invalid api base '{api_base}': {e}"))?;

    let session_path = if args.ephemeral {
        None
    } else {
        match args.session.or(cfg.session_file) {
            Some(path) => Some(config::expand_tilde(&path)),
            None => config::default_session_path(),
        }
    };

    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());

    let mut headers = Vec::new();
    for raw in cfg.headers.unwrap_or_default().iter().chain(args.header.iter()) {
        headers.push(client::parse_header_line(raw).map_err(|e| e.to_string())?);
    }

    let output = args.output.or(cfg.output).filter(|o| !o.trim().is_empty());
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => Some(
            OutputFormat::parse(&raw)
                .ok_or_else(|| format!("invalid output format '{raw}', expected text, json, or html"))?,
        ),
        None => output.as_deref().and_then(render::infer_format_from_path),
    };

    Ok(RunConfig {
        command: args.command.unwrap_or(Command::Load),
        config_path: args.config.map(|p| config::expand_tilde(&p)),
        api_base,
        session_path,
        proxy,
        headers,
        output,
        output_format,
        no_color,
        verbose,
    })
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

fn actions_for(command: &Command) -> Vec<Action> {
    match command {
        Command::Load => vec![Action::Load],
        Command::Category { label } => vec![Action::Category(label.clone())],
        Command::Health => vec![Action::Press(Button::Health)],
        Command::Spots => vec![Action::Press(Button::PublicSpots)],
        Command::Nature => vec![Action::Press(Button::NatureSpots)],
        Command::Trainers => vec![Action::Press(Button::TrainerSpots)],
        Command::Secret => vec![Action::Press(Button::SecretSpots)],
        Command::Protected => vec![Action::Press(Button::ProtectedSpots)],
        Command::Spot { id } => vec![Action::Press(Button::SpotDetails(*id))],
        Command::Register(r) => vec![Action::Register {
            email: r.email.clone(),
            password: r.password.clone(),
            confirm_password: r.confirm_password.clone(),
        }],
        Command::Login(l) => vec![Action::Login {
            email: l.email.clone(),
            password: l.password.clone(),
        }],
        Command::Me => vec![Action::Press(Button::Me)],
        Command::Logout => vec![Action::Logout],
        Command::Dashboard => vec![
            Action::Load,
            Action::Press(Button::Health),
            Action::Press(Button::Me),
        ],
        Command::Init => Vec::new(),
    }
}

fn renders_cards(command: &Command) -> bool {
    matches!(
        command,
        Command::Load | Command::Category { .. } | Command::Dashboard
    )
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if std::io::stderr().is_terminal() {
        pb.set_draw_target(ProgressDrawTarget::stderr());
    } else {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn run_init(run: &RunConfig) -> Result<(), String> {
    let path = match run.config_path.clone() {
        Some(path) => path,
        None => config::default_config_path()
            .ok_or_else(|| "could not determine home directory for config".to_string())?,
    };
    if config::ensure_default_config_file(&path)? {
        print_tag("INF", &format!("wrote {}", path.display()), run.no_color);
    } else {
        print_tag(
            "INF",
            &format!("config already exists at {}", path.display()),
            run.no_color,
        );
    }
    Ok(())
}

fn print_page(page: &Page, run: &RunConfig) {
    if renders_cards(&run.command) && run.output.is_none() {
        let format = run.output_format.unwrap_or(OutputFormat::Text);
        let rendered = render::render(page.container(), format, run.no_color);
        if page.container().is_empty() && format == OutputFormat::Text {
            if page.failures().is_empty() {
                print_tag("INF", "no spots to show", run.no_color);
            }
        } else {
            print!("{}", String::from_utf8_lossy(&rendered));
        }
    }

    for (area, text) in page.outputs() {
        if run.verbose > 0 {
            format_kv_line("area", &area.to_string());
        }
        println!("{text}");
    }

    for alert in page.alerts() {
        print_tag("ALR", alert, run.no_color);
    }
}

async fn write_output(page: &Page, run: &RunConfig, path: &str) -> Result<(), String> {
    let format = run.output_format.unwrap_or(OutputFormat::Text);
    // files never carry terminal colour codes
    let rendered = render::render(page.container(), format, true);

    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(&rendered)
        .await
        .map_err(|_| "failed to write output file".to_string())?;
    log::info!("wrote {} spot(s) to {path}", page.container().len());
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    let session = match run.session_path.as_ref() {
        Some(path) => Session::load(path).map_err(|e| e.to_string())?,
        None => Session::in_memory(),
    };
    let client = ApiClient::new(
        ClientOptions {
            api_base: run.api_base.clone(),
            proxy: run.proxy.clone(),
            headers: run.headers.clone(),
        },
        session,
    )
    .map_err(|e| e.to_string())?;

    if run.verbose > 0 {
        format_kv_line("API", client.api_base());
        if let Some(path) = run.session_path.as_ref() {
            format_kv_line("Session", &path.display().to_string());
        }
    }

    let mut page = Page::new();
    let actions = actions_for(&run.command);
    let pb = spinner(&format!("contacting {}", client.api_base()));
    if let [action] = actions.as_slice() {
        page.dispatch(&client, action.clone()).await;
    } else {
        page.dispatch_all(&client, actions).await;
    }
    pb.finish_and_clear();

    print_page(&page, &run);

    if !page.failures().is_empty() {
        return Err(page.failures().join("; "));
    }

    if let Some(path) = run.output.as_deref() {
        if !renders_cards(&run.command) {
            log::warn!("--output only captures spot cards; nothing was rendered by this command");
        }
        write_output(&page, &run, path).await?;
    }

    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    let cfg = match user_config_path.as_ref() {
        Some(path) if args.command != Some(Command::Init) => config::load_config(path, false)?,
        Some(_) => ConfigFile::default(),
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    init_logging(run.verbose);

    if run.command == Command::Init {
        return run_init(&run);
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
