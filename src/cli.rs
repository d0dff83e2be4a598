//! CLI definitions and command routing.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::backend::FileBackend;
use crate::config::{HostswitchPaths, Settings};
use crate::profile::{ActivationMode, Profile};
use crate::session::{Selection, Session};
use crate::sync::SyncClient;

#[derive(Parser)]
#[command(name = "hostswitch")]
#[command(about = "Switchable hosts profiles composed into the system hosts file")]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List profiles in creation order; '*' marks active ones
    List,
    /// Print a profile's content
    Show { profile: String },
    /// Create a profile, optionally with content from a file ('-' for stdin)
    Create {
        name: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Rename a profile
    Rename { profile: String, new_name: String },
    /// Delete a profile
    Delete { profile: String },
    /// Replace a profile's content from a file ('-' for stdin)
    Edit {
        profile: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Toggle a profile on or off under the current activation mode
    Toggle { profile: String },
    /// Show or set the activation mode
    Mode {
        #[arg(value_enum)]
        mode: Option<ModeArg>,
    },
    /// Show or replace the common fragment composed before every profile
    Common {
        #[command(subcommand)]
        cmd: CommonCmd,
    },
    /// Print the composed hosts body (what 'apply' would write)
    Compose,
    /// Print the current OS hosts file
    System,
    /// Report whether the OS hosts file matches the composed body
    Status,
    /// Write the composed body to the OS hosts file
    Apply,
    /// Import a .json bundle, or any other file as a single profile
    Import { path: PathBuf },
    /// Export all profiles, the common fragment and the mode as JSON
    Export { path: PathBuf },
    /// Check store and hosts file health
    Doctor,
}

#[derive(Subcommand)]
pub enum CommonCmd {
    /// Print the common fragment
    Show,
    /// Replace the common fragment from a file ('-' for stdin)
    Set {
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// At most one active profile
    Single,
    /// Any number of active profiles
    Multi,
}

impl From<ModeArg> for ActivationMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Single => ActivationMode::SingleSelect,
            ModeArg::Multi => ActivationMode::MultiSelect,
        }
    }
}

/// Run CLI and dispatch to handlers.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env();
    crate::telemetry::init(cli.verbose, settings.log_filter.as_deref());
    let paths = HostswitchPaths::default_paths();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(dispatch(&paths, &settings, cli.command))
}

async fn open_session(paths: &HostswitchPaths, settings: &Settings) -> Result<Session> {
    let backend = Arc::new(FileBackend::new(paths.clone()));
    let client = SyncClient::connect(backend)
        .await
        .with_context(|| format!("load store at {}", paths.data_dir.display()))?;
    let hosts = crate::platform::default_hosts_file(settings);
    Ok(Session::new(client, hosts))
}

/// Resolve a profile argument: exact name first, then id.
fn resolve(session: &Session, arg: &str) -> Result<Profile> {
    let snapshot = session.client.snapshot();
    if let Some(p) = snapshot.find_by_name(arg) {
        return Ok(p.clone());
    }
    if let Ok(id) = arg.parse() {
        if let Some(p) = snapshot.find(&id) {
            return Ok(p.clone());
        }
    }
    anyhow::bail!("no profile named '{arg}'")
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut s = String::new();
        std::io::stdin().read_to_string(&mut s).context("read stdin")?;
        Ok(s)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
    }
}

async fn dispatch(paths: &HostswitchPaths, settings: &Settings, cmd: Commands) -> Result<()> {
    let mut session = open_session(paths, settings).await?;

    match cmd {
        Commands::List => {
            let snapshot = session.client.snapshot();
            for p in snapshot.ordered() {
                let marker = if p.active { "*" } else { " " };
                println!("{marker} {}\t{}", p.name, p.id);
            }
            Ok(())
        }
        Commands::Show { profile } => {
            let p = resolve(&session, &profile)?;
            session.select(Selection::Profile(p.id))?;
            print!("{}", session.selected_content().unwrap_or_default());
            Ok(())
        }
        Commands::Create { name, file } => {
            let content = file.as_deref().map(read_input).transpose()?;
            let id = session.create_profile(&name, content.as_deref()).await?;
            println!("Created profile: {} ({id})", name.trim());
            Ok(())
        }
        Commands::Rename { profile, new_name } => {
            let p = resolve(&session, &profile)?;
            session.client.rename(&p.id, &new_name).await?;
            println!("Renamed {} -> {}", p.name, new_name.trim());
            Ok(())
        }
        Commands::Delete { profile } => {
            let p = resolve(&session, &profile)?;
            session.delete_profile(&p.id).await?;
            println!("Deleted profile: {}", p.name);
            Ok(())
        }
        Commands::Edit { profile, file } => {
            let p = resolve(&session, &profile)?;
            let content = read_input(&file)?;
            session.select(Selection::Profile(p.id))?;
            session.save_selected(&content).await?;
            println!("Updated profile: {}", p.name);
            Ok(())
        }
        Commands::Toggle { profile } => {
            let p = resolve(&session, &profile)?;
            session.client.toggle_active(&p.id).await?;
            let now_active = session
                .client
                .snapshot()
                .find(&p.id)
                .map(|p| p.active)
                .unwrap_or(false);
            let state = if now_active { "on" } else { "off" };
            println!("{}: {state}", p.name);
            Ok(())
        }
        Commands::Mode { mode } => {
            if let Some(m) = mode {
                session.client.set_mode(m.into()).await?;
            }
            println!("{}", session.client.snapshot().mode);
            Ok(())
        }
        Commands::Common { cmd } => match cmd {
            CommonCmd::Show => {
                session.select(Selection::Common)?;
                print!("{}", session.selected_content().unwrap_or_default());
                Ok(())
            }
            CommonCmd::Set { file } => {
                let content = read_input(&file)?;
                session.select(Selection::Common)?;
                session.save_selected(&content).await?;
                println!("Updated common fragment");
                Ok(())
            }
        },
        Commands::Compose => {
            print!("{}", session.client.compose());
            Ok(())
        }
        Commands::System => {
            session.select(Selection::System)?;
            print!("{}", session.selected_content().unwrap_or_default());
            Ok(())
        }
        Commands::Status => {
            let composed = session.client.compose();
            let mirror = session.refresh_mirror()?;
            match mirror.state_against(&composed) {
                crate::compose::SyncState::InSync => println!("in sync"),
                crate::compose::SyncState::Diverged => println!("diverged"),
            }
            Ok(())
        }
        Commands::Apply => {
            let composed = session.apply().await?;
            println!(
                "Wrote {} bytes to {}",
                composed.len(),
                session.hosts_file().path().display()
            );
            Ok(())
        }
        Commands::Import { path } => {
            let bytes = std::fs::read(&path).with_context(|| format!("read {}", path.display()))?;
            let label = path.to_string_lossy();
            let ids = session.client.import_source(&label, &bytes).await?;
            println!("Imported {} profile(s)", ids.len());
            Ok(())
        }
        Commands::Export { path } => {
            let json = session.client.export_bundle().to_json()?;
            std::fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
            println!("Exported to {}", path.display());
            Ok(())
        }
        Commands::Doctor => {
            let snapshot = session.client.snapshot();
            let results = crate::doctor::run_checks(&snapshot, session.hosts_file());
            let mut failed = false;
            for r in &results {
                let mark = if r.ok { "ok" } else { "!!" };
                println!("[{mark}] {}", r.message);
                failed |= !r.ok;
            }
            if failed {
                anyhow::bail!("doctor found problems");
            }
            Ok(())
        }
    }
}
