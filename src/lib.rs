// GW Launcher
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

pub mod bootstrap;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod flags;
pub mod launcher;
pub mod logging;
pub mod models;
pub mod profiles;
pub mod utils;
pub mod versions;

use bootstrap::{Bootstrapper, SystemCommandRunner};
use commands::AppState;
use config::LauncherConfig;
use events::{ConsolePrompter, LogEventSink, Prompt, Prompter};
use launcher::LaunchSupervisor;
use models::{ModLoader, Profile};

#[derive(Parser)]
#[command(
    name = "gwlauncher",
    version,
    about = "GW Launcher - Minecraft profiles, versions and launching"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Manage saved profiles")]
    Profiles {
        #[command(subcommand)]
        action: ProfileCommands,
    },

    #[command(about = "List the merged version catalog")]
    Versions {
        #[arg(long, help = "Ask the backend to refresh the version files first")]
        refresh: bool,
    },

    #[command(about = "Show recommended JVM flags for a version")]
    Flags {
        #[arg(help = "Game version, e.g. 1.20.4")]
        version: String,

        #[arg(long, default_value = "vanilla", help = "Mod loader")]
        modloader: ModLoader,
    },

    #[command(about = "Launch a saved profile")]
    Launch {
        #[arg(help = "Profile name")]
        name: String,
    },

    #[command(about = "Open the game directory of a profile")]
    Open {
        #[arg(help = "Profile name")]
        name: String,
    },

    #[command(about = "Check and install the backend runtime dependencies")]
    CheckDeps,
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    #[command(about = "List saved profiles")]
    List,

    #[command(about = "Create or overwrite a profile")]
    Save {
        #[arg(help = "Profile name")]
        name: String,

        #[arg(long)]
        username: String,

        #[arg(long)]
        version: String,

        #[arg(long, default_value = "vanilla")]
        modloader: ModLoader,

        #[arg(long, default_value = "2048", help = "RAM in MB, or <n>g")]
        ram: String,

        #[arg(long, allow_hyphen_values = true, help = "Whitespace-separated JVM flags")]
        flags: Option<String>,
    },

    #[command(about = "Delete a profile")]
    Delete {
        #[arg(help = "Profile name")]
        name: String,

        #[arg(long, help = "Also delete the profile's game directory")]
        purge: bool,

        #[arg(short, long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
}

// CLI entry point
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = LauncherConfig::new()?;
    config
        .ensure_directories()
        .with_context(|| format!("Failed to create {}", config.base_dir.display()))?;
    logging::init_logging(&config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(execute(cli.command, config))
}

async fn execute(command: Commands, config: LauncherConfig) -> Result<()> {
    let bootstrapper = Bootstrapper::new(SystemCommandRunner, ConsolePrompter, config.python_program.clone());
    let state = AppState::new(config, Arc::new(LogEventSink));

    match command {
        Commands::Profiles { action } => run_profile_command(&state, action).await,
        Commands::Versions { refresh } => {
            let catalog = if refresh {
                let supervisor = LaunchSupervisor::new(state.config.clone(), bootstrapper)?;
                commands::refresh_and_load_versions(&state, &supervisor).await
            } else {
                commands::load_versions(&state).await
            }
            .map_err(anyhow::Error::msg)?;

            if catalog.is_empty() {
                println!("No versions available. Run `gwlauncher versions --refresh`.");
            }
            for entry in catalog {
                println!("{}", entry.label());
            }
            Ok(())
        }
        Commands::Flags { version, modloader } => {
            println!("{}", commands::recommended_flags(&version, modloader).join(" "));
            Ok(())
        }
        Commands::Launch { name } => {
            let supervisor = LaunchSupervisor::new(state.config.clone(), bootstrapper)?;
            commands::launch_profile(&state, &supervisor, &name)
                .await
                .map_err(anyhow::Error::msg)?;
            println!("Launched '{}'", name);
            Ok(())
        }
        Commands::Open { name } => {
            let dir = commands::open_profile_dir(&state, &name)
                .await
                .map_err(anyhow::Error::msg)?;
            println!("{}", dir.display());
            Ok(())
        }
        Commands::CheckDeps => {
            commands::check_dependencies(&state, &bootstrapper)
                .await
                .map_err(anyhow::Error::msg)?;
            println!("All dependencies are installed");
            Ok(())
        }
    }
}

async fn run_profile_command(state: &AppState, action: ProfileCommands) -> Result<()> {
    match action {
        ProfileCommands::List => {
            let profiles = commands::list_profiles(state).await.map_err(anyhow::Error::msg)?;
            for (name, profile) in &profiles {
                println!(
                    "{}\t{}\t{}\t{} MB\t{}",
                    name,
                    profile.username,
                    profile.version,
                    profile.ram,
                    profile.modloader
                );
            }
            Ok(())
        }
        ProfileCommands::Save {
            name,
            username,
            version,
            modloader,
            ram,
            flags,
        } => {
            let jvm_flags = match flags {
                Some(text) => flags::parse_flags(&text),
                None => match state.store.get(&name) {
                    Some(existing) => flags::reconcile_flags(&existing.jvm_flags, &version, modloader),
                    None => flags::recommend(&version, modloader),
                },
            };
            let profile = Profile {
                username,
                version,
                modloader,
                ram: profiles::parse_ram(&ram),
                jvm_flags,
            };
            commands::save_profile(state, name.clone(), profile)
                .await
                .map_err(anyhow::Error::msg)?;
            println!("Saved profile '{}'", name);
            Ok(())
        }
        ProfileCommands::Delete { name, purge, yes } => {
            if !yes {
                let prompt = Prompt::choice(
                    "Delete profile",
                    format!("Are you sure you want to delete the profile \"{}\"?", name),
                    "Delete",
                );
                if !ConsolePrompter.prompt(&prompt) {
                    println!("Cancelled");
                    return Ok(());
                }
            }
            let existed = commands::delete_profile(state, name.clone(), purge)
                .await
                .map_err(anyhow::Error::msg)?;
            if existed {
                println!("Deleted profile '{}'", name);
            } else {
                println!("No profile named '{}'", name);
            }
            Ok(())
        }
    }
}
