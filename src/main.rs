use anyhow::Result;
use clap::{CommandFactory, Parser};
use gscribe::app::{Overrides, run_transcribe_command};
use gscribe::cli::{Cli, Commands, ConfigAction};
use gscribe::config::Config;
use gscribe::diagnostics::check_dependencies;
use owo_colors::OwoColorize;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let Some(input) = cli.input else {
                eprintln!("{}", "Error: no input file given".red());
                eprintln!("Usage: gscribe [OPTIONS] <FILE>");
                std::process::exit(2);
            };

            let config = load_config(cli.config.as_deref())?;
            let overrides = Overrides {
                project: cli.project,
                credentials: cli.credentials,
                bucket_suffix: cli.bucket_suffix,
                language: cli.language,
                output_dir: cli.output_dir,
                timeout_secs: cli.timeout,
                poll_interval_secs: cli.poll_interval,
                require_mono: cli.require_mono,
            };

            if let Err(e) =
                run_transcribe_command(config, overrides, &input, cli.quiet, cli.verbose).await
            {
                eprintln!("{}", format!("Error: {}", e).red());
                std::process::exit(1);
            }
        }
        Some(Commands::Check) => {
            let config = load_config(cli.config.as_deref())?;
            check_dependencies(&config);
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "gscribe",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/gscribe/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}

/// Handle configuration commands.
fn handle_config_command(
    action: ConfigAction,
    custom_path: Option<&std::path::Path>,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            let path = custom_path
                .map(std::path::PathBuf::from)
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}
