use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use infracheck::commands::{apply, doctor, plan, probe, run, ModuleArgs};
use infracheck::config::{parse_var, VarValue};
use infracheck::probe::{DEFAULT_INTERVAL, DEFAULT_MAX_ATTEMPTS};
use infracheck::CaseKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "infracheck")]
#[command(about = "Provision an infrastructure module, check its outputs and probe it", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: ./infracheck.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the suite (both cases, concurrently, unless --case is given)
    Run {
        /// Case to run; repeat for several
        #[arg(long = "case", value_enum)]
        cases: Vec<CaseKind>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Init and plan a module, then check the plan for expected resources
    Plan {
        #[command(flatten)]
        module: ModuleOpts,

        /// Resource address the plan must mention; repeat for several
        #[arg(long)]
        expect: Vec<String>,
    },

    /// Apply a module, check outputs, probe the web app, then destroy it
    Apply {
        #[command(flatten)]
        module: ModuleOpts,

        /// Probe attempts
        #[arg(long)]
        attempts: Option<u32>,

        /// Seconds between probe attempts
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Probe a URL until it answers with a status below 500
    Probe {
        url: String,

        #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..))]
        attempts: u32,

        /// Seconds between attempts
        #[arg(long, default_value_t = DEFAULT_INTERVAL.as_secs())]
        interval: u64,
    },

    /// Show the provisioning tool, its version and the resolved configuration
    Doctor,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args)]
struct ModuleOpts {
    /// Module directory
    dir: PathBuf,

    /// Input variable as NAME=VALUE; repeat for several
    #[arg(long = "var", value_parser = parse_var)]
    vars: Vec<(String, VarValue)>,

    /// Let the tool colorize its output
    #[arg(long)]
    color: bool,

    /// Work in the module directory instead of a temporary copy
    #[arg(long)]
    in_place: bool,
}

impl ModuleOpts {
    fn into_args(self, config: Option<PathBuf>) -> ModuleArgs {
        ModuleArgs {
            directory: self.dir,
            vars: self.vars,
            color: self.color,
            in_place: self.in_place,
            config,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    match cli.command {
        Commands::Run { cases, json } => run::execute(config.as_deref(), cases, json),
        Commands::Plan { module, expect } => plan::execute(module.into_args(config), expect),
        Commands::Apply {
            module,
            attempts,
            interval,
        } => apply::execute(module.into_args(config), attempts, interval),
        Commands::Probe {
            url,
            attempts,
            interval,
        } => probe::execute(&url, attempts, interval),
        Commands::Doctor => doctor::execute(config.as_deref()),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}
