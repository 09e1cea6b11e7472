mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_LOCK_ERROR, EXIT_MANIFEST_ERROR};
use pipspec_core::{Engine, LintConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "pipspec",
    version,
    about = "Parse, lint, format, and compare Pipfile dependency manifests"
)]
struct Cli {
    /// Path to a lint config file (default: $PIPSPEC_CONFIG or ~/.config/pipspec/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Lint a manifest and report every issue found.
    Check {
        /// Path to the manifest.
        #[arg(default_value = "Pipfile")]
        manifest: PathBuf,
        /// Fail on warnings as well as errors.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// List the manifest's (section, key, value) entries.
    Show {
        /// Path to the manifest.
        #[arg(default_value = "Pipfile")]
        manifest: PathBuf,
        /// Only show one section (e.g. "packages", "dev-packages").
        #[arg(long)]
        section: Option<String>,
    },
    /// Rewrite a manifest in canonical form.
    Fmt {
        /// Path to the manifest.
        #[arg(default_value = "Pipfile")]
        manifest: PathBuf,
        /// Exit non-zero if the manifest is not already canonical; do not write.
        #[arg(long, default_value_t = false)]
        check: bool,
    },
    /// Compare two manifests, ignoring declaration order.
    Diff {
        /// The old manifest.
        old: PathBuf,
        /// The new manifest.
        new: PathBuf,
    },
    /// Print the manifest's content digest.
    Digest {
        /// Path to the manifest.
        #[arg(default_value = "Pipfile")]
        manifest: PathBuf,
        /// Print only the short digest.
        #[arg(long, default_value_t = false)]
        short: bool,
    },
    /// Check a resolved lock file against the manifest's declared intent.
    VerifyLock {
        /// Path to the manifest.
        #[arg(default_value = "Pipfile")]
        manifest: PathBuf,
        /// Path to the lock file (default: <manifest>.lock).
        #[arg(long)]
        lock: Option<PathBuf>,
    },
    /// Test whether a version satisfies a constraint.
    Satisfies {
        /// Version constraint, e.g. ">=1.16.4,<2".
        constraint: String,
        /// Candidate version, e.g. "1.19.5".
        version: String,
    },
    /// Write a starter manifest from a built-in preset.
    Init {
        /// Destination path.
        #[arg(default_value = "Pipfile")]
        path: PathBuf,
        /// Preset name.
        #[arg(long, default_value = "minimal")]
        preset: String,
        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
        /// List the available presets and exit.
        #[arg(long, default_value_t = false)]
        list: bool,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PIPSPEC_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Only linting consults the config, so a broken config file does not
    // block the other commands.
    let needs_config = matches!(cli.command, Commands::Check { .. });
    let engine = if needs_config {
        match Engine::from_config_file(cli.config.as_deref()) {
            Ok(e) => e,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(EXIT_FAILURE);
            }
        }
    } else {
        Engine::new(LintConfig::default())
    };
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Check { manifest, strict } => {
            commands::check::run(&engine, &manifest, strict, json_output)
        }
        Commands::Show { manifest, section } => {
            commands::show::run(&engine, &manifest, section.as_deref(), json_output)
        }
        Commands::Fmt { manifest, check } => {
            commands::fmt::run(&engine, &manifest, check, json_output)
        }
        Commands::Diff { old, new } => commands::diff::run(&old, &new, json_output),
        Commands::Digest { manifest, short } => {
            commands::digest::run(&engine, &manifest, short, json_output)
        }
        Commands::VerifyLock { manifest, lock } => {
            commands::verify_lock::run(&engine, &manifest, lock.as_deref(), json_output)
        }
        Commands::Satisfies {
            constraint,
            version,
        } => commands::satisfies::run(&constraint, &version, json_output),
        Commands::Init {
            path,
            preset,
            force,
            list,
        } => commands::init::run(&path, &preset, force, list, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest error:")
                || msg.starts_with("failed to parse manifest")
                || msg.starts_with("failed to read manifest")
            {
                EXIT_MANIFEST_ERROR
            } else if msg.starts_with("lock error:") || msg.starts_with("lock file") {
                EXIT_LOCK_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
