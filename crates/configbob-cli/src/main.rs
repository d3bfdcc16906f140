//! Config Bob CLI - render template trees into configuration bundles

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod display;
mod error;
mod exit_codes;
mod logging;

#[derive(Parser)]
#[command(name = "config-bob")]
#[command(version)]
#[command(about = "Render template trees into configuration bundles, with secrets from pluggable backends", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one or more source folders into an output folder
    Build {
        /// Data file(s) to merge, .json, .yml or .yaml
        #[arg(short = 'v', long = "value")]
        values: Vec<PathBuf>,

        /// Source folder(s), later folders win on conflicting files
        #[arg(short = 't', long = "template")]
        templates: Vec<PathBuf>,

        /// Output folder
        #[arg(short = 'o', long = "output", required_unless_present = "dry_run")]
        output: Option<PathBuf>,

        /// Secrets file for the `file` backend (defaults to $CONFIG_BOB_SECRETS_FILE)
        #[arg(long)]
        secrets_file: Option<PathBuf>,

        /// Build and list the result without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Render a single template to stdout
    Render {
        /// Template file
        template: PathBuf,

        /// Data file(s) to merge, .json, .yml or .yaml
        #[arg(short = 'v', long = "value")]
        values: Vec<PathBuf>,

        /// Secrets file for the `file` backend (defaults to $CONFIG_BOB_SECRETS_FILE)
        #[arg(long)]
        secrets_file: Option<PathBuf>,
    },
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version are reported as errors but succeed
            if !err.use_stderr() {
                err.exit();
            }
            let _ = err.print();
            std::process::exit(exit_codes::ERROR);
        }
    };
    logging::init(cli.debug);

    let result = match cli.command {
        Commands::Build {
            values,
            templates,
            output,
            secrets_file,
            dry_run,
        } => commands::build::run(
            &values,
            &templates,
            output.as_deref(),
            secrets_file.as_deref(),
            dry_run,
        ),

        Commands::Render {
            template,
            values,
            secrets_file,
        } => commands::render::run(&template, &values, secrets_file.as_deref()),
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
