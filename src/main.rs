//! Command-line interface for compiling source files to x86-64 assembly
//! text (spec.md §6).

use clap::{Parser as ClapParser, Subcommand};
use std::path::PathBuf;
use std::process;

#[derive(ClapParser)]
#[command(name = "minic")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile a small C-like language to x86-64 assembly text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print the stage a fatal error occurred in, and a summary on success
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source file to an assembly (.s) file
    Build {
        /// Input source file
        input: PathBuf,

        /// Output assembly path (defaults to the input's file stem with `.s`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Build { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension("s"));
            let config = minic::CompilerConfig::new().with_verbose(cli.verbose);
            run_build(&input, &output, &config);
        }
    }
}

fn run_build(input: &std::path::Path, output: &std::path::Path, config: &minic::CompilerConfig) {
    match minic::compile_file_with_config(input, output, config) {
        Ok(()) => {
            if config.verbose {
                println!("Compiled {} -> {}", input.display(), output.display());
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}
