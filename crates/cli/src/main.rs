//! bondc: command-line front end over bond-core and bond-compat.
//!
//! All parsing and diffing logic lives in the libraries; this binary
//! only shapes output and exit codes.

use std::path::{Path, PathBuf};
use std::process;

use bond_compat::{check_compatibility, format_changes, ChangeCategory};
use bond_core::{parse_file_with, FsResolver, Options, ParseResult};
use clap::{Parser, Subcommand, ValueEnum};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Bond IDL schema compiler front-end.
#[derive(Parser)]
#[command(name = "bondc", version, about = "Bond IDL schema compiler front-end")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a .bond file and print the JSON AST envelope
    Parse {
        /// Path to the .bond source file
        file: PathBuf,
        /// Parse import statements without loading them
        #[arg(long)]
        ignore_imports: bool,
    },

    /// Diff two schema revisions and classify every change
    Compat {
        /// Path to the old schema
        old: PathBuf,
        /// Path to the new schema
        new: PathBuf,
        /// Parse import statements without loading them
        #[arg(long)]
        ignore_imports: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Parse {
            file,
            ignore_imports,
        } => run_parse(&file, ignore_imports, cli.output),
        Commands::Compat {
            old,
            new,
            ignore_imports,
        } => run_compat(&old, &new, ignore_imports, cli.output),
    };
    process::exit(code);
}

fn compile(path: &Path, ignore_imports: bool) -> ParseResult {
    let options = Options {
        ignore_imports,
        cancel: None,
    };
    parse_file_with(path, &FsResolver, &options)
}

fn print_errors(result: &ParseResult, output: OutputFormat) {
    match output {
        OutputFormat::Json => {
            let value = serde_json::json!({ "errors": result.errors, "success": false });
            println!("{}", value);
        }
        OutputFormat::Text => {
            for e in &result.errors {
                eprintln!("error: {}", e);
            }
        }
    }
}

fn run_parse(file: &Path, ignore_imports: bool, output: OutputFormat) -> i32 {
    let result = compile(file, ignore_imports);
    if !result.success {
        print_errors(&result, output);
        return 1;
    }
    // SAFETY: success implies a full AST
    let ast = result.ast.unwrap();
    let envelope = bond_core::serialize(&ast);
    match output {
        OutputFormat::Json => println!("{}", envelope),
        OutputFormat::Text => match serde_json::to_string_pretty(&envelope) {
            Ok(pretty) => println!("{}", pretty),
            Err(_) => println!("{}", envelope),
        },
    }
    0
}

fn run_compat(old: &Path, new: &Path, ignore_imports: bool, output: OutputFormat) -> i32 {
    let old_result = compile(old, ignore_imports);
    if !old_result.success {
        print_errors(&old_result, output);
        return 1;
    }
    let new_result = compile(new, ignore_imports);
    if !new_result.success {
        print_errors(&new_result, output);
        return 1;
    }

    // SAFETY: success implies a full AST on both sides
    let changes = check_compatibility(&old_result.ast.unwrap(), &new_result.ast.unwrap());
    let has_breaking = changes.iter().any(|c| {
        matches!(
            c.category,
            ChangeCategory::BreakingWire | ChangeCategory::BreakingText
        )
    });

    match output {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "changes": changes,
                "breaking": has_breaking,
            });
            println!("{}", value);
        }
        OutputFormat::Text => {
            if changes.is_empty() {
                println!("no schema changes");
            } else {
                println!("{}", format_changes(&changes));
            }
        }
    }

    if has_breaking {
        1
    } else {
        0
    }
}
