//! Ingestro CLI
//!
//! Command-line tool for inspecting, validating and editing flat JSON
//! record files.

mod logging;

use clap::{Parser, Subcommand};
use ingestro_core::{
    apply_edits, export_table, parse_json_with, scan_directory, CellEdit, ExportFormat,
    ParseOptions, RuleSet, Store, Table, DEFAULT_MAX_SIZE_BYTES,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Exit status when the input parsed but some cells failed validation
const EXIT_INVALID_CELLS: i32 = 2;

#[derive(Parser)]
#[command(name = "ingestro")]
#[command(about = "Inspect, validate and edit flat JSON record files", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Maximum accepted input size in bytes
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_SIZE_BYTES)]
    max_size: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and display its inferred schema and rows
    Parse {
        /// Path to JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Maximum number of rows to display
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Validate a file against a rule set
    Validate {
        /// Path to JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Path to rule set (JSON)
        #[arg(short, long)]
        rules: PathBuf,
    },

    /// Apply cell edits and export the resulting table
    Edit {
        /// Path to JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Path to rule set (JSON)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Edits to apply (row_id:column:value)
        #[arg(short, long)]
        set: Vec<String>,

        /// Output format (json or csv)
        #[arg(long, default_value = "json")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Scan directories for JSON files and report which ones parse
    Check {
        /// Root directories to scan
        #[arg(short, long, required = true)]
        root: Vec<PathBuf>,
    },

    /// Create a rule set template from a file's inferred column types
    CreateRules {
        /// Path to JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Output path for the rule set
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> ingestro_core::Result<i32> {
    let options = ParseOptions::default().with_max_size(cli.max_size);

    match cli.command {
        Commands::Parse { file, limit } => cmd_parse(&file, limit, &options).map(|_| 0),
        Commands::Validate { file, rules } => {
            let invalid = cmd_validate(&file, &rules, &options)?;
            Ok(if invalid > 0 { EXIT_INVALID_CELLS } else { 0 })
        }
        Commands::Edit {
            file,
            rules,
            set,
            format,
            output,
        } => {
            let format: ExportFormat = format.parse()?;
            cmd_edit(&file, rules.as_deref(), &set, format, &output, &options).map(|_| 0)
        }
        Commands::Check { root } => {
            let rejected = cmd_check(&root, &options)?;
            Ok(if rejected > 0 { 1 } else { 0 })
        }
        Commands::CreateRules { file, output } => {
            cmd_create_rules(&file, &output, &options).map(|_| 0)
        }
    }
}

fn cmd_parse(file: &Path, limit: usize, options: &ParseOptions) -> ingestro_core::Result<()> {
    let table = parse_json_with(file, options)?;

    println!("File: {}", file.display());
    println!("Columns: {}", table.column_count());
    println!("Rows: {}", table.row_count());
    println!();

    println!("Schema:");
    for column in &table.columns {
        println!("  {} ({})", column.name, column.column_type);
    }
    println!();

    print_rows(&table, limit);
    Ok(())
}

/// Returns the number of invalid cells
fn cmd_validate(file: &Path, rules: &Path, options: &ParseOptions) -> ingestro_core::Result<usize> {
    let rules = RuleSet::load(rules)?;
    let mut store = Store::with_rules(rules);
    store.load_file(file, options)?;

    let table = store.get_data();
    let invalid = table.error_count();

    if invalid == 0 {
        println!("All {} rows valid", table.row_count());
        return Ok(0);
    }

    println!(
        "{} invalid cells in {} of {} rows:",
        invalid,
        table.invalid_rows().count(),
        table.row_count()
    );
    for row in table.invalid_rows() {
        for column in &table.columns {
            if let Some(error) = row.error(&column.id) {
                println!("  {} / {}: {} ({})", row.id, column.id, error, row.value(&column.id));
            }
        }
        // errors on ruled columns the file never mentions
        for (column_id, error) in &row.errors {
            if table.find_column(column_id).is_none() {
                println!("  {} / {}: {}", row.id, column_id, error);
            }
        }
    }

    Ok(invalid)
}

fn cmd_edit(
    file: &Path,
    rules: Option<&Path>,
    edits: &[String],
    format: ExportFormat,
    output: &Path,
    options: &ParseOptions,
) -> ingestro_core::Result<()> {
    let edits = edits
        .iter()
        .map(|text| CellEdit::parse(text))
        .collect::<ingestro_core::Result<Vec<_>>>()?;

    let rules = match rules {
        Some(path) => RuleSet::load(path)?,
        None => RuleSet::new(),
    };
    let mut store = Store::with_rules(rules);
    store.load_file(file, options)?;

    let report = apply_edits(&mut store, &edits);
    info!(applied = report.applied, skipped = report.skipped.len(), "edits applied");

    if !report.skipped.is_empty() {
        println!("Warning: {} edits could not be applied:", report.skipped.len());
        for (edit, reason) in &report.skipped {
            println!("  - Row {}, Column '{}': {}", edit.row_id, edit.column, reason);
        }
    }

    let table = store.get_data();
    export_table(table, output, format)?;

    println!(
        "Exported {} rows to {} ({} edits applied, {} invalid cells)",
        table.row_count(),
        output.display(),
        report.applied,
        table.error_count()
    );
    Ok(())
}

/// Returns the number of rejected files
fn cmd_check(roots: &[PathBuf], options: &ParseOptions) -> ingestro_core::Result<usize> {
    let result = scan_directory(roots, options)?;

    println!("Scanned {} root(s):", result.roots.len());
    for root in &result.roots {
        println!("  {}", root.display());
    }
    println!();

    for file in &result.files {
        match &file.outcome {
            Ok((rows, columns)) => {
                println!("  ok    {} ({} rows, {} columns)", file.path.display(), rows, columns)
            }
            Err(reason) => println!("  FAIL  {}: {}", file.path.display(), reason),
        }
    }

    let rejected = result.rejected().count();
    println!();
    println!(
        "{} files, {} parsed, {} rejected",
        result.files.len(),
        result.parsed().count(),
        rejected
    );
    Ok(rejected)
}

fn cmd_create_rules(file: &Path, output: &Path, options: &ParseOptions) -> ingestro_core::Result<()> {
    let table = parse_json_with(file, options)?;
    let rules = RuleSet::template_for(&table);
    rules.save(output)?;

    println!("Created rule set: {}", output.display());
    println!("Rules: {}", rules.len());
    println!();
    println!("Edit the file to tighten the rules, then run:");
    println!(
        "  ingestro validate --file {} --rules {}",
        file.display(),
        output.display()
    );
    Ok(())
}

fn print_rows(table: &Table, limit: usize) {
    let header: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    println!("id\t{}", header.join("\t"));
    println!("{}", "-".repeat((header.len() + 1) * 12));

    for row in table.rows.iter().take(limit) {
        let values: Vec<String> = table
            .columns
            .iter()
            .map(|c| row.value(&c.id).to_string_value())
            .collect();
        println!("{}\t{}", row.id, values.join("\t"));
    }

    if table.row_count() > limit {
        println!("... ({} more rows)", table.row_count() - limit);
    }
}
