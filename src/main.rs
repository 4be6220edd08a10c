use std::path::{Path, PathBuf};

use anyhow::anyhow;
use clap::Parser as ClapParser;
use clap::Subcommand;
use indexmap::IndexMap;
use serde::Serialize;
use sqljoins::config::Config;
use sqljoins::extractor::JoinNames;
use sqljoins::parser::Diagnostic;
use sqljoins::scan::JoinScanner;
use std::time::Instant;

#[derive(clap::Parser)]
#[command(name = "sqljoins")]
#[command(about = "T-SQL join table and column extractor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract join tables and columns from one or more SQL files.
    ExtractJoins(JoinsCommand),
}

#[derive(clap::Args)]
struct JoinsCommand {
    /// Path to a TOML file with stop patterns, stop functions and dialect.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Path to the SQL file or directory containing SQL files.
    #[arg(value_name = "SQL_[FILE|DIR]")]
    sql: PathBuf,
    /// Include the statements that were cut out of each script.
    #[arg(long)]
    include_statements: bool,
    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
enum OutJoins {
    Ok(OkJoins),
    ErrJoins { error: String },
}

#[derive(Serialize)]
struct OkJoins {
    #[serde(flatten)]
    joins: JoinNames,
    diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    statements: Option<Vec<String>>,
}

fn output_joins(
    joins_command: &JoinsCommand,
    scanner: &JoinScanner,
    sql_file_path: &Path,
) -> OutJoins {
    let sql = match std::fs::read_to_string(sql_file_path) {
        Ok(sql) => sql,
        Err(err) => {
            return OutJoins::ErrJoins {
                error: format!(
                    "Failed to read sql file {} due to error: {}",
                    sql_file_path.display(),
                    err
                ),
            };
        }
    };
    log::info!("Scanning {}", sql_file_path.display());
    let report = scanner.scan_script(&sql);
    OutJoins::Ok(OkJoins {
        joins: report.joins,
        diagnostics: report.diagnostics,
        statements: if joins_command.include_statements {
            Some(report.statements)
        } else {
            None
        },
    })
}

fn main() -> anyhow::Result<()> {
    let now = Instant::now();

    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::ExtractJoins(joins_command) => {
            let config = match &joins_command.config {
                Some(path) => Config::from_file(path)?,
                None => Config::default(),
            };
            let scanner = JoinScanner::from_config(&config)?;

            let sql_file_or_dir = &joins_command.sql;
            let out_str = if sql_file_or_dir.is_dir() {
                let mut file_joins: IndexMap<String, OutJoins> = IndexMap::new();
                let mut sql_in_dir: Vec<_> = std::fs::read_dir(sql_file_or_dir)
                    .map_err(|err| {
                        anyhow!(
                            "Failed to read directory {} due to error: {}",
                            sql_file_or_dir.display(),
                            err
                        )
                    })?
                    .filter_map(|res| res.ok())
                    .map(|entry| entry.path())
                    .filter(|file| file.extension().is_some_and(|ext| ext == "sql"))
                    .collect();
                sql_in_dir.sort();

                for sql_file in sql_in_dir {
                    let joins = output_joins(joins_command, &scanner, &sql_file);
                    file_joins.insert(
                        std::path::absolute(&sql_file)?.display().to_string(),
                        joins,
                    );
                }

                if joins_command.pretty {
                    serde_json::to_string_pretty(&file_joins)?
                } else {
                    serde_json::to_string(&file_joins)?
                }
            } else {
                let joins = output_joins(joins_command, &scanner, sql_file_or_dir);
                if joins_command.pretty {
                    serde_json::to_string_pretty(&joins)?
                } else {
                    serde_json::to_string(&joins)?
                }
            };
            println!("{}", out_str);
        }
    }

    let elapsed = now.elapsed();
    log::info!("Elapsed: {:.2?}", elapsed);

    Ok(())
}
