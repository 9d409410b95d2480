use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use relsql::ir::SelectExpression;
use relsql::sql::{DialectKind, ParameterValues};
use relsql::{CompilerConfig, QueryCompiler};

/// Compile a JSON query tree into dialect SQL
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// JSON-encoded SelectExpression (reads stdin when omitted)
    input: Option<PathBuf>,

    /// Target dialect: generic, postgres, sqlite or sqlserver
    #[arg(long, value_parser = parse_dialect)]
    dialect: Option<DialectKind>,

    /// Emulate OFFSET/LIMIT with ROW_NUMBER()
    #[arg(long = "row-number-paging")]
    row_number_paging: bool,

    /// JSON object of parameter values keyed by name
    #[arg(long)]
    params: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective settings back to the config file
    #[arg(long = "save-config")]
    save_config: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_dialect(s: &str) -> std::result::Result<DialectKind, String> {
    s.parse()
}

fn main() -> Result<()> {
    // Setup logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CompilerConfig::load_from(path)?,
        None => CompilerConfig::load()?,
    };
    if let Some(dialect) = cli.dialect {
        config.dialect = dialect;
    }
    if cli.row_number_paging {
        config.row_number_paging = true;
    }
    if cli.save_config {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(CompilerConfig::get_config_path);
        config
            .save_to(&config_path)
            .with_context(|| format!("saving {}", config_path.display()))?;
    }

    let input = read_input(cli.input.as_ref())?;
    let select: SelectExpression =
        serde_json::from_str(&input).context("parsing query tree JSON")?;

    let values = match &cli.params {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing parameters in {}", path.display()))?
        }
        None => ParameterValues::new(),
    };

    let compiler = QueryCompiler::new(config);
    tracing::debug!(passes = ?compiler.pass_names(), "compiler ready");
    let compiled = compiler.compile(select, &values)?;

    match cli.format {
        OutputFormat::Text => {
            println!("{}", compiled.sql);
            for p in &compiled.parameters {
                eprintln!("-- {} = {:?}", p.placeholder, p.value);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&compiled)?);
        }
    }

    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading query tree from stdin")?;
            Ok(buf)
        }
    }
}
