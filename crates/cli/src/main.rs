mod summary;

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scribe_core::{
    config::{self, ScribeConfig},
    expand_inputs, RosterDocument, RosterParser,
};
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "scribe")]
#[command(about = "Parse BattleScribe rosters into normalized JSON")]
struct Cli {
    /// Settings file to use instead of the default location
    #[arg(long, global = true, env = "SCRIBE_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Write one interchange JSON document per roster
    Parse {
        /// Roster files or directories to scan
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Directory for `<roster>.json` files; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Pretty-print JSON written to stdout
        #[arg(long)]
        pretty: bool,
    },
    /// Print forces, units, model loadouts and costs
    Summary {
        /// Roster files or directories to scan
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.log_level)?;

    let parser = RosterParser::from_config(&config)?;
    match cli.cmd {
        Cmd::Parse {
            inputs,
            output,
            pretty,
        } => parse(&parser, &inputs, output.as_deref(), pretty),
        Cmd::Summary { inputs } => {
            for path in expand_inputs(&inputs)? {
                let roster = parser
                    .parse_file(&path)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
                print!("{}", summary::render(&roster));
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ScribeConfig> {
    match path {
        Some(path) => {
            config::ensure_config_at(path)?;
            ScribeConfig::load_from(path)
        }
        None => {
            config::ensure_default_config()?;
            ScribeConfig::load()
        }
    }
}

fn parse(
    parser: &RosterParser,
    inputs: &[PathBuf],
    output: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let paths = expand_inputs(inputs)?;
    let mut failures = 0usize;
    for path in &paths {
        let roster = match parser.parse_file(path) {
            Ok(roster) => roster,
            Err(err) => {
                error!("Failed to parse {}: {err}", path.display());
                failures += 1;
                continue;
            }
        };
        let document = RosterDocument::new(roster);
        match output {
            Some(dir) => {
                let target = output_path(dir, path);
                document.save(&target)?;
                info!("wrote {}", target.display());
            }
            None => println!("{}", document.to_json(pretty)?),
        }
    }

    anyhow::ensure!(
        failures == 0,
        "{failures} of {} rosters failed to parse",
        paths.len()
    );
    Ok(())
}

/// `<dir>/<roster file stem>.json`.
fn output_path(dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "roster".to_string());
    dir.join(format!("{stem}.json"))
}

fn init_logging(fallback_level: &str) -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("scribe.log");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_files_are_named_after_inputs() {
        let dir = Path::new("out");
        assert_eq!(
            output_path(dir, Path::new("armies/Marines 2000.rosz")),
            Path::new("out/Marines 2000.json")
        );
    }

    #[test]
    fn parse_writes_documents_and_reports_failures() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let inputs = temp.path().join("in");
        fs::create_dir_all(&inputs)?;
        fs::write(
            inputs.join("good.ros"),
            r#"<roster name="Good" gameSystemName="Warhammer 40,000 10th Edition"><forces/></roster>"#,
        )?;
        let output = temp.path().join("out");

        let parser = RosterParser::default();
        parse(&parser, &[inputs.clone()], Some(&output), false)?;
        let document = RosterDocument::load(output.join("good.json"))?;
        assert_eq!(document.roster.name, "Good");

        fs::write(
            inputs.join("bad.ros"),
            r#"<roster name="Bad" gameSystemName="Kill Team"/>"#,
        )?;
        assert!(parse(&parser, &[inputs], Some(&output), false).is_err());
        Ok(())
    }
}
