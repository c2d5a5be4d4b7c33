use crate::model::{AnalysisConfig, RunReport};
use crate::orchestrator;
use crate::render::ImageFormat;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "simstats",
    version,
    about = "Summary statistics and charts for parallel simulation benchmark results"
)]
pub struct Cli {
    /// JSON configuration file (defaults to <config dir>/simstats/config.json when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Confidence level for the mean's interval, between 0 and 1
    #[arg(long, global = true)]
    pub confidence: Option<f64>,

    /// Chart image format
    #[arg(long, global = true, value_enum, default_value_t = ImageFormat::Svg)]
    pub format: ImageFormat,

    /// Print the run report as JSON instead of text lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Summary statistics and error-bar charts for one source directory
    Stats {
        /// Directory holding the raw CSV and the sequential baseline file
        dir: PathBuf,

        /// Base name of the raw data file inside the directory
        #[arg(long)]
        raw_name: Option<String>,
    },
    /// Bar and line charts from a single CSV file
    Plot {
        /// CSV file to chart
        file: PathBuf,
    },
    /// Overlay charts across every source directory matching a glob
    Unified {
        /// Glob over source directories, e.g. `results/*`
        pattern: String,
    },
}

/// Configuration file layered with the command-line overrides.
pub fn build_config(args: &Cli) -> Result<AnalysisConfig> {
    let mut cfg = crate::config::load(args.config.as_deref())?;
    if let Some(confidence) = args.confidence {
        cfg.confidence = confidence;
    }
    if let Command::Stats {
        raw_name: Some(name),
        ..
    } = &args.command
    {
        cfg.raw_data_name = name.clone();
    }
    crate::config::validate(&cfg)?;
    Ok(cfg)
}

pub fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;
    let report = match &args.command {
        Command::Stats { dir, .. } => orchestrator::run_stats(dir, &cfg, args.format)?,
        Command::Plot { file } => orchestrator::run_plot(file, &cfg, args.format)?,
        Command::Unified { pattern } => orchestrator::run_unified(pattern, &cfg, args.format)?,
    };
    print_report(&report, args.json)
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        let text = serde_json::to_string_pretty(report).context("failed to serialize report")?;
        writeln!(out, "{text}")?;
    } else {
        for line in crate::text_summary::build_text_summary(report).lines {
            writeln!(out, "{line}")?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "simstats",
            "stats",
            "runs/phold",
            "--raw-name",
            "ladderq",
            "--confidence",
            "0.9",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.format, ImageFormat::Svg);
        let cfg = build_config(&Cli {
            config: Some(write_empty_config()),
            ..cli
        })
        .unwrap();
        assert_eq!(cfg.raw_data_name, "ladderq");
        assert_eq!(cfg.confidence, 0.9);
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let cli =
            Cli::try_parse_from(["simstats", "--confidence", "1.5", "plot", "a.csv"]).unwrap();
        let cli = Cli {
            config: Some(write_empty_config()),
            ..cli
        };
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn positional_argument_is_required() {
        assert!(Cli::try_parse_from(["simstats", "unified"]).is_err());
        assert!(Cli::try_parse_from(["simstats", "plot", "a.csv", "b.csv"]).is_err());
    }

    fn write_empty_config() -> PathBuf {
        let file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap()
            .into_temp_path()
            .keep()
            .unwrap();
        std::fs::write(&file, "{}").unwrap();
        file
    }
}
