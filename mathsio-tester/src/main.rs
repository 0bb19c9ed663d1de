mod logic;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use mathsio_game::{GameModeId, ModeCatalog};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{ScenarioResult, SessionTester, SimulationPlan};
use util::{resolve_modes, resolve_seeds, split_csv};

#[derive(Debug, Parser)]
#[command(name = "mathsio-tester", version = "0.1.0")]
#[command(about = "Automated QA for the Mathsio engine - simulated players checked against session rules")]
struct Args {
    /// Game modes to simulate (comma-separated keys, or `all`)
    #[arg(long, default_value = "all")]
    modes: String,

    /// List all game modes and exit
    #[arg(long)]
    list_modes: bool,

    /// Seeds to run (comma-separated, decimal or 0x-prefixed hex)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of sessions per mode and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Chance in percent that the simulated player answers correctly
    #[arg(long, default_value_t = 80)]
    #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
    accuracy: u8,

    /// Seconds the simulated player spends per question on timed modes
    #[arg(long, default_value_t = 15)]
    seconds_per_answer: u32,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_modes(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let modes = resolve_modes(&split_csv(&args.modes))?;
    let seeds = resolve_seeds(&split_csv(&args.seeds))?;
    log::debug!("simulating {} modes over {} seeds", modes.len(), seeds.len());

    let results = run_simulations(&args, &modes, &seeds);
    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_modes(args: &Args) -> Result<bool> {
    if !args.list_modes {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available modes:")?;
    for mode in &ModeCatalog::default_catalog().modes {
        writeln!(
            output_target.writer(),
            "  {:10} - {}: {}",
            mode.id.key(),
            mode.name,
            mode.description
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🧮 Mathsio Automated Tester".bright_cyan().bold());
    println!("{}", "===========================".cyan());
}

fn run_simulations(args: &Args, modes: &[GameModeId], seeds: &[u64]) -> Vec<ScenarioResult> {
    println!("{}", "🧠 Simulating Sessions".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let tester = SessionTester::new(args.verbose);
    modes
        .iter()
        .flat_map(|&mode| {
            let plan = SimulationPlan::new(mode, args.accuracy, args.seconds_per_answer);
            tester.run_plan(&plan, seeds, args.iterations)
        })
        .collect()
}

fn write_reports(args: &Args, results: &[ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(&mut output_target, results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Mathsio Session Simulation Results\n\n_No sessions simulated._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        _ => {
            logic::reports::generate_console_report(
                &mut output_target,
                results,
                start_time.elapsed(),
            )?;
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args(output: PathBuf) -> Args {
        Args {
            modes: "express".to_string(),
            list_modes: false,
            seeds: "5".to_string(),
            iterations: 2,
            accuracy: 100,
            seconds_per_answer: 15,
            report: "json".to_string(),
            verbose: false,
            output: Some(output),
        }
    }

    fn temp_path(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "mathsio-main-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn json_report_written_to_file() {
        let path = temp_path("json");
        let args = base_args(path.clone());
        let results = run_simulations(&args, &[GameModeId::Express], &[5]);
        write_reports(&args, &results, Instant::now()).unwrap();
        let parsed: Vec<ScenarioResult> =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(parsed[0].passed);
        assert_eq!(parsed[0].iterations_run, 2);
    }

    #[test]
    fn empty_markdown_report_is_explicit() {
        let path = temp_path("md");
        let mut args = base_args(path.clone());
        args.report = "markdown".to_string();
        write_reports(&args, &[], Instant::now()).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("_No sessions simulated._"));
    }

    #[test]
    fn list_modes_skips_when_not_requested() {
        let args = base_args(temp_path("skip"));
        assert!(!maybe_list_modes(&args).unwrap());
    }
}
