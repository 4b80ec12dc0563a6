use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use adaptc_tooling::history::ErrorHistory;
use adaptc_tooling::report::{analyze_code, fix_code};
use adaptc_tooling::repair::DEFAULT_MAX_PASSES;
use adaptc_tooling::{apply_edit, RepairStrategy, RepairTool, Ruleset, SourceBuffer};

#[cfg(feature = "serve")]
mod serve;

#[derive(Parser)]
#[command(
    name = "adaptc",
    about = "adaptc — detect common C defects and propose minimal fixes"
)]
struct Cli {
    /// JSON ruleset overriding the checked call and header.
    #[arg(long, global = true)]
    rules: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a source file and report diagnostics with suggested fixes.
    Check {
        /// Source file (.c)
        file: PathBuf,
        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
        /// Write the JSON report to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Append the diagnostics to this history file.
        #[arg(long)]
        record: Option<PathBuf>,
    },
    /// List suggested fixes, or apply one of them in place.
    Fix {
        /// Source file (.c)
        file: PathBuf,
        /// Print the edits as JSON.
        #[arg(long)]
        json: bool,
        /// Apply the Nth listed fix (1-based) and rewrite the file.
        #[arg(long)]
        apply: Option<usize>,
    },
    /// Apply fixes one at a time until the file is clean or no fix applies.
    Repair {
        /// Source file (.c)
        file: PathBuf,
        /// "best" (default), "first", or a diagnostic kind such as ExtraSemicolon.
        #[arg(long, default_value = "best")]
        strategy: String,
        /// Upper bound on analyze/fix rounds.
        #[arg(long, default_value_t = DEFAULT_MAX_PASSES)]
        max_passes: usize,
        /// Print the repaired source instead of writing it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the token stream of a source file.
    Tokens {
        /// Source file (.c)
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Summarize a diagnostics history file.
    History {
        /// History file written by `check --record` or `serve --history`.
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Serve the analyze/fix endpoints over HTTP (requires --features serve).
    #[cfg(feature = "serve")]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to listen on.
        #[arg(short, long, env = "BACKEND_PORT", default_value_t = 8000)]
        port: u16,
        /// Record every analyzed request's diagnostics to this file.
        #[arg(long)]
        history: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:?}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let rules = load_rules(cli.rules.as_deref())?;

    match cli.command {
        Command::Check {
            file,
            json,
            output,
            record,
        } => {
            let source = read_source(&file)?;
            let report = analyze_code(&source, &rules);

            if let Some(path) = record {
                let mut history = ErrorHistory::load(&path)?;
                history.record(&report.diagnostics);
                history.save()?;
                debug!(path = %path.display(), "recorded diagnostics");
            }

            if json || output.is_some() {
                let json_str = report.to_json();
                if let Some(out_path) = output {
                    fs::write(&out_path, &json_str)
                        .with_context(|| format!("failed to write {}", out_path.display()))?;
                    println!("report written to {}", out_path.display());
                } else {
                    println!("{json_str}");
                }
            } else if report.is_success() {
                println!("no diagnostics");
            } else {
                print!("{}", report.to_human(&file.display().to_string()));
            }

            if !report.is_success() {
                return Ok(ExitCode::from(1));
            }
        }
        Command::Fix { file, json, apply } => {
            let source = read_source(&file)?;
            let edits = fix_code(&source, &rules).edits;

            if let Some(n) = apply {
                let Some(edit) = n.checked_sub(1).and_then(|i| edits.get(i)) else {
                    bail!("no fix #{n}: {} fix(es) available", edits.len());
                };
                let repaired = apply_edit(&SourceBuffer::new(&source), edit);
                fs::write(&file, repaired.to_text())
                    .with_context(|| format!("failed to write {}", file.display()))?;
                println!("applied: {edit}");
            } else if json {
                println!("{}", serde_json::to_string_pretty(&edits)?);
            } else if edits.is_empty() {
                println!("no fixes");
            } else {
                for (i, e) in edits.iter().enumerate() {
                    println!("{}. {e}", i + 1);
                }
            }
        }
        Command::Repair {
            file,
            strategy,
            max_passes,
            dry_run,
        } => {
            let strategy: RepairStrategy = strategy.parse().map_err(anyhow::Error::msg)?;
            let source = SourceBuffer::new(&read_source(&file)?);
            let (repaired, result) = RepairTool::new(&rules, strategy)
                .max_passes(max_passes)
                .repair(&source);

            if dry_run {
                print!("{repaired}");
            } else if !result.applied.is_empty() {
                fs::write(&file, repaired.to_text())
                    .with_context(|| format!("failed to write {}", file.display()))?;
            }

            if result.applied.is_empty() {
                eprintln!("no edits applied ({})", result.stop);
            } else {
                eprintln!("applied {} edit(s):", result.applied.len());
                for a in &result.applied {
                    eprintln!("  pass {}: [{}] {}", a.pass, a.edit.kind, a.edit.description);
                }
            }
            eprintln!(
                "diagnostics: {} -> {} ({})",
                result.diagnostics_before, result.diagnostics_after, result.stop
            );

            if !result.verify_passed {
                return Ok(ExitCode::from(1));
            }
        }
        Command::Tokens { file, json } => {
            let source = read_source(&file)?;
            let tokens = adaptc_lexer::lex(&source)
                .with_context(|| format!("failed to tokenize {}", file.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tokens)?);
            } else {
                for t in &tokens {
                    println!("{:>4}  {:<10} {}", t.line, format!("{:?}", t.kind), t.value);
                }
            }
        }
        Command::History { file, json } => {
            let summary = ErrorHistory::load(&file)?.summary();
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", summary.to_human());
            }
        }
        #[cfg(feature = "serve")]
        Command::Serve {
            host,
            port,
            history,
        } => {
            serve::run_serve(serve::ServeOptions {
                host,
                port,
                rules,
                history,
            })?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn load_rules(path: Option<&Path>) -> anyhow::Result<Ruleset> {
    match path {
        Some(path) => {
            let rules = Ruleset::load(path)?;
            info!(call = %rules.call, header = %rules.header, "using custom ruleset");
            Ok(rules)
        }
        None => Ok(Ruleset::default()),
    }
}

fn read_source(file: &Path) -> anyhow::Result<String> {
    fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
}
