//! Command handlers

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value;
use walkdir::WalkDir;

use weee_app::{ClassificationEngine, ClassifyOptions, Config};
use weee_domain::rules::{NON_EEE_KEYWORDS, RULES};
use weee_types::{ClassificationResult, Error, OutputFormat, Result, WeeeCategory};
use weee_vision::{Arbiter, CommandArbiter};

use crate::cli::{Cli, Commands, ConfigAction};
use crate::output::{category_summary, output_result};

pub async fn execute(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let format = cli.format.unwrap_or(config.output_format);

    match cli.command {
        Commands::Classify {
            payload,
            llm,
            timeout_secs,
            arbiter_cmd,
        } => {
            classify_one(
                &config,
                format,
                cli.verbose,
                &payload,
                llm,
                timeout_secs,
                arbiter_cmd,
            )
            .await
        }
        Commands::Batch {
            dir,
            llm,
            arbiter_cmd,
        } => batch(&config, format, &dir, llm, arbiter_cmd).await,
        Commands::Rules => {
            print_rules();
            Ok(())
        }
        Commands::Config { action } => handle_config(action, config),
    }
}

fn build_engine(config: &Config, arbiter_cmd: Option<String>) -> Result<ClassificationEngine> {
    let command = arbiter_cmd.or_else(|| config.arbiter_command.clone());
    let arbiter: Option<Arc<dyn Arbiter>> =
        command.map(|cmd| Arc::new(CommandArbiter::new(cmd)) as Arc<dyn Arbiter>);
    ClassificationEngine::new(config.engine_config()?, arbiter)
}

fn read_payload(path: &Path) -> Result<Value> {
    let content = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        std::fs::read_to_string(path)?
    };
    serde_json::from_str(&content)
        .map_err(|e| Error::MalformedDetectorOutput(format!("payload is not valid JSON: {}", e)))
}

async fn classify_one(
    config: &Config,
    format: OutputFormat,
    verbose: bool,
    payload_path: &Path,
    llm: bool,
    timeout_secs: Option<u64>,
    arbiter_cmd: Option<String>,
) -> Result<()> {
    let engine = build_engine(config, arbiter_cmd)?;
    let payload = read_payload(payload_path)?;

    let mut options = ClassifyOptions::new().with_force_arbitration(llm);
    if let Some(secs) = timeout_secs {
        options = options.with_timeout(Duration::from_secs(secs));
    }

    let start = Instant::now();
    let result = engine.classify(&payload, &options).await?;
    if verbose {
        eprintln!("Classified in {:.2}s", start.elapsed().as_secs_f64());
    }

    output_result(format, &result)
}

#[derive(Debug, Serialize)]
struct BatchEntry {
    file: String,
    result: ClassificationResult,
}

async fn batch(
    config: &Config,
    format: OutputFormat,
    dir: &Path,
    llm: bool,
    arbiter_cmd: Option<String>,
) -> Result<()> {
    if !dir.is_dir() {
        return Err(Error::FileNotFound(dir.display().to_string()));
    }
    let engine = build_engine(config, arbiter_cmd)?;
    let options = ClassifyOptions::new().with_force_arbitration(llm);

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "json")
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();

    let progress = ProgressBar::new(files.len() as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
    {
        progress.set_style(style);
    }

    let mut entries: Vec<BatchEntry> = Vec::new();
    let mut counts: Vec<(WeeeCategory, usize)> = WeeeCategory::CATEGORIES
        .iter()
        .map(|c| (*c, 0))
        .chain(std::iter::once((WeeeCategory::Unknown, 0)))
        .collect();
    let mut failures: Vec<(PathBuf, Error)> = Vec::new();

    for file in files {
        progress.set_message(file.display().to_string());
        match read_payload(&file) {
            Ok(payload) => match engine.classify(&payload, &options).await {
                Ok(result) => {
                    if let Some(slot) = counts.iter_mut().find(|(c, _)| *c == result.category) {
                        slot.1 += 1;
                    }
                    if format == OutputFormat::Table {
                        progress.println(format!(
                            "{} -> {} ({:.0}%, {})",
                            file.display(),
                            result.category,
                            result.confidence * 100.0,
                            result.method
                        ));
                    }
                    entries.push(BatchEntry {
                        file: file.display().to_string(),
                        result,
                    });
                }
                Err(e) => failures.push((file, e)),
            },
            Err(e) => failures.push((file, e)),
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        println!("\nBatch Summary");
        println!("=============");
        println!("Classified:  {}", entries.len());
        println!("Failed:      {}", failures.len());
        let summary = category_summary(&counts);
        if !summary.is_empty() {
            println!("\nBy category:");
            print!("{}", summary);
        }
    }

    for (file, error) in &failures {
        eprintln!("Error: {}: {}", file.display(), error);
    }

    Ok(())
}

fn print_rules() {
    println!("Keyword rules ({} entries):", RULES.len());
    for entry in RULES {
        println!(
            "  {:<20} -> {:<22} weight {:.1}",
            entry.keyword,
            entry.category.code(),
            entry.weight
        );
    }
    println!("\nNon-EEE keywords: {} entries", NON_EEE_KEYWORDS.len());
}

fn handle_config(action: ConfigAction, mut config: Config) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path()?.display());
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            apply_config_value(&mut config, &key, &value)?;
            // Reject out-of-range values before persisting them
            config.engine_config()?;
            config.save()?;
            println!("Saved {} = {}", key, value);
            Ok(())
        }
    }
}

fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    fn parse_f64(key: &str, value: &str) -> Result<f64> {
        value
            .parse()
            .map_err(|_| Error::InvalidConfiguration(format!("{} expects a number, got '{}'", key, value)))
    }

    match key {
        "margin" => config.margin = parse_f64(key, value)?,
        "floor" => config.floor = parse_f64(key, value)?,
        "disagreement_discount" => config.disagreement_discount = parse_f64(key, value)?,
        "arbiter_timeout_secs" => {
            config.arbiter_timeout_secs = if value == "none" {
                None
            } else {
                Some(value.parse().map_err(|_| {
                    Error::InvalidConfiguration(format!(
                        "arbiter_timeout_secs expects seconds or 'none', got '{}'",
                        value
                    ))
                })?)
            }
        }
        "arbiter_command" => {
            config.arbiter_command = if value == "none" {
                None
            } else {
                Some(value.to_string())
            }
        }
        "size_fallback" => {
            config.size_fallback = value.parse().map_err(|_| {
                Error::InvalidConfiguration(format!(
                    "size_fallback expects true or false, got '{}'",
                    value
                ))
            })?
        }
        "output_format" => {
            config.output_format = match value {
                "table" => OutputFormat::Table,
                "json" => OutputFormat::Json,
                other => {
                    return Err(Error::InvalidConfiguration(format!(
                        "output_format expects table or json, got '{}'",
                        other
                    )))
                }
            }
        }
        other => {
            return Err(Error::InvalidConfiguration(format!(
                "unknown configuration key '{}'",
                other
            )))
        }
    }
    Ok(())
}
