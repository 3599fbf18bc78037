//! CLI definition and dispatch.

use clap::Parser;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_adapter::JsonAdapter;
use crate::domain::candle::Candle;
use crate::domain::error::ConvertError;
use crate::domain::job::{ConversionJob, Settings};
use crate::domain::naming::{INPUT_EXTENSION, derive_output_name};
use crate::domain::resample;
use crate::domain::timeframe::Timeframe;
use crate::ports::candle_port::CandlePort;
use crate::ports::config_port::ConfigPort;
use crate::ports::row_port::RowPort;

const CONFIG_SECTION: &str = "convert";

#[derive(Parser, Debug)]
#[command(
    name = "convert",
    about = "Convert Kraken OHLCVT CSV files into JSON candle files"
)]
pub struct Cli {
    /// Input CSV file or directory of CSV files
    #[arg(value_name = "INPUT_PATH", default_value = ".")]
    pub input: PathBuf,
    /// Quote currency used to select files and split the asset name [default: EUR]
    #[arg(short, long)]
    pub fiat: Option<String>,
    /// Output file (single-file mode) or directory (directory mode)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Target timeframe such as 5m, 1h or 1d; repeat for several outputs
    #[arg(short, long = "timeframe", value_name = "TF")]
    pub timeframes: Vec<String>,
    /// INI file with a [convert] section
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Outcome of one written output file.
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub output_path: PathBuf,
    pub rows: usize,
    pub candles: usize,
}

pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(&cli) {
        Ok(reports) => {
            for report in &reports {
                println!("{}", report.output_path.display());
            }
            info!(files = reports.len(), "conversion complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Loads config, plans jobs and converts every input.
pub fn execute(cli: &Cli) -> Result<Vec<JobReport>, ConvertError> {
    let adapter = match &cli.config {
        Some(path) => Some(load_config(path)?),
        None => None,
    };
    let settings = resolve_settings(cli, adapter.as_ref().map(|a| a as &dyn ConfigPort))?;
    let jobs = plan_jobs(&cli.input, &settings)?;
    run_jobs(&jobs, &CsvAdapter::new(), &JsonAdapter::new())
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ConvertError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path).map_err(|e| ConvertError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Merges command-line flags over config values over defaults.
pub fn resolve_settings(cli: &Cli, config: Option<&dyn ConfigPort>) -> Result<Settings, ConvertError> {
    let mut settings = Settings::default();

    if let Some(config) = config {
        if let Some(fiat) = config.get_string(CONFIG_SECTION, "fiat") {
            settings.fiat = fiat;
        }
        if let Some(output) = config.get_string(CONFIG_SECTION, "output") {
            settings.output = Some(PathBuf::from(output));
        }
        settings.timeframes = config
            .get_list(CONFIG_SECTION, "timeframes")
            .iter()
            .map(|s| {
                s.parse::<Timeframe>().map_err(|e| ConvertError::ConfigInvalid {
                    key: format!("[{CONFIG_SECTION}] timeframes"),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
    }

    if let Some(fiat) = &cli.fiat {
        settings.fiat = fiat.clone();
    }
    if let Some(output) = &cli.output {
        settings.output = Some(output.clone());
    }
    if !cli.timeframes.is_empty() {
        settings.timeframes = cli
            .timeframes
            .iter()
            .map(|s| s.parse::<Timeframe>())
            .collect::<Result<Vec<_>, _>>()?;
    }

    settings.timeframes.sort();
    settings.timeframes.dedup();

    if settings.fiat.trim().is_empty() {
        return Err(ConvertError::ConfigInvalid {
            key: "fiat".into(),
            reason: "must not be empty".into(),
        });
    }
    Ok(settings)
}

/// Expands an input path into conversion jobs.
pub fn plan_jobs(input: &Path, settings: &Settings) -> Result<Vec<ConversionJob>, ConvertError> {
    if input.is_dir() {
        plan_directory(input, settings)
    } else if input.is_file() {
        plan_file(input, settings)
    } else {
        Err(ConvertError::NotAFile {
            path: input.display().to_string(),
        })
    }
}

fn plan_directory(dir: &Path, settings: &Settings) -> Result<Vec<ConversionJob>, ConvertError> {
    let output_dir = settings.output.as_deref().unwrap_or(dir);
    if !output_dir.is_dir() {
        return Err(ConvertError::NotAFile {
            path: output_dir.display().to_string(),
        });
    }

    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()?;
    entries.sort();

    let suffix = format!(".{INPUT_EXTENSION}");
    let mut jobs = Vec::new();

    for path in entries {
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!(path = %path.display(), "skipping non UTF-8 file name");
            continue;
        };
        if !file_name.ends_with(&suffix) {
            debug!(file = file_name, "skipping non-CSV entry");
            continue;
        }

        let name = match derive_output_name(file_name, &settings.fiat) {
            Ok(name) => name,
            Err(e) => {
                warn!("skipping {e}");
                continue;
            }
        };

        match ConversionJob::for_named_input(&path, &name, &settings.timeframes, output_dir) {
            Ok(file_jobs) => jobs.extend(file_jobs),
            Err(e) => warn!(file = file_name, "skipping: {e}"),
        }
    }

    if jobs.is_empty() {
        warn!(dir = %dir.display(), fiat = %settings.fiat, "no matching CSV files");
    }
    Ok(one_job_per_output(jobs))
}

/// Drops jobs that would overwrite another job's output.
///
/// The job reading the coarsest source wins; ties keep the first in order.
fn one_job_per_output(jobs: Vec<ConversionJob>) -> Vec<ConversionJob> {
    let mut winners: HashMap<&Path, usize> = HashMap::new();
    for (index, job) in jobs.iter().enumerate() {
        let winner = winners.entry(job.output_path.as_path()).or_insert(index);
        if *winner == index {
            continue;
        }
        let kept = &jobs[*winner];
        let (keep, skip) = if job.source > kept.source {
            (index, *winner)
        } else {
            (*winner, index)
        };
        warn!(
            output = %job.output_path.display(),
            kept = %jobs[keep].input_path.display(),
            skipped = %jobs[skip].input_path.display(),
            "several inputs map to the same output"
        );
        *winner = keep;
    }

    let keep: Vec<bool> = jobs
        .iter()
        .enumerate()
        .map(|(index, job)| winners.get(job.output_path.as_path()) == Some(&index))
        .collect();
    jobs.into_iter()
        .zip(keep)
        .filter_map(|(job, keep)| keep.then_some(job))
        .collect()
}

fn plan_file(path: &Path, settings: &Settings) -> Result<Vec<ConversionJob>, ConvertError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let derived = derive_output_name(&file_name, &settings.fiat);

    match settings.output.as_deref() {
        Some(output) if !output.is_dir() => {
            if settings.timeframes.len() > 1 {
                return Err(ConvertError::ConfigInvalid {
                    key: "output".into(),
                    reason: "a single output file cannot hold several timeframes; pass a directory"
                        .into(),
                });
            }
            let (source, resample_to) = match (settings.timeframes.first(), derived) {
                (None, Ok(name)) => (Some(name.timeframe), None),
                (None, Err(_)) => (None, None),
                (Some(&target), Ok(name)) => {
                    target.ensure_resamplable_from(name.timeframe)?;
                    (
                        Some(name.timeframe),
                        (target != name.timeframe).then_some(target),
                    )
                }
                (Some(_), Err(e)) => return Err(e.into()),
            };
            Ok(vec![ConversionJob {
                input_path: path.to_path_buf(),
                fiat: settings.fiat.clone(),
                source,
                resample_to,
                output_path: output.to_path_buf(),
            }])
        }
        Some(output_dir) => {
            ConversionJob::for_named_input(path, &derived?, &settings.timeframes, output_dir)
        }
        None => {
            let output_dir = path.parent().unwrap_or_else(|| Path::new(""));
            ConversionJob::for_named_input(path, &derived?, &settings.timeframes, output_dir)
        }
    }
}

/// Runs jobs in order, reading each input file once for all of its targets.
pub fn run_jobs(
    jobs: &[ConversionJob],
    rows_port: &dyn RowPort,
    candle_port: &dyn CandlePort,
) -> Result<Vec<JobReport>, ConvertError> {
    let mut reports = Vec::with_capacity(jobs.len());

    for group in jobs.chunk_by(|a, b| a.input_path == b.input_path) {
        let input = &group[0].input_path;
        debug!(input = %input.display(), "reading rows");
        let rows = rows_port.read_rows(input)?;

        for job in group {
            let candles = resample::convert(&rows, job.resample_to)?;
            candle_port.write_candles(&candles, &job.output_path)?;

            info!(
                input = %input.display(),
                output = %job.output_path.display(),
                rows = rows.len(),
                candles = candles.len(),
                "converted"
            );
            reports.push(JobReport {
                output_path: job.output_path.clone(),
                rows: rows.len(),
                candles: candles.len(),
            });
        }
    }

    Ok(reports)
}

/// Parses headerless OHLCVT CSV from `input` and converts it to candles.
pub fn convert_reader<R: Read>(input: R, timeframe: Option<Timeframe>) -> Result<Vec<Candle>, ConvertError> {
    let rows = CsvAdapter::parse_rows(input)?;
    resample::convert(&rows, timeframe)
}
