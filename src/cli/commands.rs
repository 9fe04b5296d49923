use crate::cli::args::{Cli, Commands, RangeArgs, SourceArgs};
use crate::config::Settings;
use crate::error::ProcessingError;
use crate::models::{DatasetSelection, ReferenceTables, StationFileKey};
use crate::processors::{
    Consolidator, DateRange, DateRangeFilter, TemporalAggregator, ThermalInputs,
    ThermalRoleResolver,
};
use crate::readers::{CatalogReader, ReferenceReader, SeriesReader};
use crate::utils::filename::generate_default_output_filename;
use crate::utils::progress::ProgressReporter;
use crate::writers::{CsvWriter, ParquetWriter};
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Where an output table goes, decided by the file extension.
enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => OutputFormat::Parquet,
            _ => OutputFormat::Csv,
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Commands::Catalog { data_dir, stations } => {
            apply_sources(
                &mut settings,
                &SourceArgs {
                    data_dir,
                    glossary: None,
                    stations,
                },
            );
            run_catalog(&settings)
        }

        Commands::Consolidate {
            source,
            range,
            output,
            tag,
            station,
            file,
            report,
            means,
            compression,
            max_workers,
        } => {
            apply_sources(&mut settings, &source);
            if let Some(compression) = compression {
                settings.compression = compression;
            }
            if let Some(max_workers) = max_workers {
                settings.max_workers = max_workers.max(1);
            }

            let selection = DatasetSelection {
                source_file: file,
                variable_tag: tag,
                station_code: station,
            };
            run_consolidate(
                &settings,
                cli.quiet,
                &selection,
                range,
                output,
                report,
                means,
            )
        }

        Commands::Inspect {
            file,
            range,
            export,
        } => run_inspect(&settings, &file, range, export),

        Commands::Indices {
            tbs,
            tbh,
            tr,
            vv,
            source,
            station,
            range,
            output,
            means,
            means_column,
        } => {
            apply_sources(&mut settings, &source);

            let inputs = match (tbs, tbh, tr, vv) {
                (Some(tbs), Some(tbh), Some(tr), Some(vv)) => {
                    ThermalInputs::from_paths(&tbs, &tbh, &tr, &vv)?
                }
                (None, None, None, None) => {
                    let tables = load_tables(&settings)?;
                    let data_dir = settings.require_data_dir()?;
                    let catalog = CatalogReader::with_extension(&settings.data_extension)
                        .scan_directory(data_dir)
                        .with_context(|| format!("Failed to list {}", data_dir.display()))?;
                    ThermalRoleResolver::new(&tables).resolve(&catalog, station)?
                }
                _ => bail!("--tbs, --tbh, --tr and --vv must be given together"),
            };

            run_indices(
                &settings,
                cli.quiet,
                &inputs,
                range,
                output,
                means,
                &means_column,
            )
        }
    }
}

fn apply_sources(settings: &mut Settings, source: &SourceArgs) {
    if let Some(dir) = &source.data_dir {
        settings.data_dir = Some(dir.clone());
    }
    if let Some(path) = &source.glossary {
        settings.glossary_path = Some(path.clone());
    }
    if let Some(path) = &source.stations {
        settings.stations_path = Some(path.clone());
    }
}

fn load_tables(settings: &Settings) -> Result<ReferenceTables> {
    let glossary = settings
        .glossary_path
        .as_deref()
        .ok_or_else(|| ProcessingError::Config("glossary_path is not set".to_string()))?;
    let stations = settings
        .stations_path
        .as_deref()
        .ok_or_else(|| ProcessingError::Config("stations_path is not set".to_string()))?;

    let reader = ReferenceReader::with_delimiter(settings.reference_delimiter_byte()?);
    let tables = reader
        .load_tables(glossary, stations)
        .context("Failed to load reference tables")?;
    Ok(tables)
}

fn prepare_output(path: Option<PathBuf>, kind: &str) -> Result<PathBuf> {
    let path = path.unwrap_or_else(|| generate_default_output_filename(kind, "csv"));
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Ok(path)
}

fn parquet_writer(settings: &Settings) -> Result<ParquetWriter> {
    Ok(ParquetWriter::new()
        .with_compression(&settings.compression)?
        .with_row_group_size(settings.row_group_size))
}

fn run_catalog(settings: &Settings) -> Result<()> {
    let data_dir = settings.require_data_dir()?;
    let catalog = CatalogReader::with_extension(&settings.data_extension)
        .scan_directory(data_dir)
        .with_context(|| format!("Failed to list {}", data_dir.display()))?;

    let stations = match &settings.stations_path {
        Some(path) => {
            let reader = ReferenceReader::with_delimiter(settings.reference_delimiter_byte()?);
            let rows = reader.read_stations(path)?;
            ReferenceTables::new(Vec::new(), rows)
        }
        None => ReferenceTables::default(),
    };

    println!("Data directory: {}", data_dir.display());
    println!("Data files: {}", catalog.len());

    let tags = catalog.variable_tags();
    println!("\nVariable tags ({}):", tags.len());
    for tag in &tags {
        println!("  {}", tag);
    }

    let codes = catalog.station_codes();
    println!("\nStations ({}):", codes.len());
    for code in codes {
        match stations.station(code) {
            Some(station) if station.has_coordinates() => println!(
                "  {} {} ({}, {}) [{:.4}, {:.4}]",
                code,
                station.name,
                station.municipality,
                station.department,
                station.latitude.unwrap_or_default(),
                station.longitude.unwrap_or_default()
            ),
            Some(station) => println!(
                "  {} {} ({}, {})",
                code, station.name, station.municipality, station.department
            ),
            None => println!("  {}", code),
        }
    }

    let rejected: Vec<_> = catalog.rejected().collect();
    if !rejected.is_empty() {
        println!("\nMalformed file names ({}):", rejected.len());
        for (entry, error) in rejected {
            println!("  {}: {}", entry.file_name, error);
        }
    }

    Ok(())
}

fn run_consolidate(
    settings: &Settings,
    quiet: bool,
    selection: &DatasetSelection,
    range: RangeArgs,
    output: Option<PathBuf>,
    report: Option<PathBuf>,
    means: Option<PathBuf>,
) -> Result<()> {
    let tables = Arc::new(load_tables(settings)?);
    let data_dir = settings.require_data_dir()?;
    let catalog = CatalogReader::with_extension(&settings.data_extension)
        .scan_directory(data_dir)
        .with_context(|| format!("Failed to list {}", data_dir.display()))?;

    let progress = ProgressReporter::new(catalog.len() as u64, "Consolidating data files...", quiet);
    let consolidator = Consolidator::new(tables)
        .with_max_workers(settings.max_workers)
        .with_mmap(settings.use_mmap);
    let result = consolidator
        .consolidate(&catalog, Some(&progress))
        .with_context(|| format!("Consolidation of {} failed", data_dir.display()))?;

    println!("\n{}", result.summary());

    if let Some(path) = report {
        let path = prepare_output(Some(path), "report")?;
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            CsvWriter::new().write_outcomes(&result.outcomes, &path)?;
        } else {
            let file = File::create(&path)?;
            serde_json::to_writer_pretty(BufWriter::new(file), &result.outcomes)?;
        }
        println!("Outcome report written to {}", path.display());
    }

    let selected = result.dataset.select(selection);
    let filter = DateRangeFilter::new(DateRange::new(range.start, range.end));
    let dataset = filter.apply_dataset(&selected);

    if dataset.is_empty() {
        println!("No data in range");
        return Ok(());
    }

    let path = prepare_output(output, "dataset")?;
    println!("Writing {} records to {}...", dataset.len(), path.display());
    match OutputFormat::for_path(&path) {
        OutputFormat::Parquet => {
            let writer = parquet_writer(settings)?;
            writer.write_dataset(&dataset.records, &path)?;
            println!("\n{}", writer.get_file_info(&path)?.summary());
        }
        OutputFormat::Csv => CsvWriter::new().write_dataset(&dataset.records, &path)?,
    }

    if let Some(path) = means {
        let path = prepare_output(Some(path), "means")?;
        let series_means = TemporalAggregator::new().aggregate_series(&dataset);
        CsvWriter::new().write_series_means(&series_means, &path)?;
        println!(
            "Period means of {} series written to {}",
            series_means.len(),
            path.display()
        );
    }

    info!("Consolidation complete");
    Ok(())
}

fn run_inspect(
    settings: &Settings,
    file: &Path,
    range: RangeArgs,
    export: Option<PathBuf>,
) -> Result<()> {
    let file_name = file
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let key = StationFileKey::from_stem(&stem).map_err(|source| ProcessingError::InvalidFileName {
        file_name: file_name.clone(),
        source,
    })?;

    let series = SeriesReader::with_mmap(settings.use_mmap)
        .read_series(file, &key)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    println!("File: {}", file_name);
    println!("Header: {}", series.header);
    println!("Variable: {}, station: {}", key.variable_tag, key.station_code);

    match series.summary() {
        Some(summary) => println!("{}", summary.summary()),
        None => {
            println!(
                "No valid data lines ({} lines read)",
                series.provenance.total_lines
            );
            return Ok(());
        }
    }

    if !series.line_errors.is_empty() {
        println!("\nDiscarded lines (first {}):", series.line_errors.len());
        for error in &series.line_errors {
            println!("  line {}: {}", error.line_number, error.error);
        }
    }

    let filter = DateRangeFilter::new(DateRange::new(range.start, range.end));
    let records = filter.apply(&series.records);
    if records.is_empty() {
        println!("\nNo data in range");
        return Ok(());
    }

    let means = TemporalAggregator::new().aggregate(records.iter().map(|r| (r.timestamp, r.value)));
    println!("\n{}", means.summary());

    if let Some(path) = export {
        let path = prepare_output(Some(path), "series")?;
        CsvWriter::new().write_series_data(&series.header, &records, &path)?;
        println!("Series written to {}", path.display());
    }

    Ok(())
}

fn run_indices(
    settings: &Settings,
    quiet: bool,
    inputs: &ThermalInputs,
    range: RangeArgs,
    output: Option<PathBuf>,
    means: Option<PathBuf>,
    means_column: &str,
) -> Result<()> {
    if let Some(code) = inputs.station_code {
        println!("Station: {}", code);
    }

    let progress = ProgressReporter::new_spinner("Computing thermal indices...", quiet);
    let reader = SeriesReader::with_mmap(settings.use_mmap);
    let table = inputs
        .compute(&reader)
        .context("Thermal index calculation failed")?;
    progress.finish_with_message(&format!("Computed {} rows", table.len()));
    println!("{}", table.summary());

    let filter = DateRangeFilter::new(DateRange::new(range.start, range.end));
    let table = filter.apply_thermal(&table);
    if table.is_empty() {
        println!("No data in range");
        return Ok(());
    }

    let path = prepare_output(output, "indices")?;
    println!("Writing {} rows to {}...", table.len(), path.display());
    match OutputFormat::for_path(&path) {
        OutputFormat::Parquet => {
            let writer = parquet_writer(settings)?;
            writer.write_thermal(&table.rows, &path)?;
            println!("\n{}", writer.get_file_info(&path)?.summary());
        }
        OutputFormat::Csv => CsvWriter::new().write_thermal(&table.rows, &path)?,
    }

    if let Some(path) = means {
        let points = table
            .column(means_column)
            .ok_or_else(|| ProcessingError::Config(format!("unknown column '{}'", means_column)))?;
        let path = prepare_output(Some(path), "means")?;
        CsvWriter::new().write_period_means(&TemporalAggregator::new().aggregate(points), &path)?;
        println!("{} period means written to {}", means_column, path.display());
    }

    Ok(())
}
