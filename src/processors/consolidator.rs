use crate::error::{ProcessingError, Result};
use crate::models::{
    CatalogEntry, ConsolidatedDataset, EnrichedRecord, FileCatalog, FileOutcome, ReferenceTables,
    SeriesProvenance,
};
use crate::processors::{MetadataJoiner, MetadataMatch};
use crate::readers::SeriesReader;
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a consolidation run hands to its consumers.
#[derive(Debug, Clone, Default)]
pub struct ConsolidationResult {
    pub dataset: ConsolidatedDataset,
    /// One entry per catalog entry, in catalog order
    pub outcomes: Vec<FileOutcome>,
}

impl ConsolidationResult {
    pub fn processed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.processed_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Consolidation Report ===\n");
        summary.push_str(&format!(
            "Files processed: {} of {}\n",
            self.processed_count(),
            self.outcomes.len()
        ));
        summary.push_str(&format!(
            "Records: {} from {} files\n",
            self.dataset.len(),
            self.dataset.source_file_count()
        ));

        if let Some((first, last)) = self.dataset.time_span() {
            summary.push_str(&format!("Time span: {} .. {}\n", first, last));
        }

        if self.failed_count() > 0 {
            summary.push_str(&format!("\nFailed files: {}\n", self.failed_count()));
            for (i, outcome) in self.failures().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. {}: {}\n",
                    i + 1,
                    outcome.file_name,
                    outcome.detail
                ));
            }
        }

        summary
    }
}

/// Runs the series reader and metadata joiner over every catalog entry.
/// A failing file becomes a failure outcome; it never stops the batch.
pub struct Consolidator {
    tables: Arc<ReferenceTables>,
    max_workers: usize,
    use_mmap: bool,
}

impl Consolidator {
    pub fn new(tables: Arc<ReferenceTables>) -> Self {
        Self {
            tables,
            max_workers: num_cpus::get(),
            use_mmap: false,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    pub fn consolidate(
        &self,
        catalog: &FileCatalog,
        progress: Option<&ProgressReporter>,
    ) -> Result<ConsolidationResult> {
        if catalog.is_empty() {
            return Err(ProcessingError::EmptyCatalog(
                "catalog has no entries".to_string(),
            ));
        }

        info!(
            "Consolidating {} files with up to {} workers",
            catalog.len(),
            self.max_workers
        );
        if let Some(p) = progress {
            p.set_message(&format!("Consolidating {} files...", catalog.len()));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        // Indexed collect keeps catalog order regardless of completion order
        let results: Vec<Result<(Vec<EnrichedRecord>, SeriesProvenance, MetadataMatch)>> = pool
            .install(|| {
                catalog
                    .entries
                    .par_iter()
                    .map(|entry| {
                        let result = self.process_entry(entry);
                        if let Some(p) = progress {
                            p.increment(1);
                        }
                        result
                    })
                    .collect()
            });

        let mut records = Vec::new();
        let mut outcomes = Vec::with_capacity(results.len());

        for (entry, result) in catalog.entries.iter().zip(results) {
            match result {
                Ok((enriched, provenance, matched)) => {
                    let mut outcome = FileOutcome::success(&provenance);
                    if let Some(note) = matched.describe_missing() {
                        outcome.detail.push_str(&format!("; {}", note));
                    }
                    outcomes.push(outcome);
                    records.extend(enriched);
                }
                Err(e) => {
                    warn!("Failed to consolidate {}: {}", entry.file_name, e);
                    outcomes.push(FileOutcome::failure(&entry.file_name, e.to_string()));
                }
            }
        }

        let result = ConsolidationResult {
            dataset: ConsolidatedDataset::new(records),
            outcomes,
        };

        info!(
            "Consolidated {} of {} files into {} records",
            result.processed_count(),
            result.outcomes.len(),
            result.dataset.len()
        );
        if let Some(p) = progress {
            p.finish_with_message(&format!(
                "Processed {} of {} files",
                result.processed_count(),
                result.outcomes.len()
            ));
        }

        Ok(result)
    }

    /// Parse and enrich one entry; every failure mode is returned, not raised.
    fn process_entry(
        &self,
        entry: &CatalogEntry,
    ) -> Result<(Vec<EnrichedRecord>, SeriesProvenance, MetadataMatch)> {
        let key = entry
            .key
            .as_ref()
            .map_err(|e| ProcessingError::InvalidFileName {
                file_name: entry.file_name.clone(),
                source: e.clone(),
            })?;

        let reader = SeriesReader::with_mmap(self.use_mmap);
        let series = reader.read_series(&entry.path, key)?;

        if series.is_empty() {
            return Err(ProcessingError::EmptySeries {
                file_name: entry.file_name.clone(),
                total_lines: series.provenance.total_lines,
            });
        }

        let joiner = MetadataJoiner::new(Arc::clone(&self.tables));
        let (records, matched) = joiner.join_with_match(&series);

        Ok((records, series.provenance, matched))
    }
}
