use anyhow::{Result, bail};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::baseline::{BaselineSource, estimate_baseline};
use super::classifier::{ColumnClassifier, ColumnContext};
use super::columns::{SegmentationMethod, assign_columns, segment_columns};
use super::config::ExtractionConfig;
use super::geometry::{GeometryProvider, PageGeometry};
use super::matchers::Matchers;
use super::overlay::PageOverlay;
use super::postprocess::finalize_entry;
use super::resolve::resolve_cross_references;
use crate::model::{Entry, ExtractionStats};

#[derive(Debug)]
pub struct PageExtraction {
    pub page: u32,
    pub entries: Vec<Entry>,
    pub overlay: PageOverlay,
    pub stats: ExtractionStats,
}

#[derive(Debug)]
pub struct DocumentExtraction {
    pub pages: Vec<u32>,
    pub entries: Vec<Entry>,
    pub overlays: Vec<PageOverlay>,
    pub stats: ExtractionStats,
    pub warnings: Vec<String>,
}

pub fn extract_page(
    page: &PageGeometry,
    matchers: &Matchers,
    config: &ExtractionConfig,
) -> PageExtraction {
    let mut stats = ExtractionStats {
        pages_processed: 1,
        ..ExtractionStats::default()
    };

    let usable = config.usable_band(page.height);
    let mut body = Vec::new();
    for line in page.lines() {
        stats.lines_seen += 1;
        if line.bbox.y0 < usable.0 || line.bbox.y1 > usable.1 {
            stats.margin_lines += 1;
            continue;
        }
        body.push(line);
    }
    if body.is_empty() {
        warn!(page = page.number, "page has no text lines inside the body band");
    }

    let mut overlay = PageOverlay::new(page);
    let segmentation = segment_columns(&body, page, config);
    overlay.record_segmentation(&segmentation, usable);
    match segmentation.method {
        SegmentationMethod::Divider => stats.divider_pages += 1,
        SegmentationMethod::Clustering => stats.clustered_pages += 1,
        SegmentationMethod::FullWidth => stats.full_width_pages += 1,
    }

    let columns = assign_columns(body, &segmentation.bands);
    let mut entries = Vec::new();
    let mut carry: Option<Entry> = None;

    for (column, lines) in columns.iter().enumerate() {
        let estimate = estimate_baseline(lines, matchers, config);
        if estimate.source == BaselineSource::Unresolved && !lines.is_empty() {
            stats.unresolved_baselines += 1;
            warn!(page = page.number, column, "no headword baseline found for column");
        }
        debug!(
            page = page.number,
            column,
            lines = lines.len(),
            baseline = ?estimate.baseline,
            indent = estimate.indent,
            source = ?estimate.source,
            "column baseline estimated"
        );
        overlay.record_column(column, &estimate, lines);

        let ctx = ColumnContext {
            page: page.number,
            column,
            estimate,
            matchers,
            config,
        };
        let mut classifier = ColumnClassifier::new(ctx, carry.take());
        for line in lines {
            classifier.feed(line, &mut overlay);
        }

        let outcome = classifier.finish();
        stats.merge(&outcome.stats);
        entries.extend(outcome.emitted);
        carry = outcome.open;
    }
    entries.extend(carry);

    for entry in &mut entries {
        finalize_entry(entry, matchers);
    }
    let assembled = entries.len();
    entries.retain(|entry| {
        let complete = entry.is_complete();
        if !complete {
            debug!(page = page.number, word = %entry.word, "dropping entry without word or senses");
        }
        complete
    });
    stats.dropped_entries += assembled - entries.len();
    stats.entries += entries.len();

    PageExtraction {
        page: page.number,
        entries,
        overlay,
        stats,
    }
}

pub fn extract_document<P>(
    provider: &P,
    pages: &[u32],
    config: &ExtractionConfig,
) -> Result<DocumentExtraction>
where
    P: GeometryProvider + ?Sized,
{
    if pages.is_empty() {
        bail!("no pages selected for extraction");
    }

    let matchers = Matchers::new()?;
    let mut warnings = Vec::new();
    let mut selected = Vec::with_capacity(pages.len());
    for &number in pages {
        match provider.page(number) {
            Some(page) => selected.push(page),
            None => {
                warn!(page = number, source = provider.source_name(), "page not present in geometry source");
                warnings.push(format!("page {number} not present in {}", provider.source_name()));
            }
        }
    }

    let results = selected
        .par_iter()
        .map(|page| extract_page(page, &matchers, config))
        .collect::<Vec<PageExtraction>>();

    let mut stats = ExtractionStats {
        pages_requested: pages.len(),
        ..ExtractionStats::default()
    };
    let mut processed = Vec::with_capacity(results.len());
    let mut entries = Vec::new();
    let mut overlays = Vec::with_capacity(results.len());

    for result in results {
        stats.merge(&result.stats);
        if result.entries.is_empty() {
            warnings.push(format!("page {} produced no entries", result.page));
        }
        processed.push(result.page);
        entries.extend(result.entries);
        overlays.push(result.overlay);
    }

    for (id, entry) in entries.iter_mut().enumerate() {
        entry.id = id;
    }
    let summary = resolve_cross_references(&mut entries);
    stats.resolved_refs = summary.resolved;
    stats.unresolved_refs = summary.unresolved;

    info!(
        source = provider.source_name(),
        pages = processed.len(),
        entries = entries.len(),
        resolved = summary.resolved,
        unresolved = summary.unresolved,
        "extraction finished"
    );

    Ok(DocumentExtraction {
        pages: processed,
        entries,
        overlays,
        stats,
        warnings,
    })
}
