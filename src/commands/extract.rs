use std::collections::BTreeSet;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::ExtractArgs;
use crate::engine::{GeometryDocument, GeometryProvider, extract_document};
use crate::model::{EntryRecord, ExtractionOutput};
use crate::util::{ensure_directory, now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: ExtractArgs) -> Result<()> {
    let document = GeometryDocument::load(&args.geometry)?;
    let available = document
        .pages
        .iter()
        .map(|page| page.number)
        .collect::<Vec<u32>>();
    let pages = parse_page_ranges(&args.pages, &available);

    info!(
        geometry = %args.geometry.display(),
        source = document.source_name(),
        available = document.page_count(),
        requested = pages.len(),
        "extraction requested"
    );

    let config = args.layout.to_config();
    let extraction = extract_document(&document, &pages, &config)?;

    let entries = extraction
        .entries
        .iter()
        .map(|entry| entry.to_record())
        .collect::<Vec<EntryRecord>>();
    let output = ExtractionOutput {
        source: document.source_name().to_string(),
        source_sha256: sha256_file(&args.geometry)?,
        generated_at: now_utc_string(),
        pages: extraction.pages.clone(),
        count: entries.len(),
        counts: extraction.stats.clone(),
        warnings: extraction.warnings.clone(),
        entries,
    };
    write_json_pretty(&args.out, &output)?;

    if args.debug {
        ensure_directory(&args.debug_dir)?;
        for overlay in &extraction.overlays {
            write_json_pretty(&args.debug_dir.join(overlay.file_name()), overlay)?;
        }
        info!(
            dir = %args.debug_dir.display(),
            overlays = extraction.overlays.len(),
            "wrote debug overlays"
        );
    }

    info!(
        out = %args.out.display(),
        pages = output.pages.len(),
        entries = output.count,
        carry_overs = output.counts.carry_overs,
        unresolved_refs = output.counts.unresolved_refs,
        warnings = output.warnings.len(),
        "wrote extraction output"
    );

    Ok(())
}

pub fn parse_page_ranges(selection: &str, available: &[u32]) -> Vec<u32> {
    let mut pages = BTreeSet::new();
    let last_available = available.iter().copied().max().unwrap_or(0);

    for token in selection.split(',').map(str::trim).filter(|token| !token.is_empty()) {
        if token.eq_ignore_ascii_case("all") || token == "*" {
            pages.extend(available.iter().copied());
            continue;
        }

        let parsed = match token.split_once('-') {
            Some((start, end)) => parse_page(start).zip(parse_page(end)),
            None => parse_page(token).map(|page| (page, page)),
        };
        let Some((start, end)) = parsed else {
            warn!(token, "ignoring invalid page selection token");
            continue;
        };

        let (low, high) = if start <= end { (start, end) } else { (end, start) };
        pages.extend(low..=high.min(last_available.max(low)));
    }

    pages.into_iter().collect()
}

fn parse_page(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|page| *page > 0)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::cli::LayoutArgs;

    #[test]
    fn page_ranges_are_sorted_and_deduplicated() {
        let available = (1..=12).collect::<Vec<u32>>();
        assert_eq!(parse_page_ranges("1-3,10", &available), vec![1, 2, 3, 10]);
        assert_eq!(parse_page_ranges("5-3, 4", &available), vec![3, 4, 5]);
        assert_eq!(parse_page_ranges("2,x,0,3-y,,2", &available), vec![2]);
        assert_eq!(parse_page_ranges("all", &[4, 1, 9]), vec![1, 4, 9]);
        assert!(parse_page_ranges("", &[1]).is_empty());
    }

    #[test]
    fn page_ranges_stop_at_the_last_available_page() {
        assert_eq!(parse_page_ranges("1-4000000000", &[1, 2, 3]), vec![1, 2, 3]);
        assert_eq!(parse_page_ranges("2-9", &[1, 2, 3]), vec![2, 3]);
        assert_eq!(parse_page_ranges("7-9,5", &[1, 2, 3]), vec![5, 7]);
    }

    fn layout() -> LayoutArgs {
        LayoutArgs {
            min_column_gap: 20.0,
            max_columns: 3,
            margin_band_ratio: 0.06,
            headword_tolerance: 8.0,
            promotion_tolerance: 10.0,
        }
    }

    #[test]
    fn run_writes_output_and_overlays() {
        let dir = tempfile::tempdir().expect("temp dir");
        let geometry = dir.path().join("dump.json");
        fs::write(
            &geometry,
            r#"{
              "source": "qaamuus.pdf",
              "pages": [{
                "number": 1, "width": 600, "height": 800, "drawings": [],
                "blocks": [{"lines": [
                  {"bbox": [50, 100, 270, 110], "spans": [{"text": "roob m. biyo. eeg daruur", "bbox": [50, 100, 270, 110], "size": 9}]},
                  {"bbox": [50, 112, 270, 122], "spans": [{"text": "daruur m. cir.", "bbox": [50, 112, 270, 122], "size": 9}]}
                ]}]
              }]
            }"#,
        )
        .expect("write geometry");

        let out = dir.path().join("out").join("entries.json");
        let debug_dir = dir.path().join("debug");
        run(ExtractArgs {
            geometry,
            pages: "1,2".to_string(),
            out: out.clone(),
            debug: true,
            debug_dir: debug_dir.clone(),
            layout: layout(),
        })
        .expect("extract run");

        let raw = fs::read(&out).expect("read output");
        let output: ExtractionOutput = serde_json::from_slice(&raw).expect("parse output");
        assert_eq!(output.source, "qaamuus.pdf");
        assert_eq!(output.pages, vec![1]);
        assert_eq!(output.count, 2);
        assert_eq!(output.entries[0].cross_refs, vec!["daruur"]);
        assert_eq!(output.entries[0].cross_ref_target_ids, vec![Some(1)]);
        assert_eq!(output.warnings.len(), 1);
        assert!(debug_dir.join("page_001.json").exists());
    }
}
