use serde::Serialize;

use super::config::ExtractionConfig;
use super::geometry::Line;
use super::matchers::Matchers;
use super::text::normalize_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineSource {
    Headline,
    Typography,
    Histogram,
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineEstimate {
    pub baseline: Option<f32>,
    pub indent: f32,
    pub source: BaselineSource,
}

impl BaselineEstimate {
    pub fn indent_x(&self) -> Option<f32> {
        self.baseline.map(|baseline| baseline + self.indent)
    }
}

pub fn estimate_baseline(
    lines: &[Line],
    matchers: &Matchers,
    config: &ExtractionConfig,
) -> BaselineEstimate {
    let headline_lefts = lines
        .iter()
        .filter(|line| matchers.is_headword_line(&line.text))
        .map(Line::left)
        .collect::<Vec<f32>>();
    if let Some(baseline) = trimmed_median(headline_lefts, config.outlier_trim_ratio) {
        return BaselineEstimate {
            baseline: Some(baseline),
            indent: offset_indent(lines, baseline, config),
            source: BaselineSource::Headline,
        };
    }

    if let Some(baseline) = typography_baseline(lines, matchers, config) {
        return BaselineEstimate {
            baseline: Some(baseline),
            indent: offset_indent(lines, baseline, config),
            source: BaselineSource::Typography,
        };
    }

    if let Some((baseline, indent)) = histogram_estimate(lines, config) {
        return BaselineEstimate {
            baseline: Some(baseline),
            indent,
            source: BaselineSource::Histogram,
        };
    }

    BaselineEstimate {
        baseline: None,
        indent: config.default_indent,
        source: BaselineSource::Unresolved,
    }
}

fn typography_baseline(
    lines: &[Line],
    matchers: &Matchers,
    config: &ExtractionConfig,
) -> Option<f32> {
    let candidates = lines
        .iter()
        .filter(|line| matchers.looks_like_word(&normalize_text(&line.first_span().text)))
        .collect::<Vec<&Line>>();
    if candidates.is_empty() {
        return None;
    }

    let sizes = lines.iter().flat_map(Line::span_sizes).collect::<Vec<f32>>();
    let median_size = plain_median(sizes).unwrap_or(0.0);

    let mut lefts = candidates
        .iter()
        .filter(|line| line.first_span().size >= median_size)
        .map(|line| line.left())
        .collect::<Vec<f32>>();
    if lefts.is_empty() {
        lefts = candidates.iter().map(|line| line.left()).collect();
    }

    trimmed_median(lefts, config.outlier_trim_ratio)
}

fn offset_indent(lines: &[Line], baseline: f32, config: &ExtractionConfig) -> f32 {
    let (low, high) = config.indent_window;
    let offsets = lines
        .iter()
        .map(|line| line.left() - baseline)
        .filter(|offset| *offset > low && *offset < high)
        .collect::<Vec<f32>>();

    trimmed_median(offsets, config.outlier_trim_ratio).unwrap_or(config.default_indent)
}

fn histogram_estimate(lines: &[Line], config: &ExtractionConfig) -> Option<(f32, f32)> {
    let bucket = config.histogram_bucket;
    let mut histogram = Vec::<(i64, usize)>::new();
    for line in lines {
        let key = (line.left() / bucket).round() as i64;
        match histogram.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, count)) => *count += 1,
            None => histogram.push((key, 1)),
        }
    }

    let (base_key, _) = first_mode(&histogram)?;
    let baseline = base_key as f32 * bucket;

    let (low, high) = config.histogram_indent_window;
    let indent_buckets = histogram
        .iter()
        .copied()
        .filter(|(key, _)| {
            let offset = *key as f32 * bucket - baseline;
            offset >= low && offset <= high
        })
        .collect::<Vec<(i64, usize)>>();

    let indent = first_mode(&indent_buckets)
        .map(|(key, _)| key as f32 * bucket - baseline)
        .unwrap_or(config.histogram_default_indent);

    Some((baseline, indent))
}

fn first_mode(histogram: &[(i64, usize)]) -> Option<(i64, usize)> {
    let mut best: Option<(i64, usize)> = None;
    for &(key, count) in histogram {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((key, count));
        }
    }
    best
}

pub fn trimmed_median(mut values: Vec<f32>, ratio: f32) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f32::total_cmp);

    let trim = (values.len() as f32 * ratio) as usize;
    let kept = if values.len() > trim * 2 {
        &values[trim..values.len() - trim]
    } else {
        &values[..]
    };

    Some(kept[kept.len() / 2])
}

fn plain_median(values: Vec<f32>) -> Option<f32> {
    trimmed_median(values, 0.0)
}
