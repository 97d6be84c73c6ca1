use serde::Serialize;

use super::config::ExtractionConfig;
use super::geometry::{Line, PageGeometry};

/// Half-open horizontal interval `[x0, x1)` holding one column of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnBand {
    pub x0: f32,
    pub x1: f32,
}

impl ColumnBand {
    pub fn contains(&self, x: f32) -> bool {
        x >= self.x0 && x < self.x1
    }

    fn distance(&self, x: f32) -> f32 {
        (x - self.x0).abs().min((x - self.x1).abs())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationMethod {
    Divider,
    Clustering,
    FullWidth,
}

#[derive(Debug, Clone)]
pub struct Segmentation {
    pub bands: Vec<ColumnBand>,
    pub divider: Option<f32>,
    pub method: SegmentationMethod,
}

pub fn segment_columns(
    lines: &[Line],
    page: &PageGeometry,
    config: &ExtractionConfig,
) -> Segmentation {
    let divider = page
        .segments()
        .and_then(|segments| detect_divider(&segments, page.width, page.height, config));

    if let Some(divider) = divider {
        let epsilon = config.divider_epsilon;
        return Segmentation {
            bands: vec![
                ColumnBand {
                    x0: 0.0,
                    x1: (divider - epsilon).max(0.0),
                },
                ColumnBand {
                    x0: (divider + epsilon).min(page.width),
                    x1: page.width,
                },
            ],
            divider: Some(divider),
            method: SegmentationMethod::Divider,
        };
    }

    let bands = cluster_bands(lines, config);
    if bands.is_empty() {
        return Segmentation {
            bands: vec![ColumnBand {
                x0: 0.0,
                x1: page.width.max(0.0),
            }],
            divider: None,
            method: SegmentationMethod::FullWidth,
        };
    }

    Segmentation {
        bands,
        divider: None,
        method: SegmentationMethod::Clustering,
    }
}

pub fn detect_divider(
    segments: &[([f32; 2], [f32; 2])],
    page_width: f32,
    page_height: f32,
    config: &ExtractionConfig,
) -> Option<f32> {
    let (top, bottom) = config.usable_band(page_height);
    let min_length = (bottom - top) * config.divider_min_length_ratio;
    let min_x = page_width * config.divider_center_min_ratio;
    let max_x = page_width * config.divider_center_max_ratio;

    segments.iter().find_map(|&([x0, y0], [x1, y1])| {
        let vertical = (x0 - x1).abs() < config.divider_max_x_drift;
        let long_enough = (y1 - y0).abs() > min_length;
        let centered = x0 > min_x && x0 < max_x;
        (vertical && long_enough && centered).then_some(x0)
    })
}

#[derive(Debug, Clone, Copy)]
struct LeftEdgeCluster {
    first_left: f32,
    last_left: f32,
    right: f32,
}

impl LeftEdgeCluster {
    fn absorb(&mut self, other: &Self) {
        self.first_left = self.first_left.min(other.first_left);
        self.last_left = self.last_left.max(other.last_left);
        self.right = self.right.max(other.right);
    }

    fn gap_to(&self, next: &Self) -> f32 {
        next.first_left - self.last_left
    }
}

pub fn cluster_bands(lines: &[Line], config: &ExtractionConfig) -> Vec<ColumnBand> {
    let mut edges = lines
        .iter()
        .map(|line| (line.bbox.x0, line.bbox.x1))
        .collect::<Vec<(f32, f32)>>();
    edges.sort_by(|left, right| left.0.total_cmp(&right.0));

    let mut clusters = Vec::<LeftEdgeCluster>::new();
    for (left, right) in edges {
        match clusters.last_mut() {
            Some(cluster) if left - cluster.last_left <= config.min_column_gap => {
                cluster.last_left = left;
                cluster.right = cluster.right.max(right);
            }
            _ => clusters.push(LeftEdgeCluster {
                first_left: left,
                last_left: left,
                right,
            }),
        }
    }

    if clusters.len() > config.max_columns {
        clusters = merge_close_clusters(clusters, config.min_column_gap * 2.0);
    }
    while clusters.len() > config.max_columns.max(1) {
        merge_narrowest_gap(&mut clusters);
    }

    clusters
        .iter()
        .enumerate()
        .map(|(index, cluster)| {
            let x1 = match clusters.get(index + 1) {
                Some(next) => cluster.right.min(next.first_left),
                None => cluster.right,
            };
            ColumnBand {
                x0: cluster.first_left,
                x1: x1.max(cluster.first_left),
            }
        })
        .collect()
}

fn merge_close_clusters(clusters: Vec<LeftEdgeCluster>, max_gap: f32) -> Vec<LeftEdgeCluster> {
    let mut merged = Vec::<LeftEdgeCluster>::with_capacity(clusters.len());
    for cluster in clusters {
        match merged.last_mut() {
            Some(previous) if previous.gap_to(&cluster) < max_gap => previous.absorb(&cluster),
            _ => merged.push(cluster),
        }
    }
    merged
}

fn merge_narrowest_gap(clusters: &mut Vec<LeftEdgeCluster>) {
    let narrowest = clusters
        .windows(2)
        .enumerate()
        .min_by(|(_, left), (_, right)| {
            left[0]
                .gap_to(&left[1])
                .total_cmp(&right[0].gap_to(&right[1]))
        })
        .map(|(index, _)| index);

    if let Some(index) = narrowest {
        let next = clusters.remove(index + 1);
        clusters[index].absorb(&next);
    }
}

pub fn assign_columns(lines: Vec<Line>, bands: &[ColumnBand]) -> Vec<Vec<Line>> {
    let mut columns = vec![Vec::<Line>::new(); bands.len()];
    if bands.is_empty() {
        return columns;
    }

    for line in lines {
        let center = line.bbox.center_x();
        let index = bands
            .iter()
            .position(|band| band.contains(center))
            .unwrap_or_else(|| nearest_band(bands, center));
        columns[index].push(line);
    }

    for column in &mut columns {
        column.sort_by(|left, right| left.bbox.y0.total_cmp(&right.bbox.y0));
    }

    columns
}

fn nearest_band(bands: &[ColumnBand], x: f32) -> usize {
    let mut best_index = 0usize;
    let mut best_distance = f32::INFINITY;
    for (index, band) in bands.iter().enumerate() {
        let distance = band.distance(x);
        if distance < best_distance {
            best_distance = distance;
            best_index = index;
        }
    }
    best_index
}
