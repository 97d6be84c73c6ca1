use serde::Serialize;

use super::baseline::{BaselineEstimate, BaselineSource};
use super::columns::{Segmentation, SegmentationMethod};
use super::geometry::{BBox, Line, PageGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GuideKind {
    Base,
    Indent,
    Divider,
}

#[derive(Debug, Clone, Serialize)]
pub struct Guide {
    pub kind: GuideKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    pub x: f32,
    pub y0: f32,
    pub y1: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineLabel {
    Headword,
    Promoted,
    InlineBreak,
    Sense,
    Continuation,
    CarryOver,
    Discarded,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabeledBox {
    pub label: LineLabel,
    pub column: usize,
    pub bbox: BBox,
    pub emphasized: bool,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column: usize,
    pub line_count: usize,
    pub baseline: Option<f32>,
    pub indent: f32,
    pub source: BaselineSource,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageOverlay {
    pub page: u32,
    pub width: f32,
    pub height: f32,
    pub method: SegmentationMethod,
    pub columns: Vec<ColumnSummary>,
    pub guides: Vec<Guide>,
    pub boxes: Vec<LabeledBox>,
}

impl PageOverlay {
    pub fn new(page: &PageGeometry) -> Self {
        Self {
            page: page.number,
            width: page.width,
            height: page.height,
            method: SegmentationMethod::FullWidth,
            columns: Vec::new(),
            guides: Vec::new(),
            boxes: Vec::new(),
        }
    }

    pub fn record_segmentation(&mut self, segmentation: &Segmentation, usable: (f32, f32)) {
        self.method = segmentation.method;
        if let Some(x) = segmentation.divider {
            self.guides.push(Guide {
                kind: GuideKind::Divider,
                column: None,
                x,
                y0: usable.0,
                y1: usable.1,
            });
        }
    }

    pub fn record_column(&mut self, column: usize, estimate: &BaselineEstimate, lines: &[Line]) {
        self.columns.push(ColumnSummary {
            column,
            line_count: lines.len(),
            baseline: estimate.baseline,
            indent: estimate.indent,
            source: estimate.source,
        });

        let (Some(first), Some(last)) = (lines.first(), lines.last()) else {
            return;
        };
        let (y0, y1) = (first.bbox.y0, last.bbox.y1);

        if let Some(x) = estimate.baseline {
            self.guides.push(Guide {
                kind: GuideKind::Base,
                column: Some(column),
                x,
                y0,
                y1,
            });
        }
        if let Some(x) = estimate.indent_x() {
            self.guides.push(Guide {
                kind: GuideKind::Indent,
                column: Some(column),
                x,
                y0,
                y1,
            });
        }
    }

    pub fn record_line(&mut self, label: LineLabel, column: usize, line: &Line, emphasized: bool) {
        self.boxes.push(LabeledBox {
            label,
            column,
            bbox: line.bbox,
            emphasized,
            text: line.text.clone(),
        });
    }

    pub fn file_name(&self) -> String {
        format!("page_{:03}.json", self.page)
    }
}
