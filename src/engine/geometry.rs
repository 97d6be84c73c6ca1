use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::text::normalize_text;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) * 0.5
    }
}

impl From<[f32; 4]> for BBox {
    fn from([x0, y0, x1, y1]: [f32; 4]) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

impl From<BBox> for [f32; 4] {
    fn from(bbox: BBox) -> Self {
        [bbox.x0, bbox.y0, bbox.x1, bbox.y1]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub bbox: BBox,
    #[serde(default)]
    pub font: String,
    #[serde(default)]
    pub size: f32,
}

impl Span {
    const BOLD_MARKERS: [&'static str; 3] = ["bold", "black", "semibold"];

    pub fn has_bold_font(&self) -> bool {
        let font = self.font.to_ascii_lowercase();
        Self::BOLD_MARKERS
            .iter()
            .any(|marker| font.contains(marker))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLine {
    pub bbox: BBox,
    #[serde(default)]
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub lines: Vec<RawLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawingItem {
    #[serde(default = "default_item_kind")]
    pub kind: String,
    #[serde(default)]
    pub points: Vec<[f32; 2]>,
}

fn default_item_kind() -> String {
    "line".to_string()
}

impl DrawingItem {
    pub fn endpoints(&self) -> Option<([f32; 2], [f32; 2])> {
        if self.kind != "line" || self.points.len() < 2 {
            return None;
        }
        Some((self.points[0], self.points[self.points.len() - 1]))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Drawing {
    #[serde(default)]
    pub items: Vec<DrawingItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageGeometry {
    pub number: u32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub blocks: Vec<TextBlock>,
    #[serde(default)]
    pub drawings: Option<Vec<Drawing>>,
}

impl PageGeometry {
    pub fn lines(&self) -> Vec<Line> {
        self.blocks
            .iter()
            .flat_map(|block| block.lines.iter())
            .filter_map(Line::from_raw)
            .collect()
    }

    /// Straight segments of every drawing, or `None` when the provider exposed no drawings.
    pub fn segments(&self) -> Option<Vec<([f32; 2], [f32; 2])>> {
        self.drawings.as_ref().map(|drawings| {
            drawings
                .iter()
                .flat_map(|drawing| drawing.items.iter())
                .filter_map(DrawingItem::endpoints)
                .collect()
        })
    }
}

#[derive(Debug, Clone)]
pub struct Line {
    pub bbox: BBox,
    pub spans: Vec<Span>,
    pub text: String,
}

impl Line {
    pub fn from_raw(raw: &RawLine) -> Option<Self> {
        let spans = raw
            .spans
            .iter()
            .filter(|span| !span.text.trim().is_empty())
            .cloned()
            .collect::<Vec<Span>>();
        Self::from_spans(spans)
    }

    pub fn from_spans(spans: Vec<Span>) -> Option<Self> {
        let first = spans.first()?;
        let bbox = spans
            .iter()
            .skip(1)
            .fold(first.bbox, |acc, span| acc.union(&span.bbox));
        let joined = spans.iter().map(|span| span.text.as_str()).collect::<String>();
        let text = normalize_text(&joined);
        if text.is_empty() {
            return None;
        }

        Some(Self { bbox, spans, text })
    }

    pub fn left(&self) -> f32 {
        self.bbox.x0
    }

    pub fn first_span(&self) -> &Span {
        &self.spans[0]
    }

    pub fn span_sizes(&self) -> impl Iterator<Item = f32> + '_ {
        self.spans.iter().map(|span| span.size)
    }
}

pub trait GeometryProvider {
    fn source_name(&self) -> &str;

    fn page_count(&self) -> usize;

    fn page(&self, number: u32) -> Option<&PageGeometry>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryDocument {
    #[serde(default)]
    pub source: Option<String>,
    pub pages: Vec<PageGeometry>,
}

impl GeometryDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let mut document: GeometryDocument = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse geometry dump {}", path.display()))?;

        if document.source.is_none() {
            document.source = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(ToOwned::to_owned);
        }
        document.pages.sort_by_key(|page| page.number);

        Ok(document)
    }
}

impl GeometryProvider for GeometryDocument {
    fn source_name(&self) -> &str {
        self.source.as_deref().unwrap_or("unknown")
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, number: u32) -> Option<&PageGeometry> {
        self.pages
            .binary_search_by_key(&number, |page| page.number)
            .ok()
            .map(|index| &self.pages[index])
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn span(text: &str, x0: f32, x1: f32) -> Span {
        Span {
            text: text.to_string(),
            bbox: BBox::new(x0, 100.0, x1, 110.0),
            font: "Times-Roman".to_string(),
            size: 9.0,
        }
    }

    #[test]
    fn line_drops_blank_spans_and_unions_boxes() {
        let raw = RawLine {
            bbox: BBox::new(0.0, 0.0, 0.0, 0.0),
            spans: vec![span("  ", 10.0, 12.0), span("aab ", 40.0, 60.0), span("m.  dh", 61.0, 80.0)],
        };

        let line = Line::from_raw(&raw).expect("line with text");
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.bbox, BBox::new(40.0, 100.0, 80.0, 110.0));
        assert_eq!(line.text, "aab m. dh");
    }

    #[test]
    fn line_without_text_is_rejected() {
        let raw = RawLine {
            bbox: BBox::new(0.0, 0.0, 1.0, 1.0),
            spans: vec![span(" ", 10.0, 12.0)],
        };
        assert!(Line::from_raw(&raw).is_none());
    }

    #[test]
    fn bold_markers_are_case_insensitive() {
        let mut bold = span("abaar", 0.0, 10.0);
        bold.font = "Minion-SemiBold".to_string();
        assert!(bold.has_bold_font());
        assert!(!span("abaar", 0.0, 10.0).has_bold_font());
    }

    #[test]
    fn geometry_document_loads_dump_and_distinguishes_missing_drawings() {
        let raw = r#"
        {
          "pages": [
            {
              "number": 2,
              "width": 600,
              "height": 800,
              "blocks": [
                {"lines": [{"bbox": [50, 100, 200, 110], "spans": [
                  {"text": "abaar m. drought", "bbox": [50, 100, 200, 110], "font": "Times-Bold", "size": 9.5}
                ]}]}
              ]
            },
            {
              "number": 1,
              "width": 600,
              "height": 800,
              "drawings": [{"items": [{"kind": "line", "points": [[300, 60], [300, 740]]}]}]
            }
          ]
        }
        "#;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(raw.as_bytes()).expect("write dump");

        let document = GeometryDocument::load(file.path()).expect("dump parses");
        assert_eq!(document.page_count(), 2);
        assert!(document.source.is_some());

        let first = document.page(1).expect("page 1");
        assert_eq!(first.segments().map(|segments| segments.len()), Some(1));
        assert!(first.lines().is_empty());

        let second = document.page(2).expect("page 2");
        assert!(second.segments().is_none());
        assert_eq!(second.lines()[0].text, "abaar m. drought");
        assert!(document.page(3).is_none());
    }
}
