use std::collections::VecDeque;
use std::mem;

use tracing::{debug, trace};

use super::baseline::{BaselineEstimate, trimmed_median};
use super::config::ExtractionConfig;
use super::geometry::Line;
use super::matchers::{HeadwordParts, InlineBreak, Matchers};
use super::overlay::{LineLabel, PageOverlay};
use super::text::normalize_text;
use crate::model::{Entry, ExtractionStats, Sense};

const EMPHASIS_MAX_SIZE_MARGIN: f32 = 0.2;

#[derive(Debug, Clone, Copy)]
pub struct ColumnContext<'a> {
    pub page: u32,
    pub column: usize,
    pub estimate: BaselineEstimate,
    pub matchers: &'a Matchers,
    pub config: &'a ExtractionConfig,
}

#[derive(Debug)]
enum ClassifierState {
    NoEntry,
    BuildingEntry(Entry),
}

enum Decision {
    Start(HeadwordParts, LineLabel),
    NumberedSense,
    InlineBreak(InlineBreak),
    Append,
    Discard,
}

#[derive(Debug)]
pub struct ColumnOutcome {
    pub emitted: Vec<Entry>,
    pub open: Option<Entry>,
    pub stats: ExtractionStats,
}

pub struct ColumnClassifier<'a> {
    ctx: ColumnContext<'a>,
    state: ClassifierState,
    carry: Option<Entry>,
    recent_sizes: VecDeque<f32>,
    emitted: Vec<Entry>,
    stats: ExtractionStats,
}

impl<'a> ColumnClassifier<'a> {
    pub fn new(ctx: ColumnContext<'a>, carry: Option<Entry>) -> Self {
        Self {
            ctx,
            state: ClassifierState::NoEntry,
            carry,
            recent_sizes: VecDeque::with_capacity(ctx.config.recent_size_window + 8),
            emitted: Vec::new(),
            stats: ExtractionStats::default(),
        }
    }

    pub fn feed(&mut self, line: &Line, overlay: &mut PageOverlay) {
        let emphasized = self.observe_typography(line);
        let headword_line = self.ctx.matchers.is_headword_line(&line.text);
        let adopted = self.adopt_carry(line, headword_line);
        let decision = if adopted {
            Decision::Append
        } else {
            self.decide(line, headword_line)
        };
        let label = self.apply(decision, line, adopted);

        trace!(
            page = self.ctx.page,
            column = self.ctx.column,
            x = line.left(),
            label = ?label,
            emphasized,
            text = %line.text,
            "classified line"
        );
        if label == LineLabel::Headword && !emphasized {
            trace!(
                page = self.ctx.page,
                column = self.ctx.column,
                text = %line.text,
                "headword line without typographic emphasis"
            );
        }
        overlay.record_line(label, self.ctx.column, line, emphasized);
    }

    pub fn finish(mut self) -> ColumnOutcome {
        if let Some(carried) = self.carry.take() {
            self.emitted.insert(0, carried);
        }
        let open = match mem::replace(&mut self.state, ClassifierState::NoEntry) {
            ClassifierState::BuildingEntry(entry) => Some(entry),
            ClassifierState::NoEntry => None,
        };

        ColumnOutcome {
            emitted: self.emitted,
            open,
            stats: self.stats,
        }
    }

    fn at_baseline(&self, line: &Line, tolerance: f32) -> bool {
        self.ctx
            .estimate
            .baseline
            .is_none_or(|baseline| (line.left() - baseline).abs() <= tolerance)
    }

    fn adopt_carry(&mut self, line: &Line, headword_line: bool) -> bool {
        if !matches!(self.state, ClassifierState::NoEntry) || self.carry.is_none() {
            return false;
        }
        let Some(baseline) = self.ctx.estimate.baseline else {
            return false;
        };

        let config = self.ctx.config;
        let indented =
            line.left() >= baseline + self.ctx.estimate.indent - config.continuation_tolerance;
        let opens_entry = headword_line && self.at_baseline(line, config.headword_tolerance);
        if !indented || opens_entry {
            return false;
        }

        let Some(entry) = self.carry.take() else {
            return false;
        };
        debug!(
            page = self.ctx.page,
            column = self.ctx.column,
            word = %entry.word,
            "entry continues from previous column"
        );
        self.stats.carry_overs += 1;
        self.state = ClassifierState::BuildingEntry(entry);
        true
    }

    fn decide(&self, line: &Line, headword_line: bool) -> Decision {
        let config = self.ctx.config;
        let matchers = self.ctx.matchers;
        let text = line.text.as_str();

        if headword_line && self.at_baseline(line, config.headword_tolerance) {
            if let Some(parts) = matchers.parse_headword_line(text) {
                return Decision::Start(parts, LineLabel::Headword);
            }
        }

        if matches!(self.state, ClassifierState::NoEntry) {
            return Decision::Discard;
        }

        if headword_line && self.at_baseline(line, config.promotion_tolerance) {
            if let Some(parts) = matchers.parse_headword_line(text) {
                return Decision::Start(parts, LineLabel::Promoted);
            }
        }

        if matchers.starts_numbered_sense(text) {
            return Decision::NumberedSense;
        }

        if self.at_baseline(line, config.inline_break_tolerance) {
            if let Some(found) = matchers.find_inline_break(text) {
                return Decision::InlineBreak(found);
            }
        }

        Decision::Append
    }

    fn apply(&mut self, decision: Decision, line: &Line, adopted: bool) -> LineLabel {
        match decision {
            Decision::Start(parts, label) => {
                self.start_entry(parts, line);
                match label {
                    LineLabel::Promoted => self.stats.promotions += 1,
                    _ => self.stats.headwords += 1,
                }
                label
            }
            Decision::NumberedSense => {
                if let ClassifierState::BuildingEntry(entry) = &mut self.state {
                    entry.senses.push(Sense::new(line.text.clone()));
                }
                self.stats.numbered_senses += 1;
                LineLabel::Sense
            }
            Decision::InlineBreak(found) => {
                let head = line.text[..found.offset].trim();
                if let ClassifierState::BuildingEntry(entry) = &mut self.state {
                    entry.append_text(head);
                }
                self.start_entry(found.parts, line);
                self.stats.inline_breaks += 1;
                LineLabel::InlineBreak
            }
            Decision::Append => {
                if let ClassifierState::BuildingEntry(entry) = &mut self.state {
                    entry.append_text(&line.text);
                }
                self.stats.continuations += 1;
                if adopted {
                    LineLabel::CarryOver
                } else {
                    LineLabel::Continuation
                }
            }
            Decision::Discard => {
                self.stats.discarded_lines += 1;
                LineLabel::Discarded
            }
        }
    }

    fn start_entry(&mut self, parts: HeadwordParts, line: &Line) {
        if let Some(carried) = self.carry.take() {
            self.emitted.push(carried);
        }
        if let ClassifierState::BuildingEntry(previous) =
            mem::replace(&mut self.state, ClassifierState::NoEntry)
        {
            self.emitted.push(previous);
        }

        let mut entry = Entry::new(parts.word, self.ctx.page, self.ctx.column, line.bbox);
        entry.pos = parts.pos;
        entry.alias = parts.alias;
        entry.inflection = parts.inflection;
        if !parts.body.is_empty() {
            entry.senses.push(Sense::new(parts.body));
        }
        self.state = ClassifierState::BuildingEntry(entry);
    }

    fn observe_typography(&mut self, line: &Line) -> bool {
        let window = self.ctx.config.recent_size_window;
        for size in line.span_sizes() {
            self.recent_sizes.push_back(size);
        }
        while self.recent_sizes.len() > window {
            self.recent_sizes.pop_front();
        }

        let first = line.first_span();
        if !self.ctx.matchers.looks_like_word(&normalize_text(&first.text)) {
            return false;
        }

        let recent = self.recent_sizes.iter().copied().collect::<Vec<f32>>();
        let threshold =
            trimmed_median(recent, 0.0).unwrap_or(0.0) + self.ctx.config.emphasis_size_delta;
        let largest = line.span_sizes().fold(0.0_f32, f32::max);

        first.has_bold_font()
            || first.size >= threshold
            || largest >= threshold + EMPHASIS_MAX_SIZE_MARGIN
    }
}
