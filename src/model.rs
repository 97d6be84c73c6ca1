use serde::{Deserialize, Serialize};

use crate::engine::geometry::BBox;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sense {
    pub text: String,
}

impl Sense {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    Entry { id: usize, word: String },
    Literal(String),
}

impl RefTarget {
    pub fn label(&self) -> &str {
        match self {
            RefTarget::Entry { word, .. } => word,
            RefTarget::Literal(token) => token,
        }
    }

    pub fn entry_id(&self) -> Option<usize> {
        match self {
            RefTarget::Entry { id, .. } => Some(*id),
            RefTarget::Literal(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: usize,
    pub word: String,
    pub pos: String,
    pub alias: Option<String>,
    pub inflection: Option<String>,
    pub senses: Vec<Sense>,
    pub cross_refs: Vec<String>,
    pub see_also: Vec<String>,
    pub cross_ref_targets: Vec<RefTarget>,
    pub see_also_targets: Vec<RefTarget>,
    pub page: u32,
    pub column: usize,
    pub bbox: BBox,
}

impl Entry {
    pub fn new(word: impl Into<String>, page: u32, column: usize, bbox: BBox) -> Self {
        Self {
            id: 0,
            word: word.into(),
            pos: String::new(),
            alias: None,
            inflection: None,
            senses: Vec::new(),
            cross_refs: Vec::new(),
            see_also: Vec::new(),
            cross_ref_targets: Vec::new(),
            see_also_targets: Vec::new(),
            page,
            column,
            bbox,
        }
    }

    pub fn append_text(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        match self.senses.last_mut() {
            Some(last) if !last.text.is_empty() => {
                last.text.push(' ');
                last.text.push_str(text);
            }
            Some(last) => last.text.push_str(text),
            None => self.senses.push(Sense::new(text)),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.word.is_empty() && !self.senses.is_empty()
    }

    pub fn definition(&self) -> String {
        self.senses
            .iter()
            .map(|sense| sense.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<&str>>()
            .join(" ")
    }

    pub fn to_record(&self) -> EntryRecord {
        EntryRecord {
            id: self.id,
            word: self.word.clone(),
            pos: self.pos.clone(),
            definition: self.definition(),
            alias: self.alias.clone(),
            inflection: self.inflection.clone(),
            cross_refs: self.cross_refs.clone(),
            see_also: self.see_also.clone(),
            cross_ref_targets: labels(&self.cross_ref_targets),
            see_also_targets: labels(&self.see_also_targets),
            cross_ref_target_ids: self.cross_ref_targets.iter().map(RefTarget::entry_id).collect(),
            see_also_target_ids: self.see_also_targets.iter().map(RefTarget::entry_id).collect(),
            page: self.page,
            column: self.column,
        }
    }
}

fn labels(targets: &[RefTarget]) -> Vec<String> {
    targets.iter().map(|target| target.label().to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    See,
    SeeAlso,
}

impl RefKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RefKind::See => "see",
            RefKind::SeeAlso => "seealso",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRef {
    pub kind: RefKind,
    pub target_word: String,
    pub resolved_word: String,
    pub target_id: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    #[serde(default)]
    pub id: usize,
    pub word: String,
    #[serde(default)]
    pub pos: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inflection: Option<String>,
    #[serde(default)]
    pub cross_refs: Vec<String>,
    #[serde(default)]
    pub see_also: Vec<String>,
    #[serde(default)]
    pub cross_ref_targets: Vec<String>,
    #[serde(default)]
    pub see_also_targets: Vec<String>,
    #[serde(default)]
    pub cross_ref_target_ids: Vec<Option<usize>>,
    #[serde(default)]
    pub see_also_target_ids: Vec<Option<usize>>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub column: usize,
}

impl EntryRecord {
    pub fn refs(&self) -> Vec<EntryRef> {
        let mut refs = collect_refs(
            RefKind::See,
            &self.cross_refs,
            &self.cross_ref_targets,
            &self.cross_ref_target_ids,
        );
        refs.extend(collect_refs(
            RefKind::SeeAlso,
            &self.see_also,
            &self.see_also_targets,
            &self.see_also_target_ids,
        ));
        refs
    }
}

fn collect_refs(
    kind: RefKind,
    tokens: &[String],
    targets: &[String],
    target_ids: &[Option<usize>],
) -> Vec<EntryRef> {
    tokens
        .iter()
        .enumerate()
        .map(|(index, token)| EntryRef {
            kind,
            target_word: token.clone(),
            resolved_word: targets.get(index).unwrap_or(token).clone(),
            target_id: target_ids.get(index).copied().flatten(),
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionStats {
    pub pages_requested: usize,
    pub pages_processed: usize,
    pub lines_seen: usize,
    pub margin_lines: usize,
    pub divider_pages: usize,
    pub clustered_pages: usize,
    pub full_width_pages: usize,
    pub unresolved_baselines: usize,
    pub headwords: usize,
    pub promotions: usize,
    pub inline_breaks: usize,
    pub numbered_senses: usize,
    pub continuations: usize,
    pub carry_overs: usize,
    pub discarded_lines: usize,
    pub dropped_entries: usize,
    pub entries: usize,
    pub resolved_refs: usize,
    pub unresolved_refs: usize,
}

impl ExtractionStats {
    pub fn merge(&mut self, other: &Self) {
        self.pages_requested += other.pages_requested;
        self.pages_processed += other.pages_processed;
        self.lines_seen += other.lines_seen;
        self.margin_lines += other.margin_lines;
        self.divider_pages += other.divider_pages;
        self.clustered_pages += other.clustered_pages;
        self.full_width_pages += other.full_width_pages;
        self.unresolved_baselines += other.unresolved_baselines;
        self.headwords += other.headwords;
        self.promotions += other.promotions;
        self.inline_breaks += other.inline_breaks;
        self.numbered_senses += other.numbered_senses;
        self.continuations += other.continuations;
        self.carry_overs += other.carry_overs;
        self.discarded_lines += other.discarded_lines;
        self.dropped_entries += other.dropped_entries;
        self.entries += other.entries;
        self.resolved_refs += other.resolved_refs;
        self.unresolved_refs += other.unresolved_refs;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutput {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub source_sha256: String,
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub pages: Vec<u32>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub counts: ExtractionStats,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub entries: Vec<EntryRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_text_extends_last_sense() {
        let mut entry = Entry::new("abaar", 1, 0, BBox::default());
        entry.append_text("dhul");
        entry.append_text(" engegan. ");
        entry.senses.push(Sense::new("2. roob la'aan."));
        entry.append_text("xilli");

        assert_eq!(entry.senses.len(), 2);
        assert_eq!(entry.senses[0].text, "dhul engegan.");
        assert_eq!(entry.definition(), "dhul engegan. 2. roob la'aan. xilli");
    }

    #[test]
    fn record_keeps_target_ids_aligned_with_tokens() {
        let mut entry = Entry::new("roob", 3, 1, BBox::default());
        entry.id = 7;
        entry.senses.push(Sense::new("biyo. eeg daruur"));
        entry.cross_refs = vec!["daruur".to_string(), "xxqyz".to_string()];
        entry.cross_ref_targets = vec![
            RefTarget::Entry {
                id: 2,
                word: "daruur".to_string(),
            },
            RefTarget::Literal("xxqyz".to_string()),
        ];

        let record = entry.to_record();
        assert_eq!(record.cross_ref_targets, vec!["daruur", "xxqyz"]);
        assert_eq!(record.cross_ref_target_ids, vec![Some(2), None]);

        let refs = record.refs();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].kind, RefKind::See);
        assert_eq!(refs[0].target_id, Some(2));
        assert_eq!(refs[1].target_id, None);
    }

    #[test]
    fn refs_keep_the_raw_mention_when_the_target_word_differs() {
        let mut entry = Entry::new("dhig", 1, 0, BBox::default());
        entry.senses.push(Sense::new("meel saar. eeg qaad"));
        entry.cross_refs = vec!["qaad".to_string()];
        entry.cross_ref_targets = vec![RefTarget::Entry {
            id: 0,
            word: "qaad\u{b9}".to_string(),
        }];

        let refs = entry.to_record().refs();
        assert_eq!(refs[0].target_word, "qaad");
        assert_eq!(refs[0].resolved_word, "qaad\u{b9}");
        assert_eq!(refs[0].target_id, Some(0));
    }

    #[test]
    fn record_serializes_camel_case_without_empty_supplements() {
        let mut entry = Entry::new("abaar", 1, 0, BBox::default());
        entry.pos = "f.".to_string();
        entry.senses.push(Sense::new("dhul engegan."));

        let value = serde_json::to_value(entry.to_record()).expect("serialize record");
        assert_eq!(value["crossRefs"], serde_json::json!([]));
        assert_eq!(value["seeAlsoTargets"], serde_json::json!([]));
        assert!(value.get("alias").is_none());
        assert_eq!(value["definition"], "dhul engegan.");
    }
}
