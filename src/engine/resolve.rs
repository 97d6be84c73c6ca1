use std::collections::HashMap;

use tracing::debug;

use super::text::{normalize_text, strip_superscript_ordinals};
use crate::model::{Entry, RefTarget};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionSummary {
    pub resolved: usize,
    pub unresolved: usize,
}

struct ReferenceIndex {
    targets: Vec<(usize, String)>,
    exact: HashMap<String, Vec<usize>>,
    base: HashMap<String, Vec<usize>>,
}

impl ReferenceIndex {
    fn build(entries: &[Entry]) -> Self {
        let mut targets = Vec::with_capacity(entries.len());
        let mut exact = HashMap::<String, Vec<usize>>::new();
        let mut base = HashMap::<String, Vec<usize>>::new();

        for (position, entry) in entries.iter().enumerate() {
            let word = normalize_text(&entry.word);
            exact.entry(word.clone()).or_default().push(position);
            base.entry(strip_superscript_ordinals(&word).to_string())
                .or_default()
                .push(position);
            targets.push((entry.id, word));
        }

        Self {
            targets,
            exact,
            base,
        }
    }

    fn resolve(&self, token: &str) -> RefTarget {
        let key = normalize_text(token);

        let position = match self.exact.get(&key) {
            Some(positions) if positions.len() == 1 => Some(positions[0]),
            _ => self
                .base
                .get(strip_superscript_ordinals(&key))
                .and_then(|positions| positions.first().copied()),
        };

        match position.and_then(|position| self.targets.get(position)) {
            Some((id, word)) => RefTarget::Entry {
                id: *id,
                word: word.clone(),
            },
            None => RefTarget::Literal(key),
        }
    }
}

/// Fills `cross_ref_targets` and `see_also_targets` for every entry in the batch.
///
/// Each target list has the same length and order as its token list. Ambiguous base
/// forms go to the earliest entry in batch order. Running it twice gives the same result.
pub fn resolve_cross_references(entries: &mut [Entry]) -> ResolutionSummary {
    let index = ReferenceIndex::build(entries);
    let mut summary = ResolutionSummary::default();

    for entry in entries.iter_mut() {
        entry.cross_ref_targets = resolve_all(&index, &entry.cross_refs, &mut summary);
        entry.see_also_targets = resolve_all(&index, &entry.see_also, &mut summary);
    }

    summary
}

fn resolve_all(
    index: &ReferenceIndex,
    tokens: &[String],
    summary: &mut ResolutionSummary,
) -> Vec<RefTarget> {
    tokens
        .iter()
        .map(|token| {
            let target = index.resolve(token);
            match target {
                RefTarget::Entry { .. } => summary.resolved += 1,
                RefTarget::Literal(_) => {
                    summary.unresolved += 1;
                    debug!(token = %token, "cross-reference left unresolved");
                }
            }
            target
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::geometry::BBox;

    fn entry(id: usize, word: &str, cross_refs: &[&str]) -> Entry {
        let mut entry = Entry::new(word, 1, 0, BBox::default());
        entry.id = id;
        entry.cross_refs = cross_refs.iter().map(|token| token.to_string()).collect();
        entry
    }

    #[test]
    fn unknown_tokens_stay_literal() {
        let mut entries = vec![entry(0, "roob", &["xxqyz", "biyo"]), entry(1, "biyo", &[])];
        let summary = resolve_cross_references(&mut entries);

        assert_eq!(
            entries[0].cross_ref_targets,
            vec![
                RefTarget::Literal("xxqyz".to_string()),
                RefTarget::Entry {
                    id: 1,
                    word: "biyo".to_string()
                },
            ]
        );
        assert_eq!(summary, ResolutionSummary { resolved: 1, unresolved: 1 });
    }

    #[test]
    fn homographs_resolve_exactly_then_by_base_form() {
        let mut entries = vec![
            entry(0, "qaad\u{00B9}", &[]),
            entry(1, "qaad\u{00B2}", &[]),
            entry(2, "dhig", &["qaad\u{00B2}", "qaad"]),
        ];
        entries[2].see_also = vec!["qaad\u{00B3}".to_string()];
        resolve_cross_references(&mut entries);

        let ids = entries[2]
            .cross_ref_targets
            .iter()
            .map(RefTarget::entry_id)
            .collect::<Vec<Option<usize>>>();
        assert_eq!(ids, vec![Some(1), Some(0)]);
        assert_eq!(entries[2].see_also_targets[0].entry_id(), Some(0));
    }

    #[test]
    fn duplicate_exact_words_fall_back_to_first_base_match() {
        let mut entries = vec![
            entry(0, "gal", &[]),
            entry(1, "gal", &[]),
            entry(2, "dhig", &["gal"]),
        ];
        resolve_cross_references(&mut entries);
        assert_eq!(entries[2].cross_ref_targets[0].entry_id(), Some(0));
    }

    #[test]
    fn resolution_is_idempotent_and_aligned() {
        let mut entries = vec![
            entry(0, "roob", &["biyo", "daruur", "xxqyz"]),
            entry(1, "biyo", &["roob"]),
        ];
        resolve_cross_references(&mut entries);
        let once = entries.clone();
        resolve_cross_references(&mut entries);

        assert_eq!(entries, once);
        for entry in &entries {
            assert_eq!(entry.cross_refs.len(), entry.cross_ref_targets.len());
            assert_eq!(entry.see_also.len(), entry.see_also_targets.len());
        }
    }
}
