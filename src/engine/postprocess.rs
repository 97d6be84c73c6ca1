use super::matchers::Matchers;
use super::text::{collapse_wrap_hyphens, normalize_text};
use crate::model::Entry;

pub fn finalize_entry(entry: &mut Entry, matchers: &Matchers) {
    entry.word = normalize_text(&entry.word);
    entry.pos = normalize_text(&entry.pos);

    for sense in &mut entry.senses {
        sense.text = collapse_wrap_hyphens(&sense.text);
    }
    entry.senses.retain(|sense| !sense.text.is_empty());

    for sense in &entry.senses {
        for token in matchers.cross_references(&sense.text) {
            push_unique(&mut entry.cross_refs, token);
        }
        for token in matchers.see_also(&sense.text) {
            push_unique(&mut entry.see_also, token);
        }
    }
}

fn push_unique(tokens: &mut Vec<String>, token: String) {
    if !tokens.contains(&token) {
        tokens.push(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::geometry::BBox;
    use crate::model::Sense;

    fn entry_with(senses: &[&str]) -> Entry {
        let mut entry = Entry::new(" abaar\u{2019}  ", 1, 0, BBox::default());
        entry.pos = "f.".to_string();
        entry.senses = senses.iter().map(|text| Sense::new(*text)).collect();
        entry
    }

    #[test]
    fn finalize_collects_unique_cues_in_order() {
        let matchers = Matchers::new().expect("matchers");
        let mut entry = entry_with(&["dhul (eeg biyo, webi).", "2. isku - dhafan. eeg biyo. ld roob"]);
        finalize_entry(&mut entry, &matchers);

        assert_eq!(entry.word, "abaar'");
        assert_eq!(entry.senses[1].text, "2. isku-dhafan. eeg biyo. ld roob");
        assert_eq!(entry.cross_refs, vec!["biyo", "webi"]);
        assert_eq!(entry.see_also, vec!["roob"]);
    }

    #[test]
    fn finalize_is_idempotent() {
        let matchers = Matchers::new().expect("matchers");
        let mut entry = entry_with(&["roob. eeg sidoo kale daruur, hogol.", "   "]);
        finalize_entry(&mut entry, &matchers);
        let once = entry.clone();
        finalize_entry(&mut entry, &matchers);

        assert_eq!(entry, once);
        assert_eq!(entry.senses.len(), 1);
        assert!(entry.cross_refs.is_empty());
        assert_eq!(entry.see_also, vec!["daruur", "hogol"]);
    }
}
