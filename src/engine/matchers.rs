use anyhow::{Context, Result};
use regex::Regex;

use super::text::{normalize_text, strip_leading_parenthetical, strip_leading_parentheticals};

const WORD_CHARS: &str = r"A-Za-z'¹²³()\-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadwordParts {
    pub word: String,
    pub alias: Option<String>,
    pub pos: String,
    pub inflection: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineBreak {
    /// Byte offset of the new headword inside the scanned text.
    pub offset: usize,
    pub parts: HeadwordParts,
}

#[derive(Debug)]
pub struct Matchers {
    word_shape: Regex,
    headline: Regex,
    pos_token: Regex,
    numbered_sense: Regex,
    inline_candidate: Regex,
    cross_ref_phrase: Regex,
    see_also_phrase: Regex,
    cross_ref_token: Regex,
    see_also_token: Regex,
    ref_separator: Regex,
    leading_cue: Regex,
}

impl Matchers {
    pub fn new() -> Result<Self> {
        Ok(Self {
            word_shape: Regex::new(&format!(r"^[{WORD_CHARS}]+\d?\b"))
                .context("failed to compile word shape regex")?,
            headline: Regex::new(&format!(
                r"^(?P<word>[{WORD_CHARS}]+\d?)\s+(?P<rest>.+)$"
            ))
            .context("failed to compile headline regex")?,
            pos_token: Regex::new(
                r"(?i)^(?P<pos>[a-z]{1,3}\.[a-z]{1,3}(?:\.[a-z]{1,3})?\d?|u\.j|e\.d|qr\.dd|m\.l/dh|[mfgleu]\.[a-z]{1,3}\d?|[mfgleu]\.\d?)(?:$|[\s(,;:])",
            )
            .context("failed to compile part-of-speech regex")?,
            numbered_sense: Regex::new(r"^\d+\.")
                .context("failed to compile numbered sense regex")?,
            inline_candidate: Regex::new(&format!(r"\b(?P<word>[{WORD_CHARS}]{{1,40}})\s+"))
                .context("failed to compile inline headword regex")?,
            cross_ref_phrase: Regex::new(r"(?i)\(?(?:\beeg|→)\s+(?P<body>[^).;:]+)[).;:]*")
                .context("failed to compile cross-reference phrase regex")?,
            see_also_phrase: Regex::new(r"(?i)\b(?:ld|eeg\s+sidoo\s+kale)\s+(?P<body>[^).;:]+)")
                .context("failed to compile see-also phrase regex")?,
            cross_ref_token: Regex::new(r"(?i)\beeg\s+(?P<token>[A-Za-z'¹²³\-]+)")
                .context("failed to compile cross-reference token regex")?,
            see_also_token: Regex::new(r"(?i)\bld\s+(?P<token>[A-Za-z'¹²³\-]+)")
                .context("failed to compile see-also token regex")?,
            ref_separator: Regex::new(r"[;,،]")
                .context("failed to compile reference separator regex")?,
            leading_cue: Regex::new(r"^(?:eeg\s+|ld\s+)")
                .context("failed to compile leading cue regex")?,
        })
    }

    pub fn looks_like_word(&self, text: &str) -> bool {
        self.word_shape.is_match(text)
    }

    pub fn headline<'t>(&self, text: &'t str) -> Option<(&'t str, &'t str)> {
        let captures = self.headline.captures(text)?;
        Some((captures.name("word")?.as_str(), captures.name("rest")?.as_str()))
    }

    pub fn pos_prefix<'t>(&self, text: &'t str) -> Option<(&'t str, &'t str)> {
        let pos = self.pos_token.captures(text)?.name("pos")?;
        Some((pos.as_str(), &text[pos.end()..]))
    }

    pub fn starts_with_pos(&self, text: &str) -> bool {
        let (_, rest) = strip_leading_parentheticals(text);
        self.pos_prefix(rest).is_some()
    }

    pub fn is_headword_line(&self, text: &str) -> bool {
        self.headline(text)
            .map(|(_, rest)| self.starts_with_pos(rest))
            .unwrap_or(false)
    }

    pub fn parse_headword_line(&self, text: &str) -> Option<HeadwordParts> {
        let (word, rest) = self.headline(text)?;
        self.parts_after_word(word, rest)
    }

    fn parts_after_word(&self, word: &str, rest: &str) -> Option<HeadwordParts> {
        let (aliases, rest) = strip_leading_parentheticals(rest);
        let (pos, after_pos) = self.pos_prefix(rest)?;
        let (inflection, body) = strip_leading_parenthetical(after_pos);
        let alias = if aliases.is_empty() {
            None
        } else {
            Some(aliases.join(" "))
        };

        Some(HeadwordParts {
            word: normalize_text(word),
            alias,
            pos: pos.to_string(),
            inflection: inflection.map(ToOwned::to_owned),
            body: normalize_text(body),
        })
    }

    pub fn starts_numbered_sense(&self, text: &str) -> bool {
        self.numbered_sense.is_match(text)
    }

    pub fn find_inline_break(&self, text: &str) -> Option<InlineBreak> {
        for captures in self.inline_candidate.captures_iter(text) {
            let Some(candidate) = captures.name("word") else {
                continue;
            };
            let word = normalize_text(candidate.as_str());
            if word.chars().count() == 1 && word != "a" {
                continue;
            }

            let Some(whole) = captures.get(0) else {
                continue;
            };
            if let Some(parts) = self.parts_after_word(&word, &text[whole.end()..]) {
                return Some(InlineBreak {
                    offset: candidate.start(),
                    parts,
                });
            }
        }

        None
    }

    pub fn cross_references(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();

        for captures in self.cross_ref_phrase.captures_iter(text) {
            let Some(body) = captures.name("body") else {
                continue;
            };
            if opens_see_also_cue(body.as_str()) {
                continue;
            }
            tokens.extend(self.split_reference_list(body.as_str()));
        }

        for captures in self.cross_ref_token.captures_iter(text) {
            let Some(token) = captures.name("token") else {
                continue;
            };
            if opens_see_also_cue(&text[token.start()..]) {
                continue;
            }
            tokens.push(normalize_text(token.as_str()));
        }

        tokens.retain(|token| !token.is_empty());
        tokens
    }

    pub fn see_also(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();

        for captures in self.see_also_phrase.captures_iter(text) {
            if let Some(body) = captures.name("body") {
                tokens.extend(self.split_reference_list(body.as_str()));
            }
        }

        for captures in self.see_also_token.captures_iter(text) {
            if let Some(token) = captures.name("token") {
                tokens.push(normalize_text(token.as_str()));
            }
        }

        tokens.retain(|token| !token.is_empty());
        tokens
    }

    fn split_reference_list(&self, chunk: &str) -> Vec<String> {
        self.ref_separator
            .split(chunk)
            .map(normalize_text)
            .filter(|part| !part.is_empty())
            .map(|part| self.leading_cue.replace(&part, "").into_owned())
            .filter(|part| !part.is_empty())
            .collect()
    }
}

fn opens_see_also_cue(text: &str) -> bool {
    let lowered = normalize_text(text).to_lowercase();
    lowered == "sidoo kale" || lowered.starts_with("sidoo kale ")
}
