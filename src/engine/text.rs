const APOSTROPHE_VARIANTS: [char; 4] = ['\u{2019}', '\u{2032}', '\u{02BC}', '\u{02BB}'];

const SUPERSCRIPT_ORDINALS: [char; 10] = [
    '\u{2070}', '\u{00B9}', '\u{00B2}', '\u{00B3}', '\u{2074}', '\u{2075}', '\u{2076}', '\u{2077}',
    '\u{2078}', '\u{2079}',
];

pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .map(|token| {
            token
                .chars()
                .map(|ch| {
                    if APOSTROPHE_VARIANTS.contains(&ch) {
                        '\''
                    } else {
                        ch
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn collapse_wrap_hyphens(input: &str) -> String {
    normalize_text(input).replace(" - ", "-")
}

/// Drops trailing homograph numbering such as `qaad²`.
pub fn strip_superscript_ordinals(input: &str) -> &str {
    input.trim_end_matches(|ch: char| SUPERSCRIPT_ORDINALS.contains(&ch))
}

pub fn strip_leading_parentheticals(input: &str) -> (Vec<&str>, &str) {
    let mut groups = Vec::new();
    let mut rest = input.trim_start();

    while rest.starts_with('(') {
        let Some(close) = rest.find(')') else {
            break;
        };
        groups.push(&rest[..=close]);
        rest = rest[close + 1..].trim_start();
    }

    (groups, rest)
}

pub fn strip_leading_parenthetical(input: &str) -> (Option<&str>, &str) {
    let trimmed = input.trim_start();
    if !trimmed.starts_with('(') {
        return (None, trimmed);
    }

    match trimmed.find(')') {
        Some(close) => (Some(&trimmed[..=close]), trimmed[close + 1..].trim_start()),
        None => (None, trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_maps_apostrophes_and_whitespace() {
        let raw = "  ka\u{2019}a   m.\u{02BB}  \t dhul ";
        assert_eq!(normalize_text(raw), "ka'a m.' dhul");
    }

    #[test]
    fn normalize_text_is_idempotent() {
        let once = normalize_text(" ba\u{2032}aad   f. ");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn collapse_wrap_hyphens_joins_split_compounds() {
        assert_eq!(collapse_wrap_hyphens("isku - dhafan iyo  -  wax"), "isku-dhafan iyo-wax");
        assert_eq!(collapse_wrap_hyphens("isku-dhafan"), "isku-dhafan");
    }

    #[test]
    fn strip_superscript_ordinals_only_touches_the_tail() {
        assert_eq!(strip_superscript_ordinals("qaad\u{00B2}"), "qaad");
        assert_eq!(strip_superscript_ordinals("qa\u{00B9}ad"), "qa\u{00B9}ad");
    }

    #[test]
    fn strip_leading_parentheticals_consumes_every_group() {
        let (groups, rest) = strip_leading_parentheticals("(alias) (old) m. text");
        assert_eq!(groups, vec!["(alias)", "(old)"]);
        assert_eq!(rest, "m. text");

        let (groups, rest) = strip_leading_parentheticals("(unclosed m. text");
        assert!(groups.is_empty());
        assert_eq!(rest, "(unclosed m. text");
    }

    #[test]
    fn strip_leading_parenthetical_takes_one_group() {
        assert_eq!(
            strip_leading_parenthetical("(-da) waa"),
            (Some("(-da)"), "waa")
        );
        assert_eq!(strip_leading_parenthetical("waa"), (None, "waa"));
    }
}
