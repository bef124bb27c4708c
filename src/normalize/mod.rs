//! Name normalization for cross-catalog matching.
//!
//! Artist and song names arrive from three places that never agree on
//! spelling: the Spotify metadata dump, the MusicBrainz reference data and
//! free-text Last.fm history entries. This module produces the comparison
//! keys used everywhere identity is resolved, plus the edit distance used
//! by the fuzzy resolution tier.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Title suffixes that don't distinguish the underlying song:
    /// "(Live at Wembley)", "- 2011 Remaster", "(Karaoke Version)", "(feat. X)".
    static ref TITLE_VARIANT_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\s*[\(\[][^)\]]*(?:remaster(?:ed)?|live|acoustic|unplugged|karaoke|instrumental|demo|mono|stereo|radio edit|single version|album version)[^)\]]*[\)\]]").unwrap(),
        Regex::new(r"(?i)\s*[\(\[](?:feat\.?|ft\.?|featuring)\s+[^)\]]+[\)\]]").unwrap(),
        Regex::new(r"(?i)\s*[-–—]\s*(?:\d{4}\s+)?remaster(?:ed)?(?:\s+\d{4})?\s*$").unwrap(),
        Regex::new(r"(?i)\s*[-–—]\s*(?:live|acoustic|karaoke version|single version|radio edit)\s*$").unwrap(),
        Regex::new(r"(?i)\s+(?:feat\.?|ft\.?|featuring)\s+.+$").unwrap(),
    ];
}

/// Leading articles stripped from comparison keys, longest first so
/// "an " wins over "a ".
const LEADING_ARTICLES: [&str; 3] = ["the ", "an ", "a "];

/// Canonicalize a free-text name into a comparison key.
///
/// Lowercases, folds "&" to "and", strips apostrophes, replaces all other
/// punctuation with spaces, collapses whitespace and strips one leading
/// article. The output alphabet is letters, digits and single spaces, so
/// applying `normalize` to its own output is a no-op.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();

    let mut cleaned = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        match c {
            '\'' | '’' | '`' => {} // "don't" -> "dont", not "don t"
            '&' => cleaned.push_str(" and "),
            c if c.is_alphanumeric() => cleaned.push(c),
            _ => cleaned.push(' '),
        }
    }

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    for article in LEADING_ARTICLES {
        if let Some(rest) = collapsed.strip_prefix(article) {
            if !rest.is_empty() {
                return rest.to_string();
            }
        }
    }

    collapsed
}

/// Secondary alias key on top of [`normalize`].
///
/// Folds token-level spelling variants that `normalize` can't see:
/// "guns n roses" and "guns and roses" produce the same alias key. Used as
/// a fallback comparison when normalized keys don't match exactly.
pub fn alias_key(text: &str) -> String {
    normalize(text)
        .split(' ')
        .map(|token| match token {
            "n" | "nd" => "and",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonicalize a song title, additionally stripping release-variant
/// decorations ("(Live)", "- 2011 Remaster", "(feat. ...)") that don't
/// change which song it is.
pub fn normalize_title(text: &str) -> String {
    let mut title = text.to_string();
    for pattern in TITLE_VARIANT_PATTERNS.iter() {
        title = pattern.replace_all(&title, "").to_string();
    }
    normalize(&title)
}

/// Levenshtein (edit) distance between two strings.
///
/// Two-row dynamic programming, operating on chars so multi-byte names
/// ("Beyoncé") count per character rather than per byte.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev_row: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr_row: Vec<usize> = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        curr_row[0] = i + 1;

        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_chars.len()]
}
