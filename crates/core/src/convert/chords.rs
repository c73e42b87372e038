//! Chord extraction and analysis.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Serialize;

/// Inline chord annotation: `[ch]Am7[/ch]`, `[ch]C/G[/ch]`.
static INLINE_CHORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[ch\]([A-G][#b]?(?:maj|min|m|M|sus|aug|dim|add|no|[0-9])*(?:/[A-G][#b]?)?)\[/ch\]")
        .expect("valid regex")
});

/// A bare chord token on a plain-text chord line.
static CHORD_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-G][#b]?(?:maj|min|m|M|sus[24]?|aug|dim|add|no)?[0-9]*(?:/[A-G][#b]?)?$")
        .expect("valid regex")
});

/// Root notes accepted by key detection. No double accidentals, no `Cb`/`Fb`/`E#`/`B#`.
const VALID_ROOTS: &[&str] = &[
    "A", "A#", "Ab", "B", "Bb", "C", "C#", "D", "D#", "Db", "E", "Eb", "F", "F#", "G", "G#", "Gb",
];

/// Summary statistics over a chord sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChordStats {
    pub total: usize,
    pub unique: usize,
    /// Most frequent chord; the first seen wins a tie. Empty for no chords.
    pub most_common: String,
    pub counts: HashMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChordFrequency {
    pub chord: String,
    pub count: usize,
}

/// Chord token parser and key estimator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChordParser;

impl ChordParser {
    pub fn new() -> Self {
        Self
    }

    /// All `[ch]...[/ch]` spellings in document order, repeats included.
    pub fn extract_chords(&self, content: &str) -> Vec<String> {
        INLINE_CHORD
            .captures_iter(content)
            .map(|c| c[1].to_string())
            .collect()
    }

    /// Chord tokens from lines made up only of chords.
    pub fn extract_plain_chords(&self, content: &str) -> Vec<String> {
        content
            .lines()
            .filter_map(chord_line_tokens)
            .flatten()
            .map(String::from)
            .collect()
    }

    /// Best-effort key estimate.
    ///
    /// Picks the most frequent valid root (first seen wins a tie) and appends
    /// `m` when most chords on that root are minor. Returns an empty string
    /// when no chord has a valid root.
    pub fn detect_key(&self, chords: &[String]) -> String {
        let mut tally: Vec<(&str, usize)> = Vec::new();
        for chord in chords {
            let Some(root) = extract_root_note(chord) else {
                continue;
            };
            match tally.iter_mut().find(|(r, _)| *r == root) {
                Some((_, count)) => *count += 1,
                None => tally.push((root, 1)),
            }
        }

        let mut best: Option<(&str, usize)> = None;
        for &(root, count) in &tally {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((root, count));
            }
        }

        let Some((root, _)) = best else {
            return String::new();
        };

        let (minor, major) = chords
            .iter()
            .filter(|c| extract_root_note(c) == Some(root))
            .fold((0, 0), |(minor, major), c| {
                if is_minor(c) {
                    (minor + 1, major)
                } else {
                    (minor, major + 1)
                }
            });

        if minor > major {
            format!("{}m", root)
        } else {
            root.to_string()
        }
    }

    pub fn analyze_stats(&self, chords: &[String]) -> ChordStats {
        let frequencies = self.frequencies(chords);
        ChordStats {
            total: chords.len(),
            unique: frequencies.len(),
            most_common: frequencies
                .first()
                .map(|f| f.chord.clone())
                .unwrap_or_default(),
            counts: frequencies.into_iter().map(|f| (f.chord, f.count)).collect(),
        }
    }

    /// Unique chords in order of first appearance.
    pub fn progression(&self, chords: &[String]) -> Vec<String> {
        let mut unique: Vec<String> = Vec::new();
        for chord in chords {
            if !unique.contains(chord) {
                unique.push(chord.clone());
            }
        }
        unique
    }

    /// Chord counts, most frequent first; ties keep first-appearance order.
    pub fn frequencies(&self, chords: &[String]) -> Vec<ChordFrequency> {
        let mut frequencies: Vec<ChordFrequency> = Vec::new();
        for chord in chords {
            match frequencies.iter_mut().find(|f| &f.chord == chord) {
                Some(f) => f.count += 1,
                None => frequencies.push(ChordFrequency {
                    chord: chord.clone(),
                    count: 1,
                }),
            }
        }
        // sort_by is stable
        frequencies.sort_by(|a, b| b.count.cmp(&a.count));
        frequencies
    }
}

/// Root note of a chord spelling ("F#m7" -> "F#"), if it is a valid root.
pub fn extract_root_note(chord: &str) -> Option<&'static str> {
    let mut chars = chord.chars();
    let first = chars.next()?;
    let mut root = first.to_string();
    if let Some(accidental @ ('#' | 'b')) = chars.next() {
        root.push(accidental);
    }
    VALID_ROOTS.iter().copied().find(|r| *r == root)
}

/// Strip inline chord markers and surrounding whitespace.
pub fn normalize_chord_name(chord: &str) -> String {
    chord.replace("[ch]", "").replace("[/ch]", "").trim().to_string()
}

/// Whether a bare token is a chord spelling.
pub fn is_chord_token(token: &str) -> bool {
    CHORD_TOKEN.is_match(token)
}

/// Tokens of a line consisting only of chords, or `None` for any other line.
///
/// Blank lines and label lines (ending in `:`) are never chord lines.
pub(crate) fn chord_line_tokens(line: &str) -> Option<Vec<&str>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.ends_with(':') {
        return None;
    }
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    tokens.iter().all(|t| is_chord_token(t)).then_some(tokens)
}

fn is_minor(chord: &str) -> bool {
    let lower = chord.to_lowercase();
    lower.contains('m') && !lower.contains("maj")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chords(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_chords_in_order_with_repeats() {
        let parser = ChordParser::new();
        let content = "[ch]G[/ch] la [ch]Am7[/ch]\n[ch]G[/ch] [ch]C/G[/ch] [ch]Dsus4[/ch] [ch]N.C.[/ch]";
        assert_eq!(
            parser.extract_chords(content),
            chords(&["G", "Am7", "G", "C/G", "Dsus4"])
        );
    }

    #[test]
    fn test_extract_plain_chords() {
        let parser = ChordParser::new();
        let content = "Verse:\nG    C   D\nHello there\n\nEm  C";
        assert_eq!(
            parser.extract_plain_chords(content),
            chords(&["G", "C", "D", "Em", "C"])
        );
    }

    #[test]
    fn test_detect_key_major() {
        let parser = ChordParser::new();
        assert_eq!(parser.detect_key(&chords(&["G", "C", "G", "D"])), "G");
    }

    #[test]
    fn test_detect_key_minor() {
        let parser = ChordParser::new();
        assert_eq!(parser.detect_key(&chords(&["Am", "Am", "C", "F"])), "Am");
    }

    #[test]
    fn test_detect_key_maj_is_major() {
        let parser = ChordParser::new();
        assert_eq!(parser.detect_key(&chords(&["Cmaj7", "Cmaj7", "Am"])), "C");
    }

    #[test]
    fn test_detect_key_tie_first_seen_wins() {
        let parser = ChordParser::new();
        assert_eq!(parser.detect_key(&chords(&["D", "A", "A", "D"])), "D");
        assert_eq!(parser.detect_key(&chords(&["A", "D", "D", "A"])), "A");
    }

    #[test]
    fn test_detect_key_empty_and_invalid() {
        let parser = ChordParser::new();
        assert_eq!(parser.detect_key(&[]), "");
        assert_eq!(parser.detect_key(&chords(&["H", "E#", "x"])), "");
        assert_eq!(parser.detect_key(&chords(&["H", "Bb"])), "Bb");
    }

    #[test]
    fn test_extract_root_note() {
        assert_eq!(extract_root_note("F#m7"), Some("F#"));
        assert_eq!(extract_root_note("Bbmaj7"), Some("Bb"));
        assert_eq!(extract_root_note("C/G"), Some("C"));
        assert_eq!(extract_root_note("Cb"), None);
        assert_eq!(extract_root_note(""), None);
    }

    #[test]
    fn test_normalize_chord_name() {
        assert_eq!(normalize_chord_name(" [ch]Am[/ch] "), "Am");
        assert_eq!(normalize_chord_name("G"), "G");
    }

    #[test]
    fn test_chord_tokens() {
        for t in ["G", "Am", "F#m7", "Bb", "Dsus4", "C/G", "Cadd9", "Gno3", "EM7"] {
            assert!(is_chord_token(t), "{} should be a chord", t);
        }
        for t in ["Hello", "g", "Am7b5x", "[G]", "|"] {
            assert!(!is_chord_token(t), "{} should not be a chord", t);
        }
    }

    #[test]
    fn test_chord_line_tokens() {
        assert_eq!(chord_line_tokens("  G   C  "), Some(vec!["G", "C"]));
        assert_eq!(chord_line_tokens("G C and more"), None);
        assert_eq!(chord_line_tokens("   "), None);
        assert_eq!(chord_line_tokens("A:"), None);
    }

    #[test]
    fn test_analyze_stats() {
        let parser = ChordParser::new();
        let stats = parser.analyze_stats(&chords(&["G", "C", "G", "D", "C"]));
        assert_eq!(stats.total, 5);
        assert_eq!(stats.unique, 3);
        assert_eq!(stats.most_common, "G");
        assert_eq!(stats.counts.get("C"), Some(&2));

        assert_eq!(parser.analyze_stats(&[]), ChordStats::default());
    }

    #[test]
    fn test_progression() {
        let parser = ChordParser::new();
        assert_eq!(
            parser.progression(&chords(&["G", "C", "G", "D", "C"])),
            chords(&["G", "C", "D"])
        );
    }

    #[test]
    fn test_frequencies_stable() {
        let parser = ChordParser::new();
        let freq = parser.frequencies(&chords(&["D", "G", "C", "G", "C"]));
        let order: Vec<_> = freq.iter().map(|f| (f.chord.as_str(), f.count)).collect();
        assert_eq!(order, vec![("G", 2), ("C", 2), ("D", 1)]);
    }
}
