//! Chord-sheet rendering of catalog tabs and manual input.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::RawTab;

use super::chords::{chord_line_tokens, normalize_chord_name, ChordParser};
use super::ConvertError;

/// Bracketed section label alone on its line: `[Verse 2]`, `[chorus]`.
static SECTION_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)^\[((?:Intro|Verse|Chorus|Pre-Chorus|Bridge|Instrumental|Interlude|Turnaround|Outro Chorus|Outro|Tag|Ending|Solo|Break|Refrain|Coda|Hook|Vamp)(?:[ \t]*\d+)?)\][ \t\r]*$",
    )
    .expect("valid regex")
});

static EXCESS_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Key shown when neither the catalog nor detection provides one.
pub const UNKNOWN_KEY: &str = "Unknown";

const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Output of a tab conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// The rendered chord sheet.
    pub onsong_format: String,
    /// Declared or detected key, or "Unknown".
    pub detected_key: String,
    /// Chord occurrences, repeats included.
    pub chord_count: usize,
    /// Unique chord names in order of first appearance.
    pub chords: Vec<String>,
}

/// Converts catalog markup into OnSong-style chord sheets.
#[derive(Debug, Default, Clone)]
pub struct SheetConverter {
    parser: ChordParser,
}

impl SheetConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parser(&self) -> &ChordParser {
        &self.parser
    }

    /// Check the fields every conversion needs; reports the first missing one.
    pub fn validate_tab(&self, tab: &RawTab) -> Result<(), ConvertError> {
        if tab.song_name.trim().is_empty() {
            return Err(ConvertError::Validation("song name is required".to_string()));
        }
        if tab.artist_name.trim().is_empty() {
            return Err(ConvertError::Validation("artist name is required".to_string()));
        }
        if tab.content.trim().is_empty() {
            return Err(ConvertError::Validation("tab content is empty".to_string()));
        }
        Ok(())
    }

    /// Render a catalog tab as a chord sheet with header and footer.
    pub fn convert(&self, tab: &RawTab) -> Result<ConversionResult, ConvertError> {
        self.validate_tab(tab)?;

        let chords = self.parser.extract_chords(&tab.content);
        let key = self.resolve_key(tab, &chords);

        debug!(
            tab_id = tab.tab_id,
            key = %key,
            chord_count = chords.len(),
            "Converting tab"
        );

        let mut out = String::new();
        out.push_str(&tab.song_name);
        out.push('\n');
        out.push_str(&tab.artist_name);
        out.push('\n');
        if key != UNKNOWN_KEY {
            out.push_str(&format!("Key: {}\n", key));
        }
        if tab.capo > 0 {
            out.push_str(&format!("Capo: {}\n", tab.capo));
        }
        if tab.has_custom_tuning() {
            out.push_str(&format!("Tuning: {}\n", tab.tuning.trim()));
        }
        out.push('\n');

        out.push_str(&format_body(&tab.content));

        out.push_str("\n\n");
        out.push_str(&format!("# Source: Ultimate Guitar (Tab ID: {})\n", tab.tab_id));
        out.push_str(&format!("# Contributor: {}\n", tab.contributor.username));
        out.push_str(&format!("# Rating: {:.1}/5.0 ({} votes)\n", tab.rating, tab.votes));

        Ok(ConversionResult {
            onsong_format: out,
            detected_key: key,
            chord_count: chords.len(),
            chords: unique_chords(&chords),
        })
    }

    /// Render arbitrary user text the same way, without catalog footer.
    pub fn format_manual_content(&self, title: &str, artist: &str, content: &str) -> String {
        let artist = match artist.trim() {
            "" => UNKNOWN_ARTIST,
            a => a,
        };

        let mut chords = self.parser.extract_chords(content);
        if chords.is_empty() {
            chords = self.parser.extract_plain_chords(content);
        }
        let key = self.parser.detect_key(&chords);

        let mut out = String::new();
        out.push_str(title.trim());
        out.push('\n');
        out.push_str(artist);
        out.push('\n');
        if !key.is_empty() {
            out.push_str(&format!("Key: {}\n", key));
        }
        out.push('\n');
        if !content.trim().is_empty() {
            out.push_str(&format_body(content));
        }
        out
    }

    /// Plain-text rendering with an underlined title.
    pub fn to_plain_text(&self, tab: &RawTab) -> String {
        let heading = format!("{} - {}", tab.song_name, tab.artist_name);

        let mut out = String::new();
        out.push_str(&heading);
        out.push('\n');
        out.push_str(&"=".repeat(heading.chars().count()));
        out.push_str("\n\n");

        if let Some(key) = tab.declared_key() {
            out.push_str(&format!("Key: {}", key));
            if tab.capo > 0 {
                out.push_str(&format!(" (Capo: {})", tab.capo));
            }
            out.push_str("\n\n");
        }

        out.push_str(&format_body(&tab.content));
        out
    }

    fn resolve_key(&self, tab: &RawTab, chords: &[String]) -> String {
        if let Some(declared) = tab.declared_key() {
            return declared.to_string();
        }
        match self.parser.detect_key(chords) {
            detected if detected.is_empty() => UNKNOWN_KEY.to_string(),
            detected => detected,
        }
    }
}

/// Reformat tab markup into the bracketed inline-chord convention.
pub fn format_body(content: &str) -> String {
    let mut body = content.replace("[tab]", "").replace("[/tab]", "");

    let has_inline_chords = body.contains("[ch]");
    if has_inline_chords {
        body = body.replace("[ch]", "[").replace("[/ch]", "]");
    }

    body = SECTION_LABEL.replace_all(&body, "${1}:").into_owned();

    if !has_inline_chords {
        body = body
            .split('\n')
            .map(wrap_chord_line)
            .collect::<Vec<_>>()
            .join("\n");
    }

    EXCESS_BLANK_LINES
        .replace_all(&body, "\n\n")
        .trim()
        .to_string()
}

/// Bracket every chord of a chord-only line, keeping its spacing.
fn wrap_chord_line(line: &str) -> String {
    if chord_line_tokens(line).is_none() {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + 8);
    let mut in_token = false;
    for c in line.chars() {
        let is_space = c.is_whitespace();
        if !is_space && !in_token {
            out.push('[');
            in_token = true;
        } else if is_space && in_token {
            out.push(']');
            in_token = false;
        }
        out.push(c);
    }
    if in_token {
        out.push(']');
    }
    out
}

fn unique_chords(chords: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for chord in chords {
        let name = normalize_chord_name(chord);
        if !name.is_empty() && !unique.contains(&name) {
            unique.push(name);
        }
    }
    unique
}
