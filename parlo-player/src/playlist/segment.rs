//! Segment store: parse raw playlist text into ordered segments
//!
//! Text format:
//!
//! ```text
//! # Lesson 4: at the market
//! Ana: ¿Cuánto cuesta?
//!     en: How much is it?
//!     de: Wie viel kostet das?
//!
//! Luis: Dos euros el kilo.
//!     en: Two euros a kilo.
//! ```
//!
//! Blocks are separated by blank lines. The first line of a block is the
//! segment line, optionally prefixed with `Speaker:`. Indented `lang: text`
//! lines are translations. Other lines continue the previous text. Order is
//! source order and is never re-sorted.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Longest speaker label recognised before the first colon
const MAX_SPEAKER_LEN: usize = 32;

/// One text unit with exactly one associated audio clip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub index: usize,
    /// Empty for stories
    pub speaker: String,
    pub text: String,
    /// Translation text keyed by language code
    pub translations: BTreeMap<String, String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("playlist text contains no segments")]
    Empty,

    #[error("translation on line {line} does not follow a segment")]
    OrphanTranslation { line: usize },
}

/// Build the ordered segment list from raw text
pub fn build(raw: &str) -> Result<Vec<Segment>, ParseError> {
    let mut segments = Vec::new();
    let mut current: Option<Draft> = None;

    for (line_no, line) in raw.lines().enumerate().map(|(i, l)| (i + 1, l)) {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if let Some(draft) = current.take() {
                segments.push(draft.finish(segments.len()));
            }
            continue;
        }
        if trimmed.starts_with('#') {
            continue;
        }

        let indented = line.starts_with(|c: char| c.is_whitespace());

        match current.as_mut() {
            None => {
                if indented && parse_translation(trimmed).is_some() {
                    return Err(ParseError::OrphanTranslation { line: line_no });
                }
                current = Some(Draft::start(trimmed));
            }
            Some(draft) => {
                if indented {
                    if let Some((lang, text)) = parse_translation(trimmed) {
                        draft.translations.insert(lang.to_string(), text.to_string());
                        draft.last_translation = Some(lang.to_string());
                        continue;
                    }
                    if let Some(lang) = draft.last_translation.clone() {
                        if let Some(existing) = draft.translations.get_mut(&lang) {
                            push_words(existing, trimmed);
                            continue;
                        }
                    }
                }
                push_words(&mut draft.text, trimmed);
            }
        }
    }

    if let Some(draft) = current.take() {
        segments.push(draft.finish(segments.len()));
    }

    if segments.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(segments)
}

struct Draft {
    /// Segment line as written
    first_line: String,
    speaker: String,
    text: String,
    translations: BTreeMap<String, String>,
    last_translation: Option<String>,
}

impl Draft {
    fn start(trimmed: &str) -> Self {
        let (speaker, text) = split_speaker(trimmed);
        Self {
            first_line: trimmed.to_string(),
            speaker: speaker.to_string(),
            text: text.to_string(),
            translations: BTreeMap::new(),
            last_translation: None,
        }
    }

    /// A bare `Word:` block is kept as text without a speaker
    fn finish(self, index: usize) -> Segment {
        let (speaker, text) = if self.text.is_empty() {
            (String::new(), self.first_line)
        } else {
            (self.speaker, self.text)
        };
        Segment {
            index,
            speaker,
            text,
            translations: self.translations,
        }
    }
}

fn push_words(target: &mut String, more: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(more);
}

/// `Speaker: text` → ("Speaker", "text"); anything else has no speaker
fn split_speaker(line: &str) -> (&str, &str) {
    match line.split_once(':') {
        Some((speaker, rest))
            if !speaker.is_empty()
                && speaker.chars().count() <= MAX_SPEAKER_LEN
                && !speaker.chars().any(char::is_whitespace) =>
        {
            (speaker, rest.trim())
        }
        _ => ("", line),
    }
}

/// `de: text` / `pt-BR: text`
fn parse_translation(trimmed: &str) -> Option<(&str, &str)> {
    let (code, text) = trimmed.split_once(':')?;
    let text = text.trim();
    (is_language_code(code) && !text.is_empty()).then_some((code, text))
}

fn is_language_code(code: &str) -> bool {
    let (base, region) = match code.split_once('-') {
        Some((base, region)) => (base, Some(region)),
        None => (code, None),
    };
    let base_ok = (2..=3).contains(&base.len()) && base.chars().all(|c| c.is_ascii_lowercase());
    let region_ok = region.map_or(true, |r| {
        (2..=4).contains(&r.len()) && r.chars().all(|c| c.is_ascii_alphanumeric())
    });
    base_ok && region_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIALOGUE: &str = "\
# greeting
Ana: Hola, ¿qué tal?
    en: Hi, how are you?
    de: Hallo, wie geht's?

Luis: Muy bien, gracias.
    en: Very well, thanks.
";

    #[test]
    fn test_build_dialogue() {
        let segments = build(DIALOGUE).unwrap();
        assert_eq!(segments.len(), 2);

        assert_eq!(segments[0].index, 0);
        assert_eq!(segments[0].speaker, "Ana");
        assert_eq!(segments[0].text, "Hola, ¿qué tal?");
        assert_eq!(segments[0].translations["en"], "Hi, how are you?");
        assert_eq!(segments[0].translations["de"], "Hallo, wie geht's?");

        assert_eq!(segments[1].index, 1);
        assert_eq!(segments[1].speaker, "Luis");
        assert_eq!(segments[1].translations.len(), 1);
    }

    #[test]
    fn test_story_paragraphs_have_no_speaker() {
        let raw = "Era una vez un gato muy pequeño\nque vivía en Madrid.\n\n\nUn día salió de casa.\n";
        let segments = build(raw).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].speaker, "");
        assert_eq!(
            segments[0].text,
            "Era una vez un gato muy pequeño que vivía en Madrid."
        );
        assert_eq!(segments[1].text, "Un día salió de casa.");
    }

    #[test]
    fn test_wrapped_translation() {
        let raw = "A: Uno\n    en: One and\n      a half\n";
        let segments = build(raw).unwrap();
        assert_eq!(segments[0].translations["en"], "One and a half");
        assert_eq!(segments[0].text, "Uno");
    }

    #[test]
    fn test_region_language_codes() {
        let raw = "A: Olá\n  pt-BR: Oi\n";
        let segments = build(raw).unwrap();
        assert_eq!(segments[0].translations["pt-BR"], "Oi");
    }

    #[test]
    fn test_sentence_with_colon_is_not_a_speaker() {
        let (speaker, text) = split_speaker("Note this well: it matters");
        assert_eq!(speaker, "");
        assert_eq!(text, "Note this well: it matters");
    }

    #[test]
    fn test_empty_input_is_error() {
        assert_eq!(build(""), Err(ParseError::Empty));
        assert_eq!(build("# only a comment\n\n"), Err(ParseError::Empty));
    }

    #[test]
    fn test_orphan_translation_is_error() {
        assert_eq!(
            build("\n    en: Hello\n"),
            Err(ParseError::OrphanTranslation { line: 2 })
        );
    }

    #[test]
    fn test_speaker_without_text_is_kept_as_text() {
        let segments = build("Ana: Hola\n    en: Hi\n\nLuis: Adiós\n\nFin:\n").unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].speaker, "Luis");
        assert_eq!(segments[2].index, 2);
        assert_eq!(segments[2].speaker, "");
        assert_eq!(segments[2].text, "Fin:");

        let segments = build("Ana:\n    en: Ana\n").unwrap();
        assert_eq!(segments[0].text, "Ana:");
        assert_eq!(segments[0].translations["en"], "Ana");
    }

    #[test]
    fn test_speaker_with_wrapped_text() {
        let segments = build("Ana:\nbuenos días\n").unwrap();
        assert_eq!(segments[0].speaker, "Ana");
        assert_eq!(segments[0].text, "buenos días");
    }
}
