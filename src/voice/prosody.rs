//! SSML prosody annotation
//!
//! Turns plain reply text into an SSML document with pauses, emphasis,
//! breath marks and rate changes. The transform is pure and deterministic.
//!
//! Stages run in a fixed order because later stages match on markup the
//! earlier ones inserted:
//!
//! 1. strip existing markup
//! 2. split paragraphs on blank lines
//! 3. punctuation pauses
//! 4. emphasis vocabulary
//! 5. question pauses
//! 6. exclamation pauses
//! 7. breath marks between sentences
//! 8. slower rate for long sentences
//! 9. single `<speak>` root

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Words spoken with moderate emphasis
pub const EMPHASIS_WORDS: [&str; 7] = [
    "must",
    "critical",
    "important",
    "necessary",
    "essential",
    "key",
    "vital",
];

/// Sentences longer than this many words are slowed down
pub const LONG_SENTENCE_WORDS: usize = 15;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

static COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*").expect("valid regex"));
static SEMICOLON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r";\s*").expect("valid regex"));
static COLON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":\s*").expect("valid regex"));
static PERIOD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.\s+").expect("valid regex"));

static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({})\b", EMPHASIS_WORDS.join("|")))
        .expect("valid regex")
});

// Terminal mark, then whitespace and pauses already attached to it, then
// the capital that opens the next sentence
static SENTENCE_GAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([.!?])((?:\s|<break time="\d+ms"/>)*\s(?:<break time="\d+ms"/>)*)(\p{Lu})"#)
        .expect("valid regex")
});

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]*[.!?]").expect("valid regex"));

static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?](?:\s+|$)").expect("valid regex"));

/// An SSML document produced by [`annotate`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarkupDocument(String);

impl MarkupDocument {
    /// The SSML text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the SSML text
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for MarkupDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MarkupDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remove markup from text
///
/// Drops every `<...>` tag, then any stray `<`, `>` or `&` left over. Those
/// characters carry XML meaning and are never spoken, so removing them keeps
/// the annotated document well formed without escaping.
#[must_use]
pub fn strip_markup(text: &str) -> String {
    TAG.replace_all(text, "")
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '&'))
        .collect()
}

/// Annotate plain text with SSML prosody markup
///
/// Any markup already present is stripped first, so annotating annotated
/// text yields the same document as annotating its plain form.
#[must_use]
pub fn annotate(text: &str) -> MarkupDocument {
    let plain = strip_markup(text);

    if plain.trim().is_empty() {
        return MarkupDocument("<speak></speak>".to_string());
    }

    let body = PARAGRAPH_BREAK
        .split(&plain)
        .map(|paragraph| format!("<p>{}</p>", annotate_paragraph(paragraph.trim())))
        .collect::<Vec<_>>()
        .join("\n\n");

    let document = format!("<speak>{body}</speak>")
        .replace("<speak><speak>", "<speak>")
        .replace("</speak></speak>", "</speak>");

    MarkupDocument(document)
}

/// Split text into sentences, each with its terminal mark
///
/// Sentences missing a recognizable mark report `.`.
#[must_use]
pub fn sentence_boundaries(text: &str) -> Vec<(String, char)> {
    SENTENCE_BOUNDARY
        .find_iter(text)
        .filter_map(|m| {
            let sentence = m.as_str().trim();
            let last = sentence.chars().last()?;
            let mark = if matches!(last, '.' | '!' | '?') { last } else { '.' };
            Some((sentence.to_string(), mark))
        })
        .collect()
}

fn annotate_paragraph(paragraph: &str) -> String {
    let text = insert_punctuation_pauses(paragraph);
    let text = emphasize(&text);
    let text = text.replace('?', r#"<break time="100ms"/>?<break time="500ms"/>"#);
    let text = text.replace('!', r#"<break time="50ms"/>!<break time="500ms"/>"#);
    let text = insert_breaths(&text);
    slow_long_sentences(&text)
}

fn insert_punctuation_pauses(text: &str) -> String {
    let text = COMMA.replace_all(text, r#", <break time="200ms"/>"#);
    let text = SEMICOLON.replace_all(&text, r#"; <break time="300ms"/>"#);
    let text = COLON.replace_all(&text, r#": <break time="250ms"/>"#);
    PERIOD
        .replace_all(&text, r#". <break time="400ms"/>"#)
        .into_owned()
}

/// Wrap emphasis words, touching only text between tags
fn emphasize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for tag in TAG.find_iter(text) {
        out.push_str(&emphasize_plain(&text[last..tag.start()]));
        out.push_str(tag.as_str());
        last = tag.end();
    }
    out.push_str(&emphasize_plain(&text[last..]));

    out
}

fn emphasize_plain(text: &str) -> String {
    EMPHASIS
        .replace_all(text, |caps: &Captures<'_>| {
            format!(r#"<emphasis level="moderate">{}</emphasis>"#, &caps[1])
        })
        .into_owned()
}

fn insert_breaths(text: &str) -> String {
    SENTENCE_GAP
        .replace_all(text, r#"$1$2<break time="600ms"/><mark name="breath"/>$3"#)
        .into_owned()
}

fn slow_long_sentences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for sentence in SENTENCE.find_iter(text) {
        out.push_str(&text[last..sentence.start()]);

        let words = strip_markup(sentence.as_str()).split_whitespace().count();
        if words > LONG_SENTENCE_WORDS {
            out.push_str(r#"<prosody rate="95%">"#);
            out.push_str(sentence.as_str());
            out.push_str("</prosody>");
        } else {
            out.push_str(sentence.as_str());
        }

        last = sentence.end();
    }
    out.push_str(&text[last..]);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(annotate("").as_str(), "<speak></speak>");
        assert_eq!(annotate("   \n\n ").as_str(), "<speak></speak>");
    }

    #[test]
    fn test_comma_and_period_pauses() {
        let doc = annotate("Hello, world. This is important!");
        let ssml = doc.as_str();

        assert!(ssml.contains(r#"Hello, <break time="200ms"/>world"#));
        assert!(ssml.contains(r#"world. <break time="400ms"/>"#));
        assert_eq!(ssml.matches(r#"<break time="200ms"/>"#).count(), 1);
        assert_eq!(ssml.matches(r#"<break time="400ms"/>"#).count(), 1);
        assert!(ssml.contains(r#"<emphasis level="moderate">important</emphasis>"#));
    }

    #[test]
    fn test_semicolon_and_colon() {
        let ssml = annotate("First; second: third").into_string();
        assert!(ssml.contains(r#"First; <break time="300ms"/>second"#));
        assert!(ssml.contains(r#"second: <break time="250ms"/>third"#));
    }

    #[test]
    fn test_emphasis_preserves_case_and_whole_words() {
        let ssml = annotate("You MUST see the keyboard key").into_string();
        assert!(ssml.contains(r#"<emphasis level="moderate">MUST</emphasis>"#));
        assert!(ssml.contains(r#"<emphasis level="moderate">key</emphasis>"#));
        assert!(ssml.contains("keyboard"));
        assert!(!ssml.contains(r#"moderate">keyboard"#));
    }

    #[test]
    fn test_question_and_exclamation() {
        let ssml = annotate("Really? yes!").into_string();
        assert!(ssml.contains(r#"Really<break time="100ms"/>?<break time="500ms"/>"#));
        assert!(ssml.contains(r#"yes<break time="50ms"/>!<break time="500ms"/>"#));
    }

    #[test]
    fn test_breath_before_capitalized_sentence() {
        let ssml = annotate("Stop! Now").into_string();
        assert!(ssml.contains(
            r#"!<break time="500ms"/> <break time="600ms"/><mark name="breath"/>Now"#
        ));

        let ssml = annotate("stop! now").into_string();
        assert!(!ssml.contains("breath"));
    }

    #[test]
    fn test_long_sentence_slowed() {
        let long = "one two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen sixteen.";
        let ssml = annotate(long).into_string();
        assert!(ssml.starts_with(r#"<speak><p><prosody rate="95%">one two"#));
        assert!(ssml.contains("sixteen.</prosody>"));

        let short = annotate("Just a few words.").into_string();
        assert!(!short.contains("prosody"));
    }

    #[test]
    fn test_paragraphs() {
        let ssml = annotate("First part\n\n  \nSecond part").into_string();
        assert_eq!(
            ssml,
            "<speak><p>First part</p>\n\n<p>Second part</p></speak>"
        );
    }

    #[test]
    fn test_strip_removes_tags_and_specials() {
        assert_eq!(
            strip_markup(r#"a <b>bold</b> & <break time="1ms"/>c"#),
            "a bold  c"
        );
        assert_eq!(strip_markup("x < y"), "x  y");
        assert_eq!(strip_markup("x < y > z"), "x  z");
    }

    #[test]
    fn test_existing_markup_is_ignored() {
        let plain = annotate("Hello, world.");
        let marked = annotate("<speak>Hello, <break time=\"999ms\"/>world.</speak>");
        assert_eq!(plain, marked);
    }

    #[test]
    fn test_punctuation_only() {
        let ssml = annotate("?!.,;:").into_string();
        assert!(ssml.starts_with("<speak><p>"));
        assert!(ssml.ends_with("</p></speak>"));
    }

    #[test]
    fn test_sentence_boundaries() {
        let sentences = sentence_boundaries("Hi there. How are you? Great!");
        assert_eq!(
            sentences,
            vec![
                ("Hi there.".to_string(), '.'),
                ("How are you?".to_string(), '?'),
                ("Great!".to_string(), '!'),
            ]
        );
    }
}
