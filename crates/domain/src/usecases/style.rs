//! Deterministic rule-based rewriting

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::model::{Closing, Draft, StyleConfig, Structure, Tone, Variation, VariationSource};

/// Separator between body and closing line
const CLOSING_SEPARATOR: &str = "\n\n";
const ELLIPSIS: char = '…';

static CTA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(let me know|what do you think|your thoughts|in the comments|drop a comment|leave a comment|share this|follow (me|along|for)|dm me|link in bio)",
    )
    .expect("CTA pattern is valid")
});

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•]|\d+[.)])\s+").expect("list marker pattern is valid"));

struct Substitution {
    pattern: Regex,
    replacement: &'static str,
}

fn compile(pairs: &[(&str, &'static str)]) -> Vec<Substitution> {
    pairs
        .iter()
        .map(|(from, to)| Substitution {
            pattern: Regex::new(&format!(r"(?i)\b{}\b", regex::escape(from)))
                .expect("substitution pattern is valid"),
            replacement: to,
        })
        .collect()
}

static PROFESSIONAL: LazyLock<Vec<Substitution>> = LazyLock::new(|| {
    compile(&[
        ("gonna", "going to"),
        ("wanna", "want to"),
        ("kinda", "somewhat"),
        ("awesome", "excellent"),
        ("super", "highly"),
        ("a lot of", "significant"),
        ("stuff", "work"),
        ("cool", "notable"),
        ("guys", "everyone"),
    ])
});

static CASUAL: LazyLock<Vec<Substitution>> = LazyLock::new(|| {
    compile(&[
        ("utilize", "use"),
        ("however", "but"),
        ("therefore", "so"),
        ("additionally", "also"),
        ("approximately", "about"),
        ("regarding", "about"),
        ("commence", "start"),
        ("obtain", "get"),
    ])
});

static BOLD: LazyLock<Vec<Substitution>> = LazyLock::new(|| {
    compile(&[
        ("i think", "I know"),
        ("i believe", "I'm certain"),
        ("maybe", "absolutely"),
        ("might", "will"),
        ("good", "outstanding"),
        ("shipped", "launched"),
        ("tried", "set out"),
    ])
});

static FRIENDLY: LazyLock<Vec<Substitution>> = LazyLock::new(|| {
    compile(&[
        ("hello", "hey"),
        ("utilize", "use"),
        ("purchase", "buy"),
        ("assist", "help"),
        ("colleagues", "teammates"),
        ("however", "that said"),
    ])
});

fn substitutions(tone: Tone) -> &'static [Substitution] {
    match tone {
        Tone::Professional => &PROFESSIONAL,
        Tone::Casual => &CASUAL,
        Tone::Bold => &BOLD,
        Tone::Friendly => &FRIENDLY,
    }
}

fn question_hook(tone: Tone) -> &'static str {
    match tone {
        Tone::Professional => "What does real progress look like?",
        Tone::Casual => "Guess what?",
        Tone::Bold => "Ready for something big?",
        Tone::Friendly => "Want to hear some good news?",
    }
}

fn closing_line(tone: Tone, closing: Closing) -> Option<&'static str> {
    let line = match (closing, tone) {
        (Closing::None, _) => return None,
        (Closing::Cta, Tone::Professional) => {
            "What's your take? Share your thoughts in the comments."
        }
        (Closing::Cta, Tone::Casual) => "Drop a comment and let me know what you think!",
        (Closing::Cta, Tone::Bold) => "Don't wait. Follow along and share this with your network.",
        (Closing::Cta, Tone::Friendly) => "I'd love to hear from you, so leave a comment below!",
        (Closing::Reflective, Tone::Professional) => {
            "Grateful for the lessons this journey keeps teaching."
        }
        (Closing::Reflective, Tone::Casual) => "Still thinking about how far this has come.",
        (Closing::Reflective, Tone::Bold) => "This is only the beginning.",
        (Closing::Reflective, Tone::Friendly) => {
            "Taking a moment to appreciate every step along the way."
        }
    };
    Some(line)
}

/// Pure rewriter: tone, structure, closing, then length
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleRuleEngine;

impl StyleRuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// Rewrite a draft using its own style (or the defaults)
    pub fn apply(&self, draft: &Draft) -> Variation {
        let style = draft.effective_style();
        Variation {
            text: self.rewrite(&draft.text, style),
            style,
            source: VariationSource::RuleBased,
        }
    }

    /// Rewrite raw text under an explicit style
    pub fn rewrite(&self, text: &str, style: StyleConfig) -> String {
        let mut sentences: Vec<String> = split_sentences(text)
            .into_iter()
            .map(|s| apply_tone(&s, style.tone))
            .collect();

        // A trailing call-to-action in the draft is replaced by (or removed for) the configured closing
        if sentences.len() > 1
            && sentences
                .last()
                .is_some_and(|last| CTA_PATTERN.is_match(last))
        {
            sentences.pop();
        }

        let mut body = segment(&sentences, style);
        // A hook that pushes the draft past the limit would crowd out the draft itself
        if style.structure == Structure::QuestionLed && char_len(&body) > style.max_length {
            body = segment(&sentences, style.with_structure(Structure::Narrative));
        }
        let closing = closing_line(style.tone, style.closing);

        fit(&body, closing, style.max_length)
    }

    /// Cut text down to `max_chars`, preferring the last whole sentence
    pub fn truncate(&self, text: &str, max_chars: usize) -> String {
        truncate_text(text, max_chars)
    }
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();

    for line in text.lines() {
        let line = LIST_MARKER.replace(line.trim(), "");
        let mut current = String::new();
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            current.push(c);
            if is_terminal(c) {
                while let Some(&next) = chars.peek() {
                    if is_terminal(next) || matches!(next, '"' | '\'' | ')' | '”' | '’') {
                        current.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if chars.peek().is_none_or(|next| next.is_whitespace()) {
                    push_sentence(&mut sentences, &current);
                    current.clear();
                }
            }
        }
        push_sentence(&mut sentences, &current);
    }

    sentences
}

fn push_sentence(out: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let mut sentence = trimmed.to_string();
    if !sentence
        .trim_end_matches(['"', '\'', ')', '”', '’'])
        .ends_with(is_terminal)
    {
        sentence.push('.');
    }
    out.push(sentence);
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn apply_tone(sentence: &str, tone: Tone) -> String {
    substitutions(tone)
        .iter()
        .fold(sentence.to_string(), |text, sub| {
            sub.pattern
                .replace_all(&text, |caps: &Captures| match_case(&caps[0], sub.replacement))
                .into_owned()
        })
}

/// Carry the leading capital of `original` over to `replacement`
fn match_case(original: &str, replacement: &str) -> String {
    let capitalized = original.chars().next().is_some_and(char::is_uppercase);
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) if capitalized => first.to_uppercase().chain(chars).collect(),
        _ => replacement.to_string(),
    }
}

fn segment(sentences: &[String], style: StyleConfig) -> String {
    match style.structure {
        Structure::Narrative => sentences.join(" "),
        Structure::Bulleted => sentences
            .iter()
            .map(|s| format!("• {}", s))
            .collect::<Vec<_>>()
            .join("\n"),
        Structure::QuestionLed => match sentences.split_first() {
            Some((first, rest)) if first.ends_with('?') => {
                if rest.is_empty() {
                    first.clone()
                } else {
                    format!("{}\n\n{}", first, rest.join(" "))
                }
            }
            _ => format!("{}\n\n{}", question_hook(style.tone), sentences.join(" ")),
        },
    }
}

/// Attach the closing and enforce the length limit
///
/// The closing is kept only when at least one whole body sentence fits beside
/// it; otherwise it is dropped and the body alone is truncated.
fn fit(body: &str, closing: Option<&str>, max_chars: usize) -> String {
    if let Some(closing) = closing {
        let reserved = char_len(closing) + char_len(CLOSING_SEPARATOR);
        if let Some(kept) = max_chars
            .checked_sub(reserved)
            .and_then(|budget| whole_sentences(body, budget))
        {
            return format!("{}{}{}", kept, CLOSING_SEPARATOR, closing);
        }
    }
    truncate_text(body, max_chars)
}

/// `text` itself if it fits, else its prefix up to the last sentence boundary within `max_chars`
fn whole_sentences(text: &str, max_chars: usize) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return Some(text.to_string());
    }

    (1..=max_chars)
        .rev()
        .find(|&end| is_terminal(chars[end - 1]) && chars.get(end).is_none_or(|c| c.is_whitespace()))
        .map(|end| chars[..end].iter().collect::<String>().trim_end().to_string())
        .filter(|kept| !kept.is_empty())
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    if let Some(kept) = whole_sentences(text, max_chars) {
        return kept;
    }

    let chars: Vec<char> = text.chars().collect();
    let limit = max_chars.saturating_sub(1);
    let cut = chars[..limit]
        .iter()
        .rposition(|c| c.is_whitespace())
        .filter(|&pos| pos > 0)
        .unwrap_or(limit);
    let mut out: String = chars[..cut].iter().collect::<String>().trim_end().to_string();
    out.push(ELLIPSIS);
    out
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
