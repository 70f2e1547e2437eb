//! Text normalization and word-level comparison of a recited text against
//! its reference. Both sides always pass through the same [`normalize`]
//! pipeline before alignment so that punctuation and casing never show up
//! as discrepancies.

/// Tokens of surrounding reference text attached to each discrepancy.
const CONTEXT_TOKENS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscrepancyKind {
    MissingWord,
    WrongWord,
    ExtraWord,
}

impl DiscrepancyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiscrepancyKind::MissingWord => "missing_word",
            DiscrepancyKind::WrongWord => "wrong_word",
            DiscrepancyKind::ExtraWord => "extra_word",
        }
    }
}

/// A single word-level difference between a recitation and its reference.
///
/// Positions are 0-based. For missing and wrong words they index into the
/// reference token sequence; for extra words they index into the submitted
/// token sequence (so the first extra word sits at the reference length).
#[derive(Debug, Clone, PartialEq)]
pub struct Discrepancy {
    pub kind: DiscrepancyKind,
    pub position: usize,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub context_before: String,
    pub context_after: String,
}

/// Characters dropped entirely during normalization. Hyphens are not in
/// this set: they separate compound words and become spaces instead.
fn is_stripped(c: char) -> bool {
    matches!(
        c,
        '.' | ','
            | '/'
            | '#'
            | '!'
            | '$'
            | '%'
            | '^'
            | '&'
            | '*'
            | ';'
            | ':'
            | '{'
            | '}'
            | '='
            | '_'
            | '`'
            | '~'
            | '('
            | ')'
            | '"'
            | '\''
            | '\u{201C}'
            | '\u{201D}'
            | '\u{2014}'
            | '?'
    )
}

/// Lowercase the text, drop punctuation, turn hyphens into spaces, collapse
/// doubled spaces and trim. Kept in lockstep with the grader the clients run.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered.chars().filter(|c| !is_stripped(*c)).collect();
    stripped
        .replace('-', " ")
        .replace("  ", " ")
        .trim()
        .to_string()
}

/// Normalize both texts and align them word by word.
///
/// This is the only entry point callers should use for raw text: it
/// guarantees the recitation and the reference are normalized identically.
pub fn compare(submitted: &str, reference: &str) -> Vec<Discrepancy> {
    let submitted = normalize(submitted);
    let reference = normalize(reference);
    let submitted_words: Vec<&str> = submitted.split_whitespace().collect();
    let reference_words: Vec<&str> = reference.split_whitespace().collect();
    align(&submitted_words, &reference_words)
}

/// Positional word alignment: reference position `i` is compared against
/// submitted position `i`, with no gap insertion or fuzzy matching. A single
/// dropped word therefore cascades into wrong-word reports for the remainder
/// of the reference.
pub fn align(submitted: &[&str], reference: &[&str]) -> Vec<Discrepancy> {
    let mut discrepancies = Vec::new();

    for (i, &expected) in reference.iter().enumerate() {
        let (kind, actual) = match submitted.get(i) {
            None => (DiscrepancyKind::MissingWord, None),
            Some(&word) if word != expected => {
                (DiscrepancyKind::WrongWord, Some(word.to_string()))
            }
            Some(_) => continue,
        };

        discrepancies.push(Discrepancy {
            kind,
            position: i,
            expected: Some(expected.to_string()),
            actual,
            context_before: reference[i.saturating_sub(CONTEXT_TOKENS)..i].join(" "),
            context_after: reference[i + 1..(i + 1 + CONTEXT_TOKENS).min(reference.len())]
                .join(" "),
        });
    }

    // Anything recited past the end of the reference is an extra word. All
    // of them share the same before-context: the tail of the reference.
    let tail_context = reference[reference.len().saturating_sub(CONTEXT_TOKENS)..].join(" ");
    for (i, &word) in submitted.iter().enumerate().skip(reference.len()) {
        discrepancies.push(Discrepancy {
            kind: DiscrepancyKind::ExtraWord,
            position: i,
            expected: None,
            actual: Some(word.to_string()),
            context_before: tail_context.clone(),
            context_after: String::new(),
        });
    }

    discrepancies
}
