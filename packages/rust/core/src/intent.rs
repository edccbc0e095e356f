//! Free-text command → navigation intent.
//!
//! Classification runs in fixed order: the yes/no reply, then keyword groups
//! (first group with any phrase contained in the utterance wins), then
//! fuzzy matching against the question templates.

use tracing::debug;

/// Default edit-distance bound for question templates (strict `<`).
pub const DEFAULT_QUESTION_THRESHOLD: usize = 2;

const FORWARD: &[&str] = &["forward", "next", "after"];
const BACKWARD: &[&str] = &["back", "previous", "before"];
const BEGINNING: &[&str] = &["begin", "first"];
const ENDING: &[&str] = &["final", "last"];
const DONE: &[&str] = &["exit", "done"];
const REPEAT: &[&str] = &["repeat"];
const ORDINAL_STEP: &[&str] = &["th step", "st step", "nd step", "rd step"];

const ORDINAL_SUFFIXES: &[&str] = &["st", "nd", "rd", "th"];

/// A step reference like "3rd", "first", or "last".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordinal {
    /// One-based step number as typed; may be zero or negative.
    Number(i64),
    First,
    Last,
}

/// Canonical help questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionTemplate {
    HowDoI,
    HowTo,
    HowManySteps,
}

impl QuestionTemplate {
    /// Matching order; earlier templates win ties.
    pub const ALL: [QuestionTemplate; 3] = [Self::HowDoI, Self::HowTo, Self::HowManySteps];

    pub fn text(&self) -> &'static str {
        match self {
            Self::HowDoI => "How do I",
            Self::HowTo => "How to",
            Self::HowManySteps => "How many steps are there?",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Forward,
    Backward,
    Beginning,
    Ending,
    Done,
    OrdinalJump(Ordinal),
    Repeat,
    /// `text` is the template followed by the rest of the utterance.
    Question {
        template: QuestionTemplate,
        text: String,
    },
    Unrecognized,
}

/// Classifies user utterances.
#[derive(Debug, Clone, Copy)]
pub struct IntentClassifier {
    question_threshold: usize,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_QUESTION_THRESHOLD)
    }
}

impl IntentClassifier {
    pub fn new(question_threshold: usize) -> Self {
        Self { question_threshold }
    }

    pub fn classify(&self, utterance: &str) -> Intent {
        let lower = utterance.trim().to_lowercase();

        if matches!(lower.as_str(), "yes" | "y") {
            return Intent::Repeat;
        }

        let intent = self
            .navigation(&lower)
            .or_else(|| self.question(&lower))
            .unwrap_or(Intent::Unrecognized);
        debug!(utterance, ?intent, "classified");
        intent
    }

    fn navigation(&self, lower: &str) -> Option<Intent> {
        let contains_any = |phrases: &[&str]| phrases.iter().any(|p| lower.contains(p));

        if contains_any(FORWARD) {
            Some(Intent::Forward)
        } else if contains_any(BACKWARD) {
            Some(Intent::Backward)
        } else if contains_any(BEGINNING) {
            Some(Intent::Beginning)
        } else if contains_any(ENDING) {
            Some(Intent::Ending)
        } else if contains_any(DONE) {
            Some(Intent::Done)
        } else if contains_any(REPEAT) {
            Some(Intent::Repeat)
        } else if contains_any(ORDINAL_STEP) {
            Some(parse_ordinal(lower).map_or(Intent::Unrecognized, Intent::OrdinalJump))
        } else {
            None
        }
    }

    fn question(&self, lower: &str) -> Option<Intent> {
        let words: Vec<&str> = lower.split_whitespace().collect();
        let mut best: Option<(usize, QuestionTemplate)> = None;

        for template in QuestionTemplate::ALL {
            let canonical = template.text().to_lowercase();
            let width = canonical.split_whitespace().count();
            if words.len() < width {
                continue;
            }

            let distance = edit_distance(&words[..width].join(" "), &canonical);
            if distance < self.question_threshold && best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, template));
            }
        }

        best.map(|(_, template)| {
            let width = template.text().split_whitespace().count();
            let rest = words[width..].join(" ");
            let text = format!("{} {rest}", template.text()).trim_end().to_string();
            Intent::Question { template, text }
        })
    }
}

/// "no" / "n": the user declines and should be asked again.
pub fn is_decline(utterance: &str) -> bool {
    matches!(utterance.trim().to_lowercase().as_str(), "no" | "n")
}

/// First token ending in an ordinal suffix whose stem is a number, "fir", or "la".
pub fn parse_ordinal(utterance: &str) -> Option<Ordinal> {
    utterance.split_whitespace().find_map(|raw| {
        let token = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '-');
        let stem = ORDINAL_SUFFIXES
            .iter()
            .find_map(|suffix| token.strip_suffix(suffix))?;

        match stem {
            "fir" => Some(Ordinal::First),
            "la" => Some(Ordinal::Last),
            _ => stem.parse::<i64>().ok().map(Ordinal::Number),
        }
    })
}

/// Levenshtein distance over chars.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
