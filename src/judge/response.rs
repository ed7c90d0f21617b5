use serde::Serialize;

const AFFIRMATIVE: &[&str] = &["yes", "correct", "true", "right", "affirmative"];
const NEGATIVE: &[&str] = &["no", "incorrect", "wrong", "false", "incorrectly"];
const NEGATION: &str = "not";

/// How a judge reply was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgeReply {
    Affirmative,
    Negative,
    /// The leading verdict clause mixes both vocabularies.
    Ambiguous,
    /// No clause carries a verdict.
    Unrecognized,
}

impl JudgeReply {
    pub fn is_correct(self) -> bool {
        self == JudgeReply::Affirmative
    }
}

impl std::fmt::Display for JudgeReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            JudgeReply::Affirmative => "affirmative",
            JudgeReply::Negative => "negative",
            JudgeReply::Ambiguous => "ambiguous",
            JudgeReply::Unrecognized => "unrecognized",
        })
    }
}

/// Classify a free-text judge reply by case-insensitive token matching.
///
/// The reply is read clause by clause (split on sentence punctuation and
/// newlines) and the first clause carrying a verdict decides, so an
/// explanation after a leading "Yes." or "No." is ignored. Within that clause
/// "not" followed by an affirmative token counts as a negative.
pub fn classify_reply(reply: &str) -> JudgeReply {
    reply
        .split(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '\n'))
        .map(classify_clause)
        .find(|r| *r != JudgeReply::Unrecognized)
        .unwrap_or(JudgeReply::Unrecognized)
}

fn classify_clause(clause: &str) -> JudgeReply {
    let tokens: Vec<String> = clause
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();

    let mut affirmative = false;
    let mut negative = false;
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        if token == NEGATION {
            if tokens
                .get(i + 1)
                .is_some_and(|next| AFFIRMATIVE.contains(&next.as_str()))
            {
                negative = true;
                i += 2;
                continue;
            }
        } else if AFFIRMATIVE.contains(&token) {
            affirmative = true;
        } else if NEGATIVE.contains(&token) {
            negative = true;
        }
        i += 1;
    }

    match (affirmative, negative) {
        (true, false) => JudgeReply::Affirmative,
        (false, true) => JudgeReply::Negative,
        (true, true) => JudgeReply::Ambiguous,
        (false, false) => JudgeReply::Unrecognized,
    }
}
