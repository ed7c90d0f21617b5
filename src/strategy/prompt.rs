pub const ZERO_SHOT_TEMPLATE: &str = r#"Look at the image and answer the question.

Question: {question}

Respond with the answer only, in as few words as possible."#;

pub const PERCEIVE_TEMPLATE: &str = r#"Describe everything in the image that is relevant to the question below.
List objects, text, counts, colors and spatial relations. Do not answer the
question yet.

Question: {question}"#;

pub const REASON_TEMPLATE: &str = r#"An image was described as follows:

{context}

Using only that description, reason step by step about the question below.

Question: {question}"#;

pub const ANSWER_TEMPLATE: &str = r#"Reasoning about an image:

{context}

Question: {question}

Based on the reasoning, respond with the final answer only, in as few words as possible."#;

pub const VERIFY_TEMPLATE: &str = r#"Look at the image again and check a proposed answer.

Question: {question}
Proposed answer: {context}

Respond with EXACTLY one line, no other output:

CONFIDENT
— the proposed answer is correct for this image.

REVISE: <better answer>
— the proposed answer is wrong or incomplete; give the corrected short answer."#;

/// Fill `{question}` and `{context}` in a step template.
///
/// Single pass: substituted text is never scanned for placeholders again.
pub fn render(template: &str, question: &str, context: &str) -> String {
    let mut out = String::with_capacity(template.len() + question.len() + context.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{question}") {
            out.push_str(question);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{context}") {
            out.push_str(context);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Strip the decoration models like to put around a short answer.
pub fn clean_answer(raw: &str) -> String {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    let stripped = match line.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("answer:") => line[7..].trim(),
        _ => line,
    };
    stripped.to_string()
}
