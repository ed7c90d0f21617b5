const JUDGE_PROMPT_TEMPLATE: &str = r#"You are grading an answer to a question about an image.

Question: {question}
Reference answer: {reference}
Candidate answer: {candidate}

Is the candidate answer correct? It is correct when it means the same as the
reference answer. Ignore differences in casing, articles, punctuation,
singular/plural and number formatting ("2" and "two").

Respond with EXACTLY one word, no other output:

YES
— the candidate answer is correct.

NO
— the candidate answer is wrong, incomplete or does not answer the question."#;

pub fn build_judge_prompt(question: &str, reference: &str, candidate: &str) -> String {
    JUDGE_PROMPT_TEMPLATE
        .replace("{question}", question)
        .replace("{reference}", reference)
        .replace("{candidate}", candidate)
}
