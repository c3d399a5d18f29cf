use crate::models::FeedbackStyle;

/// Version of the reply template below; `parse_rewrite_reply` reads this layout
pub const PROMPT_TEMPLATE_VERSION: &str = "rewrite-v3";

/// Section label for the explanation of what to improve
pub const IMPROVEMENT_LABEL: &str = "Improvement";
/// Section label for the rewritten sentence
pub const REWRITTEN_LABEL: &str = "Rewritten";

fn tone_instructions(style: FeedbackStyle) -> &'static str {
    match style {
        FeedbackStyle::Empathetic => {
            "Use a warm, empathetic tone. Acknowledge how the speaker may feel and \
             point out the problem gently."
        }
        FeedbackStyle::Blunt => {
            "Use a frank, direct tone. State the problem plainly and firmly, \
             without cushioning."
        }
    }
}

/// Build the rewrite prompt for one sentence
pub fn build_rewrite_prompt(sentence: &str, style: FeedbackStyle) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are a communication coach reviewing one sentence from a chat conversation.\n");
    prompt.push_str(tone_instructions(style));
    prompt.push_str("\n\n");

    prompt.push_str("Explain what is problematic about the sentence and how it could be improved, ");
    prompt.push_str("then give a rewritten version of it.\n");
    prompt.push_str("The rewritten sentence MUST use different wording from the original. ");
    prompt.push_str("Never repeat the original sentence verbatim.\n");
    prompt.push_str("Answer in the same language as the sentence, ");
    prompt.push_str("but keep the section labels exactly as written below, in English.\n\n");

    prompt.push_str("Reply with exactly these two sections and nothing else:\n\n");
    prompt.push_str(&format!(
        "{}: <what is wrong and how to improve it>\n",
        IMPROVEMENT_LABEL
    ));
    prompt.push_str(&format!("{}: <the rewritten sentence>\n\n", REWRITTEN_LABEL));

    prompt.push_str(&format!("Sentence: \"{}\"\n", sentence));

    prompt
}
