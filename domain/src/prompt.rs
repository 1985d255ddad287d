use crate::session::ChatMessage;
use shared::utils::truncate_chars;

pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant.";

/// Join retrieved payloads, newline-separated, in rank order.
///
/// With a budget, texts are appended while the total character count stays
/// within it and assembly stops at the first text that does not fit. A first
/// text that alone exceeds the budget is cut to the budget instead of being
/// dropped.
pub fn assemble_context<'a, I>(texts: I, char_budget: Option<usize>) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut context = String::new();
    let mut used = 0usize;

    for (i, text) in texts.into_iter().enumerate() {
        let separator = if i == 0 { 0 } else { 1 };
        let len = text.chars().count();

        if let Some(budget) = char_budget {
            if used + separator + len > budget {
                if i == 0 {
                    context.push_str(truncate_chars(text, budget));
                }
                break;
            }
        }

        if separator == 1 {
            context.push('\n');
        }
        context.push_str(text);
        used += separator + len;
    }

    context
}

pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "User Query: {}\nRelevant Information:\n{}\nProvide a user-friendly response based on the above information with short words.",
        query, context
    )
}

pub fn build_messages(prompt: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::system(SYSTEM_INSTRUCTION), ChatMessage::user(prompt)]
}
