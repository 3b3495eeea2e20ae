// Reasoning-block extraction
//
// Some models (DeepSeek-R1 and its distills served through Ollama) prefix the
// answer with a deliberation block delimited by <think> ... </think>.

pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";

/// Split raw model output into `(reasoning, content)`.
///
/// Only when both tags are present (close after open) is the text between
/// them the reasoning and the text after the close tag the content; both are
/// stripped of newline and tab characters. Otherwise the whole text is
/// content, returned unchanged, and reasoning is empty.
pub fn split_reasoning(raw: &str) -> (String, String) {
    let Some(open) = raw.find(THINK_OPEN) else {
        return (String::new(), raw.to_string());
    };
    let inner_start = open + THINK_OPEN.len();
    let Some(close_offset) = raw[inner_start..].find(THINK_CLOSE) else {
        return (String::new(), raw.to_string());
    };
    let close = inner_start + close_offset;

    let reasoning = strip_control(&raw[inner_start..close]);
    let content = strip_control(&raw[close + THINK_CLOSE.len()..]);
    (reasoning, content)
}

fn strip_control(text: &str) -> String {
    text.chars().filter(|c| *c != '\n' && *c != '\t').collect()
}
