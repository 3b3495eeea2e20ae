// Prompt assembly for agent operations
//
// Every prompt follows the same layout: persona, style and tone, the task,
// document context, then reference material the model must not copy.

use super::config::AgentConfig;
use super::TextTask;
use crate::document::{ContentBlock, DocumentBrief};
use crate::outline;

const SECTION_COUNT_HINT: &str = "between 4 and 8";

fn persona(agent: &AgentConfig) -> String {
    let mut out = format!("{}\n", agent.system_prompt.trim());
    if !agent.expertise.is_empty() {
        out.push_str(&format!("Your areas of expertise: {}.\n", agent.expertise.join(", ")));
    }
    out.push_str(&format!(
        "\nStyle: {}\nTone: {}\n",
        agent.style_instruction(),
        agent.tone_instruction()
    ));
    out
}

fn brief_context(brief: &DocumentBrief) -> String {
    format!(
        "Content type: {}\nMain idea: {}\nTarget audience: {}\n",
        brief.content_type, brief.idea, brief.target_audience
    )
}

fn reference(knowledge: &str) -> String {
    if knowledge.trim().is_empty() {
        return String::new();
    }
    format!(
        "\nReference information (use it to inform the writing, do not copy it directly):\n{}\n",
        knowledge.trim()
    )
}

/// Neighbouring sections of `block` in `outline`, for continuity.
fn neighbours(outline: &[ContentBlock], block: &ContentBlock) -> String {
    let Some(pos) = outline.iter().position(|b| b.id == block.id) else {
        return String::new();
    };
    let mut out = String::new();
    if let Some(prev) = pos.checked_sub(1).and_then(|i| outline.get(i)) {
        out.push_str(&format!("Previous section: {}. {}\n", prev.title, prev.description));
    }
    if let Some(next) = outline.get(pos + 1) {
        out.push_str(&format!("Next section: {}. {}\n", next.title, next.description));
    }
    out
}

fn section_context(brief: &DocumentBrief, outline: &[ContentBlock], block: &ContentBlock) -> String {
    format!(
        "{}\nDocument outline:\n{}\n\n{}\nSection to write:\nTitle: {}\nPurpose: {}\n",
        brief_context(brief),
        outline::render_listing(outline),
        neighbours(outline, block),
        block.title,
        block.description
    )
}

pub fn structured_blocks(
    agent: &AgentConfig,
    brief: &DocumentBrief,
    extra_context: Option<&str>,
    knowledge: &str,
) -> String {
    let mut prompt = persona(agent);
    prompt.push_str(&format!(
        "\nTask: plan the structure of a {} as an outline of sections.\n\n{}",
        brief.content_type,
        brief_context(brief)
    ));
    if let Some(extra) = extra_context.filter(|e| !e.trim().is_empty()) {
        prompt.push_str(&format!("Additional context: {}\n", extra.trim()));
    }
    prompt.push_str(&reference(knowledge));
    prompt.push('\n');
    prompt.push_str(&outline::grammar_instructions(SECTION_COUNT_HINT));
    prompt
}

pub fn expand(
    agent: &AgentConfig,
    brief: &DocumentBrief,
    outline: &[ContentBlock],
    block: &ContentBlock,
    knowledge: &str,
) -> String {
    let mut prompt = persona(agent);
    prompt.push_str("\nTask: write the full text of one section of the document.\n\n");
    prompt.push_str(&section_context(brief, outline, block));
    prompt.push_str(&reference(knowledge));
    prompt.push_str(
        "\nWrite only this section. Do not repeat the section title, do not write other \
         sections and do not add commentary about the text.",
    );
    prompt
}

pub fn rewrite(
    agent: &AgentConfig,
    brief: &DocumentBrief,
    outline: &[ContentBlock],
    block: &ContentBlock,
    current_content: &str,
    feedback: &str,
    knowledge: &str,
) -> String {
    let mut prompt = persona(agent);
    prompt.push_str("\nTask: rewrite one section of the document based on reviewer feedback.\n\n");
    prompt.push_str(&section_context(brief, outline, block));
    prompt.push_str(&format!(
        "\nReviewer feedback (HIGHEST PRIORITY, every point must be addressed):\n{}\n",
        feedback.trim()
    ));
    prompt.push_str(&format!(
        "\nCurrent version of the section (reference only; keep what does not conflict with \
         the feedback, but write a complete new version rather than patching it):\n{}\n",
        current_content.trim()
    ));
    prompt.push_str(&reference(knowledge));
    prompt.push_str(
        "\nReturn the complete rewritten section only, without the title and without \
         commentary about the changes.",
    );
    prompt
}

pub fn review(
    agent: &AgentConfig,
    brief: &DocumentBrief,
    block: &ContentBlock,
    instructions: Option<&str>,
    knowledge: &str,
) -> String {
    let mut prompt = persona(agent);
    prompt.push_str("\nTask: review one section of the document.\n\n");
    prompt.push_str(&brief_context(brief));
    prompt.push_str(&format!(
        "\nSection title: {}\nSection purpose: {}\nSection text:\n{}\n",
        block.title,
        block.description,
        block.content.trim()
    ));
    if let Some(focus) = instructions.filter(|i| !i.trim().is_empty()) {
        prompt.push_str(&format!(
            "\nSpecific focus for this review: {}\nAddress this focus explicitly in your points.\n",
            focus.trim()
        ));
    }
    prompt.push_str(&reference(knowledge));
    prompt.push_str(
        "\nRespond with 3 to 5 bullet points, each starting with \"- \". Keep every point \
         short and actionable. No introduction and no summary.",
    );
    prompt
}

pub fn text_task(agent: &AgentConfig, task: TextTask, text: &str, instructions: Option<&str>) -> String {
    let mut prompt = persona(agent);
    prompt.push_str(&format!("\nTask: {}\n", task.instruction()));
    if let Some(extra) = instructions.filter(|i| !i.trim().is_empty()) {
        prompt.push_str(&format!("Additional instructions: {}\n", extra.trim()));
    }
    prompt.push_str(&format!(
        "\nText:\n{}\n\nRespond with the result only, without any preamble.",
        text
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentRole, Tone, WritingStyle};

    fn writer() -> AgentConfig {
        AgentConfig::new("Ada", AgentRole::ContentWriter, "You are Ada, a travel writer.")
            .with_style(WritingStyle::Storytelling)
            .with_tone(Tone::Enthusiastic)
            .with_expertise(["travel"])
    }

    fn outline() -> Vec<ContentBlock> {
        vec![
            ContentBlock::new(1, "Arrival", "Landing in Lisbon"),
            ContentBlock::new(2, "Food", "Where to eat"),
            ContentBlock::new(3, "Leaving", "Last impressions"),
        ]
    }

    #[test]
    fn test_expand_prompt_carries_section_style_and_neighbours() {
        let blocks = outline();
        let brief = DocumentBrief::new("blog post", "A weekend in Lisbon", "first-time visitors");
        let prompt = expand(&writer(), &brief, &blocks, &blocks[1], "Pastéis de nata cost 1.20");

        assert!(prompt.contains("Title: Food"));
        assert!(prompt.contains("Purpose: Where to eat"));
        assert!(prompt.contains(WritingStyle::Storytelling.instruction(AgentRole::ContentWriter)));
        assert!(prompt.contains(Tone::Enthusiastic.instruction()));
        assert!(prompt.contains("Previous section: Arrival"));
        assert!(prompt.contains("Next section: Leaving"));
        assert!(prompt.contains("do not copy it directly"));
        assert!(prompt.contains("first-time visitors"));
    }

    #[test]
    fn test_no_reference_block_without_knowledge() {
        let blocks = outline();
        let brief = DocumentBrief::default();
        let prompt = expand(&writer(), &brief, &blocks, &blocks[0], "  ");
        assert!(!prompt.contains("Reference information"));
        assert!(!prompt.contains("Previous section"));
    }

    #[test]
    fn test_rewrite_prioritizes_feedback() {
        let blocks = outline();
        let prompt = rewrite(
            &writer(),
            &DocumentBrief::default(),
            &blocks,
            &blocks[0],
            "Old text",
            "- Mention the tram",
            "",
        );
        assert!(prompt.contains("HIGHEST PRIORITY"));
        assert!(prompt.contains("- Mention the tram"));
        assert!(prompt.contains("Old text"));
    }

    #[test]
    fn test_review_focus_is_explicit() {
        let reviewer = AgentConfig::new("Rex", AgentRole::ContentReviewer, "You edit.")
            .with_style(WritingStyle::Critical);
        let prompt = review(
            &reviewer,
            &DocumentBrief::default(),
            &outline()[0],
            Some("factual accuracy"),
            "",
        );
        assert!(prompt.contains("Specific focus for this review: factual accuracy"));
        assert!(prompt.contains(WritingStyle::Critical.instruction(AgentRole::ContentReviewer)));
        assert!(prompt.contains("3 to 5 bullet points"));
    }

    #[test]
    fn test_outline_prompt_embeds_grammar() {
        let brief = DocumentBrief::new("guide", "Home composting", "apartment dwellers");
        let prompt = structured_blocks(&writer(), &brief, Some("Keep it short"), "");
        assert!(prompt.contains(outline::DELIMITER));
        assert!(prompt.contains("Additional context: Keep it short"));
        assert!(prompt.contains("Home composting"));
    }
}
