// Structured outline codec
//
// Outlines travel as plain text: each section is a numbered title and a
// description, every part followed by a `====` delimiter line. Decoding is
// lenient; output that does not fit the grammar yields fewer sections, never
// an error.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::ContentBlock;

pub const DELIMITER: &str = "====";

static TITLE_PATTERN: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^(\d+)\.\s*(.+)$"));

/// Grammar the model is told to answer in.
pub fn grammar_instructions(section_hint: &str) -> String {
    format!(
        "Respond with {section_hint} sections and nothing else. Format every section exactly like this:\n\
         \n\
         <number>. <section title>\n\
         {DELIMITER}\n\
         <one or two sentences describing what the section covers>\n\
         {DELIMITER}\n\
         \n\
         Number the sections 1, 2, 3 and so on, in reading order. Put the title on a single line \
         and the description on the lines after it. Every title and every description must be \
         followed by a line containing only {DELIMITER}. Do not use markdown headings, bullets \
         or any text outside this format."
    )
}

/// Decode a model response into outline sections.
///
/// Segments are taken in title/description pairs; a pair whose title is not
/// `<digits>. <title>` is dropped. Section ids are the numbers the model
/// wrote, and a repeated id replaces the earlier section in place.
pub fn decode(raw: &str) -> Vec<ContentBlock> {
    let pattern = match TITLE_PATTERN.as_ref() {
        Ok(pattern) => pattern,
        Err(e) => {
            tracing::error!("Outline title pattern failed to compile: {}", e);
            return Vec::new();
        }
    };

    let segments: Vec<&str> = raw
        .split(DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let mut blocks: Vec<ContentBlock> = Vec::new();
    let mut skipped = 0usize;

    for pair in segments.chunks(2) {
        let [title_line, description] = pair else {
            // Trailing title without a description
            skipped += 1;
            continue;
        };

        let Some(captures) = pattern.captures(title_line) else {
            skipped += 1;
            continue;
        };
        let Ok(id) = captures[1].parse::<u32>() else {
            skipped += 1;
            continue;
        };

        let block = ContentBlock::new(id, captures[2].trim(), *description);
        match blocks.iter_mut().find(|b| b.id == id) {
            Some(existing) => {
                tracing::warn!("Outline section id {} repeated; keeping the later one", id);
                *existing = block;
            }
            None => blocks.push(block),
        }
    }

    if skipped > 0 {
        tracing::warn!(
            "Skipped {} outline segment(s) that did not match the section grammar",
            skipped
        );
    }
    blocks
}

/// Render sections in the grammar `decode` accepts.
pub fn encode(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .map(|b| {
            format!(
                "{}. {}\n{DELIMITER}\n{}\n{DELIMITER}\n",
                b.id,
                b.title.trim(),
                b.description.trim()
            )
        })
        .collect()
}

/// Human-readable numbered listing, used as document context in prompts.
pub fn render_listing(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .map(|b| format!("{}. {}: {}", b.id, b.title, b.description))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(blocks: &[ContentBlock]) -> Vec<(u32, &str, &str)> {
        blocks
            .iter()
            .map(|b| (b.id, b.title.as_str(), b.description.as_str()))
            .collect()
    }

    #[test]
    fn test_decode_well_formed_outline() {
        let raw = "1. Intro\n====\nSet the stage\n====\n2. Body\n====\nMain content\n====";
        let blocks = decode(raw);
        assert_eq!(
            summary(&blocks),
            vec![(1, "Intro", "Set the stage"), (2, "Body", "Main content")]
        );
        assert!(blocks.iter().all(|b| b.content.is_empty() && b.comments.is_empty()));
    }

    #[test]
    fn test_unnumbered_pair_is_skipped() {
        assert!(decode("Not numbered\n====\nSome text\n====").is_empty());

        let raw = "Preamble\n====\nignored\n====\n3. Results\n====\nWhat we found\n====";
        assert_eq!(summary(&decode(raw)), vec![(3, "Results", "What we found")]);
    }

    #[test]
    fn test_whitespace_and_empty_segments() {
        let raw = "\n====\n  1.Overview  \n====\n\n  A short tour.  \n====\n\n====\n";
        assert_eq!(summary(&decode(raw)), vec![(1, "Overview", "A short tour.")]);
        assert!(decode("").is_empty());
        assert!(decode("====\n====").is_empty());
    }

    #[test]
    fn test_dangling_title_is_dropped() {
        let raw = "1. Only\n====\nDesc\n====\n2. Orphan\n====";
        assert_eq!(summary(&decode(raw)), vec![(1, "Only", "Desc")]);
    }

    #[test]
    fn test_repeated_id_keeps_later_section_in_place() {
        let raw = "1. First\n====\nA\n====\n2. Second\n====\nB\n====\n1. Replacement\n====\nC\n====";
        assert_eq!(
            summary(&decode(raw)),
            vec![(1, "Replacement", "C"), (2, "Second", "B")]
        );
    }

    #[test]
    fn test_multiline_description_is_kept_verbatim() {
        let raw = "1. Setup\n====\nInstall the tools.\nThen configure them.\n====";
        assert_eq!(decode(raw)[0].description, "Install the tools.\nThen configure them.");
    }

    #[test]
    fn test_encode_then_decode_recovers_sections() {
        let blocks = vec![
            ContentBlock::new(1, "Why it matters", "Motivation for the reader"),
            ContentBlock::new(2, "How it works", "Mechanics, step by step"),
            ContentBlock::new(7, "Wrap-up", "Key takeaways"),
        ];
        let decoded = decode(&encode(&blocks));
        assert_eq!(summary(&decoded), summary(&blocks));
    }

    #[test]
    fn test_grammar_mentions_delimiter() {
        let text = grammar_instructions("5 to 7");
        assert!(text.contains("5 to 7"));
        assert!(text.contains(DELIMITER));
    }
}
