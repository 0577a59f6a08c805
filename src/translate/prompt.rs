use super::language::language_code_to_name;

/// Separator between blocks, both in the prompt and in the expected reply
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Build the single instruction sent for one batch of escaped blocks
pub fn build_batch_prompt(blocks: &[String], source_language: &str, target_language: &str) -> String {
    let source_code = source_language.to_uppercase();
    let target_code = target_language.to_uppercase();
    let source_name = language_code_to_name(source_language);
    let target_name = language_code_to_name(target_language);

    format!(
        "You are a professional song translator from {} ({}) to {} ({}).\n\
         Translate the following song subtitle blocks, keeping the poetic tone and the emotion.\n\
         Each input block may span several lines; internal line breaks are written as \\n.\n\
         Return ONLY the translations. Each translated block MUST be separated from the next one \
         by a DOUBLE LINE BREAK (the newline character twice).\n\
         Keep internal line breaks where they belong, writing them as \\n in your output as well.\n\
         \n\
         SUBTITLE BLOCKS TO TRANSLATE:\n\
         {}",
        source_name,
        source_code,
        target_name,
        target_code,
        blocks.join(BLOCK_SEPARATOR)
    )
}

/// Split raw model output into translated blocks.
///
/// Blocks are separated by a blank line. Fragments that are empty after
/// trimming are kept as empty strings so positions stay aligned with what
/// the model produced; an all-whitespace reply gives no blocks.
pub fn split_reply(raw: &str) -> Vec<String> {
    let normalized = raw.replace("\r\n", "\n");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    trimmed
        .split(BLOCK_SEPARATOR)
        .map(|block| block.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_blocks_and_languages() {
        let blocks = vec!["Hello".to_string(), "Line one\\nLine two".to_string()];
        let prompt = build_batch_prompt(&blocks, "en", "es");

        assert!(prompt.contains("English (EN)"));
        assert!(prompt.contains("Spanish (ES)"));
        assert!(prompt.contains("poetic tone"));
        assert!(prompt.ends_with("Hello\n\nLine one\\nLine two"));
    }

    #[test]
    fn test_split_reply() {
        assert_eq!(split_reply("Hola\n\nAdiós\n"), vec!["Hola", "Adiós"]);
        assert_eq!(split_reply("Uno\\nDos\r\n\r\nTres"), vec!["Uno\\nDos", "Tres"]);
        assert!(split_reply("").is_empty());
        assert!(split_reply(" \n\n ").is_empty());
    }

    #[test]
    fn test_split_reply_keeps_single_line_breaks() {
        // A literal newline inside a block does not start a new block
        assert_eq!(split_reply("Uno\nDos\n\nTres"), vec!["Uno\nDos", "Tres"]);
    }

    #[test]
    fn test_split_reply_extra_blank_lines() {
        assert_eq!(split_reply("A\n\n\n\nB"), vec!["A", "", "B"]);
    }
}
