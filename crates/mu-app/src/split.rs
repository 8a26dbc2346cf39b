use mu_github::MAX_COMMENT_LEN;

/// Headroom kept under the platform comment limit so close/reopen
/// scaffolding and continuation notices always fit.
const SPLIT_MARGIN: usize = 5536;

pub(crate) fn split_message(message: &str) -> Vec<String> {
    split_message_with_limit(message, MAX_COMMENT_LEN - SPLIT_MARGIN)
}

/// Splits a rendered comment into postable chunks, closing any open
/// `<details>` block or code fence at a boundary and reopening it in the
/// next chunk. A `> [!WARNING]` block only re-emits its marker line; the
/// quoted lines that follow are not treated as part of the structure.
fn split_message_with_limit(message: &str, limit: usize) -> Vec<String> {
    const START_DETAILS: &str = "<details>";
    const END_DETAILS: &str = "</details>";
    const START_SUMMARY: &str = "<summary>";
    const END_SUMMARY: &str = "</summary>";
    const CODE_BLOCK: &str = "```";
    const WARNING: &str = "> [!WARNING]";

    let mut chunks = Vec::new();
    let mut chunk = String::new();
    let mut count = 0_usize;
    let mut in_details = false;
    let mut in_code_block = false;
    let mut in_warning = false;
    let mut in_diff = false;
    let mut summary_title = String::new();
    let mut code_block_indent = String::new();

    let open_summary = format!("{START_DETAILS}{START_SUMMARY}");
    for line in message.lines() {
        if let Some(rest) = line.strip_prefix(open_summary.as_str()) {
            in_details = true;
            summary_title = rest
                .find(END_SUMMARY)
                .map(|idx| rest[..idx].to_string())
                .unwrap_or_else(|| rest.to_string());
        } else if line.starts_with(END_DETAILS) {
            in_details = false;
        } else if line.contains(CODE_BLOCK) && !in_code_block {
            in_code_block = true;
            let idx = line.find(CODE_BLOCK).unwrap_or(0);
            code_block_indent = line[..idx].to_string();
            in_diff = line.contains("```diff");
        } else if line.contains(CODE_BLOCK) && in_code_block {
            in_code_block = false;
            in_diff = false;
        } else if !in_warning && line.starts_with(WARNING) {
            in_warning = true;
        }

        if count + line.len() + 1 > limit {
            if in_code_block {
                chunk.push_str(&code_block_indent);
                chunk.push_str("```\n\n");
            }
            if in_details {
                chunk.push_str("</details>\n");
            }
            chunk.push_str("\n**Warning** Continued in next comment.\n");
            chunks.push(std::mem::take(&mut chunk));
            count = 0;
            chunk.push_str("Continued from previous comment.\n\n");
            if in_details {
                chunk.push_str(&format!("<details><summary>{summary_title}</summary>\n\n"));
            }
            if in_code_block {
                chunk.push_str(&code_block_indent);
                chunk.push_str(CODE_BLOCK);
                if in_diff {
                    chunk.push_str("diff");
                }
                chunk.push('\n');
            }
            if in_warning {
                chunk.push_str(WARNING);
                chunk.push('\n');
            }
        }
        chunk.push_str(line);
        chunk.push('\n');
        count += line.len() + 1;
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use mu_github::MAX_COMMENT_LEN;

    use super::{split_message, split_message_with_limit};

    #[test]
    fn unit_short_messages_stay_whole() {
        let chunks = split_message("one line\nanother line");
        assert_eq!(chunks, vec!["one line\nanother line\n".to_string()]);
    }

    #[test]
    fn functional_code_fences_inside_details_close_and_reopen_across_chunks() {
        let mut message = String::from("<details><summary>Show Output</summary>\n\n```diff\n");
        for index in 0..20 {
            message.push_str(&format!("+ resource line number {index}\n"));
        }
        message.push_str("```\n</details>\n");

        let chunks = split_message_with_limit(&message, 200);
        assert!(chunks.len() > 1, "expected a split, got {chunks:?}");
        let first = &chunks[0];
        assert!(first.ends_with("```\n\n</details>\n\n**Warning** Continued in next comment.\n"));
        let second = &chunks[1];
        assert!(second.starts_with(
            "Continued from previous comment.\n\n<details><summary>Show Output</summary>\n\n```diff\n"
        ));
    }

    #[test]
    fn functional_every_chunk_fits_in_a_single_comment() {
        let mut message = String::from("```\n");
        for index in 0..4000 {
            message.push_str(&format!("aws_instance.web[{index}]: line of plan output\n"));
        }
        message.push_str("```\n");
        let chunks = split_message(&message);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= MAX_COMMENT_LEN, "chunk overflows: {}", chunk.len());
        }
    }

    #[test]
    fn regression_warning_blocks_reemit_only_the_marker_line() {
        let mut message = String::from("> [!WARNING]\n");
        for index in 0..30 {
            message.push_str(&format!("> warning detail line {index}\n"));
        }
        let chunks = split_message_with_limit(&message, 200);
        assert!(chunks.len() > 1);
        let second = &chunks[1];
        assert!(second.starts_with("Continued from previous comment.\n\n> [!WARNING]\n"));
        // The marker is carried, the quoted block itself is not replayed.
        assert_eq!(second.matches("> [!WARNING]").count(), 1);
    }

    #[test]
    fn unit_indented_fences_keep_their_indentation_when_reopened() {
        let mut message = String::from("  ```\n");
        for index in 0..20 {
            message.push_str(&format!("  fenced content {index}\n"));
        }
        message.push_str("  ```\n");
        let chunks = split_message_with_limit(&message, 120);
        assert!(chunks.len() > 1);
        assert!(chunks[0].contains("  ```\n\n\n**Warning** Continued in next comment.\n"));
        assert!(chunks[1].starts_with("Continued from previous comment.\n\n  ```\n"));
    }
}
