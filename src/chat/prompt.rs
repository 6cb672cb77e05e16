//! Message-list assembly and the smart-chat heuristics.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use super::client::{ChatMessage, ContentPart, MessageContent};
use super::history::StoredMessage;

/// System instruction for plain chat.
pub const BASE_SYSTEM_PROMPT: &str = "You are Codeprompt AI assistant. You help analyze, explain, \
and improve code. Be concise and precise. Use markdown formatting.";

/// System instruction for smart chat, embedding the current file-tree text.
pub fn smart_system_prompt(tree_text: &str, available_files: &[String]) -> String {
    let shown = available_files.len().min(100);
    let file_list = available_files[..shown].join(", ");
    let more = if available_files.len() > shown {
        format!("... and {} more files", available_files.len() - shown)
    } else {
        String::new()
    };

    format!(
        "You are Codeprompt Smart AI Assistant - an intelligent code analysis assistant with deep \
understanding of project structures.\n\n\
## Project File Tree\n\
```\n{tree_text}```\n\n\
## Available Files in Project\n\
{file_list}{more}\n\n\
## How to Request Files\n\
When you need to see a file, just mention it naturally:\n\
- \"Let me read package.json\"\n\
- \"I'll check the main.js file\"\n\
The file will be fetched and added to your context.\n\n\
## Response Style\n\
- Be concise but thorough\n\
- Use markdown formatting\n\
- When explaining code, use code blocks with syntax highlighting\n\
- If a file is not in your context yet, request it naturally"
    )
}

/// Build the message list for one completion request:
/// system instruction, optional context turn (tagged for prompt caching)
/// plus a synthetic assistant acknowledgement, prior history with
/// system-role entries filtered out, then the new user message.
pub fn assemble_messages(
    system_prompt: &str,
    context_files: Option<&str>,
    enable_cache: bool,
    history: &[StoredMessage],
    message: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 4);

    messages.push(ChatMessage::text("system", system_prompt));

    if let Some(context) = context_files {
        let text = format!("Project files for context:\n\n{}", context);
        let content = if enable_cache {
            MessageContent::Parts(vec![ContentPart::cached_text(text)])
        } else {
            MessageContent::Text(text)
        };
        messages.push(ChatMessage {
            role: "user".to_string(),
            content,
        });
        messages.push(ChatMessage::text(
            "assistant",
            "I have the project files. What would you like to know?",
        ));
    }

    // System entries in stored history would duplicate the instruction
    for turn in history.iter().filter(|m| m.role != "system") {
        messages.push(ChatMessage::text(&turn.role, turn.content.clone()));
    }

    messages.push(ChatMessage::text("user", message));
    messages
}

fn mention_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)(?:read|fetch|load|check|examine|analyze)\s+([^\s]+\.(?:js|ts|jsx|tsx|py|go|java|rb|php|css|html|json|md|txt|yaml|yml|toml|xml))",
            r"(?i)file:\s*([^\s]+)",
            r"(?i)`([^`]+\.(?:js|ts|jsx|tsx|py|go|java|rb|php|css|html|json|md|txt|yaml|yml|toml|xml))`",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("Invalid mention pattern"))
        .collect()
    })
}

/// Scan an assistant reply for file mentions worth auto-fetching.
///
/// Heuristic by design: a match counts only when the path exists in the
/// project and is not already in context (set membership, no confidence
/// scoring). Order follows first mention.
pub fn detect_file_mentions(
    reply: &str,
    available: &[String],
    in_context: &HashSet<String>,
) -> Vec<String> {
    let available: HashSet<&str> = available.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut mentions = Vec::new();

    for pattern in mention_patterns() {
        for cap in pattern.captures_iter(reply) {
            let Some(path) = cap.get(1).map(|m| m.as_str()) else {
                continue;
            };
            if available.contains(path) && !in_context.contains(path) && seen.insert(path) {
                mentions.push(path.to_string());
            }
        }
    }

    mentions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(role: &str, content: &str) -> StoredMessage {
        StoredMessage {
            role: role.to_string(),
            content: content.to_string(),
            model: None,
        }
    }

    #[test]
    fn test_assemble_plain() {
        let messages = assemble_messages(BASE_SYSTEM_PROMPT, None, false, &[], "hi");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
    }

    #[test]
    fn test_assemble_with_context_and_cache() {
        let messages =
            assemble_messages(BASE_SYSTEM_PROMPT, Some("// a.js\ncode"), true, &[], "what?");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].role, "user");
        match &messages[1].content {
            MessageContent::Parts(parts) => {
                assert!(parts[0].text.starts_with("Project files for context:"));
                assert!(parts[0].cache_control.is_some());
            }
            other => panic!("expected parts, got {:?}", other),
        }
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[3].role, "user");
    }

    #[test]
    fn test_assemble_without_cache_uses_plain_text() {
        let messages =
            assemble_messages(BASE_SYSTEM_PROMPT, Some("ctx"), false, &[], "q");
        match &messages[1].content {
            MessageContent::Text(text) => assert!(text.contains("ctx")),
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_history_system_roles_filtered() {
        let history = vec![
            stored("system", "old instruction"),
            stored("user", "earlier question"),
            stored("assistant", "earlier answer"),
        ];
        let messages = assemble_messages(BASE_SYSTEM_PROMPT, None, false, &history, "next");
        let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    }

    #[test]
    fn test_smart_prompt_embeds_tree() {
        let tree = "├── src/\n│   └── main.rs\n└── README.md\n";
        let prompt = smart_system_prompt(tree, &["src/main.rs".into(), "README.md".into()]);
        assert!(prompt.contains("main.rs"));
        assert!(prompt.contains("Smart AI Assistant"));
        assert!(prompt.contains("src/main.rs, README.md"));
    }

    #[test]
    fn test_detect_mentions_filters_unknown_and_in_context() {
        let available = vec!["src/app.js".to_string(), "package.json".to_string()];
        let mut in_context = HashSet::new();
        in_context.insert("package.json".to_string());

        let reply = "Let me read src/app.js and also check package.json plus ghost.js.";
        let mentions = detect_file_mentions(reply, &available, &in_context);
        assert_eq!(mentions, vec!["src/app.js"]);
    }

    #[test]
    fn test_detect_mentions_backtick_pattern() {
        let available = vec!["lib/util.py".to_string()];
        let mentions = detect_file_mentions(
            "The bug is in `lib/util.py` near the top.",
            &available,
            &HashSet::new(),
        );
        assert_eq!(mentions, vec!["lib/util.py"]);
    }

    #[test]
    fn test_detect_mentions_dedups() {
        let available = vec!["a.js".to_string()];
        let mentions = detect_file_mentions(
            "Check a.js. Then read a.js again: `a.js`.",
            &available,
            &HashSet::new(),
        );
        assert_eq!(mentions, vec!["a.js"]);
    }
}
