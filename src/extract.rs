/// Merging selected archive entries into one prompt-ready text document.
///
/// Partial-failure policy is per-file: a missing entry becomes an inline
/// placeholder block instead of failing the batch.

/// Placeholder body emitted for a requested path with no matching entry.
pub const MISSING_MARKER: &str = "File not found in the ZIP archive.";

/// Comment syntax families used by the summarize pass.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CommentStyle {
    /// `//` line comments and `/* */` blocks (scripts and most languages)
    Script,
    /// `<!-- -->` blocks (HTML, XML)
    Markup,
    /// `/* */` blocks only (stylesheets)
    Style,
}

fn comment_style(path: &str) -> CommentStyle {
    let ext = path.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "html" | "xml" => CommentStyle::Markup,
        "css" => CommentStyle::Style,
        _ => CommentStyle::Script,
    }
}

/// Merge the requested files into one document, in input order.
///
/// `lookup` resolves a path to its decoded entry text, returning None when
/// the archive has no such entry. Each present file becomes a
/// `// <path>` labeled block; `.json` entries are re-serialized
/// pretty-printed (parse failure keeps the original text); `summarize`
/// strips comments and compacts whitespace.
pub fn merge_files<F>(files: &[String], summarize: bool, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    files
        .iter()
        .map(|file| match lookup(file) {
            None => format!("// {}\n{}", file, MISSING_MARKER),
            Some(content) => {
                let mut content = content;
                if file.ends_with(".json") {
                    content = pretty_print_json(&content);
                }
                if summarize {
                    content = summarize_code(&content, file);
                }
                format!("// {}\n{}", file, content)
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Re-serialize JSON pretty-printed; parse failure is swallowed and the
/// original text kept.
fn pretty_print_json(content: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| content.to_string()),
        Err(_) => content.to_string(),
    }
}

/// Strip comments and compact blank runs according to the per-extension
/// table. Any failure mode degrades to the unmodified content, never an
/// error.
pub fn summarize_code(content: &str, path: &str) -> String {
    let stripped = match comment_style(path) {
        CommentStyle::Script => strip_script_comments(content),
        CommentStyle::Markup => strip_delimited(content, "<!--", "-->"),
        CommentStyle::Style => strip_delimited(content, "/*", "*/"),
    };
    compact_whitespace(&stripped)
}

/// Remove `//` line comments and `/* */` blocks, leaving string and
/// template literals intact.
fn strip_script_comments(content: &str) -> String {
    let bytes = content.as_bytes();
    let mut out = String::with_capacity(content.len());
    let mut i = 0;
    let mut in_string: Option<u8> = None;

    while i < bytes.len() {
        let c = bytes[i];

        if let Some(quote) = in_string {
            if c == b'\\' && i + 1 < bytes.len() {
                let esc_len = utf8_len(bytes[i + 1]);
                out.push_str(&content[i..i + 1 + esc_len]);
                i += 1 + esc_len;
                continue;
            }
            let ch_len = utf8_len(c);
            out.push_str(&content[i..i + ch_len]);
            if c == quote {
                in_string = None;
            }
            i += ch_len;
            continue;
        }

        match c {
            b'"' | b'\'' | b'`' => {
                in_string = Some(c);
                out.push(c as char);
                i += 1;
            }
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
            }
            _ => {
                // Multibyte sequences pass through untouched
                let ch_len = utf8_len(c);
                out.push_str(&content[i..i + ch_len]);
                i += ch_len;
            }
        }
    }

    out
}

fn utf8_len(first_byte: u8) -> usize {
    match first_byte {
        b if b < 0x80 => 1,
        b if b >= 0xF0 => 4,
        b if b >= 0xE0 => 3,
        _ => 2,
    }
}

/// Remove `open ... close` delimited blocks (markup and style comments).
fn strip_delimited(content: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(start) = rest.find(open) {
        out.push_str(&rest[..start]);
        match rest[start + open.len()..].find(close) {
            Some(end) => {
                rest = &rest[start + open.len() + end + close.len()..];
            }
            None => {
                // Unterminated comment: drop the remainder
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Trim trailing whitespace and collapse runs of blank lines.
fn compact_whitespace(content: &str) -> String {
    let mut out = Vec::new();
    let mut blank_run = 0;
    for line in content.lines() {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(trimmed.to_string());
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn archive(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_file_gets_placeholder_block() {
        let entries = archive(&[("a.js", "console.log('hi');")]);
        let files = vec!["a.js".to_string(), "missing.js".to_string()];

        let merged = merge_files(&files, false, |p| entries.get(p).cloned());

        let blocks: Vec<&str> = merged.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("// a.js\n"));
        assert!(blocks[0].contains("console.log"));
        assert!(blocks[1].contains("missing.js"));
        assert!(blocks[1].contains(MISSING_MARKER));
    }

    #[test]
    fn test_blocks_follow_input_order() {
        let entries = archive(&[("a.txt", "A"), ("b.txt", "B")]);
        let files = vec!["b.txt".to_string(), "a.txt".to_string()];
        let merged = merge_files(&files, false, |p| entries.get(p).cloned());
        assert!(merged.find("// b.txt").unwrap() < merged.find("// a.txt").unwrap());
    }

    #[test]
    fn test_json_pretty_printed() {
        let entries = archive(&[("pkg/package.json", r#"{"name":"x","version":"1.0"}"#)]);
        let files = vec!["pkg/package.json".to_string()];
        let merged = merge_files(&files, false, |p| entries.get(p).cloned());
        assert!(merged.contains("\"name\": \"x\""));
    }

    #[test]
    fn test_invalid_json_kept_verbatim() {
        let entries = archive(&[("broken.json", "{not json")]);
        let files = vec!["broken.json".to_string()];
        let merged = merge_files(&files, false, |p| entries.get(p).cloned());
        assert!(merged.contains("{not json"));
    }

    #[test]
    fn test_strip_script_comments() {
        let src = "let a = 1; // trailing\n/* block\ncomment */\nlet b = \"// not a comment\";\n";
        let out = strip_script_comments(src);
        assert!(out.contains("let a = 1;"));
        assert!(!out.contains("trailing"));
        assert!(!out.contains("block"));
        assert!(out.contains("\"// not a comment\""));
    }

    #[test]
    fn test_summarize_markup() {
        let out = summarize_code("<div><!-- note --><p>x</p></div>", "page.html");
        assert_eq!(out, "<div><p>x</p></div>");
    }

    #[test]
    fn test_summarize_style() {
        let out = summarize_code(".a { color: red; } /* note */", "main.css");
        assert_eq!(out, ".a { color: red; }");
    }

    #[test]
    fn test_summarize_collapses_blank_runs() {
        let src = "a\n\n\n\nb\n";
        let out = summarize_code(src, "x.py");
        assert_eq!(out, "a\n\nb");
    }
}
