use regex::Regex;
use std::sync::OnceLock;

/// Pattern set for "suggested selection": manifests across ecosystems,
/// build descriptors, Dockerfiles, READMEs (case-insensitive), conventional
/// entrypoints and config files. Matching is case-sensitive otherwise.
fn important_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"package\.json$",
            r"composer\.json$",
            r"requirements\.txt$",
            r"Gemfile$",
            r"Cargo\.toml$",
            r"pom\.xml$",
            r"build\.gradle$",
            r"\.gitignore$",
            r"docker-compose\.yml$",
            r"Dockerfile$",
            r"(?i)README\.md$",
            r"^(main|index|app)\.(js|ts|py|java|go|rb|php)$",
            r"server\.(js|ts)$",
            r"config\.(js|json|yaml|yml)$",
            r"deno\.json$",
            r"mod\.ts$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("Invalid important-file pattern"))
        .collect()
    })
}

/// Select the entries whose base name or full path matches the pattern set.
///
/// No ranking — a flat subsequence in the original entry order.
pub fn identify_important_files<S: AsRef<str>>(entries: &[S]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e.as_ref())
        .filter(|entry| {
            let base_name = entry.rsplit('/').next().unwrap_or(entry);
            important_patterns()
                .iter()
                .any(|p| p.is_match(base_name) || p.is_match(entry))
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_at_any_depth() {
        let entries = vec!["deep/nested/dir/package.json", "src/notes.txt"];
        let important = identify_important_files(&entries);
        assert_eq!(important, vec!["deep/nested/dir/package.json"]);
    }

    #[test]
    fn test_plain_text_never_included() {
        let entries = vec!["notes.txt", "docs/notes.txt"];
        assert!(identify_important_files(&entries).is_empty());
    }

    #[test]
    fn test_readme_case_insensitive() {
        let entries = vec!["readme.md", "docs/ReadMe.MD"];
        let important = identify_important_files(&entries);
        assert_eq!(important.len(), 2);
    }

    #[test]
    fn test_entrypoint_only_matches_base_name() {
        // ^main\.py$ anchors to the base name, so nested entrypoints match
        // via the base-name check
        let entries = vec!["src/main.py", "main.go", "domain.js"];
        let important = identify_important_files(&entries);
        assert_eq!(important, vec!["src/main.py", "main.go"]);
    }

    #[test]
    fn test_preserves_entry_order() {
        let entries = vec!["z/Cargo.toml", "a/Dockerfile", "m/README.md"];
        let important = identify_important_files(&entries);
        assert_eq!(important, vec!["z/Cargo.toml", "a/Dockerfile", "m/README.md"]);
    }

    #[test]
    fn test_case_sensitive_outside_readme() {
        let entries = vec!["dockerfile", "cargo.toml"];
        assert!(identify_important_files(&entries).is_empty());
    }
}
