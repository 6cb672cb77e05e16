//! The AI bridge: completion client, per-project history log, prompt
//! assembly and the canned analysis/agent prompts.

pub mod client;
pub mod history;
pub mod prompt;

pub use client::{ChatClient, ChatMessage, ChatOutcome, MessageContent, Usage};
pub use history::{ChatHistory, StoredMessage};

use serde::Serialize;

/// System prompt for one-shot project analysis. Unknown kinds fall back to
/// the general analyst.
pub fn analysis_system_prompt(kind: &str) -> &'static str {
    match kind {
        "security" => {
            "You are a security expert. Find vulnerabilities, hard-coded secrets, unsafe \
             practices, OWASP Top 10 issues."
        }
        "performance" => {
            "You are a performance expert. Find bottlenecks, inefficient code, optimization \
             opportunities."
        }
        _ => {
            "You are an expert code analyst. Analyze the project: technologies, architecture, \
             quality, improvements."
        }
    }
}

/// Descriptor for one canned agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
}

pub fn agent_catalog() -> &'static [AgentDescriptor] {
    const AGENTS: &[AgentDescriptor] = &[
        AgentDescriptor {
            id: "security",
            name: "Security Analyzer",
            icon: "shield",
        },
        AgentDescriptor {
            id: "performance",
            name: "Performance Optimizer",
            icon: "zap",
        },
        AgentDescriptor {
            id: "documentation",
            name: "Documentation Generator",
            icon: "book",
        },
        AgentDescriptor {
            id: "refactoring",
            name: "Refactoring Expert",
            icon: "recycle",
        },
        AgentDescriptor {
            id: "testing",
            name: "Testing Agent",
            icon: "flask",
        },
    ];
    AGENTS
}

/// System prompt for a canned agent run. Unknown types fall back to the
/// security agent.
pub fn agent_system_prompt(agent_type: &str) -> &'static str {
    match agent_type {
        "performance" => {
            "You are a performance expert. Find bottlenecks, memory leaks, and suggest \
             optimizations with code examples."
        }
        "documentation" => {
            "You are a technical writer. Generate clear documentation with function \
             descriptions, parameters, and examples."
        }
        "refactoring" => {
            "You are a clean code expert. Suggest refactoring using SOLID principles and design \
             patterns."
        }
        "testing" => {
            "You are a test automation expert. Generate unit tests focusing on edge cases and \
             comprehensive coverage."
        }
        _ => {
            "You are a cybersecurity expert. Identify vulnerabilities and provide fixes. Focus \
             on OWASP Top 10."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_prompt_fallback() {
        assert_eq!(analysis_system_prompt("nope"), analysis_system_prompt("general"));
        assert_ne!(
            analysis_system_prompt("security"),
            analysis_system_prompt("performance")
        );
    }

    #[test]
    fn test_agent_catalog_ids_resolve() {
        for agent in agent_catalog() {
            // Every cataloged agent has a dedicated prompt except security,
            // which is also the fallback
            let prompt = agent_system_prompt(agent.id);
            assert!(!prompt.is_empty());
        }
        assert_eq!(agent_catalog().len(), 5);
    }
}
