// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

use meter_sandbox::SandboxConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One `(inputExpression, expectedExpression)` pair in the target
/// interpreter's literal syntax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub input_expression: String,
    pub expected_expression: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected: impl Into<String>) -> Self {
        Self { input_expression: input.into(), expected_expression: expected.into() }
    }
}

/// A code-generation task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeTask {
    pub slug: String,
    pub language: String,
    pub difficulty: Difficulty,
    pub prompt: String,
    pub expected_symbol: String,
    pub max_tokens: u32,
    pub test_cases: Vec<TestCase>,
    /// Tasks tagged "debug" get `debugging = correctness` rather than the
    /// usual small bonus.
    pub tags: Vec<String>,
}

impl CodeTask {
    pub fn is_debug_task(&self) -> bool {
        self.tags.iter().any(|t| t == "debug")
    }
}

/// Tagged success-criterion variant for a tool task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SuccessCriteria {
    FileExists {
        path: String,
    },
    FileContent {
        path: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        expected_content: Option<String>,
        #[serde(default)]
        contains_text: Vec<String>,
    },
    CommandOutput {
        command: Vec<String>,
        #[serde(default)]
        expected_in_output: Vec<String>,
    },
    MultiCriteria {
        criteria: Vec<SuccessCriteria>,
        /// Require every sub-criterion (AND) rather than any (OR).
        #[serde(default = "default_true")]
        require_all: bool,
    },
}

fn default_true() -> bool {
    true
}

/// An initial file to seed into the sandbox before the session starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialFile {
    pub path: String,
    pub content: String,
}

/// A tool-calling task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolTask {
    pub slug: String,
    pub name: String,
    pub difficulty: Difficulty,
    pub category: String,
    pub system_prompt: String,
    pub initial_message: String,
    #[serde(default)]
    pub initial_files: Vec<InitialFile>,
    pub success_criteria: SuccessCriteria,
    pub max_turns: u32,
    pub timeout_ms: u64,
    pub sandbox_config: SandboxConfig,
    pub expected_tools: Vec<String>,
}
