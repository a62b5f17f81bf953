// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Static task registry: the catalog of code-generation and tool-calling
//! tasks that the engines in `meter-codegen` and `meter-toolbench` run
//! against. Tasks are seeded once and are effectively immutable at
//! runtime.

mod catalog;
mod types;

pub use catalog::{code_task_by_slug, tool_task_by_slug, CODE_TASKS, TOOL_TASKS};
pub use types::{
    CodeTask, Difficulty, InitialFile, SuccessCriteria, TestCase, ToolTask,
};
