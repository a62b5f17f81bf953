// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Deterministic success-criteria evaluation against the sandbox
//! filesystem or command output. Never looks at the model's chat
//! response — only at observable sandbox state.

use meter_sandbox::{ExecOptions, SandboxManager};
use meter_tasks::SuccessCriteria;

pub async fn check(sandbox: &SandboxManager, sandbox_id: &str, criteria: &SuccessCriteria) -> bool {
    match criteria {
        SuccessCriteria::FileExists { path } => sandbox.read_file(sandbox_id, path).await.is_ok(),
        SuccessCriteria::FileContent { path, expected_content, contains_text } => {
            let Ok(actual) = sandbox.read_file(sandbox_id, path).await else {
                return false;
            };
            let trimmed = actual.trim();
            if let Some(expected) = expected_content {
                if trimmed != expected.trim() {
                    return false;
                }
            }
            contains_text.iter().all(|needle| actual.contains(needle))
        }
        SuccessCriteria::CommandOutput { command, expected_in_output } => {
            let Ok(result) = sandbox.exec(sandbox_id, command, ExecOptions::default()).await else {
                return false;
            };
            if !result.success() {
                return false;
            }
            expected_in_output.iter().all(|needle| result.stdout.contains(needle))
        }
        SuccessCriteria::MultiCriteria { criteria, require_all } => {
            let mut results = Vec::with_capacity(criteria.len());
            for c in criteria {
                results.push(Box::pin(check(sandbox, sandbox_id, c)).await);
            }
            if *require_all {
                results.iter().all(|r| *r)
            } else {
                results.iter().any(|r| *r)
            }
        }
    }
}
