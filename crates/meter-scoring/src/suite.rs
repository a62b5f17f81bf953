// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! The three benchmark suites a run belongs to.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suite {
    /// Code-gen suite, every 20 minutes.
    Hourly,
    /// Code-gen suite, once a day — larger trial count.
    Deep,
    /// Tool-calling suite, once a day.
    Tooling,
}

impl Suite {
    pub fn as_str(self) -> &'static str {
        match self {
            Suite::Hourly => "hourly",
            Suite::Deep => "deep",
            Suite::Tooling => "tooling",
        }
    }
}

impl std::fmt::Display for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
