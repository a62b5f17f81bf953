// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Artifact dedup field: a short content hash of submitted code, never the
//! code itself.

use sha2::{Digest, Sha256};

pub fn short_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(&hasher.finalize()[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_hashes_identically() {
        assert_eq!(short_hash("def f(): pass"), short_hash("def f(): pass"));
    }

    #[test]
    fn different_content_hashes_differently() {
        assert_ne!(short_hash("a"), short_hash("b"));
    }

    #[test]
    fn hash_is_short_hex() {
        assert_eq!(short_hash("anything").len(), 16);
    }
}
