// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Read/write safety checks shared by every builtin executor: reject
//! absolute paths outside the sandbox, deny-list sensitive system
//! directories and files, refuse parent-directory traversal, and bound
//! the size of a single read.

const DENIED_PREFIXES: &[&str] = &["/etc", "/proc", "/sys", "/dev"];

const DENIED_FILES: &[&str] = &[
    "/etc/passwd",
    "/etc/shadow",
    "/etc/sudoers",
    "/root/.ssh/id_rsa",
    "/root/.ssh/authorized_keys",
];

pub const MAX_READ_BYTES: usize = 1024 * 1024;

/// `Ok(())` if `path` is safe to read or write inside a sandbox; `Err`
/// carries a human-readable refusal reason.
pub fn check_path(path: &str) -> Result<(), String> {
    if path.contains("..") {
        return Err(format!("refused: path '{path}' contains parent-directory traversal"));
    }
    if DENIED_FILES.contains(&path) {
        return Err(format!("refused: path '{path}' is a denied sensitive file"));
    }
    if path.starts_with('/') {
        for prefix in DENIED_PREFIXES {
            if path == *prefix || path.starts_with(&format!("{prefix}/")) {
                return Err(format!("refused: path '{path}' is under denied prefix '{prefix}'"));
            }
        }
    }
    Ok(())
}

/// `Ok(())` if `content.len()` is within the per-read bound.
pub fn check_read_size(content: &str) -> Result<(), String> {
    if content.len() >= MAX_READ_BYTES {
        return Err(format!(
            "refused: file is {} bytes, exceeds the {}-byte read limit",
            content.len(),
            MAX_READ_BYTES
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_denied_prefixes() {
        assert!(check_path("/etc/hosts").is_err());
        assert!(check_path("/proc/1/mem").is_err());
        assert!(check_path("/sys/class").is_err());
        assert!(check_path("/dev/sda").is_err());
    }

    #[test]
    fn rejects_denied_files() {
        assert!(check_path("/etc/passwd").is_err());
        assert!(check_path("/root/.ssh/id_rsa").is_err());
    }

    #[test]
    fn rejects_parent_traversal() {
        assert!(check_path("../../etc/passwd").is_err());
        assert!(check_path("foo/../../bar").is_err());
    }

    #[test]
    fn allows_workspace_relative_paths() {
        assert!(check_path("hello.txt").is_ok());
        assert!(check_path("/workspace/hello.txt").is_ok());
    }

    #[test]
    fn rejects_oversize_reads() {
        let big = "x".repeat(MAX_READ_BYTES);
        assert!(check_read_size(&big).is_err());
        assert!(check_read_size("small").is_ok());
    }
}
