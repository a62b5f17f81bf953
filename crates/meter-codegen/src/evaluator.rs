// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Two-pass sandboxed Python evaluation.
//!
//! Pass A is a cheap parse/symbol check that seeds the `complexity` axis.
//! Pass B actually runs the candidate against the task's literal test
//! cases inside the same hardened interpreter: CPU/address-space rlimits,
//! a wall-clock alarm, an import deny-list, and a write/absolute-path open
//! guard, all enforced from inside the sandbox's own Python process rather
//! than trusted to the container alone.

use meter_sandbox::{ExecOptions, SandboxConfig, SandboxManager};
use meter_scoring::AxisMetrics;
use meter_tasks::CodeTask;

use crate::quality;
use crate::types::CodegenError;

const DENIED_MODULES: &[&str] = &[
    "os", "subprocess", "socket", "urllib", "requests", "http", "ftplib", "smtplib", "shutil", "pathlib",
];

fn difficulty_value(difficulty: meter_tasks::Difficulty) -> f64 {
    match difficulty {
        meter_tasks::Difficulty::Easy => 0.3,
        meter_tasks::Difficulty::Medium => 0.6,
        meter_tasks::Difficulty::Hard => 0.9,
    }
}

fn py_str_literal(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

fn build_pass_a_script(expected_symbol: &str) -> String {
    format!(
        r#"import ast

with open("solution.py") as f:
    source = f.read()

ok = False
try:
    tree = ast.parse(source)
    for node in tree.body:
        if isinstance(node, (ast.FunctionDef, ast.AsyncFunctionDef, ast.ClassDef)) and node.name == {symbol}:
            ok = True
            break
except SyntaxError:
    ok = False

print("OK" if ok else "FAIL")
"#,
        symbol = py_str_literal(expected_symbol),
    )
}

fn build_pass_b_script(expected_symbol: &str, test_cases: &[meter_tasks::TestCase]) -> String {
    let tests: String = test_cases
        .iter()
        .map(|tc| format!("    ({}, {}),\n", py_str_literal(&tc.input_expression), py_str_literal(&tc.expected_expression)))
        .collect();
    let denied: String = DENIED_MODULES.iter().map(|m| py_str_literal(m)).collect::<Vec<_>>().join(", ");

    format!(
        r#"import ast
import signal
import builtins

class _EvalTimeout(Exception):
    pass

def _alarm_handler(signum, frame):
    raise _EvalTimeout("wall clock timeout")

signal.signal(signal.SIGALRM, _alarm_handler)
signal.alarm(5)

try:
    import resource
    resource.setrlimit(resource.RLIMIT_CPU, (2, 2))
    resource.setrlimit(resource.RLIMIT_AS, (512 * 1024 * 1024, 512 * 1024 * 1024))
except Exception:
    pass

_DENIED_MODULES = {{{denied}}}
_real_import = builtins.__import__

def _guarded_import(name, *args, **kwargs):
    top = name.split(".")[0]
    if top in _DENIED_MODULES:
        raise ImportError(f"import of '{{name}}' is not permitted in the evaluation sandbox")
    return _real_import(name, *args, **kwargs)

builtins.__import__ = _guarded_import

_real_open = builtins.open

def _guarded_open(path, mode="r", *args, **kwargs):
    p = str(path)
    if any(c in mode for c in ("w", "a", "x", "+")) or (p.startswith("/") and not p.startswith("/tmp")):
        raise PermissionError(f"open('{{p}}', '{{mode}}') is not permitted in the evaluation sandbox")
    return _real_open(path, mode, *args, **kwargs)

builtins.open = _guarded_open

with _real_open("solution.py") as f:
    source = f.read()

TESTS = [
{tests}]

namespace = {{}}
passed = 0
total = len(TESTS)

try:
    code_obj = compile(source, "solution.py", "exec")
    exec(code_obj, namespace)
    symbol = namespace.get({symbol})

    for input_expr, expected_expr in TESTS:
        try:
            args = ast.literal_eval(input_expr)
            expected = ast.literal_eval(expected_expr)
            if symbol is None:
                continue
            result = symbol(*args) if isinstance(args, tuple) else symbol(args)
            if result == expected:
                passed += 1
        except Exception:
            pass
except Exception:
    pass

print(f"{{passed}}/{{total}}")
"#,
        denied = denied,
        tests = tests,
        symbol = py_str_literal(expected_symbol),
    )
}

fn parse_passed_total(stdout: &str, fallback_total: usize) -> (usize, usize) {
    let line = stdout.lines().last().unwrap_or("").trim();
    if let Some((p, t)) = line.split_once('/') {
        if let (Ok(p), Ok(t)) = (p.trim().parse::<usize>(), t.trim().parse::<usize>()) {
            return (p, t);
        }
    }
    (0, fallback_total)
}

/// Axis vector for one candidate solution against one task. `efficiency`
/// and `stability` are left at `0.0` — the trial runner fills `efficiency`
/// in from wall-clock latency, and the aggregator derives `stability` from
/// cross-trial variance, neither of which this single evaluation can know.
pub async fn evaluate(sandbox: &SandboxManager, sandbox_image: &str, task: &CodeTask, code: &str) -> Result<AxisMetrics, CodegenError> {
    let config = SandboxConfig {
        image: sandbox_image.to_string(),
        working_dir: "/workspace".to_string(),
        timeout_ms: 15_000,
        memory_limit_mb: 512,
        cpu_limit: 1.0,
        network_access: false,
        mount_paths: vec![],
        environment: Default::default(),
    };
    let sandbox_id = sandbox.create(config).await?;
    let result = evaluate_inner(sandbox, &sandbox_id, task, code).await;
    if let Err(e) = sandbox.destroy(&sandbox_id).await {
        tracing::warn!(sandbox = %sandbox_id, error = %e, "destroy failed during evaluator teardown");
    }
    result
}

async fn evaluate_inner(sandbox: &SandboxManager, sandbox_id: &str, task: &CodeTask, code: &str) -> Result<AxisMetrics, CodegenError> {
    sandbox.write_file(sandbox_id, "solution.py", code).await?;

    let pass_a_script = build_pass_a_script(&task.expected_symbol);
    sandbox.write_file(sandbox_id, "pass_a.py", &pass_a_script).await?;
    let pass_a_out = sandbox
        .exec(sandbox_id, &["python3".to_string(), "pass_a.py".to_string()], ExecOptions::default())
        .await?;
    let parse_ok = pass_a_out.success() && pass_a_out.stdout.trim() == "OK";

    let pass_b_script = build_pass_b_script(&task.expected_symbol, &task.test_cases);
    sandbox.write_file(sandbox_id, "pass_b.py", &pass_b_script).await?;
    let pass_b_out = sandbox
        .exec(sandbox_id, &["python3".to_string(), "pass_b.py".to_string()], ExecOptions::default())
        .await?;
    let (passed, total) = parse_passed_total(&pass_b_out.stdout, task.test_cases.len());

    let correctness = if total == 0 { 0.0 } else { (passed as f64 / total as f64).clamp(0.0, 1.0) };
    let complexity = if parse_ok { difficulty_value(task.difficulty) } else { 0.0 };
    let code_quality = quality::code_quality(code);
    let edge_cases = (0.8 * correctness + 0.2 * if correctness > 0.95 { 1.0 } else { 0.5 * correctness }).clamp(0.0, 1.0);
    let debugging = if task.is_debug_task() { correctness } else { (correctness + 0.05).min(1.0) };

    Ok(AxisMetrics {
        correctness,
        complexity,
        code_quality,
        efficiency: 0.0,
        stability: 0.0,
        edge_cases,
        debugging,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_passed_total_reads_the_final_line() {
        assert_eq!(parse_passed_total("2/3\n", 3), (2, 3));
        assert_eq!(parse_passed_total("some noise\n1/1", 1), (1, 1));
    }

    #[test]
    fn parse_passed_total_falls_back_on_garbage() {
        assert_eq!(parse_passed_total("not a ratio", 4), (0, 4));
    }

    #[test]
    fn pass_a_script_embeds_the_symbol_as_a_safe_literal() {
        let script = build_pass_a_script("weird\"name");
        assert!(script.contains("weird\\\"name"));
    }

    #[test]
    fn pass_b_script_lists_every_test_case() {
        let tests = vec![
            meter_tasks::TestCase::new("(1, 2)", "3"),
            meter_tasks::TestCase::new("(4, 5)", "9"),
        ];
        let script = build_pass_b_script("add", &tests);
        assert!(script.contains("(1, 2)"));
        assert!(script.contains("(4, 5)"));
        assert!(script.matches("RLIMIT_CPU").count() == 1);
    }
}
