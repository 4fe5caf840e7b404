//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layer boundaries hold:
//! domain is pure, application talks to the outside only through ports, and
//! infra never renders output.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

fn src_dir(layer: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src").join(layer)
}

fn relative(file: &Path) -> String {
    file.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(file)
        .display()
        .to_string()
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        if line.trim().contains("#[cfg(test)]") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

/// Non-test, non-comment lines of a file with their 1-based line numbers.
fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let mut tracker = CfgTestTracker::new();
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            !in_test && !trimmed.starts_with("//")
        })
        .map(|(i, line)| (i + 1, line.to_string()))
        .collect()
}

/// Report every production line under `layer` containing one of `needles`.
/// Out-of-line `tests.rs` modules are skipped.
fn scan(layer: &str, needles: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir(layer)) {
        if file.file_name().is_some_and(|n| n == "tests.rs") {
            continue;
        }
        let rel = relative(&file);
        for (lineno, line) in production_lines(&file) {
            if let Some(needle) = needles.iter().find(|n| line.contains(*n)) {
                violations.push(format!("{rel}:{lineno}: `{needle}`: {}", line.trim()));
            }
        }
    }
    violations
}

// ── Domain purity ─────────────────────────────────────────────────────────────

#[test]
fn domain_has_no_outer_layer_imports() {
    let violations = scan(
        "domain",
        &[
            "crate::application",
            "crate::infra",
            "crate::commands",
            "crate::output",
        ],
    );
    assert!(
        violations.is_empty(),
        "domain/ must not import outer layers:\n{}",
        violations.join("\n")
    );
}

#[test]
fn domain_performs_no_io() {
    let violations = scan(
        "domain",
        &["std::fs", "std::process", "std::env", "println!", "eprintln!"],
    );
    assert!(
        violations.is_empty(),
        "domain/ must stay free of I/O:\n{}",
        violations.join("\n")
    );
}

// ── Application talks through ports ──────────────────────────────────────────

#[test]
fn application_has_no_infra_or_presentation_imports() {
    let violations = scan(
        "application",
        &["crate::infra", "crate::commands", "crate::output", "std::fs"],
    );
    assert!(
        violations.is_empty(),
        "application/ must reach the outside through ports only:\n{}",
        violations.join("\n")
    );
}

// ── Infra does not render ─────────────────────────────────────────────────────

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let violations = scan("infra", &["crate::commands", "crate::output"]);
    assert!(
        violations.is_empty(),
        "infra/ must not import from commands/ or output/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_print_macros_outside_tests() {
    let violations = scan("infra", &["println!", "eprintln!", "print!("]);
    assert!(
        violations.is_empty(),
        "infra/ must not print outside #[cfg(test)]:\n{}",
        violations.join("\n")
    );
}

// ── Commands go through the renderer ─────────────────────────────────────────

#[test]
fn no_inline_json_branching_in_commands() {
    let mut violations = scan("commands", &["json: bool"]);
    for file in collect_rs_files(&src_dir("commands")) {
        let rel = relative(&file);
        for (lineno, line) in production_lines(&file) {
            let trimmed = line.trim();
            if trimmed.starts_with("if json") || trimmed.starts_with("if !json") {
                violations.push(format!("{rel}:{lineno}: inline JSON branch: {trimmed}"));
            }
        }
    }
    assert!(
        violations.is_empty(),
        "Found inline JSON branching in commands/; use app.renderer() instead:\n{}",
        violations.join("\n")
    );
}

// ── Error propagation ────────────────────────────────────────────────────────

#[test]
fn no_unwrap_or_expect_outside_tests() {
    let mut violations = Vec::new();
    for layer in ["domain", "application", "infra", "output", "commands"] {
        violations.extend(scan(layer, &[".unwrap()", ".expect("]));
    }
    assert!(
        violations.is_empty(),
        "Propagate errors with `?` instead of panicking:\n{}",
        violations.join("\n")
    );
}
