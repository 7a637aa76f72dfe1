//! Mock executor
//!
//! Stands in for real interpreters. Output is derived from the source text
//! alone: print statements become stdout, a raise/throw/panic becomes
//! stderr with a non-zero exit code, and an explicit `exit(n)` sets the
//! exit code. Nothing is ever executed.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    CodeExecutor, Error, ExecutionRequest, Language, ResourceUsage, Result, SandboxOutput,
};

static PYTHON_PRINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"print\(\s*f?["'](.*?)["']\s*\)"#).expect("PYTHON_PRINT is a compile-time constant")
});
static JS_PRINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"console\.log\(\s*["'`](.*?)["'`]\s*\)"#)
        .expect("JS_PRINT is a compile-time constant")
});
static CSHARP_PRINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"Console\.WriteLine\(\s*\$?"(.*?)"\s*\)"#)
        .expect("CSHARP_PRINT is a compile-time constant")
});
static BASH_PRINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*echo\s+["']?(.*?)["']?\s*$"#)
        .expect("BASH_PRINT is a compile-time constant")
});
static RUST_PRINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"println!\(\s*"(.*?)"\s*[,)]"#).expect("RUST_PRINT is a compile-time constant")
});

static PYTHON_RAISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"raise\s+(\w+)(?:\(\s*["']?(.*?)["']?\s*\))?"#)
        .expect("PYTHON_RAISE is a compile-time constant")
});
static THROW_NEW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"throw\s+new\s+(\w+)\(\s*["'`]?(.*?)["'`]?\s*\)"#)
        .expect("THROW_NEW is a compile-time constant")
});
static RUST_PANIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"panic!\(\s*"(.*?)"\s*\)"#).expect("RUST_PANIC is a compile-time constant")
});

static PYTHON_EXIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:sys\.)?exit\(\s*(\d+)\s*\)").expect("PYTHON_EXIT is a compile-time constant")
});
static JS_EXIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"process\.exit\(\s*(\d+)\s*\)").expect("JS_EXIT is a compile-time constant")
});
static CSHARP_EXIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Environment\.Exit\(\s*(\d+)\s*\)").expect("CSHARP_EXIT is a compile-time constant")
});
static BASH_EXIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*exit\s+(\d+)\s*$").expect("BASH_EXIT is a compile-time constant")
});
static RUST_EXIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"process::exit\(\s*(\d+)\s*\)").expect("RUST_EXIT is a compile-time constant")
});

/// Mock executor configuration
#[derive(Debug, Clone, Default)]
pub struct MockExecutorConfig {
    /// Simulated run time of every execution
    pub delay: Duration,
}

impl MockExecutorConfig {
    /// Set the simulated run time
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Regex-driven stand-in for a real interpreter
#[derive(Debug, Clone, Default)]
pub struct MockExecutor {
    config: MockExecutorConfig,
}

impl MockExecutor {
    /// Create a mock executor
    #[must_use]
    pub fn new(config: MockExecutorConfig) -> Self {
        Self { config }
    }

    /// Derive an output from the source text, with no delay and no limits.
    #[must_use]
    pub fn simulate(language: Language, code: &str) -> SandboxOutput {
        let stdout: String = print_pattern(language)
            .captures_iter(code)
            .map(|caps| format!("{}\n", unescape(&caps[1])))
            .collect();

        if let Some((stderr, exit_code)) = detect_raise(language, code) {
            let mut output = SandboxOutput::failure(stderr, exit_code);
            output.stdout = stdout;
            return output;
        }

        let exit_code = exit_pattern(language)
            .captures(code)
            .and_then(|caps| caps[1].parse::<i32>().ok())
            .unwrap_or(0);

        let mut output = SandboxOutput::success(stdout);
        output.exit_code = exit_code;
        output
    }
}

#[async_trait]
impl CodeExecutor for MockExecutor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn execute(
        &self,
        request: &ExecutionRequest,
        cancel: CancellationToken,
    ) -> Result<SandboxOutput> {
        let started = Instant::now();

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if !self.config.delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(self.config.delay) => {}
            }
        }

        let mut output = Self::simulate(request.language, &request.code);
        output.truncate_stdout(request.limits.max_output_length);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        output.duration_ms = elapsed_ms;
        output.usage = ResourceUsage {
            peak_memory_bytes: request.code.len() as u64 * 1024,
            cpu_time_ms: elapsed_ms,
        };

        debug!(
            language = %request.language,
            exit_code = output.exit_code,
            duration_ms = elapsed_ms,
            "Mock execution finished"
        );
        Ok(output)
    }
}

fn print_pattern(language: Language) -> &'static Regex {
    match language {
        Language::Python => &PYTHON_PRINT,
        Language::JavaScript | Language::TypeScript => &JS_PRINT,
        Language::CSharp => &CSHARP_PRINT,
        Language::Bash => &BASH_PRINT,
        Language::Rust => &RUST_PRINT,
    }
}

fn exit_pattern(language: Language) -> &'static Regex {
    match language {
        Language::Python => &PYTHON_EXIT,
        Language::JavaScript | Language::TypeScript => &JS_EXIT,
        Language::CSharp => &CSHARP_EXIT,
        Language::Bash => &BASH_EXIT,
        Language::Rust => &RUST_EXIT,
    }
}

/// Returns `(stderr, exit_code)` when the source raises.
fn detect_raise(language: Language, code: &str) -> Option<(String, i32)> {
    match language {
        Language::Python => PYTHON_RAISE.captures(code).map(|caps| {
            let message = caps.get(2).map_or("", |m| m.as_str());
            (
                format!(
                    "Traceback (most recent call last):\n{}: {}",
                    &caps[1], message
                ),
                1,
            )
        }),
        Language::JavaScript | Language::TypeScript => THROW_NEW
            .captures(code)
            .map(|caps| (format!("Uncaught {}: {}", &caps[1], &caps[2]), 1)),
        Language::CSharp => THROW_NEW.captures(code).map(|caps| {
            (
                format!("Unhandled exception. System.{}: {}", &caps[1], &caps[2]),
                1,
            )
        }),
        Language::Rust => RUST_PANIC
            .captures(code)
            .map(|caps| (format!("thread 'main' panicked: {}", &caps[1]), 101)),
        Language::Bash => None,
    }
}

fn unescape(raw: &str) -> String {
    raw.replace("\\n", "\n").replace("\\t", "\t")
}
