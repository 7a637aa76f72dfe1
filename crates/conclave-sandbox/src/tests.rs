//! Tests for the sandbox crate

use super::*;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[test]
fn test_language_parse() {
    assert_eq!("python".parse::<Language>().unwrap(), Language::Python);
    assert_eq!("JS".parse::<Language>().unwrap(), Language::JavaScript);
    assert_eq!("c#".parse::<Language>().unwrap(), Language::CSharp);
    assert!(matches!(
        "cobol".parse::<Language>(),
        Err(Error::UnsupportedLanguage(_))
    ));
}

#[test]
fn test_language_serde_matches_as_str() {
    for language in Language::ALL {
        let json = serde_json::to_string(&language).unwrap();
        assert_eq!(json, format!("\"{}\"", language.as_str()));
        assert_eq!(language.as_str().parse::<Language>().unwrap(), language);
    }
}

#[test]
fn test_resource_limits_defaults() {
    let limits: ResourceLimits = serde_json::from_str("{}").unwrap();
    assert_eq!(limits, ResourceLimits::default());
    assert_eq!(limits.max_memory_mb, 256);
    assert_eq!(limits.max_cpu_seconds, 30);

    let limits = ResourceLimits::default()
        .with_memory_mb(64)
        .with_cpu_seconds(5)
        .with_output_length(10);
    assert_eq!(limits.max_memory_mb, 64);
    assert_eq!(limits.max_cpu_seconds, 5);
    assert_eq!(limits.max_output_length, 10);
}

#[test]
fn test_sandbox_output() {
    let success = SandboxOutput::success("output");
    assert!(success.is_success());
    assert_eq!(success.combined_output(), "output");

    let failure = SandboxOutput::failure("error", 1);
    assert!(!failure.is_success());
    assert_eq!(failure.exit_code, 1);

    let mut long = SandboxOutput::success("abcdef");
    long.truncate_stdout(3);
    assert_eq!(long.stdout, "abc");
    assert!(long.truncated);
}

#[test]
fn test_simulate_python_prints() {
    let code = "x = 1\nprint('hello')\nprint(\"world\")\n";
    let output = MockExecutor::simulate(Language::Python, code);
    assert_eq!(output.stdout, "hello\nworld\n");
    assert_eq!(output.exit_code, 0);
    assert!(output.stderr.is_empty());
}

#[test]
fn test_simulate_each_language_print() {
    let cases = [
        (Language::JavaScript, "console.log('hi');"),
        (Language::TypeScript, "console.log(`hi`);"),
        (Language::CSharp, "Console.WriteLine(\"hi\");"),
        (Language::Bash, "echo \"hi\""),
        (Language::Rust, "fn main() { println!(\"hi\"); }"),
    ];
    for (language, code) in cases {
        let output = MockExecutor::simulate(language, code);
        assert_eq!(output.stdout, "hi\n", "language {}", language);
        assert!(output.is_success());
    }
}

#[test]
fn test_simulate_python_raise() {
    let code = "print('before')\nraise ValueError('bad input')";
    let output = MockExecutor::simulate(Language::Python, code);
    assert_eq!(output.exit_code, 1);
    assert_eq!(output.stdout, "before\n");
    assert!(output.stderr.contains("ValueError: bad input"));
}

#[test]
fn test_simulate_throw_and_panic() {
    let js = MockExecutor::simulate(Language::JavaScript, "throw new Error('boom')");
    assert_eq!(js.exit_code, 1);
    assert!(js.stderr.contains("Error: boom"));

    let rust = MockExecutor::simulate(Language::Rust, "panic!(\"oops\")");
    assert_eq!(rust.exit_code, 101);
    assert!(rust.stderr.contains("oops"));
}

#[test]
fn test_simulate_explicit_exit_code() {
    let output = MockExecutor::simulate(Language::Bash, "echo start\nexit 3\n");
    assert_eq!(output.stdout, "start\n");
    assert_eq!(output.exit_code, 3);
}

#[tokio::test]
async fn test_execute_truncates_output() {
    let executor = MockExecutor::default();
    let request = ExecutionRequest::new(Language::Python, "print('abcdefghij')")
        .with_limits(ResourceLimits::default().with_output_length(4));

    let output = executor
        .execute(&request, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(output.stdout, "abcd");
    assert!(output.truncated);
    assert!(output.usage.peak_memory_bytes > 0);
}

#[tokio::test(start_paused = true)]
async fn test_execute_cancelled_during_delay() {
    let executor =
        MockExecutor::new(MockExecutorConfig::default().with_delay(Duration::from_secs(10)));
    let request = ExecutionRequest::new(Language::Python, "print('x')");
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let result = executor.execute(&request, cancel).await;
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test]
async fn test_execute_already_cancelled() {
    let executor = MockExecutor::default();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let request = ExecutionRequest::new(Language::Bash, "echo hi");
    assert!(matches!(
        executor.execute(&request, cancel).await,
        Err(Error::Cancelled)
    ));
    assert_eq!(executor.name(), "mock");
}
