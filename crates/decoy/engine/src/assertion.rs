//! Assertion engine
//!
//! Counts the history entries a rule describes and checks the count against
//! a repeat constraint. Failures carry a rendered diagnostic listing the
//! fake's calls.

use crate::config::DiagnosticsConfig;
use crate::error::Result;
use crate::history::RecordedCall;
use crate::manager::FakeManager;
use crate::repeat::RepeatConstraint;
use crate::rule::CallRule;
use std::fmt::Write as _;
use tracing::{debug, warn};

/// A repeat expectation that was not met
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AssertionFailure {
    /// Description of the call that was expected
    pub expected_call: String,
    /// Description of the repeat constraint
    pub repeat: String,
    /// Number of matching calls found
    pub actual: usize,
    message: String,
}

impl AssertionFailure {
    /// The rendered diagnostic.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Evaluates repeat expectations against a fake's history
#[derive(Debug, Clone, Copy)]
pub struct AssertionEngine<'a> {
    config: &'a DiagnosticsConfig,
}

impl<'a> AssertionEngine<'a> {
    /// Engine rendering diagnostics as `config` asks.
    pub fn new(config: &'a DiagnosticsConfig) -> Self {
        Self { config }
    }

    /// Number of calls in `calls` that `rule` describes.
    pub fn count_matching(&self, rule: &dyn CallRule, calls: &[RecordedCall]) -> Result<usize> {
        let mut count = 0;
        for recorded in calls {
            if rule.matches_call(&recorded.call)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Check `manager`'s history as of now.
    pub fn assert(
        &self,
        manager: &FakeManager,
        rule: &dyn CallRule,
        repeat: &RepeatConstraint,
    ) -> Result<()> {
        let calls = manager.recorded_calls();
        let actual = self.count_matching(rule, &calls)?;
        let expected_call = rule.description_of_valid_call();

        if repeat.matches(actual) {
            debug!(fake = %manager.id(), expected = %expected_call, actual, "Assertion passed");
            return Ok(());
        }

        warn!(
            fake = %manager.id(),
            expected = %expected_call,
            repeat = %repeat,
            actual,
            "Assertion failed"
        );
        let message = self.render(&expected_call, repeat, actual, &calls);
        Err(AssertionFailure {
            expected_call,
            repeat: repeat.description().to_string(),
            actual,
            message,
        }
        .into())
    }

    fn render(
        &self,
        expected_call: &str,
        repeat: &RepeatConstraint,
        actual: usize,
        calls: &[RecordedCall],
    ) -> String {
        let mut message = String::new();
        let _ = writeln!(message);
        let _ = writeln!(message, "  Assertion failed for the following call:");
        let _ = writeln!(message, "    {}", expected_call);

        if calls.is_empty() {
            let _ = write!(
                message,
                "  Expected to find it {} but no calls were made to the fake object.",
                repeat
            );
            return message;
        }

        let _ = writeln!(
            message,
            "  Expected to find it {} but found it #{} times among the calls:",
            repeat, actual
        );
        let listed = calls.len().min(self.config.max_listed_calls);
        for (position, recorded) in calls.iter().take(listed).enumerate() {
            if self.config.include_sequence_numbers {
                let _ = writeln!(message, "    {}: {}", position + 1, recorded.call);
            } else {
                let _ = writeln!(message, "    {}", recorded.call);
            }
        }
        if calls.len() > listed {
            let _ = writeln!(message, "    ... and {} more call(s)", calls.len() - listed);
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::ArgumentMatcher;
    use crate::rule::{BuildableCallRule, UserConfiguredRule};
    use crate::specification::CallSpecification;
    use crate::FakeError;
    use decoy_types::{Contract, MethodInfo, ParameterInfo, TypeDescriptor};
    use serde_json::json;
    use std::sync::Arc;

    fn method_contract() -> Contract {
        Contract::named("tests::Calculator").with_member(
            MethodInfo::new("method", TypeDescriptor::Integer)
                .with_parameter(ParameterInfo::new("x", TypeDescriptor::Integer)),
        )
    }

    fn method_with(manager: &FakeManager, x: i64) -> UserConfiguredRule {
        let method = manager.contract().member("method").unwrap();
        let rule = UserConfiguredRule::new(CallSpecification::for_member(
            manager.contract().contract_type(),
            method,
        ));
        rule.use_argument_matchers(vec![ArgumentMatcher::exact(json!(x))])
            .unwrap();
        rule
    }

    fn failure(err: FakeError) -> AssertionFailure {
        match err {
            FakeError::Assertion(failure) => failure,
            other => panic!("expected an assertion failure, got {}", other),
        }
    }

    #[test]
    fn unmatched_call_is_listed_in_the_diagnostic() {
        let manager = FakeManager::new(method_contract());
        manager.invoke("method", vec![json!(6)]).unwrap();

        let rule = method_with(&manager, 5);
        let failure = failure(
            manager
                .assert_happened(&rule, &RepeatConstraint::at_least(1))
                .unwrap_err(),
        );

        assert_eq!(failure.actual, 0);
        assert_eq!(failure.expected_call, "Calculator.method(5)");
        assert!(failure
            .message()
            .contains("Expected to find it at least once but found it #0 times among the calls:"));
        assert!(failure.message().contains("1: Calculator.method(6)"));
        assert_eq!(failure.to_string(), failure.message());
    }

    #[test]
    fn empty_history_is_called_out() {
        let manager = FakeManager::new(method_contract());
        let rule = method_with(&manager, 5);
        let failure = failure(
            manager
                .assert_happened(&rule, &RepeatConstraint::once())
                .unwrap_err(),
        );
        assert!(failure
            .message()
            .contains("no calls were made to the fake object"));
    }

    #[test]
    fn long_histories_are_truncated() {
        let config = crate::EngineConfig {
            diagnostics: DiagnosticsConfig {
                max_listed_calls: 2,
                include_sequence_numbers: false,
            },
            ..Default::default()
        };
        let manager = FakeManager::with_config(method_contract(), Arc::new(config));
        for x in 0..5 {
            manager.invoke("method", vec![json!(x)]).unwrap();
        }
        let rule = method_with(&manager, 9);
        let failure = failure(
            manager
                .assert_happened(&rule, &RepeatConstraint::once())
                .unwrap_err(),
        );
        assert!(failure.message().contains("    Calculator.method(1)\n"));
        assert!(!failure.message().contains("Calculator.method(2)"));
        assert!(failure.message().contains("... and 3 more call(s)"));
    }

    #[test]
    fn repeated_assertion_gives_the_same_answer() {
        let manager = FakeManager::new(method_contract());
        manager.invoke("method", vec![json!(5)]).unwrap();
        let rule = method_with(&manager, 5);
        let repeat = RepeatConstraint::twice();

        let first = manager.assert_happened(&rule, &repeat).is_ok();
        let second = manager.assert_happened(&rule, &repeat).is_ok();
        assert_eq!(first, second);
        assert!(!first);
    }
}
