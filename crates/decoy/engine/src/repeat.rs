//! Repeat constraints: predicates over an observed call count

use std::sync::Arc;

/// A named predicate over how many times a call happened
#[derive(Clone)]
pub struct RepeatConstraint {
    description: String,
    predicate: Arc<dyn Fn(usize) -> bool + Send + Sync>,
}

impl RepeatConstraint {
    /// Exactly `times` calls.
    pub fn exactly(times: usize) -> Self {
        Self::like(format!("exactly {}", describe_times(times)), move |count| {
            count == times
        })
    }

    /// At least `times` calls.
    pub fn at_least(times: usize) -> Self {
        Self::like(format!("at least {}", describe_times(times)), move |count| {
            count >= times
        })
    }

    /// At most `times` calls.
    pub fn at_most(times: usize) -> Self {
        Self::like(format!("at most {}", describe_times(times)), move |count| {
            count <= times
        })
    }

    /// Inclusive on both ends. A range with `min > max` accepts nothing.
    pub fn between(min: usize, max: usize) -> Self {
        Self::like(
            format!("between {} and {} times", min, max),
            move |count| (min..=max).contains(&count),
        )
    }

    /// No calls at all.
    pub fn never() -> Self {
        Self::like("never", |count| count == 0)
    }

    pub fn once() -> Self {
        Self::exactly(1)
    }

    pub fn twice() -> Self {
        Self::exactly(2)
    }

    /// A custom constraint.
    pub fn like<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(usize) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Whether `count` observed calls satisfy the constraint.
    pub fn matches(&self, count: usize) -> bool {
        (self.predicate)(count)
    }

    /// Human-readable form, e.g. "exactly twice".
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether both handles share the same predicate.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.predicate, &other.predicate)
    }
}

impl Default for RepeatConstraint {
    fn default() -> Self {
        Self::at_least(1)
    }
}

impl std::fmt::Display for RepeatConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description)
    }
}

impl std::fmt::Debug for RepeatConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RepeatConstraint")
            .field(&self.description)
            .finish()
    }
}

fn describe_times(times: usize) -> String {
    match times {
        1 => "once".to_string(),
        2 => "twice".to_string(),
        n => format!("{} times", n),
    }
}
