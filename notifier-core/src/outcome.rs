//! Result type for operations that must always produce a usable value.
//!
//! The weather, geolocation and email services never fail towards their
//! caller: on error they substitute a default or sentinel value. Instead of
//! swallowing the error silently, they return a [`BestEffort`] that carries
//! the value together with the failure that caused the fallback.

use std::fmt;

#[must_use]
pub struct BestEffort<T> {
    value: T,
    failure: Option<anyhow::Error>,
}

impl<T> BestEffort<T> {
    /// The operation produced a real result.
    pub fn ok(value: T) -> Self {
        Self { value, failure: None }
    }

    /// The operation failed and `value` is a fallback.
    pub fn degraded(value: T, failure: anyhow::Error) -> Self {
        Self { value, failure: Some(failure) }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }

    pub fn failure(&self) -> Option<&anyhow::Error> {
        self.failure.as_ref()
    }
}

impl<T: fmt::Debug> fmt::Debug for BestEffort<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BestEffort")
            .field("value", &self.value)
            .field("failure", &self.failure.as_ref().map(|e| format!("{e:#}")))
            .finish()
    }
}
