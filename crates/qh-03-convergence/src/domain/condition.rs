//! Convergence conditions.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

type Check<'a> = Box<dyn FnMut() -> BoxFuture<'a, Result<(), String>> + Send + 'a>;

/// A re-evaluable check with a description and an optional budget override.
///
/// The check returns `Err(observation)` while the condition does not hold;
/// the observation ends up in the timeout error.
pub struct Condition<'a> {
    description: String,
    timeout: Option<Duration>,
    check: Check<'a>,
}

impl<'a> Condition<'a> {
    pub fn new<F, Fut>(description: impl Into<String>, mut check: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'a,
        Fut: Future<Output = Result<(), String>> + Send + 'a,
    {
        Self {
            description: description.into(),
            timeout: None,
            check: Box::new(move || check().boxed()),
        }
    }

    /// Override the poller's default budget for this condition.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn into_parts(self) -> (String, Option<Duration>, Check<'a>) {
        (self.description, self.timeout, self.check)
    }
}

impl std::fmt::Debug for Condition<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Condition")
            .field("description", &self.description)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Values `await_data` considers present.
pub trait Populated {
    fn is_populated(&self) -> bool;
}

impl<T> Populated for Vec<T> {
    fn is_populated(&self) -> bool {
        !self.is_empty()
    }
}

impl Populated for String {
    fn is_populated(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Populated for Option<T> {
    fn is_populated(&self) -> bool {
        self.is_some()
    }
}

impl<T, S> Populated for HashSet<T, S> {
    fn is_populated(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Populated for BTreeSet<T> {
    fn is_populated(&self) -> bool {
        !self.is_empty()
    }
}

impl<K, V, S> Populated for HashMap<K, V, S> {
    fn is_populated(&self) -> bool {
        !self.is_empty()
    }
}
