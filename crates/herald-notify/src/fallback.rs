//! Ordered fallback over async strategies.
//!
//! A chain holds lazily-evaluated strategies. `run` awaits them one at a
//! time and stops at the first success. Strategies whose precondition does
//! not hold are skipped without being polled. Used for both channel
//! selection and audible feedback.

use std::future::Future;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use herald_common::DeliveryError;
use tracing::debug;

struct Strategy<'a, T> {
    name: &'static str,
    /// `Err` carries the reason when the precondition failed.
    run: Result<BoxFuture<'a, Result<T, DeliveryError>>, DeliveryError>,
}

/// Result of a chain that found a working strategy.
#[derive(Debug)]
pub struct Fallback<T> {
    pub value: T,
    /// Name of the strategy that succeeded.
    pub strategy: &'static str,
    /// Strategies tried or skipped before it, with why.
    pub failures: Vec<(&'static str, DeliveryError)>,
}

pub struct FallbackChain<'a, T> {
    label: &'static str,
    strategies: Vec<Strategy<'a, T>>,
}

impl<'a, T> FallbackChain<'a, T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            strategies: Vec::new(),
        }
    }

    /// Append a strategy.
    pub fn then<F>(mut self, name: &'static str, run: F) -> Self
    where
        F: Future<Output = Result<T, DeliveryError>> + Send + 'a,
    {
        self.strategies.push(Strategy {
            name,
            run: Ok(run.boxed()),
        });
        self
    }

    /// Append a strategy that only runs when `available` holds; otherwise
    /// it is recorded as failed with `unavailable`.
    pub fn then_if<F>(
        mut self,
        available: bool,
        unavailable: DeliveryError,
        name: &'static str,
        run: F,
    ) -> Self
    where
        F: Future<Output = Result<T, DeliveryError>> + Send + 'a,
    {
        self.strategies.push(Strategy {
            name,
            run: if available { Ok(run.boxed()) } else { Err(unavailable) },
        });
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Try each strategy in order.
    ///
    /// Returns `DeliveryError::Exhausted` when none succeeds; the individual
    /// failures are logged.
    pub async fn run(self) -> Result<Fallback<T>, DeliveryError> {
        let mut failures = Vec::new();
        for strategy in self.strategies {
            let run = match strategy.run {
                Ok(run) => run,
                Err(reason) => {
                    debug!(chain = self.label, strategy = strategy.name, reason = %reason, "Strategy skipped");
                    failures.push((strategy.name, reason));
                    continue;
                }
            };
            match run.await {
                Ok(value) => {
                    return Ok(Fallback {
                        value,
                        strategy: strategy.name,
                        failures,
                    })
                }
                Err(e) => {
                    debug!(chain = self.label, strategy = strategy.name, error = %e, "Strategy failed");
                    failures.push((strategy.name, e));
                }
            }
        }
        Err(DeliveryError::Exhausted(self.label.to_string()))
    }
}
