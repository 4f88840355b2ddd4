//! Daily call budget and prompt-size ceiling for paid completion calls.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::cache::ResultCache;

const DAILY_COUNTER_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Why a request was answered from the fallback data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    DailyBudgetExceeded { calls: u64, ceiling: u64 },
    PromptTooLarge { chars: usize, max: usize },
    RateLimited,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DailyBudgetExceeded { calls, ceiling } => {
                write!(f, "daily call budget exceeded ({calls} > {ceiling})")
            }
            Self::PromptTooLarge { chars, max } => {
                write!(f, "prompt too large ({chars} > {max} chars)")
            }
            Self::RateLimited => f.write_str("completion API rate limited"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Proceed,
    Fallback(FallbackReason),
}

/// Tracks completed calls per UTC day in the shared [`ResultCache`].
pub struct CostGuard {
    cache: Arc<ResultCache>,
    daily_call_ceiling: u64,
    max_prompt_chars: usize,
}

impl CostGuard {
    #[must_use]
    pub fn new(cache: Arc<ResultCache>, daily_call_ceiling: u32, max_prompt_chars: usize) -> Self {
        Self {
            cache,
            daily_call_ceiling: u64::from(daily_call_ceiling),
            max_prompt_chars,
        }
    }

    /// Counter key for the current UTC day, e.g. `recent_requests_2024-03-01`.
    #[must_use]
    pub fn today_key() -> String {
        format!("recent_requests_{}", Utc::now().format("%Y-%m-%d"))
    }

    #[must_use]
    pub fn calls_today(&self) -> u64 {
        self.cache.counter(&Self::today_key())
    }

    /// Falls back once the day's completed calls exceed the ceiling.
    #[must_use]
    pub fn check_budget(&self) -> Verdict {
        let calls = self.calls_today();
        if calls > self.daily_call_ceiling {
            Verdict::Fallback(FallbackReason::DailyBudgetExceeded {
                calls,
                ceiling: self.daily_call_ceiling,
            })
        } else {
            Verdict::Proceed
        }
    }

    /// Full pre-call check for a rendered prompt of `prompt_chars`
    /// characters: the daily budget first, then the size ceiling.
    #[must_use]
    pub fn should_proceed(&self, prompt_chars: usize) -> Verdict {
        if let Verdict::Fallback(reason) = self.check_budget() {
            return Verdict::Fallback(reason);
        }
        if prompt_chars > self.max_prompt_chars {
            Verdict::Fallback(FallbackReason::PromptTooLarge {
                chars: prompt_chars,
                max: self.max_prompt_chars,
            })
        } else {
            Verdict::Proceed
        }
    }

    /// Counts one completed call against today's budget.
    pub fn record_call(&self) -> u64 {
        let calls = self.cache.increment(&Self::today_key(), DAILY_COUNTER_TTL);
        tracing::debug!(calls, ceiling = self.daily_call_ceiling, "recorded completion call");
        calls
    }
}
