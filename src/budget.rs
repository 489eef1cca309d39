//! Token-budget guard between workflow runs. Exceeding the budget is not an
//! error: the process cools down and stops cleanly with a zero exit code.
use std::time::Duration;

use serde::Serialize;

use crate::llm::TokenUsage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BudgetStatus {
    /// The run result carried no usage record; nothing to enforce.
    NoUsageReported,
    WithinBudget { total: u64 },
    Exhausted { total: u64, limit: u64 },
}

#[derive(Debug, Clone)]
pub struct TokenBudget {
    limit: u64,
    cooldown: Duration,
}

impl TokenBudget {
    pub fn new(limit: u64, cooldown: Duration) -> Self {
        Self { limit, cooldown }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn evaluate(&self, usage: Option<&TokenUsage>) -> BudgetStatus {
        match usage {
            None => BudgetStatus::NoUsageReported,
            Some(usage) if usage.total_tokens >= self.limit => BudgetStatus::Exhausted {
                total: usage.total_tokens,
                limit: self.limit,
            },
            Some(usage) => BudgetStatus::WithinBudget {
                total: usage.total_tokens,
            },
        }
    }

    /// Apply the budget after a run. Within budget (or with no usage record)
    /// this returns normally; an exhausted budget sleeps for the cooldown and
    /// terminates the process with a zero exit code.
    pub async fn enforce(&self, usage: Option<&TokenUsage>) {
        match self.evaluate(usage) {
            BudgetStatus::NoUsageReported => {
                tracing::warn!("no token usage info found in result");
            }
            BudgetStatus::WithinBudget { total } => {
                tracing::debug!(total, limit = self.limit, "token usage within budget");
            }
            BudgetStatus::Exhausted { total, limit } => {
                println!("\nTOKEN LIMIT ALERT!");
                println!("Token usage reached {total} (limit {limit}).");
                println!("Stopping further runs to avoid provider rate limits.");
                println!("Cooling down for {} seconds...", self.cooldown.as_secs());
                tokio::time::sleep(self.cooldown).await;
                // Deliberate early termination, not a failure.
                std::process::exit(0);
            }
        }
    }
}
