//! Core data models for credential checking.
//!
//! A batch is a list of [`CredentialTask`]s, one per input line. Verifiers
//! produce a [`VerificationResult`], which is folded into the owning task
//! exactly once.

use serde::{Deserialize, Serialize};

use super::provider::Provider;

// =============================================================================
// Task Status
// =============================================================================

/// Lifecycle state of a task.
///
/// Transitions only move forward: `Pending -> Checking -> Valid | Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Checking,
    Valid,
    Invalid,
}

impl TaskStatus {
    /// Sort priority; lower sorts first.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Valid => 0,
            Self::Invalid => 1,
            Self::Checking => 2,
            Self::Pending => 3,
        }
    }

    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Valid | Self::Invalid)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Checking => "checking",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Balances
// =============================================================================

/// Secondary balance components reported by some providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubBalances {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gift: Option<f64>,
}

// =============================================================================
// Verification Result
// =============================================================================

/// Outcome of a single verifier call.
///
/// Verifiers never return errors; failures are `success == false` with a
/// message suitable for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub success: bool,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_paid: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_balance: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gift_balance: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

impl VerificationResult {
    /// A successful probe.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Self::default()
        }
    }

    /// A failed probe.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_paid(mut self, paid: bool) -> Self {
        self.is_paid = Some(paid);
        self
    }

    #[must_use]
    pub fn with_tier(mut self, tier: Option<String>) -> Self {
        self.tier = tier;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_used = Some(model.into());
        self
    }

    /// Attach a balance snapshot.
    #[must_use]
    pub fn with_balance(mut self, balance: BalanceInfo) -> Self {
        self.balance = balance.total;
        self.charge_balance = balance.charge;
        self.gift_balance = balance.gift;
        self.currency = balance.currency;
        self
    }
}

/// Balance snapshot as returned by a provider's billing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gift: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

// =============================================================================
// Credential Task
// =============================================================================

/// One candidate credential and its verification state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialTask {
    /// 0-based position in the input.
    pub index: usize,
    pub raw_value: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,

    pub status: TaskStatus,
    pub result_message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_paid: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,

    #[serde(default)]
    pub sub_balances: SubBalances,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

impl CredentialTask {
    #[must_use]
    pub fn new(index: usize, raw_value: impl Into<String>, provider: Option<Provider>) -> Self {
        Self {
            index,
            raw_value: raw_value.into(),
            provider,
            status: TaskStatus::Pending,
            result_message: String::new(),
            is_paid: None,
            tier: None,
            balance: None,
            sub_balances: SubBalances::default(),
            currency: None,
            model_used: None,
        }
    }

    /// Move `Pending -> Checking`. Returns `false` if the task already left
    /// `Pending`.
    pub fn mark_checking(&mut self) -> bool {
        if self.status != TaskStatus::Pending {
            tracing::warn!(
                index = self.index,
                status = %self.status,
                "Refusing transition to checking"
            );
            return false;
        }
        self.status = TaskStatus::Checking;
        true
    }

    /// Fold a verification result into a checking task. Returns `false`
    /// for a pending or already finished task.
    pub fn mark_finished(&mut self, result: VerificationResult) -> bool {
        match self.status {
            TaskStatus::Checking => {}
            TaskStatus::Pending => {
                tracing::warn!(index = self.index, "Refusing completion of unchecked task");
                return false;
            }
            TaskStatus::Valid | TaskStatus::Invalid => {
                tracing::warn!(
                    index = self.index,
                    status = %self.status,
                    "Refusing second completion"
                );
                return false;
            }
        }
        self.status = if result.success {
            TaskStatus::Valid
        } else {
            TaskStatus::Invalid
        };
        self.result_message = result.message;
        self.is_paid = result.is_paid;
        self.tier = result.tier;
        self.balance = result.balance;
        self.sub_balances = SubBalances {
            charge: result.charge_balance,
            gift: result.gift_balance,
        };
        self.currency = result.currency;
        self.model_used = result.model_used;
        true
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self.status, TaskStatus::Valid)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn status_priority_order() {
        let mut all = [
            TaskStatus::Pending,
            TaskStatus::Invalid,
            TaskStatus::Checking,
            TaskStatus::Valid,
        ];
        all.sort_by_key(|s| s.priority());
        assert_eq!(
            all,
            [
                TaskStatus::Valid,
                TaskStatus::Invalid,
                TaskStatus::Checking,
                TaskStatus::Pending
            ]
        );
    }

    #[traced_test]
    #[test]
    fn transitions_only_move_forward() {
        let mut task = CredentialTask::new(0, "sk-x", Some(Provider::OpenAI));
        assert!(task.mark_checking());
        assert!(!task.mark_checking());
        assert!(task.mark_finished(VerificationResult::ok("ok").with_paid(true)));
        assert_eq!(task.status, TaskStatus::Valid);
        assert!(!task.mark_finished(VerificationResult::fail("late")));
        assert_eq!(task.result_message, "ok");
        assert!(!task.mark_checking());
        assert!(logs_contain("Refusing second completion"));
    }

    #[traced_test]
    #[test]
    fn pending_task_cannot_finish() {
        let mut task = CredentialTask::new(1, "sk-z", Some(Provider::Groq));
        assert!(!task.mark_finished(VerificationResult::ok("too early")));
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.result_message.is_empty());
        assert!(logs_contain("Refusing completion of unchecked task"));

        assert!(task.mark_checking());
        assert!(task.mark_finished(VerificationResult::fail("checked")));
        assert_eq!(task.status, TaskStatus::Invalid);
    }

    #[test]
    fn finish_copies_balances() {
        let mut task = CredentialTask::new(3, "sk-y", Some(Provider::Deepseek));
        task.mark_checking();
        let result = VerificationResult::ok("valid").with_balance(BalanceInfo {
            total: Some(10.5),
            charge: Some(8.0),
            gift: Some(2.5),
            currency: Some("CNY".to_string()),
        });
        task.mark_finished(result);
        assert_eq!(task.balance, Some(10.5));
        assert_eq!(task.sub_balances.charge, Some(8.0));
        assert_eq!(task.sub_balances.gift, Some(2.5));
        assert_eq!(task.currency.as_deref(), Some("CNY"));
    }

    #[test]
    fn task_serializes_camel_case() {
        let task = CredentialTask::new(1, "abc", None);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["rawValue"], "abc");
        assert_eq!(json["status"], "pending");
        assert!(json.get("provider").is_none());
    }
}
