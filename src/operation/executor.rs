//! Operation Executor: confirmed operations are validated, dispatched to
//! a kind-specific handler exactly once, and their outcome written back.

use super::store::OperationStore;
use super::types::{
    AnalysisSummary, ExecutionOutcome, Operation, OperationPayload, PaymentPayload,
    PaymentReceipt, RecipientActivity,
};
use super::validator;
use crate::config::PaymentsConfig;
use crate::error::PayrailError;
use crate::recipient::RecipientDirectory;
use crate::transfer::TransferLedger;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

/// Executes confirmed operations. Handles are injected at construction so
/// tests can wire in their own stores.
pub struct OperationExecutor {
    operations: Arc<Mutex<OperationStore>>,
    recipients: Arc<Mutex<RecipientDirectory>>,
    ledger: Arc<Mutex<TransferLedger>>,
    chain: String,
    token: String,
    analysis_window: usize,
}

fn lock<'a, T>(mutex: &'a Arc<Mutex<T>>, what: &str) -> Result<MutexGuard<'a, T>, PayrailError> {
    mutex
        .lock()
        .map_err(|_| PayrailError::Datastore(format!("{} mutex poisoned", what)))
}

impl OperationExecutor {
    pub fn new(
        operations: Arc<Mutex<OperationStore>>,
        recipients: Arc<Mutex<RecipientDirectory>>,
        ledger: Arc<Mutex<TransferLedger>>,
        payments: &PaymentsConfig,
    ) -> Self {
        Self {
            operations,
            recipients,
            ledger,
            chain: payments.default_chain.clone(),
            token: payments.default_token.clone(),
            analysis_window: payments.analysis_window,
        }
    }

    /// Execute a confirmed operation at most once.
    ///
    /// The operation store lock is held across the executed check, the
    /// dispatch, and the terminal write, so the whole thing is one
    /// critical section: concurrent confirmations for the same id
    /// serialize, exactly one dispatches, and the rest observe
    /// "already executed". Dispatch never awaits, so the lock is never
    /// held across a suspension point.
    pub fn execute(
        &self,
        operation_id: &str,
        confirmed_by_user: bool,
    ) -> Result<ExecutionOutcome, PayrailError> {
        let mut operations = lock(&self.operations, "operation store")?;

        let operation = operations
            .get(operation_id)
            .ok_or_else(|| PayrailError::NotFound(format!("Operation {} not found", operation_id)))?;

        if !confirmed_by_user {
            return Err(PayrailError::PreconditionFailed("not confirmed".to_string()));
        }
        if operation.executed {
            return Err(PayrailError::PreconditionFailed(
                "already executed".to_string(),
            ));
        }

        // Precondition, not a handler failure: a payload that fails
        // validation leaves the operation unexecuted.
        validator::validate(&operation.payload)?;

        // Handler errors are captured as a failure outcome and still
        // consume the single-execution slot.
        let outcome = match self.dispatch(&operation) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Operation {} handler failed: {}", operation_id, e);
                ExecutionOutcome::failure(e.to_string())
            }
        };

        operations.complete_execution(operation_id, outcome.clone())?;
        info!(
            "Operation {} ({:?}) executed (success={})",
            operation_id,
            operation.payload.kind(),
            outcome.success
        );
        Ok(outcome)
    }

    fn dispatch(&self, operation: &Operation) -> Result<ExecutionOutcome, PayrailError> {
        match &operation.payload {
            OperationPayload::Payment(payload) => self.execute_payment(operation, payload),
            OperationPayload::Analysis(_) => self.execute_analysis(operation),
            OperationPayload::Query(_) => Ok(ExecutionOutcome::success(serde_json::json!({
                "message": "Acknowledged. Read-only queries are answered by the assistant."
            }))),
        }
    }

    /// Resolve the recipient and record a pending transfer. Settlement is
    /// external: the wallet-holding client finalizes the transaction and
    /// reports back through the ledger's status update path.
    fn execute_payment(
        &self,
        operation: &Operation,
        payload: &PaymentPayload,
    ) -> Result<ExecutionOutcome, PayrailError> {
        // Validated before dispatch, so both fields are present.
        let name = payload.recipient_name.as_deref().unwrap_or("").trim();
        let amount = payload.amount.as_deref().unwrap_or("").trim();

        let directory = lock(&self.recipients, "recipient directory")?;
        let matches = directory.resolve_by_name(&operation.profile_id, name);
        let recipient = match matches.as_slice() {
            [] => {
                return Err(PayrailError::NotFound(format!(
                    "Recipient \"{}\" not found",
                    name
                )))
            }
            [one] => one.clone(),
            _ => {
                return Err(PayrailError::AmbiguousRecipient(format!(
                    "Multiple active recipients match \"{}\"",
                    name
                )))
            }
        };

        let recipient_address = recipient.address.clone().ok_or_else(|| {
            PayrailError::InvalidRecipient(format!(
                "Recipient \"{}\" has no settlement address",
                name
            ))
        })?;

        let transfer = {
            let mut ledger = lock(&self.ledger, "transfer ledger")?;
            ledger.create(
                &directory,
                &operation.profile_id,
                &recipient.id,
                &self.chain,
                amount,
                &self.token,
            )?
        };

        let receipt = PaymentReceipt {
            transaction_id: transfer.id,
            recipient_address,
            amount: transfer.amount,
            status: "pending".to_string(),
            message: format!(
                "Transfer of {} {} to {} recorded. Finalize it in your connected wallet.",
                amount, self.token, recipient.name
            ),
        };
        let value = serde_json::to_value(&receipt)
            .map_err(|e| PayrailError::Datastore(e.to_string()))?;
        Ok(ExecutionOutcome::success(value))
    }

    /// Read-only summary over the profile's recent transfers.
    fn execute_analysis(&self, operation: &Operation) -> Result<ExecutionOutcome, PayrailError> {
        let recent = {
            let ledger = lock(&self.ledger, "transfer ledger")?;
            ledger.recent_for_sender(&operation.profile_id, self.analysis_window)
        };

        let mut total = Decimal::ZERO;
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut first_seen: Vec<String> = Vec::new();
        for transfer in &recent {
            total += Decimal::from_str(&transfer.amount).unwrap_or_default();
            if !counts.contains_key(&transfer.recipient_id) {
                first_seen.push(transfer.recipient_id.clone());
            }
            *counts.entry(transfer.recipient_id.clone()).or_default() += 1;
        }

        let count = recent.len();
        let average = if count == 0 {
            Decimal::ZERO
        } else {
            total / Decimal::from(count)
        };

        // Descending by count; stable sort keeps first-appearance order
        // for ties.
        let mut ranked = first_seen;
        ranked.sort_by(|a, b| counts[b].cmp(&counts[a]));

        let directory = lock(&self.recipients, "recipient directory")?;
        let top_recipients: Vec<RecipientActivity> = ranked
            .into_iter()
            .take(5)
            .map(|recipient_id| RecipientActivity {
                name: directory
                    .get(&recipient_id)
                    .map(|r| r.name.clone())
                    .unwrap_or_else(|| recipient_id.clone()),
                count: counts[&recipient_id],
                recipient_id,
            })
            .collect();

        let summary = AnalysisSummary {
            total_transactions: count,
            total_spent: two_decimals(total),
            average_transaction: two_decimals(average.round_dp(2)),
            top_recipients,
        };
        let value = serde_json::to_value(&summary)
            .map_err(|e| PayrailError::Datastore(e.to_string()))?;
        Ok(ExecutionOutcome::success(value))
    }
}

/// Render with exactly two decimal places, e.g. `60` -> `"60.00"`.
fn two_decimals(value: Decimal) -> String {
    let mut v = value.round_dp(2);
    v.rescale(2);
    v.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::types::{AnalysisPayload, QueryPayload};
    use crate::recipient::{NewRecipient, RecipientClass};

    const ADDR: &str = "0xAbC4000098527886E0F7030069857D2E4169EE70";

    struct Harness {
        operations: Arc<Mutex<OperationStore>>,
        recipients: Arc<Mutex<RecipientDirectory>>,
        ledger: Arc<Mutex<TransferLedger>>,
        executor: OperationExecutor,
    }

    fn harness() -> Harness {
        let operations = Arc::new(Mutex::new(OperationStore::new()));
        let recipients = Arc::new(Mutex::new(RecipientDirectory::new()));
        let ledger = Arc::new(Mutex::new(TransferLedger::new()));
        let executor = OperationExecutor::new(
            operations.clone(),
            recipients.clone(),
            ledger.clone(),
            &PaymentsConfig {
                default_chain: "base".to_string(),
                default_token: "USDC".to_string(),
                analysis_window: 50,
                resolver_endpoint: String::new(),
            },
        );
        Harness {
            operations,
            recipients,
            ledger,
            executor,
        }
    }

    impl Harness {
        fn add_recipient(&self, profile: &str, name: &str, addr: &str) -> String {
            self.recipients
                .lock()
                .unwrap()
                .create(
                    profile,
                    NewRecipient {
                        name: name.to_string(),
                        address: Some(addr.to_string()),
                        class: RecipientClass::Crypto,
                        bank_details: None,
                    },
                )
                .unwrap()
                .id
        }

        fn propose_payment(&self, profile: &str, amount: &str, recipient: &str) -> String {
            let payload = OperationPayload::Payment(PaymentPayload {
                amount: Some(amount.to_string()),
                recipient_name: Some(recipient.to_string()),
            });
            self.operations
                .lock()
                .unwrap()
                .insert(Operation::new(profile, payload))
                .unwrap()
                .id
        }
    }

    #[test]
    fn test_payment_creates_pending_transfer() {
        let h = harness();
        h.add_recipient("p1", "Nik", ADDR);
        let op_id = h.propose_payment("p1", "50", "Nik");

        let outcome = h.executor.execute(&op_id, true).unwrap();
        assert!(outcome.success);
        let result = outcome.result.unwrap();
        assert_eq!(
            result["recipientAddress"],
            ADDR.to_lowercase()
        );
        assert_eq!(result["amount"], "50");
        assert_eq!(result["status"], "pending");

        let transfer_id = result["transactionId"].as_str().unwrap().to_string();
        let ledger = h.ledger.lock().unwrap();
        let transfer = ledger.get(&transfer_id).unwrap();
        assert_eq!(transfer.status, crate::transfer::TransferStatus::Pending);
        assert_eq!(transfer.chain, "base");
        assert_eq!(transfer.token, "USDC");

        let op = h.operations.lock().unwrap().get(&op_id).unwrap();
        assert!(op.executed);
        assert!(op.user_confirmed);
    }

    #[test]
    fn test_unknown_recipient_recorded_as_executed_failure() {
        let h = harness();
        let op_id = h.propose_payment("p1", "50", "Nik");

        let outcome = h.executor.execute(&op_id, true).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Recipient \"Nik\" not found"));

        // Failure still consumes the single-execution slot
        let op = h.operations.lock().unwrap().get(&op_id).unwrap();
        assert!(op.executed);
        assert!(!op.execution_result.unwrap().success);
    }

    #[test]
    fn test_ambiguous_recipient_is_an_error_not_first_match() {
        let h = harness();
        h.add_recipient("p1", "Nik North", ADDR);
        h.add_recipient("p1", "Nik South", "0xde709f2102306220921060314715629080e2fb77");
        let op_id = h.propose_payment("p1", "50", "Nik");

        let outcome = h.executor.execute(&op_id, true).unwrap();
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().starts_with("Ambiguous recipient"));
        assert!(h.ledger.lock().unwrap().recent_for_sender("p1", 10).is_empty());
    }

    #[test]
    fn test_not_confirmed_and_missing_operation() {
        let h = harness();
        assert!(matches!(
            h.executor.execute("missing", true),
            Err(PayrailError::NotFound(_))
        ));

        h.add_recipient("p1", "Nik", ADDR);
        let op_id = h.propose_payment("p1", "50", "Nik");
        let err = h.executor.execute(&op_id, false).unwrap_err();
        assert_eq!(err, PayrailError::PreconditionFailed("not confirmed".to_string()));

        // Rejection left the operation unexecuted
        assert!(!h.operations.lock().unwrap().get(&op_id).unwrap().executed);
    }

    #[test]
    fn test_validation_failure_does_not_consume_slot() {
        let h = harness();
        let op_id = h.propose_payment("p1", "-5", "Nik");

        let err = h.executor.execute(&op_id, true).unwrap_err();
        assert_eq!(err, PayrailError::Validation("Invalid payment amount".to_string()));
        assert!(!h.operations.lock().unwrap().get(&op_id).unwrap().executed);
    }

    #[test]
    fn test_second_execution_observes_already_executed() {
        let h = harness();
        h.add_recipient("p1", "Nik", ADDR);
        let op_id = h.propose_payment("p1", "50", "Nik");

        h.executor.execute(&op_id, true).unwrap();
        let err = h.executor.execute(&op_id, true).unwrap_err();
        assert_eq!(err, PayrailError::PreconditionFailed("already executed".to_string()));
    }

    #[test]
    fn test_concurrent_confirmations_execute_exactly_once() {
        let h = harness();
        h.add_recipient("p1", "Nik", ADDR);
        let op_id = h.propose_payment("p1", "50", "Nik");

        let executor = Arc::new(h.executor);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let executor = executor.clone();
            let op_id = op_id.clone();
            handles.push(std::thread::spawn(move || executor.execute(&op_id, true)));
        }

        let mut successes = 0;
        let mut already = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(outcome) => {
                    assert!(outcome.success);
                    successes += 1;
                }
                Err(PayrailError::PreconditionFailed(msg)) => {
                    assert_eq!(msg, "already executed");
                    already += 1;
                }
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(already, 7);

        // Exactly one transfer was created
        assert_eq!(h.ledger.lock().unwrap().recent_for_sender("p1", 10).len(), 1);
    }

    #[test]
    fn test_analysis_summary() {
        let h = harness();
        let nik = h.add_recipient("p1", "Nik", ADDR);
        let ana = h.add_recipient(
            "p1",
            "Ana",
            "0xde709f2102306220921060314715629080e2fb77",
        );
        {
            let dir = h.recipients.lock().unwrap();
            let mut ledger = h.ledger.lock().unwrap();
            ledger.create(&dir, "p1", &nik, "base", "10", "USDC").unwrap();
            ledger.create(&dir, "p1", &nik, "base", "20", "USDC").unwrap();
            ledger.create(&dir, "p1", &ana, "base", "30", "USDC").unwrap();
        }

        let op_id = {
            let payload = OperationPayload::Analysis(AnalysisPayload::default());
            h.operations
                .lock()
                .unwrap()
                .insert(Operation::new("p1", payload))
                .unwrap()
                .id
        };

        let outcome = h.executor.execute(&op_id, true).unwrap();
        assert!(outcome.success);
        let result = outcome.result.unwrap();
        assert_eq!(result["totalTransactions"], 3);
        assert_eq!(result["totalSpent"], "60.00");
        assert_eq!(result["averageTransaction"], "20.00");

        let top = result["topRecipients"].as_array().unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0]["name"], "Nik");
        assert_eq!(top[0]["count"], 2);
        assert_eq!(top[1]["name"], "Ana");
        assert_eq!(top[1]["count"], 1);
    }

    #[test]
    fn test_query_is_a_noop_acknowledgement() {
        let h = harness();
        let op_id = {
            let payload = OperationPayload::Query(QueryPayload::default());
            h.operations
                .lock()
                .unwrap()
                .insert(Operation::new("p1", payload))
                .unwrap()
                .id
        };
        let outcome = h.executor.execute(&op_id, true).unwrap();
        assert!(outcome.success);
        // Read-only: nothing was written
        assert!(h.ledger.lock().unwrap().recent_for_sender("p1", 10).is_empty());
    }
}
