use futures::future::BoxFuture;

use super::accepted_at_minimum;
use crate::{
    constant::INSUFFICIENT_FEE_MARKER,
    runner::{Expectation, ScenarioContext, ScenarioError},
    types::{DataEntry, Operation, TransactionRequest},
};

const DATA_KEY: &str = "test";

fn data(entries: Vec<DataEntry>) -> TransactionRequest {
    TransactionRequest::new(Operation::Data { entries })
}

pub fn data_transaction(ctx: &mut ScenarioContext) -> BoxFuture<'_, Result<(), ScenarioError>> {
    Box::pin(async move {
        let previous = ctx.data_entry(DATA_KEY).await?;
        let rejected = DataEntry::string(DATA_KEY, "testval");

        ctx.step(
            "data with default fee",
            data(vec![rejected.clone()]),
            Expectation::insufficient_fee().with_message(INSUFFICIENT_FEE_MARKER),
        )
        .await?;

        let entry = DataEntry::string(
            DATA_KEY,
            &format!("testval {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.6f")),
        );
        ctx.check(
            "fresh data value",
            entry != rejected && previous.as_ref() != Some(&entry),
            "a value neither stored before nor sent with the default fee",
            &format!("{entry:?}"),
        );

        let entries = vec![entry.clone()];
        let fee = ctx.fees().data(&entries);
        let step = format!("data @ {fee}");
        let tx = ctx.step(&step, data(entries).with_fee(fee), Expectation::success()).await?;
        let tx = accepted_at_minimum(&step, tx)?;

        ctx.await_transaction(&tx.id).await?;
        let stored = ctx.data_entry(DATA_KEY).await?;
        ctx.check(
            "stored data value",
            stored.as_ref() == Some(&entry),
            &format!("{entry:?}"),
            &format!("{stored:?}"),
        );
        ctx.check(
            "data value replaced",
            stored != previous,
            &format!("a value other than {previous:?}"),
            &format!("{stored:?}"),
        );
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        runner::{ScenarioRunner, ScenarioStatus, SuiteEnvironment},
        scenarios::find,
        service::MockTransactionService,
        tests::service_mock::{accepted, fee_gated_service, low_fee_rejection},
        types::{RejectionStage, TransactionResult, TransactionStatus},
    };
    use parking_lot::Mutex;
    use std::sync::Arc;

    async fn run(mock: MockTransactionService) -> ScenarioStatus {
        let env = SuiteEnvironment::from_config(&Config::for_simulation(), Arc::new(mock)).unwrap();
        let mut runner = ScenarioRunner::new(env);
        runner.run_scenario(&find("data_transaction").unwrap()).await.status
    }

    fn confirming(mut mock: MockTransactionService) -> MockTransactionService {
        mock.expect_transaction_status()
            .returning(|_| Ok(TransactionStatus::Confirmed { height: 1 }));
        mock
    }

    #[tokio::test]
    async fn test_stale_data_value_fails() {
        let mut mock = confirming(fee_gated_service(2_000_000, false));
        mock.expect_data_entry()
            .returning(|_, _| Ok(Some(DataEntry::string(DATA_KEY, "testval"))));

        match run(mock).await {
            ScenarioStatus::Failed(failures) => {
                let steps: Vec<_> = failures.iter().map(|f| f.step.as_str()).collect();
                assert_eq!(steps, ["stored data value", "data value replaced"]);
            }
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_written_data_value_passes() {
        let stored: Arc<Mutex<Option<DataEntry>>> = Arc::new(Mutex::new(None));
        let mut mock = confirming(MockTransactionService::new());
        let written = stored.clone();
        mock.expect_submit().returning(move |_, request| {
            let fee = request.effective_fee();
            if fee < 2_000_000 {
                return Ok(TransactionResult::Rejected(low_fee_rejection(RejectionStage::ByService)));
            }
            if let Operation::Data { entries } = &request.operation {
                *written.lock() = entries.first().cloned();
            }
            Ok(accepted("data-1", fee))
        });
        mock.expect_data_entry().returning(move |_, _| Ok(stored.lock().clone()));
        mock.expect_raises_on_service_error().return_const(false);

        assert_eq!(run(mock).await, ScenarioStatus::Passed);
    }
}
