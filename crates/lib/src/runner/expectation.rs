use std::fmt;

use crate::{
    classify::Classification,
    types::{RejectionStage, TransactionResult},
};

/// What a step expects the service to answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub classification: Classification,
    /// Only checked for rejections, and only when set.
    pub stage: Option<RejectionStage>,
    pub message_contains: Option<String>,
}

impl Expectation {
    fn of(classification: Classification) -> Self {
        Self { classification, stage: None, message_contains: None }
    }

    pub fn success() -> Self {
        Self::of(Classification::Success)
    }

    pub fn insufficient_fee() -> Self {
        Self::of(Classification::InsufficientFee)
    }

    pub fn validation_error() -> Self {
        Self::of(Classification::ValidationError)
    }

    pub fn pre_submit(mut self) -> Self {
        self.stage = Some(RejectionStage::PreSubmit);
        self
    }

    pub fn with_message(mut self, fragment: &str) -> Self {
        self.message_contains = Some(fragment.to_string());
        self
    }

    pub fn expects_success(&self) -> bool {
        self.classification == Classification::Success
    }

    /// Returns a description of the actual outcome when it does not match.
    pub fn check(&self, result: &TransactionResult) -> Result<(), String> {
        let actual = describe(result);
        if result.classification() != self.classification {
            return Err(actual);
        }

        if let Some(rejection) = result.rejection() {
            if self.stage.is_some_and(|stage| stage != rejection.stage) {
                return Err(actual);
            }
            if let Some(fragment) = &self.message_contains {
                if !rejection.message.contains(fragment.as_str()) {
                    return Err(actual);
                }
            }
        }

        Ok(())
    }
}

fn describe(result: &TransactionResult) -> String {
    match result {
        TransactionResult::Accepted(tx) => format!("SUCCESS (id {})", tx.id),
        TransactionResult::Rejected(rejection) => format!(
            "{} {}: {}",
            rejection.classification, rejection.stage, rejection.message
        ),
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.classification)?;
        if let Some(stage) = self.stage {
            write!(f, " {stage}")?;
        }
        if let Some(fragment) = &self.message_contains {
            write!(f, " containing \"{fragment}\"")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AcceptedTransaction, AssetRef, Rejection};
    use serde_json::json;

    fn rejection(stage: RejectionStage, message: &str) -> TransactionResult {
        TransactionResult::Rejected(Rejection {
            stage,
            classification: Classification::ValidationError,
            code: Some(199),
            message: message.to_string(),
        })
    }

    #[test]
    fn test_success_matches_accepted() {
        let accepted = TransactionResult::Accepted(AcceptedTransaction {
            id: "tx".to_string(),
            asset_id: None,
            fee: 2_000_000,
            fee_asset: AssetRef::Native,
            raw: json!({}),
        });
        assert!(Expectation::success().check(&accepted).is_ok());
        assert_eq!(Expectation::insufficient_fee().check(&accepted).unwrap_err(), "SUCCESS (id tx)");
    }

    #[test]
    fn test_stage_and_message_are_checked() {
        let result = rejection(RejectionStage::ByService, "length should be between 4 and 30");
        let expected = Expectation::validation_error().with_message("length should be between");
        assert!(expected.check(&result).is_ok());
        assert!(expected.clone().pre_submit().check(&result).is_err());
        assert!(Expectation::validation_error().with_message("other").check(&result).is_err());
    }

    #[test]
    fn test_display() {
        let expected = Expectation::insufficient_fee().pre_submit();
        assert_eq!(expected.to_string(), "INSUFFICIENT_FEE rejected pre-submit");
    }
}
