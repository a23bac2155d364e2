// ABOUTME: Keyword rule reply generator for billing and refund conversations
// ABOUTME: Deterministic, offline replacement for a hosted language model
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use async_trait::async_trait;
use voxloom_core::constants::model_ids::RULE_BASED_REPLY;
use voxloom_core::constants::transcripts::EMPTY_TRANSCRIPT;
use voxloom_core::errors::CapabilityError;

use super::{ReplyContext, ReplyGenerator};
use crate::intent::{classify_billing_intent, BillingIntent};

const ASK_TO_REPEAT: &str = "I couldn't clearly understand the audio. \
    Could you please repeat your question about your bill or refund?";

const REFUND_REPLY: &str = "I understand you'd like a refund for your recent bill. \
    I've marked this as a refund request with high priority. \
    You'll receive an update on the refund status within 3-5 business days.";

const BILL_REPLY: &str = "I can help explain your bill. \
    Your latest invoice usually includes your base plan, taxes, \
    and any extra usage or late fees. \
    If you'd like, I can break down the charges for the last billing cycle.";

const FALLBACK_REPLY: &str = "Thanks for your question. \
    I've logged your request and linked it to your account. \
    Someone from the billing team will review it and get back to you soon.";

/// Reply generator driven by keyword rules
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedReplyGenerator;

impl RuleBasedReplyGenerator {
    /// Pick the reply for a piece of customer text
    #[must_use]
    pub fn reply_for(text: &str) -> &'static str {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == EMPTY_TRANSCRIPT {
            return ASK_TO_REPEAT;
        }
        match classify_billing_intent(trimmed) {
            Some(BillingIntent::Refund) => REFUND_REPLY,
            Some(BillingIntent::BillExplanation) => BILL_REPLY,
            None => FALLBACK_REPLY,
        }
    }
}

#[async_trait]
impl ReplyGenerator for RuleBasedReplyGenerator {
    fn model_id(&self) -> &str {
        RULE_BASED_REPLY
    }

    async fn generate_reply(&self, context: &ReplyContext) -> Result<String, CapabilityError> {
        Ok(Self::reply_for(&context.user_text).to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_rules() {
        assert!(RuleBasedReplyGenerator::reply_for("I want my money back").contains("refund"));
        assert!(RuleBasedReplyGenerator::reply_for("what is this invoice").starts_with("I can help explain"));
        assert!(RuleBasedReplyGenerator::reply_for("hello").starts_with("Thanks for your question"));
    }

    #[test]
    fn test_empty_or_failed_transcript_asks_to_repeat() {
        assert_eq!(RuleBasedReplyGenerator::reply_for("  "), ASK_TO_REPEAT);
        assert_eq!(RuleBasedReplyGenerator::reply_for(EMPTY_TRANSCRIPT), ASK_TO_REPEAT);
    }
}
