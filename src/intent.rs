// ABOUTME: Keyword classification of billing and refund intent in customer text
// ABOUTME: Shared by the rule-based reply generator and automatic CRM capture
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 VoxLoom

use voxloom_core::constants::scenarios::{INTENT_BILLING_EXPLANATION, INTENT_REFUND};

const REFUND_KEYWORDS: [&str; 2] = ["refund", "money back"];
const BILLING_KEYWORDS: [&str; 5] = ["bill", "charge", "amount", "invoice", "fee"];

/// Billing-related intent detected in a customer message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingIntent {
    /// Customer wants money returned
    Refund,
    /// Customer asks about bill contents or charges
    BillExplanation,
}

impl BillingIntent {
    /// Intent tag recorded on CRM records
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Refund => INTENT_REFUND,
            Self::BillExplanation => INTENT_BILLING_EXPLANATION,
        }
    }

    /// CRM priority for this intent
    #[must_use]
    pub const fn priority(self) -> &'static str {
        match self {
            Self::Refund => "high",
            Self::BillExplanation => "normal",
        }
    }
}

/// Classify text; refund wins over a plain billing question
#[must_use]
pub fn classify_billing_intent(text: &str) -> Option<BillingIntent> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        None
    } else if REFUND_KEYWORDS.iter().any(|k| text.contains(k)) {
        Some(BillingIntent::Refund)
    } else if BILLING_KEYWORDS.iter().any(|k| text.contains(k)) {
        Some(BillingIntent::BillExplanation)
    } else {
        None
    }
}
