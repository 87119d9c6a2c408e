//! # Result Parser Service
//!
//! ## Pipeline (single result)
//!
//! 1. Non-OK response code: `ResultNotOkay`. Payload fields are not read.
//! 2. Missing purchase data or signature: `InvalidData`.
//! 3. Security check enabled: verify. A structural fault is
//!    `VerificationError`; a mismatch is `PurchaseHijacked`.
//! 4. Decode the purchase data into `PurchaseInfo`.
//!
//! Batch and retry variants run this pipeline per item, and every retry
//! verifies again from scratch.

use crate::domain::catalogue::{decode_sku_details, decode_trial};
use crate::domain::purchase::PurchaseInfo;
use crate::ports::inbound::ResultParserApi;
use billing_telemetry::metrics::PURCHASE_HIJACKS;
use pk_02_retry_policy::Backoff;
use pk_03_signature_verification::{
    SignatureVerificationApi, SignatureVerificationService, VerificationMode,
};
use rayon::prelude::*;
use shared_types::{
    BillingError, Operation, RawPurchaseList, RawResult, RawSkuDetailsList, RawTrialResult,
    SecurityCheck, SkuDetails, TrialSubscriptionInfo,
};
use std::future::Future;
use tracing::{debug, error};

/// Parses and verifies raw results.
pub struct ResultParser<V = SignatureVerificationService> {
    verifier: V,
    security: SecurityCheck,
    mode: VerificationMode,
}

impl ResultParser<SignatureVerificationService> {
    pub fn new(security: SecurityCheck) -> Self {
        Self::with_verifier(SignatureVerificationService::new(), security)
    }
}

impl<V: SignatureVerificationApi> ResultParser<V> {
    pub fn with_verifier(verifier: V, security: SecurityCheck) -> Self {
        Self {
            verifier,
            security,
            mode: VerificationMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: VerificationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn security_check(&self) -> &SecurityCheck {
        &self.security
    }

    pub fn mode(&self) -> VerificationMode {
        self.mode
    }

    fn check_signature(&self, data: &str, signature: &str) -> Result<(), BillingError> {
        let SecurityCheck::Enabled { public_key } = &self.security else {
            return Ok(());
        };
        let result = self
            .verifier
            .verify_with_mode(public_key, data, signature, self.mode)
            .map_err(|e| BillingError::VerificationError { reason: e.to_string() })?;
        if result.success {
            debug!(algorithm = ?result.algorithm, "Purchase signature accepted");
            return Ok(());
        }
        PURCHASE_HIJACKS.inc();
        error!(data_len = data.len(), "Purchase signature mismatch, rejecting purchase");
        Err(BillingError::PurchaseHijacked)
    }

    /// Fetch and parse a single result, retrying with `backoff`.
    ///
    /// `fetch` is called once per attempt and its result is verified again
    /// each time.
    pub async fn parse_with_retry<F, Fut>(
        &self,
        backoff: &mut Backoff,
        operation: Operation,
        mut fetch: F,
    ) -> Result<PurchaseInfo, BillingError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<RawResult, BillingError>>,
    {
        backoff
            .run(operation, |attempt| {
                let fetched = fetch(attempt);
                async move { self.parse(&fetched.await?) }
            })
            .await
    }

    /// Page variant of [`parse_with_retry`](Self::parse_with_retry).
    pub async fn parse_list_with_retry<F, Fut>(
        &self,
        backoff: &mut Backoff,
        operation: Operation,
        mut fetch: F,
    ) -> Result<(Vec<PurchaseInfo>, Option<String>), BillingError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<RawPurchaseList, BillingError>>,
    {
        backoff
            .run(operation, |attempt| {
                let fetched = fetch(attempt);
                async move {
                    let page = fetched.await?;
                    let purchases = self.parse_purchase_list(&page)?;
                    Ok((purchases, page.continuation_token))
                }
            })
            .await
    }
}

impl<V: SignatureVerificationApi> ResultParserApi for ResultParser<V> {
    fn parse(&self, raw: &RawResult) -> Result<PurchaseInfo, BillingError> {
        let code = raw.code();
        if !code.is_ok() {
            return Err(BillingError::ResultNotOkay { code });
        }
        let (Some(data), Some(signature)) = (raw.purchase_data.as_deref(), raw.data_signature.as_deref())
        else {
            return Err(BillingError::InvalidData {
                reason: "result has no purchase data or signature".to_string(),
            });
        };
        self.check_signature(data, signature)?;
        PurchaseInfo::decode(data, signature)
    }

    fn parse_batch(&self, raws: &[RawResult]) -> Result<Vec<PurchaseInfo>, BillingError> {
        let parsed: Vec<Result<PurchaseInfo, BillingError>> =
            raws.par_iter().map(|raw| self.parse(raw)).collect();
        parsed.into_iter().collect()
    }

    fn parse_purchase_list(&self, page: &RawPurchaseList) -> Result<Vec<PurchaseInfo>, BillingError> {
        let code = page.code();
        if !code.is_ok() {
            return Err(BillingError::ResultNotOkay { code });
        }
        self.parse_batch(&page.items())
    }

    fn parse_sku_details(&self, raw: &RawSkuDetailsList) -> Result<Vec<SkuDetails>, BillingError> {
        decode_sku_details(raw)
    }

    fn parse_trial(&self, raw: &RawTrialResult) -> Result<TrialSubscriptionInfo, BillingError> {
        decode_trial(raw)
    }
}
