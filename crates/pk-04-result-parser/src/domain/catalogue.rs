//! SKU details and trial eligibility payloads. These are not signed.

use shared_types::{BillingError, RawSkuDetailsList, RawTrialResult, SkuDetails, TrialSubscriptionInfo};

pub fn decode_sku_details(raw: &RawSkuDetailsList) -> Result<Vec<SkuDetails>, BillingError> {
    let code = raw.code();
    if !code.is_ok() {
        return Err(BillingError::ResultNotOkay { code });
    }
    raw.details_list
        .iter()
        .map(|entry| {
            serde_json::from_str::<SkuDetails>(entry).map_err(|e| BillingError::InvalidData {
                reason: format!("sku details entry is invalid: {e}"),
            })
        })
        .collect()
}

pub fn decode_trial(raw: &RawTrialResult) -> Result<TrialSubscriptionInfo, BillingError> {
    let code = raw.code();
    if !code.is_ok() {
        return Err(BillingError::ResultNotOkay { code });
    }
    let data = raw.trial_data.as_deref().ok_or_else(|| BillingError::InvalidData {
        reason: "trial result has no data".to_string(),
    })?;
    serde_json::from_str(data).map_err(|e| BillingError::InvalidData {
        reason: format!("trial data is invalid: {e}"),
    })
}
