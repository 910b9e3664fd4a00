//! Derived account analysis: balance extraction, account classification
//! and vouching eligibility

use crate::domain::resource::resource_type_index;
use crate::domain::types::{AccountKind, ExtendedData, Resource, VouchingStatus};
use crate::domain::unwrap::{unwrap_value, value_as_u128};

/// Balance in base units from the first coin store, 0 if the account has none.
pub fn extract_balance(resources: &[Resource]) -> u128 {
    resources
        .iter()
        .find(|r| r.type_name.contains("::coin::CoinStore"))
        .and_then(|r| {
            let data = unwrap_value(&r.data);
            data.get("coin").and_then(value_as_u128)
        })
        .unwrap_or(0)
}

fn has_resource(resources: &[Resource], fragment: &str) -> bool {
    resources
        .iter()
        .any(|r| r.type_name.to_ascii_lowercase().contains(fragment))
}

pub fn classify_account(resources: &[Resource]) -> AccountKind {
    if has_resource(resources, "::stake::validatorconfig")
        || has_resource(resources, "::validator_universe::")
    {
        AccountKind::Validator
    } else if has_resource(resources, "::community_wallet::")
        || has_resource(resources, "::donor_voice")
    {
        AccountKind::CommunityWallet
    } else if has_resource(resources, "::slow_wallet::slowwallet") {
        AccountKind::SlowWallet
    } else {
        AccountKind::Regular
    }
}

fn received_vouches(resources: &[Resource]) -> usize {
    resources
        .iter()
        .find(|r| r.type_name.to_ascii_lowercase().contains("::vouch::receivedvouches"))
        .map(|r| unwrap_value(&r.data))
        .and_then(|data| {
            data.get("incoming_vouches")
                .and_then(|v| v.as_array())
                .map(Vec::len)
        })
        .unwrap_or(0)
}

/// Validators can always vouch; other accounts need a vouch registry of
/// their own and must not be community wallets.
pub fn vouching_status(resources: &[Resource], kind: AccountKind) -> VouchingStatus {
    let eligible = match kind {
        AccountKind::Validator => true,
        AccountKind::CommunityWallet => false,
        _ => has_resource(resources, "::vouch::myvouches") || has_resource(resources, "::vouch::givenvouches"),
    };
    VouchingStatus {
        eligible,
        received: received_vouches(resources),
    }
}

pub fn analyze_account(resources: &[Resource]) -> ExtendedData {
    let kind = classify_account(resources);
    ExtendedData {
        kind,
        vouching: vouching_status(resources, kind),
        resource_types: resource_type_index(resources),
    }
}
