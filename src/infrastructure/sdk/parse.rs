//! Conversions from node REST JSON to domain types
//!
//! Numbers arrive as decimal strings. Unknown fields are ignored and
//! missing optional fields become `None`, so the same parser handles user,
//! block-metadata, state-checkpoint and pending transactions.

use serde_json::Value;

use crate::core::ClientError;
use crate::domain::unwrap::value_as_u64;
use crate::domain::{AccountInfo, LedgerInfo, Resource, Transaction, TransactionDetail, TxStatus};

fn field_u64(json: &Value, key: &str) -> Option<u64> {
    json.get(key).and_then(value_as_u64)
}

fn field_str(json: &Value, key: &str) -> Option<String> {
    json.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn required_u64(json: &Value, key: &str) -> Result<u64, ClientError> {
    field_u64(json, key).ok_or_else(|| ClientError::Decode(format!("missing or invalid `{key}`")))
}

pub fn parse_ledger_info(json: &Value) -> Result<LedgerInfo, ClientError> {
    let chain_id = match json.get("chain_id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => return Err(ClientError::Decode("missing `chain_id`".into())),
    };
    Ok(LedgerInfo {
        chain_id,
        epoch: required_u64(json, "epoch")?,
        block_height: required_u64(json, "block_height")?,
        ledger_version: required_u64(json, "ledger_version")?,
        ledger_timestamp_us: field_u64(json, "ledger_timestamp").unwrap_or(0),
    })
}

/// List-view transaction; `None` when the entry has no hash.
pub fn parse_transaction(json: &Value) -> Option<Transaction> {
    let hash = field_str(json, "hash")?.to_ascii_lowercase();
    let tx_type = field_str(json, "type").unwrap_or_else(|| "unknown".to_string());
    let status = if tx_type == "pending_transaction" {
        TxStatus::Pending
    } else {
        match json.get("success").and_then(Value::as_bool) {
            Some(true) => TxStatus::Success,
            Some(false) => TxStatus::Failure,
            None => TxStatus::Pending,
        }
    };

    Some(Transaction {
        hash,
        version: field_u64(json, "version").unwrap_or(0),
        sender: field_str(json, "sender"),
        sequence_number: field_u64(json, "sequence_number"),
        timestamp_us: field_u64(json, "timestamp").unwrap_or(0),
        tx_type,
        status,
        gas_used: field_u64(json, "gas_used").unwrap_or(0),
        gas_unit_price: field_u64(json, "gas_unit_price").unwrap_or(0),
        block_height: field_u64(json, "block_height"),
    })
}

pub fn parse_transactions(json: &Value) -> Result<Vec<Transaction>, ClientError> {
    let items = json
        .as_array()
        .ok_or_else(|| ClientError::Decode("expected a transaction array".into()))?;
    let mut txs: Vec<Transaction> = items.iter().filter_map(parse_transaction).collect();
    txs.sort_by(|a, b| b.version.cmp(&a.version));
    Ok(txs)
}

pub fn parse_transaction_detail(json: &Value) -> Result<TransactionDetail, ClientError> {
    let summary =
        parse_transaction(json).ok_or_else(|| ClientError::Decode("transaction without hash".into()))?;
    let list = |key: &str| {
        json.get(key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };

    Ok(TransactionDetail {
        vm_status: field_str(json, "vm_status").unwrap_or_default(),
        epoch: field_u64(json, "epoch"),
        round: field_u64(json, "round"),
        state_change_hash: field_str(json, "state_change_hash"),
        event_root_hash: field_str(json, "event_root_hash"),
        accumulator_root_hash: field_str(json, "accumulator_root_hash"),
        events: list("events"),
        changes: list("changes"),
        payload: json.get("payload").cloned().unwrap_or(Value::Null),
        summary,
    })
}

pub fn parse_resources(json: &Value) -> Result<Vec<Resource>, ClientError> {
    let items = json
        .as_array()
        .ok_or_else(|| ClientError::Decode("expected a resource array".into()))?;
    Ok(items
        .iter()
        .filter_map(|item| {
            let type_name = field_str(item, "type")?;
            let data = item.get("data").cloned().unwrap_or(Value::Null);
            Some(Resource { type_name, data })
        })
        .collect())
}

pub fn parse_account_info(json: &Value) -> Result<AccountInfo, ClientError> {
    Ok(AccountInfo {
        sequence_number: required_u64(json, "sequence_number")?,
        authentication_key: field_str(json, "authentication_key"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ledger_info_from_strings() {
        let ledger = parse_ledger_info(&json!({
            "chain_id": 1,
            "epoch": "97",
            "ledger_version": "123456",
            "block_height": "4567",
            "ledger_timestamp": "1700000000000000",
            "node_role": "full_node"
        }))
        .unwrap();
        assert_eq!(ledger.chain_id, "1");
        assert_eq!(ledger.epoch, 97);
        assert_eq!(ledger.block_height, 4567);
        assert_eq!(ledger.ledger_timestamp_us, 1_700_000_000_000_000);
    }

    #[test]
    fn ledger_info_without_height_is_decode_error() {
        let err = parse_ledger_info(&json!({"chain_id": 1, "epoch": "1"})).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn transactions_sorted_newest_first_with_status() {
        let txs = parse_transactions(&json!([
            {"hash": "0xAA", "version": "5", "type": "user_transaction", "success": true,
             "sender": "0x1", "sequence_number": "3", "gas_used": "7", "gas_unit_price": "100"},
            {"hash": "0xbb", "version": "9", "type": "block_metadata_transaction", "success": false},
            {"hash": "0xcc", "type": "pending_transaction"},
            {"version": "10"}
        ]))
        .unwrap();
        let summary: Vec<(&str, u64, TxStatus)> = txs
            .iter()
            .map(|t| (t.hash.as_str(), t.version, t.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("0xbb", 9, TxStatus::Failure),
                ("0xaa", 5, TxStatus::Success),
                ("0xcc", 0, TxStatus::Pending),
            ]
        );
        assert_eq!(txs[1].sequence_number, Some(3));
    }

    #[test]
    fn resource_data_is_kept_as_sent() {
        let data = json!({"coin": {"value": "10"}, "opt": {"vec": [[1]]}, "frozen": false});
        let resources = parse_resources(&json!([
            {"type": "0x1::coin::CoinStore<0x1::libra_coin::LibraCoin>", "data": data.clone()},
            {"data": {}}
        ]))
        .unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].data, data);
        assert_eq!(crate::domain::extract_balance(&resources), 10);
    }

    #[test]
    fn detail_keeps_hashes_and_events() {
        let detail = parse_transaction_detail(&json!({
            "hash": "0x01", "version": "2", "type": "user_transaction", "success": true,
            "vm_status": "Executed successfully",
            "state_change_hash": "0xs", "event_root_hash": "0xe", "accumulator_root_hash": "0xa",
            "events": [{"type": "0x1::coin::DepositEvent", "data": {"amount": "5"}}],
            "changes": [],
            "payload": {"function": "0x1::ol_account::transfer"}
        }))
        .unwrap();
        assert_eq!(detail.vm_status, "Executed successfully");
        assert_eq!(detail.events.len(), 1);
        assert_eq!(detail.events[0]["data"], json!({"amount": "5"}));
        assert_eq!(detail.payload, json!({"function": "0x1::ol_account::transfer"}));
        assert_eq!(detail.state_change_hash.as_deref(), Some("0xs"));
        assert_eq!(detail.summary.version, 2);
    }
}
