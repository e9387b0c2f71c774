//! ERC-20 log and call parsing into vestindex domain events.

use alloy_primitives::{Address, U256};

use vestindex_core::error::IndexerError;
use vestindex_core::types::{ApprovalEvent, DelegatedSpend, TransferEvent};

use crate::decoder::DecodedCall;
use crate::ledger::{EventKind, RawLog, RawTransaction};

/// `transferFrom(address,address,uint256)`
pub const TRANSFER_FROM_SELECTOR: [u8; 4] = [0x23, 0xb8, 0x72, 0xdd];

/// `(topic1 as address, topic2 as address, data as uint256)`, shared by
/// `Transfer` and `Approval`.
fn indexed_pair(log: &RawLog, kind: EventKind) -> Result<(Address, Address, U256), IndexerError> {
    let invalid = |reason: String| IndexerError::InvalidLog {
        tx_hash: format!("{:#x}", log.tx_hash),
        reason,
    };

    if log.topics.len() != 3 {
        return Err(invalid(format!(
            "{kind} log must have 3 topics, got {}",
            log.topics.len()
        )));
    }
    if log.topics[0] != kind.topic0() {
        return Err(invalid(format!("topic0 is not the {kind} signature")));
    }
    if log.data.len() != 32 {
        return Err(invalid(format!(
            "{kind} data must be 32 bytes, got {}",
            log.data.len()
        )));
    }

    Ok((
        Address::from_word(log.topics[1]),
        Address::from_word(log.topics[2]),
        U256::from_be_slice(&log.data),
    ))
}

pub fn parse_transfer(log: &RawLog) -> Result<TransferEvent, IndexerError> {
    let (from, to, amount) = indexed_pair(log, EventKind::Transfer)?;
    Ok(TransferEvent {
        from,
        to,
        amount,
        block_number: log.block_number_u64()?,
        log_index: log.log_index_u32()?,
        tx_hash: log.tx_hash,
    })
}

pub fn parse_approval(log: &RawLog) -> Result<ApprovalEvent, IndexerError> {
    let (owner, spender, amount) = indexed_pair(log, EventKind::Approval)?;
    Ok(ApprovalEvent {
        owner,
        spender,
        amount,
        block_number: log.block_number_u64()?,
        log_index: log.log_index_u32()?,
        tx_hash: log.tx_hash,
    })
}

/// Interpret a decoded call as a delegated spend: the call's `from`
/// argument is the owner and the transaction sender is the spender.
/// Returns `None` for any other function.
pub fn delegated_spend(
    tx: &RawTransaction,
    call: &DecodedCall,
    block_number: u64,
) -> Option<DelegatedSpend> {
    if call.function_name != "transferFrom" {
        return None;
    }
    Some(DelegatedSpend {
        owner: call.address("from")?,
        spender: tx.from,
        amount: call.uint("value")?,
        block_number,
        tx_hash: tx.hash,
    })
}

/// ABI-encode a `transferFrom(from, to, amount)` call.
pub fn encode_transfer_from(from: Address, to: Address, amount: U256) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 32 * 3);
    out.extend_from_slice(&TRANSFER_FROM_SELECTOR);
    out.extend_from_slice(from.into_word().as_slice());
    out.extend_from_slice(to.into_word().as_slice());
    out.extend_from_slice(&amount.to_be_bytes::<32>());
    out
}
