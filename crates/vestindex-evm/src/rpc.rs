//! `LedgerClient` over Ethereum JSON-RPC (`eth_blockNumber`, `eth_getLogs`,
//! `eth_getBlockByNumber`, `eth_call`).

use alloy_core::dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use serde_json::{json, Value};

use vestindex_core::amount::format_units;
use vestindex_core::error::IndexerError;
use vestindex_core::types::TokenInfo;

use crate::decoder::{AbiCallDecoder, DecodeError, DecodedCall};
use crate::fetcher::{parse_hex_u64, to_hex_quantity};
use crate::ledger::{EventKind, LedgerClient, RawBlock, RawLog};
use crate::transport::{HttpTransport, RetryConfig};

/// Ledger client for one ERC-20 contract on one JSON-RPC endpoint.
pub struct HttpLedgerClient {
    transport: HttpTransport,
    contract: Address,
    decoder: AbiCallDecoder,
}

impl HttpLedgerClient {
    pub fn new(
        url: impl Into<String>,
        contract: Address,
        retry: RetryConfig,
    ) -> Result<Self, IndexerError> {
        Ok(Self {
            transport: HttpTransport::new(url, retry)?,
            contract,
            decoder: AbiCallDecoder::erc20().map_err(|e| IndexerError::Decode(e.to_string()))?,
        })
    }

    pub fn url(&self) -> &str {
        self.transport.url()
    }

    /// `eth_call` a zero-argument getter on the contract and decode its
    /// single return value.
    async fn call_getter(&self, name: &str) -> Result<DynSolValue, IndexerError> {
        let calldata = self
            .decoder
            .encode_getter(name)
            .map_err(|e| IndexerError::Decode(e.to_string()))?;
        let raw: Bytes = self
            .transport
            .call(
                "eth_call",
                vec![
                    json!({ "to": self.contract, "data": Bytes::from(calldata) }),
                    json!("latest"),
                ],
            )
            .await?;
        self.decoder
            .decode_output(name, &raw)
            .map_err(|e| IndexerError::Decode(format!("{name}(): {e}")))?
            .into_iter()
            .next()
            .ok_or_else(|| IndexerError::Decode(format!("{name}() returned nothing")))
    }

    /// Read `name`, `symbol`, `decimals` and `totalSupply` from the contract.
    pub async fn token_info(&self) -> Result<TokenInfo, IndexerError> {
        let name = self.call_getter("name").await?;
        let symbol = self.call_getter("symbol").await?;
        let decimals = self.call_getter("decimals").await?;
        let supply = self.call_getter("totalSupply").await?;

        let decimals = decimals
            .as_uint()
            .and_then(|(v, _)| u8::try_from(v).ok())
            .ok_or_else(|| IndexerError::Decode("decimals() is not a uint8".into()))?;
        let supply = supply
            .as_uint()
            .map(|(v, _)| v)
            .unwrap_or(U256::ZERO);

        Ok(TokenInfo {
            name: name.as_str().unwrap_or_default().to_string(),
            symbol: symbol.as_str().unwrap_or_default().to_string(),
            decimals,
            total_supply: format_units(supply, decimals),
        })
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    fn contract(&self) -> Address {
        self.contract
    }

    async fn current_height(&self) -> Result<u64, IndexerError> {
        let hex: String = self.transport.call("eth_blockNumber", vec![]).await?;
        parse_hex_u64(&hex)
    }

    async fn get_logs(
        &self,
        event: EventKind,
        from: u64,
        to: u64,
    ) -> Result<Vec<RawLog>, IndexerError> {
        let filter = json!({
            "address": self.contract,
            "topics": [event.topic0()],
            "fromBlock": to_hex_quantity(from),
            "toBlock": to_hex_quantity(to),
        });
        let mut logs: Vec<RawLog> = self.transport.call("eth_getLogs", vec![filter]).await?;
        // ascending by (block, log index)
        let mut keyed = Vec::with_capacity(logs.len());
        for log in logs.drain(..) {
            keyed.push(((log.block_number_u64()?, log.log_index_u32()?), log));
        }
        keyed.sort_by_key(|(k, _)| *k);
        Ok(keyed.into_iter().map(|(_, log)| log).collect())
    }

    async fn get_block_with_transactions(&self, height: u64) -> Result<RawBlock, IndexerError> {
        let block: Option<RawBlock> = self
            .transport
            .call(
                "eth_getBlockByNumber",
                vec![Value::String(to_hex_quantity(height)), Value::Bool(true)],
            )
            .await?;
        block.ok_or(IndexerError::BlockNotFound(height))
    }

    fn decode_call(&self, input: &[u8], to: Address) -> Result<DecodedCall, DecodeError> {
        if to != self.contract {
            return Err(DecodeError::WrongTarget {
                expected: self.contract,
                actual: to,
            });
        }
        self.decoder.decode_call(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_call_rejects_other_targets() {
        let contract = Address::repeat_byte(0xcc);
        let client =
            HttpLedgerClient::new("http://127.0.0.1:8545", contract, RetryConfig::default()).unwrap();
        let input = crate::events::encode_transfer_from(
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            U256::from(3u64),
        );

        assert!(matches!(
            client.decode_call(&input, Address::repeat_byte(0xdd)),
            Err(DecodeError::WrongTarget { .. })
        ));
        let call = client.decode_call(&input, contract).unwrap();
        assert_eq!(call.function_name, "transferFrom");
    }

    #[tokio::test]
    async fn unreachable_node_surfaces_as_rpc_error() {
        let retry = RetryConfig {
            max_retries: 0,
            request_timeout_ms: 500,
            ..Default::default()
        };
        // port 9 (discard) is not an HTTP JSON-RPC endpoint
        let client = HttpLedgerClient::new("http://127.0.0.1:9", Address::ZERO, retry).unwrap();
        let err = client.current_height().await.unwrap_err();
        assert!(err.is_transient(), "{err}");
    }
}
