//! ERC-20 function-call decoder.
//!
//! # How it works
//! - First 4 bytes of calldata = keccak256(function_signature)[:4] (the selector)
//! - Remaining bytes = ABI-encoded inputs tuple
//!
//! The same ABI is used to decode `eth_call` return data for the token's
//! metadata getters.

use alloy_core::dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{Address, U256};
use thiserror::Error;

/// The subset of the ERC-20 ABI the indexer needs.
pub const ERC20_ABI: &str = r#"[
    {
        "name": "transfer",
        "type": "function",
        "inputs": [
            {"name": "to", "type": "address"},
            {"name": "value", "type": "uint256"}
        ],
        "outputs": [{"name": "", "type": "bool"}],
        "stateMutability": "nonpayable"
    },
    {
        "name": "transferFrom",
        "type": "function",
        "inputs": [
            {"name": "from", "type": "address"},
            {"name": "to", "type": "address"},
            {"name": "value", "type": "uint256"}
        ],
        "outputs": [{"name": "", "type": "bool"}],
        "stateMutability": "nonpayable"
    },
    {
        "name": "approve",
        "type": "function",
        "inputs": [
            {"name": "spender", "type": "address"},
            {"name": "value", "type": "uint256"}
        ],
        "outputs": [{"name": "", "type": "bool"}],
        "stateMutability": "nonpayable"
    },
    {
        "name": "name",
        "type": "function",
        "inputs": [],
        "outputs": [{"name": "", "type": "string"}],
        "stateMutability": "view"
    },
    {
        "name": "symbol",
        "type": "function",
        "inputs": [],
        "outputs": [{"name": "", "type": "string"}],
        "stateMutability": "view"
    },
    {
        "name": "decimals",
        "type": "function",
        "inputs": [],
        "outputs": [{"name": "", "type": "uint8"}],
        "stateMutability": "view"
    },
    {
        "name": "totalSupply",
        "type": "function",
        "inputs": [],
        "outputs": [{"name": "", "type": "uint256"}],
        "stateMutability": "view"
    }
]"#;

/// Errors from call decoding. Most contract calls are not the function the
/// caller is looking for, so these are routine.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("calldata too short: {len} bytes (need at least 4 for selector)")]
    TooShort { len: usize },

    #[error("no function found for selector 0x{selector}")]
    UnknownSelector { selector: String },

    #[error("function '{0}' not found in ABI")]
    UnknownFunction(String),

    #[error("call targets {actual}, not the tracked contract {expected}")]
    WrongTarget { expected: Address, actual: Address },

    #[error("ABI decode failed: {reason}")]
    AbiDecodeFailed { reason: String },
}

/// Result of decoding a function call's calldata.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCall {
    /// Function name (e.g. "transferFrom")
    pub function_name: String,
    pub selector: [u8; 4],
    /// Decoded input parameters in declaration order
    pub inputs: Vec<(String, DynSolValue)>,
}

impl DecodedCall {
    /// Look up a decoded input by name
    pub fn input(&self, name: &str) -> Option<&DynSolValue> {
        self.inputs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn address(&self, name: &str) -> Option<Address> {
        self.input(name)?.as_address()
    }

    pub fn uint(&self, name: &str) -> Option<U256> {
        self.input(name)?.as_uint().map(|(v, _)| v)
    }
}

/// Decoder over a JSON ABI.
pub struct AbiCallDecoder {
    abi: JsonAbi,
}

impl AbiCallDecoder {
    /// Create a decoder from a standard Ethereum ABI JSON string.
    pub fn from_abi_json(abi_json: &str) -> Result<Self, DecodeError> {
        let abi: JsonAbi = serde_json::from_str(abi_json).map_err(|e| DecodeError::AbiDecodeFailed {
            reason: format!("invalid ABI JSON: {e}"),
        })?;
        Ok(Self { abi })
    }

    /// Decoder for the built-in ERC-20 ABI.
    pub fn erc20() -> Result<Self, DecodeError> {
        Self::from_abi_json(ERC20_ABI)
    }

    /// Decode a function call from raw calldata bytes (selector included).
    pub fn decode_call(&self, calldata: &[u8]) -> Result<DecodedCall, DecodeError> {
        if calldata.len() < 4 {
            return Err(DecodeError::TooShort { len: calldata.len() });
        }
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&calldata[..4]);

        let func = self.find_function(selector)?;
        let (names, types) = param_types(&func.inputs)?;
        let values = decode_params(&calldata[4..], types)?;

        Ok(DecodedCall {
            function_name: func.name.clone(),
            selector,
            inputs: names.into_iter().zip(values).collect(),
        })
    }

    /// Calldata for a zero-argument function (its selector).
    pub fn encode_getter(&self, name: &str) -> Result<Vec<u8>, DecodeError> {
        self.selector_for(name)
            .map(|s| s.to_vec())
            .ok_or_else(|| DecodeError::UnknownFunction(name.to_string()))
    }

    /// Decode the return data of `name`.
    pub fn decode_output(&self, name: &str, data: &[u8]) -> Result<Vec<DynSolValue>, DecodeError> {
        let func = self
            .abi
            .function(name)
            .and_then(|overloads| overloads.first())
            .ok_or_else(|| DecodeError::UnknownFunction(name.to_string()))?;
        let (_, types) = param_types(&func.outputs)?;
        decode_params(data, types)
    }

    /// Returns the 4-byte selector for a named function.
    pub fn selector_for(&self, name: &str) -> Option<[u8; 4]> {
        self.abi
            .functions()
            .find(|f| f.name == name)
            .map(|f| f.selector().0)
    }

    pub fn function_names(&self) -> Vec<&str> {
        self.abi.functions().map(|f| f.name.as_str()).collect()
    }

    fn find_function(&self, selector: [u8; 4]) -> Result<&Function, DecodeError> {
        self.abi
            .functions()
            .find(|f| f.selector().0 == selector)
            .ok_or_else(|| DecodeError::UnknownSelector {
                selector: hex::encode(selector),
            })
    }
}

fn param_types(
    params: &[alloy_json_abi::Param],
) -> Result<(Vec<String>, Vec<DynSolType>), DecodeError> {
    let mut names = Vec::with_capacity(params.len());
    let mut types = Vec::with_capacity(params.len());
    for (i, p) in params.iter().enumerate() {
        names.push(if p.name.is_empty() { format!("arg{i}") } else { p.name.clone() });
        types.push(p.resolve().map_err(|e| DecodeError::AbiDecodeFailed {
            reason: format!("unresolvable type '{}': {e}", p.ty),
        })?);
    }
    Ok((names, types))
}

fn decode_params(data: &[u8], types: Vec<DynSolType>) -> Result<Vec<DynSolValue>, DecodeError> {
    if types.is_empty() {
        return Ok(vec![]);
    }
    let decoded = DynSolType::Tuple(types)
        .abi_decode_params(data)
        .map_err(|e| DecodeError::AbiDecodeFailed {
            reason: e.to_string(),
        })?;
    Ok(match decoded {
        DynSolValue::Tuple(vals) => vals,
        other => vec![other],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::encode_transfer_from;

    #[test]
    fn erc20_abi_parses() {
        let decoder = AbiCallDecoder::erc20().unwrap();
        let names = decoder.function_names();
        assert!(names.contains(&"transferFrom"));
        assert!(names.contains(&"totalSupply"));
    }

    #[test]
    fn known_selectors() {
        let decoder = AbiCallDecoder::erc20().unwrap();
        assert_eq!(decoder.selector_for("transferFrom"), Some([0x23, 0xb8, 0x72, 0xdd]));
        assert_eq!(decoder.selector_for("transfer"), Some([0xa9, 0x05, 0x9c, 0xbb]));
        assert_eq!(decoder.selector_for("approve"), Some([0x09, 0x5e, 0xa7, 0xb3]));
    }

    #[test]
    fn decode_transfer_from() {
        let decoder = AbiCallDecoder::erc20().unwrap();
        let from = Address::repeat_byte(0x11);
        let to = Address::repeat_byte(0x22);
        let calldata = encode_transfer_from(from, to, U256::from(1_000u64));

        let call = decoder.decode_call(&calldata).unwrap();
        assert_eq!(call.function_name, "transferFrom");
        assert_eq!(call.address("from"), Some(from));
        assert_eq!(call.address("to"), Some(to));
        assert_eq!(call.uint("value"), Some(U256::from(1_000u64)));
    }

    #[test]
    fn short_calldata_rejected() {
        let decoder = AbiCallDecoder::erc20().unwrap();
        assert!(matches!(decoder.decode_call(&[0x23, 0xb8]), Err(DecodeError::TooShort { len: 2 })));
    }

    #[test]
    fn unknown_selector_rejected() {
        let decoder = AbiCallDecoder::erc20().unwrap();
        let err = decoder.decode_call(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownSelector { ref selector } if selector == "deadbeef"));
    }

    #[test]
    fn truncated_arguments_rejected() {
        let decoder = AbiCallDecoder::erc20().unwrap();
        let mut calldata = encode_transfer_from(Address::ZERO, Address::ZERO, U256::from(1u64));
        calldata.truncate(4 + 40);
        assert!(matches!(
            decoder.decode_call(&calldata),
            Err(DecodeError::AbiDecodeFailed { .. })
        ));
    }

    #[test]
    fn decode_uint_output() {
        let decoder = AbiCallDecoder::erc20().unwrap();
        let data = U256::from(42u64).to_be_bytes::<32>();
        let out = decoder.decode_output("totalSupply", &data).unwrap();
        assert_eq!(out[0].as_uint().map(|(v, _)| v), Some(U256::from(42u64)));
    }

    #[test]
    fn decode_string_output() {
        let decoder = AbiCallDecoder::erc20().unwrap();
        // offset 0x20, length 3, "CPT" right-padded
        let mut data = vec![0u8; 96];
        data[31] = 0x20;
        data[63] = 3;
        data[64..67].copy_from_slice(b"CPT");
        let out = decoder.decode_output("symbol", &data).unwrap();
        assert_eq!(out[0].as_str(), Some("CPT"));
    }
}
