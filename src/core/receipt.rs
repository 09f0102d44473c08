//! Transaction receipts
//!
//! The subset of `eth_getTransactionReceipt` the deployer reads.

use alloy_network::ReceiptResponse;
use alloy_primitives::{Address, B256};
use alloy_rpc_types::TransactionReceipt;
use std::fmt;

/// Receipt of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// Set for contract creations
    pub contract_address: Option<Address>,
    /// `false` when execution reverted
    pub status: bool,
}

impl From<TransactionReceipt> for Receipt {
    fn from(receipt: TransactionReceipt) -> Self {
        Self {
            transaction_hash: ReceiptResponse::transaction_hash(&receipt),
            block_number: ReceiptResponse::block_number(&receipt),
            gas_used: ReceiptResponse::gas_used(&receipt),
            contract_address: ReceiptResponse::contract_address(&receipt),
            status: ReceiptResponse::status(&receipt),
        }
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx {}", self.transaction_hash)?;
        match self.block_number {
            Some(block) => write!(f, ", block {}", block)?,
            None => write!(f, ", pending block")?,
        }
        write!(f, ", gas used {}", self.gas_used)?;
        if let Some(address) = self.contract_address {
            write!(f, ", contract {}", address)?;
        }
        write!(f, ", status {}", if self.status { "success" } else { "reverted" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_from_rpc_receipt() {
        let json = serde_json::json!({
            "type": "0x0",
            "status": "0x1",
            "cumulativeGasUsed": "0x5208",
            "logs": [],
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "transactionIndex": "0x0",
            "blockHash": "0x2222222222222222222222222222222222222222222222222222222222222222",
            "blockNumber": "0x10",
            "gasUsed": "0x2dc6c",
            "effectiveGasPrice": "0x6fc23ac00",
            "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "to": null,
            "contractAddress": "0x5fbdb2315678afecb367f032d93f642f64180aa3"
        });
        let rpc: TransactionReceipt = serde_json::from_value(json).unwrap();
        let receipt = Receipt::from(rpc);

        assert_eq!(receipt.block_number, Some(16));
        assert_eq!(receipt.gas_used, 187_500);
        assert_eq!(
            receipt.contract_address,
            Some(address!("5FbDB2315678afecb367f032d93F642f64180aa3"))
        );
        assert!(receipt.status);
        assert!(receipt.to_string().contains("block 16"));
    }

    #[test]
    fn test_display_reverted() {
        let receipt = Receipt {
            transaction_hash: B256::ZERO,
            block_number: None,
            gas_used: 21_000,
            contract_address: None,
            status: false,
        };
        let line = receipt.to_string();
        assert!(line.contains("pending block"));
        assert!(line.ends_with("status reverted"));
    }
}
