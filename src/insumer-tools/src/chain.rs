//! Chain identifiers and the closed sets operations accept.
//!
//! A chain is either an EVM network, named by its positive integer chain id,
//! or a non-EVM ledger named by a string literal. Which values are allowed
//! depends on the operation, so each operation picks one [`ChainSet`].

use insumer_mcp_types::PropertySchema;
use serde_json::Value;

use crate::schema::Violation;

/// A validated chain identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainId {
    /// EVM chain id.
    Evm(u64),
    /// Non-EVM ledger literal.
    Ledger(&'static str),
}

impl ChainId {
    /// JSON form, identical to what the caller supplied.
    pub fn to_value(self) -> Value {
        match self {
            Self::Evm(id) => Value::from(id),
            Self::Ledger(name) => Value::from(name),
        }
    }
}

/// Which EVM chain ids a set admits.
#[derive(Debug, Clone, Copy)]
pub enum EvmChains {
    /// Any positive chain id.
    Any,
    /// Only the listed ids.
    Only(&'static [u64]),
}

/// A closed set of acceptable chains.
#[derive(Debug)]
pub struct ChainSet {
    pub name: &'static str,
    pub evm: EvmChains,
    pub ledgers: &'static [&'static str],
}

/// Chains a wallet condition can be checked on.
pub static VERIFICATION_CHAINS: ChainSet = ChainSet {
    name: "verification",
    evm: EvmChains::Any,
    ledgers: &["solana", "xrpl"],
};

/// Chains a merchant can register tokens and NFT collections on.
pub static ONBOARDING_CHAINS: ChainSet = ChainSet {
    name: "onboarding",
    evm: EvmChains::Only(&[1, 10, 56, 137, 8453, 42161, 43114, 59144]),
    ledgers: &["solana", "xrpl"],
};

/// Chains USDC payments and credit purchases settle on.
pub static SETTLEMENT_CHAINS: ChainSet = ChainSet {
    name: "settlement",
    evm: EvmChains::Only(&[1, 137, 8453, 42161]),
    ledgers: &["solana"],
};

impl ChainSet {
    /// Parse a caller-supplied value against this set.
    pub fn parse(&self, value: &Value) -> Result<ChainId, Violation> {
        let chain = match value {
            Value::Number(n) => n
                .as_u64()
                .filter(|&id| id > 0 && self.admits_evm(id))
                .map(ChainId::Evm),
            Value::String(s) => self
                .ledgers
                .iter()
                .copied()
                .find(|ledger| *ledger == s.as_str())
                .map(ChainId::Ledger),
            _ => None,
        };
        chain.ok_or_else(|| Violation::Chain(self.describe()))
    }

    fn admits_evm(&self, id: u64) -> bool {
        match self.evm {
            EvmChains::Any => true,
            EvmChains::Only(ids) => ids.contains(&id),
        }
    }

    /// Human-readable list of what the set admits.
    pub fn describe(&self) -> String {
        let ledgers = self.ledgers.join(", ");
        match self.evm {
            EvmChains::Any => format!("a positive integer EVM chain id or one of: {ledgers}"),
            EvmChains::Only(ids) => {
                let ids: Vec<String> = ids.iter().map(u64::to_string).collect();
                format!("one of: {}, {ledgers}", ids.join(", "))
            }
        }
    }

    /// JSON Schema union advertising this set.
    pub fn property_schema(&self) -> PropertySchema {
        let evm = match self.evm {
            EvmChains::Any => PropertySchema::integer().min(1.0),
            EvmChains::Only(ids) => PropertySchema::integer().enum_values(ids.iter().copied()),
        };
        PropertySchema::any_of(vec![
            evm,
            PropertySchema::string().enum_values(self.ledgers.iter().copied()),
        ])
    }
}
