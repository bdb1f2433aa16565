//! The tool catalog.
//!
//! One [`ToolSpec`] per upstream capability: name, description, route and
//! argument fields. Everything else (validation, the advertised schema,
//! request construction) is derived from this table.

use std::sync::LazyLock;

use insumer_mcp_types::Tool;
use regex::Regex;

use crate::chain::{ONBOARDING_CHAINS, SETTLEMENT_CHAINS, VERIFICATION_CHAINS};
use crate::dispatch::Route;
use crate::schema::{Field, FieldKind, StringRule, input_schema};

static MERCHANT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid merchant id regex"));

static DISCOUNT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^INSR-[A-Z0-9]{5}$").expect("Invalid discount code regex"));

static EVM_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("Invalid EVM address regex"));

/// One callable tool.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub route: Route,
    pub fields: Vec<Field>,
}

impl ToolSpec {
    fn new(name: &'static str, description: &'static str, route: Route) -> Self {
        Self {
            name,
            description,
            route,
            fields: Vec::new(),
        }
    }

    fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// The MCP tool definition advertised through `tools/list`.
    pub fn tool(&self) -> Tool {
        Tool::new(self.name, self.description).with_schema(input_schema(&self.fields))
    }
}

fn merchant_id_rule() -> FieldKind {
    FieldKind::String(StringRule::any().len(2, 50).pattern(&MERCHANT_ID))
}

fn merchant_id() -> Field {
    Field::new("merchantId", "Merchant identifier", merchant_id_rule()).required()
}

fn evm_wallet(description: &'static str) -> Field {
    Field::new(
        "wallet",
        description,
        FieldKind::String(StringRule::any().pattern(&EVM_ADDRESS)),
    )
}

fn solana_wallet() -> Field {
    Field::new(
        "solanaWallet",
        "Solana wallet address (base58)",
        FieldKind::String(StringRule::any().len(32, 44)),
    )
}

fn xrpl_wallet() -> Field {
    Field::new(
        "xrplWallet",
        "XRP Ledger account address (r...)",
        FieldKind::String(StringRule::any().len(25, 35)),
    )
}

/// EVM, Solana and XRPL wallets, all optional.
fn wallet_triple() -> [Field; 3] {
    [evm_wallet("EVM wallet address (0x...)"), solana_wallet(), xrpl_wallet()]
}

fn proof() -> Field {
    Field::new(
        "proof",
        "Set to \"merkle\" to include EIP-1186 Merkle storage proofs",
        FieldKind::Enum(&["merkle"]),
    )
}

fn string(max: usize) -> FieldKind {
    FieldKind::String(StringRule::any().max_len(max))
}

fn bounded_string(min: usize, max: usize) -> FieldKind {
    FieldKind::String(StringRule::any().len(min, max))
}

fn any_string() -> FieldKind {
    FieldKind::String(StringRule::any())
}

fn xrpl_currency() -> Field {
    Field::new(
        "currency",
        "XRPL currency code for issued tokens",
        bounded_string(3, 40),
    )
}

fn decimals() -> Field {
    Field::new("decimals", "Token decimals", FieldKind::integer(0, 18))
}

fn tier_discount() -> FieldKind {
    FieldKind::integer(1, 50)
}

fn condition() -> FieldKind {
    FieldKind::Object(vec![
        Field::new(
            "type",
            "Kind of check to run",
            FieldKind::Enum(&["token_balance", "nft_ownership", "eas_attestation", "farcaster_id"]),
        )
        .required(),
        Field::new(
            "chainId",
            "EVM chain id, or \"solana\" / \"xrpl\"",
            FieldKind::Chain(&VERIFICATION_CHAINS),
        ),
        Field::new("contractAddress", "Token or NFT contract address", any_string()),
        Field::new(
            "threshold",
            "Minimum balance for token_balance checks",
            FieldKind::number_at_least(0.0),
        ),
        decimals(),
        Field::new("label", "Human-readable label echoed in results", string(100)),
        Field::new("schemaId", "EAS schema id for eas_attestation", any_string()),
        Field::new("attester", "Required attester for eas_attestation", any_string()),
        Field::new("indexer", "EAS indexer contract address", any_string()),
        xrpl_currency(),
        Field::new(
            "taxon",
            "XRPL NFT taxon filter",
            FieldKind::integer_at_least(0),
        ),
    ])
}

fn tier() -> FieldKind {
    FieldKind::Object(vec![
        Field::new("name", "Tier name", bounded_string(1, 30)).required(),
        Field::new(
            "threshold",
            "Minimum holding to reach the tier",
            FieldKind::number_at_least(0.0),
        )
        .required(),
        Field::new("discount", "Discount percentage", tier_discount()).required(),
    ])
}

fn token_config() -> FieldKind {
    FieldKind::Object(vec![
        Field::new("symbol", "Token symbol", bounded_string(1, 20)).required(),
        Field::new(
            "chainId",
            "Chain the token lives on",
            FieldKind::Chain(&ONBOARDING_CHAINS),
        )
        .required(),
        Field::new("contractAddress", "Token contract address", any_string()).required(),
        decimals(),
        xrpl_currency(),
        Field::new("tiers", "Discount tiers", FieldKind::array(tier(), 1, 4)).required(),
    ])
}

fn nft_config() -> FieldKind {
    FieldKind::Object(vec![
        Field::new("name", "Collection name", bounded_string(1, 100)).required(),
        Field::new("contractAddress", "Collection contract address", any_string()).required(),
        Field::new(
            "chainId",
            "Chain the collection lives on",
            FieldKind::Chain(&ONBOARDING_CHAINS),
        )
        .required(),
        Field::new(
            "taxon",
            "XRPL NFT taxon filter",
            FieldKind::integer_at_least(0),
        ),
        Field::new("discount", "Discount percentage for holders", tier_discount()).required(),
    ])
}

fn settlement_chain(description: &'static str) -> Field {
    Field::new("chainId", description, FieldKind::Chain(&SETTLEMENT_CHAINS))
}

fn tx_hash() -> Field {
    Field::new(
        "txHash",
        "Transaction hash of the USDC payment",
        bounded_string(1, 128),
    )
    .required()
}

fn usdc_amount(description: &'static str) -> Field {
    Field::new("amount", description, FieldKind::number_at_least(0.0))
}

fn commerce_items() -> Field {
    Field::new(
        "items",
        "Cart line items",
        FieldKind::array(
            FieldKind::Object(vec![
                Field::new("id", "Item identifier", any_string()).required(),
                Field::new("quantity", "Quantity", FieldKind::integer(1, 1000)),
            ]),
            0,
            50,
        ),
    )
}

fn commerce_discount(name: &'static str, description: &'static str, path: &'static str) -> ToolSpec {
    ToolSpec::new(name, description, Route::post(path))
        .field(merchant_id())
        .fields(wallet_triple())
        .field(commerce_items())
}

/// Every tool the server exposes.
pub fn catalog() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "insumer_jwks",
            "Fetch the JSON Web Key Set used to verify attestation signatures and JWTs. Free, no API key needed.",
            Route::get("/jwks").public(),
        ),
        ToolSpec::new(
            "insumer_attest",
            "Verify on-chain conditions (token balances, NFT ownership, EAS attestations, Farcaster ids) for a wallet and return a signed attestation. Costs 1 credit, 2 with Merkle proofs.",
            Route::post("/attest"),
        )
        .fields(wallet_triple())
        .field(
            Field::new(
                "conditions",
                "Conditions to verify (1-10)",
                FieldKind::array(condition(), 1, 10),
            )
            .required(),
        )
        .field(proof())
        .field(Field::new(
            "format",
            "Set to \"jwt\" to also receive the attestation as a JWT",
            FieldKind::Enum(&["jwt"]),
        )),
        ToolSpec::new(
            "insumer_compliance_templates",
            "List the pre-built compliance condition templates. Free, no API key needed.",
            Route::get("/compliance/templates").public(),
        ),
        ToolSpec::new(
            "insumer_wallet_trust",
            "Build a signed trust profile for a wallet across stablecoins, governance tokens, NFTs and staking positions.",
            Route::post("/trust"),
        )
        .field(evm_wallet("EVM wallet address (0x...)").required())
        .field(solana_wallet())
        .field(xrpl_wallet())
        .field(proof()),
        ToolSpec::new(
            "insumer_batch_wallet_trust",
            "Build trust profiles for up to 10 wallets in one call.",
            Route::post("/trust/batch"),
        )
        .field(
            Field::new(
                "wallets",
                "Wallets to profile (1-10)",
                FieldKind::array(
                    FieldKind::Object(vec![
                        evm_wallet("EVM wallet address (0x...)").required(),
                        solana_wallet(),
                        xrpl_wallet(),
                    ]),
                    1,
                    10,
                ),
            )
            .required(),
        )
        .field(proof()),
        ToolSpec::new(
            "insumer_verify",
            "Check a wallet against a merchant's token and NFT tiers and issue a discount code (INSR-XXXXX) valid for 30 minutes.",
            Route::post("/verify"),
        )
        .field(merchant_id())
        .fields(wallet_triple()),
        ToolSpec::new(
            "insumer_validate_code",
            "Look up a discount code and report whether it is valid, its discount and its expiry. Free, no API key needed.",
            Route::get("/codes/{code}").public(),
        )
        .field(
            Field::new(
                "code",
                "Discount code, e.g. INSR-A7K3M",
                FieldKind::String(StringRule::any().pattern(&DISCOUNT_CODE)),
            )
            .required(),
        ),
        ToolSpec::new(
            "insumer_list_merchants",
            "Browse the public merchant directory.",
            Route::get("/merchants"),
        )
        .field(Field::new(
            "token",
            "Only merchants accepting this token symbol",
            bounded_string(1, 20),
        ))
        .field(Field::new(
            "verified",
            "Only domain-verified merchants",
            FieldKind::Boolean,
        ))
        .field(Field::new("limit", "Page size (1-200)", FieldKind::integer(1, 200)))
        .field(Field::new(
            "offset",
            "Number of merchants to skip",
            FieldKind::integer_at_least(0),
        )),
        ToolSpec::new(
            "insumer_get_merchant",
            "Get a merchant's public profile: tokens, NFT collections and discount tiers.",
            Route::get("/merchants/{merchantId}"),
        )
        .field(merchant_id()),
        ToolSpec::new(
            "insumer_list_tokens",
            "List the tokens and NFT collections registered in the directory.",
            Route::get("/tokens"),
        )
        .field(Field::new(
            "chainId",
            "Only assets on this chain",
            FieldKind::Chain(&VERIFICATION_CHAINS),
        ))
        .field(Field::new("symbol", "Only this symbol", bounded_string(1, 20)))
        .field(Field::new(
            "type",
            "Only fungible tokens or only NFTs",
            FieldKind::Enum(&["token", "nft"]),
        )),
        ToolSpec::new(
            "insumer_check_discount",
            "Compute the discount a wallet would get at a merchant without issuing a code.",
            Route::get("/discount/check"),
        )
        .field(Field::new("merchant", "Merchant identifier", merchant_id_rule()).required())
        .fields(wallet_triple()),
        ToolSpec::new(
            "insumer_credits",
            "Show the verification credit balance and tier of the current API key.",
            Route::get("/credits"),
        ),
        ToolSpec::new(
            "insumer_buy_credits",
            "Buy verification credits with a USDC payment already sent on-chain.",
            Route::post("/credits/buy"),
        )
        .field(tx_hash())
        .field(settlement_chain("Chain the USDC was sent on").required())
        .field(usdc_amount("USDC amount sent")),
        ToolSpec::new(
            "insumer_confirm_payment",
            "Confirm the USDC payment for a discount code.",
            Route::post("/payment/confirm"),
        )
        .field(
            Field::new(
                "code",
                "Discount code the payment settles",
                FieldKind::String(StringRule::any().pattern(&DISCOUNT_CODE)),
            )
            .required(),
        )
        .field(tx_hash())
        .field(settlement_chain("Chain the USDC was sent on").required())
        .field(usdc_amount("USDC amount paid").required()),
        ToolSpec::new(
            "insumer_create_merchant",
            "Create a merchant. The calling API key becomes its owner and the merchant starts with free verification credits.",
            Route::post("/merchants"),
        )
        .field(
            Field::new("companyName", "Display name", bounded_string(1, 100)).required(),
        )
        .field(
            Field::new("companyId", "Merchant identifier to claim", merchant_id_rule())
                .required(),
        )
        .field(Field::new("location", "City or region", string(100))),
        ToolSpec::new(
            "insumer_merchant_status",
            "Get the private status of a merchant you own: credits, configuration and verification state.",
            Route::get("/merchants/{merchantId}/status"),
        )
        .field(merchant_id()),
        ToolSpec::new(
            "insumer_configure_tokens",
            "Set a merchant's own token and partner tokens with their discount tiers. Pass ownToken: null to remove the own token.",
            Route::put("/merchants/{merchantId}/tokens"),
        )
        .field(merchant_id())
        .field(
            Field::new("ownToken", "The merchant's own token, or null to remove it", token_config())
                .nullable(),
        )
        .field(Field::new(
            "partnerTokens",
            "Partner tokens (0-8)",
            FieldKind::array(token_config(), 0, 8),
        )),
        ToolSpec::new(
            "insumer_configure_nfts",
            "Replace a merchant's NFT collections. An empty list removes them all.",
            Route::put("/merchants/{merchantId}/nfts"),
        )
        .field(merchant_id())
        .field(
            Field::new(
                "nftCollections",
                "NFT collections (0-4)",
                FieldKind::array(nft_config(), 0, 4),
            )
            .required(),
        ),
        ToolSpec::new(
            "insumer_configure_settings",
            "Update a merchant's discount mode, discount cap and USDC payment settings.",
            Route::put("/merchants/{merchantId}/settings"),
        )
        .field(merchant_id())
        .field(Field::new(
            "discountMode",
            "\"highest\" applies the best tier, \"stack\" adds them up",
            FieldKind::Enum(&["highest", "stack"]),
        ))
        .field(Field::new(
            "discountCap",
            "Maximum total discount percentage",
            FieldKind::integer(1, 100),
        ))
        .field(
            Field::new(
                "usdcPayment",
                "USDC payment settings, or null to disable",
                FieldKind::Object(vec![
                    Field::new("enabled", "Accept USDC payments", FieldKind::Boolean).required(),
                    Field::new("evmAddress", "Receiving EVM address", any_string()),
                    Field::new("solanaAddress", "Receiving Solana address", any_string()),
                    Field::new(
                        "preferredChainId",
                        "Preferred settlement chain",
                        FieldKind::Chain(&SETTLEMENT_CHAINS),
                    ),
                ]),
            )
            .nullable(),
        ),
        ToolSpec::new(
            "insumer_publish_directory",
            "Publish or refresh a merchant's listing in the public directory.",
            Route::post("/merchants/{merchantId}/directory"),
        )
        .field(merchant_id()),
        ToolSpec::new(
            "insumer_buy_merchant_credits",
            "Top up a merchant's verification credits with a USDC payment already sent on-chain.",
            Route::post("/merchants/{merchantId}/credits"),
        )
        .field(merchant_id())
        .field(tx_hash())
        .field(settlement_chain("Chain the USDC was sent on").required())
        .field(usdc_amount("USDC amount sent")),
        ToolSpec::new(
            "insumer_request_domain_verification",
            "Request a domain verification token for a merchant.",
            Route::post("/merchants/{merchantId}/domain-verification"),
        )
        .field(merchant_id())
        .field(Field::new("domain", "Domain to verify", bounded_string(3, 253)).required()),
        ToolSpec::new(
            "insumer_verify_domain",
            "Check the verification token placed in DNS, a meta tag or a well-known file.",
            Route::put("/merchants/{merchantId}/domain-verification"),
        )
        .field(merchant_id())
        .field(Field::new(
            "method",
            "Where the token was placed",
            FieldKind::Enum(&["dns", "meta", "file"]),
        )),
        commerce_discount(
            "insumer_acp_discount",
            "Check a wallet's discount in Agentic Commerce Protocol format (OpenAI/Stripe coupon objects).",
            "/acp/discount",
        ),
        commerce_discount(
            "insumer_ucp_discount",
            "Check a wallet's discount in Universal Commerce Protocol format (Google applied discounts).",
            "/ucp/discount",
        ),
    ]
}
