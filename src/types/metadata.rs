use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, UiMessage,
    UiTransactionTokenBalance, option_serializer::OptionSerializer,
};

/// Balance snapshot of a confirmed transaction.
///
/// Fetched once per signature and never mutated afterwards. `pre_balances` and
/// `post_balances` are indexed like `account_keys`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionRecord {
    /// The transaction signature.
    pub signature: String,
    /// The slot number where the transaction was confirmed.
    pub slot: u64,
    /// The block time (Unix timestamp) if available.
    pub block_time: Option<i64>,
    /// Full account list: static keys followed by address-lookup-table keys.
    pub account_keys: Vec<String>,
    /// Native balances (lamports) before the transaction.
    pub pre_balances: Vec<u64>,
    /// Native balances (lamports) after the transaction.
    pub post_balances: Vec<u64>,
    /// Token balances before the transaction, `None` when the node did not report them.
    pub pre_token_balances: Option<Vec<TokenBalanceInfo>>,
    /// Token balances after the transaction, `None` when the node did not report them.
    pub post_token_balances: Option<Vec<TokenBalanceInfo>>,
}

/// One token account balance as reported in the transaction meta.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenBalanceInfo {
    /// Index of the token account in the transaction's account list.
    pub account_index: u8,
    /// The mint address of the token.
    pub mint: String,
    /// The wallet owning the token account.
    pub owner: Option<String>,
    /// Balance in display units. A missing `uiAmount` reads as zero.
    pub ui_amount: f64,
    pub decimals: u8,
}

impl From<UiTransactionTokenBalance> for TokenBalanceInfo {
    fn from(balance: UiTransactionTokenBalance) -> Self {
        Self {
            account_index: balance.account_index,
            mint: balance.mint,
            owner: match balance.owner {
                OptionSerializer::Some(owner) => Some(owner),
                _ => None,
            },
            ui_amount: balance.ui_token_amount.ui_amount.unwrap_or(0.0),
            decimals: balance.ui_token_amount.decimals,
        }
    }
}

impl TransactionRecord {
    /// Converts an RPC transaction into a record.
    ///
    /// Returns `None` when the transaction carries no status meta or uses a binary
    /// encoding whose account list cannot be read without decoding the message.
    #[must_use]
    pub fn from_encoded(
        signature: impl Into<String>,
        tx: EncodedConfirmedTransactionWithStatusMeta,
    ) -> Option<Self> {
        let EncodedConfirmedTransactionWithStatusMeta {
            slot,
            transaction,
            block_time,
        } = tx;
        let meta = transaction.meta?;

        let account_keys = match transaction.transaction {
            EncodedTransaction::Json(ui_tx) => match ui_tx.message {
                // jsonParsed already lists lookup-table keys after the static ones
                UiMessage::Parsed(message) => message
                    .account_keys
                    .into_iter()
                    .map(|account| account.pubkey)
                    .collect(),
                UiMessage::Raw(message) => {
                    let mut keys = message.account_keys;
                    if let OptionSerializer::Some(loaded) = &meta.loaded_addresses {
                        keys.extend(loaded.writable.iter().cloned());
                        keys.extend(loaded.readonly.iter().cloned());
                    }
                    keys
                }
            },
            EncodedTransaction::Accounts(list) => list
                .account_keys
                .into_iter()
                .map(|account| account.pubkey)
                .collect(),
            _ => return None,
        };

        Some(Self {
            signature: signature.into(),
            slot,
            block_time,
            account_keys,
            pre_balances: meta.pre_balances,
            post_balances: meta.post_balances,
            pre_token_balances: token_balances(meta.pre_token_balances),
            post_token_balances: token_balances(meta.post_token_balances),
        })
    }

    /// Position of `address` in the account list.
    #[must_use]
    pub fn account_index(&self, address: &str) -> Option<usize> {
        self.account_keys.iter().position(|key| key == address)
    }
}

fn token_balances(
    balances: OptionSerializer<Vec<UiTransactionTokenBalance>>,
) -> Option<Vec<TokenBalanceInfo>> {
    match balances {
        OptionSerializer::Some(list) => Some(list.into_iter().map(Into::into).collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
    const POOL: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
    const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    fn encoded(message: serde_json::Value) -> EncodedConfirmedTransactionWithStatusMeta {
        serde_json::from_value(json!({
            "slot": 250_000_000u64,
            "blockTime": 1_700_000_000i64,
            "version": 0,
            "transaction": {
                "signatures": ["sig1"],
                "message": message
            },
            "meta": {
                "err": null,
                "status": { "Ok": null },
                "fee": 5000,
                "preBalances": [2_000_000_000u64, 10],
                "postBalances": [1_499_995_000u64, 10],
                "innerInstructions": [],
                "logMessages": [],
                "preTokenBalances": [{
                    "accountIndex": 1,
                    "mint": USDC,
                    "owner": WALLET,
                    "uiTokenAmount": {
                        "uiAmount": null,
                        "decimals": 6,
                        "amount": "0",
                        "uiAmountString": "0"
                    }
                }],
                "postTokenBalances": [],
                "rewards": [],
                "loadedAddresses": { "writable": [POOL], "readonly": [] }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_raw_message_appends_loaded_addresses() {
        let tx = encoded(json!({
            "header": {
                "numRequiredSignatures": 1,
                "numReadonlySignedAccounts": 0,
                "numReadonlyUnsignedAccounts": 0
            },
            "accountKeys": [WALLET],
            "recentBlockhash": "11111111111111111111111111111111",
            "instructions": []
        }));

        let record = TransactionRecord::from_encoded("sig1", tx).unwrap();
        assert_eq!(record.account_keys, vec![WALLET.to_string(), POOL.to_string()]);
        assert_eq!(record.account_index(POOL), Some(1));
        assert_eq!(record.slot, 250_000_000);
        assert_eq!(record.block_time, Some(1_700_000_000));
    }

    #[test]
    fn test_missing_ui_amount_reads_as_zero() {
        let tx = encoded(json!({
            "accountKeys": [
                { "pubkey": WALLET, "writable": true, "signer": true, "source": "transaction" }
            ],
            "recentBlockhash": "11111111111111111111111111111111",
            "instructions": []
        }));

        let record = TransactionRecord::from_encoded("sig1", tx).unwrap();
        let pre = record.pre_token_balances.unwrap();
        assert_eq!(pre.len(), 1);
        assert_eq!(pre[0].ui_amount, 0.0);
        assert_eq!(pre[0].owner.as_deref(), Some(WALLET));
        assert_eq!(record.post_token_balances, Some(vec![]));
    }

    #[test]
    fn test_account_index_absent() {
        let record = TransactionRecord {
            account_keys: vec![POOL.to_string()],
            ..Default::default()
        };
        assert_eq!(record.account_index(WALLET), None);
    }
}
