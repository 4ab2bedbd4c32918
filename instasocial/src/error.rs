use alloy::transports::TransportError;
use thiserror::Error;

/// EIP-1193 error code a wallet returns when asked to switch to a chain it does not know.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;
/// EIP-1193 error code for a request the user declined.
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("no wallet provider available")]
    ProviderUnavailable,

    #[error("chain {0:#x} is not registered with the wallet")]
    UnrecognizedChain(u64),

    #[error("request rejected by the user")]
    UserRejected,

    #[error("wallet returned no accounts")]
    NoAccounts,

    #[error("endpoint reports chain {actual}, expected {expected}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("wallet rpc error: {0}")]
    Rpc(String),
}

impl WalletError {
    /// The EIP-1193 code this error corresponds to, when there is one.
    pub fn code(&self) -> Option<i64> {
        match self {
            WalletError::UnrecognizedChain(_) => Some(UNRECOGNIZED_CHAIN_CODE),
            WalletError::UserRejected => Some(USER_REJECTED_CODE),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("transaction reverted{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    Reverted { reason: Option<String> },

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("contract transport error: {0}")]
    Transport(String),

    #[error("malformed contract response: {0}")]
    Decode(String),
}

impl ContractError {
    /// Reason string supplied by the contract, if the failure carried one.
    pub fn reason(&self) -> Option<&str> {
        match self {
            ContractError::Reverted { reason } => reason.as_deref(),
            _ => None,
        }
    }

    fn from_transport(err: &TransportError) -> Self {
        let Some(payload) = err.as_error_resp() else {
            return ContractError::Transport(err.to_string());
        };
        let reason = payload
            .as_revert_data()
            .and_then(|data| alloy::sol_types::decode_revert_reason(&data))
            .map(|decoded| decoded.trim_start_matches("revert: ").to_string())
            .or_else(|| revert_reason_from_message(&payload.message));
        if reason.is_some() || payload.message.contains("revert") {
            ContractError::Reverted { reason }
        } else {
            ContractError::Rejected(payload.message.to_string())
        }
    }
}

impl From<alloy::contract::Error> for ContractError {
    fn from(err: alloy::contract::Error) -> Self {
        use alloy::contract::Error as E;
        match &err {
            E::TransportError(transport) => ContractError::from_transport(transport),
            E::AbiError(_) | E::ZeroData(..) => ContractError::Decode(err.to_string()),
            _ => ContractError::Transport(err.to_string()),
        }
    }
}

impl From<TransportError> for ContractError {
    fn from(err: TransportError) -> Self {
        ContractError::from_transport(&err)
    }
}

impl From<alloy::providers::PendingTransactionError> for ContractError {
    fn from(err: alloy::providers::PendingTransactionError) -> Self {
        ContractError::Transport(err.to_string())
    }
}

/// Node error messages look like `execution reverted: <reason>`; pull the reason out.
pub fn revert_reason_from_message(message: &str) -> Option<String> {
    let (_, reason) = message.split_once("reverted:")?;
    let reason = reason.trim();
    if reason.is_empty() {
        None
    } else {
        Some(reason.to_string())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("username is required")]
    EmptyUsername,

    #[error("username exceeds {max} characters")]
    UsernameTooLong { max: usize },

    #[error("post content is required")]
    EmptyContent,

    #[error("post content exceeds {max} characters")]
    ContentTooLong { max: usize },

    #[error("invalid tip amount {0:?}")]
    InvalidTipAmount(String),

    #[error("profile NFT already minted")]
    NftAlreadyMinted,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no active wallet session")]
    NotConnected,
}

impl ClientError {
    /// Contract reason when available, otherwise the given fallback text.
    pub fn user_message<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self {
            ClientError::Contract(err) => err.reason().unwrap_or(fallback),
            _ => fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revert_reason_is_extracted_from_node_message() {
        assert_eq!(revert_reason_from_message("execution reverted: Username taken").as_deref(), Some("Username taken"));
        assert_eq!(revert_reason_from_message("execution reverted:"), None);
        assert_eq!(revert_reason_from_message("insufficient funds for gas"), None);
    }

    #[test]
    fn user_message_prefers_contract_reason() {
        let with_reason = ClientError::from(ContractError::Reverted { reason: Some("Profile exists".into()) });
        assert_eq!(with_reason.user_message("Failed to create profile"), "Profile exists");

        let without_reason = ClientError::from(ContractError::Reverted { reason: None });
        assert_eq!(without_reason.user_message("Failed to create profile"), "Failed to create profile");

        let transport = ClientError::from(ContractError::Transport("timeout".into()));
        assert_eq!(transport.user_message("Failed to send tip"), "Failed to send tip");
    }

    #[test]
    fn wallet_errors_map_to_eip1193_codes() {
        assert_eq!(WalletError::UnrecognizedChain(6342).code(), Some(UNRECOGNIZED_CHAIN_CODE));
        assert_eq!(WalletError::UserRejected.code(), Some(USER_REJECTED_CODE));
        assert_eq!(WalletError::NoAccounts.code(), None);
        assert_eq!(WalletError::UnrecognizedChain(6342).to_string(), "chain 0x18c6 is not registered with the wallet");
    }
}
