//! Contract boundary. Tuple-shaped responses from the `InstaSocial` contract are decoded through
//! `sol!` bindings and converted into named records before anything else sees them.

use std::sync::Arc;

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use alloy::sol;
use async_trait::async_trait;
use log::{debug, warn};

use crate::error::ContractError;
use crate::model::{Post, PostId, Profile};
use crate::wallet::SigningHandle;

sol! {
    #[sol(rpc)]
    interface IInstaSocial {
        function getProfile(address user) external view returns (
            string memory username,
            string memory bio,
            string memory avatarURI,
            uint256 nftProfileId,
            uint256 followers,
            uint256 following,
            uint256 postCount
        );

        function getRecentPosts(uint256 count, uint256 offset) external view returns (uint256[] memory postIds);

        function getPost(uint256 postId) external view returns (
            uint256 id,
            address author,
            string memory username,
            string memory content,
            string memory imageURI,
            uint256 timestamp,
            uint256 likes,
            uint256 tips,
            uint256 commentCount,
            bool isLiked
        );

        function createProfile(string memory username, string memory bio, string memory avatarURI) external;
        function createPost(string memory content, string memory imageURI) external;
        function likePost(uint256 postId) external;
        function tipPost(uint256 postId) external payable;
        function mintProfileNFT() external payable;
    }
}

/// Read and write methods the client consumes. Writes resolve once the transaction is confirmed.
#[async_trait]
pub trait SocialContract: Send + Sync {
    async fn get_profile(&self, account: Address) -> Result<Profile, ContractError>;

    async fn get_recent_posts(&self, count: u64, offset: u64) -> Result<Vec<PostId>, ContractError>;

    async fn get_post(&self, id: PostId) -> Result<Post, ContractError>;

    async fn create_profile(&self, username: &str, bio: &str, avatar_uri: &str) -> Result<TxHash, ContractError>;

    async fn create_post(&self, content: &str, image_uri: &str) -> Result<TxHash, ContractError>;

    async fn like_post(&self, id: PostId) -> Result<TxHash, ContractError>;

    async fn tip_post(&self, id: PostId, value: U256) -> Result<TxHash, ContractError>;

    async fn mint_profile_nft(&self, fee: U256) -> Result<TxHash, ContractError>;
}

/// Binds a contract instance to a wallet session's signing handle.
pub trait ContractConnector: Send + Sync {
    fn bind(&self, handle: &SigningHandle) -> Result<Arc<dyn SocialContract>, ContractError>;
}

fn to_u64(field: &str, value: U256) -> Result<u64, ContractError> {
    u64::try_from(value).map_err(|_| ContractError::Decode(format!("{field} does not fit in u64: {value}")))
}

impl TryFrom<IInstaSocial::getProfileReturn> for Profile {
    type Error = ContractError;

    fn try_from(raw: IInstaSocial::getProfileReturn) -> Result<Self, Self::Error> {
        let nft_id = to_u64("nftProfileId", raw.nftProfileId)?;
        Ok(Profile {
            username: raw.username,
            bio: raw.bio,
            avatar_uri: raw.avatarURI,
            nft_id: (nft_id != 0).then_some(nft_id),
            followers: to_u64("followers", raw.followers)?,
            following: to_u64("following", raw.following)?,
            post_count: to_u64("postCount", raw.postCount)?,
        })
    }
}

impl TryFrom<IInstaSocial::getPostReturn> for Post {
    type Error = ContractError;

    fn try_from(raw: IInstaSocial::getPostReturn) -> Result<Self, Self::Error> {
        Ok(Post {
            id: to_u64("id", raw.id)?,
            author: raw.author,
            username: raw.username,
            content: raw.content,
            image_uri: raw.imageURI,
            timestamp: to_u64("timestamp", raw.timestamp)?,
            likes: to_u64("likes", raw.likes)?,
            tips: raw.tips,
            comment_count: to_u64("commentCount", raw.commentCount)?,
            liked_by_viewer: raw.isLiked,
        })
    }
}

fn confirmed(receipt: TransactionReceipt) -> Result<TxHash, ContractError> {
    if receipt.status() {
        Ok(receipt.transaction_hash)
    } else {
        Err(ContractError::Reverted { reason: None })
    }
}

/// `SocialContract` over JSON-RPC. View calls are sent `from` the session account so that
/// per-viewer fields such as `isLiked` resolve for the connected user.
pub struct RpcSocialContract {
    account: Address,
    instance: IInstaSocial::IInstaSocialInstance<DynProvider>,
}

impl RpcSocialContract {
    pub fn new(address: Address, account: Address, provider: DynProvider) -> Self {
        Self { account, instance: IInstaSocial::new(address, provider) }
    }
}

#[async_trait]
impl SocialContract for RpcSocialContract {
    async fn get_profile(&self, account: Address) -> Result<Profile, ContractError> {
        let raw = self.instance.getProfile(account).from(self.account).call().await?;
        raw.try_into()
    }

    async fn get_recent_posts(&self, count: u64, offset: u64) -> Result<Vec<PostId>, ContractError> {
        let ids = self.instance.getRecentPosts(U256::from(count), U256::from(offset)).from(self.account).call().await?;
        ids.into_iter().map(|id| to_u64("postId", id)).collect()
    }

    async fn get_post(&self, id: PostId) -> Result<Post, ContractError> {
        let raw = self.instance.getPost(U256::from(id)).from(self.account).call().await?;
        raw.try_into()
    }

    async fn create_profile(&self, username: &str, bio: &str, avatar_uri: &str) -> Result<TxHash, ContractError> {
        let pending =
            self.instance.createProfile(username.to_string(), bio.to_string(), avatar_uri.to_string()).send().await?;
        debug!("createProfile submitted: {}", pending.tx_hash());
        confirmed(pending.get_receipt().await?)
    }

    async fn create_post(&self, content: &str, image_uri: &str) -> Result<TxHash, ContractError> {
        let pending = self.instance.createPost(content.to_string(), image_uri.to_string()).send().await?;
        debug!("createPost submitted: {}", pending.tx_hash());
        confirmed(pending.get_receipt().await?)
    }

    async fn like_post(&self, id: PostId) -> Result<TxHash, ContractError> {
        let pending = self.instance.likePost(U256::from(id)).send().await?;
        debug!("likePost({id}) submitted: {}", pending.tx_hash());
        confirmed(pending.get_receipt().await?)
    }

    async fn tip_post(&self, id: PostId, value: U256) -> Result<TxHash, ContractError> {
        let pending = self.instance.tipPost(U256::from(id)).value(value).send().await?;
        debug!("tipPost({id}, {value} wei) submitted: {}", pending.tx_hash());
        confirmed(pending.get_receipt().await?)
    }

    async fn mint_profile_nft(&self, fee: U256) -> Result<TxHash, ContractError> {
        let pending = self.instance.mintProfileNFT().value(fee).send().await?;
        debug!("mintProfileNFT submitted: {}", pending.tx_hash());
        confirmed(pending.get_receipt().await?)
    }
}

/// Connects to the deployed contract through the RPC endpoint of the session's active network.
#[derive(Clone, Debug)]
pub struct RpcConnector {
    contract_address: Address,
}

impl RpcConnector {
    pub fn new(contract_address: Address) -> Self {
        if contract_address.is_zero() {
            warn!("Contract address is zero; reads will fail until the contract is deployed");
        }
        Self { contract_address }
    }
}

impl ContractConnector for RpcConnector {
    fn bind(&self, handle: &SigningHandle) -> Result<Arc<dyn SocialContract>, ContractError> {
        let provider =
            ProviderBuilder::new().wallet(handle.wallet().clone()).connect_http(handle.rpc_url().clone()).erased();
        Ok(Arc::new(RpcSocialContract::new(self.contract_address, handle.account(), provider)))
    }
}
