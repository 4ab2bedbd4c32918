//! Deployment descriptor written by `instasocial-deploy` and compiled into the client.

use anyhow::bail;
use instasocial::deployment::DeploymentInfo;

const CONTRACT_ADDRESS_JSON: &str = include_str!("../deployment/contract-address.json");
const CONTRACT_ABI_JSON: &str = include_str!("../deployment/contract-abi.json");

/// Contract functions the client calls.
pub const CLIENT_FUNCTIONS: [&str; 8] =
    ["getProfile", "getRecentPosts", "getPost", "createProfile", "createPost", "likePost", "tipPost", "mintProfileNFT"];

pub fn embedded() -> Result<DeploymentInfo, serde_json::Error> {
    DeploymentInfo::from_json(CONTRACT_ADDRESS_JSON)
}

/// Client functions absent from `abi_json`.
fn missing_functions(abi_json: &str) -> Result<Vec<&'static str>, serde_json::Error> {
    let abi: Vec<serde_json::Value> = serde_json::from_str(abi_json)?;
    let present: Vec<&str> =
        abi.iter().filter(|item| item["type"] == "function").filter_map(|item| item["name"].as_str()).collect();
    Ok(CLIENT_FUNCTIONS.into_iter().filter(|name| !present.contains(name)).collect())
}

/// Refuse to start against a bundled ABI that lacks any function the client calls.
pub fn check_bundled_abi() -> anyhow::Result<()> {
    let missing = missing_functions(CONTRACT_ABI_JSON)?;
    if !missing.is_empty() {
        bail!("bundled contract ABI is missing {}; redeploy with instasocial-deploy", missing.join(", "));
    }
    Ok(())
}
