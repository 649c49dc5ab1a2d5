#[cfg(test)]
pub mod mock;
mod sdk;

use std::sync::Arc;

use anyhow::Result;

pub use sdk::SdkClient;

use crate::cloudwatch::config::ProfileConfig;

/// Builds the CloudWatch Logs client for the given profile, or for the AWS defaults when `None`
pub async fn create_client(profile: Option<&ProfileConfig>) -> Result<Arc<SdkClient>> {
    Ok(Arc::new(SdkClient::new(profile).await?))
}
