use anyhow::Result;
use serde_json::Value;

use crate::Chartmetric;

impl Chartmetric {
    /// Curator metadata.
    pub async fn curator(&self, platform: &str, curator_id: &str) -> Result<Option<Value>> {
        self.get(&format!("curator/{}/{}", platform, curator_id), &[], None)
            .await
    }

    /// All curators known on a platform.
    pub async fn curator_lists(&self, platform: &str) -> Result<Option<Value>> {
        self.get(&format!("curator/{}/lists", platform), &[], None)
            .await
    }
}
