use anyhow::Result;
use serde_json::Value;

use crate::Chartmetric;

impl Chartmetric {
    /// Track metadata.
    pub async fn track(&self, track_id: &str) -> Result<Option<Value>> {
        self.get(&format!("track/{}", track_id), &[], None).await
    }

    /// Free-text search across artists, tracks, playlists and curators.
    /// Extra filters (`type`, `limit`, ...) go in `params`.
    pub async fn search(&self, query: &str, params: &[(&str, &str)]) -> Result<Option<Value>> {
        let mut all_params = Vec::with_capacity(params.len() + 1);
        all_params.push(("q", query));
        all_params.extend_from_slice(params);
        self.get("search", &all_params, None).await
    }

    /// Chart entries for a track on one platform.
    pub async fn track_charts(
        &self,
        track_id: &str,
        platform: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<Value>> {
        self.get(
            &format!("track/{}/{}/charts", track_id, platform),
            params,
            None,
        )
        .await
    }

    /// Streaming/engagement stats for a track on one platform.
    pub async fn track_stats(
        &self,
        track_id: &str,
        platform: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<Value>> {
        self.get(
            &format!("track/{}/{}/stats", track_id, platform),
            params,
            None,
        )
        .await
    }
}
