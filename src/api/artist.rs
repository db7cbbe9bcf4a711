use anyhow::Result;
use serde_json::Value;

use crate::Chartmetric;

impl Chartmetric {
    /// Artist metadata.
    pub async fn artist(&self, artist_id: &str) -> Result<Option<Value>> {
        self.get(&format!("artist/{}", artist_id), &[], None).await
    }

    /// Social and streaming profile URLs for an artist.
    pub async fn artist_urls(&self, artist_id: &str) -> Result<Option<Value>> {
        self.get(&format!("artist/{}/urls", artist_id), &[], None)
            .await
    }

    /// Chart entries for an artist, e.g. `chart_type = "spotify_top_daily"`.
    /// Date bounds such as `since`/`until` go in `params`.
    pub async fn artist_charts(
        &self,
        artist_id: &str,
        chart_type: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<Value>> {
        self.get(
            &format!("artist/{}/{}/charts", artist_id, chart_type),
            params,
            None,
        )
        .await
    }
}
