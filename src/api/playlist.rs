use anyhow::Result;
use serde_json::Value;

use crate::Chartmetric;

/// Track listing span used when the caller has no preference.
pub const DEFAULT_PLAYLIST_SPAN: &str = "current";

impl Chartmetric {
    /// Playlist metadata, e.g. `platform = "spotify"`.
    pub async fn playlist(&self, platform: &str, playlist_id: &str) -> Result<Option<Value>> {
        self.get(&format!("playlist/{}/{}", platform, playlist_id), &[], None)
            .await
    }

    /// Follower/position history of a playlist.
    pub async fn playlist_evolution(
        &self,
        platform: &str,
        playlist_id: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<Value>> {
        self.get(
            &format!("playlist/{}/{}/evolution", platform, playlist_id),
            params,
            None,
        )
        .await
    }

    /// Tracks on a playlist. `span` is `"current"` or `"past"`; `None` means current.
    pub async fn playlist_tracks(
        &self,
        platform: &str,
        playlist_id: &str,
        span: Option<&str>,
    ) -> Result<Option<Value>> {
        let span = span.unwrap_or(DEFAULT_PLAYLIST_SPAN);
        self.get(
            &format!("playlist/{}/{}/{}/tracks", platform, playlist_id, span),
            &[],
            None,
        )
        .await
    }
}
