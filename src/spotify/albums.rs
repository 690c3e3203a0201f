use crate::{
    error::ApiError,
    spotify::{
        ResourceFetcher, ResourceRequest, SpotifyClient,
        client::{MAX_PAGE_LIMIT, clamp_limit},
    },
    types::{Album, Page, SimplifiedTrack},
};

impl<F: ResourceFetcher> SpotifyClient<F> {
    /// `GET /albums/{id}`
    pub async fn album(&self, album_id: &str) -> Result<Album, ApiError> {
        self.fetch(ResourceRequest::get(format!("albums/{album_id}")))
            .await
    }

    /// `GET /albums/{id}/tracks`
    pub async fn album_tracks(
        &self,
        album_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<SimplifiedTrack>, ApiError> {
        self.fetch(
            ResourceRequest::get(format!("albums/{album_id}/tracks"))
                .query("limit", clamp_limit(limit, MAX_PAGE_LIMIT))
                .query("offset", offset),
        )
        .await
    }
}
