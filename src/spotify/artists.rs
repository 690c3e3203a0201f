use serde::Deserialize;

use crate::{
    error::ApiError,
    spotify::{
        ResourceFetcher, ResourceRequest, SpotifyClient,
        client::{MAX_PAGE_LIMIT, clamp_limit},
    },
    types::{AlbumType, Artist, Page, SimplifiedAlbum, Track, Validate},
};

#[derive(Debug, Deserialize)]
struct TopTracks {
    tracks: Vec<Track>,
}

impl<F: ResourceFetcher> SpotifyClient<F> {
    /// `GET /artists/{id}`
    pub async fn artist(&self, artist_id: &str) -> Result<Artist, ApiError> {
        self.fetch(ResourceRequest::get(format!("artists/{artist_id}")))
            .await
    }

    /// `GET /artists/{id}/albums`, optionally restricted to one album type.
    pub async fn artist_albums(
        &self,
        artist_id: &str,
        album_type: Option<AlbumType>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<SimplifiedAlbum>, ApiError> {
        let page: Page<SimplifiedAlbum> = self
            .fetch(
                ResourceRequest::get(format!("artists/{artist_id}/albums"))
                    .query_opt("include_groups", album_type.map(|t| t.as_str()))
                    .query("limit", clamp_limit(limit, MAX_PAGE_LIMIT))
                    .query("offset", offset),
            )
            .await?;
        Ok(page.items)
    }

    /// `GET /artists/{id}/top-tracks` for the given market (e.g. `US`).
    pub async fn artist_top_tracks(
        &self,
        artist_id: &str,
        market: &str,
    ) -> Result<Vec<Track>, ApiError> {
        let top: TopTracks = self
            .fetch_unchecked(
                ResourceRequest::get(format!("artists/{artist_id}/top-tracks"))
                    .query("market", market),
            )
            .await?;
        top.tracks.validate()?;
        Ok(top.tracks)
    }
}
