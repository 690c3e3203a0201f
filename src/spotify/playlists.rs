use serde_json::json;

use crate::{
    error::ApiError,
    spotify::{
        ResourceFetcher, ResourceRequest, SpotifyClient,
        client::{MAX_PAGE_LIMIT, clamp_limit},
    },
    types::{
        CreatePlaylistRequest, Page, Playlist, PlaylistTrack, PlaylistWithTracks,
        SnapshotResponse,
    },
};

/// Maximum number of items per add/remove request.
pub const MAX_PLAYLIST_ITEMS: usize = 100;

impl<F: ResourceFetcher> SpotifyClient<F> {
    /// `GET /users/{id}/playlists`
    pub async fn user_playlists(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Playlist>, ApiError> {
        let page: Page<Playlist> = self
            .fetch(
                ResourceRequest::get(format!("users/{user_id}/playlists"))
                    .query("limit", clamp_limit(limit, MAX_PAGE_LIMIT))
                    .query("offset", offset),
            )
            .await?;
        Ok(page.items)
    }

    /// `GET /playlists/{id}` with the track list left as a reference.
    ///
    /// `fields` is the Web API's field filter, e.g. `"id,name,owner"`.
    pub async fn playlist(
        &self,
        playlist_id: &str,
        fields: Option<&str>,
    ) -> Result<Playlist, ApiError> {
        self.fetch(
            ResourceRequest::get(format!("playlists/{playlist_id}")).query_opt("fields", fields),
        )
        .await
    }

    /// `GET /playlists/{id}` including the first page of tracks.
    pub async fn playlist_with_tracks(
        &self,
        playlist_id: &str,
    ) -> Result<PlaylistWithTracks, ApiError> {
        self.fetch(ResourceRequest::get(format!("playlists/{playlist_id}")))
            .await
    }

    /// `GET /playlists/{id}/tracks`
    pub async fn playlist_tracks(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistTrack>, ApiError> {
        self.fetch(
            ResourceRequest::get(format!("playlists/{playlist_id}/tracks"))
                .query("limit", clamp_limit(limit, MAX_PLAYLIST_ITEMS as u32))
                .query("offset", offset),
        )
        .await
    }

    /// `POST /users/{id}/playlists`
    pub async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<Playlist, ApiError> {
        let body = CreatePlaylistRequest {
            name: name.to_string(),
            description: description.to_string(),
            public,
        };
        self.fetch(
            ResourceRequest::post(format!("users/{user_id}/playlists")).json(json!(body)),
        )
        .await
    }

    /// `POST /playlists/{id}/tracks`, returning the new snapshot id.
    ///
    /// Batches of more than [`MAX_PLAYLIST_ITEMS`] URIs are sent in order;
    /// with an explicit `position` each batch is inserted after the previous
    /// one. An empty `track_uris` is rejected without a request.
    pub async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        track_uris: &[&str],
        position: Option<u32>,
    ) -> Result<String, ApiError> {
        ensure_uris(track_uris)?;
        let mut snapshot_id = String::new();
        let mut position = position;

        for chunk in track_uris.chunks(MAX_PLAYLIST_ITEMS) {
            let mut body = json!({ "uris": chunk });
            if let Some(pos) = position {
                body["position"] = json!(pos);
                position = Some(pos.saturating_add(chunk.len() as u32));
            }

            let snapshot: SnapshotResponse = self
                .fetch_unchecked(
                    ResourceRequest::post(format!("playlists/{playlist_id}/tracks")).json(body),
                )
                .await?;
            snapshot_id = snapshot.snapshot_id;
        }

        Ok(snapshot_id)
    }

    /// `DELETE /playlists/{id}/tracks`, removing every occurrence of each URI.
    pub async fn remove_tracks_from_playlist(
        &self,
        playlist_id: &str,
        track_uris: &[&str],
    ) -> Result<String, ApiError> {
        ensure_uris(track_uris)?;
        let mut snapshot_id = String::new();

        for chunk in track_uris.chunks(MAX_PLAYLIST_ITEMS) {
            let tracks: Vec<_> = chunk.iter().map(|uri| json!({ "uri": uri })).collect();
            let snapshot: SnapshotResponse = self
                .fetch_unchecked(
                    ResourceRequest::delete(format!("playlists/{playlist_id}/tracks"))
                        .json(json!({ "tracks": tracks })),
                )
                .await?;
            snapshot_id = snapshot.snapshot_id;
        }

        Ok(snapshot_id)
    }
}

fn ensure_uris(track_uris: &[&str]) -> Result<(), ApiError> {
    if track_uris.is_empty() {
        return Err(ApiError::Invalid {
            model: "playlist items",
            reason: "at least one track uri is required".to_string(),
        });
    }
    Ok(())
}
