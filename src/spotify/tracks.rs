use serde::Deserialize;

use crate::{
    error::ApiError,
    spotify::{ResourceFetcher, ResourceRequest, SpotifyClient},
    types::{AudioFeatures, Track, Validate},
};

/// The Web API accepts at most this many ids per batch request.
pub const MAX_TRACK_IDS: usize = 50;
pub const MAX_AUDIO_FEATURE_IDS: usize = 100;

#[derive(Debug, Deserialize)]
struct SeveralTracks {
    tracks: Vec<Option<Track>>,
}

#[derive(Debug, Deserialize)]
struct SeveralAudioFeatures {
    audio_features: Vec<Option<AudioFeatures>>,
}

impl<F: ResourceFetcher> SpotifyClient<F> {
    /// `GET /tracks/{id}`
    pub async fn track(&self, track_id: &str) -> Result<Track, ApiError> {
        self.fetch(ResourceRequest::get(format!("tracks/{track_id}")))
            .await
    }

    /// `GET /tracks?ids=…`, batched by [`MAX_TRACK_IDS`].
    ///
    /// Unknown ids are skipped.
    pub async fn tracks(&self, track_ids: &[&str]) -> Result<Vec<Track>, ApiError> {
        let mut tracks = Vec::with_capacity(track_ids.len());
        for chunk in track_ids.chunks(MAX_TRACK_IDS) {
            let several: SeveralTracks = self
                .fetch_unchecked(ResourceRequest::get("tracks").query("ids", chunk.join(",")))
                .await?;
            let found: Vec<Track> = several.tracks.into_iter().flatten().collect();
            found.validate()?;
            tracks.extend(found);
        }
        Ok(tracks)
    }

    /// Audio features of a single track.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NoAudioFeatures`] when the API has none for it.
    pub async fn audio_features(&self, track_id: &str) -> Result<AudioFeatures, ApiError> {
        self.audio_features_multiple(&[track_id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NoAudioFeatures(track_id.to_string()))
    }

    /// `GET /audio-features?ids=…`; tracks without features are skipped.
    pub async fn audio_features_multiple(
        &self,
        track_ids: &[&str],
    ) -> Result<Vec<AudioFeatures>, ApiError> {
        let mut features = Vec::with_capacity(track_ids.len());
        for chunk in track_ids.chunks(MAX_AUDIO_FEATURE_IDS) {
            let several: SeveralAudioFeatures = self
                .fetch_unchecked(
                    ResourceRequest::get("audio-features").query("ids", chunk.join(",")),
                )
                .await?;
            let found: Vec<AudioFeatures> =
                several.audio_features.into_iter().flatten().collect();
            found.validate()?;
            features.extend(found);
        }
        Ok(features)
    }
}
