use serde::de::DeserializeOwned;

use crate::{
    error::ApiError,
    spotify::{ResourceFetcher, ResourceRequest},
    types::{
        Artist, Page, Recommendations, RecommendationSeeds, SearchResult, SearchType, TimeRange,
        Track, UserProfile, Validate,
    },
};

/// Upper bound the Web API accepts for most `limit` parameters.
pub const MAX_PAGE_LIMIT: u32 = 50;
pub const MAX_RECOMMENDATION_LIMIT: u32 = 100;
pub const MAX_RECOMMENDATION_SEEDS: usize = 5;

/// Typed accessors over the Spotify Web API.
///
/// Every response is decoded into the models from [`crate::types`] and
/// validated before it is returned. The client holds no token itself; all
/// requests go through the injected [`ResourceFetcher`].
#[derive(Debug, Clone)]
pub struct SpotifyClient<F> {
    fetcher: F,
}

impl<F: ResourceFetcher> SpotifyClient<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetches, decodes and validates a single model.
    pub(crate) async fn fetch<T>(&self, request: ResourceRequest) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Validate,
    {
        let model: T = self.fetch_unchecked(request).await?;
        model.validate()?;
        Ok(model)
    }

    /// Fetches and decodes without running model validation, for envelopes
    /// that are unwrapped and validated by the caller.
    pub(crate) async fn fetch_unchecked<T>(&self, request: ResourceRequest) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let path = request.path.clone();
        let value = self.fetcher.fetch_resource(request).await?;
        serde_json::from_value(value).map_err(|source| ApiError::Decode { path, source })
    }

    /// `GET /me`
    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.fetch(ResourceRequest::get("me")).await
    }

    /// `GET /me/top/tracks`
    pub async fn user_top_tracks(
        &self,
        limit: u32,
        offset: u32,
        time_range: TimeRange,
    ) -> Result<Vec<Track>, ApiError> {
        let page: Page<Track> = self
            .fetch(
                ResourceRequest::get("me/top/tracks")
                    .query("limit", clamp_limit(limit, MAX_PAGE_LIMIT))
                    .query("offset", offset)
                    .query("time_range", time_range.as_str()),
            )
            .await?;
        Ok(page.items)
    }

    /// `GET /me/top/artists`
    pub async fn user_top_artists(
        &self,
        limit: u32,
        offset: u32,
        time_range: TimeRange,
    ) -> Result<Vec<Artist>, ApiError> {
        let page: Page<Artist> = self
            .fetch(
                ResourceRequest::get("me/top/artists")
                    .query("limit", clamp_limit(limit, MAX_PAGE_LIMIT))
                    .query("offset", offset)
                    .query("time_range", time_range.as_str()),
            )
            .await?;
        Ok(page.items)
    }

    /// `GET /search`
    ///
    /// An empty `types` slice searches for tracks.
    pub async fn search(
        &self,
        query: &str,
        types: &[SearchType],
        limit: u32,
        offset: u32,
    ) -> Result<SearchResult, ApiError> {
        let kinds = if types.is_empty() {
            SearchType::Track.as_str().to_string()
        } else {
            types
                .iter()
                .map(SearchType::as_str)
                .collect::<Vec<_>>()
                .join(",")
        };

        self.fetch(
            ResourceRequest::get("search")
                .query("q", query)
                .query("type", kinds)
                .query("limit", clamp_limit(limit, MAX_PAGE_LIMIT))
                .query("offset", offset),
        )
        .await
    }

    /// `GET /recommendations`
    ///
    /// `attributes` are passed through as-is (e.g. `("target_energy", "0.8")`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Invalid`] without issuing a request if there is no
    /// seed or more than five seeds.
    pub async fn recommendations(
        &self,
        seeds: &RecommendationSeeds,
        limit: u32,
        attributes: &[(String, String)],
    ) -> Result<Vec<Track>, ApiError> {
        let seed_count = seeds.artists.len() + seeds.genres.len() + seeds.tracks.len();
        if seeds.is_empty() || seed_count > MAX_RECOMMENDATION_SEEDS {
            return Err(ApiError::Invalid {
                model: "recommendation seeds",
                reason: format!(
                    "between 1 and {MAX_RECOMMENDATION_SEEDS} seeds are required, got {seed_count}"
                ),
            });
        }

        let mut request = ResourceRequest::get("recommendations")
            .query("limit", clamp_limit(limit, MAX_RECOMMENDATION_LIMIT));
        for (key, values) in [
            ("seed_artists", &seeds.artists),
            ("seed_genres", &seeds.genres),
            ("seed_tracks", &seeds.tracks),
        ] {
            if !values.is_empty() {
                request = request.query(key, values.join(","));
            }
        }
        for (key, value) in attributes {
            request = request.query(key, value);
        }

        let recommendations: Recommendations = self.fetch_unchecked(request).await?;
        recommendations.tracks.validate()?;
        Ok(recommendations.tracks)
    }
}

pub(crate) fn clamp_limit(limit: u32, max: u32) -> u32 {
    limit.clamp(1, max)
}
