use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

use crate::error::ApiError;

/// Raw body of a successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Error body returned by the token endpoint on 4xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub scope: String,
}

impl TokenSet {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// A margin reaching past the representable range counts as expiring.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now.checked_add_signed(margin)
            .is_none_or(|deadline| deadline >= self.expires_at)
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Checks the value ranges the Web API documents for a model.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), ApiError> {
        self.iter().try_for_each(Validate::validate)
    }
}

fn invalid(model: &'static str, reason: impl Into<String>) -> ApiError {
    ApiError::Invalid {
        model,
        reason: reason.into(),
    }
}

fn check_popularity(model: &'static str, popularity: Option<u32>) -> Result<(), ApiError> {
    match popularity {
        Some(p) if p > 100 => Err(invalid(model, format!("popularity {p} exceeds 100"))),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlbumType {
    Album,
    Single,
    Compilation,
}

impl AlbumType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlbumType::Album => "album",
            AlbumType::Single => "single",
            AlbumType::Compilation => "compilation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePrecision {
    Year,
    Month,
    Day,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    ShortTerm,
    #[default]
    MediumTerm,
    LongTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SearchType {
    #[default]
    Track,
    Artist,
    Album,
    Playlist,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Track => "track",
            SearchType::Artist => "artist",
            SearchType::Album => "album",
            SearchType::Playlist => "playlist",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Followers {
    pub href: Option<String>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Copyright {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIds {
    pub isrc: Option<String>,
    pub ean: Option<String>,
    pub upc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restrictions {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub external_urls: Option<ExternalUrls>,
    pub followers: Option<Followers>,
    pub genres: Option<Vec<String>>,
    pub href: Option<String>,
    pub id: String,
    pub images: Option<Vec<Image>>,
    pub name: String,
    pub popularity: Option<u32>,
    pub uri: String,
}

impl Validate for Artist {
    fn validate(&self) -> Result<(), ApiError> {
        check_popularity("artist", self.popularity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedArtist {
    pub external_urls: Option<ExternalUrls>,
    pub href: Option<String>,
    pub id: String,
    pub name: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub album_type: AlbumType,
    pub artists: Vec<SimplifiedArtist>,
    pub available_markets: Option<Vec<String>>,
    pub external_urls: Option<ExternalUrls>,
    pub href: Option<String>,
    pub id: String,
    pub images: Option<Vec<Image>>,
    pub name: String,
    pub release_date: String,
    pub release_date_precision: DatePrecision,
    pub restrictions: Option<Restrictions>,
    pub uri: String,
    pub total_tracks: Option<u32>,
    pub copyrights: Option<Vec<Copyright>>,
    pub external_ids: Option<ExternalIds>,
    pub genres: Option<Vec<String>>,
    pub label: Option<String>,
    pub popularity: Option<u32>,
}

impl Validate for Album {
    fn validate(&self) -> Result<(), ApiError> {
        check_popularity("album", self.popularity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedAlbum {
    pub album_type: AlbumType,
    pub artists: Vec<SimplifiedArtist>,
    pub available_markets: Option<Vec<String>>,
    pub external_urls: Option<ExternalUrls>,
    pub href: Option<String>,
    pub id: String,
    pub images: Option<Vec<Image>>,
    pub name: String,
    pub release_date: String,
    pub release_date_precision: DatePrecision,
    pub restrictions: Option<Restrictions>,
    pub uri: String,
    pub total_tracks: Option<u32>,
}

impl Validate for SimplifiedAlbum {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

fn check_track_numbers(model: &'static str, disc: u32, track: u32) -> Result<(), ApiError> {
    if disc < 1 {
        return Err(invalid(model, "disc number must be at least 1"));
    }
    if track < 1 {
        return Err(invalid(model, "track number must be at least 1"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub album: SimplifiedAlbum,
    pub artists: Vec<SimplifiedArtist>,
    pub available_markets: Option<Vec<String>>,
    pub disc_number: u32,
    pub duration_ms: u64,
    pub explicit: bool,
    pub external_ids: Option<ExternalIds>,
    pub external_urls: Option<ExternalUrls>,
    pub href: Option<String>,
    pub id: String,
    pub is_playable: Option<bool>,
    pub linked_from: Option<Value>,
    pub restrictions: Option<Restrictions>,
    pub name: String,
    pub popularity: Option<u32>,
    pub preview_url: Option<String>,
    pub track_number: u32,
    pub uri: String,
    #[serde(default)]
    pub is_local: bool,
}

impl Validate for Track {
    fn validate(&self) -> Result<(), ApiError> {
        check_track_numbers("track", self.disc_number, self.track_number)?;
        check_popularity("track", self.popularity)
    }
}

/// Track as listed inside an album (no album or popularity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedTrack {
    pub artists: Vec<SimplifiedArtist>,
    pub disc_number: u32,
    pub duration_ms: u64,
    pub explicit: bool,
    pub href: Option<String>,
    pub id: String,
    pub name: String,
    pub preview_url: Option<String>,
    pub track_number: u32,
    pub uri: String,
    #[serde(default)]
    pub is_local: bool,
}

impl Validate for SimplifiedTrack {
    fn validate(&self) -> Result<(), ApiError> {
        check_track_numbers("track", self.disc_number, self.track_number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub display_name: Option<String>,
    pub external_urls: Option<ExternalUrls>,
    pub href: Option<String>,
    pub id: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistTrack {
    pub added_at: Option<DateTime<Utc>>,
    pub added_by: Option<PlaylistOwner>,
    #[serde(default)]
    pub is_local: bool,
    pub track: Option<Track>,
}

impl Validate for PlaylistTrack {
    fn validate(&self) -> Result<(), ApiError> {
        match &self.track {
            Some(track) => track.validate(),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistTracksRef {
    pub href: Option<String>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub collaborative: bool,
    pub description: Option<String>,
    pub external_urls: Option<ExternalUrls>,
    pub followers: Option<Followers>,
    pub href: Option<String>,
    pub id: String,
    pub images: Option<Vec<Image>>,
    pub name: String,
    pub owner: PlaylistOwner,
    pub public: Option<bool>,
    pub snapshot_id: String,
    pub tracks: PlaylistTracksRef,
    pub uri: String,
}

impl Validate for Playlist {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistWithTracks {
    pub collaborative: bool,
    pub description: Option<String>,
    pub external_urls: Option<ExternalUrls>,
    pub followers: Option<Followers>,
    pub href: Option<String>,
    pub id: String,
    pub images: Option<Vec<Image>>,
    pub name: String,
    pub owner: PlaylistOwner,
    pub public: Option<bool>,
    pub snapshot_id: String,
    pub tracks: Page<PlaylistTrack>,
    pub uri: String,
}

impl Validate for PlaylistWithTracks {
    fn validate(&self) -> Result<(), ApiError> {
        self.tracks.validate()
    }
}

/// Offset-based paging object wrapping a list of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub href: String,
    pub items: Vec<T>,
    pub limit: u32,
    pub next: Option<String>,
    pub offset: u32,
    pub previous: Option<String>,
    pub total: u64,
}

impl<T: Validate> Validate for Page<T> {
    fn validate(&self) -> Result<(), ApiError> {
        self.items.iter().try_for_each(Validate::validate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    pub acousticness: f64,
    pub analysis_url: String,
    pub danceability: f64,
    pub duration_ms: u64,
    pub energy: f64,
    pub id: String,
    pub instrumentalness: f64,
    pub key: i32,
    pub liveness: f64,
    pub loudness: f64,
    pub mode: u8,
    pub speechiness: f64,
    pub tempo: f64,
    pub time_signature: u8,
    pub track_href: String,
    pub uri: String,
    pub valence: f64,
}

impl Validate for AudioFeatures {
    fn validate(&self) -> Result<(), ApiError> {
        let ratios = [
            ("acousticness", self.acousticness),
            ("danceability", self.danceability),
            ("energy", self.energy),
            ("instrumentalness", self.instrumentalness),
            ("liveness", self.liveness),
            ("speechiness", self.speechiness),
            ("valence", self.valence),
        ];
        if let Some((name, value)) = ratios
            .iter()
            .find(|(_, value)| !(0.0..=1.0).contains(value))
        {
            return Err(invalid(
                "audio features",
                format!("{name} {value} is outside 0.0..=1.0"),
            ));
        }
        if !(-1..=11).contains(&self.key) {
            return Err(invalid(
                "audio features",
                format!("key {} is outside -1..=11", self.key),
            ));
        }
        if self.mode > 1 {
            return Err(invalid("audio features", "mode must be 0 or 1"));
        }
        if !(3..=7).contains(&self.time_signature) {
            return Err(invalid(
                "audio features",
                "time signature must be between 3 and 7",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub tracks: Option<Page<Track>>,
    pub artists: Option<Page<Artist>>,
    pub albums: Option<Page<SimplifiedAlbum>>,
    // Spotify returns `null` entries for playlists it cannot serve.
    pub playlists: Option<Page<Option<Playlist>>>,
}

impl Validate for Option<Playlist> {
    fn validate(&self) -> Result<(), ApiError> {
        self.as_ref().map_or(Ok(()), Validate::validate)
    }
}

impl Validate for SearchResult {
    fn validate(&self) -> Result<(), ApiError> {
        if let Some(page) = &self.tracks {
            page.validate()?;
        }
        if let Some(page) = &self.artists {
            page.validate()?;
        }
        if let Some(page) = &self.albums {
            page.validate()?;
        }
        if let Some(page) = &self.playlists {
            page.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub country: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub external_urls: Option<ExternalUrls>,
    pub followers: Option<Followers>,
    pub href: Option<String>,
    pub id: String,
    pub images: Option<Vec<Image>>,
    pub product: Option<String>,
    pub uri: String,
}

impl Validate for UserProfile {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecommendationSeeds {
    pub artists: Vec<String>,
    pub genres: Vec<String>,
    pub tracks: Vec<String>,
}

impl RecommendationSeeds {
    pub fn is_empty(&self) -> bool {
        self.artists.is_empty() && self.genres.is_empty() && self.tracks.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recommendations {
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub snapshot_id: String,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    pub name: String,
    pub artists: String,
    pub album: String,
    pub duration: String,
}

#[derive(Tabled)]
pub struct ArtistTableRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    pub name: String,
    pub genres: String,
    pub followers: u64,
}

#[derive(Tabled)]
pub struct AlbumTableRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    pub name: String,
    pub artists: String,
    pub released: String,
    pub kind: String,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    #[tabled(rename = "#")]
    pub rank: usize,
    pub name: String,
    pub owner: String,
    pub tracks: u64,
}
