use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::types::{
    AlbumTableRow, Artist, ArtistTableRow, Playlist, PlaylistTableRow, SimplifiedAlbum,
    SimplifiedArtist, Track, TrackTableRow,
};

/// Spinner used while waiting on Spotify.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(120));
    let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["▹▹▹▹▹", "▸▹▹▹▹", "▹▸▹▹▹", "▹▹▸▹▹", "▹▹▹▸▹", "▹▹▹▹▸", "▪▪▪▪▪"]);
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Formats a track length as `m:ss`, or `h:mm:ss` past the hour.
pub fn format_duration_ms(duration_ms: u64) -> String {
    let total_secs = duration_ms / 1000;
    let (hours, minutes, seconds) = (total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60);

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

pub fn join_artist_names(artists: &[SimplifiedArtist]) -> String {
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn track_rows(tracks: &[Track]) -> Vec<TrackTableRow> {
    tracks
        .iter()
        .enumerate()
        .map(|(i, t)| TrackTableRow {
            rank: i + 1,
            name: t.name.clone(),
            artists: join_artist_names(&t.artists),
            album: t.album.name.clone(),
            duration: format_duration_ms(t.duration_ms),
        })
        .collect()
}

/// Only the first three genres are shown.
pub fn artist_rows(artists: &[Artist]) -> Vec<ArtistTableRow> {
    artists
        .iter()
        .enumerate()
        .map(|(i, a)| ArtistTableRow {
            rank: i + 1,
            name: a.name.clone(),
            genres: a
                .genres
                .as_deref()
                .unwrap_or_default()
                .iter()
                .take(3)
                .cloned()
                .collect::<Vec<_>>()
                .join(","),
            followers: a.followers.as_ref().map_or(0, |f| f.total),
        })
        .collect()
}

pub fn album_rows(albums: &[SimplifiedAlbum]) -> Vec<AlbumTableRow> {
    albums
        .iter()
        .enumerate()
        .map(|(i, a)| AlbumTableRow {
            rank: i + 1,
            name: a.name.clone(),
            artists: join_artist_names(&a.artists),
            released: a.release_date.clone(),
            kind: a.album_type.as_str().to_string(),
        })
        .collect()
}

/// Missing entries keep their position so ranks match the API order.
pub fn playlist_rows(playlists: &[Option<Playlist>]) -> Vec<PlaylistTableRow> {
    playlists
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            p.as_ref().map(|p| PlaylistTableRow {
                rank: i + 1,
                name: p.name.clone(),
                owner: p
                    .owner
                    .display_name
                    .clone()
                    .unwrap_or_else(|| p.owner.id.clone()),
                tracks: p.tracks.total,
            })
        })
        .collect()
}
