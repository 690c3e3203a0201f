use clap::ValueEnum;
use tabled::Table;

use crate::{
    cli::{AuthArgs, auth::login},
    error,
    types::TimeRange,
    utils, warning,
};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopKind {
    Tracks,
    Artists,
}

pub async fn top(kind: TopKind, limit: u32, time_range: TimeRange, args: &AuthArgs) {
    let (client, _) = login(args).await;
    let pb = utils::spinner(&format!(
        "Loading top {} ({})...",
        match kind {
            TopKind::Tracks => "tracks",
            TopKind::Artists => "artists",
        },
        time_range.as_str()
    ));

    let table = match kind {
        TopKind::Tracks => client
            .user_top_tracks(limit, 0, time_range)
            .await
            .map(|tracks| (tracks.is_empty(), Table::new(utils::track_rows(&tracks)))),
        TopKind::Artists => client
            .user_top_artists(limit, 0, time_range)
            .await
            .map(|artists| (artists.is_empty(), Table::new(utils::artist_rows(&artists)))),
    };
    pb.finish_and_clear();

    match table {
        Ok((true, _)) => warning!("Spotify returned no items for this time range."),
        Ok((false, table)) => println!("{}", table),
        Err(e) => error!(
            "Cannot load top items. Err: {}\nThe user-top-read scope is required.",
            e
        ),
    }
}
