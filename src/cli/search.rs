use tabled::Table;

use crate::{
    cli::{AuthArgs, auth::login},
    error, info,
    types::SearchType,
    utils, warning,
};

pub async fn search(query: &str, kind: SearchType, limit: u32, args: &AuthArgs) {
    if query.trim().is_empty() {
        error!("Search query must not be empty");
    }

    let (client, _) = login(args).await;
    let pb = utils::spinner(&format!("Searching {}s for \"{}\"...", kind.as_str(), query));
    let result = client.search(query, &[kind], limit, 0).await;
    pb.finish_and_clear();

    let result = match result {
        Ok(r) => r,
        Err(e) => error!("Search failed. Err: {}", e),
    };

    let page = match kind {
        SearchType::Track => result
            .tracks
            .map(|p| (p.total, Table::new(utils::track_rows(&p.items)))),
        SearchType::Artist => result
            .artists
            .map(|p| (p.total, Table::new(utils::artist_rows(&p.items)))),
        SearchType::Album => result
            .albums
            .map(|p| (p.total, Table::new(utils::album_rows(&p.items)))),
        SearchType::Playlist => result
            .playlists
            .map(|p| (p.total, Table::new(utils::playlist_rows(&p.items)))),
    };

    let Some((total, table)) = page.filter(|(total, _)| *total > 0) else {
        warning!("No {}s found for \"{}\"", kind.as_str(), query);
        return;
    };

    println!("{}", table);
    info!("Showing the first results of {} matches.", total);
}
