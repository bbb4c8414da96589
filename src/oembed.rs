use eyre::Result;
use log::debug;
use serde::Deserialize;

use crate::Metadata;

#[derive(Debug, Deserialize)]
struct OembedResponse {
    title: Option<String>,
    author_name: Option<String>,
    thumbnail_url: Option<String>,
}

/// Fetch title/author/thumbnail from YouTube's public oEmbed endpoint.
/// Reliable but shallow: it never carries year or keywords.
pub async fn fetch_metadata(client: &reqwest::Client, video_id: &str) -> Result<Metadata> {
    let oembed_url = format!(
        "https://www.youtube.com/oembed?url=https://www.youtube.com/watch?v={video_id}&format=json"
    );
    debug!("Fetching oEmbed: {oembed_url}");

    let resp: OembedResponse = client
        .get(&oembed_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(into_metadata(resp))
}

fn into_metadata(resp: OembedResponse) -> Metadata {
    Metadata {
        title: resp.title.unwrap_or_default(),
        author: resp.author_name.unwrap_or_default(),
        thumbnail: resp.thumbnail_url.unwrap_or_default(),
        ..Metadata::default()
    }
}
