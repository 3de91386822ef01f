//! Brave Image Search API response types and normalization.

use serde::Deserialize;
use swingset_core::model::ImageResult;

/// Raw response from the Brave Image Search API.
#[derive(Debug, Deserialize)]
pub struct BraveImageResponse {
    #[serde(default)]
    pub query: Option<QueryInfo>,
    #[serde(default)]
    pub results: Vec<ImageItem>,
}

/// Query metadata from Brave response.
#[derive(Debug, Deserialize)]
pub struct QueryInfo {
    pub original: String,
}

/// Individual image result from Brave.
#[derive(Debug, Deserialize)]
pub struct ImageItem {
    #[serde(default)]
    pub title: Option<String>,
    /// Page the image was found on.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<Thumbnail>,
    #[serde(default)]
    pub properties: Option<ImageProperties>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub src: String,
}

#[derive(Debug, Deserialize)]
pub struct ImageProperties {
    /// Full-size image URL.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl BraveImageResponse {
    /// Normalize into image results, dropping entries without an image URL.
    pub fn into_images(self) -> Vec<ImageResult> {
        self.results
            .into_iter()
            .filter_map(|item| {
                let properties = item.properties?;
                let url = properties.url.filter(|u| !u.trim().is_empty())?;
                Some(ImageResult {
                    url,
                    thumbnail_url: item.thumbnail.map(|t| t.src),
                    title: item.title,
                    source_page: item.url,
                    width: properties.width,
                    height: properties.height,
                })
            })
            .collect()
    }
}
