//! Platform tags.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

/// Video platform a detached page belongs to.
///
/// Unknown tags deserialize to [`Platform::Generic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    Youtube,
    Facebook,
    Tiktok,
    Instagram,
    Twitter,
    Vimeo,
    #[default]
    Generic,
}

impl Platform {
    pub const ALL: [Platform; 7] = [
        Platform::Youtube,
        Platform::Facebook,
        Platform::Tiktok,
        Platform::Instagram,
        Platform::Twitter,
        Platform::Vimeo,
        Platform::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Facebook => "facebook",
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Vimeo => "vimeo",
            Platform::Generic => "generic",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim();
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(tag))
            .unwrap_or(Platform::Generic)
    }

    /// Detect the platform from a page URL's host name.
    pub fn detect(page_url: &str) -> Self {
        let Ok(url) = Url::parse(page_url) else {
            return Platform::Generic;
        };
        let Some(host) = url.host_str() else {
            return Platform::Generic;
        };
        let host = host.trim_start_matches("www.").to_ascii_lowercase();
        let is = |domain: &str| host == domain || host.ends_with(&format!(".{}", domain));

        if is("youtube.com") || is("youtu.be") {
            Platform::Youtube
        } else if is("facebook.com") || is("fb.com") {
            Platform::Facebook
        } else if is("tiktok.com") {
            Platform::Tiktok
        } else if is("instagram.com") {
            Platform::Instagram
        } else if is("twitter.com") || is("x.com") {
            Platform::Twitter
        } else if is("vimeo.com") {
            Platform::Vimeo
        } else {
            Platform::Generic
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Platform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Platform::from_tag(&tag))
    }
}
