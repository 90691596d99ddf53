//! Per-platform selection and timing profiles.
//!
//! Every platform tag resolves to a profile; unknown tags land on
//! [`Platform::Generic`] before lookup.

use std::time::Duration;

use pipdock_protocols::{AdMarkers, Platform, SnapshotRequest};

/// Container-based ad rule: a candidate is rejected when its nearest `div`
/// container holds an ad-preview marker or renders narrower than `min_width`.
#[derive(Debug, Clone, Copy)]
pub struct ContainerAdRule {
    pub markers: &'static [&'static str],
    pub min_width: f64,
}

/// In-stream ad detection and dismissal settings.
#[derive(Debug, Clone, Copy)]
pub struct AdSkipProfile {
    pub player_selector: &'static str,
    pub player_ad_classes: &'static [&'static str],
    pub ad_module_selector: &'static str,
    pub ad_text_selector: &'static str,
    /// Skip controls, tried in order.
    pub skip_selectors: &'static [&'static str],
    /// Selectors for the underlying player video, tried in order.
    pub video_selectors: &'static [&'static str],
    /// Ads at least this long (seconds) are never fast-forwarded.
    pub max_seek_duration: f64,
}

impl AdSkipProfile {
    pub fn markers(&self) -> AdMarkers {
        AdMarkers {
            player_selector: self.player_selector.to_string(),
            player_ad_classes: to_owned(self.player_ad_classes),
            ad_module_selector: self.ad_module_selector.to_string(),
            ad_text_selector: self.ad_text_selector.to_string(),
        }
    }

    pub fn skip_selectors(&self) -> Vec<String> {
        to_owned(self.skip_selectors)
    }

    pub fn video_selectors(&self) -> Vec<String> {
        to_owned(self.video_selectors)
    }
}

/// Selection and timing profile for one platform.
#[derive(Debug, Clone, Copy)]
pub struct PlatformProfile {
    pub platform: Platform,
    /// Wait before the first candidate poll.
    pub initial_delay: Duration,
    pub retry_interval: Duration,
    /// Maximum number of candidate polls.
    pub max_retries: u32,
    /// Candidate selectors, highest priority first.
    pub selectors: &'static [&'static str],
    /// Containers whose videos get the primary-container bonus.
    pub primary_containers: &'static [&'static str],
    pub native_id_attribute: Option<&'static str>,
    /// Source URL substrings identifying the platform's media CDN.
    pub media_cdn: &'static [&'static str],
    pub container_ad_rule: Option<ContainerAdRule>,
    /// Re-run selection when the active element resizes.
    pub rescan_on_resize: bool,
    pub ad_skip: Option<AdSkipProfile>,
}

impl PlatformProfile {
    pub fn for_platform(platform: Platform) -> &'static PlatformProfile {
        match platform {
            Platform::Youtube => &YOUTUBE,
            Platform::Facebook => &FACEBOOK,
            Platform::Tiktok => &TIKTOK,
            Platform::Instagram => &INSTAGRAM,
            Platform::Twitter => &TWITTER,
            Platform::Vimeo => &VIMEO,
            Platform::Generic => &GENERIC,
        }
    }

    pub fn for_tag(tag: &str) -> &'static PlatformProfile {
        Self::for_platform(Platform::from_tag(tag))
    }

    /// What the page host must collect for this profile's scorer.
    pub fn snapshot_request(&self) -> SnapshotRequest {
        SnapshotRequest {
            selectors: to_owned(self.selectors),
            primary_containers: to_owned(self.primary_containers),
            ad_preview_markers: self
                .container_ad_rule
                .map(|rule| to_owned(rule.markers))
                .unwrap_or_default(),
            native_id_attribute: self.native_id_attribute.map(str::to_string),
        }
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

const fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

static YOUTUBE: PlatformProfile = PlatformProfile {
    platform: Platform::Youtube,
    initial_delay: ms(500),
    retry_interval: ms(500),
    max_retries: 10,
    selectors: &["video.html5-main-video", "#movie_player video", "video"],
    primary_containers: &["#movie_player", "ytd-player"],
    native_id_attribute: None,
    media_cdn: &["googlevideo.com"],
    container_ad_rule: None,
    rescan_on_resize: true,
    ad_skip: Some(AdSkipProfile {
        player_selector: ".html5-video-player",
        player_ad_classes: &["ad-showing", "ad-interrupting"],
        ad_module_selector: ".ytp-ad-module",
        ad_text_selector: ".ytp-ad-text",
        skip_selectors: &[
            ".ytp-ad-skip-button.ytp-button",
            ".ytp-ad-skip-button-modern",
            ".ytp-ad-skip-button",
            ".ytp-skip-ad-button",
            "button.ytp-ad-skip-button",
            ".ytp-ad-overlay-close-button",
        ],
        video_selectors: &["video.html5-main-video", "video"],
        max_seek_duration: 600.0,
    }),
};

static FACEBOOK: PlatformProfile = PlatformProfile {
    platform: Platform::Facebook,
    initial_delay: ms(1000),
    retry_interval: ms(600),
    max_retries: 8,
    selectors: &[
        r#"div[data-pagelet="Watch"] video"#,
        r#"div[data-pagelet="WatchPermalinkVideo"] video"#,
        r#"div[role="main"] div[data-video-id] video"#,
        "video[data-video-id]",
        r#"div[aria-label*="video" i] video"#,
        r#"div[aria-label*="Video" i] video"#,
        r#"div[role="main"] video"#,
        "div#watch_feed video",
        r#"video[src*="fbcdn"]"#,
        r#"video[src*="facebook"]"#,
        "video",
    ],
    primary_containers: &[r#"[data-pagelet*="Watch"]"#, r#"[data-pagelet*="Video"]"#],
    native_id_attribute: Some("data-video-id"),
    media_cdn: &["fbcdn", "facebook"],
    container_ad_rule: Some(ContainerAdRule {
        markers: &["[data-ad-preview]", "[data-ad-comet-preview]"],
        min_width: 300.0,
    }),
    rescan_on_resize: false,
    ad_skip: None,
};

static TIKTOK: PlatformProfile = PlatformProfile {
    platform: Platform::Tiktok,
    initial_delay: ms(600),
    retry_interval: ms(400),
    max_retries: 5,
    selectors: &[
        "video.tiktok-video",
        r#"video[class*="BasicPlayer"]"#,
        r#"div[data-e2e="video-player"] video"#,
        "video[playsinline]",
        "video",
    ],
    primary_containers: &[],
    native_id_attribute: None,
    media_cdn: &[],
    container_ad_rule: None,
    rescan_on_resize: false,
    ad_skip: None,
};

static INSTAGRAM: PlatformProfile = PlatformProfile {
    platform: Platform::Instagram,
    initial_delay: ms(1000),
    retry_interval: ms(600),
    max_retries: 5,
    selectors: &["video.x1lliihq", "article video", r#"div[role="dialog"] video"#, "video"],
    primary_containers: &[],
    native_id_attribute: None,
    media_cdn: &[],
    container_ad_rule: None,
    rescan_on_resize: false,
    ad_skip: None,
};

static TWITTER: PlatformProfile = PlatformProfile {
    platform: Platform::Twitter,
    initial_delay: ms(600),
    retry_interval: ms(500),
    max_retries: 5,
    selectors: &[
        r#"div[data-testid="videoPlayer"] video"#,
        r#"video[src*="video.twimg.com"]"#,
        r#"video[src*="twitter.com"]"#,
        "video",
    ],
    primary_containers: &[],
    native_id_attribute: None,
    media_cdn: &[],
    container_ad_rule: None,
    rescan_on_resize: false,
    ad_skip: None,
};

static VIMEO: PlatformProfile = PlatformProfile {
    platform: Platform::Vimeo,
    initial_delay: ms(500),
    retry_interval: ms(400),
    max_retries: 4,
    selectors: &["video[data-vimeo-initialized]", "video.vp-video", "video"],
    primary_containers: &[],
    native_id_attribute: None,
    media_cdn: &[],
    container_ad_rule: None,
    rescan_on_resize: false,
    ad_skip: None,
};

static GENERIC: PlatformProfile = PlatformProfile {
    platform: Platform::Generic,
    initial_delay: ms(800),
    retry_interval: ms(600),
    max_retries: 6,
    selectors: &[
        "main video",
        "article video",
        r#"div[role="main"] video"#,
        r#"div[class*="video" i] video"#,
        r#"div[class*="player" i] video"#,
        r#"div[id*="video" i] video"#,
        r#"div[id*="player" i] video"#,
        "video",
    ],
    primary_containers: &[],
    native_id_attribute: None,
    media_cdn: &[],
    container_ad_rule: None,
    rescan_on_resize: false,
    ad_skip: None,
};
