//! Platform policy registry.
//!
//! Maps a URL's domain to per-platform fetch configuration: whether the
//! platform needs authentication cookies, which headers to send, and
//! whether single-image downloads make sense there. Loaded once at startup
//! and immutable afterwards.

use std::sync::OnceLock;
use url::Url;

/// Per-platform fetch configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Whether full access requires authentication cookies.
    pub requires_cookies: bool,
    /// Human-readable platform name used in advisories and error messages.
    pub description: String,
    /// User agent override, applied first in the header merge.
    pub user_agent: Option<String>,
    /// Referer override, applied last in the header merge.
    pub referer: Option<String>,
    /// Extra request headers, applied between user agent and referer.
    pub extra_headers: Vec<(String, String)>,
    /// Whether the platform serves standalone photo assets.
    pub supports_photos: bool,
}

impl PlatformConfig {
    fn simple(description: &str) -> Self {
        Self {
            requires_cookies: false,
            description: description.to_string(),
            user_agent: None,
            referer: None,
            extra_headers: Vec::new(),
            supports_photos: false,
        }
    }

    fn with_photos(description: &str) -> Self {
        Self {
            supports_photos: true,
            ..Self::simple(description)
        }
    }
}

/// The fixed registry, keyed by normalized domain (no `www.` prefix).
fn registry() -> &'static [(&'static str, PlatformConfig)] {
    static REGISTRY: OnceLock<Vec<(&'static str, PlatformConfig)>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        vec![
            (
                "agasobanuyefilms.com",
                PlatformConfig {
                    requires_cookies: true,
                    description: "Rwandan movie streaming platform".to_string(),
                    user_agent: Some(
                        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                            .to_string(),
                    ),
                    referer: Some("https://agasobanuyefilms.com/".to_string()),
                    extra_headers: vec![
                        (
                            "Accept".to_string(),
                            "text/html,application/xhtml+xml,application/xml;q=0.9,\
                             image/webp,*/*;q=0.8"
                                .to_string(),
                        ),
                        ("Accept-Language".to_string(), "en-US,en;q=0.5".to_string()),
                        ("Accept-Encoding".to_string(), "gzip, deflate, br".to_string()),
                        ("DNT".to_string(), "1".to_string()),
                        ("Connection".to_string(), "keep-alive".to_string()),
                        ("Upgrade-Insecure-Requests".to_string(), "1".to_string()),
                    ],
                    supports_photos: false,
                },
            ),
            ("youtube.com", PlatformConfig::simple("YouTube platform")),
            ("vimeo.com", PlatformConfig::simple("Vimeo platform")),
            (
                "instagram.com",
                PlatformConfig::with_photos("Instagram - Videos, Photos, Stories"),
            ),
            (
                "pinterest.com",
                PlatformConfig::with_photos("Pinterest - High-resolution Images"),
            ),
        ]
    })
}

/// Resolve the platform policy for a URL.
///
/// Lowercases the host, strips a leading `www.`, then tries an exact
/// registry match before falling back to the first suffix match (so
/// `m.youtube.com` resolves to the `youtube.com` entry). Returns `None`
/// when nothing matches; callers must treat absence as "generic defaults,
/// no cookie requirement", not as an error.
#[must_use]
pub fn resolve_platform(url: &str) -> Option<&'static PlatformConfig> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let domain = host.strip_prefix("www.").unwrap_or(&host);

    if let Some((_, config)) = registry().iter().find(|(key, _)| *key == domain) {
        return Some(config);
    }

    registry()
        .iter()
        .find(|(key, _)| domain.ends_with(key))
        .map(|(_, config)| config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_after_www_strip() {
        let config = resolve_platform("https://www.youtube.com/watch?v=abc").unwrap();
        assert_eq!(config.description, "YouTube platform");
        assert!(!config.requires_cookies);
    }

    #[test]
    fn subdomain_matches_by_suffix() {
        let config = resolve_platform("https://m.youtube.com/watch?v=abc").unwrap();
        assert_eq!(config.description, "YouTube platform");
    }

    #[test]
    fn unknown_domain_has_no_policy() {
        assert!(resolve_platform("https://example.org/clip").is_none());
        assert!(resolve_platform("not a url").is_none());
    }

    #[test]
    fn cookie_mandatory_platform_carries_headers() {
        let config = resolve_platform("https://agasobanuyefilms.com/movie/1").unwrap();
        assert!(config.requires_cookies);
        assert!(config.user_agent.is_some());
        assert!(config.referer.is_some());
        assert!(!config.extra_headers.is_empty());
    }

    #[test]
    fn photo_platforms_flagged() {
        assert!(
            resolve_platform("https://pinterest.com/pin/1")
                .unwrap()
                .supports_photos
        );
        assert!(
            !resolve_platform("https://vimeo.com/123")
                .unwrap()
                .supports_photos
        );
    }
}
