//! Failure classification.
//!
//! Turns opaque extractor failure text into an actionable user-facing
//! message. Rules are an ordered substring list parameterized by whether
//! the platform mandates cookies. The raw text is always preserved in
//! logs by the caller; this function only produces the advisory wording.

use mediagrab_core::platform::PlatformConfig;

/// Classify a raw extractor failure message.
#[must_use]
pub fn classify_failure(policy: Option<&PlatformConfig>, raw: &str) -> String {
    let lower = raw.to_lowercase();

    if policy.is_some_and(|p| p.requires_cookies) {
        let description = policy.map_or("this platform", |p| p.description.as_str());
        if lower.contains("age-restricted") || lower.contains("sign in") || lower.contains("private")
        {
            return format!(
                "Authentication required for {description}. \
                 Please upload cookies from your browser session."
            );
        }
        if lower.contains("unavailable") {
            return format!(
                "Content unavailable. Ensure you're logged in to {description} \
                 and have access to this content."
            );
        }
        return format!("Download failed: {raw}");
    }

    if raw.contains("Sign in to confirm your age") || raw.contains("age-restricted") {
        return "Age-restricted. Try uploading cookies from your browser.".to_string();
    }
    if raw.contains("This video is private") {
        return "Private content.".to_string();
    }
    if lower.contains("unavailable") {
        return "Content unavailable or region-blocked. Try uploading cookies.".to_string();
    }
    format!("Download failed: {raw}")
}
