//! Event slugs: a remote suggestion when available, a deterministic local
//! rendition otherwise. Every slug handed out matches `^[a-z0-9-]{1,50}$`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::integrations::IntegrationError;

pub const MAX_SLUG_LEN: usize = 50;

const EMPTY_SLUG: &str = "event";

/// A service that proposes a slug for an event title.
#[async_trait]
pub trait SlugSource: Send + Sync {
    async fn suggest(&self, title: &str) -> Result<String, IntegrationError>;
}

/// Lowercases, keeps ASCII letters and digits, turns whitespace and hyphen
/// runs into a single `-` and truncates to [`MAX_SLUG_LEN`].
pub fn local_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len().min(MAX_SLUG_LEN));
    let mut separator = false;

    for ch in title.chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_alphanumeric() {
            if separator && !slug.is_empty() {
                slug.push('-');
            }
            separator = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '-' {
            separator = true;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    let trimmed = slug.trim_end_matches('-');

    if trimmed.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Picks `base` or the first `base-N` (N >= 2) that `taken` rejects, keeping
/// the result within [`MAX_SLUG_LEN`].
pub fn unique_slug(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }

    (2u64..)
        .map(|n| {
            let suffix = format!("-{n}");
            let room = MAX_SLUG_LEN.saturating_sub(suffix.len());
            let stem = base.get(..room).unwrap_or(base).trim_end_matches('-');
            format!("{stem}{suffix}")
        })
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[derive(Clone, Default)]
pub struct SlugGenerator {
    source: Option<Arc<dyn SlugSource>>,
}

impl SlugGenerator {
    pub fn new(source: Arc<dyn SlugSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    pub fn local_only() -> Self {
        Self { source: None }
    }

    /// Never fails: remote errors and unusable answers fall back to [`local_slug`].
    pub async fn generate(&self, title: &str) -> String {
        let Some(source) = &self.source else {
            return local_slug(title);
        };

        match source.suggest(title).await {
            Ok(suggestion) => {
                let normalized = local_slug(&suggestion);
                if normalized == EMPTY_SLUG && local_slug(title) != EMPTY_SLUG {
                    tracing::warn!(%suggestion, "Slug service returned an unusable slug, using fallback");
                    local_slug(title)
                } else {
                    normalized
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Slug generation failed, using fallback");
                local_slug(title)
            }
        }
    }
}
