//! URL helper functions

use crate::config::SiteConfig;

/// Directory that holds one folder per post
pub const POST_DIR: &str = "post";

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/post/hello/") // -> "/blog/post/hello/"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Route of a post's page, relative to the site root
pub fn post_path(uid: &str) -> String {
    format!("{}/{}/", POST_DIR, uid)
}

/// Whether a slug can be used as a path segment as-is
///
/// Slugs come from the content API and end up as directory names, so only
/// canonical lowercase-hyphenated slugs are accepted.
pub fn is_safe_slug(uid: &str) -> bool {
    !uid.is_empty() && slug::slugify(uid) == uid
}

/// Extract the slug from a request path like `/post/<slug>/`
pub fn slug_from_path(path: &str) -> Option<&str> {
    let rest = path.trim_matches('/').strip_prefix(POST_DIR)?;
    let slug = rest.strip_prefix('/')?.trim_end_matches("/index.html");
    (!slug.is_empty() && !slug.contains('/')).then_some(slug)
}
