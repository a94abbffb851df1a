//! Server-config renderers for the compiled rule table.

mod apache;
mod iis;

pub use apache::mod_rewrite_rules;
pub use iis::url_rewrite_rules;

/// Path component of a URL, with a trailing slash. Falls back to `/` for
/// unparseable input.
pub(crate) fn url_root_path(url: &str) -> String {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| "/".to_string());
    if path.ends_with('/') {
        path
    } else {
        format!("{path}/")
    }
}
