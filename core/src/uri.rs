//! Resource URI assembly.
//!
//! Plain string concatenation: paths and values are inserted as given, so
//! percent-encoding anything URL-unsafe is the caller's job.

/// Join `base_url` and `path` with exactly one `/` between them.
pub fn build_uri(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Append `name=value`, starting the query string if `uri` has none yet.
pub fn append_query_param(uri: &str, name: &str, value: &str) -> String {
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{uri}{separator}{name}={value}")
}

/// Whether the query string of `uri` already carries `name`.
pub fn has_query_param(uri: &str, name: &str) -> bool {
    let Some((_, query)) = uri.split_once('?') else {
        return false;
    };
    query
        .split('&')
        .any(|pair| pair.split_once('=').map_or(pair, |(key, _)| key) == name)
}

/// Append `page` then `per_page`, each only when set.
pub fn add_paging(uri: &str, page: Option<u32>, per_page: Option<u32>) -> String {
    let mut uri = uri.to_string();
    if let Some(page) = page {
        uri = append_query_param(&uri, "page", &page.to_string());
    }
    if let Some(per_page) = per_page {
        uri = append_query_param(&uri, "per_page", &per_page.to_string());
    }
    uri
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_uri_joins_with_single_slash() {
        assert_eq!(
            build_uri("https://api.github.com", "users/octocat"),
            "https://api.github.com/users/octocat"
        );
        assert_eq!(
            build_uri("https://api.github.com/", "/users/octocat"),
            "https://api.github.com/users/octocat"
        );
    }

    #[test]
    fn build_uri_does_not_touch_path_characters() {
        assert_eq!(
            build_uri("http://h", "search/repositories?q=a b"),
            "http://h/search/repositories?q=a b"
        );
    }

    #[test]
    fn first_param_starts_query_string() {
        assert_eq!(append_query_param("http://h/x", "k", "v"), "http://h/x?k=v");
    }

    #[test]
    fn later_params_use_ampersand() {
        assert_eq!(
            append_query_param("http://h/x?a=1", "k", "v"),
            "http://h/x?a=1&k=v"
        );
    }

    #[test]
    fn detects_existing_query_param() {
        assert!(has_query_param("http://h/x?access_token=t&page=2", "access_token"));
        assert!(has_query_param("http://h/x?page=2&access_token=t", "access_token"));
        assert!(has_query_param("http://h/x?flag", "flag"));
        assert!(!has_query_param("http://h/x?my_access_token=t", "access_token"));
        assert!(!has_query_param("http://h/x?page=access_token", "access_token"));
        assert!(!has_query_param("http://h/access_token", "access_token"));
    }

    #[test]
    fn paging_appends_page_before_per_page() {
        assert_eq!(
            add_paging("http://h/x", Some(2), Some(50)),
            "http://h/x?page=2&per_page=50"
        );
    }

    #[test]
    fn paging_omits_unset_values() {
        assert_eq!(add_paging("http://h/x", None, Some(50)), "http://h/x?per_page=50");
        assert_eq!(add_paging("http://h/x", Some(3), None), "http://h/x?page=3");
        assert_eq!(add_paging("http://h/x", None, None), "http://h/x");
    }

    #[test]
    fn paging_respects_existing_query() {
        assert_eq!(
            add_paging("http://h/x?state=open", Some(1), None),
            "http://h/x?state=open&page=1"
        );
    }
}
