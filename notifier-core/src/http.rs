use anyhow::{Context, Result, anyhow};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

/// Sent with geolocation lookups; some free providers reject anonymous clients.
pub const USER_AGENT: &str = "WeatherNotifier/1.0";

/// Reads the body of `res` and parses it as JSON, failing on non-2xx statuses.
///
/// `what` names the upstream call in error messages, e.g. "OpenWeather current".
pub async fn read_json<T: DeserializeOwned>(res: Response, what: &str) -> Result<T> {
    let status = res.status();
    let body = res
        .text()
        .await
        .with_context(|| format!("Failed to read {what} response body"))?;

    if !status.is_success() {
        return Err(anyhow!(
            "{what} request failed with status {}: {}",
            status,
            truncate_body(&body),
        ));
    }

    serde_json::from_str(&body).with_context(|| format!("Failed to parse {what} JSON"))
}

/// Joins `segments` onto `base`, percent-encoding each one as a single path
/// segment so `/`, `?` or `#` in caller input cannot change the endpoint.
///
/// An empty final segment yields a trailing slash. `.` and `..` are rejected
/// since `Url` would drop them from the path.
pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    if let Some(dots) = segments.iter().find(|s| matches!(**s, "." | "..")) {
        return Err(anyhow!("Invalid path segment: {dots:?}"));
    }

    let mut url = Url::parse(base).with_context(|| format!("Invalid base URL: {base}"))?;

    url.path_segments_mut()
        .map_err(|_| anyhow!("Base URL cannot take path segments: {base}"))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

pub fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_segments() {
        let url = endpoint("https://ipapi.co", &["8.8.8.8", "json", ""]).unwrap();
        assert_eq!(url.as_str(), "https://ipapi.co/8.8.8.8/json/");

        let url = endpoint("http://ip-api.com/", &["json", "1.1.1.1"]).unwrap();
        assert_eq!(url.as_str(), "http://ip-api.com/json/1.1.1.1");
    }

    #[test]
    fn endpoint_encodes_separators_in_segment() {
        let url = endpoint("https://ipapi.co", &["8.8.8.8/../1.1.1.1?x#y", "json", ""]).unwrap();

        assert_eq!(url.path(), "/8.8.8.8%2F..%2F1.1.1.1%3Fx%23y/json/");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn endpoint_rejects_dot_segments() {
        assert!(endpoint("https://ipapi.co", &["..", "json", ""]).is_err());
        assert!(endpoint("http://ip-api.com", &["json", "."]).is_err());
    }

    #[test]
    fn endpoint_rejects_bad_base() {
        assert!(endpoint("not a url", &["json"]).is_err());
    }

    #[test]
    fn short_body_is_untouched() {
        assert_eq!(truncate_body("not found"), "not found");
    }

    #[test]
    fn long_body_is_cut_on_char_boundary() {
        let body = "°".repeat(300);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert_eq!(out.trim_end_matches("...").chars().count(), 200);
    }
}
