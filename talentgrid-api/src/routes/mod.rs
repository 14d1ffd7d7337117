/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `identities`: Signup and identity management
/// - `organizations`: Company and institute management
/// - `memberships`: Grant, transition, revoke and list memberships
/// - `profiles`: Profile upsert with resume enrichment
/// - `job_postings`: Postings and candidate matching
/// - `applications`: Applying to postings and reviewing applications
/// - `gigs`: Gigs offered by individuals
/// - `conversations`: Conversations and messages

pub mod applications;
pub mod conversations;
pub mod gigs;
pub mod health;
pub mod identities;
pub mod job_postings;
pub mod memberships;
pub mod organizations;
pub mod profiles;

use serde::{Deserialize, Deserializer};
use validator::ValidationError;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Accepts absolute `http` and `https` URLs only
pub(crate) fn http_url(value: &str) -> Result<(), ValidationError> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));

    match rest {
        Some(rest)
            if !rest.is_empty()
                && !rest.starts_with('/')
                && !rest.chars().any(char::is_whitespace) =>
        {
            Ok(())
        }
        _ => {
            let mut error = ValidationError::new("url");
            error.message = Some("Must be an http(s) URL".into());
            Err(error)
        }
    }
}

pub(crate) fn http_urls(values: &[String]) -> Result<(), ValidationError> {
    values.iter().try_for_each(|value| http_url(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_url() {
        assert!(http_url("https://files.example.com/cv.pdf").is_ok());
        assert!(http_url("http://localhost:9000/a").is_ok());

        assert!(http_url("ftp://files.example.com/cv.pdf").is_err());
        assert!(http_url("https://").is_err());
        assert!(http_url("https:///path").is_err());
        assert!(http_url("https://bad host/x").is_err());
        assert!(http_url("/relative/path").is_err());
    }

    #[test]
    fn test_http_urls() {
        assert!(http_urls(&[]).is_ok());
        assert!(http_urls(&["https://a.example.com/1.png".to_string()]).is_ok());
        assert!(http_urls(&[
            "https://a.example.com/1.png".to_string(),
            "file:///etc/passwd".to_string()
        ])
        .is_err());
    }
}
