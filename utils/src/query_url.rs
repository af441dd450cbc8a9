use url::Url;

pub use url::ParseError;

/// Append query parameters to a base URL, keeping any parameters it already carries
pub fn with_query(base: &str, params: &[(&str, &str)]) -> Result<Url, ParseError> {
    let mut url = Url::parse(base)?;
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}
