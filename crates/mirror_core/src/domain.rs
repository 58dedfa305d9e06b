use url::Url;

/// Display name for a submitted URL: its host, or the raw input when it does
/// not parse as an absolute URL with a host.
pub fn resolve_domain(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(parsed) => parsed
            .host_str()
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| raw.to_owned()),
        Err(_) => raw.to_owned(),
    }
}
