use crate::{resolve_domain, JobRecord, StatusFragment};

/// Merges a poll fragment into a copy of `existing`.
///
/// Every field the fragment carries replaces the stored one and absent fields
/// keep their previous value. `url` and `domain` are sticky: they are only
/// filled in while still unset, and the domain is derived from the fragment's
/// URL rather than trusted from the fragment. Applying the same fragment twice
/// gives the same record as applying it once.
pub fn reconcile(existing: &JobRecord, fragment: &StatusFragment) -> JobRecord {
    let mut merged = existing.clone();

    overwrite(&mut merged.status, &fragment.status);
    overwrite(&mut merged.progress, &fragment.progress);
    overwrite(&mut merged.message, &fragment.message);
    overwrite_present(&mut merged.started_at, &fragment.started_at);
    overwrite_present(&mut merged.completed_at, &fragment.completed_at);
    overwrite_present(&mut merged.files, &fragment.files);
    overwrite_present(&mut merged.errors, &fragment.errors);
    overwrite_present(&mut merged.download_method, &fragment.download_method);
    overwrite_present(&mut merged.warning, &fragment.warning);
    overwrite_present(&mut merged.site_map, &fragment.site_map);

    if merged.domain.is_none() {
        merged.domain = fragment
            .url
            .as_deref()
            .map(resolve_domain)
            .or_else(|| fragment.domain.clone());
    }
    if merged.url.is_none() {
        merged.url = fragment.url.clone();
    }

    merged
}

fn overwrite<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}

fn overwrite_present<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        *slot = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JobStatus;

    #[test]
    fn empty_fragment_is_identity() {
        let record = JobRecord::submitted("a", "https://example.com");
        assert_eq!(reconcile(&record, &StatusFragment::default()), record);
    }

    #[test]
    fn attached_record_picks_up_url_from_fragment() {
        let record = JobRecord::attached("a");
        let fragment = StatusFragment {
            url: Some("https://docs.example.org/start".into()),
            status: Some(JobStatus::Downloading),
            ..StatusFragment::default()
        };
        let merged = reconcile(&record, &fragment);
        assert_eq!(merged.url.as_deref(), Some("https://docs.example.org/start"));
        assert_eq!(merged.domain.as_deref(), Some("docs.example.org"));
    }
}
