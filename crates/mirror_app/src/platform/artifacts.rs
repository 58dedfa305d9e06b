use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mirror_client::{Artifact, ArtifactKind, ArtifactStore, ReqwestArchiveService};
use mirror_logging::mirror_info;

pub(crate) fn save(output_dir: &Path, artifact: &Artifact) -> Result<PathBuf> {
    let store = ArtifactStore::open(output_dir)?;
    let path = store
        .save(artifact)
        .with_context(|| format!("failed to save {} in {}", artifact.filename, output_dir.display()))?;
    mirror_info!("Saved {} bytes to {}", artifact.bytes.len(), path.display());
    Ok(path)
}

pub(crate) async fn fetch_and_save(
    service: &ReqwestArchiveService,
    output_dir: &Path,
    job_id: &str,
    kind: ArtifactKind,
) -> Result<PathBuf> {
    let artifact = service
        .fetch_artifact(job_id, kind)
        .await
        .with_context(|| format!("failed to fetch {kind} artifact of job {job_id}"))?;
    save(output_dir, &artifact)
}
