//! Local observation source backed by a [`RuleSet`].

use crate::context::MetadataContext;
use crate::rules::RuleSet;
use async_trait::async_trait;
use bridge_traits::FileSystemAccess;
use core_sync::{AlbumRecord, ImageRecord, LocalObservationSource};
use std::path::Path;
use std::sync::Arc;
use tracing::trace;

/// Observes directories and files by running them through a rule set
#[derive(Clone)]
pub struct RuleBasedSource {
    rules: RuleSet,
    fs: Arc<dyn FileSystemAccess>,
}

impl RuleBasedSource {
    pub fn new(rules: RuleSet, fs: Arc<dyn FileSystemAccess>) -> Self {
        Self { rules, fs }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

impl std::fmt::Debug for RuleBasedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleBasedSource")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LocalObservationSource for RuleBasedSource {
    async fn observe_directory(
        &self,
        directory: &Path,
    ) -> core_sync::Result<Option<(String, AlbumRecord)>> {
        let ctx = MetadataContext::new(self.fs.clone(), directory);
        let observed = self
            .rules
            .observe_directory(&ctx)
            .await
            .map_err(|e| e.into_observation(directory))?;
        trace!(path = ?directory, observed = observed.is_some(), "Observed directory");
        Ok(observed)
    }

    async fn observe_file(
        &self,
        album_id: &str,
        file: &Path,
    ) -> core_sync::Result<Option<(String, ImageRecord)>> {
        let ctx = MetadataContext::new(self.fs.clone(), file);
        let observed = self
            .rules
            .observe_file(album_id, &ctx)
            .await
            .map_err(|e| e.into_observation(file))?;
        trace!(path = ?file, observed = observed.is_some(), "Observed file");
        Ok(observed)
    }
}
