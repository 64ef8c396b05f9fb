//! Embedding maintenance.
//!
//! Regenerates per-skill embeddings after content changes. The vector for a
//! skill is computed over its canonical name plus every current alias text,
//! so an alias confirmed in the workbench immediately sharpens semantic
//! matching for related tokens.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use skillmap_core::{
    AliasRepository, EmbeddingBackend, Error, Result, SkillEmbeddingRepository, SkillRepository,
    Uuid,
};

/// Regenerates skill embeddings from current name and alias content.
pub struct EmbeddingMaintainer {
    skills: Arc<dyn SkillRepository>,
    aliases: Arc<dyn AliasRepository>,
    embeddings: Arc<dyn SkillEmbeddingRepository>,
    backend: Arc<dyn EmbeddingBackend>,
}

impl EmbeddingMaintainer {
    pub fn new(
        skills: Arc<dyn SkillRepository>,
        aliases: Arc<dyn AliasRepository>,
        embeddings: Arc<dyn SkillEmbeddingRepository>,
        backend: Arc<dyn EmbeddingBackend>,
    ) -> Self {
        Self {
            skills,
            aliases,
            embeddings,
            backend,
        }
    }

    /// The text a skill's vector is computed over: canonical name followed
    /// by alias texts in key order.
    async fn compose_content(&self, skill_id: Uuid) -> Result<String> {
        let skill = self
            .skills
            .get(skill_id)
            .await?
            .ok_or(Error::SkillNotFound(skill_id))?;
        let aliases = self.aliases.list_for_skill(skill_id).await?;

        let mut parts = Vec::with_capacity(1 + aliases.len());
        parts.push(skill.name);
        parts.extend(aliases.into_iter().map(|a| a.alias_text));
        Ok(parts.join("; "))
    }

    /// Regenerate one skill's embedding, clearing its staleness. Exactly one
    /// backend call per invocation.
    #[instrument(skip(self), fields(subsystem = "resolve", component = "maintainer", op = "refresh", skill_id = %skill_id))]
    pub async fn refresh(&self, skill_id: Uuid) -> Result<()> {
        let content = self.compose_content(skill_id).await?;
        let mut vectors = self.backend.embed_texts(&[content]).await?;
        if vectors.is_empty() {
            return Err(Error::Embedding(format!(
                "backend returned no vector for skill {}",
                skill_id
            )));
        }
        self.embeddings
            .upsert(skill_id, vectors.remove(0), self.backend.model_name())
            .await?;
        info!(skill_id = %skill_id, "embedding regenerated");
        Ok(())
    }

    /// Sweep all stale embeddings. A failure on one skill is logged and the
    /// sweep continues; returns the number refreshed.
    #[instrument(skip(self), fields(subsystem = "resolve", component = "maintainer", op = "refresh_stale"))]
    pub async fn refresh_stale(&self) -> Result<usize> {
        let stale = self.embeddings.list_stale().await?;
        let total = stale.len();
        let mut refreshed = 0;
        for skill_id in stale {
            match self.refresh(skill_id).await {
                Ok(()) => refreshed += 1,
                Err(e) => {
                    warn!(skill_id = %skill_id, error = %e, "stale embedding refresh failed, skipping");
                }
            }
        }
        info!(refreshed, total, "stale sweep complete");
        Ok(refreshed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEmbeddingBackend;
    use skillmap_core::{AliasSource, CreateAliasRequest, Vector};
    use skillmap_db::MemoryStore;

    fn maintainer_over(
        store: &Arc<MemoryStore>,
        backend: Arc<MockEmbeddingBackend>,
    ) -> EmbeddingMaintainer {
        EmbeddingMaintainer::new(store.clone(), store.clone(), store.clone(), backend)
    }

    #[tokio::test]
    async fn test_refresh_composes_name_and_aliases() {
        let store = Arc::new(MemoryStore::new());
        let js = store.seed_skill("JavaScript").await;
        AliasRepository::create(
            store.as_ref(),
            CreateAliasRequest {
                skill_id: js,
                alias_text: "js".into(),
                source: AliasSource::Human,
                confidence: Some(1.0),
            },
        )
        .await
        .unwrap();

        let backend = Arc::new(MockEmbeddingBackend::new(4));
        let maintainer = maintainer_over(&store, backend.clone());
        maintainer.refresh(js).await.unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].texts, vec!["JavaScript; js".to_string()]);

        let emb = SkillEmbeddingRepository::get(store.as_ref(), js)
            .await
            .unwrap()
            .unwrap();
        assert!(!emb.stale);
        assert_eq!(emb.model, "mock-embed");
    }

    #[tokio::test]
    async fn test_refresh_unknown_skill_fails() {
        let store = Arc::new(MemoryStore::new());
        let backend = Arc::new(MockEmbeddingBackend::new(4));
        let maintainer = maintainer_over(&store, backend);

        let err = maintainer.refresh(skillmap_core::new_v7()).await.unwrap_err();
        assert!(matches!(err, Error::SkillNotFound(_)));
    }

    #[tokio::test]
    async fn test_refresh_stale_sweeps_only_stale() {
        let store = Arc::new(MemoryStore::new());
        let a = store.seed_skill("A").await;
        let b = store.seed_skill("B").await;
        store
            .upsert(a, Vector::from(vec![1.0, 0.0, 0.0, 0.0]), "m")
            .await
            .unwrap();
        store
            .upsert(b, Vector::from(vec![0.0, 1.0, 0.0, 0.0]), "m")
            .await
            .unwrap();
        store.mark_stale(a).await.unwrap();

        let backend = Arc::new(MockEmbeddingBackend::new(4));
        let maintainer = maintainer_over(&store, backend.clone());

        let refreshed = maintainer.refresh_stale().await.unwrap();
        assert_eq!(refreshed, 1);
        assert_eq!(backend.embed_call_count(), 1);
        assert!(store.list_stale().await.unwrap().is_empty());
    }
}
