//! Tiered skill name resolution.
//!
//! A raw token passes through a strict tier ladder: normalization, exact
//! match against canonical names, alias match, then semantic match over the
//! skill embedding space. The first tier that produces a hit wins; later
//! tiers are never consulted. The embedding backend is treated as optional
//! infrastructure: any failure or timeout degrades the token to unresolved
//! instead of failing the caller.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use skillmap_core::{
    defaults, normalize, AliasRepository, EmbeddingBackend, Resolution, ResolutionTier, Result,
    SkillEmbeddingRepository, SkillHit, SkillRepository, SkillSuggestion, Vector,
};

/// Tunables for the resolution pipeline.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Minimum similarity score for an automatic semantic match.
    pub acceptance_threshold: f32,
    /// How many nearest neighbors to retain as suggestion candidates.
    pub suggestion_top_k: i64,
    /// Upper bound on one embedding call.
    pub embed_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: defaults::ACCEPT_THRESHOLD,
            suggestion_top_k: defaults::SUGGEST_TOP_K,
            embed_timeout: Duration::from_secs(defaults::EMBED_TIMEOUT_SECS),
        }
    }
}

impl ResolverConfig {
    /// Build from environment variables, falling back to defaults:
    /// - `SKILLMAP_ACCEPT_THRESHOLD`
    /// - `SKILLMAP_SUGGEST_TOP_K`
    /// - `SKILLMAP_EMBED_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("SKILLMAP_ACCEPT_THRESHOLD") {
            if let Ok(parsed) = v.parse::<f32>() {
                config.acceptance_threshold = parsed;
            }
        }
        if let Ok(v) = std::env::var("SKILLMAP_SUGGEST_TOP_K") {
            if let Ok(parsed) = v.parse::<i64>() {
                config.suggestion_top_k = parsed;
            }
        }
        if let Ok(v) = std::env::var("SKILLMAP_EMBED_TIMEOUT_SECS") {
            if let Ok(parsed) = v.parse::<u64>() {
                config.embed_timeout = Duration::from_secs(parsed);
            }
        }
        config
    }

    pub fn with_acceptance_threshold(mut self, threshold: f32) -> Self {
        self.acceptance_threshold = threshold;
        self
    }

    pub fn with_suggestion_top_k(mut self, top_k: i64) -> Self {
        self.suggestion_top_k = top_k;
        self
    }

    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }
}

/// Resolves raw skill tokens to canonical skills.
pub struct SkillResolver {
    skills: Arc<dyn SkillRepository>,
    aliases: Arc<dyn AliasRepository>,
    embeddings: Arc<dyn SkillEmbeddingRepository>,
    backend: Arc<dyn EmbeddingBackend>,
    config: ResolverConfig,
}

impl SkillResolver {
    pub fn new(
        skills: Arc<dyn SkillRepository>,
        aliases: Arc<dyn AliasRepository>,
        embeddings: Arc<dyn SkillEmbeddingRepository>,
        backend: Arc<dyn EmbeddingBackend>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            skills,
            aliases,
            embeddings,
            backend,
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve one raw token through the tier ladder.
    ///
    /// The returned [`Resolution`] carries nearest-neighbor candidates even
    /// when no tier accepted, so callers can seed suggestion lists without a
    /// second embedding call. A store error propagates; an embedding backend
    /// error does not.
    pub async fn resolve(&self, token: &str) -> Result<Resolution> {
        let key = normalize(token);
        if key.is_empty() {
            return Ok(Resolution::unresolved());
        }

        if let Some(skill) = self.skills.get_by_key(&key).await? {
            debug!(token = %token, tier = "exact", skill_id = %skill.id, "token resolved");
            return Ok(Resolution {
                tier: ResolutionTier::Exact,
                skill_id: Some(skill.id),
                score: None,
                candidates: Vec::new(),
            });
        }

        if let Some(alias) = self.aliases.get_by_key(&key).await? {
            debug!(token = %token, tier = "alias", skill_id = %alias.skill_id, "token resolved");
            return Ok(Resolution {
                tier: ResolutionTier::Alias,
                skill_id: Some(alias.skill_id),
                score: None,
                candidates: Vec::new(),
            });
        }

        let query = match self.embed_one(&key).await {
            Some(vector) => vector,
            None => return Ok(Resolution::unresolved()),
        };

        let hits = self
            .embeddings
            .find_similar(&query, self.config.suggestion_top_k)
            .await?;
        let candidates = self.hydrate_candidates(&hits).await?;

        match hits.first() {
            Some(best) if best.score >= self.config.acceptance_threshold => {
                debug!(
                    token = %token,
                    tier = "semantic",
                    skill_id = %best.skill_id,
                    score = best.score,
                    "token resolved"
                );
                Ok(Resolution {
                    tier: ResolutionTier::Semantic,
                    skill_id: Some(best.skill_id),
                    score: Some(best.score),
                    candidates,
                })
            }
            _ => Ok(Resolution {
                tier: ResolutionTier::Unresolved,
                skill_id: None,
                score: None,
                candidates,
            }),
        }
    }

    /// Nearest-neighbor suggestions for a token, without the acceptance
    /// threshold. Degrades to an empty list if the backend is unavailable.
    pub async fn suggestions(&self, token: &str) -> Result<Vec<SkillSuggestion>> {
        let key = normalize(token);
        if key.is_empty() {
            return Ok(Vec::new());
        }
        let query = match self.embed_one(&key).await {
            Some(vector) => vector,
            None => return Ok(Vec::new()),
        };
        let hits = self
            .embeddings
            .find_similar(&query, self.config.suggestion_top_k)
            .await?;
        self.hydrate_candidates(&hits).await
    }

    /// Embed one normalized token, bounded by the configured timeout.
    /// Returns `None` on timeout, backend error, or an empty response.
    async fn embed_one(&self, key: &str) -> Option<Vector> {
        let texts = [key.to_string()];
        let call = self.backend.embed_texts(&texts);
        match tokio::time::timeout(self.config.embed_timeout, call).await {
            Ok(Ok(mut vectors)) if !vectors.is_empty() => Some(vectors.remove(0)),
            Ok(Ok(_)) => {
                warn!(token = %key, "embedding backend returned no vector");
                None
            }
            Ok(Err(e)) => {
                warn!(token = %key, error = %e, "embedding backend failed, treating token as unresolved");
                None
            }
            Err(_) => {
                warn!(
                    token = %key,
                    timeout_secs = self.config.embed_timeout.as_secs(),
                    "embedding call timed out, treating token as unresolved"
                );
                None
            }
        }
    }

    /// Attach canonical names to raw similarity hits. Hits whose skill row
    /// disappeared mid-flight are dropped.
    async fn hydrate_candidates(&self, hits: &[SkillHit]) -> Result<Vec<SkillSuggestion>> {
        let mut candidates = Vec::with_capacity(hits.len());
        for hit in hits {
            if let Some(skill) = self.skills.get(hit.skill_id).await? {
                candidates.push(SkillSuggestion {
                    skill_id: hit.skill_id,
                    name: skill.name,
                    score: hit.score,
                });
            }
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEmbeddingBackend;
    use skillmap_core::{AliasSource, CreateAliasRequest};
    use skillmap_db::MemoryStore;

    fn resolver_over(
        store: &Arc<MemoryStore>,
        backend: Arc<MockEmbeddingBackend>,
        config: ResolverConfig,
    ) -> SkillResolver {
        SkillResolver::new(
            store.clone(),
            store.clone(),
            store.clone(),
            backend,
            config,
        )
    }

    #[tokio::test]
    async fn test_empty_token_short_circuits() {
        let store = Arc::new(MemoryStore::new());
        let backend = Arc::new(MockEmbeddingBackend::new(4));
        let resolver = resolver_over(&store, backend.clone(), ResolverConfig::default());

        let res = resolver.resolve("   ").await.unwrap();
        assert_eq!(res.tier, ResolutionTier::Unresolved);
        assert_eq!(backend.embed_call_count(), 0);
    }

    #[tokio::test]
    async fn test_exact_match_skips_embedding() {
        let store = Arc::new(MemoryStore::new());
        let skill_id = store.seed_skill("Python Developer").await;
        let backend = Arc::new(MockEmbeddingBackend::new(4));
        let resolver = resolver_over(&store, backend.clone(), ResolverConfig::default());

        let res = resolver.resolve("  python_developer ").await.unwrap();
        assert_eq!(res.tier, ResolutionTier::Exact);
        assert_eq!(res.skill_id, Some(skill_id));
        assert_eq!(backend.embed_call_count(), 0);
    }

    #[tokio::test]
    async fn test_alias_match_before_semantic() {
        let store = Arc::new(MemoryStore::new());
        let js = store.seed_skill("JavaScript").await;
        AliasRepository::create(
            store.as_ref(),
            CreateAliasRequest {
                skill_id: js,
                alias_text: "js".into(),
                source: AliasSource::Seed,
                confidence: Some(1.0),
            },
        )
        .await
        .unwrap();

        let backend = Arc::new(MockEmbeddingBackend::new(4));
        let resolver = resolver_over(&store, backend.clone(), ResolverConfig::default());

        let res = resolver.resolve("JS").await.unwrap();
        assert_eq!(res.tier, ResolutionTier::Alias);
        assert_eq!(res.skill_id, Some(js));
        assert_eq!(backend.embed_call_count(), 0);
    }

    #[tokio::test]
    async fn test_semantic_match_above_threshold() {
        let store = Arc::new(MemoryStore::new());
        let pytorch = store.seed_skill("PyTorch").await;
        store
            .upsert(pytorch, Vector::from(vec![1.0, 0.0, 0.0, 0.0]), "test-model")
            .await
            .unwrap();

        // Normalizes to "py torch", so neither the exact nor the alias tier
        // can claim it before the vector lookup.
        let backend = Arc::new(
            MockEmbeddingBackend::new(4)
                .with_vector("py torch", vec![0.95, 0.05, 0.0, 0.0]),
        );
        let resolver = resolver_over(&store, backend, ResolverConfig::default());

        let res = resolver.resolve("py-torch").await.unwrap();
        assert_eq!(res.tier, ResolutionTier::Semantic);
        assert_eq!(res.skill_id, Some(pytorch));
        assert!(res.score.unwrap() >= 0.80);
        assert_eq!(res.candidates.len(), 1);
        assert_eq!(res.candidates[0].name, "PyTorch");
    }

    #[tokio::test]
    async fn test_below_threshold_keeps_candidates() {
        let store = Arc::new(MemoryStore::new());
        let cooking = store.seed_skill("Cooking").await;
        store
            .upsert(cooking, Vector::from(vec![1.0, 0.0, 0.0, 0.0]), "test-model")
            .await
            .unwrap();

        // Roughly orthogonal query: similarity well below the threshold.
        let backend = Arc::new(
            MockEmbeddingBackend::new(4)
                .with_vector("quantum basket weaving", vec![0.1, 0.99, 0.0, 0.0]),
        );
        let resolver = resolver_over(&store, backend, ResolverConfig::default());

        let res = resolver.resolve("quantum basket weaving").await.unwrap();
        assert_eq!(res.tier, ResolutionTier::Unresolved);
        assert!(res.skill_id.is_none());
        assert_eq!(res.candidates.len(), 1);
        assert_eq!(res.candidates[0].skill_id, cooking);
    }

    #[tokio::test]
    async fn test_backend_failure_degrades_to_unresolved() {
        let store = Arc::new(MemoryStore::new());
        let backend = Arc::new(MockEmbeddingBackend::new(4).with_failure());
        let resolver = resolver_over(&store, backend, ResolverConfig::default());

        let res = resolver.resolve("anything").await.unwrap();
        assert_eq!(res.tier, ResolutionTier::Unresolved);
        assert!(res.candidates.is_empty());
    }

    #[tokio::test]
    async fn test_backend_timeout_degrades_to_unresolved() {
        let store = Arc::new(MemoryStore::new());
        let backend =
            Arc::new(MockEmbeddingBackend::new(4).with_latency(Duration::from_millis(200)));
        let config = ResolverConfig::default().with_embed_timeout(Duration::from_millis(10));
        let resolver = resolver_over(&store, backend, config);

        let res = resolver.resolve("slow token").await.unwrap();
        assert_eq!(res.tier, ResolutionTier::Unresolved);
    }

    #[test]
    fn test_config_defaults_carry_shared_constants() {
        let config = ResolverConfig::default();
        assert_eq!(config.acceptance_threshold, defaults::ACCEPT_THRESHOLD);
        assert_eq!(config.suggestion_top_k, defaults::SUGGEST_TOP_K);
        assert_eq!(
            config.embed_timeout,
            Duration::from_secs(defaults::EMBED_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_config_from_env_overrides() {
        std::env::set_var("SKILLMAP_ACCEPT_THRESHOLD", "0.9");
        std::env::set_var("SKILLMAP_SUGGEST_TOP_K", "3");
        let config = ResolverConfig::from_env();
        assert_eq!(config.acceptance_threshold, 0.9);
        assert_eq!(config.suggestion_top_k, 3);
        std::env::remove_var("SKILLMAP_ACCEPT_THRESHOLD");
        std::env::remove_var("SKILLMAP_SUGGEST_TOP_K");
    }
}
