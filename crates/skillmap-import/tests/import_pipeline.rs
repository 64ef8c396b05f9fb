//! End-to-end import pipeline tests over the in-memory store and the mock
//! embedding backend.

use std::sync::Arc;
use std::time::Duration;

use pgvector::Vector;

use skillmap_core::{
    AliasSource, ImportJobRepository, ImportStatus, RawSkillRepository, RawSkillStatus,
    ResolutionTier, SkillEmbeddingRepository,
};
use skillmap_db::MemoryStore;
use skillmap_import::{ImportOrchestrator, JobStatusReader, OrchestratorConfig};
use skillmap_resolve::{
    EmbeddingMaintainer, MockEmbeddingBackend, ResolutionWorkbench, ResolverConfig, SkillResolver,
};

struct Harness {
    store: Arc<MemoryStore>,
    backend: Arc<MockEmbeddingBackend>,
    orchestrator: ImportOrchestrator,
}

impl Harness {
    fn new(backend: MockEmbeddingBackend) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let store = Arc::new(MemoryStore::new());
        let backend = Arc::new(backend);
        let resolver = Arc::new(SkillResolver::new(
            store.clone(),
            store.clone(),
            store.clone(),
            backend.clone(),
            ResolverConfig::default(),
        ));
        let orchestrator = ImportOrchestrator::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            resolver,
            OrchestratorConfig::default().with_progress_every_rows(1),
        );
        Self {
            store,
            backend,
            orchestrator,
        }
    }

    async fn seed_org(&self) {
        let unit = self.store.seed_sub_unit("Engineering").await;
        let project = self.store.seed_project(unit.id, "Atlas").await;
        self.store.seed_team(project.id, "Core").await;
        self.store.seed_role("Developer").await;
    }

    fn workbench(&self) -> ResolutionWorkbench {
        let resolver = Arc::new(SkillResolver::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.backend.clone(),
            ResolverConfig::default(),
        ));
        let maintainer = Arc::new(EmbeddingMaintainer::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.backend.clone(),
        ));
        ResolutionWorkbench::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            resolver,
            maintainer,
        )
    }
}

fn roster(rows: &[&str]) -> String {
    let mut content = String::from(
        "external_ref,full_name,email,hired_on,allocation,sub_unit,project,team,role,skills\n",
    );
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    content
}

#[tokio::test]
async fn three_row_import_with_mixed_outcomes() {
    // Query vector at cosine 0.92 against PyTorch's stored [1,0,0,0]. The
    // token "py torch" ("py-torch" normalized) never matches the earlier
    // tiers, so row B has to go through the vector lookup.
    let harness = Harness::new(
        MockEmbeddingBackend::new(4).with_vector("py torch", vec![0.92, 0.391918, 0.0, 0.0]),
    );
    harness.seed_org().await;
    harness.store.seed_skill("Python Developer").await;
    let pytorch = harness.store.seed_skill("PyTorch").await;
    harness
        .store
        .upsert(pytorch, Vector::from(vec![1.0, 0.0, 0.0, 0.0]), "mock-embed")
        .await
        .unwrap();

    let content = roster(&[
        "E-1,Ada Lovelace,ada@example.com,2024-01-15,100,Engineering,Atlas,Core,Developer,python-developer",
        "E-2,Alan Turing,alan@example.com,15.02.2024,80,Engineering,Atlas,Core,Developer,py-torch",
        "E-3,Grace Hopper,grace@example.com,2024-03-01,100,Engineering,Atlas,Ghosts,Developer,cobol",
    ]);

    let job_id = harness
        .orchestrator
        .run_to_completion("roster.csv", &content)
        .await
        .unwrap();

    let reader = JobStatusReader::new(harness.store.clone());
    let view = reader.status(job_id).await.unwrap();
    assert_eq!(view.status, ImportStatus::PartialSuccess);
    assert_eq!(view.total_rows, 3);
    assert_eq!(view.processed_rows, 3);
    assert_eq!(view.succeeded_rows, 2);
    assert_eq!(view.failed_rows, 1);
    assert_eq!(view.error_summary["team_not_found"], 1);

    // Row A resolved exactly, without touching the backend for that token.
    let ada = harness.store.employee_by_ref("E-1").await.unwrap();
    let ada_skills = harness.store.assignments_for(ada.id).await;
    assert_eq!(ada_skills.len(), 1);
    assert_eq!(ada_skills[0].tier, ResolutionTier::Exact);

    // Row B accepted semantically at 0.92 against the 0.80 threshold.
    let alan = harness.store.employee_by_ref("E-2").await.unwrap();
    let alan_skills = harness.store.assignments_for(alan.id).await;
    assert_eq!(alan_skills.len(), 1);
    assert_eq!(alan_skills[0].skill_id, pytorch);
    assert_eq!(alan_skills[0].tier, ResolutionTier::Semantic);
    assert!(alan_skills[0].score.unwrap() > 0.91);

    // Row C never produced an employee.
    assert!(harness.store.employee_by_ref("E-3").await.is_none());
    assert_eq!(harness.store.employee_count().await, 2);
}

#[tokio::test]
async fn workbench_mapping_makes_next_import_alias_resolve() {
    let harness = Harness::new(MockEmbeddingBackend::new(4));
    harness.seed_org().await;
    let js = harness.store.seed_skill("JavaScript").await;

    let first = roster(&[
        "E-1,Ada Lovelace,,,,Engineering,Atlas,Core,Developer,js",
    ]);
    let job_id = harness
        .orchestrator
        .run_to_completion("first.csv", &first)
        .await
        .unwrap();

    // Token landed unresolved in the workbench queue.
    let workbench = harness.workbench();
    let items = workbench.list_unresolved(job_id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].input.raw_text, "js");

    harness.backend.clear_calls();
    workbench.resolve(items[0].input.id, js).await.unwrap();

    // Exactly one regeneration over name plus the confirmed alias.
    assert_eq!(harness.backend.embed_call_count(), 1);
    let input = RawSkillRepository::get(harness.store.as_ref(), items[0].input.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(input.status, RawSkillStatus::HumanResolved);

    // The next import resolves "js" through the alias tier; the embedding
    // backend is provably not consulted.
    harness.backend.clear_calls();
    let second = roster(&[
        "E-2,Alan Turing,,,,Engineering,Atlas,Core,Developer,js",
    ]);
    harness
        .orchestrator
        .run_to_completion("second.csv", &second)
        .await
        .unwrap();
    assert_eq!(harness.backend.embed_call_count(), 0);

    let alan = harness.store.employee_by_ref("E-2").await.unwrap();
    let skills = harness.store.assignments_for(alan.id).await;
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0].skill_id, js);
    assert_eq!(skills[0].tier, ResolutionTier::Alias);
}

#[tokio::test]
async fn all_rows_failing_row_locally_is_partial_success() {
    let harness = Harness::new(MockEmbeddingBackend::new(4));
    harness.seed_org().await;

    let content = roster(&[
        "E-1,Ada Lovelace,,never,,Engineering,Atlas,Core,Developer,",
        "E-2,Alan Turing,,also never,,Engineering,Atlas,Core,Developer,",
    ]);
    let job_id = harness
        .orchestrator
        .run_to_completion("bad-dates.csv", &content)
        .await
        .unwrap();

    let job = ImportJobRepository::get(harness.store.as_ref(), job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, ImportStatus::PartialSuccess);
    assert_eq!(job.failed_rows, 2);
    assert_eq!(job.succeeded_rows, 0);
    assert_eq!(job.error_summary["malformed_date"], 2);
}

#[tokio::test]
async fn clean_import_completes() {
    let harness = Harness::new(MockEmbeddingBackend::new(4));
    harness.seed_org().await;
    harness.store.seed_skill("Rust").await;

    let content = roster(&[
        "E-1,Ada Lovelace,,,,Engineering,Atlas,Core,Developer,rust",
        "E-2,Alan Turing,,,,Engineering,Atlas,Core,Developer,rust",
    ]);
    let job_id = harness
        .orchestrator
        .run_to_completion("clean.csv", &content)
        .await
        .unwrap();

    let job = ImportJobRepository::get(harness.store.as_ref(), job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, ImportStatus::Completed);
    assert_eq!(job.succeeded_rows, 2);
    assert!(job.error_summary.is_empty());
    assert!(job.progress_persisted_at.is_some());
}

#[tokio::test]
async fn unparsable_file_fails_the_job_with_reason() {
    let harness = Harness::new(MockEmbeddingBackend::new(4));

    let job_id = harness
        .orchestrator
        .run_to_completion("broken.csv", "a,b\n\"unterminated")
        .await
        .unwrap();

    let job = ImportJobRepository::get(harness.store.as_ref(), job_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, ImportStatus::Failed);
    assert!(job.failure_reason.unwrap().contains("unreadable"));
    assert_eq!(job.processed_rows, 0);
}

#[tokio::test]
async fn detached_start_returns_before_terminal_state() {
    let harness = Harness::new(MockEmbeddingBackend::new(4));
    harness.seed_org().await;
    harness.store.seed_skill("Rust").await;

    let content = roster(&[
        "E-1,Ada Lovelace,,,,Engineering,Atlas,Core,Developer,rust",
    ]);
    let job_id = harness
        .orchestrator
        .start("detached.csv", &content)
        .await
        .unwrap();

    let reader = JobStatusReader::new(harness.store.clone());
    let mut view = reader.status(job_id).await.unwrap();
    for _ in 0..100 {
        if view.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        view = reader.status(job_id).await.unwrap();
    }
    assert_eq!(view.status, ImportStatus::Completed);
    assert_eq!(view.processed_rows, 1);
}

#[tokio::test]
async fn seed_alias_beats_semantic_tier() {
    let harness = Harness::new(MockEmbeddingBackend::new(4));
    harness.seed_org().await;
    let k8s = harness.store.seed_skill("Kubernetes").await;
    skillmap_core::AliasRepository::create(
        harness.store.as_ref(),
        skillmap_core::CreateAliasRequest {
            skill_id: k8s,
            alias_text: "k8s".into(),
            source: AliasSource::Seed,
            confidence: Some(1.0),
        },
    )
    .await
    .unwrap();

    let content = roster(&[
        "E-1,Ada Lovelace,,,,Engineering,Atlas,Core,Developer,K8S",
    ]);
    harness
        .orchestrator
        .run_to_completion("alias.csv", &content)
        .await
        .unwrap();

    assert_eq!(harness.backend.embed_call_count(), 0);
    let ada = harness.store.employee_by_ref("E-1").await.unwrap();
    let skills = harness.store.assignments_for(ada.id).await;
    assert_eq!(skills[0].skill_id, k8s);
    assert_eq!(skills[0].tier, ResolutionTier::Alias);
}
