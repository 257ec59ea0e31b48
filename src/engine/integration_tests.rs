// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use serde_json::{json, Value};

use crate::backends::stub::{
    digest_store, text_store, DigestProcess, FailingProcess, InstallableProcess, StubProcess,
};
use crate::engine::{
    execute, lineage, Job, PipelineRunner, PipelineWorker, SkipReason, StepOutcome, WorkerEvent,
};
use crate::errors::{PipelineError, ScheduleError, StoreError};
use crate::registry::{InstallLedger, Registry};
use crate::store::database::connect_in_memory;
use crate::store::{DataStore, ManualStore, Payload, StoreDescriptor, StoreMap, MANUAL_STORE_UID};
use crate::traits::{Process, ProcessDescriptor};

/// Integration tests for step execution, pipeline runs and the worker using
/// in-memory stores
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tracing::span::{Attributes, Id};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use tracing_subscriber::registry::LookupSpan;

    struct Fixture {
        manual: Arc<ManualStore>,
        runner: Arc<PipelineRunner>,
    }

    impl Fixture {
        async fn new(processes: Vec<Arc<dyn Process>>) -> Self {
            let pool = connect_in_memory().await.unwrap();
            let mut registry = Registry::new(InstallLedger::open(pool.clone()).await.unwrap());
            registry.register_processes(processes);
            registry.install_defaults().await.unwrap();

            let manual = Arc::new(ManualStore::new());
            let stores = StoreMap::open(&pool, registry.stores(), manual.clone())
                .await
                .unwrap();
            let runner = Arc::new(PipelineRunner::new(Arc::new(registry), stores));
            Self { manual, runner }
        }

        fn stores(&self) -> &StoreMap {
            self.runner.stores()
        }

        fn store(&self, uid: &str) -> Arc<dyn DataStore> {
            self.stores().require(uid).unwrap().clone()
        }

        async fn seed(&self, text: &str) -> String {
            self.manual.submit(payload(json!({ "text": text }))).await.unwrap()
        }
    }

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    fn shout() -> Arc<StubProcess> {
        Arc::new(StubProcess::new("shout", StoreDescriptor::manual(), text_store("loud")))
    }

    #[tokio::test]
    async fn test_execute_creates_entry_with_provenance() {
        let process = shout();
        let fixture = Fixture::new(vec![process.clone() as Arc<dyn Process>]).await;
        let seed = fixture.seed("hello").await;

        let report = execute(process.as_ref(), fixture.stores(), &seed).await.unwrap();

        let entry_key = report.created_key().unwrap().to_string();
        assert_eq!(report.payload(), Some(&payload(json!({"text": "HELLO"}))));
        assert_eq!(report.message(), format!("shout completed for {seed}: created entry {entry_key}"));

        let entry = fixture.store("loud").expect_entry(&entry_key).await.unwrap();
        assert_eq!(entry.provenance.process_uid, "shout");
        assert_eq!(entry.provenance.input_structure_uid.as_deref(), Some(MANUAL_STORE_UID));
        assert_eq!(entry.provenance.input_data_key.as_deref(), Some(seed.as_str()));
    }

    #[tokio::test]
    async fn test_non_repeatable_process_runs_once_per_input() {
        let process = shout();
        let fixture = Fixture::new(vec![process.clone() as Arc<dyn Process>]).await;
        let seed = fixture.seed("once").await;

        let first = execute(process.as_ref(), fixture.stores(), &seed).await.unwrap();
        let second = execute(process.as_ref(), fixture.stores(), &seed).await.unwrap();

        let first_key = first.created_key().unwrap().to_string();
        assert_eq!(
            second.outcome,
            StepOutcome::Skipped(SkipReason::AlreadyProcessed {
                existing_key: first_key
            })
        );
        assert!(second.payload().is_none());
        assert_eq!(process.call_count(), 1);
        assert_eq!(fixture.store("loud").count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_repeatable_process_runs_every_time() {
        let descriptor = ProcessDescriptor::new("echo", StoreDescriptor::manual(), text_store("echoes"))
            .unwrap()
            .repeatable(true);
        let process = Arc::new(StubProcess::with_descriptor(descriptor));
        let fixture = Fixture::new(vec![process.clone() as Arc<dyn Process>]).await;
        let seed = fixture.seed("again").await;

        execute(process.as_ref(), fixture.stores(), &seed).await.unwrap();
        let second = execute(process.as_ref(), fixture.stores(), &seed).await.unwrap();

        assert!(second.is_created());
        assert_eq!(fixture.store("echoes").count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_transformation_failure_is_reported_not_raised() {
        let process = Arc::new(FailingProcess::new("broken", StoreDescriptor::manual(), text_store("never")));
        let fixture = Fixture::new(vec![process.clone() as Arc<dyn Process>]).await;
        let seed = fixture.seed("x").await;

        let report = execute(process.as_ref(), fixture.stores(), &seed).await.unwrap();

        assert!(report.is_failed());
        assert!(report.message().contains("simulated failure"));
        assert_eq!(fixture.store("never").count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_input_entry_propagates_not_found() {
        let process = shout();
        let fixture = Fixture::new(vec![process.clone() as Arc<dyn Process>]).await;

        let result = execute(process.as_ref(), fixture.stores(), "no-such-key").await;

        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_unknown_store_is_an_error() {
        let process = shout();
        let result = execute(process.as_ref(), &StoreMap::new(), "k").await;
        assert!(matches!(result, Err(StoreError::UnknownStore { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_content_is_skipped() {
        let process = Arc::new(DigestProcess::new("digest", StoreDescriptor::manual(), digest_store("blobs")));
        let fixture = Fixture::new(vec![process.clone() as Arc<dyn Process>]).await;
        let first_seed = fixture.seed("same bytes").await;
        let second_seed = fixture.seed("same bytes").await;

        let first = execute(process.as_ref(), fixture.stores(), &first_seed).await.unwrap();
        let second = execute(process.as_ref(), fixture.stores(), &second_seed).await.unwrap();

        let first_key = first.created_key().unwrap().to_string();
        assert_eq!(
            second.outcome,
            StepOutcome::Skipped(SkipReason::DuplicateContent {
                existing_key: first_key.clone()
            })
        );
        assert!(second.message().contains(&format!("already imported, entry {first_key}")));
        assert_eq!(process.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(fixture.store("blobs").count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_run_step_refuses_uninstalled_process() {
        let process = Arc::new(InstallableProcess::new("model", StoreDescriptor::manual(), text_store("tags"), false));
        let fixture = Fixture::new(vec![process.clone() as Arc<dyn Process>]).await;
        let seed = fixture.seed("photo").await;

        let refused = fixture.runner.run_step(process.as_ref(), &seed).await.unwrap();
        assert!(refused.is_failed());
        assert_eq!(fixture.store("tags").count().await.unwrap(), 0);

        fixture.runner.registry().install(process.as_ref()).await.unwrap();
        let accepted = fixture.runner.run_step(process.as_ref(), &seed).await.unwrap();
        assert!(accepted.is_created());
    }

    #[tokio::test]
    async fn test_pipeline_runs_producer_before_consumer() {
        let ingest = Arc::new(StubProcess::new("a_ingest", StoreDescriptor::manual(), text_store("s1")));
        let refine = Arc::new(StubProcess::new("b_refine", text_store("s1"), text_store("s2")));
        let processes: Vec<Arc<dyn Process>> = vec![refine as Arc<dyn Process>, ingest as Arc<dyn Process>];
        let fixture = Fixture::new(processes.clone()).await;
        let seeds = vec![fixture.seed("one").await, fixture.seed("two").await];

        let summary = fixture.runner.run(&processes, &seeds).await.unwrap();

        assert_eq!(summary.order, vec!["a_ingest", "b_refine"]);
        assert_eq!(summary.created(), 4);
        assert_eq!(summary.skipped(), 0);
        assert_eq!(summary.reports_for("b_refine").count(), 2);

        let refined = fixture.store("s2").list_all().await.unwrap();
        let s1_keys = fixture.store("s1").fetch_all_entry_keys().await.unwrap();
        for entry in &refined {
            assert_eq!(entry.provenance.input_structure_uid.as_deref(), Some("s1"));
            assert!(s1_keys.contains(entry.provenance.input_data_key.as_ref().unwrap()));
        }

        let rerun = fixture.runner.run(&processes, &seeds).await.unwrap();
        assert_eq!(rerun.created(), 0);
        assert_eq!(rerun.skipped(), 4);
    }

    #[tokio::test]
    async fn test_pipeline_continues_after_failures() {
        let ingest = Arc::new(StubProcess::new("ingest", StoreDescriptor::manual(), text_store("s1")));
        let processes: Vec<Arc<dyn Process>> = vec![ingest as Arc<dyn Process>];
        let fixture = Fixture::new(processes.clone()).await;
        let good = fixture.seed("fine").await;
        let bad = fixture.manual.submit(payload(json!({"other": 1}))).await.unwrap();
        let seeds = vec![bad, "missing".to_string(), good];

        let summary = fixture.runner.run(&processes, &seeds).await.unwrap();

        assert_eq!(summary.failed(), 2);
        assert_eq!(summary.created(), 1);
    }

    #[tokio::test]
    async fn test_pipeline_rejects_cycles() {
        let p = Arc::new(StubProcess::new("p", text_store("s1"), text_store("s2")));
        let q = Arc::new(StubProcess::new("q", text_store("s2"), text_store("s1")));
        let processes: Vec<Arc<dyn Process>> = vec![p as Arc<dyn Process>, q as Arc<dyn Process>];
        let fixture = Fixture::new(processes.clone()).await;

        let result = fixture.runner.run(&processes, &[]).await;

        assert!(matches!(
            result,
            Err(PipelineError::Schedule(ScheduleError::CyclicDependency { .. }))
        ));
    }

    #[tokio::test]
    async fn test_worker_reports_progress_and_stops() {
        let ingest = Arc::new(StubProcess::new("ingest", StoreDescriptor::manual(), text_store("s1")));
        let fixture = Fixture::new(vec![ingest as Arc<dyn Process>]).await;
        let seed = fixture.seed("queued").await;

        let worker = PipelineWorker::spawn(fixture.runner.clone());
        let mut events = worker.subscribe();

        let job_id = worker
            .submit(Job::Run {
                process_uids: vec![],
                seed_keys: vec![seed],
            })
            .await
            .unwrap();
        let failing_job = worker
            .submit(Job::Step {
                process_uid: "ghost".to_string(),
                input_key: "k".to_string(),
            })
            .await
            .unwrap();
        worker.shutdown().await.unwrap();

        let mut received = Vec::new();
        while let Ok(event) = events.recv().await {
            received.push(event);
        }

        assert!(matches!(received[0], WorkerEvent::JobStarted { job_id: id } if id == job_id));
        assert!(matches!(
            &received[1],
            WorkerEvent::StepFinished { job_id: id, report } if *id == job_id && report.is_created()
        ));
        assert!(matches!(received[2], WorkerEvent::JobFinished { job_id: id, error: None } if id == job_id));
        assert!(matches!(received[3], WorkerEvent::JobStarted { job_id: id } if id == failing_job));
        assert!(matches!(
            &received[4],
            WorkerEvent::JobFinished { job_id: id, error: Some(_) } if *id == failing_job
        ));
        assert!(matches!(received[5], WorkerEvent::WorkerStopped));
        assert_eq!(fixture.store("s1").count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lineage_walks_back_to_manual_root() {
        let ingest = Arc::new(StubProcess::new("ingest", StoreDescriptor::manual(), text_store("s1")));
        let refine = Arc::new(StubProcess::new("refine", text_store("s1"), text_store("s2")));
        let processes: Vec<Arc<dyn Process>> = vec![ingest as Arc<dyn Process>, refine as Arc<dyn Process>];
        let fixture = Fixture::new(processes.clone()).await;
        let seed = fixture.seed("root").await;
        fixture.runner.run(&processes, &[seed.clone()]).await.unwrap();
        let leaf = fixture.store("s2").fetch_all_entry_keys().await.unwrap().remove(0);

        let chain = lineage(fixture.stores(), "s2", &leaf).await.unwrap();
        let hops: Vec<(&str, &str)> = chain
            .iter()
            .map(|l| (l.store_uid.as_str(), l.process_uid.as_str()))
            .collect();
        assert_eq!(
            hops,
            vec![("s2", "refine"), ("s1", "ingest"), (MANUAL_STORE_UID, MANUAL_STORE_UID)]
        );
        assert_eq!(chain[2].entry_key, seed);

        fixture.manual.clear().await;
        let after_restart = lineage(fixture.stores(), "s2", &leaf).await.unwrap();
        assert_eq!(after_restart.len(), 2);

        let middle = chain[1].entry_key.clone();
        fixture.store("s1").delete(&middle).await.unwrap();
        let dangling = lineage(fixture.stores(), "s2", &leaf).await;
        assert!(matches!(dangling, Err(StoreError::NotFound { .. })));
    }

    /// Records every new span's name next to the span it was opened in.
    #[derive(Clone, Default)]
    struct SpanRecorder(Arc<Mutex<Vec<(String, Option<String>)>>>);

    impl<S> Layer<S> for SpanRecorder
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, ctx: Context<'_, S>) {
            let parent = ctx.current_span().metadata().map(|m| m.name().to_string());
            self.0
                .lock()
                .unwrap()
                .push((attrs.metadata().name().to_string(), parent));
        }
    }

    #[tokio::test]
    async fn test_pipeline_steps_run_inside_the_pipeline_span() {
        let recorder = SpanRecorder::default();
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(recorder.clone()));

        let process = shout();
        let fixture = Fixture::new(vec![process.clone() as Arc<dyn Process>]).await;
        let seed = fixture.seed("traced").await;
        fixture
            .runner
            .run(&[process as Arc<dyn Process>], &[seed])
            .await
            .unwrap();

        let spans = recorder.0.lock().unwrap().clone();
        assert!(spans.iter().any(|(name, _)| name == "pipeline"));
        assert!(spans.contains(&("step".to_string(), Some("pipeline".to_string()))));
    }
}
