// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `cdpipeline.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::crd::CDPipelineStatus;
    use crate::labels::PIPELINE_NAME_LABEL;
    use crate::platform::PlatformType;
    use crate::reconcilers::finalizers::has_finalizer;
    use crate::testing::{
        test_context, test_pipeline, test_stage, FakeCluster, TEST_NAMESPACE, TEST_PIPELINE,
    };
    use std::sync::Arc;

    fn seed_pipeline(cluster: &FakeCluster) -> CDPipeline {
        let pipeline = test_pipeline(TEST_PIPELINE, TEST_NAMESPACE, &["img-a"], &["cb-a"], &[]);
        cluster.insert_pipeline(pipeline.clone());
        pipeline
    }

    async fn reconcile(cluster: &Arc<FakeCluster>, pipeline: &CDPipeline) -> Result<Action> {
        reconcile_cdpipeline(
            &test_context(cluster, PlatformType::Kubernetes, false),
            pipeline,
        )
        .await
    }

    fn seed_labelled_stage(cluster: &FakeCluster) {
        let mut stage = test_stage("dev", TEST_NAMESPACE, TEST_PIPELINE, 0);
        stage
            .labels_mut()
            .insert(PIPELINE_NAME_LABEL.to_string(), TEST_PIPELINE.to_string());
        cluster.insert_stage(stage);
    }

    #[test]
    fn test_build_jenkins_folder() {
        let pipeline = test_pipeline(TEST_PIPELINE, TEST_NAMESPACE, &[], &[], &[]);

        let folder = build_jenkins_folder(&pipeline);

        assert_eq!(folder.name_any(), "p-cd-pipeline");
        assert_eq!(folder.namespace().as_deref(), Some("ci"));
        assert_eq!(folder.owner_references()[0].kind, "CDPipeline");
        assert_eq!(folder.owner_references()[0].uid, "uid-pipeline-p");
    }

    #[tokio::test]
    async fn test_adds_finalizers_and_ready_status() {
        let cluster = FakeCluster::new();
        let pipeline = seed_pipeline(&cluster);

        reconcile(&cluster, &pipeline).await.unwrap();

        let stored = cluster.pipeline(TEST_NAMESPACE, TEST_PIPELINE).unwrap();
        assert!(has_finalizer(&stored, FOREGROUND_DELETION_FINALIZER));
        assert!(has_finalizer(&stored, OWNED_STAGES_FINALIZER));
        let status = stored.status.unwrap();
        assert!(status.available);
        assert_eq!(status.action, "setup_initial_structure");
        assert_eq!(status.observed_generation, Some(1));
        assert!(cluster.jenkins_folder(TEST_NAMESPACE, "p-cd-pipeline").is_none());
    }

    #[tokio::test]
    async fn test_creates_folder_when_jenkins_runs() {
        let cluster = FakeCluster::new();
        cluster.enable_jenkins(TEST_NAMESPACE);
        let pipeline = seed_pipeline(&cluster);

        reconcile(&cluster, &pipeline).await.unwrap();

        assert!(cluster
            .jenkins_folder(TEST_NAMESPACE, "p-cd-pipeline")
            .is_some());
    }

    #[tokio::test]
    async fn test_processed_generation_is_skipped() {
        let cluster = FakeCluster::new();
        cluster.enable_jenkins(TEST_NAMESPACE);
        let pipeline = seed_pipeline(&cluster);

        reconcile(&cluster, &pipeline).await.unwrap();
        cluster.clear_writes();
        reconcile(&cluster, &pipeline).await.unwrap();

        assert!(cluster.writes().is_empty());
    }

    #[tokio::test]
    async fn test_new_generation_is_processed() {
        let cluster = FakeCluster::new();
        let mut pipeline = test_pipeline(TEST_PIPELINE, TEST_NAMESPACE, &[], &[], &[]);
        pipeline.metadata.generation = Some(3);
        pipeline.status = Some(CDPipelineStatus {
            observed_generation: Some(2),
            ..Default::default()
        });
        cluster.insert_pipeline(pipeline.clone());

        reconcile(&cluster, &pipeline).await.unwrap();

        let stored = cluster.pipeline(TEST_NAMESPACE, TEST_PIPELINE).unwrap();
        assert_eq!(stored.status.unwrap().observed_generation, Some(3));
    }

    #[tokio::test]
    async fn test_deletion_waits_for_stages() {
        let cluster = FakeCluster::new();
        let pipeline = seed_pipeline(&cluster);
        seed_labelled_stage(&cluster);
        reconcile(&cluster, &pipeline).await.unwrap();
        cluster.mark_pipeline_deleted(TEST_NAMESPACE, TEST_PIPELINE);
        cluster.clear_writes();

        let action = reconcile(&cluster, &pipeline).await.unwrap();

        assert_eq!(action, Action::requeue(Duration::from_secs(10)));
        let stored = cluster.pipeline(TEST_NAMESPACE, TEST_PIPELINE).unwrap();
        assert!(has_finalizer(&stored, OWNED_STAGES_FINALIZER));
        assert!(cluster.writes().is_empty());
    }

    #[tokio::test]
    async fn test_deletion_released_once_stages_are_gone() {
        let cluster = FakeCluster::new();
        let pipeline = seed_pipeline(&cluster);
        seed_labelled_stage(&cluster);
        reconcile(&cluster, &pipeline).await.unwrap();
        cluster.mark_pipeline_deleted(TEST_NAMESPACE, TEST_PIPELINE);
        reconcile(&cluster, &pipeline).await.unwrap();

        cluster.remove_stage(TEST_NAMESPACE, "dev");
        cluster.clear_writes();
        let action = reconcile(&cluster, &pipeline).await.unwrap();

        assert_eq!(action, Action::await_change());
        assert_eq!(cluster.writes(), vec!["update CDPipeline ci/p"]);
        let stored = cluster.pipeline(TEST_NAMESPACE, TEST_PIPELINE).unwrap();
        assert!(!has_finalizer(&stored, OWNED_STAGES_FINALIZER));
        assert!(has_finalizer(&stored, FOREGROUND_DELETION_FINALIZER));

        cluster.clear_writes();
        reconcile(&cluster, &pipeline).await.unwrap();
        assert!(cluster.writes().is_empty());
    }

    #[tokio::test]
    async fn test_unlabelled_stages_do_not_block_deletion() {
        let cluster = FakeCluster::new();
        let pipeline = seed_pipeline(&cluster);
        cluster.insert_stage(test_stage("other", TEST_NAMESPACE, "other-pipeline", 0));
        reconcile(&cluster, &pipeline).await.unwrap();
        cluster.mark_pipeline_deleted(TEST_NAMESPACE, TEST_PIPELINE);

        reconcile(&cluster, &pipeline).await.unwrap();

        let stored = cluster.pipeline(TEST_NAMESPACE, TEST_PIPELINE).unwrap();
        assert!(!has_finalizer(&stored, OWNED_STAGES_FINALIZER));
    }

    #[tokio::test]
    async fn test_missing_pipeline_is_noop() {
        let cluster = FakeCluster::new();
        let pipeline = test_pipeline(TEST_PIPELINE, TEST_NAMESPACE, &[], &[], &[]);

        let action = reconcile(&cluster, &pipeline).await.unwrap();

        assert_eq!(action, Action::await_change());
        assert!(cluster.writes().is_empty());
    }
}
