// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `lookup.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::testing::{
        test_pipeline, test_promotion_stage, test_stage, FakeCluster, TEST_NAMESPACE,
        TEST_PIPELINE,
    };

    #[tokio::test]
    async fn test_parent_pipeline_missing() {
        let cluster = FakeCluster::new();
        let stage = test_stage("dev", TEST_NAMESPACE, TEST_PIPELINE, 0);

        let err = parent_pipeline(cluster.as_ref(), &stage).await.unwrap_err();

        assert_eq!(
            err.downcast_ref::<StageError>(),
            Some(&StageError::PipelineNotFound {
                namespace: "ci".to_string(),
                name: "p".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_parent_pipeline_found() {
        let cluster = FakeCluster::new();
        cluster.insert_pipeline(test_pipeline(TEST_PIPELINE, TEST_NAMESPACE, &[], &[], &[]));
        let stage = test_stage("dev", TEST_NAMESPACE, TEST_PIPELINE, 0);

        let pipeline = parent_pipeline(cluster.as_ref(), &stage).await.unwrap();

        assert_eq!(pipeline.name_any(), "p");
    }

    #[test]
    fn test_previous_stage_name() {
        let stage = test_promotion_stage("qa", TEST_NAMESPACE, TEST_PIPELINE, 1, "dev");
        assert_eq!(previous_stage_name(&stage).unwrap(), "dev");

        let bare = test_stage("qa", TEST_NAMESPACE, TEST_PIPELINE, 1);
        let err = previous_stage_name(&bare).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StageError>(),
            Some(StageError::PreviousStageNotFound { order: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_find_previous_stage_matches_pipeline_and_order() {
        let cluster = FakeCluster::new();
        cluster.insert_stage(test_stage("dev", TEST_NAMESPACE, TEST_PIPELINE, 0));
        cluster.insert_stage(test_stage("other-dev", TEST_NAMESPACE, "other", 0));
        cluster.insert_stage(test_stage("prod", TEST_NAMESPACE, TEST_PIPELINE, 2));
        let qa = test_stage("qa", TEST_NAMESPACE, TEST_PIPELINE, 1);

        let previous = find_previous_stage(cluster.as_ref(), &qa).await.unwrap();

        assert_eq!(previous.map(|s| s.name_any()), Some("dev".to_string()));
    }

    #[tokio::test]
    async fn test_find_previous_stage_of_first_stage() {
        let cluster = FakeCluster::new();
        let dev = test_stage("dev", TEST_NAMESPACE, TEST_PIPELINE, 0);

        assert!(find_previous_stage(cluster.as_ref(), &dev)
            .await
            .unwrap()
            .is_none());
    }
}
