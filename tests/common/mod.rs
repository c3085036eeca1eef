// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common test utilities for integration tests

#![allow(dead_code)]

use edp_cd_pipeline_operator::collaborators::{
    CodebaseImageStream, CodebaseImageStreamSpec, EDPComponent, EDPComponentSpec,
};
use edp_cd_pipeline_operator::crd::{CDPipeline, CDPipelineSpec, Stage, StageSpec, TriggerType};
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, DeleteParams, PostParams};
use kube::client::Client;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Get a Kubernetes client or skip the test if not in a cluster
pub async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => {
            println!("✓ Successfully connected to Kubernetes cluster");
            Some(client)
        }
        Err(e) => {
            eprintln!("⊘ Skipping integration test: not running in Kubernetes cluster: {e}");
            None
        }
    }
}

/// Create a test namespace
pub async fn create_test_namespace(
    client: &Client,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    let ns = Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(BTreeMap::from([
                ("test".to_string(), "integration".to_string()),
                ("managed-by".to_string(), "cd-pipeline-test".to_string()),
            ])),
            ..Default::default()
        },
        ..Default::default()
    };

    match namespaces.create(&PostParams::default(), &ns).await {
        Ok(_) => {
            println!("Created test namespace: {name}");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            println!("Test namespace already exists: {name}");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

/// Cleanup test namespace
pub async fn cleanup_test_namespace(
    client: &Client,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let namespaces: Api<Namespace> = Api::all(client.clone());

    match namespaces.delete(name, &DeleteParams::default()).await {
        Ok(_) => {
            println!("Deleted test namespace: {name}");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 404 => {
            println!("Test namespace already deleted: {name}");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

/// Create `resource` in `namespace`, tolerating an existing object
pub async fn create_namespaced<K>(
    client: &Client,
    namespace: &str,
    resource: &K,
) -> Result<(), Box<dyn std::error::Error>>
where
    K: Resource<Scope = kube::core::NamespaceResourceScope, DynamicType = ()>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned,
{
    let api: Api<K> = Api::namespaced(client.clone(), namespace);
    match api.create(&PostParams::default(), resource).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(()),
        Err(e) => Err(Box::new(e)),
    }
}

pub fn pipeline(name: &str, input_streams: &[&str], applications: &[&str]) -> CDPipeline {
    CDPipeline::new(
        name,
        CDPipelineSpec {
            name: name.to_string(),
            deployment_type: "container".to_string(),
            input_docker_streams: input_streams.iter().map(|s| (*s).to_string()).collect(),
            applications: applications.iter().map(|s| (*s).to_string()).collect(),
            applications_to_promote: None,
        },
    )
}

pub fn stage(name: &str, pipeline: &str, order: u32) -> Stage {
    Stage::new(
        name,
        StageSpec {
            name: name.to_string(),
            cd_pipeline: pipeline.to_string(),
            description: String::new(),
            trigger_type: TriggerType::Manual,
            order,
            quality_gates: Vec::new(),
            source: Default::default(),
            job_provisioning: "default".to_string(),
        },
    )
}

pub fn image_stream(name: &str, codebase: &str) -> CodebaseImageStream {
    CodebaseImageStream::new(
        name,
        CodebaseImageStreamSpec {
            codebase: codebase.to_string(),
            image_name: format!("registry.example.com/{codebase}"),
            tags: None,
        },
    )
}

pub fn docker_registry(url: &str) -> EDPComponent {
    EDPComponent::new(
        "docker-registry",
        EDPComponentSpec {
            component_type: "registry".to_string(),
            url: url.to_string(),
            icon: String::new(),
            visible: true,
        },
    )
}

/// Poll `check` until it returns true or `attempts` run out
pub async fn wait_until<F, Fut>(attempts: u32, interval: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..attempts {
        if check().await {
            return true;
        }
        sleep(interval).await;
    }
    false
}
