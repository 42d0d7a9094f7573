//! Upload-only runs and index host resolution

use criterion_pipeline::config::{IndexConfig, SourceConfig};
use criterion_pipeline::index::PineconeIndex;
use criterion_pipeline::output::{read_vectors, write_vectors};
use criterion_pipeline::pipeline::{upload_only, PipelineOptions};
use criterion_pipeline::{PipelineError, RetryPolicy, Vector};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1)).with_jitter(false)
}

fn vectors(count: usize) -> Vec<Vector> {
    (0..count)
        .map(|i| Vector {
            id: format!("film-{}", i),
            values: vec![i as f32, 0.5],
            metadata: BTreeMap::from([("title".to_string(), format!("Film {}", i))]),
        })
        .collect()
}

#[tokio::test]
async fn test_upload_only_resolves_host_and_batches() {
    let control = MockServer::start().await;
    let data = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/indexes/films"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "films",
            "host": data.uri(),
        })))
        .expect(1)
        .mount(&control)
        .await;
    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "upsertedCount": 2 })))
        .expect(3)
        .mount(&data)
        .await;

    // Round-trip through the artifact file as an upload-only run would
    let dir = TempDir::new().unwrap();
    let artifact = dir.path().join("vectors.json");
    write_vectors(&artifact, &vectors(5)).unwrap();
    let loaded = read_vectors(&artifact).unwrap();

    let index_config = IndexConfig {
        control_url: control.uri(),
        ..IndexConfig::default()
    };
    let index = PineconeIndex::connect(
        "pc-test",
        "films",
        None,
        &index_config,
        &SourceConfig::default(),
        &fast_retry(),
    )
    .await
    .unwrap();
    assert_eq!(index.host(), data.uri());

    let options = PipelineOptions {
        batch_size: 2,
        retry: fast_retry(),
        output: None,
        catalog_csv: None,
    };
    let summary = upload_only(&index, &loaded, &options).await.unwrap();
    assert_eq!(summary.batches_uploaded, 3);
    assert!(summary.uploaded);

    let requests = data.received_requests().await.unwrap();
    let sizes: Vec<usize> = requests
        .iter()
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["vectors"].as_array().map(Vec::len).unwrap_or(0)
        })
        .collect();
    assert_eq!(sizes, vec![2, 2, 1]);
}

#[tokio::test]
async fn test_rate_limited_batch_is_retried() {
    let data = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limit exceeded"))
        .up_to_n_times(1)
        .mount(&data)
        .await;
    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "upsertedCount": 3 })))
        .mount(&data)
        .await;

    let index = PineconeIndex::connect(
        "pc-test",
        "films",
        Some(data.uri().as_str()),
        &IndexConfig::default(),
        &SourceConfig::default(),
        &fast_retry(),
    )
    .await
    .unwrap();

    let options = PipelineOptions {
        retry: fast_retry(),
        ..PipelineOptions::default()
    };
    let summary = upload_only(&index, &vectors(3), &options).await.unwrap();

    assert_eq!(summary.batches_uploaded, 1);
    assert_eq!(data.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_exhausted_batch_stops_later_batches() {
    let data = MockServer::start().await;

    // First batch succeeds, every later request fails
    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "upsertedCount": 2 })))
        .up_to_n_times(1)
        .mount(&data)
        .await;
    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&data)
        .await;

    let index = PineconeIndex::connect(
        "pc-test",
        "films",
        Some(data.uri().as_str()),
        &IndexConfig::default(),
        &SourceConfig::default(),
        &fast_retry(),
    )
    .await
    .unwrap();

    let options = PipelineOptions {
        batch_size: 2,
        retry: fast_retry(),
        output: None,
        catalog_csv: None,
    };
    let result = upload_only(&index, &vectors(6), &options).await;

    match result {
        Err(PipelineError::BatchFailed { batch, total, .. }) => {
            assert_eq!(batch, 2);
            assert_eq!(total, 3);
        }
        other => panic!("expected BatchFailed, got {:?}", other.map(|s| s.batches_uploaded)),
    }
    // One success plus three attempts at the second batch; the third is never sent
    assert_eq!(data.received_requests().await.unwrap().len(), 4);
}
