//! End-to-end runs: scrape or CSV source through to upsert

use criterion_pipeline::config::{EmbeddingConfig, IndexConfig, SourceConfig};
use criterion_pipeline::embedder::OpenAiEmbedder;
use criterion_pipeline::index::PineconeIndex;
use criterion_pipeline::output::read_vectors;
use criterion_pipeline::pipeline::{Pipeline, PipelineOptions};
use criterion_pipeline::source::{CsvSource, ScrapeSource};
use criterion_pipeline::{PipelineError, RetryPolicy, RunStage};
use serde_json::{json, Value};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CATALOG_PAGE: &str = r#"<html><body><table>
<tr class="criterion-channel__tr" data-href="/videos/cleo">
  <td><img class="criterion-channel__film-img" src="/img/cleo.jpg"></td>
  <td class="criterion-channel__td criterion-channel__td--title">Cleo from 5 to 7</td>
  <td class="criterion-channel__td criterion-channel__td--director">Agnès Varda</td>
  <td class="criterion-channel__td criterion-channel__td--country">France</td>
  <td class="criterion-channel__td criterion-channel__td--year">1962</td>
</tr>
<tr class="criterion-channel__tr" data-href="/videos/no-image">
  <td class="criterion-channel__td criterion-channel__td--title">No Image</td>
</tr>
<tr class="criterion-channel__tr" data-href="/videos/ikiru">
  <td><img class="criterion-channel__film-img" src="/img/ikiru.jpg"></td>
  <td class="criterion-channel__td criterion-channel__td--title">Ikiru</td>
  <td class="criterion-channel__td criterion-channel__td--director">Akira Kurosawa</td>
  <td class="criterion-channel__td criterion-channel__td--country">Japan</td>
  <td class="criterion-channel__td criterion-channel__td--year">1952</td>
</tr>
<tr class="criterion-channel__tr" data-href="/videos/stalker">
  <td><img class="criterion-channel__film-img" src="/img/stalker.jpg"></td>
  <td class="criterion-channel__td criterion-channel__td--title">Stalker</td>
  <td class="criterion-channel__td criterion-channel__td--director">Andrei Tarkovsky</td>
  <td class="criterion-channel__td criterion-channel__td--country">Soviet Union</td>
  <td class="criterion-channel__td criterion-channel__td--year">1979</td>
</tr>
</table></body></html>"#;

fn detail_page(description: &str, duration: &str) -> String {
    format!(
        r#"<html><head><meta name="description" content="{}"></head>
        <body><div class="duration-container">{}</div></body></html>"#,
        description, duration
    )
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1)).with_jitter(false)
}

fn source_config(server: &MockServer) -> SourceConfig {
    SourceConfig {
        catalog_url: format!("{}/catalog", server.uri()),
        detail_delay: 0,
        ..SourceConfig::default()
    }
}

fn embedder(server: &MockServer) -> OpenAiEmbedder {
    let config = EmbeddingConfig {
        base_url: server.uri(),
        ..EmbeddingConfig::default()
    };
    OpenAiEmbedder::new("sk-test", &config, &SourceConfig::default(), fast_retry())
        .expect("Failed to build embedder")
}

async fn index(server: &MockServer) -> PineconeIndex {
    PineconeIndex::connect(
        "pc-test",
        "films",
        Some(server.uri().as_str()),
        &IndexConfig::default(),
        &SourceConfig::default(),
        &fast_retry(),
    )
    .await
    .expect("Failed to connect index")
}

async fn mount_embeddings(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "embedding": [0.25, -0.5, 1.0] }]
        })))
        .mount(server)
        .await;
}

async fn mount_details(server: &MockServer) {
    for (slug, description, duration) in [
        ("cleo", "A singer awaits test results.", "1h 30m"),
        ("ikiru", "A bureaucrat learns he is dying.", "2h 23m"),
        ("stalker", "A guide leads two men into the Zone.", "2h 42m"),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/videos/{}", slug)))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(detail_page(description, duration)),
            )
            .mount(server)
            .await;
    }
}

fn upserted_ids(body: &Value) -> Vec<String> {
    body["vectors"]
        .as_array()
        .expect("vectors array")
        .iter()
        .map(|v| v["id"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_full_scrape_run_upserts_valid_rows() {
    let site = MockServer::start().await;
    let openai = MockServer::start().await;
    let pinecone = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CATALOG_PAGE))
        .expect(1)
        .mount(&site)
        .await;
    mount_details(&site).await;
    mount_embeddings(&openai).await;

    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .and(header("api-key", "pc-test"))
        .and(header("x-pinecone-api-version", "2024-07"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "upsertedCount": 3 })))
        .expect(1)
        .mount(&pinecone)
        .await;

    let source = ScrapeSource::new(&source_config(&site), fast_retry()).unwrap();
    let embedder = embedder(&openai);
    let index = index(&pinecone).await;
    let options = PipelineOptions {
        retry: fast_retry(),
        ..PipelineOptions::default()
    };

    let mut pipeline = Pipeline::new(&source, &embedder, options).with_index(&index);
    let summary = pipeline.run().await.expect("Pipeline should succeed");

    assert_eq!(pipeline.stage(), RunStage::Done);
    assert_eq!(summary.items_found, 3);
    assert_eq!(summary.vectors, 3);
    assert_eq!(summary.detail_failures, 0);
    assert_eq!(summary.batches_uploaded, 1);

    let requests = pinecone.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(upserted_ids(&body), vec!["film-0", "film-1", "film-2"]);

    let first = &body["vectors"][0];
    assert_eq!(first["values"], json!([0.25, -0.5, 1.0]));
    assert_eq!(first["metadata"]["title"], "Cleo from 5 to 7");
    assert_eq!(first["metadata"]["link"], format!("{}/videos/cleo", site.uri()));
    assert_eq!(first["metadata"]["image"], format!("{}/img/cleo.jpg", site.uri()));
    assert_eq!(first["metadata"]["runtime"], "1h 30m");
    assert_eq!(body["vectors"][2]["metadata"]["title"], "Stalker");

    // One embedding call per surviving row, each carrying the film text
    let embed_calls = openai.received_requests().await.unwrap();
    assert_eq!(embed_calls.len(), 3);
    let request: Value = serde_json::from_slice(&embed_calls[1].body).unwrap();
    let input = request["input"].as_str().unwrap();
    assert!(input.starts_with("Title: Ikiru\nDirector: Akira Kurosawa"));
    assert!(input.ends_with("Description: A bureaucrat learns he is dying."));
}

#[tokio::test]
async fn test_empty_catalog_makes_no_api_calls() {
    let site = MockServer::start().await;
    let openai = MockServer::start().await;
    let pinecone = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body><table></table></body></html>"),
        )
        .mount(&site)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&openai)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&pinecone)
        .await;

    let source = ScrapeSource::new(&source_config(&site), fast_retry()).unwrap();
    let embedder = embedder(&openai);
    let index = index(&pinecone).await;

    let mut pipeline =
        Pipeline::new(&source, &embedder, PipelineOptions::default()).with_index(&index);
    let result = pipeline.run().await;

    assert!(matches!(result, Err(PipelineError::EmptyCatalog)));
    assert_eq!(pipeline.stage(), RunStage::Aborted);
}

#[tokio::test]
async fn test_catalog_failure_after_retries_fails_run() {
    let site = MockServer::start().await;
    let openai = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&site)
        .await;

    let source = ScrapeSource::new(&source_config(&site), fast_retry()).unwrap();
    let embedder = embedder(&openai);

    let mut pipeline = Pipeline::new(&source, &embedder, PipelineOptions::default());
    let result = pipeline.run().await;

    assert!(result.is_err());
    assert!(openai.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_detail_page_still_embeds_film() {
    let site = MockServer::start().await;
    let openai = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CATALOG_PAGE))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos/ikiru"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&site)
        .await;
    mount_details(&site).await;
    mount_embeddings(&openai).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out").join("vectors.json");
    let source = ScrapeSource::new(&source_config(&site), fast_retry()).unwrap();
    let embedder = embedder(&openai);
    let options = PipelineOptions {
        output: Some(output.clone()),
        ..PipelineOptions::default()
    };

    let mut pipeline = Pipeline::new(&source, &embedder, options);
    let summary = pipeline.run().await.expect("Pipeline should succeed");

    assert_eq!(summary.detail_failures, 1);
    assert_eq!(summary.vectors, 3);
    assert!(!summary.uploaded);

    let vectors = read_vectors(&output).unwrap();
    assert_eq!(vectors[1].id, "film-1");
    assert_eq!(vectors[1].metadata["title"], "Ikiru");
    assert_eq!(vectors[1].metadata["description"], "");
    assert_eq!(vectors[1].metadata["runtime"], "");
}

#[tokio::test]
async fn test_csv_source_run_needs_no_site() {
    let openai = MockServer::start().await;
    mount_embeddings(&openai).await;

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("films.csv");
    std::fs::write(
        &csv_path,
        "title,link,image,director,country,year,description,duration\n\
         Ikiru,https://films.example.com/videos/ikiru,https://img.example.com/ikiru.jpg,Akira Kurosawa,Japan,1952,A bureaucrat learns he is dying.,2h 23m\n\
         ,https://films.example.com/videos/untitled,,,,,,\n\
         Stalker,https://films.example.com/videos/stalker,https://img.example.com/stalker.jpg,Andrei Tarkovsky,Soviet Union,1979,A guide leads two men into the Zone.,2h 42m\n",
    )
    .unwrap();

    let source = CsvSource::open(&csv_path).unwrap();
    let embedder = embedder(&openai);
    let output = dir.path().join("vectors.json");
    let options = PipelineOptions {
        output: Some(output.clone()),
        ..PipelineOptions::default()
    };

    let mut pipeline = Pipeline::new(&source, &embedder, options);
    let summary = pipeline.run().await.expect("Pipeline should succeed");

    assert_eq!(summary.items_found, 2);
    assert_eq!(summary.vectors, 2);
    assert_eq!(summary.detail_failures, 0);

    let vectors = read_vectors(&output).unwrap();
    let ids: Vec<&str> = vectors.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["film-0", "film-1"]);
    assert_eq!(vectors[1].metadata["runtime"], "2h 42m");
}

#[tokio::test]
async fn test_scrape_export_replays_through_csv_source() {
    let site = MockServer::start().await;
    let openai = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CATALOG_PAGE))
        .expect(1)
        .mount(&site)
        .await;
    mount_details(&site).await;
    mount_embeddings(&openai).await;

    let dir = TempDir::new().unwrap();
    let export = dir.path().join("scraped_films.csv");
    let scrape = ScrapeSource::new(&source_config(&site), fast_retry()).unwrap();
    let embedder = embedder(&openai);
    let options = PipelineOptions {
        catalog_csv: Some(export.clone()),
        ..PipelineOptions::default()
    };
    Pipeline::new(&scrape, &embedder, options)
        .run()
        .await
        .expect("Scrape run should succeed");

    // Second run from the export never touches the site
    let replay = CsvSource::open(&export).unwrap();
    let output = dir.path().join("vectors.json");
    let options = PipelineOptions {
        output: Some(output.clone()),
        ..PipelineOptions::default()
    };
    let summary = Pipeline::new(&replay, &embedder, options)
        .run()
        .await
        .expect("Replay run should succeed");

    assert_eq!(summary.items_found, 3);
    assert_eq!(summary.detail_failures, 0);
    let vectors = read_vectors(&output).unwrap();
    assert_eq!(vectors[0].metadata["director"], "Agnès Varda");
    assert_eq!(vectors[2].metadata["runtime"], "2h 42m");
    assert_eq!(
        vectors[1].metadata["link"],
        format!("{}/videos/ikiru", site.uri())
    );
}
