//! End-to-end tests of the `simrank` binary against a mock API server.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CORPUS: &str = r#"[
  { "id": "1", "name": "Apple", "description": "A crisp red fruit" },
  { "id": "2", "name": "Orange", "description": "A juicy citrus fruit" },
  { "id": "3", "name": "Carrot", "description": "An orange root vegetable" }
]"#;

async fn mount_embedding(server: &MockServer, input: &str, vector: [f32; 3], calls: u64) {
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "input": input })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "embedding": vector, "index": 0 }],
            "model": "text-embedding-3-small",
            "usage": { "prompt_tokens": 4, "total_tokens": 4 }
        })))
        .expect(calls)
        .mount(server)
        .await;
}

async fn mount_corpus(server: &MockServer, calls: u64) {
    mount_embedding(server, "A crisp red fruit", [1.0, 0.0, 0.0], calls).await;
    mount_embedding(server, "A juicy citrus fruit", [0.9, 0.1, 0.0], calls).await;
    mount_embedding(server, "An orange root vegetable", [0.0, 0.0, 1.0], calls).await;
}

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fruits.json"), CORPUS).unwrap();
    dir
}

fn simrank(dir: &Path, server: &MockServer) -> Command {
    let mut cmd = Command::cargo_bin("simrank").unwrap();
    cmd.current_dir(dir)
        .env("XDG_CONFIG_HOME", dir)
        .env("OPENAI_API_KEY", "test-key")
        .env("OPENAI_BASE_URL", server.uri())
        .env_remove("SIMRANK_EMBEDDING_MODEL")
        .env_remove("SIMRANK_CHAT_MODEL")
        .env_remove("SIMRANK_CACHE_FILE")
        .env_remove("SIMRANK_TIMEOUT_SECS")
        .env_remove("SIMRANK_CONCURRENCY")
        .env_remove("RUST_LOG");
    cmd
}

/// Run a prepared command off the async runtime so the mock server keeps serving.
async fn run(mut cmd: Command) -> assert_cmd::assert::Assert {
    tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rank_prints_report() {
    let server = MockServer::start().await;
    mount_corpus(&server, 1).await;
    let dir = workspace();

    let mut cmd = simrank(dir.path(), &server);
    cmd.arg("rank").write_stdin("Apple\n");

    run(cmd)
        .await
        .success()
        .stdout(predicate::str::contains("Enter target item: "))
        .stdout(predicate::str::contains("Target: Apple"))
        .stdout(predicate::str::contains(
            "1. Orange\n   Dot Product      : 0.90\n   Cosine Similarity: 0.9939\n",
        ))
        .stdout(predicate::str::contains("2. Carrot"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_target_exits_zero() {
    let server = MockServer::start().await;
    mount_corpus(&server, 1).await;
    let dir = workspace();

    let mut cmd = simrank(dir.path(), &server);
    cmd.args(["rank", "fruits.json", "--target", "Banana"]);

    run(cmd)
        .await
        .success()
        .stdout(predicate::str::contains("Item not found: Banana"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_provider_failure_exits_nonzero() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;
    let dir = workspace();

    let mut cmd = simrank(dir.path(), &server);
    cmd.args(["rank", "--target", "Apple"]);

    run(cmd)
        .await
        .failure()
        .stdout(predicate::str::contains("Target:").not())
        .stderr(predicate::str::contains("failed to embed the corpus"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_duplicate_names_rejected() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("dupes.json"),
        r#"[
          { "id": "1", "name": "Apple", "description": "red" },
          { "id": "2", "name": "apple", "description": "green" }
        ]"#,
    )
    .unwrap();

    let mut cmd = simrank(dir.path(), &server);
    cmd.args(["rank", "dupes.json", "--target", "Apple"]);

    run(cmd)
        .await
        .failure()
        .stderr(predicate::str::contains("invalid corpus"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cache_file_skips_repeat_requests() {
    let server = MockServer::start().await;
    // Each description is fetched once across both runs.
    mount_corpus(&server, 1).await;
    let dir = workspace();
    let cache = dir.path().join("cache.json");

    for _ in 0..2 {
        let mut cmd = simrank(dir.path(), &server);
        cmd.args(["rank", "--target", "Apple", "--cache-file"])
            .arg(&cache);
        run(cmd)
            .await
            .success()
            .stdout(predicate::str::contains("1. Orange"));
    }

    assert!(cache.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_chat_prints_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [{ "role": "user", "content": "Say hi" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o-mini",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "Hi!" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = simrank(dir.path(), &server);
    cmd.args(["chat", "Say hi"]);

    run(cmd).await.success().stdout("Hi!\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_config_file_sets_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "model": "local-chat" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "local-chat",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": "ok" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("simrank");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "chat_model = \"local-chat\"\n").unwrap();

    let mut cmd = simrank(dir.path(), &server);
    cmd.args(["chat", "ping"]);

    run(cmd).await.success().stdout("ok\n");
}
