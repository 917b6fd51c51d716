//! Backend client tests against a mock backend.

use gitsync_backend::{BackendClient, BackendError};
use gitsync_core::{BackendClone, BackendConfig, Credential, GitAction, RemoteAction, StashOp};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> BackendClient {
    BackendClient::new(&BackendConfig {
        url: format!("{}/api/git", server.uri()),
        request_timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn token() -> Credential {
    Credential::new("tok-123")
}

// =============================================================================
// Status
// =============================================================================

mod status {
    use super::*;

    #[tokio::test]
    async fn test_status_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/git/status/ws1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isRepo": true,
                "branches": [{"name": "main", "current": true}, {"name": "dev"}],
                "status": {"modified": ["src/lib.rs"], "untracked": ["notes.md"]},
                "currentBranch": "main"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = client_for(&server).get_status("ws1").await.unwrap();

        assert!(status.is_repo);
        assert_eq!(status.branches.len(), 2);
        assert_eq!(status.status.changed_count(), 2);
        assert_eq!(status.current_branch.as_deref(), Some("main"));
        assert!(status.commits.is_none());
    }

    #[tokio::test]
    async fn test_status_server_error_is_backend_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/git/status/ws1"))
            .respond_with(ResponseTemplate::new(503).set_body_string("workspace VM is starting"))
            .mount(&server)
            .await;

        let err = client_for(&server).get_status("ws1").await.unwrap_err();

        assert!(matches!(err, gitsync_core::Error::BackendUnavailable(_)));
        assert!(err.to_string().contains("workspace VM is starting"));
    }

    #[tokio::test]
    async fn test_status_invalid_json() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/git/status/ws1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not valid json"))
            .mount(&server)
            .await;

        let err = client_for(&server).status("ws1").await.unwrap_err();

        match err {
            BackendError::ParseError(_) => {}
            e => panic!("Expected ParseError, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let client = BackendClient::new(&BackendConfig {
            url: "http://127.0.0.1:1/api/git".to_string(),
            request_timeout: Duration::from_secs(2),
        })
        .unwrap();

        match client.status("ws1").await.unwrap_err() {
            BackendError::Unreachable(_) | BackendError::Request(_) => {}
            e => panic!("Expected Unreachable or Request error, got: {:?}", e),
        }
    }
}

// =============================================================================
// Mutations
// =============================================================================

mod mutations {
    use super::*;

    #[tokio::test]
    async fn test_remote_actions_send_bearer_token() {
        let server = MockServer::start().await;

        for action in ["fetch", "pull", "push"] {
            Mock::given(method("POST"))
                .and(path(format!("/api/git/{}/ws1", action)))
                .and(header("authorization", "Bearer tok-123"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = client_for(&server);
        for action in [RemoteAction::Fetch, RemoteAction::Pull, RemoteAction::Push] {
            client.run_action("ws1", action, &token()).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_commit_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/git/commit/ws1"))
            .and(header("authorization", "Bearer tok-123"))
            .and(body_json(json!({"files": ["a.rs", "b.rs"], "message": "Fix bug"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .commit("ws1", &["a.rs".to_string(), "b.rs".to_string()], "Fix bug", &token())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_stash_bodies() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/git/stash/ws1"))
            .and(body_json(json!({"action": "push", "message": "auto-stash before pull"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/git/stash/ws1"))
            .and(body_json(json!({"action": "pop"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client
            .stash("ws1", StashOp::Push, &token(), Some("auto-stash before pull"))
            .await
            .unwrap();
        client.stash("ws1", StashOp::Pop, &token(), None).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_pull_carries_backend_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/git/pull/ws1"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": "Your local changes would be overwritten by merge"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .run_action("ws1", RemoteAction::Pull, &token())
            .await
            .unwrap_err();

        match err {
            gitsync_core::Error::MutationFailed { action, message } => {
                assert_eq!(action, GitAction::Pull);
                assert_eq!(message, "Your local changes would be overwritten by merge");
            }
            e => panic!("Expected MutationFailed, got: {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_stash_pop_conflict_maps_to_stash_pop() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/git/stash/ws1"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"message": "CONFLICT (content)"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .stash("ws1", StashOp::Pop, &token(), None)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "stash pop failed: CONFLICT (content)");
    }
}
