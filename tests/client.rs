//! Client tests against a live server on an ephemeral port

use todoapp::app::{AppState, build_router};
use todoapp::client::{ApiClient, ClientError, Session, SessionStore};
use todoapp::core::auth::RegisterRequest;
use todoapp::core::config::Config;
use todoapp::core::db::{Priority, UpdateTodo};
use todoapp::core::todos::CreateTodoRequest;
use uuid::Uuid;

async fn spawn_server() -> (ApiClient, AppState) {
    let config = Config::from_lookup(|name| match name {
        "JWT_SECRET" => Some("client-test-secret".to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        _ => None,
    })
    .unwrap();
    let state = AppState::in_memory(&config);
    let app = build_router(state.clone(), &config).unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (ApiClient::new(format!("http://{}", addr)), state)
}

fn registration(username: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: "password123".to_string(),
    }
}

#[tokio::test]
async fn test_session_lifecycle() {
    let (client, _) = spawn_server().await;

    let mut session = client.register(&registration("alice")).await.unwrap();
    assert!(session.is_authenticated());

    let profile = client.profile(&mut session).await.unwrap();
    assert_eq!(Some(profile.id), session.user.as_ref().map(|u| u.id));

    let mut relogged = client
        .login("alice@example.com", "password123")
        .await
        .unwrap();
    assert_eq!(relogged.user, session.user);
    assert!(client.list_todos(&mut relogged).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_todo_operations() {
    let (client, _) = spawn_server().await;
    let mut session = client.register(&registration("alice")).await.unwrap();

    let todo = client
        .create_todo(
            &mut session,
            &CreateTodoRequest {
                title: "Buy milk".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!todo.completed);
    assert_eq!(todo.priority, Priority::Medium);

    let toggled = client.toggle_todo(&mut session, todo.id).await.unwrap();
    assert!(toggled.completed);

    let updated = client
        .update_todo(
            &mut session,
            todo.id,
            &UpdateTodo {
                title: Some("Buy oat milk".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Buy oat milk");
    assert!(updated.completed);

    let fetched = client.get_todo(&mut session, todo.id).await.unwrap();
    assert_eq!(fetched, updated);

    client.delete_todo(&mut session, todo.id).await.unwrap();
    let result = client.get_todo(&mut session, todo.id).await;
    match result {
        Err(ClientError::Api {
            status, message, ..
        }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Todo not found");
        }
        other => panic!("Expected 404, got {:?}", other),
    }
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_validation_errors_surface_fields() {
    let (client, _) = spawn_server().await;
    let mut session = client.register(&registration("alice")).await.unwrap();

    let result = client
        .create_todo(&mut session, &CreateTodoRequest::default())
        .await;

    match result {
        Err(ClientError::Api { status, errors, .. }) => {
            assert_eq!(status, 400);
            assert_eq!(errors[0].field, "title");
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_token_clears_session() {
    let (client, state) = spawn_server().await;
    let token = state.auth.jwt_service().issue(Uuid::new_v4()).unwrap();
    let mut session = Session {
        token: Some(token),
        user: None,
    };

    let result = client.list_todos(&mut session).await;

    match result {
        Err(ClientError::Unauthorized(message)) => {
            assert_eq!(message, "User not found. Token is invalid.");
        }
        other => panic!("Expected unauthorized, got {:?}", other),
    }
    assert!(!session.is_authenticated());

    let result = client.list_todos(&mut session).await;
    assert!(matches!(result, Err(ClientError::NotAuthenticated)));
}

#[tokio::test]
async fn test_failed_login_reports_message() {
    let (client, _) = spawn_server().await;
    client.register(&registration("alice")).await.unwrap();

    let result = client.login("alice@example.com", "wrong-password").await;

    match result {
        Err(ClientError::Api {
            status, message, ..
        }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid email or password");
        }
        other => panic!("Expected 401, got {:?}", other),
    }
}

#[tokio::test]
async fn test_session_survives_store_round_trip() {
    let (client, _) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("session.json"));

    let session = client.register(&registration("alice")).await.unwrap();
    store.save(&session).unwrap();

    let mut restored = store.load().unwrap();
    let profile = client.profile(&mut restored).await.unwrap();
    assert_eq!(profile.username, "alice");

    store.clear().unwrap();
    assert!(!store.load().unwrap().is_authenticated());
}

#[tokio::test]
async fn test_login_persists_and_rejection_clears_store() {
    let (client, state) = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("session.json"));
    let client = client.with_session_store(store.clone());

    let session = client.register(&registration("alice")).await.unwrap();
    assert_eq!(client.restore_session().unwrap(), session);

    // Token for an account the server does not know
    let stale = Session {
        token: Some(state.auth.jwt_service().issue(Uuid::new_v4()).unwrap()),
        user: session.user.clone(),
    };
    store.save(&stale).unwrap();

    let mut restored = client.restore_session().unwrap();
    let result = client.list_todos(&mut restored).await;

    assert!(matches!(result, Err(ClientError::Unauthorized(_))));
    assert!(!restored.is_authenticated());
    assert!(!store.load().unwrap().is_authenticated());
    assert!(!store.path().exists());

    let relogged = client
        .login("alice@example.com", "password123")
        .await
        .unwrap();
    assert_eq!(store.load().unwrap(), relogged);
}
