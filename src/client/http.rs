//! Typed client for the REST endpoints

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::client::session::{Session, SessionStore};
use crate::core::api::ApiResponse;
use crate::core::auth::service::{AuthResponse, LoginRequest, RegisterRequest};
use crate::core::db::models::{Todo, UpdateTodo, UserProfile};
use crate::core::todos::service::CreateTodoRequest;
use crate::core::validation::FieldError;

/// Client error types
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Not logged in")]
    NotAuthenticated,

    /// The server rejected the session token; the session has been cleared
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Request failed ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client for one todo API server
///
/// With a [`SessionStore`] attached, login and registration persist the new
/// session and a rejected token is removed from the store as well.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Option<SessionStore>,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://localhost:5000`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            store: None,
        }
    }

    /// Persist sessions through `store`
    pub fn with_session_store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    /// The persisted session, or an empty one without a store
    pub fn restore_session(&self) -> Result<Session, ClientError> {
        match &self.store {
            Some(store) => store.load(),
            None => Ok(Session::default()),
        }
    }

    /// End the session locally; tokens are stateless so the server is not told
    pub fn logout(&self, session: &mut Session) -> Result<(), ClientError> {
        session.clear();
        match &self.store {
            Some(store) => store.clear(),
            None => Ok(()),
        }
    }

    fn start_session(&self, auth: AuthResponse) -> Result<Session, ClientError> {
        let session = Session::new(auth.token, auth.user);
        if let Some(store) = &self.store {
            store.save(&session)?;
        }
        Ok(session)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Auth
    // ========================================================================

    /// Register and start a new session
    pub async fn register(&self, request: &RegisterRequest) -> Result<Session, ClientError> {
        let response = self
            .http
            .post(self.url("/api/auth/register"))
            .json(request)
            .send()
            .await?;

        let auth: AuthResponse = into_data(read_envelope(response).await?)?;
        tracing::info!("Registered as {}", auth.user.username);
        self.start_session(auth)
    }

    /// Log in and start a new session
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&request)
            .send()
            .await?;

        let auth: AuthResponse = into_data(read_envelope(response).await?)?;
        tracing::info!("Logged in as {}", auth.user.username);
        self.start_session(auth)
    }

    pub async fn profile(&self, session: &mut Session) -> Result<UserProfile, ClientError> {
        let request = self.authorized(session, Method::GET, "/api/auth/me")?;
        into_data(self.execute(session, request).await?)
    }

    // ========================================================================
    // Todos
    // ========================================================================

    pub async fn list_todos(&self, session: &mut Session) -> Result<Vec<Todo>, ClientError> {
        let request = self.authorized(session, Method::GET, "/api/todos")?;
        into_data(self.execute(session, request).await?)
    }

    pub async fn get_todo(&self, session: &mut Session, id: Uuid) -> Result<Todo, ClientError> {
        let request = self.authorized(session, Method::GET, &format!("/api/todos/{}", id))?;
        into_data(self.execute(session, request).await?)
    }

    pub async fn create_todo(
        &self,
        session: &mut Session,
        todo: &CreateTodoRequest,
    ) -> Result<Todo, ClientError> {
        let request = self
            .authorized(session, Method::POST, "/api/todos")?
            .json(todo);
        into_data(self.execute(session, request).await?)
    }

    pub async fn update_todo(
        &self,
        session: &mut Session,
        id: Uuid,
        changes: &UpdateTodo,
    ) -> Result<Todo, ClientError> {
        let request = self
            .authorized(session, Method::PUT, &format!("/api/todos/{}", id))?
            .json(changes);
        into_data(self.execute(session, request).await?)
    }

    pub async fn delete_todo(&self, session: &mut Session, id: Uuid) -> Result<(), ClientError> {
        let request = self.authorized(session, Method::DELETE, &format!("/api/todos/{}", id))?;
        self.execute::<serde_json::Value>(session, request).await?;
        Ok(())
    }

    pub async fn toggle_todo(&self, session: &mut Session, id: Uuid) -> Result<Todo, ClientError> {
        let request = self.authorized(
            session,
            Method::PATCH,
            &format!("/api/todos/{}/toggle", id),
        )?;
        into_data(self.execute(session, request).await?)
    }

    // ========================================================================
    // Plumbing
    // ========================================================================

    fn authorized(
        &self,
        session: &Session,
        method: Method,
        path: &str,
    ) -> Result<RequestBuilder, ClientError> {
        let token = session
            .token
            .as_deref()
            .ok_or(ClientError::NotAuthenticated)?;
        Ok(self.http.request(method, self.url(path)).bearer_auth(token))
    }

    /// Send a protected request; a 401 ends the session, stored copy included
    async fn execute<T: DeserializeOwned>(
        &self,
        session: &mut Session,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, ClientError> {
        let response = request.send().await?;

        match read_envelope(response).await {
            Err(ClientError::Api {
                status, message, ..
            }) if status == StatusCode::UNAUTHORIZED.as_u16() => {
                tracing::warn!("Session rejected by server: {}", message);
                session.clear();
                if let Some(store) = &self.store
                    && let Err(e) = store.clear()
                {
                    tracing::warn!("Failed to clear stored session: {}", e);
                }
                Err(ClientError::Unauthorized(message))
            }
            other => other,
        }
    }
}

async fn read_envelope<T: DeserializeOwned>(
    response: Response,
) -> Result<ApiResponse<T>, ClientError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let (message, errors) =
            match serde_json::from_slice::<ApiResponse<serde_json::Value>>(&bytes) {
                Ok(envelope) => (envelope.message.unwrap_or_default(), envelope.errors),
                Err(_) => (
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string(),
                    Vec::new(),
                ),
            };
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
            errors,
        });
    }

    Ok(serde_json::from_slice(&bytes)?)
}

fn into_data<T>(envelope: ApiResponse<T>) -> Result<T, ClientError> {
    envelope
        .data
        .ok_or_else(|| ClientError::UnexpectedResponse("response carried no data".to_string()))
}
