// src/services/api_server.rs
//! API Server for the Credential Registry
//!
//! This module provides the REST API interface for the registry. The API is
//! built using Axum and includes endpoints for:
//! - Login (signed challenge exchanged for a bearer token)
//! - University and employer authorization (administrator only)
//! - Degree and work-experience issuance (authorized issuers only)
//! - Self-authored profile updates
//! - Record lookups, per-subject holdings, ownership and the event log
//!
//! Gated endpoints read the caller from `Authorization: Bearer <token>`.
//! Errors are returned as `{ "error": { "code", "message" } }`.

use crate::contracts::credential_registry::Holdings;
use crate::error::{RegistryError, Role};
use crate::models::event::EventRecord;
use crate::models::identity::Identity;
use crate::models::profile::Profile;
use crate::models::record::{Degree, DegreeRequest, RecordId, WorkExperience, WorkExperienceRequest};
use crate::services::auth::Authenticator;
use crate::services::credential_issuer::CredentialIssuer;
use crate::services::verifier::Verifier;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Json, Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use log::error;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

// API request and response structures

/// Request payload for `POST /login`
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub identity: Identity,
    /// Unix seconds embedded in the signed challenge
    pub issued_at: i64,
    /// Hex signature over `login_message(identity, issued_at)`
    pub signature: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Request payload for granting a university or employer
#[derive(Serialize, Deserialize)]
pub struct GrantIssuerRequest {
    pub issuer: Identity,
    pub name: String,
}

/// Request payload for `POST /degrees`
///
/// A null or missing subject decodes as `None` and is rejected by the
/// registry as `InvalidSubject`.
#[derive(Serialize, Deserialize)]
pub struct IssueDegreeRequest {
    #[serde(default)]
    pub subject: Option<Identity>,
    #[serde(flatten)]
    pub degree: DegreeRequest,
}

/// Request payload for `POST /work-experiences`
#[derive(Serialize, Deserialize)]
pub struct IssueWorkExperienceRequest {
    #[serde(default)]
    pub subject: Option<Identity>,
    #[serde(flatten)]
    pub work_experience: WorkExperienceRequest,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponse {
    pub record_id: RecordId,
}

#[derive(Serialize, Deserialize)]
pub struct AuthorizationResponse {
    pub identity: Identity,
    pub authorized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerResponse {
    pub record_id: RecordId,
    pub owner: Identity,
}

#[derive(Serialize, Deserialize)]
pub struct BalanceResponse {
    pub owner: Identity,
    pub balance: u64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyResponse {
    pub total_supply: u64,
    pub next_record_id: RecordId,
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub administrator: Identity,
}

/// Query string of `GET /events`
#[derive(Deserialize)]
pub struct EventsQuery {
    from: Option<u64>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl RegistryError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthenticated(_) | Self::Token(_) | Self::Signature(_) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED")
            }
            Self::Unauthorized { .. } => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
            Self::InvalidSubject => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_SUBJECT"),
            Self::InvalidIdentity(_) => (StatusCode::BAD_REQUEST, "INVALID_IDENTITY"),
            Self::MalformedRequest(_) => (StatusCode::BAD_REQUEST, "MALFORMED_REQUEST"),
            Self::NotFound { .. } | Self::UnknownRecord(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::DuplicateRecord(_) => (StatusCode::CONFLICT, "DUPLICATE_RECORD"),
            Self::Io(_) | Self::Serialization(_) | Self::Config(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("internal error: {}", self);
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorBody {
                error: ErrorDetail { code, message },
            }),
        )
            .into_response()
    }
}

impl From<JsonRejection> for RegistryError {
    fn from(rejection: JsonRejection) -> Self {
        RegistryError::MalformedRequest(rejection.body_text())
    }
}

impl From<PathRejection> for RegistryError {
    fn from(rejection: PathRejection) -> Self {
        RegistryError::MalformedRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for RegistryError {
    fn from(rejection: QueryRejection) -> Self {
        RegistryError::MalformedRequest(rejection.body_text())
    }
}

type ApiResult<T> = Result<T, RegistryError>;

/// API server state containing all service dependencies
#[derive(Clone)]
pub struct ApiServer {
    /// Service for administering issuers and issuing records
    credential_issuer: CredentialIssuer,

    /// Service for registry reads
    verifier: Verifier,

    /// Bearer token issuance and verification
    authenticator: Authenticator,
}

impl ApiServer {
    /// Creates a new instance of the API server
    pub fn new(credential_issuer: CredentialIssuer, verifier: Verifier, authenticator: Authenticator) -> Self {
        ApiServer {
            credential_issuer,
            verifier,
            authenticator,
        }
    }

    /// Builds the router with every registry endpoint.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(Self::health_handler))
            .route("/login", post(Self::login_handler))
            .route("/universities", post(Self::grant_university_handler))
            .route(
                "/universities/:identity",
                get(Self::university_handler).delete(Self::revoke_university_handler),
            )
            .route("/employers", post(Self::grant_employer_handler))
            .route(
                "/employers/:identity",
                get(Self::employer_handler).delete(Self::revoke_employer_handler),
            )
            .route("/degrees", post(Self::issue_degree_handler))
            .route("/degrees/:id", get(Self::get_degree_handler))
            .route("/work-experiences", post(Self::issue_work_experience_handler))
            .route("/work-experiences/:id", get(Self::get_work_experience_handler))
            .route("/profile", put(Self::update_profile_handler))
            .route("/users/:identity", get(Self::user_handler))
            .route("/users/:identity/balance", get(Self::balance_handler))
            .route("/records/supply", get(Self::supply_handler))
            .route("/records/:id/owner", get(Self::owner_handler))
            .route("/events", get(Self::events_handler))
            .with_state(Arc::new(self.clone()))
    }

    /// Starts the API server and serves until the listener fails.
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:3000")
    pub async fn run(&self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router()).await
    }

    /// Unwraps the JSON body of a gated request.
    ///
    /// An undecodable body is reported as `Unauthorized` when `caller` does
    /// not hold `role`, and as `MalformedRequest` otherwise.
    async fn gated_body<T>(
        &self,
        caller: Identity,
        role: Role,
        payload: Result<Json<T>, JsonRejection>,
    ) -> ApiResult<T> {
        let rejection = match payload {
            Ok(Json(payload)) => return Ok(payload),
            Err(rejection) => rejection,
        };
        let authorized = match role {
            Role::Administrator => self.verifier.administrator().await == caller,
            Role::University => self.verifier.is_authorized_university(caller).await,
            Role::Employer => self.verifier.is_authorized_employer(caller).await,
        };
        if authorized {
            Err(rejection.into())
        } else {
            Err(RegistryError::Unauthorized { caller, role })
        }
    }

    // =====================
    // Session
    // =====================

    /// GET /health
    async fn health_handler(State(state): State<Arc<ApiServer>>) -> Json<HealthResponse> {
        Json(HealthResponse {
            status: "ok".into(),
            administrator: state.verifier.administrator().await,
        })
    }

    /// Exchanges a signed login challenge for a bearer token
    ///
    /// # Endpoint
    /// POST /login
    ///
    /// # Responses
    /// - 200 OK: Returns bearer token
    /// - 401 Unauthorized: Stale challenge or signature from another key
    async fn login_handler(
        State(state): State<Arc<ApiServer>>,
        payload: Result<Json<LoginRequest>, JsonRejection>,
    ) -> ApiResult<Json<LoginResponse>> {
        let Json(payload) = payload?;
        let token = state
            .authenticator
            .login(payload.identity, payload.issued_at, &payload.signature)?;
        Ok(Json(LoginResponse { token }))
    }

    // =====================
    // Issuer Administration
    // =====================

    /// POST /universities (administrator)
    async fn grant_university_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
        payload: Result<Json<GrantIssuerRequest>, JsonRejection>,
    ) -> ApiResult<StatusCode> {
        let caller = state.authenticator.caller(&headers)?;
        let payload = state.gated_body(caller, Role::Administrator, payload).await?;
        state
            .credential_issuer
            .grant_university(caller, payload.issuer, payload.name)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// DELETE /universities/:identity (administrator)
    async fn revoke_university_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
        Path(identity): Path<String>,
    ) -> ApiResult<StatusCode> {
        let caller = state.authenticator.caller(&headers)?;
        state
            .credential_issuer
            .revoke_university(caller, identity.parse()?)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// GET /universities/:identity
    async fn university_handler(
        State(state): State<Arc<ApiServer>>,
        Path(identity): Path<String>,
    ) -> ApiResult<Json<AuthorizationResponse>> {
        let identity: Identity = identity.parse()?;
        Ok(Json(AuthorizationResponse {
            identity,
            authorized: state.verifier.is_authorized_university(identity).await,
            name: state.verifier.university(identity).await,
        }))
    }

    /// POST /employers (administrator)
    async fn grant_employer_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
        payload: Result<Json<GrantIssuerRequest>, JsonRejection>,
    ) -> ApiResult<StatusCode> {
        let caller = state.authenticator.caller(&headers)?;
        let payload = state.gated_body(caller, Role::Administrator, payload).await?;
        state
            .credential_issuer
            .grant_employer(caller, payload.issuer, payload.name)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// DELETE /employers/:identity (administrator)
    async fn revoke_employer_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
        Path(identity): Path<String>,
    ) -> ApiResult<StatusCode> {
        let caller = state.authenticator.caller(&headers)?;
        state
            .credential_issuer
            .revoke_employer(caller, identity.parse()?)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// GET /employers/:identity
    async fn employer_handler(
        State(state): State<Arc<ApiServer>>,
        Path(identity): Path<String>,
    ) -> ApiResult<Json<AuthorizationResponse>> {
        let identity: Identity = identity.parse()?;
        Ok(Json(AuthorizationResponse {
            identity,
            authorized: state.verifier.is_authorized_employer(identity).await,
            name: state.verifier.employer(identity).await,
        }))
    }

    // =====================
    // Issuance
    // =====================

    /// Issues a degree to a subject
    ///
    /// # Endpoint
    /// POST /degrees
    ///
    /// # Responses
    /// - 201 Created: Returns the new record id
    /// - 403 Forbidden: Caller is not an authorized university
    /// - 422 Unprocessable Entity: Subject is the zero address, null or missing
    /// - 400 Bad Request: Body cannot be decoded
    async fn issue_degree_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
        payload: Result<Json<IssueDegreeRequest>, JsonRejection>,
    ) -> ApiResult<(StatusCode, Json<IssueResponse>)> {
        let caller = state.authenticator.caller(&headers)?;
        let payload = state.gated_body(caller, Role::University, payload).await?;
        let subject = payload.subject.unwrap_or_default();
        let record_id = state
            .credential_issuer
            .issue_degree(caller, subject, payload.degree)
            .await?;
        Ok((StatusCode::CREATED, Json(IssueResponse { record_id })))
    }

    /// Issues a work-experience record to a subject
    ///
    /// # Endpoint
    /// POST /work-experiences
    ///
    /// # Responses
    /// - 201 Created: Returns the new record id
    /// - 403 Forbidden: Caller is not an authorized employer
    /// - 422 Unprocessable Entity: Subject is the zero address, null or missing
    /// - 400 Bad Request: Body cannot be decoded
    async fn issue_work_experience_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
        payload: Result<Json<IssueWorkExperienceRequest>, JsonRejection>,
    ) -> ApiResult<(StatusCode, Json<IssueResponse>)> {
        let caller = state.authenticator.caller(&headers)?;
        let payload = state.gated_body(caller, Role::Employer, payload).await?;
        let subject = payload.subject.unwrap_or_default();
        let record_id = state
            .credential_issuer
            .issue_work_experience(caller, subject, payload.work_experience)
            .await?;
        Ok((StatusCode::CREATED, Json(IssueResponse { record_id })))
    }

    /// PUT /profile (caller's own profile)
    async fn update_profile_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
        profile: Result<Json<Profile>, JsonRejection>,
    ) -> ApiResult<StatusCode> {
        let caller = state.authenticator.caller(&headers)?;
        let Json(profile) = profile?;
        state.credential_issuer.update_profile(caller, profile).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    // =====================
    // Reads
    // =====================

    /// GET /degrees/:id
    async fn get_degree_handler(
        State(state): State<Arc<ApiServer>>,
        id: Result<Path<u64>, PathRejection>,
    ) -> ApiResult<Json<Degree>> {
        let Path(id) = id?;
        Ok(Json(state.verifier.degree(RecordId(id)).await?))
    }

    /// GET /work-experiences/:id
    async fn get_work_experience_handler(
        State(state): State<Arc<ApiServer>>,
        id: Result<Path<u64>, PathRejection>,
    ) -> ApiResult<Json<WorkExperience>> {
        let Path(id) = id?;
        Ok(Json(state.verifier.work_experience(RecordId(id)).await?))
    }

    /// Profile and every record held by a subject
    ///
    /// # Endpoint
    /// GET /users/:identity
    async fn user_handler(
        State(state): State<Arc<ApiServer>>,
        Path(identity): Path<String>,
    ) -> ApiResult<Json<Holdings>> {
        let subject: Identity = identity.parse()?;
        Ok(Json(state.verifier.user_profile_and_records(subject).await))
    }

    /// GET /users/:identity/balance
    async fn balance_handler(
        State(state): State<Arc<ApiServer>>,
        Path(identity): Path<String>,
    ) -> ApiResult<Json<BalanceResponse>> {
        let owner: Identity = identity.parse()?;
        let balance = state.verifier.balance_of(owner).await;
        Ok(Json(BalanceResponse { owner, balance }))
    }

    /// GET /records/:id/owner
    async fn owner_handler(
        State(state): State<Arc<ApiServer>>,
        id: Result<Path<u64>, PathRejection>,
    ) -> ApiResult<Json<OwnerResponse>> {
        let Path(id) = id?;
        let record_id = RecordId(id);
        let owner = state.verifier.owner_of(record_id).await?;
        Ok(Json(OwnerResponse { record_id, owner }))
    }

    /// GET /records/supply
    async fn supply_handler(State(state): State<Arc<ApiServer>>) -> Json<SupplyResponse> {
        Json(SupplyResponse {
            total_supply: state.verifier.total_supply().await,
            next_record_id: state.verifier.next_record_id().await,
        })
    }

    /// GET /events?from=&limit=
    async fn events_handler(
        State(state): State<Arc<ApiServer>>,
        query: Result<Query<EventsQuery>, QueryRejection>,
    ) -> ApiResult<Json<Vec<EventRecord>>> {
        let Query(query) = query?;
        let from = query.from.unwrap_or(0);
        let limit = query.limit.unwrap_or(100);
        Ok(Json(state.verifier.events(from, limit).await))
    }
}
