// system-tests/tests/helpers/cloud_stub.rs
// ============================================================================
// Module: Cloud Stub
// Description: In-process compute and identity admin API stub.
// Purpose: Run the conformance suites hermetically when no cloud is configured.
// Dependencies: axum, serde_json, tokio, uuid, stack-admin-client
// ============================================================================

//! ## Overview
//! Serves the compute quota routes under `/compute/v2.1` and the identity
//! domain, project, and user routes under `/identity/v3`, keeping the
//! referential rules a real cloud enforces so cleanup ordering matters here
//! as much as it does against a live deployment.
//! Invariants:
//! - Every request must carry the stub token or it gets 401.
//! - Enabled domains, the default domain, and non-leaf projects cannot be
//!   deleted; domains that still own projects cannot be deleted either.
//! - Effective quotas layer user overrides over project overrides over the
//!   `default` quota class.

use std::collections::BTreeMap;
use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use stack_admin_client::ClientConfig;
use stack_admin_client::DEFAULT_QUOTA_RESOURCES;
use stack_admin_client::EXTENDED_QUOTA_RESOURCES;
use stack_admin_client::UNLIMITED;
use stack_admin_client::transport::AUTH_TOKEN_HEADER;
use tokio::runtime::Builder;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Domain every cloud ships with.
pub const DEFAULT_DOMAIN_ID: &str = "default";

/// Quota class that supplies project defaults.
pub const DEFAULT_QUOTA_CLASS: &str = "default";

/// Stock compute limits of the `default` quota class.
pub const STOCK_DEFAULT_LIMITS: [(&str, i64); 14] = [
    ("cores", 20),
    ("fixed_ips", UNLIMITED),
    ("floating_ips", 10),
    ("injected_file_content_bytes", 10240),
    ("injected_file_path_bytes", 255),
    ("injected_files", 5),
    ("instances", 10),
    ("key_pairs", 100),
    ("metadata_items", 128),
    ("ram", 51200),
    ("security_group_rules", 20),
    ("security_groups", 10),
    ("server_group_members", 10),
    ("server_groups", 10),
];

type Limits = BTreeMap<String, i64>;

// ============================================================================
// SECTION: Stub State
// ============================================================================

#[derive(Debug, Clone, Serialize)]
struct DomainRecord {
    id: String,
    name: String,
    description: String,
    enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ProjectRecord {
    id: String,
    name: String,
    description: String,
    enabled: bool,
    domain_id: String,
    parent_id: String,
    is_domain: bool,
}

#[derive(Debug, Clone, Serialize)]
struct UserRecord {
    id: String,
    name: String,
    domain_id: String,
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_project_id: Option<String>,
}

#[derive(Debug)]
struct Cloud {
    quota_classes: BTreeMap<String, Limits>,
    project_quotas: BTreeMap<String, Limits>,
    user_quotas: BTreeMap<(String, String), Limits>,
    domains: BTreeMap<String, DomainRecord>,
    /// Projects in creation order, which is also listing order.
    projects: Vec<ProjectRecord>,
    users: BTreeMap<String, UserRecord>,
}

impl Cloud {
    fn seeded() -> Self {
        let stock: Limits = STOCK_DEFAULT_LIMITS
            .iter()
            .map(|(name, value)| ((*name).to_string(), *value))
            .collect();
        let default_domain = DomainRecord {
            id: DEFAULT_DOMAIN_ID.to_string(),
            name: "Default".to_string(),
            description: "The default domain".to_string(),
            enabled: true,
        };
        Self {
            quota_classes: BTreeMap::from([(DEFAULT_QUOTA_CLASS.to_string(), stock)]),
            project_quotas: BTreeMap::new(),
            user_quotas: BTreeMap::new(),
            domains: BTreeMap::from([(DEFAULT_DOMAIN_ID.to_string(), default_domain)]),
            projects: Vec::new(),
            users: BTreeMap::new(),
        }
    }

    /// Limits of a class; unknown classes report the default class.
    fn class_limits(&self, class_id: &str) -> Limits {
        self.quota_classes
            .get(class_id)
            .or_else(|| self.quota_classes.get(DEFAULT_QUOTA_CLASS))
            .cloned()
            .unwrap_or_default()
    }

    fn effective_limits(&self, tenant_id: &str, user_id: Option<&str>) -> Limits {
        let mut limits = self.class_limits(DEFAULT_QUOTA_CLASS);
        if let Some(overrides) = self.project_quotas.get(tenant_id) {
            limits.extend(overrides.iter().map(|(name, value)| (name.clone(), *value)));
        }
        if let Some(user_id) = user_id
            && let Some(overrides) =
                self.user_quotas.get(&(tenant_id.to_string(), user_id.to_string()))
        {
            limits.extend(overrides.iter().map(|(name, value)| (name.clone(), *value)));
        }
        limits
    }

    fn project(&self, project_id: &str) -> Option<&ProjectRecord> {
        self.projects.iter().find(|project| project.id == project_id)
    }

    /// Resolves `(domain_id, parent_id)` for a new project.
    fn placement(&self, request: &NewProject) -> Result<(String, String), StubError> {
        if let Some(parent_id) = &request.parent_id {
            if let Some(parent) = self.project(parent_id) {
                if request.domain_id.as_ref().is_some_and(|domain| *domain != parent.domain_id) {
                    return Err(StubError::bad_request(
                        "project domain must match the parent project's domain",
                    ));
                }
                return Ok((parent.domain_id.clone(), parent.id.clone()));
            }
            if !self.domains.contains_key(parent_id) {
                return Err(StubError::not_found("parent project", parent_id));
            }
            if request.domain_id.as_ref().is_some_and(|domain| domain != parent_id) {
                return Err(StubError::bad_request("parent domain does not match domain_id"));
            }
            return Ok((parent_id.clone(), parent_id.clone()));
        }
        let domain_id = request.domain_id.clone().unwrap_or_else(|| DEFAULT_DOMAIN_ID.to_string());
        if !self.domains.contains_key(&domain_id) {
            return Err(StubError::not_found("domain", &domain_id));
        }
        Ok((domain_id.clone(), domain_id))
    }
}

#[derive(Clone)]
struct StubState {
    token: Arc<str>,
    cloud: Arc<Mutex<Cloud>>,
}

impl StubState {
    fn with_cloud<T>(
        &self,
        apply: impl FnOnce(&mut Cloud) -> Result<T, StubError>,
    ) -> Result<T, StubError> {
        let mut cloud = self.cloud.lock().map_err(|_| StubError::internal("stub state poisoned"))?;
        apply(&mut cloud)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

#[derive(Debug)]
struct StubError {
    status: StatusCode,
    message: String,
}

impl StubError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    fn not_found(kind: &str, id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("could not find {kind}: {id}"))
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.status.as_u16(),
                "message": self.message,
            }
        });
        (self.status, Json(body)).into_response()
    }
}

// ============================================================================
// SECTION: Handle
// ============================================================================

/// Handle for the running cloud stub; dropping it shuts the server down.
pub struct CloudStubHandle {
    base_url: String,
    token: String,
    cloud: Arc<Mutex<Cloud>>,
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<thread::JoinHandle<()>>,
}

impl CloudStubHandle {
    /// Returns the compute endpoint.
    pub fn compute_url(&self) -> String {
        format!("{}/compute/v2.1", self.base_url)
    }

    /// Returns the identity endpoint.
    pub fn identity_url(&self) -> String {
        format!("{}/identity/v3", self.base_url)
    }

    /// Returns the token the stub accepts.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns a client config pointed at this stub.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.compute_url(), self.identity_url(), &self.token)
    }

    pub fn domain_exists(&self, domain_id: &str) -> bool {
        self.cloud.lock().is_ok_and(|cloud| cloud.domains.contains_key(domain_id))
    }

    pub fn project_exists(&self, project_id: &str) -> bool {
        self.cloud.lock().is_ok_and(|cloud| cloud.project(project_id).is_some())
    }

    pub fn user_exists(&self, user_id: &str) -> bool {
        self.cloud.lock().is_ok_and(|cloud| cloud.users.contains_key(user_id))
    }

    /// Returns the stored project-level overrides, if any.
    pub fn project_overrides(&self, tenant_id: &str) -> Option<BTreeMap<String, i64>> {
        self.cloud.lock().ok().and_then(|cloud| cloud.project_quotas.get(tenant_id).cloned())
    }

    /// Returns the stored limits of a quota class.
    pub fn quota_class(&self, class_id: &str) -> BTreeMap<String, i64> {
        self.cloud.lock().map_or_else(|_| BTreeMap::new(), |cloud| cloud.class_limits(class_id))
    }
}

impl Drop for CloudStubHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Spawns a cloud stub that accepts `token`.
pub fn spawn_cloud_stub(token: &str) -> Result<CloudStubHandle, String> {
    let listener = StdTcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("cloud stub bind failed: {err}"))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("cloud stub listener nonblocking failed: {err}"))?;
    let addr =
        listener.local_addr().map_err(|err| format!("cloud stub local addr failed: {err}"))?;
    let base_url = format!("http://{addr}");

    let cloud = Arc::new(Mutex::new(Cloud::seeded()));
    let state = StubState {
        token: Arc::from(token),
        cloud: Arc::clone(&cloud),
    };
    let app = router(state);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = thread::spawn(move || {
        let runtime = match Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(error) => {
                let _ = error;
                return;
            }
        };
        runtime.block_on(async move {
            let listener = match tokio::net::TcpListener::from_std(listener) {
                Ok(listener) => listener,
                Err(error) => {
                    let _ = error;
                    return;
                }
            };
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });
    });
    Ok(CloudStubHandle {
        base_url,
        token: token.to_string(),
        cloud,
        shutdown: Some(shutdown_tx),
        join: Some(join),
    })
}

fn router(state: StubState) -> Router {
    let compute = Router::new()
        .route(
            "/os-quota-sets/{tenant_id}",
            get(show_quota_set).put(update_quota_set).delete(delete_quota_set),
        )
        .route("/os-quota-sets/{tenant_id}/defaults", get(show_default_quota_set))
        .route(
            "/os-quota-class-sets/{class_id}",
            get(show_quota_class_set).put(update_quota_class_set),
        );
    let identity = Router::new()
        .route("/domains", post(create_domain))
        .route("/domains/{domain_id}", get(show_domain).patch(update_domain).delete(delete_domain))
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/{project_id}", get(show_project).delete(delete_project))
        .route("/users", post(create_user))
        .route("/users/{user_id}", delete(delete_user));
    Router::new()
        .nest("/compute/v2.1", compute)
        .nest("/identity/v3", identity)
        .layer(from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

async fn require_token(State(state): State<StubState>, request: Request, next: Next) -> Response {
    let presented = request.headers().get(AUTH_TOKEN_HEADER).and_then(|value| value.to_str().ok());
    if presented != Some(&*state.token) {
        return StubError::new(StatusCode::UNAUTHORIZED, "the request requires authentication")
            .into_response();
    }
    next.run(request).await
}

// ============================================================================
// SECTION: Compute Quotas
// ============================================================================

#[derive(Debug, Deserialize)]
struct UserScope {
    user_id: Option<String>,
}

async fn show_default_quota_set(
    State(state): State<StubState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<Value>, StubError> {
    state.with_cloud(|cloud| {
        let limits = cloud.class_limits(DEFAULT_QUOTA_CLASS);
        Ok(Json(quota_envelope("quota_set", Some(&tenant_id), limits)))
    })
}

async fn show_quota_set(
    State(state): State<StubState>,
    Path(tenant_id): Path<String>,
    Query(scope): Query<UserScope>,
) -> Result<Json<Value>, StubError> {
    state.with_cloud(|cloud| {
        let limits = cloud.effective_limits(&tenant_id, scope.user_id.as_deref());
        Ok(Json(quota_envelope("quota_set", Some(&tenant_id), limits)))
    })
}

async fn update_quota_set(
    State(state): State<StubState>,
    Path(tenant_id): Path<String>,
    Query(scope): Query<UserScope>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StubError> {
    let limits = parse_limits(&body, "quota_set", true)?;
    state.with_cloud(|cloud| {
        let overrides = match &scope.user_id {
            Some(user_id) => {
                let project = cloud.effective_limits(&tenant_id, None);
                for (name, value) in &limits {
                    let ceiling = project.get(name).copied().unwrap_or(UNLIMITED);
                    if ceiling != UNLIMITED && *value > ceiling {
                        return Err(StubError::bad_request(format!(
                            "user quota for {name} ({value}) exceeds the project quota ({ceiling})"
                        )));
                    }
                }
                cloud.user_quotas.entry((tenant_id.clone(), user_id.clone())).or_default()
            }
            None => cloud.project_quotas.entry(tenant_id.clone()).or_default(),
        };
        overrides.extend(limits);
        let effective = cloud.effective_limits(&tenant_id, scope.user_id.as_deref());
        Ok(Json(quota_envelope("quota_set", None, effective)))
    })
}

async fn delete_quota_set(
    State(state): State<StubState>,
    Path(tenant_id): Path<String>,
    Query(scope): Query<UserScope>,
) -> Result<StatusCode, StubError> {
    state.with_cloud(|cloud| {
        match scope.user_id {
            Some(user_id) => {
                cloud.user_quotas.remove(&(tenant_id, user_id));
            }
            None => {
                cloud.project_quotas.remove(&tenant_id);
                cloud.user_quotas.retain(|(tenant, _), _| *tenant != tenant_id);
            }
        }
        Ok(StatusCode::ACCEPTED)
    })
}

async fn show_quota_class_set(
    State(state): State<StubState>,
    Path(class_id): Path<String>,
) -> Result<Json<Value>, StubError> {
    state.with_cloud(|cloud| {
        let limits = cloud.class_limits(&class_id);
        Ok(Json(quota_envelope("quota_class_set", Some(&class_id), limits)))
    })
}

async fn update_quota_class_set(
    State(state): State<StubState>,
    Path(class_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StubError> {
    let limits = parse_limits(&body, "quota_class_set", false)?;
    state.with_cloud(|cloud| {
        let mut merged = cloud.class_limits(&class_id);
        merged.extend(limits);
        cloud.quota_classes.insert(class_id, merged.clone());
        Ok(Json(quota_envelope("quota_class_set", None, merged)))
    })
}

fn is_quota_resource(name: &str) -> bool {
    DEFAULT_QUOTA_RESOURCES.contains(&name) || EXTENDED_QUOTA_RESOURCES.contains(&name)
}

/// Validates an update envelope; limits may be integers or numeric strings.
fn parse_limits(body: &Value, envelope: &str, allow_force: bool) -> Result<Limits, StubError> {
    let Some(fields) = body.get(envelope).and_then(Value::as_object) else {
        return Err(StubError::bad_request(format!("request body must carry a {envelope} object")));
    };
    let mut limits = Limits::new();
    for (name, value) in fields {
        if allow_force && name == "force" {
            validate_force(value)?;
            continue;
        }
        if !is_quota_resource(name) {
            return Err(StubError::bad_request(format!("unknown quota resource: {name}")));
        }
        limits.insert(name.clone(), parse_limit(name, value)?);
    }
    Ok(limits)
}

fn parse_limit(name: &str, value: &Value) -> Result<i64, StubError> {
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(limit) if limit >= UNLIMITED => Ok(limit),
        Some(limit) => Err(StubError::bad_request(format!(
            "quota limit {limit} for {name} must be -1 or greater"
        ))),
        None => Err(StubError::bad_request(format!("quota limit for {name} must be an integer"))),
    }
}

fn validate_force(value: &Value) -> Result<(), StubError> {
    match value {
        Value::Bool(_) => Ok(()),
        Value::String(text) if matches!(text.as_str(), "true" | "false") => Ok(()),
        _ => Err(StubError::bad_request("force must be a boolean")),
    }
}

fn quota_envelope(envelope: &str, id: Option<&str>, limits: Limits) -> Value {
    let mut fields: Map<String, Value> =
        limits.into_iter().map(|(name, value)| (name, Value::from(value))).collect();
    if let Some(id) = id {
        fields.insert("id".to_string(), Value::from(id));
    }
    let mut body = Map::new();
    body.insert(envelope.to_string(), Value::Object(fields));
    Value::Object(body)
}

// ============================================================================
// SECTION: Identity
// ============================================================================

#[derive(Debug, Deserialize)]
struct NewDomain {
    name: String,
    description: Option<String>,
    enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct DomainPatch {
    name: Option<String>,
    description: Option<String>,
    enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct NewProject {
    name: String,
    description: Option<String>,
    enabled: Option<bool>,
    domain_id: Option<String>,
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProjectQuery {
    domain_id: Option<String>,
    enabled: Option<String>,
    name: Option<String>,
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewUser {
    name: String,
    password: String,
    email: Option<String>,
    enabled: Option<bool>,
    domain_id: Option<String>,
    default_project_id: Option<String>,
}

async fn create_domain(
    State(state): State<StubState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StubError> {
    let request: NewDomain = take_envelope(body, "domain")?;
    state.with_cloud(|cloud| {
        if cloud.domains.values().any(|domain| domain.name == request.name) {
            return Err(StubError::conflict(format!("duplicate domain name: {}", request.name)));
        }
        let record = DomainRecord {
            id: new_id(),
            name: request.name,
            description: request.description.unwrap_or_default(),
            enabled: request.enabled.unwrap_or(true),
        };
        cloud.domains.insert(record.id.clone(), record.clone());
        Ok((StatusCode::CREATED, envelope("domain", &record)?))
    })
}

async fn show_domain(
    State(state): State<StubState>,
    Path(domain_id): Path<String>,
) -> Result<Json<Value>, StubError> {
    state.with_cloud(|cloud| {
        let domain = cloud
            .domains
            .get(&domain_id)
            .ok_or_else(|| StubError::not_found("domain", &domain_id))?;
        envelope("domain", domain)
    })
}

async fn update_domain(
    State(state): State<StubState>,
    Path(domain_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StubError> {
    let patch: DomainPatch = take_envelope(body, "domain")?;
    state.with_cloud(|cloud| {
        if let Some(name) = &patch.name
            && cloud.domains.values().any(|domain| domain.name == *name && domain.id != domain_id)
        {
            return Err(StubError::conflict(format!("duplicate domain name: {name}")));
        }
        let domain = cloud
            .domains
            .get_mut(&domain_id)
            .ok_or_else(|| StubError::not_found("domain", &domain_id))?;
        if let Some(name) = patch.name {
            domain.name = name;
        }
        if let Some(description) = patch.description {
            domain.description = description;
        }
        if let Some(enabled) = patch.enabled {
            domain.enabled = enabled;
        }
        envelope("domain", &*domain)
    })
}

async fn delete_domain(
    State(state): State<StubState>,
    Path(domain_id): Path<String>,
) -> Result<StatusCode, StubError> {
    state.with_cloud(|cloud| {
        let domain = cloud
            .domains
            .get(&domain_id)
            .ok_or_else(|| StubError::not_found("domain", &domain_id))?;
        if domain.id == DEFAULT_DOMAIN_ID {
            return Err(StubError::forbidden("the default domain cannot be deleted"));
        }
        if domain.enabled {
            return Err(StubError::forbidden("cannot delete an enabled domain; disable it first"));
        }
        if cloud.projects.iter().any(|project| project.domain_id == domain_id) {
            return Err(StubError::conflict(format!("domain {domain_id} still owns projects")));
        }
        cloud.domains.remove(&domain_id);
        Ok(StatusCode::NO_CONTENT)
    })
}

async fn create_project(
    State(state): State<StubState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StubError> {
    let request: NewProject = take_envelope(body, "project")?;
    state.with_cloud(|cloud| {
        let (domain_id, parent_id) = cloud.placement(&request)?;
        if cloud
            .projects
            .iter()
            .any(|project| project.domain_id == domain_id && project.name == request.name)
        {
            return Err(StubError::conflict(format!(
                "duplicate project name {} in domain {domain_id}",
                request.name
            )));
        }
        let record = ProjectRecord {
            id: new_id(),
            name: request.name,
            description: request.description.unwrap_or_default(),
            enabled: request.enabled.unwrap_or(true),
            domain_id,
            parent_id,
            is_domain: false,
        };
        cloud.projects.push(record.clone());
        Ok((StatusCode::CREATED, envelope("project", &record)?))
    })
}

async fn list_projects(
    State(state): State<StubState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<Value>, StubError> {
    let enabled = query.enabled.as_deref().map(parse_bool_filter).transpose()?;
    state.with_cloud(|cloud| {
        let matching: Vec<&ProjectRecord> = cloud
            .projects
            .iter()
            .filter(|project| query.domain_id.as_ref().is_none_or(|id| *id == project.domain_id))
            .filter(|project| enabled.is_none_or(|enabled| enabled == project.enabled))
            .filter(|project| query.name.as_ref().is_none_or(|name| *name == project.name))
            .filter(|project| query.parent_id.as_ref().is_none_or(|id| *id == project.parent_id))
            .collect();
        let projects =
            serde_json::to_value(&matching).map_err(|err| StubError::internal(err.to_string()))?;
        Ok(Json(json!({
            "projects": projects,
            "links": { "self": null, "previous": null, "next": null },
        })))
    })
}

async fn show_project(
    State(state): State<StubState>,
    Path(project_id): Path<String>,
) -> Result<Json<Value>, StubError> {
    state.with_cloud(|cloud| {
        let project =
            cloud.project(&project_id).ok_or_else(|| StubError::not_found("project", &project_id))?;
        envelope("project", project)
    })
}

async fn delete_project(
    State(state): State<StubState>,
    Path(project_id): Path<String>,
) -> Result<StatusCode, StubError> {
    state.with_cloud(|cloud| {
        if cloud.project(&project_id).is_none() {
            return Err(StubError::not_found("project", &project_id));
        }
        if cloud.projects.iter().any(|project| project.parent_id == project_id) {
            return Err(StubError::forbidden(format!(
                "cannot delete project {project_id}: it is not a leaf in the hierarchy"
            )));
        }
        cloud.projects.retain(|project| project.id != project_id);
        Ok(StatusCode::NO_CONTENT)
    })
}

async fn create_user(
    State(state): State<StubState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StubError> {
    let request: NewUser = take_envelope(body, "user")?;
    if request.password.is_empty() {
        return Err(StubError::bad_request("password must not be empty"));
    }
    state.with_cloud(|cloud| {
        let project_domain = match &request.default_project_id {
            Some(project_id) => Some(
                cloud
                    .project(project_id)
                    .ok_or_else(|| StubError::not_found("project", project_id))?
                    .domain_id
                    .clone(),
            ),
            None => None,
        };
        let domain_id = request
            .domain_id
            .clone()
            .or(project_domain)
            .unwrap_or_else(|| DEFAULT_DOMAIN_ID.to_string());
        if !cloud.domains.contains_key(&domain_id) {
            return Err(StubError::not_found("domain", &domain_id));
        }
        if cloud.users.values().any(|user| user.domain_id == domain_id && user.name == request.name)
        {
            return Err(StubError::conflict(format!(
                "duplicate user name {} in domain {domain_id}",
                request.name
            )));
        }
        let record = UserRecord {
            id: new_id(),
            name: request.name,
            domain_id,
            enabled: request.enabled.unwrap_or(true),
            email: request.email,
            default_project_id: request.default_project_id,
        };
        cloud.users.insert(record.id.clone(), record.clone());
        Ok((StatusCode::CREATED, envelope("user", &record)?))
    })
}

async fn delete_user(
    State(state): State<StubState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, StubError> {
    state.with_cloud(|cloud| {
        cloud.users.remove(&user_id).ok_or_else(|| StubError::not_found("user", &user_id))?;
        Ok(StatusCode::NO_CONTENT)
    })
}

fn parse_bool_filter(value: &str) -> Result<bool, StubError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(StubError::bad_request(format!("invalid boolean filter value: {other}"))),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn take_envelope<T: DeserializeOwned>(body: Value, name: &str) -> Result<T, StubError> {
    let inner = match body {
        Value::Object(mut fields) => fields.remove(name),
        _ => None,
    }
    .ok_or_else(|| StubError::bad_request(format!("request body must carry a {name} object")))?;
    serde_json::from_value(inner)
        .map_err(|err| StubError::bad_request(format!("invalid {name}: {err}")))
}

fn envelope<T: Serialize>(name: &str, record: &T) -> Result<Json<Value>, StubError> {
    let value = serde_json::to_value(record).map_err(|err| StubError::internal(err.to_string()))?;
    let mut body = Map::new();
    body.insert(name.to_string(), value);
    Ok(Json(Value::Object(body)))
}
