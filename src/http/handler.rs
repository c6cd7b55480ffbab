use crate::http::AppState;
use crate::models::{
    Author, AuthorName, AuthorNameEmptyError, ContactMessage, ContactMessageError,
    CreateAuthorError, CreateAuthorRequest, DeleteAuthorError, DeleteAuthorRequest,
    FindAllAuthorsError, UpdateAuthorError, UpdateAuthorRequest,
};
use crate::repositories::AuthorRepository;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<T>);

impl<T: Serialize> ApiSuccess<T> {
    pub const fn new(status: StatusCode, data: T) -> Self {
        Self(status, Json(data))
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> axum::response::Response {
        (self.0, self.1).into_response()
    }
}

/// Body shared by acknowledgements and every error response.
#[derive(Debug, Serialize)]
pub struct MessageHttpResponse {
    message: String,
}

impl MessageHttpResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    MethodNotAllowed,
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed".to_string(),
            ),
            Self::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(MessageHttpResponse::new(message))).into_response()
    }
}

impl ApiError {
    fn internal(cause: &anyhow::Error) -> Self {
        tracing::error!(error = ?cause, "storage failure");
        Self::InternalServerError("Internal server error".to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<ParseAuthorHttpRequestError> for ApiError {
    fn from(err: ParseAuthorHttpRequestError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<ContactMessageError> for ApiError {
    fn from(err: ContactMessageError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<FindAllAuthorsError> for ApiError {
    fn from(err: FindAllAuthorsError) -> Self {
        Self::internal(&err.0)
    }
}

impl From<CreateAuthorError> for ApiError {
    fn from(err: CreateAuthorError) -> Self {
        Self::internal(&err.0)
    }
}

impl From<UpdateAuthorError> for ApiError {
    fn from(err: UpdateAuthorError) -> Self {
        match err {
            err @ UpdateAuthorError::NotFound { .. } => Self::NotFound(err.to_string()),
            UpdateAuthorError::Other(cause) => Self::internal(&cause),
        }
    }
}

impl From<DeleteAuthorError> for ApiError {
    fn from(err: DeleteAuthorError) -> Self {
        match err {
            err @ DeleteAuthorError::NotFound { .. } => Self::NotFound(err.to_string()),
            DeleteAuthorError::Other(cause) => Self::internal(&cause),
        }
    }
}

#[derive(Error, Debug)]
pub enum ParseAuthorHttpRequestError {
    #[error("Author id is required")]
    IdMissing,
    #[error("Author name is required")]
    NameMissing,
    #[error(transparent)]
    Name(#[from] AuthorNameEmptyError),
}

#[derive(Debug, Serialize)]
pub struct AuthorHttpResponse {
    id: u64,
    name: String,
}

impl From<Author> for AuthorHttpResponse {
    fn from(value: Author) -> Self {
        Self {
            id: value.id(),
            name: value.name().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAuthorHttpRequest {
    name: Option<String>,
}

impl TryFrom<CreateAuthorHttpRequest> for CreateAuthorRequest {
    type Error = ParseAuthorHttpRequestError;

    fn try_from(value: CreateAuthorHttpRequest) -> Result<Self, Self::Error> {
        let name = value.name.ok_or(ParseAuthorHttpRequestError::NameMissing)?;
        let name = AuthorName::new(&name)?;
        Ok(Self::new(name))
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateAuthorHttpRequest {
    id: Option<u64>,
    name: Option<String>,
}

impl TryFrom<UpdateAuthorHttpRequest> for UpdateAuthorRequest {
    type Error = ParseAuthorHttpRequestError;

    fn try_from(value: UpdateAuthorHttpRequest) -> Result<Self, Self::Error> {
        let id = value.id.ok_or(ParseAuthorHttpRequestError::IdMissing)?;
        let name = value.name.ok_or(ParseAuthorHttpRequestError::NameMissing)?;
        let name = AuthorName::new(&name)?;
        Ok(Self::new(id, name))
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteAuthorHttpRequest {
    id: Option<u64>,
}

impl TryFrom<DeleteAuthorHttpRequest> for DeleteAuthorRequest {
    type Error = ParseAuthorHttpRequestError;

    fn try_from(value: DeleteAuthorHttpRequest) -> Result<Self, Self::Error> {
        let id = value.id.ok_or(ParseAuthorHttpRequestError::IdMissing)?;
        Ok(Self::new(id))
    }
}

#[derive(Debug, Deserialize)]
pub struct ContactHttpRequest {
    name: Option<String>,
    email: Option<String>,
    message: Option<String>,
}

impl TryFrom<ContactHttpRequest> for ContactMessage {
    type Error = ContactMessageError;

    fn try_from(value: ContactHttpRequest) -> Result<Self, Self::Error> {
        Self::new(
            value.name.as_deref(),
            value.email.as_deref(),
            value.message.as_deref(),
        )
    }
}

pub async fn list_authors<AR: AuthorRepository>(
    State(state): State<AppState<AR>>,
) -> Result<ApiSuccess<Vec<AuthorHttpResponse>>, ApiError> {
    let authors = state.author_repo.find_all_authors().await?;
    let authors = authors.into_iter().map(AuthorHttpResponse::from).collect();
    Ok(ApiSuccess::new(StatusCode::OK, authors))
}

pub async fn create_author<AR: AuthorRepository>(
    State(state): State<AppState<AR>>,
    body: Result<Json<CreateAuthorHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    let Json(body) = body?;
    let req: CreateAuthorRequest = body.try_into()?;
    state
        .author_repo
        .create_author(&req)
        .await
        .map_err(ApiError::from)
        .map(|author| ApiSuccess::new(StatusCode::CREATED, author.into()))
}

pub async fn update_author<AR: AuthorRepository>(
    State(state): State<AppState<AR>>,
    body: Result<Json<UpdateAuthorHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<AuthorHttpResponse>, ApiError> {
    let Json(body) = body?;
    let req: UpdateAuthorRequest = body.try_into()?;
    state
        .author_repo
        .update_author(&req)
        .await
        .map_err(ApiError::from)
        .map(|author| ApiSuccess::new(StatusCode::OK, author.into()))
}

pub async fn delete_author<AR: AuthorRepository>(
    State(state): State<AppState<AR>>,
    body: Result<Json<DeleteAuthorHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<MessageHttpResponse>, ApiError> {
    let Json(body) = body?;
    let req: DeleteAuthorRequest = body.try_into()?;
    state.author_repo.delete_author(&req).await?;
    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageHttpResponse::new("Author deleted"),
    ))
}

pub async fn submit_contact(
    body: Result<Json<ContactHttpRequest>, JsonRejection>,
) -> Result<ApiSuccess<MessageHttpResponse>, ApiError> {
    let Json(body) = body?;
    let contact = ContactMessage::try_from(body).inspect_err(|err| {
        tracing::warn!(error = %err, "rejected contact form");
    })?;

    tracing::info!(
        name = contact.name(),
        email = %contact.email(),
        length = contact.message().chars().count(),
        "contact form received"
    );
    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageHttpResponse::new("Message sent"),
    ))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}
