use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{header::REFERER, request::Parts},
    Form,
};
use serde::Deserialize;

use super::WebError;
use crate::view::Filter;

#[derive(Debug, Default, Deserialize)]
struct FilterQuery {
    filter: Option<String>,
}

/// Filter of the page a request was issued from.
///
/// Taken from the `filter` query parameter when it names a known filter,
/// otherwise inferred from the `Referer` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveFilter(pub Filter);

#[async_trait]
impl<S> FromRequestParts<S> for ActiveFilter
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let explicit = Query::<FilterQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(query)| query.filter)
            .and_then(|raw| raw.parse::<Filter>().ok());
        let filter = explicit.unwrap_or_else(|| {
            Filter::from_referer(parts.headers.get(REFERER).and_then(|v| v.to_str().ok()))
        });
        Ok(Self(filter))
    }
}

/// Todo id from the `:id` path segment. A malformed id fails like any
/// other request error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodoId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for TodoId
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state).await?;
        Ok(Self(id))
    }
}

#[derive(Debug, Deserialize)]
struct TodoForm {
    #[serde(default)]
    todo: String,
}

/// Raw `todo` field of a url-encoded form body, untrimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoText(pub String);

#[async_trait]
impl<S> FromRequest<S> for TodoText
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(form) = Form::<TodoForm>::from_request(req, state).await?;
        Ok(Self(form.todo))
    }
}
