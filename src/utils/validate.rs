//! Extractors that deserialize a request part and run `validator` on it.

use axum::extract::{
    Form, FromRequest, FromRequestParts, Json, Query, Request,
    rejection::{FormRejection, JsonRejection, QueryRejection},
};
use axum::http::{header, request::Parts};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedForm<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedForm<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Form<T>: FromRequest<S, Rejection = FormRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let Form(value) = Form::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedForm(value))
    }
}

/// Accepts either a JSON or a url-encoded form body, chosen by content type.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJsonOrForm<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJsonOrForm<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));

        let value = if is_json {
            ValidatedJson::<T>::from_request(req, state).await?.0
        } else {
            ValidatedForm::<T>::from_request(req, state).await?.0
        };
        Ok(ValidatedJsonOrForm(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Method;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct LoginBody {
        #[validate(email(message = "Invalid email format"))]
        email: String,
        #[validate(length(min = 3, message = "Password must be at least 3 characters"))]
        password: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    struct PageQuery {
        #[validate(range(min = 1, message = "Page index must be at least 1"))]
        page_index: i64,
        #[validate(range(min = 1, max = 50, message = "Page size must be between 1 and 50"))]
        page_size: i64,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/test")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_json() {
        let request = json_request(r#"{"email":"bob@test.com","password":"abc"}"#);

        let ValidatedJson(body) = ValidatedJson::<LoginBody>::from_request(request, &())
            .await
            .unwrap();
        assert_eq!(body.email, "bob@test.com");
    }

    #[tokio::test]
    async fn test_json_validation_errors_are_per_field() {
        let request = json_request(r#"{"email":"nope","password":"ab"}"#);

        match ValidatedJson::<LoginBody>::from_request(request, &()).await {
            Err(AppError::ValidationErrors { errors }) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].field, "email");
                assert_eq!(errors[1].field, "password");
                assert!(errors[1].message.contains("at least 3"));
            }
            other => panic!("Expected ValidationErrors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let request = json_request(r#"{"email":"#);

        let result = ValidatedJson::<LoginBody>::from_request(request, &()).await;
        assert!(matches!(result, Err(AppError::BadRequest { .. })));
    }

    #[tokio::test]
    async fn test_missing_json_content_type() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/test")
            .body(Body::from(r#"{"email":"bob@test.com","password":"abc"}"#))
            .unwrap();

        let result = ValidatedJson::<LoginBody>::from_request(request, &()).await;
        assert!(matches!(result, Err(AppError::BadRequest { .. })));
    }

    #[tokio::test]
    async fn test_query_range_is_checked() {
        let request = Request::builder()
            .uri("/products?pageIndex=1&pageSize=80")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        match ValidatedQuery::<PageQuery>::from_request_parts(&mut parts, &()).await {
            Err(AppError::ValidationErrors { errors }) => {
                assert_eq!(errors[0].field, "page_size");
            }
            other => panic!("Expected ValidationErrors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_query_parse_failure_is_bad_request() {
        let request = Request::builder()
            .uri("/products?pageIndex=abc&pageSize=6")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let result = ValidatedQuery::<PageQuery>::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::BadRequest { .. })));
    }

    #[tokio::test]
    async fn test_json_or_form_accepts_form() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/test")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("email=bob%40test.com&password=abc"))
            .unwrap();

        let ValidatedJsonOrForm(body) = ValidatedJsonOrForm::<LoginBody>::from_request(request, &())
            .await
            .unwrap();
        assert_eq!(body.email, "bob@test.com");
    }

    #[tokio::test]
    async fn test_json_or_form_accepts_json() {
        let request = json_request(r#"{"email":"bob@test.com","password":"abc"}"#);

        let result = ValidatedJsonOrForm::<LoginBody>::from_request(request, &()).await;
        assert!(result.is_ok());
    }
}
