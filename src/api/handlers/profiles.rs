//! Profile self-service and admin user management.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use uuid::Uuid;

use crate::api::doc::PROFILE_TAG;
use crate::api::dto::{
    AddressDto, ChangePasswordRequest, DeleteProfileRequest, ErrorResponse, MessageResponse,
    PagedResponse, PasswordRequest, ProfileDto, UpdateProfileRequest, UserListQuery,
    UserSummaryDto,
};
use crate::api::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::{Permission, PermissionAction, PermissionModule};
use crate::services::ImageUpload;
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedQuery};

const VIEW_USERS: Permission = Permission::new(PermissionModule::Users, PermissionAction::View);
const UPDATE_USERS: Permission = Permission::new(PermissionModule::Users, PermissionAction::Update);

pub fn profile_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_profile, update_profile))
        .routes(routes!(upload_profile_image, delete_profile_image))
        .routes(routes!(get_address, update_address))
        .routes(routes!(change_password))
        .routes(routes!(set_password))
        .routes(routes!(delete_profile))
        .routes(routes!(list_users))
        .routes(routes!(lock_user))
        .routes(routes!(unlock_user))
}

#[utoipa::path(
    get,
    path = "/profile",
    tag = PROFILE_TAG,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Caller's profile", body = ProfileDto),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
async fn get_profile(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<ProfileDto>> {
    let profiles = &state.services.profiles;
    let user = profiles.get_profile(auth.user_id).await?;
    Ok(Json(ProfileDto::new(user, profiles.files())))
}

#[utoipa::path(
    patch,
    path = "/profile",
    tag = PROFILE_TAG,
    security(("bearerAuth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ProfileDto),
        (status = 400, description = "Invalid data", body = ErrorResponse)
    )
)]
async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<ProfileDto>> {
    let profiles = &state.services.profiles;
    let user = profiles.update_profile(auth.user_id, payload.into()).await?;
    Ok(Json(ProfileDto::new(user, profiles.files())))
}

/// Replaces the profile image with the multipart `image` field.
#[utoipa::path(
    patch,
    path = "/profile/image",
    tag = PROFILE_TAG,
    security(("bearerAuth" = [])),
    request_body(content_type = "multipart/form-data", description = "Form with an `image` file field"),
    responses(
        (status = 200, description = "Updated profile", body = ProfileDto),
        (status = 400, description = "Missing, oversized or unsupported image", body = ErrorResponse)
    )
)]
async fn upload_profile_image(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ProfileDto>> {
    let image = read_image_field(multipart, "image")
        .await?
        .ok_or_else(|| AppError::bad_request("No image file was uploaded"))?;

    let profiles = &state.services.profiles;
    let user = profiles
        .set_profile_image(auth.user_id, &image.file_name, &image.bytes)
        .await?;
    Ok(Json(ProfileDto::new(user, profiles.files())))
}

#[utoipa::path(
    delete,
    path = "/profile/image",
    tag = PROFILE_TAG,
    security(("bearerAuth" = [])),
    responses((status = 204, description = "Profile image removed"))
)]
async fn delete_profile_image(State(state): State<AppState>, auth: AuthUser) -> AppResult<StatusCode> {
    state.services.profiles.remove_profile_image(auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/address",
    tag = PROFILE_TAG,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Saved address", body = AddressDto),
        (status = 404, description = "No address saved", body = ErrorResponse)
    )
)]
async fn get_address(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<AddressDto>> {
    let address = state.services.profiles.get_address(auth.user_id).await?;
    Ok(Json(address.into()))
}

#[utoipa::path(
    put,
    path = "/address",
    tag = PROFILE_TAG,
    security(("bearerAuth" = [])),
    request_body = AddressDto,
    responses(
        (status = 200, description = "Address saved", body = AddressDto),
        (status = 400, description = "Invalid address", body = ErrorResponse)
    )
)]
async fn update_address(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<AddressDto>,
) -> AppResult<Json<AddressDto>> {
    let address = state
        .services
        .profiles
        .save_address(payload.into_address(auth.user_id))
        .await?;
    Ok(Json(address.into()))
}

#[utoipa::path(
    post,
    path = "/changePassword",
    tag = PROFILE_TAG,
    security(("bearerAuth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Old password is incorrect", body = ErrorResponse)
    )
)]
async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .profiles
        .change_password(auth.user_id, &payload.old_password, &payload.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// For accounts created without a password.
#[utoipa::path(
    post,
    path = "/setPassword",
    tag = PROFILE_TAG,
    security(("bearerAuth" = [])),
    request_body = PasswordRequest,
    responses(
        (status = 200, description = "Password set", body = MessageResponse),
        (status = 400, description = "The account already has a password", body = ErrorResponse)
    )
)]
async fn set_password(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<PasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .profiles
        .set_password(auth.user_id, &payload.password)
        .await?;
    Ok(Json(MessageResponse::new("Password set successfully")))
}

#[utoipa::path(
    delete,
    path = "/deleteProfile",
    tag = PROFILE_TAG,
    security(("bearerAuth" = [])),
    request_body = DeleteProfileRequest,
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 400, description = "Password is incorrect", body = ErrorResponse)
    )
)]
async fn delete_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<DeleteProfileRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .profiles
        .delete_profile(auth.user_id, &payload.password)
        .await?;
    Ok(Json(MessageResponse::new("Profile deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = PROFILE_TAG,
    security(("bearerAuth" = [])),
    params(UserListQuery),
    responses(
        (status = 200, description = "Paged users", body = PagedResponse<UserSummaryDto>),
        (status = 403, description = "Missing Users.View permission", body = ErrorResponse)
    )
)]
async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<UserListQuery>,
) -> AppResult<Json<PagedResponse<UserSummaryDto>>> {
    auth.require(VIEW_USERS)?;
    let (users, count) = state.services.profiles.list_users(&query.to_query()).await?;
    Ok(Json(PagedResponse::new(
        users.into_iter().map(UserSummaryDto::from).collect(),
        &query.pagination(),
        count,
    )))
}

#[utoipa::path(
    post,
    path = "/lock/{user_id}",
    tag = PROFILE_TAG,
    security(("bearerAuth" = [])),
    params(("user_id" = Uuid, Path, description = "User to lock")),
    responses(
        (status = 200, description = "User locked", body = MessageResponse),
        (status = 404, description = "Unknown user", body = ErrorResponse)
    )
)]
async fn lock_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    auth.require(UPDATE_USERS)?;
    if user_id == auth.user_id {
        return Err(AppError::bad_request("You cannot lock your own account"));
    }
    state.services.profiles.lock_user(user_id).await?;
    Ok(Json(MessageResponse::new("User locked successfully")))
}

#[utoipa::path(
    post,
    path = "/unlock/{user_id}",
    tag = PROFILE_TAG,
    security(("bearerAuth" = [])),
    params(("user_id" = Uuid, Path, description = "User to unlock")),
    responses(
        (status = 200, description = "User unlocked", body = MessageResponse),
        (status = 404, description = "Unknown user", body = ErrorResponse)
    )
)]
async fn unlock_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    auth.require(UPDATE_USERS)?;
    state.services.profiles.unlock_user(user_id).await?;
    Ok(Json(MessageResponse::new("User unlocked successfully")))
}

/// Reads the first non-empty file in the named field, ignoring others.
pub(crate) async fn read_image_field(
    mut multipart: Multipart,
    field_name: &str,
) -> AppResult<Option<ImageUpload>> {
    while let Some(field) = multipart.next_field().await? {
        let matches = field
            .name()
            .is_some_and(|name| name.eq_ignore_ascii_case(field_name));
        if !matches {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        if !bytes.is_empty() {
            return Ok(Some(ImageUpload {
                file_name,
                bytes: bytes.to_vec(),
            }));
        }
    }
    Ok(None)
}
