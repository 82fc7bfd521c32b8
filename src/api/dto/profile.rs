//! Profile, address and admin user-list DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::PaginationParams;
use crate::models::{Address, UpdateUser, User};
use crate::repositories::{UserQuery, UserSort};
use crate::services::{FileStorageService, UserSummary};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDto {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    /// Absolute URL of the profile image
    pub profile_picture_url: Option<String>,
}

impl ProfileDto {
    pub fn new(user: User, files: &FileStorageService) -> Self {
        Self {
            profile_picture_url: files.absolute_url(user.profile_picture_url.as_deref()),
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            user_name: user.user_name,
            email: user.email,
            phone_number: user.phone_number,
            gender: user.gender,
        }
    }
}

/// Only the fields present are changed.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: Option<String>,
    #[validate(length(max = 32, message = "Phone number is too long"))]
    pub phone_number: Option<String>,
    #[validate(length(max = 16, message = "Gender is too long"))]
    pub gender: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateUser {
    fn from(request: UpdateProfileRequest) -> Self {
        let trimmed = |value: Option<String>| value.map(|v| v.trim().to_string());
        UpdateUser {
            first_name: trimmed(request.first_name),
            last_name: trimmed(request.last_name),
            phone_number: trimmed(request.phone_number),
            gender: trimmed(request.gender),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressDto {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(min = 1, max = 200, message = "Street is required"))]
    pub street: String,
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, max = 100, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, max = 20, message = "Postal code is required"))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100, message = "Country is required"))]
    pub country: String,
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
}

impl AddressDto {
    pub fn into_address(self, user_id: Uuid) -> Address {
        Address {
            user_id,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            street: self.street.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
            phone_number: self
                .phone_number
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        }
    }
}

impl From<Address> for AddressDto {
    fn from(address: Address) -> Self {
        Self {
            first_name: address.first_name,
            last_name: address.last_name,
            street: address.street,
            city: address.city,
            state: address.state,
            postal_code: address.postal_code,
            country: address.country,
            phone_number: address.phone_number,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Old password is required"))]
    pub old_password: String,
    #[validate(length(min = 3, message = "Password must be at least 3 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PasswordRequest {
    #[validate(length(min = 3, message = "Password must be at least 3 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeleteProfileRequest {
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    #[serde(default = "default_page_index")]
    #[validate(range(min = 1, message = "Page index must be at least 1"))]
    pub page_index: i64,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 50, message = "Page size must be between 1 and 50"))]
    pub page_size: i64,
    /// Case-insensitive match on username or email
    pub search: Option<String>,
    /// Only users holding this role
    pub role: Option<String>,
    /// nameAsc (default), nameDesc, emailAsc or emailDesc
    pub sort: Option<String>,
}

fn default_page_index() -> i64 {
    PaginationParams::default().page_index
}

fn default_page_size() -> i64 {
    PaginationParams::default().page_size
}

impl UserListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }

    pub fn to_query(&self) -> UserQuery {
        let page = self.pagination();
        UserQuery {
            search: non_blank(self.search.as_deref()),
            role: non_blank(self.role.as_deref()),
            sort: parse_user_sort(self.sort.as_deref()),
            offset: page.offset(),
            limit: page.limit(),
        }
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_user_sort(sort: Option<&str>) -> UserSort {
    match sort.map(str::to_ascii_lowercase).as_deref() {
        Some("namedesc") => UserSort::NameDesc,
        Some("emailasc") => UserSort::EmailAsc,
        Some("emaildesc") => UserSort::EmailDesc,
        _ => UserSort::NameAsc,
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryDto {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub is_locked: bool,
}

impl From<UserSummary> for UserSummaryDto {
    fn from(summary: UserSummary) -> Self {
        Self {
            id: summary.user.id,
            user_name: summary.user.user_name,
            email: summary.user.email,
            roles: summary.roles,
            is_locked: summary.is_locked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_list_query_defaults() {
        let query: UserListQuery = serde_json::from_str("{}").unwrap();
        let resolved = query.to_query();
        assert_eq!(resolved.offset, 0);
        assert_eq!(resolved.limit, 6);
        assert_eq!(resolved.sort, UserSort::NameAsc);
        assert!(resolved.search.is_none());
    }

    #[test]
    fn test_user_list_query_sort_and_blank_search() {
        let query: UserListQuery =
            serde_json::from_str(r#"{"pageIndex":2,"pageSize":10,"search":"  ","sort":"EmailDesc"}"#)
                .unwrap();
        let resolved = query.to_query();
        assert_eq!(resolved.offset, 10);
        assert_eq!(resolved.sort, UserSort::EmailDesc);
        assert!(resolved.search.is_none());
    }

    #[test]
    fn test_address_is_trimmed() {
        let dto = AddressDto {
            first_name: " Ann ".into(),
            last_name: "Lee".into(),
            street: "1 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            postal_code: " 62701".into(),
            country: "US".into(),
            phone_number: Some("   ".into()),
        };
        let address = dto.into_address(Uuid::nil());
        assert_eq!(address.first_name, "Ann");
        assert_eq!(address.postal_code, "62701");
        assert!(address.phone_number.is_none());
    }

    #[test]
    fn test_update_profile_maps_present_fields() {
        let request: UpdateProfileRequest =
            serde_json::from_str(r#"{"firstName":" Ann ","gender":"Female"}"#).unwrap();
        let update = UpdateUser::from(request);
        assert_eq!(update.first_name.as_deref(), Some("Ann"));
        assert!(update.last_name.is_none());
        assert_eq!(update.gender.as_deref(), Some("Female"));
    }
}
