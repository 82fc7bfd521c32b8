use crate::error::constraint_parser::ForeignKeyViolation;
use crate::error::{AppError, ConstraintParser};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// Turns Diesel errors into `AppError` variants a client can act on.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error, using `operation` for errors that stay internal.
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.as_ref(), operation)
            }
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: &(dyn DatabaseErrorInformation + Send + Sync),
        operation: &str,
    ) -> AppError {
        let message = info.message();
        let constraint_name = info.constraint_name();

        let converted = match kind {
            DatabaseErrorKind::UniqueViolation => {
                ConstraintParser::parse_unique_violation(message, constraint_name).map(
                    |(entity, field, value)| AppError::Duplicate {
                        entity,
                        field,
                        value,
                    },
                )
            }
            DatabaseErrorKind::NotNullViolation => {
                ConstraintParser::parse_not_null_violation(message).map(|(entity, field)| {
                    AppError::Validation {
                        field,
                        reason: format!("Field is required for {}", entity),
                    }
                })
            }
            DatabaseErrorKind::ForeignKeyViolation => {
                ConstraintParser::parse_foreign_key_violation(message, constraint_name).map(
                    |violation| match violation {
                        ForeignKeyViolation::MissingReference {
                            table,
                            field,
                            value,
                        } => AppError::Validation {
                            field,
                            reason: format!(
                                "Invalid reference from {} with value '{}'",
                                table, value
                            ),
                        },
                        ForeignKeyViolation::StillReferenced {
                            table,
                            referencing_table,
                        } => AppError::BadRequest {
                            message: format!(
                                "Cannot delete from {} while it is used by {}",
                                table, referencing_table
                            ),
                        },
                    },
                )
            }
            DatabaseErrorKind::CheckViolation => {
                ConstraintParser::parse_check_violation(message, constraint_name).map(
                    |(entity, field)| AppError::Validation {
                        field,
                        reason: format!("Check constraint failed for {}", entity),
                    },
                )
            }
            _ => None,
        };

        converted.unwrap_or_else(|| AppError::Database {
            operation: operation.to_string(),
            source: anyhow::Error::msg(format!("{:?}: {}", kind, message)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockDatabaseErrorInfo {
        message: String,
        constraint_name: Option<String>,
    }

    impl DatabaseErrorInformation for MockDatabaseErrorInfo {
        fn message(&self) -> &str {
            &self.message
        }

        fn details(&self) -> Option<&str> {
            None
        }

        fn hint(&self) -> Option<&str> {
            None
        }

        fn table_name(&self) -> Option<&str> {
            None
        }

        fn column_name(&self) -> Option<&str> {
            None
        }

        fn constraint_name(&self) -> Option<&str> {
            self.constraint_name.as_deref()
        }

        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn db_error(kind: DatabaseErrorKind, message: &str, constraint: Option<&str>) -> DieselError {
        DieselError::DatabaseError(
            kind,
            Box::new(MockDatabaseErrorInfo {
                message: message.to_string(),
                constraint_name: constraint.map(str::to_string),
            }),
        )
    }

    #[test]
    fn test_convert_not_found_error() {
        let result = DatabaseErrorConverter::convert_diesel_error(DieselError::NotFound, "find");
        assert!(matches!(result, AppError::NotFound { .. }));
    }

    #[test]
    fn test_convert_unique_violation() {
        let error = db_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint \"users_user_name_key\"\nDETAIL: Key (user_name)=(alice) already exists.",
            Some("users_user_name_key"),
        );

        match DatabaseErrorConverter::convert_diesel_error(error, "insert user") {
            AppError::Duplicate {
                entity,
                field,
                value,
            } => {
                assert_eq!(entity, "users");
                assert_eq!(field, "user_name");
                assert_eq!(value, "alice");
            }
            other => panic!("Expected Duplicate error, got: {:?}", other),
        }
    }

    #[test]
    fn test_convert_not_null_violation() {
        let error = db_error(
            DatabaseErrorKind::NotNullViolation,
            "null value in column \"email\" of relation \"users\" violates not-null constraint",
            None,
        );

        match DatabaseErrorConverter::convert_diesel_error(error, "insert user") {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "email");
                assert!(reason.contains("users"));
            }
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[test]
    fn test_convert_delete_of_referenced_row() {
        let error = db_error(
            DatabaseErrorKind::ForeignKeyViolation,
            "update or delete on table \"product_brands\" violates foreign key constraint \"products_product_brand_id_fkey\" on table \"products\"",
            Some("products_product_brand_id_fkey"),
        );

        match DatabaseErrorConverter::convert_diesel_error(error, "delete brand") {
            AppError::BadRequest { message } => {
                assert!(message.contains("product_brands"));
                assert!(message.contains("products"));
            }
            other => panic!("Expected BadRequest error, got: {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_error_stays_internal() {
        let error = db_error(DatabaseErrorKind::UniqueViolation, "garbled", None);
        match DatabaseErrorConverter::convert_diesel_error(error, "insert order") {
            AppError::Database { operation, .. } => assert_eq!(operation, "insert order"),
            other => panic!("Expected Database error, got: {:?}", other),
        }
    }
}
