use regex::Regex;
use std::sync::OnceLock;

/// Parses PostgreSQL constraint violation messages into structured parts.
///
/// Constraint names follow PostgreSQL's defaults (`{table}_{column}_key`,
/// `{table}_{column}_fkey`, `{table}_{column}_check`). Table names contain
/// underscores (`product_brands`), so the column reported in the message
/// detail is used to split a constraint name instead of guessing.
pub struct ConstraintParser;

/// A foreign key violation seen from either side of the relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignKeyViolation {
    /// An insert or update pointed at a row that does not exist.
    MissingReference {
        table: String,
        field: String,
        value: String,
    },
    /// A delete was blocked because other rows still reference the target.
    StillReferenced {
        table: String,
        referencing_table: String,
    },
}

struct RegexPatterns {
    key_value: Regex,
    column_name: Regex,
    relation_name: Regex,
    table_name: Regex,
    delete_source: Regex,
    referencing_table: Regex,
}

impl RegexPatterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            // "Key (email)=(a@b.c)" and composite "Key (user_id, product_id)=(..., 3)"
            key_value: Regex::new(r"Key \(([^)]+)\)=\(([^)]*)\)")?,
            column_name: Regex::new(r#"column "([^"]+)""#)?,
            relation_name: Regex::new(r#"relation "([^"]+)""#)?,
            table_name: Regex::new(r#"on table "([^"]+)""#)?,
            delete_source: Regex::new(r#"^update or delete on table "([^"]+)""#)?,
            referencing_table: Regex::new(r#"foreign key constraint "[^"]+" on table "([^"]+)""#)?,
        })
    }
}

static REGEX_PATTERNS: OnceLock<Option<RegexPatterns>> = OnceLock::new();

impl ConstraintParser {
    fn patterns() -> Option<&'static RegexPatterns> {
        REGEX_PATTERNS
            .get_or_init(|| RegexPatterns::new().ok())
            .as_ref()
    }

    /// Returns `(entity, field, value)` for a unique violation.
    pub fn parse_unique_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        let (field, value) = Self::extract_key_value_from_message(message)?;

        let entity = constraint_name
            .and_then(|c| Self::entity_from_constraint(c, &field, "_key"))
            .or_else(|| Self::extract_table_from_message(message))
            .or_else(|| Self::extract_relation_from_message(message))
            .unwrap_or_else(|| "resource".to_string());

        Some((entity, field, value))
    }

    /// Returns `(entity, field)` for a not-null violation.
    pub fn parse_not_null_violation(message: &str) -> Option<(String, String)> {
        let field = Self::extract_column_from_message(message)?;
        let entity = Self::extract_relation_from_message(message)
            .unwrap_or_else(|| "resource".to_string());
        Some((entity, field))
    }

    pub fn parse_foreign_key_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<ForeignKeyViolation> {
        let patterns = Self::patterns()?;

        if let Some(source) = Self::capture(&patterns.delete_source, message) {
            let referencing_table = Self::capture(&patterns.referencing_table, message)
                .or_else(|| constraint_name.and_then(Self::table_from_fkey_name))
                .unwrap_or_else(|| "resource".to_string());
            return Some(ForeignKeyViolation::StillReferenced {
                table: source,
                referencing_table,
            });
        }

        let (field, value) = Self::extract_key_value_from_message(message)?;
        let table = constraint_name
            .and_then(|c| Self::entity_from_constraint(c, &field, "_fkey"))
            .or_else(|| Self::extract_table_from_message(message))
            .unwrap_or_else(|| "resource".to_string());

        Some(ForeignKeyViolation::MissingReference {
            table,
            field,
            value,
        })
    }

    /// Returns `(entity, field)` for a check violation on `{table}_{column}_check`.
    pub fn parse_check_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        let constraint = constraint_name?;
        let stem = constraint.strip_suffix("_check")?;

        // The relation name is always present in PostgreSQL check messages.
        if let Some(table) = Self::extract_relation_from_message(message) {
            let field = stem.strip_prefix(&format!("{table}_"))?;
            return Some((table, field.to_string()));
        }

        stem.split_once('_')
            .map(|(table, field)| (table.to_string(), field.to_string()))
    }

    /// Strips `_{field}{suffix}` from a constraint name, leaving the table.
    ///
    /// Composite keys ("user_id, product_id") are joined with `_` the way
    /// PostgreSQL names them.
    pub fn entity_from_constraint(constraint: &str, field: &str, suffix: &str) -> Option<String> {
        let column_part = field
            .split(',')
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("_");
        let tail = format!("_{column_part}{suffix}");
        constraint
            .strip_suffix(&tail)
            .filter(|table| !table.is_empty())
            .map(str::to_string)
    }

    /// Best-effort table extraction from an `_fkey` name when the message has none.
    fn table_from_fkey_name(constraint: &str) -> Option<String> {
        let stem = constraint.strip_suffix("_fkey")?;
        let idx = stem.find("_id")?;
        let before = &stem[..idx];
        before.rfind('_').map(|pos| before[..pos].to_string())
    }

    pub fn extract_column_from_message(message: &str) -> Option<String> {
        Self::patterns().and_then(|p| Self::capture(&p.column_name, message))
    }

    pub fn extract_relation_from_message(message: &str) -> Option<String> {
        Self::patterns().and_then(|p| Self::capture(&p.relation_name, message))
    }

    pub fn extract_table_from_message(message: &str) -> Option<String> {
        Self::patterns().and_then(|p| Self::capture(&p.table_name, message))
    }

    pub fn extract_key_value_from_message(message: &str) -> Option<(String, String)> {
        let patterns = Self::patterns()?;
        patterns.key_value.captures(message).and_then(|caps| {
            let field = caps.get(1)?.as_str().to_string();
            let value = caps.get(2)?.as_str().to_string();
            Some((field, value))
        })
    }

    fn capture(regex: &Regex, message: &str) -> Option<String> {
        regex
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_on_multi_word_table() {
        let message = "duplicate key value violates unique constraint \"product_brands_name_key\"\nDETAIL: Key (name)=(Nike) already exists.";
        let result = ConstraintParser::parse_unique_violation(message, Some("product_brands_name_key"));
        assert_eq!(
            result,
            Some(("product_brands".to_string(), "name".to_string(), "Nike".to_string()))
        );
    }

    #[test]
    fn test_unique_violation_on_composite_key() {
        let message = "duplicate key value violates unique constraint \"product_reviews_user_id_product_id_key\"\nDETAIL: Key (user_id, product_id)=(8c1e, 3) already exists.";
        let result = ConstraintParser::parse_unique_violation(
            message,
            Some("product_reviews_user_id_product_id_key"),
        );
        assert_eq!(
            result,
            Some((
                "product_reviews".to_string(),
                "user_id, product_id".to_string(),
                "8c1e, 3".to_string()
            ))
        );
    }

    #[test]
    fn test_unique_violation_without_constraint_name() {
        let message = "duplicate key value violates unique constraint\nDETAIL: Key (user_name)=(john_doe) already exists.";
        let result = ConstraintParser::parse_unique_violation(message, None);
        assert_eq!(
            result,
            Some(("resource".to_string(), "user_name".to_string(), "john_doe".to_string()))
        );
    }

    #[test]
    fn test_not_null_violation_reads_relation() {
        let message = "null value in column \"email\" of relation \"users\" violates not-null constraint";
        assert_eq!(
            ConstraintParser::parse_not_null_violation(message),
            Some(("users".to_string(), "email".to_string()))
        );

        let message = "null value in column \"email\" violates not-null constraint";
        assert_eq!(
            ConstraintParser::parse_not_null_violation(message),
            Some(("resource".to_string(), "email".to_string()))
        );
    }

    #[test]
    fn test_foreign_key_missing_reference() {
        let message = "insert or update on table \"products\" violates foreign key constraint \"products_product_brand_id_fkey\"\nDETAIL: Key (product_brand_id)=(999) is not present in table \"product_brands\".";
        let result = ConstraintParser::parse_foreign_key_violation(
            message,
            Some("products_product_brand_id_fkey"),
        );
        assert_eq!(
            result,
            Some(ForeignKeyViolation::MissingReference {
                table: "products".to_string(),
                field: "product_brand_id".to_string(),
                value: "999".to_string(),
            })
        );
    }

    #[test]
    fn test_foreign_key_still_referenced_on_delete() {
        let message = "update or delete on table \"product_types\" violates foreign key constraint \"products_product_type_id_fkey\" on table \"products\"\nDETAIL: Key (id)=(2) is still referenced from table \"products\".";
        let result = ConstraintParser::parse_foreign_key_violation(
            message,
            Some("products_product_type_id_fkey"),
        );
        assert_eq!(
            result,
            Some(ForeignKeyViolation::StillReferenced {
                table: "product_types".to_string(),
                referencing_table: "products".to_string(),
            })
        );
    }

    #[test]
    fn test_check_violation_uses_relation_prefix() {
        let message = "new row for relation \"product_reviews\" violates check constraint \"product_reviews_rating_check\"";
        let result =
            ConstraintParser::parse_check_violation(message, Some("product_reviews_rating_check"));
        assert_eq!(
            result,
            Some(("product_reviews".to_string(), "rating".to_string()))
        );
    }

    #[test]
    fn test_entity_from_constraint() {
        assert_eq!(
            ConstraintParser::entity_from_constraint("users_email_key", "email", "_key"),
            Some("users".to_string())
        );
        assert_eq!(
            ConstraintParser::entity_from_constraint("users_email_key", "user_name", "_key"),
            None
        );
    }

    #[test]
    fn test_table_from_fkey_name() {
        assert_eq!(
            ConstraintParser::table_from_fkey_name("order_items_order_id_fkey"),
            Some("order_items".to_string())
        );
        assert_eq!(ConstraintParser::table_from_fkey_name("noise"), None);
    }

    #[test]
    fn test_regex_patterns_caching() {
        let first = ConstraintParser::patterns().map(|p| p as *const RegexPatterns);
        let second = ConstraintParser::patterns().map(|p| p as *const RegexPatterns);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_graceful_parsing_failures() {
        let message = "completely unrelated error message";
        assert_eq!(ConstraintParser::parse_unique_violation(message, None), None);
        assert_eq!(ConstraintParser::parse_not_null_violation(message), None);
        assert_eq!(ConstraintParser::parse_foreign_key_violation(message, None), None);
        assert_eq!(ConstraintParser::parse_check_violation(message, None), None);
    }
}
