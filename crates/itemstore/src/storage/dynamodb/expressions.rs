//! Builders for DynamoDB key-condition, condition and update expressions.
//!
//! Every attribute name and value goes through a placeholder so payload
//! attribute names never collide with reserved words.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use itemstore_core::item::{keys, AuditStamp, ItemField, ItemTypeId, ItemUpdate, Precondition};
use itemstore_core::storage::{IndexQuery, RangeCondition, RepositoryError, Result};

use super::attributes::*;
use super::conversions::{hash_key_value, json_to_attribute, number, string};

/// Placeholder tables shared by the expressions of one request.
#[derive(Debug, Default)]
pub struct ExpressionAttributes {
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl ExpressionAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholder for a top-level attribute name, reused when seen before.
    pub fn name(&mut self, attribute: &str) -> String {
        if let Some((placeholder, _)) = self.names.iter().find(|(_, name)| *name == attribute) {
            return placeholder.clone();
        }
        let placeholder = format!("#n{}", self.names.len());
        self.names.insert(placeholder.clone(), attribute.to_string());
        placeholder
    }

    pub fn value(&mut self, value: AttributeValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    /// Document path of a precondition field.
    pub fn field_path(&mut self, field: &ItemField) -> String {
        match field {
            ItemField::StatusId => self.name(STATUS_ID),
            ItemField::ReferenceId => self.name(REFERENCE_ID),
            ItemField::OwnerId => self.name(OWNER_ID),
            ItemField::WorkspaceId => self.name(WORKSPACE_ID),
            ItemField::ModifiedOnUtc => self.name(MODIFIED_ON_UTC),
            ItemField::DeletedOnUtc => self.name(DELETED_ON_UTC),
            ItemField::Attribute(name) => self.payload_path(name),
        }
    }

    fn payload_path(&mut self, attribute: &str) -> String {
        format!("{}.{}", self.name(PAYLOAD), self.name(attribute))
    }

    /// Splits into the optional maps the SDK builders accept; DynamoDB
    /// rejects empty placeholder maps.
    pub fn into_parts(
        self,
    ) -> (
        Option<HashMap<String, String>>,
        Option<HashMap<String, AttributeValue>>,
    ) {
        let names = (!self.names.is_empty()).then_some(self.names);
        let values = (!self.values.is_empty()).then_some(self.values);
        (names, values)
    }
}

// ============================================================================
// Key conditions
// ============================================================================

/// Key-condition expression of an index query.
pub fn key_condition(attrs: &mut ExpressionAttributes, query: &IndexQuery) -> String {
    let hash = attrs.name(query.index.hash_attribute());
    let hash_value = attrs.value(hash_key_value(&query.hash_key));
    let mut expression = format!("{hash} = {hash_value}");

    if let Some(range) = &query.range {
        let range_name = attrs.name(query.index.range_attribute());
        let clause = match range {
            RangeCondition::Equals(value) => {
                format!("{range_name} = {}", attrs.value(string(value.as_str())))
            }
            RangeCondition::BeginsWith(prefix) => {
                format!(
                    "begins_with({range_name}, {})",
                    attrs.value(string(prefix.as_str()))
                )
            }
            RangeCondition::Between(low, high) => {
                let low = attrs.value(string(low.as_str()));
                let high = attrs.value(string(high.as_str()));
                format!("{range_name} BETWEEN {low} AND {high}")
            }
        };
        expression = format!("{expression} AND {clause}");
    }

    expression
}

// ============================================================================
// Conditions
// ============================================================================

/// `attribute_exists` on the partition key: the row must already exist.
pub fn row_exists(attrs: &mut ExpressionAttributes) -> String {
    format!("attribute_exists({})", attrs.name(ID))
}

/// `attribute_not_exists` on the partition key: the row must not exist.
pub fn row_absent(attrs: &mut ExpressionAttributes) -> String {
    format!("attribute_not_exists({})", attrs.name(ID))
}

/// Condition expression equivalent to `precondition`.
pub fn condition(attrs: &mut ExpressionAttributes, precondition: &Precondition) -> String {
    match precondition {
        Precondition::Equals(field, value) => {
            let path = attrs.field_path(field);
            let value = attrs.value(json_to_attribute(value));
            format!("{path} = {value}")
        }
        Precondition::Absent(field) => {
            format!("attribute_not_exists({})", attrs.field_path(field))
        }
        Precondition::Exists(field) => {
            format!("attribute_exists({})", attrs.field_path(field))
        }
        Precondition::NotDeleted => {
            let deleted_on = attrs.name(DELETED_ON_UTC);
            let zero = attrs.value(number(0));
            format!("attribute_not_exists({deleted_on}) OR {deleted_on} <= {zero}")
        }
        Precondition::All(conditions) if conditions.is_empty() => row_exists(attrs),
        Precondition::All(conditions) => conditions
            .iter()
            .map(|c| format!("({})", condition(attrs, c)))
            .collect::<Vec<_>>()
            .join(" AND "),
    }
}

/// `DeletedOnUtc` holds a positive timestamp.
pub fn deleted(attrs: &mut ExpressionAttributes) -> String {
    let deleted_on = attrs.name(DELETED_ON_UTC);
    let zero = attrs.value(number(0));
    format!("{deleted_on} > {zero}")
}

/// The row exists and, when given, `precondition` holds.
pub fn guarded(attrs: &mut ExpressionAttributes, precondition: Option<&Precondition>) -> String {
    let exists = row_exists(attrs);
    match precondition {
        Some(precondition) => format!("{exists} AND ({})", condition(attrs, precondition)),
        None => exists,
    }
}

// ============================================================================
// Updates
// ============================================================================

/// `SET ... REMOVE ...` accumulator.
#[derive(Debug, Default)]
pub struct UpdateExpression {
    set: Vec<String>,
    remove: Vec<String>,
}

impl UpdateExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: String, value: String) -> &mut Self {
        self.set.push(format!("{path} = {value}"));
        self
    }

    pub fn remove(&mut self, path: String) -> &mut Self {
        self.remove.push(path);
        self
    }

    /// Refreshes the modification audit attributes.
    pub fn touch(&mut self, attrs: &mut ExpressionAttributes, stamp: &AuditStamp) -> &mut Self {
        let audit = [
            (MODIFIED_BY, stamp.user_id),
            (MODIFIED_WORKSPACE_ID, stamp.workspace_id),
            (MODIFIED_ON_UTC, stamp.on_utc),
        ];
        for (attribute, value) in audit {
            let path = attrs.name(attribute);
            let value = attrs.value(number(value));
            self.set(path, value);
        }
        self
    }

    pub fn build(&self) -> String {
        let mut clauses = Vec::new();
        if !self.set.is_empty() {
            clauses.push(format!("SET {}", self.set.join(", ")));
        }
        if !self.remove.is_empty() {
            clauses.push(format!("REMOVE {}", self.remove.join(", ")));
        }
        clauses.join(" ")
    }
}

/// The type encoded in an edge id; rows written by the store always carry one.
pub fn edge_type(edge_id: &str) -> Result<ItemTypeId> {
    keys::parse_edge_id(edge_id)
        .map(|(type_id, _)| type_id)
        .ok_or_else(|| RepositoryError::InvalidData(format!("Malformed edge id: {}", edge_id)))
}

/// Update expression for a non-key mutation. A new reference also rewrites
/// the derived `TypeReference` index key.
pub fn item_update(
    attrs: &mut ExpressionAttributes,
    edge_id: &str,
    update: &ItemUpdate,
    stamp: &AuditStamp,
) -> Result<String> {
    let mut expression = UpdateExpression::new();

    match &update.status {
        Some(Some(status)) if !status.is_empty() => {
            let path = attrs.name(STATUS_ID);
            let value = attrs.value(string(status.as_str()));
            expression.set(path, value);
        }
        Some(_) => {
            let path = attrs.name(STATUS_ID);
            expression.remove(path);
        }
        None => {}
    }

    if let Some(reference_id) = &update.reference_id {
        let type_id = edge_type(edge_id)?;
        let path = attrs.name(REFERENCE_ID);
        let value = attrs.value(string(reference_id.as_str()));
        expression.set(path, value);

        let path = attrs.name(TYPE_REFERENCE);
        let value = attrs.value(string(keys::type_reference(type_id, reference_id)));
        expression.set(path, value);
    }

    for name in &update.remove_attributes {
        let path = attrs.payload_path(name);
        expression.remove(path);
    }
    for (name, value) in &update.set_attributes {
        let path = attrs.payload_path(name);
        let value = attrs.value(json_to_attribute(value));
        expression.set(path, value);
    }

    expression.touch(attrs, stamp);
    Ok(expression.build())
}

pub fn soft_delete(attrs: &mut ExpressionAttributes, stamp: &AuditStamp) -> String {
    let mut expression = UpdateExpression::new();
    let marker = [
        (DELETED_ON_UTC, stamp.on_utc),
        (DELETED_BY, stamp.user_id),
        (DELETED_BY_WORKSPACE_ID, stamp.workspace_id),
    ];
    for (attribute, value) in marker {
        let path = attrs.name(attribute);
        let value = attrs.value(number(value));
        expression.set(path, value);
    }
    expression.touch(attrs, stamp).build()
}

pub fn restore(attrs: &mut ExpressionAttributes, stamp: &AuditStamp) -> String {
    let mut expression = UpdateExpression::new();
    for attribute in [DELETED_ON_UTC, DELETED_BY, DELETED_BY_WORKSPACE_ID] {
        let path = attrs.name(attribute);
        expression.remove(path);
    }
    expression.touch(attrs, stamp).build()
}

/// Reassigns ownership and rewrites the `TypeOwnerSpace` index key.
pub fn transfer(
    attrs: &mut ExpressionAttributes,
    edge_id: &str,
    owner_id: i64,
    workspace_id: i64,
    stamp: &AuditStamp,
) -> Result<String> {
    let type_id = edge_type(edge_id)?;
    let mut expression = UpdateExpression::new();

    let path = attrs.name(OWNER_ID);
    let value = attrs.value(number(owner_id));
    expression.set(path, value);

    let path = attrs.name(WORKSPACE_ID);
    let value = attrs.value(number(workspace_id));
    expression.set(path, value);

    let path = attrs.name(TYPE_OWNER_SPACE);
    let value = attrs.value(string(keys::type_owner_space(
        type_id,
        owner_id,
        workspace_id,
    )));
    expression.set(path, value);

    Ok(expression.touch(attrs, stamp).build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(expression: &str, attrs: &ExpressionAttributes) -> String {
        let mut resolved = expression.to_string();
        let mut names: Vec<_> = attrs.names.iter().collect();
        // Longest placeholder first so "#n1" does not clobber "#n10"
        names.sort_by_key(|(placeholder, _)| std::cmp::Reverse(placeholder.len()));
        for (placeholder, name) in names {
            resolved = resolved.replace(placeholder.as_str(), name);
        }
        resolved
    }

    #[test]
    fn test_key_condition_with_prefix() {
        let mut attrs = ExpressionAttributes::new();
        let query = IndexQuery::by_id(125_151).of_type(ItemTypeId(7));

        let expression = key_condition(&mut attrs, &query);

        assert_eq!(
            resolve(&expression, &attrs),
            "Id = :v0 AND begins_with(TypeReference, :v1)"
        );
        assert_eq!(attrs.values[":v0"], AttributeValue::N("125151".to_string()));
        assert_eq!(attrs.values[":v1"], AttributeValue::S("7|".to_string()));
    }

    #[test]
    fn test_key_condition_between_on_owner_index() {
        let mut attrs = ExpressionAttributes::new();
        let query = IndexQuery::by_type_owner_space(ItemTypeId(7), 1, 2).with_range(
            RangeCondition::Between("2024-01-01".to_string(), "2024-12-31".to_string()),
        );

        let expression = key_condition(&mut attrs, &query);

        assert_eq!(
            resolve(&expression, &attrs),
            "TypeOwnerSpace = :v0 AND ReferenceId BETWEEN :v1 AND :v2"
        );
    }

    #[test]
    fn test_guarded_condition_on_payload_attribute() {
        let mut attrs = ExpressionAttributes::new();
        let precondition = Precondition::equals(ItemField::StatusId, "unclassified")
            .and(Precondition::absent(ItemField::attribute("claimedBy")));

        let expression = guarded(&mut attrs, Some(&precondition));

        assert_eq!(
            resolve(&expression, &attrs),
            "attribute_exists(Id) AND ((StatusId = :v0) AND (attribute_not_exists(Payload.claimedBy)))"
        );
    }

    #[test]
    fn test_names_are_reused() {
        let mut attrs = ExpressionAttributes::new();
        let first = attrs.name(STATUS_ID);
        let second = attrs.name(STATUS_ID);

        assert_eq!(first, second);
        assert_eq!(attrs.names.len(), 1);
    }

    #[test]
    fn test_item_update_rewrites_type_reference() {
        let mut attrs = ExpressionAttributes::new();
        let update = ItemUpdate::new()
            .clear_status()
            .set_reference("2024-06-15")
            .set_attribute("score", 9)
            .remove_attribute("draft");

        let expression =
            item_update(&mut attrs, "7|125151", &update, &AuditStamp::new(1, 2, 300)).unwrap();
        let resolved = resolve(&expression, &attrs);

        assert!(resolved.starts_with("SET ReferenceId = "));
        assert!(resolved.contains("TypeReference = "));
        assert!(resolved.contains("Payload.score = "));
        assert!(resolved.contains("ModifiedOnUtc = "));
        assert!(resolved.ends_with("REMOVE StatusId, Payload.draft"));
        assert!(attrs
            .values
            .values()
            .any(|v| v == &AttributeValue::S("7|2024-06-15".to_string())));
    }

    #[test]
    fn test_item_update_rejects_malformed_edge() {
        let mut attrs = ExpressionAttributes::new();
        let update = ItemUpdate::new().set_reference("x");

        assert!(matches!(
            item_update(&mut attrs, "no-type", &update, &AuditStamp::new(1, 2, 3)),
            Err(RepositoryError::InvalidData(_))
        ));
    }

    #[test]
    fn test_transfer_rewrites_owner_index_key() {
        let mut attrs = ExpressionAttributes::new();
        transfer(&mut attrs, "7|125151", 100_077, 100_078, &AuditStamp::new(1, 2, 3)).unwrap();

        assert!(attrs
            .values
            .values()
            .any(|v| v == &AttributeValue::S("7|100077|100078".to_string())));
    }

    #[test]
    fn test_restore_removes_marker() {
        let mut attrs = ExpressionAttributes::new();
        let expression = restore(&mut attrs, &AuditStamp::new(1, 2, 3));

        assert!(resolve(&expression, &attrs)
            .ends_with("REMOVE DeletedOnUtc, DeletedBy, DeletedByWorkspaceId"));
    }

    #[test]
    fn test_not_deleted_ignores_non_positive_marker() {
        let mut attrs = ExpressionAttributes::new();
        let expression = guarded(&mut attrs, Some(&Precondition::not_deleted()));

        assert_eq!(
            resolve(&expression, &attrs),
            "attribute_exists(Id) AND (attribute_not_exists(DeletedOnUtc) OR DeletedOnUtc <= :v0)"
        );
        assert_eq!(attrs.values[":v0"], AttributeValue::N("0".to_string()));
    }

    #[test]
    fn test_deleted_requires_positive_marker() {
        let mut attrs = ExpressionAttributes::new();
        let expression = deleted(&mut attrs);

        assert_eq!(resolve(&expression, &attrs), "DeletedOnUtc > :v0");
    }

    #[test]
    fn test_empty_attributes_split_to_none() {
        let (names, values) = ExpressionAttributes::new().into_parts();
        assert!(names.is_none());
        assert!(values.is_none());
    }
}
