//! Pure functions for calculating deployment plans (Functional Core).

use itemstore_core::schema::{AttributeType, GsiConfig, KeyAttribute, TableConfig};

/// Represents the current state of a table.
#[derive(Debug, Clone)]
pub struct TableState {
    pub status: TableStatus,
    pub gsis: Vec<GsiState>,
    /// Attribute with native TTL enabled, if any.
    pub ttl_attribute: Option<String>,
}

/// Table status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// GSI state.
#[derive(Debug, Clone)]
pub struct GsiState {
    pub name: String,
    pub status: GsiStatus,
}

/// GSI status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GsiStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

/// Planned changes for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// Table doesn't exist, needs to be created.
    CreateTable { config: TableConfig },
    /// Table exists but is missing indexes or its TTL setting.
    UpdateTable {
        table_name: String,
        gsis_to_add: Vec<GsiConfig>,
        enable_ttl: Option<String>,
    },
    /// Table is up to date, no changes needed.
    NoChanges { table_name: String },
}

impl DeployPlan {
    pub fn has_changes(&self) -> bool {
        !matches!(self, Self::NoChanges { .. })
    }
}

/// Plan for destroying a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyPlan {
    /// Table exists and will be deleted.
    DeleteTable { table_name: String },
    /// Table doesn't exist, nothing to do.
    AlreadyGone { table_name: String },
}

/// Pure function: Calculate what changes are needed to reach desired state.
pub fn calculate_deploy_plan(current: Option<&TableState>, desired: &TableConfig) -> DeployPlan {
    let Some(state) = current else {
        return DeployPlan::CreateTable {
            config: desired.clone(),
        };
    };

    let gsis_to_add: Vec<GsiConfig> = desired
        .gsis
        .iter()
        .filter(|gsi| !state.gsis.iter().any(|existing| existing.name == gsi.name))
        .cloned()
        .collect();

    let enable_ttl = desired
        .ttl_attribute
        .clone()
        .filter(|wanted| state.ttl_attribute.as_ref() != Some(wanted));

    if gsis_to_add.is_empty() && enable_ttl.is_none() {
        DeployPlan::NoChanges {
            table_name: desired.table_name.clone(),
        }
    } else {
        DeployPlan::UpdateTable {
            table_name: desired.table_name.clone(),
            gsis_to_add,
            enable_ttl,
        }
    }
}

/// Pure function: Calculate destroy plan.
pub fn calculate_destroy_plan(current: Option<&TableState>, table_name: &str) -> DestroyPlan {
    match current {
        Some(_) => DestroyPlan::DeleteTable {
            table_name: table_name.to_string(),
        },
        None => DestroyPlan::AlreadyGone {
            table_name: table_name.to_string(),
        },
    }
}

fn describe_key(key: &KeyAttribute) -> String {
    let kind = match key.attribute_type {
        AttributeType::String => "S",
        AttributeType::Number => "N",
    };
    format!("{} ({})", key.name, kind)
}

/// Pure function: Format a deploy plan for display.
pub fn format_deploy_plan(plan: &DeployPlan) -> Vec<String> {
    match plan {
        DeployPlan::CreateTable { config } => {
            let mut lines = vec![
                format!("+ Create table: {}", config.table_name),
                format!("  Partition key: {}", describe_key(&config.partition_key)),
            ];
            if let Some(sk) = &config.sort_key {
                lines.push(format!("  Sort key: {}", describe_key(sk)));
            }
            for gsi in &config.gsis {
                lines.push(format!("  + GSI: {}", gsi.name));
                lines.push(format!("    Partition key: {}", describe_key(&gsi.partition_key)));
                if let Some(sk) = &gsi.sort_key {
                    lines.push(format!("    Sort key: {}", describe_key(sk)));
                }
            }
            if let Some(ttl) = &config.ttl_attribute {
                lines.push(format!("  + TTL on: {}", ttl));
            }
            lines.push("  Billing: PAY_PER_REQUEST".to_string());
            lines
        }
        DeployPlan::UpdateTable {
            table_name,
            gsis_to_add,
            enable_ttl,
        } => {
            let mut lines = vec![format!("~ Update table: {}", table_name)];
            for gsi in gsis_to_add {
                lines.push(format!("  + Add GSI: {}", gsi.name));
            }
            if let Some(ttl) = enable_ttl {
                lines.push(format!("  + Enable TTL on: {}", ttl));
            }
            lines
        }
        DeployPlan::NoChanges { table_name } => {
            vec![format!("= Table '{}' is up to date", table_name)]
        }
    }
}

/// Pure function: Format a destroy plan for display.
pub fn format_destroy_plan(plan: &DestroyPlan) -> Vec<String> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            vec![format!(
                "- Delete table: {} (ALL DATA WILL BE LOST)",
                table_name
            )]
        }
        DestroyPlan::AlreadyGone { table_name } => {
            vec![format!("= Table '{}' does not exist", table_name)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itemstore_core::schema::{TableKind, TableRegistry};

    fn items_config() -> TableConfig {
        TableRegistry::with_prefix("test-").table_config(TableKind::Items)
    }

    fn active(gsis: &[&str], ttl_attribute: Option<&str>) -> TableState {
        TableState {
            status: TableStatus::Active,
            gsis: gsis
                .iter()
                .map(|name| GsiState {
                    name: name.to_string(),
                    status: GsiStatus::Active,
                })
                .collect(),
            ttl_attribute: ttl_attribute.map(str::to_string),
        }
    }

    #[test]
    fn test_missing_table_is_created() {
        let plan = calculate_deploy_plan(None, &items_config());

        assert!(matches!(plan, DeployPlan::CreateTable { .. }));
        let lines = format_deploy_plan(&plan);
        assert_eq!(lines[0], "+ Create table: test-items");
        assert_eq!(lines[1], "  Partition key: Id (N)");
        assert!(lines.contains(&"  + GSI: TypeOwnerSpaceIndex".to_string()));
    }

    #[test]
    fn test_missing_index_is_added() {
        let state = active(&["EdgeIndex", "IdTypeReferenceIndex"], None);

        match calculate_deploy_plan(Some(&state), &items_config()) {
            DeployPlan::UpdateTable {
                gsis_to_add,
                enable_ttl,
                ..
            } => {
                assert_eq!(gsis_to_add.len(), 1);
                assert_eq!(gsis_to_add[0].name, "TypeOwnerSpaceIndex");
                assert_eq!(enable_ttl, None);
            }
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn test_missing_ttl_is_enabled() {
        let config = TableRegistry::default().table_config(TableKind::Maps);

        let plan = calculate_deploy_plan(Some(&active(&[], None)), &config);
        assert_eq!(
            plan,
            DeployPlan::UpdateTable {
                table_name: "maps".to_string(),
                gsis_to_add: Vec::new(),
                enable_ttl: Some("ExpiresAt".to_string()),
            }
        );

        let plan = calculate_deploy_plan(Some(&active(&[], Some("ExpiresAt"))), &config);
        assert!(!plan.has_changes());
    }

    #[test]
    fn test_complete_table_has_no_changes() {
        let state = active(
            &["EdgeIndex", "IdTypeReferenceIndex", "TypeOwnerSpaceIndex"],
            None,
        );
        let plan = calculate_deploy_plan(Some(&state), &items_config());

        assert_eq!(
            plan,
            DeployPlan::NoChanges {
                table_name: "test-items".to_string()
            }
        );
    }

    #[test]
    fn test_destroy_plan() {
        let plan = calculate_destroy_plan(None, "test-locks");
        assert_eq!(
            format_destroy_plan(&plan),
            vec!["= Table 'test-locks' does not exist".to_string()]
        );
    }
}
