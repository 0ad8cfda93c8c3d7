use serde::Serialize;

use crate::dataset::{AdmissionRow, CeStatus, ObservationRow};
use crate::error::ApiError;

/// Age bins cover one-year ranges; bin `n` is ages `n-1` to `n`.
pub const AGE_BIN_MIN: u32 = 1;
pub const AGE_BIN_MAX: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Root,
    CeStatus,
    AgeBin,
    LabItem,
}

/// One level of the drill-down hierarchy. Identifiers chain parent
/// fragments (`hasCE` -> `hasCE_age5` -> `hasCE_age5_lab1001`) so the
/// stateless server can recompute any level from the id alone.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub value: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<NodeDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
    /// `Some(true)` tells the client to lazy-load children via `/expand`.
    /// Leaf nodes omit the flag entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeDetails {
    pub total_admissions: u64,
    pub total_observations: u64,
}

/// Root summary for `/data`: dataset totals plus one collapsed child per
/// CE status.
pub fn build_root(hadm: &[AdmissionRow], obs: &[ObservationRow]) -> TreeNode {
    let total_admissions: u64 = hadm.iter().map(|r| r.num_unique_hadms).sum();
    let total_observations: u64 = obs.iter().map(|r| r.num_assay_obs).sum();

    let ce_child = |ce: CeStatus, name: &str| {
        let value = hadm
            .iter()
            .filter(|r| r.key.ce_status == ce)
            .map(|r| r.num_unique_hadms)
            .sum();
        TreeNode {
            id: ce.as_str().to_string(),
            name: name.to_string(),
            node_type: NodeType::CeStatus,
            value,
            details: None,
            children: None,
            collapsed: Some(true),
        }
    };

    TreeNode {
        id: "PIC".to_string(),
        name: "PIC Dataset".to_string(),
        node_type: NodeType::Root,
        value: total_admissions,
        details: Some(NodeDetails {
            total_admissions,
            total_observations,
        }),
        children: Some(vec![
            ce_child(CeStatus::HasCe, "Has CE"),
            ce_child(CeStatus::LacksCe, "No CE"),
        ]),
        collapsed: None,
    }
}

/// Children of a `ce_status` node: one `age_bin` per age 1..=18, ascending.
/// Every bin is expected to have exactly one admission row; an absent bin
/// is a not-found error rather than a silent zero.
pub fn expand_ce_status(node_id: &str, hadm: &[AdmissionRow]) -> Result<Vec<TreeNode>, ApiError> {
    let ce = CeStatus::parse(node_id)
        .ok_or_else(|| ApiError::NotFound(format!("unknown CE status '{node_id}'")))?;

    let mut children = Vec::with_capacity((AGE_BIN_MAX - AGE_BIN_MIN + 1) as usize);
    for age in AGE_BIN_MIN..=AGE_BIN_MAX {
        let row = hadm
            .iter()
            .find(|r| r.key.ce_status == ce && r.key.age_bin == age)
            .ok_or_else(|| {
                ApiError::NotFound(format!("no admission row for '{node_id}' age bin {age}"))
            })?;

        children.push(TreeNode {
            id: format!("{node_id}_age{age}"),
            name: format!("Age {}-{}", age - 1, age),
            node_type: NodeType::AgeBin,
            value: row.num_unique_hadms,
            details: None,
            children: None,
            collapsed: Some(true),
        });
    }
    Ok(children)
}

/// Children of an `age_bin` node: one leaf `lab_item` per observation row
/// for that (CE status, age bin), in source-file order. No rows means an
/// empty list, not an error.
pub fn expand_age_bin(node_id: &str, obs: &[ObservationRow]) -> Result<Vec<TreeNode>, ApiError> {
    let (ce, age) = parse_age_bin_id(node_id)
        .ok_or_else(|| ApiError::NotFound(format!("unrecognized age_bin id '{node_id}'")))?;

    let mut children = Vec::new();
    for row in obs
        .iter()
        .filter(|r| r.key.ce_status == ce && r.key.age_bin == age)
    {
        let Some(item) = row.key.lab_item else {
            continue;
        };
        children.push(TreeNode {
            id: format!("{node_id}_lab{item}"),
            name: format!("Lab {item}"),
            node_type: NodeType::LabItem,
            value: row.num_assay_obs,
            details: None,
            children: None,
            collapsed: None,
        });
    }
    Ok(children)
}

/// Age-bin ids look like `hasCE_age5`: CE status, `_`, `age` plus the bin
/// number. Trailing segments are not expected at this level.
fn parse_age_bin_id(node_id: &str) -> Option<(CeStatus, u32)> {
    let mut parts = node_id.split('_');
    let ce = CeStatus::parse(parts.next()?)?;
    let age = parts.next()?.strip_prefix("age")?.parse().ok()?;
    Some((ce, age))
}
