// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::ids::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub name: String,
    pub cost_per_ha: f64,
    pub sub_operations: Vec<Operation>,
}

impl Operation {
    pub fn is_group(&self) -> bool {
        !self.sub_operations.is_empty()
    }

    /// A group costs the sum of its sub-operations; a leaf costs its own rate.
    pub fn effective_cost_per_ha(&self) -> f64 {
        if self.is_group() {
            self.sub_operations
                .iter()
                .map(Operation::effective_cost_per_ha)
                .sum()
        } else {
            self.cost_per_ha
        }
    }

    fn find(&self, id: OperationId) -> Option<&Operation> {
        if self.id == id {
            return Some(self);
        }
        self.sub_operations.iter().find_map(|child| child.find(id))
    }

    fn find_mut(&mut self, id: OperationId) -> Option<&mut Operation> {
        if self.id == id {
            return Some(self);
        }
        self.sub_operations
            .iter_mut()
            .find_map(|child| child.find_mut(id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSheet {
    pub field_name: String,
    pub area_ha: f64,
    pub locked: bool,
    pub operations: Vec<Operation>,
}

impl CostSheet {
    pub fn find(&self, id: OperationId) -> Option<&Operation> {
        self.operations.iter().find_map(|op| op.find(id))
    }

    pub fn total_cost(&self, operation: &Operation) -> f64 {
        operation.effective_cost_per_ha() * self.area_ha
    }

    pub fn sheet_cost_per_ha(&self) -> f64 {
        self.operations
            .iter()
            .map(Operation::effective_cost_per_ha)
            .sum()
    }

    pub fn sheet_total(&self) -> f64 {
        self.sheet_cost_per_ha() * self.area_ha
    }

    /// Replaces a leaf operation's rate and returns the previous one.
    pub fn set_cost_per_ha(&mut self, id: OperationId, value: f64) -> Result<f64> {
        if !value.is_finite() || value < 0.0 {
            bail!("cost per ha for operation {id} must be a non-negative number, got {value}");
        }
        let operation = self
            .operations
            .iter_mut()
            .find_map(|op| op.find_mut(id))
            .ok_or_else(|| anyhow!("operation {id} not found"))?;
        if operation.is_group() {
            bail!(
                "operation {id} ({}) is a group; edit its sub-operations instead",
                operation.name
            );
        }
        Ok(std::mem::replace(&mut operation.cost_per_ha, value))
    }

    pub fn remove(&mut self, id: OperationId) -> Result<Operation> {
        remove_from(&mut self.operations, id).ok_or_else(|| anyhow!("operation {id} not found"))
    }

    pub fn operation_count(&self) -> usize {
        fn count(ops: &[Operation]) -> usize {
            ops.iter()
                .map(|op| 1 + count(&op.sub_operations))
                .sum()
        }
        count(&self.operations)
    }

    pub fn from_document(document: SheetDocument) -> Result<Self> {
        if document.field.trim().is_empty() {
            bail!("sheet field name is required -- set `field = \"...\"` and retry");
        }
        if !document.area_ha.is_finite() || document.area_ha <= 0.0 {
            bail!(
                "sheet area_ha must be a positive number, got {}",
                document.area_ha
            );
        }

        let mut next_id = 1_i64;
        let operations = document
            .operations
            .into_iter()
            .map(|op| build_operation(op, &mut next_id))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            field_name: document.field,
            area_ha: document.area_ha,
            locked: document.locked,
            operations,
        })
    }
}

fn remove_from(operations: &mut Vec<Operation>, id: OperationId) -> Option<Operation> {
    if let Some(index) = operations.iter().position(|op| op.id == id) {
        return Some(operations.remove(index));
    }
    operations
        .iter_mut()
        .find_map(|op| remove_from(&mut op.sub_operations, id))
}

fn build_operation(document: OperationDocument, next_id: &mut i64) -> Result<Operation> {
    let name = document.name.trim().to_owned();
    if name.is_empty() {
        bail!("operation name is required -- every [[operations]] entry needs `name`");
    }
    if !document.cost_per_ha.is_finite() || document.cost_per_ha < 0.0 {
        bail!(
            "operation {name:?} has cost_per_ha {}; costs must be non-negative numbers",
            document.cost_per_ha
        );
    }

    let id = OperationId::new(*next_id);
    *next_id += 1;
    let sub_operations = document
        .sub_operations
        .into_iter()
        .map(|child| build_operation(child, next_id))
        .collect::<Result<Vec<_>>>()?;

    Ok(Operation {
        id,
        name,
        cost_per_ha: document.cost_per_ha,
        sub_operations,
    })
}

/// On-disk shape of a cost sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetDocument {
    pub field: String,
    pub area_ha: f64,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub operations: Vec<OperationDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDocument {
    pub name: String,
    #[serde(default)]
    pub cost_per_ha: f64,
    #[serde(default)]
    pub sub_operations: Vec<OperationDocument>,
}
