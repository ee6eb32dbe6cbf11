// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use fieldcost_app::{CostSheet, OperationId, SheetDocument};
use std::fs;
use std::path::Path;
use tracing::info;

/// In-memory owner of the authoritative sheet. Commits apply immediately and
/// the last one wins.
pub struct SheetRuntime {
    sheet: CostSheet,
}

impl SheetRuntime {
    pub fn new(sheet: CostSheet) -> Self {
        Self { sheet }
    }

    #[cfg(test)]
    pub fn sheet(&self) -> &CostSheet {
        &self.sheet
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.sheet.locked {
            bail!("sheet {:?} is locked", self.sheet.field_name);
        }
        Ok(())
    }
}

pub fn load_sheet_file(path: &Path) -> Result<CostSheet> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read sheet file {}", path.display()))?;
    let document: SheetDocument = toml::from_str(&raw)
        .with_context(|| format!("parse sheet TOML {}", path.display()))?;
    CostSheet::from_document(document).with_context(|| format!("invalid sheet {}", path.display()))
}

impl fieldcost_tui::AppRuntime for SheetRuntime {
    fn load_sheet(&mut self) -> Result<CostSheet> {
        Ok(self.sheet.clone())
    }

    fn update_cost(&mut self, id: OperationId, value: f64) -> Result<()> {
        self.ensure_unlocked()?;
        let previous = self
            .sheet
            .set_cost_per_ha(id, value)
            .with_context(|| format!("update cost of operation {id}"))?;
        info!(operation = %id, previous, value, "cost per ha updated");
        Ok(())
    }

    fn delete_operation(&mut self, id: OperationId) -> Result<()> {
        self.ensure_unlocked()?;
        let removed = self
            .sheet
            .remove(id)
            .with_context(|| format!("delete operation {id}"))?;
        info!(operation = %id, name = %removed.name, "operation removed");
        Ok(())
    }
}
