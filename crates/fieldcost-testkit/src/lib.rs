// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use fieldcost_app::{CostSheet, OperationDocument, SheetDocument};
use std::path::PathBuf;

const OPERATION_GROUPS: [&str; 5] = [
    "Cultivation",
    "Establishment",
    "Crop protection",
    "Nutrition",
    "Harvest",
];

const FIELD_NAMES: [&str; 14] = [
    "Long Acre",
    "Top Paddock",
    "Mill Field",
    "Church Close",
    "Bottom Meadow",
    "Windmill Hill",
    "Lower Ground",
    "Barn Field",
    "Home Field",
    "Oak Piece",
    "Brook Furlong",
    "Twelve Acres",
    "Far Leys",
    "Hanging Bank",
];

const FIELD_SUFFIXES: [&str; 4] = ["North", "South", "East", "West"];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

#[derive(Debug, Clone)]
pub struct FarmFaker {
    rng: DeterministicRng,
}

impl FarmFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    /// A leaf operation drawn from the group's catalogue, priced in whole pence.
    pub fn operation(&mut self, group: &str) -> OperationDocument {
        let options = operation_options(group);
        let (name, min_pence, max_pence) = if options.is_empty() {
            ("Contract work", 1_000, 10_000)
        } else {
            options[self.rng.int_n(options.len())]
        };

        OperationDocument {
            name: name.to_owned(),
            cost_per_ha: self.pence_between(min_pence, max_pence),
            sub_operations: Vec::new(),
        }
    }

    /// A group with two or three distinct sub-operations, or a lone leaf.
    pub fn operation_group(&mut self, group: &str) -> OperationDocument {
        if self.rng.bool() {
            return self.operation(group);
        }

        let wanted = 2 + self.rng.int_n(2);
        let mut sub_operations: Vec<OperationDocument> = Vec::with_capacity(wanted);
        for _ in 0..wanted * 4 {
            if sub_operations.len() == wanted {
                break;
            }
            let candidate = self.operation(group);
            if sub_operations.iter().all(|op| op.name != candidate.name) {
                sub_operations.push(candidate);
            }
        }

        OperationDocument {
            name: group.to_owned(),
            cost_per_ha: 0.0,
            sub_operations,
        }
    }

    pub fn sheet_document(&mut self) -> SheetDocument {
        let field = format!(
            "{} {}",
            self.pick(&FIELD_NAMES),
            self.pick(&FIELD_SUFFIXES)
        );
        let area_tenths = 5 + self.rng.int_n(400);
        let operations = OPERATION_GROUPS
            .iter()
            .map(|group| self.operation_group(group))
            .collect();

        SheetDocument {
            field,
            area_ha: area_tenths as f64 / 10.0,
            locked: false,
            operations,
        }
    }

    pub fn sheet(&mut self) -> Result<CostSheet> {
        CostSheet::from_document(self.sheet_document()).context("build fake cost sheet")
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn pence_between(&mut self, min: u32, max: u32) -> f64 {
        let span = u64::from(max.saturating_sub(min)) + 1;
        let pence = u64::from(min) + self.rng.next_u64() % span;
        pence as f64 / 100.0
    }
}

/// Fixed sheet used across crates: one expandable group and three leaves whose
/// rates (120.00, 50.00, 80.25) match the documented edit scenarios.
pub fn sample_sheet_document() -> SheetDocument {
    let leaf = |name: &str, cost_per_ha: f64| OperationDocument {
        name: name.to_owned(),
        cost_per_ha,
        sub_operations: Vec::new(),
    };

    SheetDocument {
        field: "Long Acre".to_owned(),
        area_ha: 10.0,
        locked: false,
        operations: vec![
            leaf("Ploughing", 120.0),
            leaf("Rolling", 50.0),
            OperationDocument {
                name: "Crop protection".to_owned(),
                cost_per_ha: 0.0,
                sub_operations: vec![leaf("Herbicide", 80.25), leaf("Fungicide", 35.0)],
            },
        ],
    }
}

pub fn sample_sheet() -> Result<CostSheet> {
    CostSheet::from_document(sample_sheet_document()).context("build sample cost sheet")
}

pub const SAMPLE_SHEET_TOML: &str = r#"field = "Long Acre"
area_ha = 10.0

[[operations]]
name = "Ploughing"
cost_per_ha = 120.0

[[operations]]
name = "Rolling"
cost_per_ha = 50.0

[[operations]]
name = "Crop protection"

[[operations.sub_operations]]
name = "Herbicide"
cost_per_ha = 80.25

[[operations.sub_operations]]
name = "Fungicide"
cost_per_ha = 35.0
"#;

/// Writes `contents` to `sheet.toml` inside a fresh temp dir; keep the dir alive.
pub fn write_temp_sheet(contents: &str) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("sheet.toml");
    std::fs::write(&path, contents)
        .with_context(|| format!("write temp sheet {}", path.display()))?;
    Ok((dir, path))
}

fn operation_options(group: &str) -> &'static [(&'static str, u32, u32)] {
    match group {
        "Cultivation" => &[
            ("Ploughing", 5_500, 9_000),
            ("Power harrowing", 3_500, 6_000),
            ("Subsoiling", 4_500, 7_500),
            ("Rolling", 1_200, 2_200),
        ],
        "Establishment" => &[
            ("Drilling", 3_000, 5_500),
            ("Seed", 5_000, 12_000),
            ("Broadcasting", 1_500, 2_500),
        ],
        "Crop protection" => &[
            ("Herbicide", 3_000, 9_000),
            ("Fungicide", 2_500, 8_000),
            ("Insecticide", 1_000, 3_500),
            ("Spraying pass", 1_000, 1_800),
        ],
        "Nutrition" => &[
            ("Nitrogen", 9_000, 18_000),
            ("Phosphate and potash", 4_000, 9_000),
            ("Lime", 2_000, 5_000),
            ("Spreading pass", 800, 1_500),
        ],
        "Harvest" => &[
            ("Combining", 8_000, 13_000),
            ("Baling", 3_000, 6_000),
            ("Haulage", 1_500, 3_500),
            ("Grain drying", 2_000, 6_000),
        ],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DeterministicRng, FarmFaker, OPERATION_GROUPS, SAMPLE_SHEET_TOML, sample_sheet,
        sample_sheet_document, write_temp_sheet,
    };
    use fieldcost_app::{CostSheet, SheetDocument};
    use std::collections::BTreeSet;

    #[test]
    fn new_deterministic_seed() {
        let mut left = FarmFaker::new(42);
        let mut right = FarmFaker::new(42);
        assert_eq!(left.sheet_document(), right.sheet_document());
    }

    #[test]
    fn operation_costs_stay_in_catalogue_range() {
        let mut faker = FarmFaker::new(3);
        for _ in 0..50 {
            let op = faker.operation("Harvest");
            assert!(!op.name.is_empty());
            assert!((8.0..=130.0).contains(&op.cost_per_ha), "{op:?}");
            assert!(op.sub_operations.is_empty());
        }
    }

    #[test]
    fn operation_unknown_group() {
        let mut faker = FarmFaker::new(5);
        let op = faker.operation("Unknown");
        assert_eq!(op.name, "Contract work");
        assert!(op.cost_per_ha >= 10.0);
    }

    #[test]
    fn groups_hold_distinct_sub_operations() {
        let mut found_group = false;
        for seed in 0_u64..40_u64 {
            let mut faker = FarmFaker::new(seed);
            let op = faker.operation_group("Crop protection");
            if op.sub_operations.is_empty() {
                continue;
            }
            found_group = true;
            assert_eq!(op.name, "Crop protection");
            let names = op
                .sub_operations
                .iter()
                .map(|child| child.name.clone())
                .collect::<BTreeSet<_>>();
            assert_eq!(names.len(), op.sub_operations.len());
        }
        assert!(found_group);
    }

    #[test]
    fn fake_sheet_is_valid() {
        for seed in 0_u64..20_u64 {
            let mut faker = FarmFaker::new(seed);
            let sheet = faker.sheet().expect("fake sheet validates");
            assert_eq!(sheet.operations.len(), OPERATION_GROUPS.len());
            assert!(sheet.area_ha > 0.0);
        }
    }

    #[test]
    fn variety_across_seeds() {
        let mut fields = BTreeSet::new();
        for seed in 0_u64..20_u64 {
            let mut faker = FarmFaker::new(seed);
            fields.insert(faker.sheet_document().field);
        }
        assert!(fields.len() >= 8, "got {}", fields.len());
    }

    #[test]
    fn sample_toml_matches_sample_document() {
        let parsed: SheetDocument = toml::from_str(SAMPLE_SHEET_TOML).expect("sample TOML");
        assert_eq!(parsed, sample_sheet_document());
    }

    #[test]
    fn sample_sheet_builds() {
        let sheet = sample_sheet().expect("sample sheet");
        assert_eq!(sheet.operation_count(), 5);
    }

    #[test]
    fn temp_sheet_round_trips_through_disk() {
        let (_dir, path) = write_temp_sheet(SAMPLE_SHEET_TOML).expect("write temp sheet");
        let raw = std::fs::read_to_string(&path).expect("read temp sheet");
        let document: SheetDocument = toml::from_str(&raw).expect("parse temp sheet");
        assert!(CostSheet::from_document(document).is_ok());
    }

    #[test]
    fn int_n_stays_below_bound() {
        let mut rng = DeterministicRng::new(42);
        assert_eq!(rng.int_n(1), 0);
        for _ in 0..100 {
            assert!(rng.int_n(5) < 5);
        }
    }
}
