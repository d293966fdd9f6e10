use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    collections::{BTreeMap, HashMap},
    fmt, fs,
    path::Path,
};
use tracing::{debug, warn};

use super::flatten::FlatTable;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex should compile"));
static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w]").expect("non-word regex should compile"));

static BUILTIN_YAML: &str = include_str!("column_map.yaml");

static BUILTIN: Lazy<NameMap> = Lazy::new(|| {
    NameMap::from_yaml_str(BUILTIN_YAML).expect("embedded column_map.yaml should be valid")
});

/// Canonicalize a header:
/// 1) trim, 2) whitespace runs -> `_`, 3) drop anything but letters/digits/`_`, 4) lowercase.
pub fn normalize_column_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let underscored = WHITESPACE_RUN.replace_all(trimmed, "_");
    let stripped = NON_WORD.replace_all(&underscored, "");
    stripped.to_lowercase()
}

/// Output vocabulary of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BusinessColumn {
    Rank,
    Company,
    Industry,
    RevenueUsdMillion,
    ProfitUsdMillion,
    Employees,
    Headquarters,
    StateOwned,
    Reference,
    /// Unmapped column, kept under its normalized name.
    Other(String),
}

/// How the cells of a column get coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellRole {
    Rank,
    Text,
    Reference,
    Numeric,
    Passthrough,
}

impl BusinessColumn {
    pub fn from_name(name: &str) -> Self {
        match name {
            "rank" => Self::Rank,
            "company" => Self::Company,
            "industry" => Self::Industry,
            "revenue_usd_million" => Self::RevenueUsdMillion,
            "profit_usd_million" => Self::ProfitUsdMillion,
            "employees" => Self::Employees,
            "headquarters" => Self::Headquarters,
            "state_owned" => Self::StateOwned,
            "reference" => Self::Reference,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Rank => "rank",
            Self::Company => "company",
            Self::Industry => "industry",
            Self::RevenueUsdMillion => "revenue_usd_million",
            Self::ProfitUsdMillion => "profit_usd_million",
            Self::Employees => "employees",
            Self::Headquarters => "headquarters",
            Self::StateOwned => "state_owned",
            Self::Reference => "reference",
            Self::Other(name) => name,
        }
    }

    pub fn role(&self) -> CellRole {
        match self {
            Self::Rank => CellRole::Rank,
            Self::Company | Self::Industry | Self::Headquarters => CellRole::Text,
            Self::Reference => CellRole::Reference,
            Self::RevenueUsdMillion | Self::ProfitUsdMillion | Self::Employees => {
                CellRole::Numeric
            }
            Self::StateOwned | Self::Other(_) => CellRole::Passthrough,
        }
    }
}

impl fmt::Display for BusinessColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static lookup of normalized header variants to business column names.
#[derive(Debug, Clone, Default)]
pub struct NameMap {
    variants: HashMap<String, String>,
}

impl NameMap {
    /// The table shipped with the crate (`column_map.yaml`).
    pub fn builtin() -> &'static NameMap {
        &BUILTIN
    }

    /// Parse a `target: [variant, ...]` YAML document.
    ///
    /// Variants are normalized on load. A variant listed under two targets is an error.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let groups: BTreeMap<String, Vec<String>> =
            serde_yaml::from_str(yaml).context("parsing column map YAML")?;

        let mut variants = HashMap::new();
        for (target, raw_names) in groups {
            let target = normalize_column_name(&target);
            for raw in raw_names {
                let key = normalize_column_name(&raw);
                if key.is_empty() {
                    bail!("column map entry {:?} under {:?} normalizes to nothing", raw, target);
                }
                if let Some(prev) = variants.insert(key.clone(), target.clone()) {
                    if prev != target {
                        bail!("variant {:?} maps to both {:?} and {:?}", key, prev, target);
                    }
                }
            }
        }
        Ok(Self { variants })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading column map {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("in column map {}", path.display()))
    }

    /// Layer `other` on top of `self`; entries in `other` win.
    pub fn merged_with(&self, other: &NameMap) -> NameMap {
        let mut variants = self.variants.clone();
        variants.extend(other.variants.iter().map(|(k, v)| (k.clone(), v.clone())));
        NameMap { variants }
    }

    /// Target name for a canonical header, or the header itself when unmapped.
    pub fn lookup<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.variants
            .get(canonical)
            .map(String::as_str)
            .unwrap_or(canonical)
    }

    pub fn resolve(&self, canonical: &str) -> BusinessColumn {
        BusinessColumn::from_name(self.lookup(canonical))
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappedColumn {
    pub name: BusinessColumn,
    pub cells: Vec<Option<String>>,
}

/// Stage 2: normalize every header and map it onto the business vocabulary.
///
/// Two columns resolving to the same name: the later one's cells replace the
/// earlier one's, at the earlier column's position.
pub fn map_columns(flat: FlatTable, names: &NameMap) -> Vec<MappedColumn> {
    let mut out: Vec<MappedColumn> = Vec::with_capacity(flat.labels.len());
    let mut position: HashMap<BusinessColumn, usize> = HashMap::new();

    for (label, cells) in flat.labels.into_iter().zip(flat.columns) {
        let canonical = normalize_column_name(&label);
        let name = names.resolve(&canonical);
        debug!(raw = %label, canonical = %canonical, mapped = %name, "header");

        match position.get(&name) {
            Some(&idx) => {
                warn!(raw = %label, column = %name, "duplicate column name; later column replaces earlier");
                out[idx].cells = cells;
            }
            None => {
                position.insert(name.clone(), out.len());
                out.push(MappedColumn { name, cells });
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_steps() {
        assert_eq!(normalize_column_name("  Revenue (USD millions) "), "revenue_usd_millions");
        assert_eq!(normalize_column_name("Headquarters[note 1]"), "headquartersnote_1");
        assert_eq!(normalize_column_name("State-owned"), "stateowned");
        assert_eq!(normalize_column_name("Unnamed: 4"), "unnamed_4");
        assert_eq!(normalize_column_name("Name\t\n Name"), "name_name");
        assert_eq!(normalize_column_name(""), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            "Rank Rank",
            "  Revenue (USD millions) ",
            "Profit (USD in millions)",
            "Headquarters[note 1] Headquarters[note 1]",
            "Employees\u{a0}Employees",
            "Ref.",
            "Société Générale",
            "İstanbul HQ",
            "___",
            "a  -  b",
            "Unnamed: 4_level_1",
            "",
        ];
        for s in samples {
            let once = normalize_column_name(s);
            assert_eq!(normalize_column_name(&once), once, "input {:?}", s);
        }
    }

    #[test]
    fn builtin_maps_known_variants() {
        let names = NameMap::builtin();
        let cases = [
            ("ranks_ranks", BusinessColumn::Rank),
            ("ranks", BusinessColumn::Rank),
            ("rank_rank", BusinessColumn::Rank),
            ("name_name", BusinessColumn::Company),
            ("name", BusinessColumn::Company),
            ("industry_industry", BusinessColumn::Industry),
            ("revenue_usd_in_millions", BusinessColumn::RevenueUsdMillion),
            ("revenue_musd", BusinessColumn::RevenueUsdMillion),
            ("revenue_usd_millions", BusinessColumn::RevenueUsdMillion),
            ("profit_usd_in_millions", BusinessColumn::ProfitUsdMillion),
            ("employees_employees", BusinessColumn::Employees),
            ("headquartersnote_1_headquartersnote_1", BusinessColumn::Headquarters),
            ("stateowned_stateowned", BusinessColumn::StateOwned),
            ("state_owned", BusinessColumn::StateOwned),
            ("ref_ref", BusinessColumn::Reference),
            ("ref", BusinessColumn::Reference),
        ];
        for (raw, expected) in cases {
            assert_eq!(names.resolve(raw), expected, "variant {:?}", raw);
            // same answer every time
            assert_eq!(names.resolve(raw), expected);
        }
    }

    #[test]
    fn unmapped_passes_through() {
        let names = NameMap::builtin();
        assert_eq!(
            names.resolve("market_cap"),
            BusinessColumn::Other("market_cap".to_string())
        );
        assert_eq!(names.lookup("market_cap"), "market_cap");
    }

    #[test]
    fn yaml_variants_are_normalized() -> Result<()> {
        let names = NameMap::from_yaml_str("revenue_usd_million:\n  - \"Turnover (US$ m)\"\n")?;
        assert_eq!(names.len(), 1);
        assert_eq!(names.resolve("turnover_us_m"), BusinessColumn::RevenueUsdMillion);
        Ok(())
    }

    #[test]
    fn yaml_conflicting_variant_rejected() {
        let err = NameMap::from_yaml_str("rank:\n  - pos\ncompany:\n  - pos\n").unwrap_err();
        assert!(err.to_string().contains("pos"), "{err}");
    }

    #[test]
    fn merged_map_overrides_builtin() -> Result<()> {
        let extra = NameMap::from_yaml_str("company:\n  - firm\nindustry:\n  - name\n")?;
        let names = NameMap::builtin().merged_with(&extra);
        assert_eq!(names.resolve("firm"), BusinessColumn::Company);
        assert_eq!(names.resolve("name"), BusinessColumn::Industry);
        assert_eq!(names.resolve("ranks"), BusinessColumn::Rank);
        Ok(())
    }

    #[test]
    fn later_duplicate_overwrites_earlier_in_place() {
        let flat = FlatTable {
            labels: vec![
                "Ranks".to_string(),
                "Name".to_string(),
                "Rank Rank".to_string(),
            ],
            columns: vec![
                vec![Some("old".to_string())],
                vec![Some("Acme".to_string())],
                vec![Some("new".to_string())],
            ],
        };

        let mapped = map_columns(flat, NameMap::builtin());
        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped[0].name, BusinessColumn::Rank);
        assert_eq!(mapped[0].cells, vec![Some("new".to_string())]);
        assert_eq!(mapped[1].name, BusinessColumn::Company);
    }
}
