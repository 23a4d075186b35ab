//! Reconstructions available for review and where their assets live.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScriptError};

/// Slice count assumed when a dataset does not state one.
pub const DEFAULT_MAX_INDEX: u32 = 50;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    #[serde(default)]
    pub max_index: Option<u32>,
    /// Whether a Ground Truth reconstruction exists next to the prediction.
    #[serde(default, alias = "has_ground_truth")]
    pub ground_truth: bool,
}

/// How a dataset is shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Ground Truth and Predicted side by side.
    Comparison,
    /// Only the experiment reconstruction.
    Single,
}

impl Dataset {
    fn new(id: &str, max_index: Option<u32>, ground_truth: bool) -> Self {
        Dataset {
            id: id.to_string(),
            max_index,
            ground_truth,
        }
    }

    pub fn label(&self) -> String {
        format!("Pig {}", self.id)
    }

    pub fn max_index(&self) -> u32 {
        self.max_index.filter(|&m| m > 0).unwrap_or(DEFAULT_MAX_INDEX)
    }

    pub fn layout(&self) -> Layout {
        if self.ground_truth {
            Layout::Comparison
        } else {
            Layout::Single
        }
    }

    /// Slider values run from 1 to `max_index`.
    pub fn clamp_index(&self, index: u32) -> u32 {
        index.clamp(1, self.max_index())
    }

    pub fn paths(&self, base: &str) -> DatasetPaths {
        DatasetPaths {
            root: format!("{}/data/newImages/{}", base.trim_end_matches('/'), self.id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub datasets: Vec<Dataset>,
}

impl Default for Catalog {
    fn default() -> Self {
        const WITH_GROUND_TRUTH: [(&str, u32); 7] = [
            ("2020-09-24--21-21-07_stacked", 84),
            ("2020-10-13--21-09-50_vol1", 68),
            ("2020-10-13--21-09-50_vol2", 68),
            ("2020-10-20--21-13-12_stacked", 69),
            ("2021-03-18--20-28-33_stacked", 85),
            ("2021-05-04--20-56-25_vol2", 55),
            ("phantom-5-2", 73),
        ];
        const PREDICTION_ONLY: [&str; 6] = [
            "2022-09-20--20-24-20",
            "2022-10-06--20-13-38",
            "2022-11-10--21-20-31",
            "2022-11-10--21-25-57",
            "2023-01-19--22-49-09",
            "2023-02-09--21-11-23",
        ];
        let mut datasets: Vec<Dataset> = WITH_GROUND_TRUTH
            .iter()
            .map(|&(id, max)| Dataset::new(id, Some(max), true))
            .collect();
        datasets.extend(PREDICTION_ONLY.iter().map(|id| Dataset::new(id, None, false)));
        Catalog { datasets }
    }
}

impl Catalog {
    pub fn from_json(text: &str) -> Result<Self> {
        let catalog: Catalog =
            serde_json::from_str(text).map_err(|e| ScriptError::Catalog(e.to_string()))?;
        if catalog.datasets.is_empty() {
            return Err(ScriptError::Catalog("no datasets listed".into()));
        }
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.id == id)
    }

    /// `id` if it is listed, else the first dataset.
    pub fn get_or_first(&self, id: Option<&str>) -> Option<&Dataset> {
        id.and_then(|id| self.get(id)).or_else(|| self.datasets.first())
    }
}

/// Asset URLs of one dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetPaths {
    root: String,
}

impl DatasetPaths {
    pub fn ground_truth(&self) -> String {
        format!("{}/gt.html", self.root)
    }

    pub fn predicted(&self) -> String {
        format!("{}/pred_aug.html", self.root)
    }

    pub fn experiment(&self) -> String {
        format!("{}/experiment.html", self.root)
    }

    pub fn slice_image(&self, index: u32) -> String {
        format!("{}/frames/{}.png", self.root, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_splits_layouts() {
        let c = Catalog::default();
        assert_eq!(c.datasets.len(), 13);
        let first = c.get("2020-09-24--21-21-07_stacked").unwrap();
        assert_eq!(first.layout(), Layout::Comparison);
        assert_eq!(first.max_index(), 84);
        let later = c.get("2023-02-09--21-11-23").unwrap();
        assert_eq!(later.layout(), Layout::Single);
        assert_eq!(later.max_index(), DEFAULT_MAX_INDEX);
    }

    #[test]
    fn paths_follow_asset_layout() {
        let d = Catalog::default().datasets[6].clone();
        let p = d.paths("/robotrac/");
        assert_eq!(p.ground_truth(), "/robotrac/data/newImages/phantom-5-2/gt.html");
        assert_eq!(p.predicted(), "/robotrac/data/newImages/phantom-5-2/pred_aug.html");
        assert_eq!(p.slice_image(12), "/robotrac/data/newImages/phantom-5-2/frames/12.png");
        assert_eq!(d.label(), "Pig phantom-5-2");
    }

    #[test]
    fn slider_index_is_clamped() {
        let d = Dataset::new("x", Some(10), true);
        assert_eq!(d.clamp_index(0), 1);
        assert_eq!(d.clamp_index(11), 10);
        assert_eq!(Dataset::new("y", Some(0), false).max_index(), DEFAULT_MAX_INDEX);
    }

    #[test]
    fn json_catalog_defaults_missing_fields() {
        let c = Catalog::from_json(r#"{ "datasets": [ { "id": "phantom-9" } ] }"#).unwrap();
        assert_eq!(c.datasets[0].max_index(), DEFAULT_MAX_INDEX);
        assert!(!c.datasets[0].ground_truth);
        assert!(Catalog::from_json(r#"{ "datasets": [] }"#).is_err());
        assert!(Catalog::from_json("not json").is_err());
    }

    #[test]
    fn ground_truth_flag_accepts_both_names() {
        let c = Catalog::from_json(
            r#"{ "datasets": [
                { "id": "a", "ground_truth": true },
                { "id": "b", "has_ground_truth": true, "max_index": 12 }
            ] }"#,
        )
        .unwrap();
        assert!(c.datasets.iter().all(|d| d.layout() == Layout::Comparison));
        assert_eq!(c.get("b").unwrap().max_index(), 12);
    }

    #[test]
    fn unknown_id_falls_back_to_first() {
        let c = Catalog::default();
        assert_eq!(c.get_or_first(Some("nope")).unwrap().id, c.datasets[0].id);
        assert_eq!(c.get_or_first(Some("phantom-5-2")).unwrap().id, "phantom-5-2");
    }
}
