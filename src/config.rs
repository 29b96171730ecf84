//! Query configuration: keyword lists, thresholds and quantity names.
//!
//! Every field has a built-in default, so a config file only needs the
//! entries it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::KeywordCategories;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Categories used to classify the wall hosting a door.
    pub wall_types: KeywordCategories,
    /// Name keywords marking a parapet channel.
    pub parapet_keywords: Vec<String>,
    /// Installation height window for parapet channels, in metres.
    pub parapet_height_min: f64,
    pub parapet_height_max: f64,
    /// Entity types searched for parapet channels.
    pub parapet_element_types: Vec<String>,
    /// Pipe name keywords marking drinking water lines.
    pub drinking_water_keywords: Vec<String>,
    /// Property name fragments that hold an installation height.
    pub height_property_keywords: Vec<String>,
    pub length_quantity_names: Vec<String>,
    pub length_property_names: Vec<String>,
    pub area_quantity_names: Vec<String>,
    pub area_property_names: Vec<String>,
    /// Entity types counted as maintainable devices.
    pub maintainable_types: Vec<String>,
    /// Label for doors without a host wall.
    pub no_host_label: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            wall_types: KeywordCategories::wall_types(),
            parapet_keywords: strings(&[
                "brüstungskanal",
                "bruestungskanal",
                "brüstung",
                "parapet",
                "parapet channel",
                "parapet canal",
                "parapet cable",
            ]),
            parapet_height_min: 0.8,
            parapet_height_max: 1.3,
            parapet_element_types: strings(&[
                "IFCCABLECARRIERSEGMENT",
                "IFCCABLESEGMENT",
                "IFCBUILDINGELEMENTPROXY",
                "IFCFLOWSEGMENT",
            ]),
            drinking_water_keywords: strings(&[
                "edelstahl",
                "kupfer",
                "trinkwasser",
                "potable",
                "drinking",
            ]),
            height_property_keywords: strings(&["height", "höhe", "elevation", "level"]),
            length_quantity_names: strings(&[
                "Length",
                "NominalLength",
                "TotalLength",
                "GrossLength",
                "NetLength",
            ]),
            length_property_names: strings(&["Length", "NominalLength", "TotalLength"]),
            area_quantity_names: strings(&[
                "Area",
                "NetArea",
                "GrossArea",
                "TotalArea",
                "NetSideArea",
            ]),
            area_property_names: strings(&["Area", "NetArea", "GrossArea"]),
            maintainable_types: strings(&[
                "IFCELECTRICDISTRIBUTIONBOARD",
                "IFCVALVE",
                "IFCPUMP",
                "IFCFAN",
                "IFCBOILER",
                "IFCCHILLER",
                "IFCFILTER",
                "IFCSENSOR",
                "IFCACTUATOR",
                "IFCALARM",
            ]),
            no_host_label: "No wall".to_string(),
        }
    }
}

impl QueryConfig {
    /// Reads a JSON config file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded query config");
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Whether a height lies in the parapet window, bounds included.
    #[must_use]
    pub fn is_parapet_height(&self, height: f64) -> bool {
        (self.parapet_height_min..=self.parapet_height_max).contains(&height)
    }
}
