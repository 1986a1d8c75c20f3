use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tsp_challenges::travelling_salesman::ClosingEdge;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub closing_edge: ClosingEdge,
    pub partition_depth: Option<usize>,
}

impl Config {
    pub fn initialize(hyperparameters: &Option<Map<String, Value>>) -> Result<Self> {
        let mut merged_params = serde_json::to_value(Self::default())?;
        if let (Value::Object(ref mut obj), Some(map)) = (&mut merged_params, hyperparameters) {
            for (k, v) in map {
                obj.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(merged_params).map_err(|e| anyhow!("Invalid hyperparameters: {}", e))
    }
}
