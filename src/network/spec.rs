use serde::{Serialize, Deserialize};
use std::ops::Range;
use tracing::info;

use crate::error::Result;
use crate::layers::config::LayerConfig;
use crate::network::network::Network;
use crate::tying::TiedBlock;

/// One `connect` call, by layer name.
///
/// Fields:
/// - `from`, `to`   — source layer and the layer above it
/// - `from_subset`  — optional `{start, end}` range of source units
/// - `to_subset`    — optional `{start, end}` range of target units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub from_subset: Option<Range<usize>>,
    #[serde(default)]
    pub to_subset: Option<Range<usize>>,
}

/// One `tie` call: equal-shaped blocks of `layer`'s outgoing weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieSpec {
    pub layer: String,
    pub blocks: Vec<TiedBlock>,
}

/// A fully serializable description of a network architecture.
///
/// `NetworkSpec` carries no weights; `build()` wires a fresh network with
/// randomly initialised weights. Connections are applied in order, so
/// repeated subset connections between the same pair accumulate, and ties
/// are applied after every connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name used in logs and as the model file stem.
    pub name: String,
    /// Seed for weight initialisation; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Layers in any order; the chain is defined by `connections`.
    pub layers: Vec<LayerConfig>,
    pub connections: Vec<ConnectionSpec>,
    #[serde(default)]
    pub ties: Vec<TieSpec>,
}

impl NetworkSpec {
    pub fn build(&self) -> Result<Network> {
        let mut network = match self.seed {
            Some(seed) => Network::with_seed(seed),
            None => Network::new(),
        };
        for layer in &self.layers {
            network.add_layer(layer.clone())?;
        }
        for c in &self.connections {
            let from = network.id_of(&c.from)?;
            let to = network.id_of(&c.to)?;
            network.connect(from, to, c.from_subset.clone(), c.to_subset.clone())?;
        }
        for tie in &self.ties {
            let layer = network.id_of(&tie.layer)?;
            network.tie(layer, tie.blocks.clone())?;
        }
        info!(
            name = %self.name,
            layers = self.layers.len(),
            connections = self.connections.len(),
            ties = self.ties.len(),
            "built network"
        );
        Ok(network)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetError;

    const EMBEDDING: &str = r#"{
        "name": "tiny",
        "seed": 11,
        "layers": [
            {"name": "input", "columns": 6, "kind": "input", "neuron": "linear"},
            {"name": "embedding", "columns": 4, "neuron": "linear"},
            {"name": "output", "columns": 3, "neuron": "softmax", "bias": 1.0}
        ],
        "connections": [
            {"from": "input", "to": "embedding", "from_subset": {"start": 0, "end": 3}, "to_subset": {"start": 0, "end": 2}},
            {"from": "input", "to": "embedding", "from_subset": {"start": 3, "end": 6}, "to_subset": {"start": 2, "end": 4}},
            {"from": "embedding", "to": "output"}
        ],
        "ties": [
            {"layer": "input", "blocks": [
                {"rows": {"start": 0, "end": 3}, "cols": {"start": 0, "end": 2}},
                {"rows": {"start": 3, "end": 6}, "cols": {"start": 2, "end": 4}}
            ]}
        ]
    }"#;

    #[test]
    fn builds_from_json() {
        let spec: NetworkSpec = serde_json::from_str(EMBEDDING).unwrap();
        let net = spec.build().unwrap();
        let input = net.id_of("input").unwrap();
        assert_eq!(net.layer(input).unwrap().mask().unwrap().count_nonzero(), 12);
        assert_eq!(net.layer(input).unwrap().tied_blocks().len(), 2);
        assert_eq!(net.output_layer(), Some(net.id_of("output").unwrap()));
        let embedding = net.layer(net.id_of("embedding").unwrap()).unwrap();
        assert_eq!(embedding.weights().unwrap().shape(), (5, 3));
    }

    #[test]
    fn unknown_layer_names_fail() {
        let mut spec: NetworkSpec = serde_json::from_str(EMBEDDING).unwrap();
        spec.connections[2].to = "nowhere".to_string();
        assert!(matches!(spec.build(), Err(NetError::UnknownLayer(_))));
    }

    #[test]
    fn json_file_round_trip() {
        let spec: NetworkSpec = serde_json::from_str(EMBEDDING).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.json");
        let path = path.to_str().unwrap();
        spec.save_json(path).unwrap();
        let loaded = NetworkSpec::load_json(path).unwrap();
        assert_eq!(loaded.connections, spec.connections);
        assert_eq!(loaded.ties, spec.ties);
        assert_eq!(loaded.layers.len(), 3);
        assert_eq!(loaded.layers[2].bias, Some(1.0));
    }
}
