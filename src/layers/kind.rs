use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::error::NetError;

/// What role a layer plays in the chain; governs which connections are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Input,
    #[default]
    Normal,
    Convolution,
    AveragePool,
}

impl LayerKind {
    /// Kinds that may be laid out as a 2-D grid (`rows > 1`).
    pub fn is_two_dimensional(&self) -> bool {
        !matches!(self, LayerKind::Normal)
    }

    /// Kinds whose units may be addressed with from-subsets.
    pub fn accepts_subsets(&self) -> bool {
        matches!(self, LayerKind::Normal | LayerKind::Input)
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerKind::Input => "input",
            LayerKind::Normal => "normal",
            LayerKind::Convolution => "convolution",
            LayerKind::AveragePool => "average_pool",
        };
        f.write_str(name)
    }
}

impl FromStr for LayerKind {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(LayerKind::Input),
            "normal" => Ok(LayerKind::Normal),
            "convolution" => Ok(LayerKind::Convolution),
            "average_pool" => Ok(LayerKind::AveragePool),
            other => Err(NetError::UnknownLayerKind(other.to_string())),
        }
    }
}
