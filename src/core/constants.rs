//! System constants and configuration defaults.

use crate::core::types::*;

/// Number of payload bits carried by each byte of a variable-length code.
pub const VARINT_PAYLOAD_BITS: u32 = 7;

/// Mask selecting the payload bits of an encoded byte.
pub const VARINT_PAYLOAD_MASK: u8 = 0x7f;

/// High bit set on every encoded byte except the last one of a code.
pub const VARINT_CONTINUATION_BIT: u8 = 0x80;

/// Longest encoding of a `u64` (ceil(64 / 7)).
pub const VARINT_MAX_BYTES: usize = 10;

/// Number of outgoing edges of every interior node.
pub const EDGES_PER_INTERIOR_NODE: usize = 2;

/// Default upper bound on refinement passes over a model.
pub const DEFAULT_MAX_REFINE_ITERATIONS: usize = 10;

/// Default absolute tolerance when comparing lowered and direct numeric outputs.
pub const DEFAULT_EQUIVALENCE_TOLERANCE: f64 = 1e-9;

/// Default number of threads for batch evaluation.
/// 0 means use all available cores.
pub const DEFAULT_NUM_THREADS: usize = 0;

/// Default verbosity level for logging.
pub const DEFAULT_VERBOSITY: VerbosityLevel = VerbosityLevel::Info;

/// Prefix of environment variables read by `Config::load_from_environment`.
pub const ENV_PREFIX: &str = "FOREST_LOWER_";

/// Name of the aggregate output port of a forest node.
pub const OUTPUT_PORT_NAME: &str = "output";

/// Name of the per-tree output port of a forest node.
pub const TREE_OUTPUTS_PORT_NAME: &str = "treeOutputs";

/// Name of the edge-indicator output port of a forest node.
pub const EDGE_INDICATOR_PORT_NAME: &str = "edgeIndicatorVector";

/// Crate version string.
pub const FOREST_LOWER_VERSION: &str = env!("CARGO_PKG_VERSION");
