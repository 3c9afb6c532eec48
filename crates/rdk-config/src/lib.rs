//! rdk-config
//!
//! Layered YAML run configuration.
//!
//! Documents are merged in order (later layers override earlier ones), the
//! merged tree is hashed over its canonical JSON form, and then decoded into a
//! typed [`RunPlan`].

mod layered;
mod plan;

pub use layered::{load_layered_yaml, load_layered_yaml_from_strings, LoadedConfig};
pub use plan::{EngineSpec, OutputSpec, RunPlan, TaskSpec};
