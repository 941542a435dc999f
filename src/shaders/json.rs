use serde::{Deserialize, Serialize};

mod stages;
pub use stages::*;

mod vertex_input;
pub use vertex_input::*;

mod descriptors;
pub use descriptors::*;

mod push_constants;
pub use push_constants::*;

mod specialization;
pub use specialization::*;

/// one member of a uniform, buffer or push constant block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderVariable {
    pub name: String,
    pub glsl_type: String,
    pub size: u32,
    pub offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub array_length: Option<ArrayLength>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "count", rename_all = "camelCase")]
pub enum ArrayLength {
    Fixed(u32),
    /// a trailing 'name[]' in a storage buffer
    Runtime,
}
