use ash::vk;
use serde::{Deserialize, Serialize};

// color formats are also used to describe non-color vectors of 1-4 components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexFormat {
    R32Sint,
    R32Uint,
    R32Sfloat,
    R32G32Sint,
    R32G32Uint,
    R32G32Sfloat,
    R32G32B32Sint,
    R32G32B32Uint,
    R32G32B32Sfloat,
    R32G32B32A32Sint,
    R32G32B32A32Uint,
    R32G32B32A32Sfloat,
}

impl VertexFormat {
    pub fn to_vk(self) -> vk::Format {
        match self {
            Self::R32Sint => vk::Format::R32_SINT,
            Self::R32Uint => vk::Format::R32_UINT,
            Self::R32Sfloat => vk::Format::R32_SFLOAT,
            Self::R32G32Sint => vk::Format::R32G32_SINT,
            Self::R32G32Uint => vk::Format::R32G32_UINT,
            Self::R32G32Sfloat => vk::Format::R32G32_SFLOAT,
            Self::R32G32B32Sint => vk::Format::R32G32B32_SINT,
            Self::R32G32B32Uint => vk::Format::R32G32B32_UINT,
            Self::R32G32B32Sfloat => vk::Format::R32G32B32_SFLOAT,
            Self::R32G32B32A32Sint => vk::Format::R32G32B32A32_SINT,
            Self::R32G32B32A32Uint => vk::Format::R32G32B32A32_UINT,
            Self::R32G32B32A32Sfloat => vk::Format::R32G32B32A32_SFLOAT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputRate {
    Vertex,
    Instance,
}

impl InputRate {
    pub fn to_vk(self) -> vk::VertexInputRate {
        match self {
            Self::Vertex => vk::VertexInputRate::VERTEX,
            Self::Instance => vk::VertexInputRate::INSTANCE,
        }
    }
}

/// one vertex attribute slot
///
/// every input reads from its own buffer binding, numbered after its first location.
/// a matrix input repeats its binding and stride for each column slot,
/// with location = binding + slot and offset = slot * column size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexInputDescriptor {
    pub name: String,
    pub glsl_type: String,
    pub binding: u32,
    pub location: u32,
    pub input_rate: InputRate,
    pub stride: u32,
    pub format: VertexFormat,
    pub offset: u32,
}

impl VertexInputDescriptor {
    /// the first slot of its input; the one that declares the binding
    pub fn is_primary_slot(&self) -> bool {
        self.location == self.binding
    }

    pub fn to_vk(&self) -> vk::VertexInputAttributeDescription {
        vk::VertexInputAttributeDescription::default()
            .binding(self.binding)
            .location(self.location)
            .format(self.format.to_vk())
            .offset(self.offset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexBindingDescription {
    pub binding: u32,
    pub stride: u32,
    pub input_rate: InputRate,
}

impl VertexBindingDescription {
    pub fn to_vk(&self) -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription::default()
            .binding(self.binding)
            .stride(self.stride)
            .input_rate(self.input_rate.to_vk())
    }
}

/// binding descriptions for a list of attributes, one per logical input
pub fn vertex_binding_descriptions(
    inputs: &[VertexInputDescriptor],
) -> Vec<VertexBindingDescription> {
    inputs
        .iter()
        .filter(|input| input.is_primary_slot())
        .map(|input| VertexBindingDescription {
            binding: input.binding,
            stride: input.stride,
            input_rate: input.input_rate,
        })
        .collect()
}
