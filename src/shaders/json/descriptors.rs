use ash::vk;
use serde::{Deserialize, Serialize};

use super::{ShaderVariable, StageFlags};
use crate::shaders::error::{ReflectionError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DescriptorKind {
    UniformBuffer,
    StorageBuffer,
    CombinedImageSampler,
    UniformTexelBuffer,
    StorageImage,
}

impl DescriptorKind {
    /// the block keyword a buffer descriptor was declared with
    pub fn from_block_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "uniform" => Some(Self::UniformBuffer),
            "buffer" => Some(Self::StorageBuffer),
            _ => None,
        }
    }

    /// images, samplers and texel buffers have no linear byte size
    pub fn is_opaque(self) -> bool {
        !matches!(self, Self::UniformBuffer | Self::StorageBuffer)
    }

    pub fn to_vk(self) -> vk::DescriptorType {
        match self {
            Self::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
            Self::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
            Self::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            Self::UniformTexelBuffer => vk::DescriptorType::UNIFORM_TEXEL_BUFFER,
            Self::StorageImage => vk::DescriptorType::STORAGE_IMAGE,
        }
    }
}

/// one descriptor binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderUniform {
    pub name: String,
    pub binding: u32,
    pub descriptor_type: DescriptorKind,
    pub stage_flags: StageFlags,
    /// 0 for opaque descriptors
    pub size: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub fields: Vec<ShaderVariable>,
}

impl ShaderUniform {
    pub fn to_vk(&self) -> vk::DescriptorSetLayoutBinding<'static> {
        vk::DescriptorSetLayoutBinding::default()
            .binding(self.binding)
            .descriptor_type(self.descriptor_type.to_vk())
            .descriptor_count(1)
            .stage_flags(self.stage_flags.to_vk())
    }
}

/// the bindings of one descriptor set, in first-seen order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderUniformSet {
    pub set: u32,
    pub uniforms: Vec<ShaderUniform>,
}

impl ShaderUniformSet {
    pub fn new(set: u32) -> Self {
        Self {
            set,
            uniforms: vec![],
        }
    }

    pub fn uniform(&self, binding: u32) -> Option<&ShaderUniform> {
        self.uniforms.iter().find(|u| u.binding == binding)
    }

    /// total byte size of the set's buffers
    ///
    /// fails if the set holds an image, sampler or texel buffer
    ///
    /// u64 since several buffers near u32::MAX can share a set
    pub fn size(&self) -> Result<u64> {
        if self.uniforms.iter().any(|u| u.descriptor_type.is_opaque()) {
            return Err(ReflectionError::UnsizedSetQuery { set: self.set });
        }

        Ok(self.uniforms.iter().map(|u| u64::from(u.size)).sum())
    }

    /// adds a binding, or widens the stage flags of an identical one
    /// already declared by another stage
    pub fn merge(&mut self, uniform: ShaderUniform) -> Result<()> {
        let Some(existing) = self
            .uniforms
            .iter_mut()
            .find(|u| u.binding == uniform.binding)
        else {
            self.uniforms.push(uniform);
            return Ok(());
        };

        if existing.descriptor_type != uniform.descriptor_type || existing.size != uniform.size {
            return Err(ReflectionError::ConflictingBinding {
                set: self.set,
                binding: uniform.binding,
            });
        }

        existing.stage_flags |= uniform.stage_flags;

        Ok(())
    }

    pub fn to_vk(&self) -> Vec<vk::DescriptorSetLayoutBinding<'static>> {
        self.uniforms.iter().map(ShaderUniform::to_vk).collect()
    }
}
