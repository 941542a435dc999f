use std::collections::HashMap;

use ash::vk;
use serde::{Deserialize, Serialize};

use crate::shaders::error::{ReflectionError, Result};
use crate::shaders::types::ScalarType;

/// a `layout(constant_id = N) const <type> <name> = ...;` declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecializationConstant {
    pub constant_id: u32,
    pub name: String,
    pub glsl_type: String,
    pub scalar_type: ScalarType,
    pub size: u32,
    /// position in the packed specialization data, in declaration order
    pub offset: u32,
}

impl SpecializationConstant {
    pub fn to_vk(&self) -> vk::SpecializationMapEntry {
        vk::SpecializationMapEntry::default()
            .constant_id(self.constant_id)
            .offset(self.offset)
            .size(self.size as usize)
    }

    fn encode(&self, value: i32) -> [u8; 4] {
        match self.scalar_type {
            ScalarType::Int32 => value.to_le_bytes(),
            ScalarType::Uint32 => (value as u32).to_le_bytes(),
            ScalarType::Float32 => (value as f32).to_le_bytes(),
        }
    }
}

/// map entries plus the packed data block for one shader stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecializationInfo {
    pub map_entries: Vec<SpecializationConstant>,
    pub data: Vec<u8>,
}

impl SpecializationInfo {
    /// every constant needs a caller-supplied value
    pub fn build(
        constants: &[SpecializationConstant],
        values: &HashMap<String, i32>,
    ) -> Result<Self> {
        let data_size = constants.iter().map(|c| c.offset + c.size).max().unwrap_or(0);
        let mut data = vec![0u8; data_size as usize];

        for constant in constants {
            let value = values.get(&constant.name).copied().ok_or_else(|| {
                ReflectionError::MissingSpecializationValue {
                    name: constant.name.clone(),
                }
            })?;

            let bytes = constant.encode(value);
            let start = constant.offset as usize;
            let len = bytes.len().min(constant.size as usize);
            data[start..start + len].copy_from_slice(&bytes[..len]);
        }

        Ok(Self {
            map_entries: constants.to_vec(),
            data,
        })
    }

    pub fn vk_map_entries(&self) -> Vec<vk::SpecializationMapEntry> {
        self.map_entries.iter().map(SpecializationConstant::to_vk).collect()
    }
}
