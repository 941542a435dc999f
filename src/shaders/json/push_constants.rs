use ash::vk;
use serde::{Deserialize, Serialize};

use super::StageFlags;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushConstantRange {
    pub stage_flags: StageFlags,
    pub offset: u32,
    pub size: u32,
}

impl PushConstantRange {
    pub fn to_vk(&self) -> vk::PushConstantRange {
        vk::PushConstantRange::default()
            .stage_flags(self.stage_flags.to_vk())
            .offset(self.offset)
            .size(self.size)
    }
}

/// a named push constant with every stage that declares it,
/// which is what a vkCmdPushConstants call for it needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushConstantField {
    pub name: String,
    pub glsl_type: String,
    pub offset: u32,
    pub size: u32,
    pub stage_flags: StageFlags,
}
