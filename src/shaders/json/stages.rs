use ash::vk;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShaderStage {
    Vertex,
    TessellationControl,
    TessellationEvaluation,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderStage {
    /// accepts the extension with or without its leading '.'
    pub fn from_extension(extension: &str) -> Option<Self> {
        let stage = match extension.trim_start_matches('.') {
            "vert" => Self::Vertex,
            "frag" => Self::Fragment,
            "comp" => Self::Compute,
            "tc" => Self::TessellationControl,
            "te" => Self::TessellationEvaluation,
            "geo" => Self::Geometry,
            _ => return None,
        };

        Some(stage)
    }

    pub fn flag(self) -> StageFlags {
        match self {
            Self::Vertex => StageFlags::VERTEX,
            Self::TessellationControl => StageFlags::TESSELLATION_CONTROL,
            Self::TessellationEvaluation => StageFlags::TESSELLATION_EVALUATION,
            Self::Geometry => StageFlags::GEOMETRY,
            Self::Fragment => StageFlags::FRAGMENT,
            Self::Compute => StageFlags::COMPUTE,
        }
    }
}

bitflags::bitflags! {
    /// the stages a binding or push constant is visible to
    ///
    /// bit values match vulkan's VkShaderStageFlagBits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct StageFlags: u32 {
        const VERTEX = 0x01;
        const TESSELLATION_CONTROL = 0x02;
        const TESSELLATION_EVALUATION = 0x04;
        const GEOMETRY = 0x08;
        const FRAGMENT = 0x10;
        const COMPUTE = 0x20;
    }
}

impl StageFlags {
    pub fn to_vk(self) -> vk::ShaderStageFlags {
        vk::ShaderStageFlags::from_raw(self.bits())
    }
}

impl From<ShaderStage> for StageFlags {
    fn from(stage: ShaderStage) -> Self {
        stage.flag()
    }
}
