use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::{ReflectionError, Result};
use super::json::{DescriptorKind, ShaderVariable, VertexFormat};
use super::variables::{block_size, parse_variables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarType {
    Float32,
    Int32,
    Uint32,
}

/// sizing and vertex-attribute layout for one glsl scalar, vector or matrix type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    pub size: u32,
    pub scalar: ScalarType,
    /// components in one attribute slot
    pub components: u32,
    pub vertex_format: VertexFormat,
    /// attribute locations the type occupies; one per matrix column
    pub slots: u32,
    /// byte distance between consecutive slots
    pub slot_stride: u32,
}

impl TypeInfo {
    pub const fn scalar(scalar: ScalarType, vertex_format: VertexFormat) -> Self {
        Self::vector(scalar, 1, vertex_format)
    }

    pub const fn vector(scalar: ScalarType, components: u32, vertex_format: VertexFormat) -> Self {
        Self {
            size: components * 4,
            scalar,
            components,
            vertex_format,
            slots: 1,
            slot_stride: 0,
        }
    }

    /// square float matrix; each column is a separate vertex attribute
    pub const fn matrix(columns: u32, vertex_format: VertexFormat) -> Self {
        let column_size = columns * 4;
        Self {
            size: columns * column_size,
            scalar: ScalarType::Float32,
            components: columns,
            vertex_format,
            slots: columns,
            slot_stride: column_size,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.components == 1 && self.slots == 1
    }
}

/// the closed mapping from glsl type names to sizes, formats and descriptor kinds
///
/// build it once and share it by reference; every size the reflector reports comes from here
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: HashMap<String, TypeInfo>,
    opaque: HashMap<String, DescriptorKind>,
}

impl TypeTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// the types used by the sample shaders
    pub fn glsl() -> Self {
        use ScalarType::*;
        use VertexFormat::*;

        Self::empty()
            .with_type("int", TypeInfo::scalar(Int32, R32Sint))
            .with_type("uint", TypeInfo::scalar(Uint32, R32Uint))
            .with_type("float", TypeInfo::scalar(Float32, R32Sfloat))
            .with_type("vec2", TypeInfo::vector(Float32, 2, R32G32Sfloat))
            .with_type("vec3", TypeInfo::vector(Float32, 3, R32G32B32Sfloat))
            .with_type("vec4", TypeInfo::vector(Float32, 4, R32G32B32A32Sfloat))
            .with_type("ivec2", TypeInfo::vector(Int32, 2, R32G32Sint))
            .with_type("ivec3", TypeInfo::vector(Int32, 3, R32G32B32Sint))
            .with_type("ivec4", TypeInfo::vector(Int32, 4, R32G32B32A32Sint))
            .with_type("uvec2", TypeInfo::vector(Uint32, 2, R32G32Uint))
            .with_type("uvec3", TypeInfo::vector(Uint32, 3, R32G32B32Uint))
            .with_type("uvec4", TypeInfo::vector(Uint32, 4, R32G32B32A32Uint))
            .with_type("mat2", TypeInfo::matrix(2, R32G32Sfloat))
            .with_type("mat3", TypeInfo::matrix(3, R32G32B32Sfloat))
            .with_type("mat4", TypeInfo::matrix(4, R32G32B32A32Sfloat))
            .with_opaque("sampler2D", DescriptorKind::CombinedImageSampler)
            .with_opaque("samplerBuffer", DescriptorKind::UniformTexelBuffer)
            .with_opaque("image2D", DescriptorKind::StorageImage)
    }

    pub fn with_type(mut self, name: &str, info: TypeInfo) -> Self {
        self.types.insert(name.to_string(), info);
        self
    }

    pub fn with_opaque(mut self, name: &str, kind: DescriptorKind) -> Self {
        self.opaque.insert(name.to_string(), kind);
        self
    }

    pub fn get(&self, glsl_type: &str) -> Option<&TypeInfo> {
        self.types.get(glsl_type)
    }

    pub fn opaque(&self, glsl_type: &str) -> Option<DescriptorKind> {
        self.opaque.get(glsl_type).copied()
    }
}

/// a user-defined struct that may appear as a block member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructLayout {
    pub size: u32,
    pub fields: Vec<ShaderVariable>,
}

impl StructLayout {
    /// a struct known only by its byte size
    pub fn sized(size: u32) -> Self {
        Self {
            size,
            fields: vec![],
        }
    }

    /// lays out a struct body like "vec4 color; float weight;"
    /// with the same sequential packing as block members
    pub fn parse(fields: &str, context: ReflectionContext<'_>) -> Result<Self> {
        let fields = parse_variables(fields, context)?;
        let size = block_size(&fields, 0)?;

        Ok(Self { size, fields })
    }
}

/// caller-supplied layouts for struct types the table doesn't know
#[derive(Debug, Clone, Default)]
pub struct StructRegistry {
    structs: HashMap<String, StructLayout>,
}

impl StructRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, layout: StructLayout) {
        self.structs.insert(name.to_string(), layout);
    }

    pub fn get(&self, name: &str) -> Option<&StructLayout> {
        self.structs.get(name)
    }
}

/// the read-only configuration every parsing step is handed
#[derive(Debug, Clone, Copy)]
pub struct ReflectionContext<'a> {
    pub types: &'a TypeTable,
    pub structs: &'a StructRegistry,
}

impl<'a> ReflectionContext<'a> {
    pub fn new(types: &'a TypeTable, structs: &'a StructRegistry) -> Self {
        Self { types, structs }
    }

    /// table types first, then registered structs
    pub fn size_of(&self, glsl_type: &str) -> Result<u32> {
        if let Some(info) = self.types.get(glsl_type) {
            return Ok(info.size);
        }

        self.structs
            .get(glsl_type)
            .map(|layout| layout.size)
            .ok_or_else(|| ReflectionError::unknown_type(glsl_type))
    }

    pub fn type_info(&self, glsl_type: &str) -> Result<&'a TypeInfo> {
        self.types
            .get(glsl_type)
            .ok_or_else(|| ReflectionError::unknown_type(glsl_type))
    }

    pub fn opaque(&self, glsl_type: &str) -> Result<DescriptorKind> {
        self.types
            .opaque(glsl_type)
            .ok_or_else(|| ReflectionError::unknown_type(glsl_type))
    }
}
