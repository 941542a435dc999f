use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use log::*;
use serde::{Deserialize, Serialize};

pub mod build_tasks;
pub mod classify;
pub mod comments;
pub mod error;
pub mod json;
pub mod lexer;
pub mod pipeline;
pub mod segments;
pub mod types;
pub mod variables;

use classify::{ClassifiedSegment, classify};
use error::{ReflectionError, Result};
use json::*;
use types::ReflectionContext;

/// the text of one shader file, tagged with its stage
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub name: String,
    pub stage: ShaderStage,
    pub text: String,
}

impl ShaderSource {
    /// for embedded sources, ie from include_str!
    pub fn new(name: impl Into<String>, stage: ShaderStage, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage,
            text: text.into(),
        }
    }

    /// reads a shader file, taking the stage from its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let stage =
            ShaderStage::from_extension(extension).ok_or_else(|| ReflectionError::UnknownStage {
                extension: extension.to_string(),
            })?;

        let text = std::fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self { name, stage, text })
    }
}

/// a stage output or input block; kept for completeness, never part of a pipeline layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageInterface {
    pub location: Option<u32>,
    pub declaration: String,
}

/// everything the layout declarations of one shader file describe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderReflection {
    pub source_file_name: String,
    pub stage: ShaderStage,
    /// per-vertex rate; see vertex_input for instancing
    pub vertex_inputs: Vec<VertexInputDescriptor>,
    pub descriptor_sets: Vec<ShaderUniformSet>,
    pub push_constants: Vec<ShaderVariable>,
    pub specialization_constants: Vec<SpecializationConstant>,
    pub outputs: Vec<StageInterface>,
    pub input_blocks: Vec<StageInterface>,
}

impl ShaderReflection {
    pub fn reflect(source: &ShaderSource, context: ReflectionContext<'_>) -> Result<Self> {
        let stripped = comments::strip_comments(&source.text);
        let tokens = lexer::tokenize(&stripped);
        let segments = segments::scan_segments(&stripped, &tokens)?;

        debug!(
            "{}: {} layout segments ({:?} stage)",
            source.name,
            segments.len(),
            source.stage
        );

        let stage_flags = source.stage.flag();
        let mut vertex_inputs = vec![];
        let mut descriptor_sets: BTreeMap<u32, ShaderUniformSet> = BTreeMap::new();
        let mut push_constants = None;
        let mut specialization_constants = vec![];
        let mut specialization_offset: u32 = 0;
        let mut outputs = vec![];
        let mut input_blocks = vec![];

        for segment in &segments {
            match classify(segment, context)? {
                ClassifiedSegment::VertexInput {
                    location,
                    glsl_type,
                    name,
                } => {
                    if source.stage != ShaderStage::Vertex {
                        trace!("{}: stage input '{name}' is linkage only", source.name);
                        continue;
                    }

                    let info = context.type_info(&glsl_type)?;
                    for slot in 0..info.slots {
                        let slot_location = location.checked_add(slot).ok_or_else(|| {
                            ReflectionError::malformed(
                                segment.offset,
                                format!("input '{name}' runs past the last location"),
                            )
                        })?;

                        vertex_inputs.push(VertexInputDescriptor {
                            name: name.clone(),
                            glsl_type: glsl_type.clone(),
                            binding: location,
                            location: slot_location,
                            input_rate: InputRate::Vertex,
                            stride: info.size,
                            format: info.vertex_format,
                            offset: slot * info.slot_stride,
                        });
                    }
                }

                ClassifiedSegment::InputBlock {
                    location,
                    declaration,
                } => input_blocks.push(StageInterface {
                    location,
                    declaration,
                }),

                ClassifiedSegment::Output {
                    location,
                    declaration,
                } => outputs.push(StageInterface {
                    location,
                    declaration,
                }),

                ClassifiedSegment::Descriptor {
                    set,
                    binding,
                    name,
                    kind,
                    size,
                    fields,
                } => {
                    let uniform = ShaderUniform {
                        name,
                        binding,
                        descriptor_type: kind,
                        stage_flags,
                        size,
                        fields,
                    };

                    descriptor_sets
                        .entry(set)
                        .or_insert_with(|| ShaderUniformSet::new(set))
                        .merge(uniform)?;
                }

                ClassifiedSegment::PushConstant { fields } => {
                    if push_constants.is_some() {
                        return Err(ReflectionError::malformed(
                            segment.offset,
                            "only one push_constant block is allowed per shader",
                        ));
                    }
                    push_constants = Some(fields);
                }

                ClassifiedSegment::SpecializationConstant {
                    constant_id,
                    glsl_type,
                    name,
                } => {
                    let info = context.type_info(&glsl_type)?;
                    if !info.is_scalar() {
                        return Err(ReflectionError::malformed(
                            segment.offset,
                            format!("specialization constant '{name}' must be a scalar"),
                        ));
                    }

                    let next_offset = specialization_offset.checked_add(info.size).ok_or_else(|| {
                        ReflectionError::malformed(segment.offset, "specialization data too large")
                    })?;

                    specialization_constants.push(SpecializationConstant {
                        constant_id,
                        name,
                        glsl_type,
                        scalar_type: info.scalar,
                        size: info.size,
                        offset: specialization_offset,
                    });
                    specialization_offset = next_offset;
                }
            }
        }

        Ok(Self {
            source_file_name: source.name.clone(),
            stage: source.stage,
            vertex_inputs,
            descriptor_sets: descriptor_sets.into_values().collect(),
            push_constants: push_constants.unwrap_or_default(),
            specialization_constants,
            outputs,
            input_blocks,
        })
    }

    /// attribute descriptions, with the given bindings read per instance
    pub fn vertex_input(&self, instance_bindings: &BTreeSet<u32>) -> Vec<VertexInputDescriptor> {
        self.vertex_inputs
            .iter()
            .cloned()
            .map(|mut input| {
                if instance_bindings.contains(&input.binding) {
                    input.input_rate = InputRate::Instance;
                }
                input
            })
            .collect()
    }

    /// ordered by set index
    pub fn descriptor_set_layouts(&self) -> &[ShaderUniformSet] {
        &self.descriptor_sets
    }

    /// this stage's single push constant range, if it declares a block
    pub fn push_constant_range(&self) -> Option<PushConstantRange> {
        let offset = self.push_constants.iter().map(|f| f.offset).min()?;
        let size = self
            .push_constants
            .iter()
            .try_fold(0u32, |total, f| total.checked_add(f.size))?;

        Some(PushConstantRange {
            stage_flags: self.stage.flag(),
            offset,
            size,
        })
    }

    pub fn specialization_constants(&self) -> &[SpecializationConstant] {
        &self.specialization_constants
    }

    pub fn specialization_info(&self, values: &HashMap<String, i32>) -> Result<SpecializationInfo> {
        SpecializationInfo::build(&self.specialization_constants, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::shaders::types::{StructRegistry, TypeTable};
    use crate::util::manifest_path;

    fn reflect(stage: ShaderStage, text: &str) -> Result<ShaderReflection> {
        let table = TypeTable::glsl();
        let structs = StructRegistry::new();
        let source = ShaderSource::new("test", stage, text);

        ShaderReflection::reflect(&source, ReflectionContext::new(&table, &structs))
    }

    #[test]
    fn position_and_uv() {
        let reflection = reflect(
            ShaderStage::Vertex,
            "layout(location = 0) in vec3 position; layout(location = 1) in vec2 uv;",
        )
        .unwrap();

        let inputs = reflection.vertex_input(&BTreeSet::new());
        let summary: Vec<_> = inputs
            .iter()
            .map(|i| (i.name.as_str(), i.binding, i.location, i.stride, i.format, i.offset))
            .collect();
        assert_eq!(
            summary,
            [
                ("position", 0, 0, 12, VertexFormat::R32G32B32Sfloat, 0),
                ("uv", 1, 1, 8, VertexFormat::R32G32Sfloat, 0),
            ]
        );
    }

    #[test]
    fn matrix_input_takes_one_slot_per_column() {
        let reflection = reflect(
            ShaderStage::Vertex,
            "layout(location = 0) in vec3 position;\nlayout(location = 2) in mat4 model;",
        )
        .unwrap();

        let inputs = reflection.vertex_input(&BTreeSet::from([2]));
        let model: Vec<_> = inputs.iter().filter(|i| i.name == "model").collect();

        assert_eq!(model.len(), 4);
        for (slot, input) in model.iter().enumerate() {
            let slot = slot as u32;
            assert_eq!(input.binding, 2);
            assert_eq!(input.location, 2 + slot);
            assert_eq!(input.offset, slot * 16);
            assert_eq!(input.input_rate, InputRate::Instance);
        }
        assert_eq!(inputs[0].input_rate, InputRate::Vertex);

        let bindings = vertex_binding_descriptions(&inputs);
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[1].binding, 2);
        assert_eq!(bindings[1].stride, 64);
    }

    #[test]
    fn fragment_inputs_are_not_vertex_inputs() {
        let reflection = reflect(
            ShaderStage::Fragment,
            "layout(location = 0) in vec2 uv;\nlayout(location = 0) out vec4 color;",
        )
        .unwrap();

        assert!(reflection.vertex_inputs.is_empty());
        assert_eq!(reflection.outputs.len(), 1);
    }

    #[test]
    fn commented_out_declarations_are_ignored() {
        let reflection = reflect(
            ShaderStage::Vertex,
            "// layout(location = 5) in vec4 unused;\n\
             /* layout(set = 0, binding = 0) uniform sampler2D gone; */\n\
             layout(location = 0) in vec3 position;",
        )
        .unwrap();

        assert_eq!(reflection.vertex_inputs.len(), 1);
        assert!(reflection.descriptor_sets.is_empty());
    }

    #[test]
    fn descriptor_sets_are_ordered_by_set() {
        let reflection = reflect(
            ShaderStage::Fragment,
            "layout(set = 2, binding = 0) uniform sampler2D shadow;\n\
             layout(binding = 1) uniform sampler2D albedo;\n\
             layout(binding = 0) uniform Material { vec4 baseColor; float roughness; } material;",
        )
        .unwrap();

        let sets = reflection.descriptor_set_layouts();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].set, 0);
        assert_eq!(sets[1].set, 2);

        let bindings: Vec<_> = sets[0].uniforms.iter().map(|u| u.binding).collect();
        assert_eq!(bindings, [1, 0]);
        assert_eq!(sets[0].uniform(0).unwrap().size, 20);
        assert_eq!(sets[0].uniform(1).unwrap().stage_flags, StageFlags::FRAGMENT);
    }

    #[test]
    fn push_constant_range() {
        let reflection = reflect(
            ShaderStage::Vertex,
            "layout(push_constant) uniform Push { mat4 modelMatrix; } push;",
        )
        .unwrap();

        assert_eq!(
            reflection.push_constant_range(),
            Some(PushConstantRange {
                stage_flags: StageFlags::VERTEX,
                offset: 0,
                size: 64,
            })
        );
        assert_eq!(reflect(ShaderStage::Vertex, "").unwrap().push_constant_range(), None);
    }

    #[test]
    fn two_push_constant_blocks() {
        let err = reflect(
            ShaderStage::Vertex,
            "layout(push_constant) uniform A { float a; } a;\nlayout(push_constant) uniform B { float b; } b;",
        )
        .unwrap_err();

        assert!(matches!(err, ReflectionError::MalformedShader { .. }));
    }

    #[test]
    fn specialization_offsets_follow_declaration_order() {
        let reflection = reflect(
            ShaderStage::Compute,
            "layout(local_size_x = 64) in;\n\
             layout(constant_id = 1) const float scale = 1.0;\n\
             layout(constant_id = 0) const uint groupSize = 64;\n\
             layout(constant_id = 5) const int bias = -1;",
        )
        .unwrap();

        let summary: Vec<_> = reflection
            .specialization_constants()
            .iter()
            .map(|c| (c.constant_id, c.name.as_str(), c.offset, c.size))
            .collect();
        assert_eq!(
            summary,
            [(1, "scale", 0, 4), (0, "groupSize", 4, 4), (5, "bias", 8, 4)]
        );

        let values = HashMap::from([
            ("scale".to_string(), 3),
            ("groupSize".to_string(), 128),
            ("bias".to_string(), -1),
        ]);
        let info = reflection.specialization_info(&values).unwrap();
        assert_eq!(info.data.len(), 12);
        assert_eq!(&info.data[0..4], &3.0f32.to_le_bytes());

        let err = reflection.specialization_info(&HashMap::new()).unwrap_err();
        assert!(matches!(err, ReflectionError::MissingSpecializationValue { .. }));
    }

    #[test]
    fn vector_specialization_constant() {
        let err = reflect(
            ShaderStage::Compute,
            "layout(constant_id = 0) const vec3 direction = vec3(0.0);",
        )
        .unwrap_err();

        assert!(matches!(err, ReflectionError::MalformedShader { .. }));
    }

    #[test]
    fn matrix_input_past_the_last_location() {
        let err = reflect(ShaderStage::Vertex, "layout(location = 4294967294) in mat4 model;")
            .unwrap_err();
        assert!(matches!(err, ReflectionError::MalformedShader { offset: 0, .. }));
    }

    #[test]
    fn oversized_storage_buffer() {
        let err = reflect(
            ShaderStage::Compute,
            "layout(std430, binding = 0) buffer B { vec4 data[1073741824]; } b;",
        )
        .unwrap_err();
        assert!(matches!(err, ReflectionError::MalformedShader { .. }));
    }

    #[test]
    fn blocks_named_like_storage_keywords() {
        let reflection = reflect(
            ShaderStage::Compute,
            "layout(local_size_x = 64) in;\n\
             layout(std430, binding = 0) buffer In { float data[]; } inBuf;\n\
             layout(std430, binding = 1) buffer Out { float data[]; } outBuf;",
        )
        .unwrap();

        assert!(reflection.input_blocks.is_empty());
        assert!(reflection.outputs.is_empty());

        let set = &reflection.descriptor_set_layouts()[0];
        let summary: Vec<_> = set
            .uniforms
            .iter()
            .map(|u| (u.name.as_str(), u.binding, u.descriptor_type))
            .collect();
        assert_eq!(
            summary,
            [
                ("In", 0, DescriptorKind::StorageBuffer),
                ("Out", 1, DescriptorKind::StorageBuffer),
            ]
        );
    }

    #[test]
    fn unknown_vertex_input_type() {
        let err = reflect(ShaderStage::Vertex, "layout(location = 0) in dvec3 position;").unwrap_err();
        assert!(matches!(
            err,
            ReflectionError::UnknownType { type_name } if type_name == "dvec3"
        ));
    }

    #[test]
    fn stage_from_path() {
        let source = ShaderSource::from_path(&manifest_path(["shaders", "source", "textured.vert"]))
            .unwrap();
        assert_eq!(source.stage, ShaderStage::Vertex);
        assert_eq!(source.name, "textured.vert");

        let err = ShaderSource::from_path(&manifest_path(["Cargo.toml"])).unwrap_err();
        assert!(matches!(
            err,
            ReflectionError::UnknownStage { extension } if extension == "toml"
        ));
    }

    #[test]
    fn missing_file() {
        let err = ShaderSource::from_path(&manifest_path(["shaders", "source", "missing.frag"]))
            .unwrap_err();
        assert!(matches!(err, ReflectionError::Io(_)));
    }
}
