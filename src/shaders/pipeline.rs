use std::collections::{BTreeMap, BTreeSet, HashMap};

use ash::vk;
use log::*;
use serde::{Deserialize, Serialize};

use super::ShaderReflection;
use super::error::{ReflectionError, Result};
use super::json::*;

/// caller choices that the shader text can't express
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// vertex bindings read once per instance instead of once per vertex
    pub instance_rate_bindings: BTreeSet<u32>,
}

impl PipelineOptions {
    pub fn with_instance_binding(mut self, binding: u32) -> Self {
        self.instance_rate_bindings.insert(binding);
        self
    }
}

/// specialization constants of one shader file in the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpecialization {
    pub source_file_name: String,
    pub stage: ShaderStage,
    pub constants: Vec<SpecializationConstant>,
}

/// the merged layout of every shader file that makes up one pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReflection {
    pub source_file_names: Vec<String>,
    pub vertex_inputs: Vec<VertexInputDescriptor>,
    pub vertex_bindings: Vec<VertexBindingDescription>,
    /// ascending by set index
    pub uniform_sets: Vec<ShaderUniformSet>,
    /// one range per stage, in the order stages were first seen
    pub push_constant_ranges: Vec<PushConstantRange>,
    pub push_constants: Vec<PushConstantField>,
    pub specialization_constants: Vec<StageSpecialization>,
}

impl PipelineReflection {
    /// merges shaders in the order given; the order decides
    /// which binding of a set comes first and how push ranges are ordered
    pub fn reflect(shaders: &[ShaderReflection], options: &PipelineOptions) -> Result<Self> {
        let mut vertex_inputs = vec![];
        let mut uniform_sets: BTreeMap<u32, ShaderUniformSet> = BTreeMap::new();
        let mut push_constants = PushConstantMerge::default();
        let mut specialization_constants = vec![];

        for shader in shaders {
            vertex_inputs.extend(shader.vertex_input(&options.instance_rate_bindings));

            for shader_set in &shader.descriptor_sets {
                let set = uniform_sets
                    .entry(shader_set.set)
                    .or_insert_with(|| ShaderUniformSet::new(shader_set.set));

                for uniform in &shader_set.uniforms {
                    set.merge(uniform.clone())?;
                }
            }

            push_constants.add(shader)?;

            if !shader.specialization_constants.is_empty() {
                specialization_constants.push(StageSpecialization {
                    source_file_name: shader.source_file_name.clone(),
                    stage: shader.stage,
                    constants: shader.specialization_constants.clone(),
                });
            }
        }

        let vertex_bindings = vertex_binding_descriptions(&vertex_inputs);
        let PushConstantMerge { ranges, fields } = push_constants;

        debug!(
            "pipeline of {} shaders: {} attributes, {} sets, {} push constant ranges",
            shaders.len(),
            vertex_inputs.len(),
            uniform_sets.len(),
            ranges.len()
        );

        Ok(Self {
            source_file_names: shaders.iter().map(|s| s.source_file_name.clone()).collect(),
            vertex_inputs,
            vertex_bindings,
            uniform_sets: uniform_sets.into_values().collect(),
            push_constant_ranges: ranges,
            push_constants: fields,
            specialization_constants,
        })
    }

    pub fn uniform_set(&self, set: u32) -> Option<&ShaderUniformSet> {
        self.uniform_sets.iter().find(|s| s.set == set)
    }

    /// what a push of the named constant needs: its offset, size and every stage that reads it
    pub fn push_constant(&self, name: &str) -> Option<&PushConstantField> {
        self.push_constants.iter().find(|f| f.name == name)
    }

    /// one entry per shader file that declares specialization constants
    pub fn specialization_infos(
        &self,
        values: &HashMap<String, i32>,
    ) -> Result<Vec<(ShaderStage, SpecializationInfo)>> {
        self.specialization_constants
            .iter()
            .map(|stage| -> Result<_> {
                let info = SpecializationInfo::build(&stage.constants, values)?;
                Ok((stage.stage, info))
            })
            .collect()
    }

    pub fn vk_vertex_attributes(&self) -> Vec<vk::VertexInputAttributeDescription> {
        self.vertex_inputs.iter().map(VertexInputDescriptor::to_vk).collect()
    }

    pub fn vk_vertex_bindings(&self) -> Vec<vk::VertexInputBindingDescription> {
        self.vertex_bindings
            .iter()
            .map(VertexBindingDescription::to_vk)
            .collect()
    }

    /// one binding list per set, ready for vkCreateDescriptorSetLayout
    pub fn vk_descriptor_set_layout_bindings(
        &self,
    ) -> Vec<Vec<vk::DescriptorSetLayoutBinding<'static>>> {
        self.uniform_sets.iter().map(ShaderUniformSet::to_vk).collect()
    }

    pub fn vk_push_constant_ranges(&self) -> Vec<vk::PushConstantRange> {
        self.push_constant_ranges
            .iter()
            .map(PushConstantRange::to_vk)
            .collect()
    }
}

#[derive(Default)]
struct PushConstantMerge {
    ranges: Vec<PushConstantRange>,
    fields: Vec<PushConstantField>,
}

impl PushConstantMerge {
    fn add(&mut self, shader: &ShaderReflection) -> Result<()> {
        let stage_flags = shader.stage.flag();

        for field in &shader.push_constants {
            match self.ranges.iter_mut().find(|r| r.stage_flags == stage_flags) {
                Some(range) => {
                    range.offset = range.offset.min(field.offset);
                    range.size = range.size.checked_add(field.size).ok_or_else(|| {
                        let reason = format!("{stage_flags:?} push constants overflow u32");
                        ReflectionError::malformed(0, reason)
                    })?;
                }
                None => self.ranges.push(PushConstantRange {
                    stage_flags,
                    offset: field.offset,
                    size: field.size,
                }),
            }

            match self.fields.iter_mut().find(|f| f.name == field.name) {
                Some(existing) => {
                    let agrees = existing.glsl_type == field.glsl_type
                        && existing.offset == field.offset
                        && existing.size == field.size;
                    if !agrees {
                        return Err(ReflectionError::ConflictingPushConstant {
                            name: field.name.clone(),
                        });
                    }

                    existing.stage_flags |= stage_flags;
                }
                None => self.fields.push(PushConstantField {
                    name: field.name.clone(),
                    glsl_type: field.glsl_type.clone(),
                    offset: field.offset,
                    size: field.size,
                    stage_flags,
                }),
            }
        }

        Ok(())
    }
}
