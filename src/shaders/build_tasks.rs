use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::*;
use serde::{Deserialize, Serialize};

use super::json::ShaderStage;
use super::pipeline::{PipelineOptions, PipelineReflection};
use super::types::{ReflectionContext, StructRegistry, TypeTable};
use super::{ShaderReflection, ShaderSource};

pub struct Config {
    /// the directory to read glsl files from
    pub shaders_source_dir: PathBuf,
    /// the directory to write reflection json to
    pub reflection_dir: PathBuf,
}

/// the file written for each pipeline
#[derive(Debug, Serialize, Deserialize)]
pub struct ReflectionJson {
    pub pipeline_name: String,
    pub shaders: Vec<ShaderReflection>,
    pub pipeline: PipelineReflection,
}

/// reflects every group of shaders sharing a file stem ('mesh.vert' + 'mesh.frag')
/// and writes '<stem>.json' for each; returns the written paths
pub fn write_reflection_json(config: &Config) -> anyhow::Result<Vec<PathBuf>> {
    let pipelines = group_by_stem(&config.shaders_source_dir)?;

    let types = TypeTable::glsl();
    let structs = StructRegistry::new();
    let context = ReflectionContext::new(&types, &structs);

    std::fs::create_dir_all(&config.reflection_dir)?;

    let mut written = vec![];
    for (pipeline_name, paths) in pipelines {
        let mut shaders = vec![];
        for path in &paths {
            let source = ShaderSource::from_path(path)?;
            let reflection = ShaderReflection::reflect(&source, context)
                .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
            shaders.push(reflection);
        }

        let pipeline = PipelineReflection::reflect(&shaders, &PipelineOptions::default())
            .map_err(|e| anyhow::anyhow!("pipeline '{pipeline_name}': {e}"))?;

        let json_path = config.reflection_dir.join(format!("{pipeline_name}.json"));
        let reflection_json = ReflectionJson {
            pipeline_name,
            shaders,
            pipeline,
        };
        std::fs::write(&json_path, serde_json::to_string_pretty(&reflection_json)?)?;

        info!("wrote shader reflection: {}", json_path.display());
        written.push(json_path);
    }

    Ok(written)
}

/// shader files by stem, vertex stage first within a group
fn group_by_stem(dir: &Path) -> anyhow::Result<BTreeMap<String, Vec<PathBuf>>> {
    let mut groups: BTreeMap<String, Vec<(ShaderStage, PathBuf)>> = BTreeMap::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        let stage = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ShaderStage::from_extension);
        let stem = path.file_stem().and_then(|stem| stem.to_str());

        let (Some(stage), Some(stem)) = (stage, stem) else {
            debug!("not a shader source, skipping: {}", path.display());
            continue;
        };

        groups.entry(stem.to_string()).or_default().push((stage, path));
    }

    let groups = groups
        .into_iter()
        .map(|(stem, mut shaders)| {
            shaders.sort();
            let paths = shaders.into_iter().map(|(_, path)| path).collect();
            (stem, paths)
        })
        .collect();

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::shaders::json::{DescriptorKind, InputRate, StageFlags};
    use crate::util::manifest_path;

    fn read_json(path: &Path) -> ReflectionJson {
        let json = std::fs::read_to_string(path).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn reflection_files() {
        let tmp_prefix = format!("shader-test-{}", uuid::Uuid::new_v4());
        let tmp_dir_path = std::env::temp_dir().join(tmp_prefix);

        let config = Config {
            shaders_source_dir: manifest_path(["shaders", "source"]),
            reflection_dir: tmp_dir_path.join("reflected"),
        };

        let written = write_reflection_json(&config).unwrap();
        let file_names: Vec<_> = written
            .iter()
            .filter_map(|p| p.file_name()?.to_str())
            .collect();
        assert_eq!(
            file_names,
            ["instanced.json", "particles.json", "textured.json"]
        );

        let textured = read_json(&config.reflection_dir.join("textured.json"));
        assert_eq!(textured.pipeline_name, "textured");
        assert_eq!(
            textured.pipeline.source_file_names,
            ["textured.vert", "textured.frag"]
        );

        let set = &textured.pipeline.uniform_sets[0];
        let kinds: Vec<_> = set.uniforms.iter().map(|u| u.descriptor_type).collect();
        assert_eq!(
            kinds,
            [DescriptorKind::UniformBuffer, DescriptorKind::CombinedImageSampler]
        );

        assert_eq!(textured.pipeline.push_constant_ranges.len(), 2);
        let tint = textured.pipeline.push_constant("tint").unwrap();
        assert_eq!(tint.offset, 64);
        assert_eq!(tint.stage_flags, StageFlags::VERTEX | StageFlags::FRAGMENT);

        let instanced = read_json(&config.reflection_dir.join("instanced.json"));
        assert_eq!(instanced.pipeline.vertex_inputs.len(), 6);
        assert!(
            instanced
                .pipeline
                .vertex_bindings
                .iter()
                .all(|b| b.input_rate == InputRate::Vertex)
        );

        let particles = read_json(&config.reflection_dir.join("particles.json"));
        let constants = &particles.pipeline.specialization_constants[0].constants;
        assert_eq!(constants.len(), 2);
        assert_eq!(constants[1].offset, 4);

        std::fs::remove_dir_all(&tmp_dir_path).unwrap();
    }

    #[test]
    fn missing_source_dir() {
        let config = Config {
            shaders_source_dir: manifest_path(["shaders", "does-not-exist"]),
            reflection_dir: std::env::temp_dir().join(format!("shader-test-{}", uuid::Uuid::new_v4())),
        };

        assert!(write_reflection_json(&config).is_err());
    }
}
