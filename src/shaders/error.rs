/// everything that can stop a shader (or a pipeline of shaders) from reflecting
///
/// none of these are recoverable for the shader that raised them;
/// a partially reflected layout would only fail later inside the driver
#[derive(Debug, thiserror::Error)]
pub enum ReflectionError {
    #[error("malformed shader at byte {offset}: {reason}")]
    MalformedShader { offset: usize, reason: String },

    #[error("unrecognized layout segment: {segment}")]
    UnrecognizedSegment { segment: String },

    #[error("unknown glsl type: {type_name}")]
    UnknownType { type_name: String },

    #[error("descriptor set {set} contains opaque descriptors and has no byte size")]
    UnsizedSetQuery { set: u32 },

    #[error("no value supplied for specialization constant: {name}")]
    MissingSpecializationValue { name: String },

    #[error("conflicting declarations for set {set}, binding {binding}")]
    ConflictingBinding { set: u32, binding: u32 },

    #[error("push constant '{name}' is declared differently in different stages")]
    ConflictingPushConstant { name: String },

    #[error("no shader stage for file extension: {extension:?}")]
    UnknownStage { extension: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReflectionError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedShader {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown_type(type_name: &str) -> Self {
        Self::UnknownType {
            type_name: type_name.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReflectionError>;
