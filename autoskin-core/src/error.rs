//! Error type for weight assignment

/// Errors reported by skeleton/mesh validation and weight assignment.
///
/// Every error is raised before the mesh's weight store is touched.
#[derive(Debug, thiserror::Error)]
pub enum SkinError {
    #[error("Skeleton has no bones")]
    EmptySkeleton,

    #[error("Duplicate bone name '{0}'")]
    DuplicateBoneName(String),

    #[error("Bone '{bone}' has a non-finite {field}")]
    NonFiniteBone { bone: String, field: &'static str },

    #[error("Bone '{bone}' has a negative {field} ({value})")]
    NegativeRadius {
        bone: String,
        field: &'static str,
        value: f32,
    },

    #[error("Vertex {index} has a non-finite position")]
    NonFiniteVertex { index: usize },

    #[error("Skeleton has {0} bones, but packed influences address at most 256")]
    TooManyBones(usize),

    #[error("Weight assignment was cancelled")]
    Cancelled,
}
