pub mod config;
pub mod decimate;
pub mod degenerate;
pub mod error;
pub mod integrity;
pub mod orient;
pub mod topology;
pub mod winding;

#[cfg(test)]
mod testing;

pub use config::{IntegrityConfig, OrientationConfig, CANDIDATE_ROTATIONS};
pub use decimate::decimate;
pub use degenerate::{count_degenerate_faces, FaceSelector, FaceSignals, Indicator};
pub use error::AuditError;
pub use integrity::{check, check_mesh, MeshReport};
pub use orient::{
    best_orientation, best_orientation_with, rotation_from_degrees, search_orientations,
    CandidateScore, OrientationResult,
};
pub use winding::normalize_winding;
