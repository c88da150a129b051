//! Reference frames: selection state, providers and the geodetic transformer.

pub mod provider;
pub mod transformer;

pub use provider::{FrameProvider, MarsRotationModel, PreloadedFrames};
pub use transformer::{
    FrameQuality, FrameTransformer, ReferenceFrame, fixed_to_inertial_or_identity,
};
