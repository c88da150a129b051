//! Geodetic positions into the selected reference frame.

use bevy::math::{DMat3, DVec3};
use bevy::prelude::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Ellipsoid, Geodetic};
use crate::frames::FrameProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceFrame {
    BodyFixed,
    #[default]
    Inertial,
}

impl ReferenceFrame {
    pub fn toggled(self) -> Self {
        match self {
            ReferenceFrame::BodyFixed => ReferenceFrame::Inertial,
            ReferenceFrame::Inertial => ReferenceFrame::BodyFixed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReferenceFrame::BodyFixed => "body-fixed",
            ReferenceFrame::Inertial => "inertial",
        }
    }
}

/// Whether a transformed value used a real frame matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameQuality {
    Exact,
    /// No matrix for the instant; identity was used instead.
    Degraded,
}

/// Owner of the frame selection and the body shape.
#[derive(Resource, Debug, Clone)]
pub struct FrameTransformer {
    frame: ReferenceFrame,
    ellipsoid: Ellipsoid,
}

impl FrameTransformer {
    pub fn new(frame: ReferenceFrame, ellipsoid: Ellipsoid) -> Self {
        Self { frame, ellipsoid }
    }

    pub fn frame(&self) -> ReferenceFrame {
        self.frame
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    /// Store `frame`. Returns `true` when the selection changed, in which case every
    /// frame-dependent series has to be derived again.
    pub fn set_frame(&mut self, frame: ReferenceFrame) -> bool {
        let changed = self.frame != frame;
        self.frame = frame;
        changed
    }

    /// Body-fixed Cartesian meters for a geodetic position.
    pub fn fixed_position(&self, geo: Geodetic) -> DVec3 {
        self.ellipsoid.to_cartesian(geo)
    }

    pub fn to_geodetic(&self, point: DVec3) -> Geodetic {
        self.ellipsoid.to_geodetic(point)
    }

    /// Geodetic -> Cartesian in `frame`. A missing matrix degrades to identity instead of failing.
    pub fn transform_position(
        &self,
        geo: Geodetic,
        time: DateTime<Utc>,
        frame: ReferenceFrame,
        provider: &dyn FrameProvider,
    ) -> (DVec3, FrameQuality) {
        let fixed = self.fixed_position(geo);
        match frame {
            ReferenceFrame::BodyFixed => (fixed, FrameQuality::Exact),
            ReferenceFrame::Inertial => {
                let (matrix, quality) = fixed_to_inertial_or_identity(provider, time);
                (matrix * fixed, quality)
            }
        }
    }
}

impl Default for FrameTransformer {
    fn default() -> Self {
        Self::new(ReferenceFrame::default(), Ellipsoid::default())
    }
}

/// `fixed_to_inertial(time)`, or identity when the provider has nothing. Callers report the
/// degraded samples.
pub fn fixed_to_inertial_or_identity(
    provider: &dyn FrameProvider,
    time: DateTime<Utc>,
) -> (DMat3, FrameQuality) {
    match provider.fixed_to_inertial(time) {
        Some(m) => (m, FrameQuality::Exact),
        None => {
            debug!("no frame matrix at {time}, using identity");
            (DMat3::IDENTITY, FrameQuality::Degraded)
        }
    }
}
