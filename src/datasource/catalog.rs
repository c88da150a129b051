//! Dataset names, parameter ids and the requests built from them.

use chrono::NaiveDate;

use crate::config::ShellConfig;
use crate::datasource::types::{DatasetRequest, day_filters};

pub const SPICE_DATASET: &str = "in_situ_kp_spice";
pub const NGIMS_DATASET: &str = "in_situ_kp_ngims";
pub const MGITM_DATASET: &str = "mgitm";

/// Ephemeris columns, in the order `EphemerisRow::from_cells` reads them.
pub const EPHEMERIS_FIELDS: [&str; 9] = [
    "time",
    "spice_mars_season_ls",
    "spice_mars_sun_distance",
    "spice_spacecraft_altitude_w_r_t_ellipsoid",
    "spice_spacecraft_geo_latitude",
    "spice_spacecraft_geo_longitude",
    "spice_spacecraft_solar_zenith_angle",
    "spice_subsolar_point_geo_latitude",
    "spice_subsolar_point_geo_longitude",
];

const FIXED_TO_MSO_MATRIX: &str = "spice_rotation_matrix_iau_mars_maven_mso";

/// Vector parameters drawn as whiskers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhiskerParameter {
    #[default]
    MagneticField,
    SwiaHPlusFlowVelocity,
    StaticO2PlusFlowVelocity,
    StaticHPlusDirection,
    StaticPickupIonDirection,
}

impl WhiskerParameter {
    pub const ALL: [WhiskerParameter; 5] = [
        WhiskerParameter::MagneticField,
        WhiskerParameter::SwiaHPlusFlowVelocity,
        WhiskerParameter::StaticO2PlusFlowVelocity,
        WhiskerParameter::StaticHPlusDirection,
        WhiskerParameter::StaticPickupIonDirection,
    ];

    pub fn id(self) -> &'static str {
        match self {
            WhiskerParameter::MagneticField => "mag_magnetic_field_mso",
            WhiskerParameter::SwiaHPlusFlowVelocity => "swia_hplus_flow_velocity_mso",
            WhiskerParameter::StaticO2PlusFlowVelocity => "static_o2plus_flow_velocity_mso",
            WhiskerParameter::StaticHPlusDirection => "static_hplus_characteristic_direction_mso",
            WhiskerParameter::StaticPickupIonDirection => {
                "static_dominant_pickup_ion_characteristic_direction_mso"
            }
        }
    }

    pub fn dataset(self) -> &'static str {
        match self {
            WhiskerParameter::MagneticField => "in_situ_kp_mag",
            WhiskerParameter::SwiaHPlusFlowVelocity => "in_situ_kp_swia",
            _ => "in_situ_kp_static",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WhiskerParameter::MagneticField => "Magnetic Field (nT)",
            WhiskerParameter::SwiaHPlusFlowVelocity => "SWIA H+ Flow Velocity (km/s)",
            WhiskerParameter::StaticO2PlusFlowVelocity => "STATIC O2+ Flow Velocity (km/s)",
            WhiskerParameter::StaticHPlusDirection => "STATIC H+ Characteristic Direction",
            WhiskerParameter::StaticPickupIonDirection => {
                "STATIC Dominant Pickup Ion Characteristic Direction"
            }
        }
    }
}

/// Scalar parameters used to color the orbit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathColorParameter {
    #[default]
    ArDensity,
    Co2Density,
    CoDensity,
    HeDensity,
}

impl PathColorParameter {
    pub const ALL: [PathColorParameter; 4] = [
        PathColorParameter::ArDensity,
        PathColorParameter::Co2Density,
        PathColorParameter::CoDensity,
        PathColorParameter::HeDensity,
    ];

    pub fn id(self) -> &'static str {
        match self {
            PathColorParameter::ArDensity => "ngims_ar_density",
            PathColorParameter::Co2Density => "ngims_co2_density",
            PathColorParameter::CoDensity => "ngims_co_density",
            PathColorParameter::HeDensity => "ngims_he_density",
        }
    }
}

/// M-GITM model outputs.
pub const MODEL_PARAMETERS: [&str; 15] = [
    "o2plus",
    "oplus",
    "co2plus",
    "n_e",
    "co2",
    "co",
    "n2",
    "o2",
    "o",
    "Zonal_vel",
    "Merid_vel",
    "Vert_vel",
    "Temp_tn",
    "Temp_ti",
    "Temp_te",
];

/// Solar flux levels the model was run at.
pub const MODEL_SOLAR_FLUXES: [&str; 3] = ["70", "130", "200"];

fn owned(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

pub fn ephemeris_request(day: NaiveDate) -> DatasetRequest {
    DatasetRequest::new(SPICE_DATASET, owned(&EPHEMERIS_FIELDS), day_filters(day))
}

/// Nine row-major matrix elements `{prefix}_{row}_{col}`.
pub fn frame_matrix_fields() -> Vec<String> {
    (1..=3)
        .flat_map(|row| (1..=3).map(move |col| format!("{FIXED_TO_MSO_MATRIX}_{row}_{col}")))
        .collect()
}

pub fn frame_matrix_request(day: NaiveDate) -> DatasetRequest {
    DatasetRequest::new(SPICE_DATASET, frame_matrix_fields(), day_filters(day))
}

pub fn whisker_request(parameter: WhiskerParameter, day: NaiveDate) -> DatasetRequest {
    let id = parameter.id();
    DatasetRequest::new(
        parameter.dataset(),
        vec![
            "time".to_string(),
            format!("{id}_x"),
            format!("{id}_y"),
            format!("{id}_z"),
        ],
        day_filters(day),
    )
}

pub fn path_color_request(parameter: PathColorParameter, day: NaiveDate) -> DatasetRequest {
    DatasetRequest::new(
        NGIMS_DATASET,
        vec!["time".to_string(), parameter.id().to_string()],
        day_filters(day),
    )
}

/// Model shell grid for one parameter at the configured altitude and flux.
pub fn model_request(parameter: &str, shell: &ShellConfig, season: u32) -> DatasetRequest {
    DatasetRequest::new(
        MGITM_DATASET,
        vec![
            "Latitude".to_string(),
            "Longitude".to_string(),
            parameter.to_string(),
        ],
        vec![
            format!("altitude={}", shell.altitude_km),
            format!("solar_flux={}", shell.solar_flux),
            format!("solar_longitude={season}"),
        ],
    )
}
