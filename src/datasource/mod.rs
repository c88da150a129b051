//! Remote time-series data service (LaTiS) client.

use bevy::prelude::*;

pub mod cache;
pub mod catalog;
pub mod fetcher;
pub mod types;

pub use catalog::{PathColorParameter, WhiskerParameter};
pub use fetcher::{DataSource, LatisSource, start_data_worker};
pub use types::{
    DataChannels, DataTable, DatasetKind, DatasetRequest, FetchCommand, FetchResult,
    parse_timestamp,
};

use crate::config::VizConfig;
use cache::DatasetCache;

pub fn setup_data_worker(mut commands: Commands, config: Res<VizConfig>) {
    let cache = match DatasetCache::new(config.cache_expiration_hours) {
        Ok(cache) => Some(cache),
        Err(err) => {
            warn!("dataset cache disabled: {err}");
            None
        }
    };
    let source = LatisSource::new(config.latis_base_url.clone(), cache);
    commands.insert_resource(start_data_worker(source));
    info!("dataset worker started ({})", config.latis_base_url);
}
