pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, load_catalog, load_engine, load_flow_config, load_layout};
