pub mod clock;
pub mod paths;
pub mod registry;
pub mod settings;
pub mod types;

pub use clock::cycle_timestamp;
pub use paths::LookoutPaths;
pub use registry::Registry;
pub use settings::Settings;
pub use types::*;
