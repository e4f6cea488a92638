//! Environment overrides: FOOTPRINTS_ENDPOINT_URL, FOOTPRINTS_DEBUG,
//! FOOTPRINTS_LOGGING__LEVEL, ...

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("FOOTPRINTS")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
