// navgraph-shared - ambient support code for the navgraph workspace
//
// Logging setup, INI configuration with environment overrides, a
// little-endian byte buffer for the mesh codec and the content digest
// used to key the parse cache.

pub mod config;
pub mod digest;
pub mod log;
pub mod util;

/// Default configuration file name used by the command-line tools
pub const DEFAULT_CONFIG_FILE: &str = "navgraph.conf";

/// Environment variable prefix for configuration overrides
pub const CONFIG_ENV_PREFIX: &str = "Navgraph_";
