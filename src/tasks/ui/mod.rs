pub mod cfg_merging;
pub mod cli_deserialize;
pub mod color;
pub mod logging;
