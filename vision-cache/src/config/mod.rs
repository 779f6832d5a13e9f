//! Configuration file support.
//!
//! Settings live in `config.ini`, with one section per tier plus
//! `[hierarchy]` and `[result_cache]`. Missing files and keys fall back to
//! the defaults of the corresponding config structs.
//!
//! # Example
//!
//! ```no_run
//! use vision_cache::config::CacheSettings;
//!
//! let settings = CacheSettings::load()?;
//! println!("memory entries: {}", settings.hierarchy.memory.max_size);
//! # Ok::<(), vision_cache::config::ConfigFileError>(())
//! ```

mod file;
mod parser;
mod size;
mod writer;

pub use file::{config_directory, config_file_path, CacheSettings, ConfigFileError};
pub use size::{format_size, parse_size, SizeParseError};
