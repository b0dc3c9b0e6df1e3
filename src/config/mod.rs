//! Configuration management.
//!
//! Configuration is stored in TOML format. The search order is:
//! 1. `./acton-script-agents.toml` (project-local)
//! 2. `~/.config/acton-script-agents/config.toml` (XDG config)
//!
//! Every key is optional.
//!
//! ```toml
//! script_dir = "/etc/acton/scripts"
//! schema_dirs = ["/etc/acton/scripts"]
//! default_timeout_secs = 10
//!
//! [limits]
//! max_operations = 0
//! max_call_levels = 64
//!
//! [logging]
//! enabled = true
//! level = "info"
//! filter = "acton_script_agents::script=debug"
//! ```

mod file;
mod types;

pub use file::{from_path, from_str, load, search_paths, xdg_config_dir};
pub use types::{ProviderConfig, DEFAULT_SCRIPT_DIR, DEFAULT_TIMEOUT_SECS, MAX_TIMEOUT_SECS};
