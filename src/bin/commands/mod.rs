pub mod build_cmd;
pub mod cidr_cmd;
pub mod lookup_cmd;
pub mod utils;

pub use build_cmd::{cmd_build, OutputFormat};
pub use cidr_cmd::cmd_cidr;
pub use lookup_cmd::cmd_lookup;
