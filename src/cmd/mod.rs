//! CLI command implementations.
//!
//! | Module      | Commands handled  |
//! |-------------|-------------------|
//! | `serve`     | `Serve`           |
//! | `init_db`   | `InitDb`          |
//! | `password`  | `HashPassword`    |
//! | `config`    | `Config`          |

pub mod config;
pub mod init_db;
pub mod password;
pub mod serve;

pub use config::{cmd_config, load_config};
pub use init_db::cmd_init_db;
pub use password::cmd_hash_password;
pub use serve::{ServeOverrides, cmd_serve};
