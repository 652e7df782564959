//! # CLI Module
//!
//! Command-line tooling over contract files.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! List every route with its dotted operation key:
//!
//! ```bash
//! contract-router routes --contract blog.yaml
//! contract-router routes --contract blog.yaml --json
//! ```
//!
//! ### `check`
//!
//! Load the contract, resolve it against echo handlers and compile the
//! route table. Exits non-zero on any contract error:
//!
//! ```bash
//! contract-router check --contract blog.yaml
//! ```
//!
//! ### `call`
//!
//! Run one request through validation, an echo handler and response
//! shaping, then print the wire response as JSON:
//!
//! ```bash
//! contract-router call --contract blog.yaml -m POST /posts \
//!     -H "authorization:Bearer t" --body '{"title":"Hello"}'
//! ```
//!
//! Server options come from `--config` (YAML, JSON or TOML) and `CONTRACT_*`
//! environment variables.

mod commands;


pub use commands::{execute, run_cli, Cli, Commands};
