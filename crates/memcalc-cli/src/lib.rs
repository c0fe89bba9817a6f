//! Library wrapper around the `memcalc` CLI implementation.
//!
//! The CLI is exercised through its binary (`src/main.rs`) and integration tests. Compiling the
//! binary crate root as a module here lets `cargo test -p memcalc-cli --lib` typecheck it and run
//! its unit tests without building the integration suite.
//!
//! Note: `fn main()` inside `main.rs` is just another function when compiled as a module.

#[allow(dead_code)]
#[path = "main.rs"]
mod main_bin;
