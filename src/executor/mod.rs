//! Command Executors
//!
//! Implementations of [`CommandExecutor`](crate::domain::ports::CommandExecutor):
//! - Host: spawns the real storage tools
//! - Fake: canned responses and recorded invocations, for tests

pub mod fake;
pub mod host;

pub use fake::*;
pub use host::*;

/// Render a command line for logs and error messages
pub fn render_command(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        return program.to_string();
    }
    format!("{} {}", program, args.join(" "))
}
