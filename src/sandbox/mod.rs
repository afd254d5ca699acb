//! Ghost mode: running a tool against a filtered view of the project.
//!
//! The downstream tool is started inside a throwaway symlink farm that mirrors
//! the project minus the files hidden by the active exclude/include patterns,
//! with its configuration injected through the environment instead of the
//! project's own config files.
//!
//! # Lifecycle
//!
//! 1. Leftover sandboxes from crashed runs are swept ([`SymlinkFarm::sweep_orphans`])
//! 2. Project files are discovered ([`discover_files`]) and filtered ([`PathFilter`])
//! 3. The farm is built ([`SymlinkFarm::create`]) and owned by a [`SandboxGuard`]
//! 4. Signal forwarders are installed, then the process is spawned
//! 5. After exit the forwarders are removed and the guard cleans up
//!
//! [`GhostSession`] drives these steps.

mod discovery;
pub mod farm;
mod filter;
mod guard;
mod session;

pub use discovery::{discover_files, walk};
pub use farm::{SymlinkFarm, cleanup, removing_path, sweep_orphans};
pub use filter::PathFilter;
pub use guard::SandboxGuard;
pub use session::{GhostSession, build_env, locate_command};
