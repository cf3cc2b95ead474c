//! Shared process helpers.

use tokio::process::Command;

/// Detach a child from this process: no console window and a new process
/// group on Windows, a new process group on Unix. The child then survives
/// the debug session that launched it and does not receive our Ctrl+C.
#[cfg(target_os = "windows")]
pub fn apply_detach_flags(cmd: &mut Command) -> &mut Command {
    const DETACHED_PROCESS: u32 = 0x00000008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
    const CREATE_NO_WINDOW: u32 = 0x08000000;
    cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP | CREATE_NO_WINDOW)
}

#[cfg(unix)]
pub fn apply_detach_flags(cmd: &mut Command) -> &mut Command {
    cmd.process_group(0)
}

#[cfg(not(any(unix, target_os = "windows")))]
pub fn apply_detach_flags(cmd: &mut Command) -> &mut Command {
    cmd
}
