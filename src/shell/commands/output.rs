//! Output helpers for shell commands.
//!
//! Listings are often piped into `head` or `less` when arclift runs
//! non-interactively; a closed stdout ends the command quietly instead of
//! surfacing as an error.

/// Print with newline, returning `Ok(())` from the caller on BrokenPipe.
#[macro_export]
macro_rules! print_line {
    ($($arg:tt)*) => {{
        use std::io::Write;
        match writeln!(std::io::stdout(), $($arg)*) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }};
}

use crate::tree::TreeNode;

/// Summary shown next to a directory in long listings
pub fn dir_summary(node: &TreeNode) -> String {
    let files = node.file_count();
    let dirs = node.dir_count();
    match (files, dirs) {
        (0, 0) => "empty".to_string(),
        (f, 0) => format!("{f} file{}", plural(f)),
        (f, d) => format!("{f} file{}, {d} dir{}", plural(f), plural(d)),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
