//! Test helpers for observing processes through `/proc`.

use std::path::Path;
use std::time::{Duration, Instant};

/// Pid written by a test script, e.g. `echo $! > pidfile`.
pub(crate) fn read_pid(pidfile: &Path) -> i32 {
    let content = std::fs::read_to_string(pidfile).unwrap();
    content.trim().parse().unwrap()
}

/// A process has exited once its `/proc` entry is gone or it is a zombie
/// waiting to be reaped by whoever inherited it.
pub(crate) fn has_exited(pid: i32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{}/stat", pid)) else {
        return true;
    };
    // State is the first field after the parenthesised command name.
    let state = stat
        .rsplit_once(')')
        .and_then(|(_, rest)| rest.trim_start().chars().next());
    state == Some('Z')
}

pub(crate) async fn wait_for_exit(pid: i32, within: Duration) -> bool {
    let deadline = Instant::now() + within;
    loop {
        if has_exited(pid) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_process_has_not_exited() {
        assert!(!has_exited(std::process::id() as i32));
    }

    #[tokio::test]
    async fn test_killed_process_is_seen_as_exited() {
        let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id() as i32;
        assert!(!has_exited(pid));

        child.kill().unwrap();
        // Unreaped: shows up as a zombie.
        assert!(wait_for_exit(pid, Duration::from_secs(2)).await);
        child.wait().unwrap();
        assert!(has_exited(pid));
    }
}
