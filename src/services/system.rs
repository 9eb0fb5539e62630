use camino::Utf8Path;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Endpoints tried, in order, by the connectivity check.
pub const CONNECTIVITY_TARGETS: [&str; 4] = ["8.8.8.8:53", "1.1.1.1:53", "9.9.9.9:53", "gentoo.org:80"];

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Read-only facts about the host the run depends on.
#[cfg_attr(test, mockall::automock)]
pub trait SystemProbe {
    /// Whether the effective user is root.
    fn is_root(&self) -> bool;

    /// Bytes available to unprivileged users on the filesystem holding `path`.
    fn free_space_bytes(&self, path: &Utf8Path) -> io::Result<u64>;

    /// Whether `program` resolves on `PATH`.
    fn has_tool(&self, program: &str) -> bool;

    fn cpu_count(&self) -> usize;
}

/// The machine this process runs on.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostSystem;

impl SystemProbe for HostSystem {
    fn is_root(&self) -> bool {
        nix::unistd::Uid::effective().is_root()
    }

    fn free_space_bytes(&self, path: &Utf8Path) -> io::Result<u64> {
        let stat = nix::sys::statvfs::statvfs(path.as_std_path()).map_err(io::Error::from)?;
        Ok(stat.blocks_available() as u64 * stat.fragment_size() as u64)
    }

    fn has_tool(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn cpu_count(&self) -> usize {
        num_cpus::get()
    }
}

/// True as soon as one target accepts a TCP connection within `per_target`.
pub async fn has_connectivity(targets: &[&str], per_target: Duration) -> bool {
    for target in targets {
        match timeout(per_target, TcpStream::connect(*target)).await {
            Ok(Ok(_)) => {
                tracing::debug!("Connectivity confirmed via {}", target);
                return true;
            }
            Ok(Err(e)) => tracing::debug!("Connect to {} failed: {}", target, e),
            Err(_) => tracing::debug!("Connect to {} timed out", target),
        }
    }
    false
}
