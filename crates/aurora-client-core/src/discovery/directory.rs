//! Resolver over a directory mirror of the registry.
//!
//! Each serverset member is one `member_<sequence>` file holding the member's
//! JSON descriptor, laid out under `<root>/<serverset path>` exactly as the
//! registry nodes are. Members are ordered by sequence number so the oldest
//! live member (the elected leader) comes first.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::{DiscoveryError, EndpointResolver, ServiceInstance, Status};
use crate::cluster::ZookeeperTarget;
use crate::retry::{Clock, Deadline};

const MEMBER_PREFIX: &str = "member_";
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Polls the serverset directory on `clock` until a live member shows up.
#[derive(Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl DirectoryResolver {
    pub fn new(root: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            root: root.into(),
            clock,
        }
    }

    fn serverset_dir(&self, target: &ZookeeperTarget) -> PathBuf {
        self.root.join(target.path.trim_start_matches('/'))
    }

    fn read_members(dir: &Path) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DiscoveryError::Unavailable(format!("{}: {}", dir.display(), e))),
        };

        let mut members: Vec<(String, PathBuf)> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                name.starts_with(MEMBER_PREFIX).then(|| (name, entry.path()))
            })
            .collect();
        members.sort();

        let mut instances = Vec::with_capacity(members.len());
        for (name, path) in members {
            let data = match fs::read_to_string(&path) {
                Ok(d) => d,
                // Member vanished between listing and reading (leader stepped down).
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(DiscoveryError::Unavailable(format!("{}: {}", path.display(), e)))
                }
            };
            match ServiceInstance::unpack_json(&data) {
                Ok(inst) if inst.status == Status::Alive => instances.push(inst),
                Ok(_) => {}
                Err(e) => tracing::warn!(member = %name, "skipping serverset member: {}", e),
            }
        }
        Ok(instances)
    }
}

impl EndpointResolver for DirectoryResolver {
    fn lookup(
        &self,
        target: &ZookeeperTarget,
        timeout: Duration,
    ) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        let dir = self.serverset_dir(target);
        let clock = self.clock.as_ref();
        let deadline = Deadline::after(clock, timeout);
        loop {
            let members = Self::read_members(&dir)?;
            if !members.is_empty() {
                return Ok(members);
            }
            let remaining = deadline.remaining(clock);
            if remaining.is_zero() {
                return Err(DiscoveryError::Timeout {
                    path: target.path.clone(),
                    timeout,
                });
            }
            clock.sleep(POLL_INTERVAL.min(remaining));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::Endpoint;
    use crate::testing::FakeClock;
    use tempfile::tempdir;

    fn resolver(root: &Path) -> DirectoryResolver {
        DirectoryResolver::new(root, Arc::new(FakeClock::new()))
    }

    fn target() -> ZookeeperTarget {
        ZookeeperTarget {
            cluster: "test".to_string(),
            ensemble: "zk".to_string(),
            port: 2181,
            path: "/aurora/scheduler".to_string(),
        }
    }

    fn write_member(root: &Path, name: &str, inst: &ServiceInstance) {
        let dir = root.join("aurora/scheduler");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), inst.pack_json().unwrap()).unwrap();
    }

    #[test]
    fn members_ordered_by_sequence() {
        let root = tempdir().unwrap();
        write_member(
            root.path(),
            "member_0000000002",
            &ServiceInstance::new(Endpoint::new("follower", 8081)),
        );
        write_member(
            root.path(),
            "member_0000000001",
            &ServiceInstance::new(Endpoint::new("leader", 8081)),
        );
        fs::write(root.path().join("aurora/scheduler/lock"), "ignored").unwrap();

        let resolver = resolver(root.path());
        let members = resolver.lookup(&target(), Duration::ZERO).unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].service_endpoint.host, "leader");
    }

    #[test]
    fn dead_and_malformed_members_skipped() {
        let root = tempdir().unwrap();
        let mut dead = ServiceInstance::new(Endpoint::new("dead", 1));
        dead.status = Status::Dead;
        write_member(root.path(), "member_0000000001", &dead);
        fs::write(root.path().join("aurora/scheduler/member_0000000002"), "{not json").unwrap();
        write_member(
            root.path(),
            "member_0000000003",
            &ServiceInstance::new(Endpoint::new("alive", 2)),
        );

        let members = resolver(root.path())
            .lookup(&target(), Duration::ZERO)
            .unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].service_endpoint.host, "alive");
    }

    #[test]
    fn empty_serverset_is_polled_until_timeout() {
        let root = tempdir().unwrap();
        let clock = Arc::new(FakeClock::new());
        let err = DirectoryResolver::new(root.path(), clock.clone())
            .lookup(&target(), Duration::from_secs(10))
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Timeout { .. }));
        assert_eq!(clock.elapsed(), Duration::from_secs(10));
        assert_eq!(clock.sleeps().len(), 40);
        assert!(clock.sleeps().iter().all(|d| *d == POLL_INTERVAL));
    }

    #[test]
    fn empty_serverset_times_out() {
        let root = tempdir().unwrap();
        let err = resolver(root.path())
            .lookup(&target(), Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Timeout { .. }));
    }
}
