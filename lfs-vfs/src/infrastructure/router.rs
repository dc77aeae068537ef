//! In-process dispatch layer routing paths to registered backends.

use alloc::{
    string::{String, ToString},
    sync::Arc,
    vec::Vec,
};
use spin::RwLock;

use crate::domain::ports::{DispatchError, Dispatcher, VfsBackend};

/// Longest accepted mount point, in bytes.
pub const MOUNT_POINT_MAX: usize = 15;

/// Default number of routes a [`PathRouter`] holds.
pub const MAX_ROUTES: usize = 8;

/// Whether `mount_point` can be registered: absolute, not the root, no trailing `/`,
/// and at most [`MOUNT_POINT_MAX`] bytes.
///
/// # Examples
///
/// ```
/// use lfs_vfs::is_valid_mount_point;
///
/// assert!(is_valid_mount_point("/sdcard"));
/// assert!(!is_valid_mount_point("sdcard"));
/// assert!(!is_valid_mount_point("/sdcard/"));
/// assert!(!is_valid_mount_point("/"));
/// ```
pub fn is_valid_mount_point(mount_point: &str) -> bool {
    mount_point.len() > 1
        && mount_point.len() <= MOUNT_POINT_MAX
        && mount_point.starts_with('/')
        && !mount_point.ends_with('/')
}

struct Route {
    prefix: String,
    backend: Arc<dyn VfsBackend>,
}

/// Longest-prefix path router.
///
/// A path matches a mount point when it equals it or continues it with a `/`. The
/// backend receives the path with the mount point stripped; the mount point itself is
/// passed on as `/`.
///
/// # Examples
///
/// ```ignore
/// let router = Arc::new(PathRouter::new());
/// let mount = lfs_vfs::mount::<MyEngine, _>("/sdcard", driver, &slot, MountFlags::empty(), router.clone())?;
///
/// let (backend, path) = router.resolve("/sdcard/log.txt").unwrap();
/// assert_eq!(path, "/log.txt");
/// ```
pub struct PathRouter {
    routes: RwLock<Vec<Route>>,
    capacity: usize,
}

impl PathRouter {
    /// Router with room for [`MAX_ROUTES`] mount points.
    pub const fn new() -> Self {
        Self::with_capacity(MAX_ROUTES)
    }

    /// Router with room for `capacity` mount points.
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            routes: RwLock::new(Vec::new()),
            capacity,
        }
    }

    /// Find the backend serving `path` and the path relative to its mount point.
    pub fn resolve<'p>(&self, path: &'p str) -> Option<(Arc<dyn VfsBackend>, &'p str)> {
        let routes = self.routes.read();
        routes
            .iter()
            .filter_map(|route| {
                let rest = path.strip_prefix(route.prefix.as_str())?;
                match rest {
                    "" => Some((route, "/")),
                    _ if rest.starts_with('/') => Some((route, rest)),
                    _ => None,
                }
            })
            .max_by_key(|(route, _)| route.prefix.len())
            .map(|(route, rest)| (Arc::clone(&route.backend), rest))
    }

    /// Registered mount points, in registration order.
    pub fn mount_points(&self) -> Vec<String> {
        self.routes.read().iter().map(|route| route.prefix.clone()).collect()
    }

    /// Number of registered mount points.
    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }
}

impl Default for PathRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher for PathRouter {
    fn register(
        &self,
        mount_point: &str,
        backend: Arc<dyn VfsBackend>,
    ) -> Result<(), DispatchError> {
        if !is_valid_mount_point(mount_point) {
            return Err(DispatchError::InvalidMountPoint);
        }
        let mut routes = self.routes.write();
        if routes.iter().any(|route| route.prefix == mount_point) {
            return Err(DispatchError::AlreadyRegistered);
        }
        if routes.len() >= self.capacity {
            return Err(DispatchError::TableFull);
        }
        routes.push(Route {
            prefix: mount_point.to_string(),
            backend,
        });
        log::debug!(target: "lfs_vfs::router", "registered {}", mount_point);
        Ok(())
    }

    fn unregister(&self, mount_point: &str) -> Result<(), DispatchError> {
        let mut routes = self.routes.write();
        let index = routes
            .iter()
            .position(|route| route.prefix == mount_point)
            .ok_or(DispatchError::NotRegistered)?;
        routes.remove(index);
        log::debug!(target: "lfs_vfs::router", "unregistered {}", mount_point);
        Ok(())
    }
}
