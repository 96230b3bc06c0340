//! The process-scoped services every command shares: the source roots, the
//! command queue, the remote URL cache, and the package metadata loader.

use std::sync::Arc;

use crate::error::Result;
use crate::exec::CommandQueue;
use crate::gopath::SourceRoots;
use crate::imports::{GoListLoader, PackageLoader};
use crate::remote::RemoteResolver;

/// Shared handles for one run. Cloning shares the underlying services.
#[derive(Clone)]
pub struct Workspace {
    roots: Arc<SourceRoots>,
    queue: CommandQueue,
    remotes: RemoteResolver,
    loader: Arc<dyn PackageLoader>,
}

impl Workspace {
    /// Creates the default services for `roots`: a command queue with the
    /// standard limit, an HTTP-backed remote resolver, and `go list`.
    pub fn new(roots: SourceRoots) -> Result<Self> {
        let loader = Arc::new(GoListLoader::new(&roots));
        Ok(Self::with_services(
            roots,
            CommandQueue::new()?,
            RemoteResolver::default(),
            loader,
        ))
    }

    /// Creates a workspace from explicit services.
    pub fn with_services(
        roots: SourceRoots,
        queue: CommandQueue,
        remotes: RemoteResolver,
        loader: Arc<dyn PackageLoader>,
    ) -> Self {
        Self {
            roots: Arc::new(roots),
            queue,
            remotes,
            loader,
        }
    }

    pub fn roots(&self) -> &SourceRoots {
        &self.roots
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn remotes(&self) -> &RemoteResolver {
        &self.remotes
    }

    pub fn loader(&self) -> &dyn PackageLoader {
        self.loader.as_ref()
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}
