//! Host capability
//!
//! The debugger never reaches into an application directly. A [`HostApp`] exposes
//! the live widget root, dispatches handlers through the installed hooks, and runs
//! the application until it exits, fails or is interrupted.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RunError;
use crate::inspect::Inspectable;
use crate::profile::PerformanceMetric;
use crate::trace::DispatchHook;

/// A running application the debugger can attach to
#[async_trait]
pub trait HostApp: Send {
    /// Application name for reports
    fn name(&self) -> &str;

    /// Composed widget root, when the application has one yet
    fn root(&self) -> Option<&dyn Inspectable>;

    /// Handler methods the application defines
    fn handler_names(&self) -> Vec<String>;

    /// Wrap handler dispatch with `hook` until [`HostApp::remove_hooks`]
    fn install_hook(&mut self, hook: Arc<dyn DispatchHook>);

    /// Restore plain dispatch
    fn remove_hooks(&mut self);

    /// Profile rows the host measured itself since the last call, if any
    fn take_profile(&mut self) -> Vec<PerformanceMetric> {
        Vec::new()
    }

    /// Run to completion
    ///
    /// # Errors
    /// [`RunError::Interrupted`] on user interrupt, [`RunError::Failed`] when the
    /// application raised.
    async fn run(&mut self) -> Result<(), RunError>;
}
