//! Scoped ownership of provisioned infrastructure
//!
//! A [`Deployment`] is armed before anything is applied. From that moment
//! destroy runs exactly once: either through [`Deployment::destroy`] or when
//! the guard is dropped, which covers early returns, failed assertions and
//! panics. A failed apply still gets a destroy, since it may have created
//! part of the module before failing.

use crate::config::ModuleConfig;
use crate::error::{Error, Result};
use crate::terraform::{OutputSet, Provisioner};

type DestroyFailureHook<'p> = Box<dyn FnOnce(&Error) + 'p>;

pub struct Deployment<'p, P: Provisioner + ?Sized> {
    provisioner: &'p P,
    config: ModuleConfig,
    destroyed: bool,
    on_failed_destroy: Option<DestroyFailureHook<'p>>,
}

impl<'p, P: Provisioner + ?Sized> Deployment<'p, P> {
    pub fn new(provisioner: &'p P, config: ModuleConfig) -> Self {
        tracing::debug!(dir = %config.directory().display(), "deployment armed");
        Self {
            provisioner,
            config,
            destroyed: false,
            on_failed_destroy: None,
        }
    }

    /// Run `hook` if destroy fails, whether it was called explicitly or
    /// from `Drop`. Values the hook owns live as long as the guard.
    pub fn on_failed_destroy(mut self, hook: impl FnOnce(&Error) + 'p) -> Self {
        self.on_failed_destroy = Some(Box::new(hook));
        self
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn init_and_apply(&self) -> Result<OutputSet> {
        self.provisioner.init_and_apply(&self.config)
    }

    pub fn output(&self, name: &str) -> Result<String> {
        self.provisioner.output(&self.config, name)
    }

    /// Destroy now and report the result. Disarms the guard.
    pub fn destroy(mut self) -> Result<()> {
        self.destroy_once()
    }

    fn destroy_once(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.destroyed = true;
        tracing::info!(dir = %self.config.directory().display(), "destroying deployment");
        let result = self.provisioner.destroy(&self.config);
        if let (Err(e), Some(hook)) = (&result, self.on_failed_destroy.take()) {
            hook(e);
        }
        result
    }
}

impl<P: Provisioner + ?Sized> Drop for Deployment<'_, P> {
    fn drop(&mut self) {
        if self.destroyed {
            return;
        }
        if std::thread::panicking() {
            tracing::warn!("cleaning up deployment during panic");
        }
        if let Err(e) = self.destroy_once() {
            tracing::error!("destroy failed, resources may be left behind: {e}");
        }
    }
}
