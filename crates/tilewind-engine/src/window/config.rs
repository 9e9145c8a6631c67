use crate::engine::EngineArgs;
use crate::native::WindowFlags;

/// How many draw failures in a row a window loop tolerates.
///
/// A failed draw skips that frame's `after_frame` hooks. Reaching the limit
/// ends the loop with [`crate::error::WindowError::DrawFailed`]; any
/// successful draw resets the count.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawFailurePolicy {
    pub max_consecutive_failures: u32,
}

impl DrawFailurePolicy {
    /// Ends the loop on the first failed draw.
    pub const fn fail_fast() -> Self {
        Self {
            max_consecutive_failures: 1,
        }
    }

    /// Ends the loop after `n` failures in a row (at least one).
    pub fn tolerate(n: u32) -> Self {
        Self {
            max_consecutive_failures: n.max(1),
        }
    }
}

impl Default for DrawFailurePolicy {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 3,
        }
    }
}

/// Window creation parameters.
///
/// `engine: Some(args)` makes the window create and own its engine;
/// `None` leaves it without one until an engine is attached or a managed
/// [`crate::engine::EngineRef`] is set.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: Option<String>,
    /// CRT overlay image, if any.
    pub overlay: Option<String>,
    pub flags: WindowFlags,
    /// Native window pumps its events on its own thread.
    pub threaded: bool,
    /// Start the frame loop as soon as the window is open.
    pub autostart: bool,
    pub engine: Option<EngineArgs>,
    pub failure_policy: DrawFailurePolicy,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: None,
            overlay: None,
            flags: WindowFlags::default(),
            threaded: false,
            autostart: true,
            engine: Some(EngineArgs::default()),
            failure_policy: DrawFailurePolicy::default(),
        }
    }
}

impl WindowConfig {
    /// Window whose engine is provided later.
    pub fn managed() -> Self {
        Self::default().without_engine()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_overlay(mut self, overlay: impl Into<String>) -> Self {
        self.overlay = Some(overlay.into());
        self
    }

    pub fn with_flags(mut self, flags: WindowFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_threaded(mut self, threaded: bool) -> Self {
        self.threaded = threaded;
        self
    }

    pub fn with_autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }

    pub fn with_engine(mut self, args: EngineArgs) -> Self {
        self.engine = Some(args);
        self
    }

    /// No owned engine; see [`managed`](Self::managed).
    pub fn without_engine(mut self) -> Self {
        self.engine = None;
        self
    }

    pub fn with_failure_policy(mut self, policy: DrawFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_owns_an_engine_and_autostarts() {
        let cfg = WindowConfig::default();
        assert!(cfg.autostart);
        assert!(!cfg.threaded);
        assert!(cfg.engine.as_ref().is_some_and(EngineArgs::is_default));
        assert_eq!(cfg.failure_policy.max_consecutive_failures, 3);
    }

    #[test]
    fn managed_has_no_engine() {
        let cfg = WindowConfig::managed().with_title("demo").with_autostart(false);
        assert!(cfg.engine.is_none());
        assert_eq!(cfg.title.as_deref(), Some("demo"));
        assert!(!cfg.autostart);
    }

    #[test]
    fn tolerate_never_drops_below_one() {
        assert_eq!(DrawFailurePolicy::tolerate(0), DrawFailurePolicy::fail_fast());
        assert_eq!(DrawFailurePolicy::tolerate(5).max_consecutive_failures, 5);
    }
}
