#![forbid(unsafe_code)]

//! Exclusive module activation.
//!
//! Exactly one [`ModuleId`] is active at a time. [`ModuleRouter::navigate`]
//! performs a transition and lets every [`TransitionHook`] react to it: all
//! `on_exit` calls run first, then all `on_enter` calls, and the commands
//! they return are batched in that order. Navigating to the active module is
//! a no-op and runs no hooks.

use espejo_core::module::ModuleId;

use crate::program::Cmd;

/// A real change of the active module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ModuleId,
    pub to: ModuleId,
}

impl Transition {
    /// Whether this transition leaves `module`.
    #[must_use]
    pub fn leaves(&self, module: ModuleId) -> bool {
        self.from == module
    }

    /// Whether this transition enters `module`.
    #[must_use]
    pub fn enters(&self, module: ModuleId) -> bool {
        self.to == module
    }
}

/// Reaction of one component to module transitions.
pub trait TransitionHook {
    fn on_exit(&mut self, _transition: Transition) -> Cmd {
        Cmd::none()
    }

    fn on_enter(&mut self, _transition: Transition) -> Cmd {
        Cmd::none()
    }
}

/// Tracks the active module.
#[derive(Debug, Clone, Default)]
pub struct ModuleRouter {
    active: ModuleId,
}

impl ModuleRouter {
    /// Router starting at the landing module.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn active(&self) -> ModuleId {
        self.active
    }

    #[must_use]
    pub fn is_active(&self, module: ModuleId) -> bool {
        self.active == module
    }

    /// Make `target` active. Returns the transition, or `None` when
    /// `target` was already active.
    pub fn switch_module(&mut self, target: ModuleId) -> Option<Transition> {
        if self.active == target {
            return None;
        }
        let transition = Transition {
            from: self.active,
            to: target,
        };
        self.active = target;
        tracing::info!(from = %transition.from, to = %transition.to, "module switched");
        Some(transition)
    }

    /// Switch to `target` and run the hooks for the transition.
    pub fn navigate(
        &mut self,
        target: ModuleId,
        hooks: &mut [&mut dyn TransitionHook],
    ) -> Cmd {
        let Some(transition) = self.switch_module(target) else {
            return Cmd::none();
        };
        let mut cmds = Vec::with_capacity(hooks.len() * 2);
        for hook in hooks.iter_mut() {
            cmds.push(hook.on_exit(transition));
        }
        for hook in hooks.iter_mut() {
            cmds.push(hook.on_enter(transition));
        }
        Cmd::batch(cmds)
    }

    /// Visibility of every module in registry order.
    #[must_use]
    pub fn visibility(&self) -> Vec<(ModuleId, bool)> {
        ModuleId::ALL
            .iter()
            .map(|&id| (id, id == self.active))
            .collect()
    }
}
