//! # Hook Pipeline
//!
//! Every entity class declares an ordered list of [`Hook`]s. A hook is a
//! named, fallible, pure transformation `T -> Result<T, HookFailure>`.
//! [`call_hooks`] runs `defaulted()` and then each hook in order, threading
//! ownership of the entity through the chain. [`run_hooks`] skips
//! `defaulted()` for partial updates, whose unset fields must stay unset.
//!
//! ## Contract
//!
//! - Order is significant. Key computation comes after the hooks that
//!   normalize the fields it reads.
//! - Fail-fast: the first failing hook aborts the chain. The entity is
//!   consumed, so a half-normalized value cannot reach persistence.
//! - Idempotent: running the pipeline on its own output is a no-op.

use crate::error::{HookError, HookFailure};
use crate::model::Model;

/// Result type returned by a single hook.
pub type HookResult<T> = Result<T, HookFailure>;

/// A named normalization or validation step.
pub struct Hook<T> {
    /// Human-readable description, reported in [`HookError`].
    pub description: &'static str,
    /// The transformation.
    pub call: fn(T) -> HookResult<T>,
}

impl<T> Hook<T> {
    /// Declare a hook.
    pub const fn new(description: &'static str, call: fn(T) -> HookResult<T>) -> Self {
        Self { description, call }
    }
}

impl<T> Clone for Hook<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Hook<T> {}

impl<T> std::fmt::Debug for Hook<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook").field("description", &self.description).finish()
    }
}

/// Run `defaulted()` and then every hook of `M`, in order.
///
/// # Errors
///
/// Returns [`HookError`] naming the first hook that failed. Hooks after it
/// do not run.
pub fn call_hooks<M: Model>(model: M) -> Result<M, HookError> {
    run_hooks(model.defaulted())
}

/// Run every hook of `M`, in order, without `defaulted()`.
///
/// # Errors
///
/// As [`call_hooks`].
pub fn run_hooks<M: Model>(mut model: M) -> Result<M, HookError> {
    for hook in M::hooks() {
        let entity = model.discriminator();
        tracing::trace!(entity, hook = hook.description, "running hook");
        model = (hook.call)(model).map_err(|reason| {
            tracing::debug!(entity, hook = hook.description, %reason, "hook rejected entity");
            HookError {
                entity: entity.to_string(),
                hook: hook.description,
                reason,
            }
        })?;
    }
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Gadget {
        name: String,
        key: String,
        defaulted: bool,
    }

    fn trim(mut p: Gadget) -> HookResult<Gadget> {
        p.name = p.name.trim().to_lowercase();
        Ok(p)
    }

    fn reject_empty(p: Gadget) -> HookResult<Gadget> {
        if p.name.is_empty() {
            return Err(HookFailure::new("name is required"));
        }
        Ok(p)
    }

    fn compute_key(mut p: Gadget) -> HookResult<Gadget> {
        p.key = format!("#gadget#{}", p.name);
        Ok(p)
    }

    const HOOKS: &[Hook<Gadget>] = &[
        Hook::new("trim name", trim),
        Hook::new("require name", reject_empty),
        Hook::new("compute key", compute_key),
    ];

    impl Model for Gadget {
        fn discriminator(&self) -> &'static str {
            "gadget"
        }

        fn defaulted(mut self) -> Self {
            self.defaulted = true;
            self
        }

        fn hooks() -> &'static [Hook<Self>] {
            HOOKS
        }
    }

    #[test]
    fn runs_defaulted_then_hooks_in_order() {
        let p = Gadget {
            name: "  Widget ".into(),
            ..Default::default()
        };
        let p = call_hooks(p).unwrap();
        assert!(p.defaulted);
        assert_eq!(p.name, "widget");
        assert_eq!(p.key, "#gadget#widget");
    }

    #[test]
    fn run_hooks_leaves_defaults_unset() {
        let p = run_hooks(Gadget {
            name: " Widget".into(),
            ..Default::default()
        })
        .unwrap();
        assert!(!p.defaulted);
        assert_eq!(p.key, "#gadget#widget");
    }

    #[test]
    fn pipeline_is_idempotent() {
        let once = call_hooks(Gadget {
            name: "Widget".into(),
            ..Default::default()
        })
        .unwrap();
        let twice = call_hooks(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn stops_at_first_failure() {
        let err = call_hooks(Gadget::default()).unwrap_err();
        assert_eq!(err.entity, "gadget");
        assert_eq!(err.hook, "require name");
        assert_eq!(err.reason, HookFailure::new("name is required"));
    }

    #[test]
    fn later_hooks_do_not_run_after_failure() {
        use std::sync::atomic::{AtomicBool, Ordering};

        static RAN: AtomicBool = AtomicBool::new(false);

        #[derive(Default)]
        struct Doomed;

        fn fail(_: Doomed) -> HookResult<Doomed> {
            Err(HookFailure::new("boom"))
        }

        fn mark(d: Doomed) -> HookResult<Doomed> {
            RAN.store(true, Ordering::SeqCst);
            Ok(d)
        }

        const DOOMED_HOOKS: &[Hook<Doomed>] = &[Hook::new("fail", fail), Hook::new("mark", mark)];

        impl Model for Doomed {
            fn discriminator(&self) -> &'static str {
                "doomed"
            }

            fn defaulted(self) -> Self {
                self
            }

            fn hooks() -> &'static [Hook<Self>] {
                DOOMED_HOOKS
            }
        }

        let err = call_hooks(Doomed).err().unwrap();
        assert_eq!(err.hook, "fail");
        assert!(!RAN.load(Ordering::SeqCst));
    }
}
