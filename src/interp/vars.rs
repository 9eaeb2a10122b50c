//! Variable Resolution and the Environment Stack
//!
//! Scoping is two-level: a name resolves in the current frame or at the
//! root, never in an intermediate caller frame. Writes go through
//! `set_var`, which also runs watch scripts and bridges root-scope writes
//! to the host store.

use crate::env::{Env, EnvId, Var, ROOT_ENV};
use crate::interp::interp::Interp;
use crate::value::Value;

/// Where a write lands.
///
/// `Local` resolves two-level and overwrites what it finds; `LocalNew`
/// always creates a fresh slot in the current frame; `LocalOnly` refuses to
/// follow the resolution to the root, so a loop body can shadow a root
/// name; `Global` targets the root directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetVarMode {
    Global,
    Local,
    LocalNew,
    LocalOnly,
}

impl Interp {
    // ------------------------------------------------------------------
    // Stack
    // ------------------------------------------------------------------

    /// Push a fresh frame whose parent is the current one and make it
    /// current.
    pub fn push_env(&mut self) -> EnvId {
        self.envs.push(Env::new(Some(self.current)));
        self.current = self.envs.len() - 1;
        self.current
    }

    /// Drop the current frame and return to its parent. A no-op at the
    /// root.
    pub fn pop_env(&mut self) {
        if let Some(parent) = self.envs[self.current].parent {
            debug_assert_eq!(self.current, self.envs.len() - 1);
            self.envs.pop();
            self.current = parent;
        }
    }

    pub fn root_env(&self) -> &Env {
        &self.envs[ROOT_ENV]
    }

    pub fn current_env(&self) -> &Env {
        &self.envs[self.current]
    }

    pub(crate) fn breakrun(&self) -> bool {
        self.envs[self.current].breakrun
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    /// Two-level resolution: the given frame, else the root. Returns the
    /// owning frame's id.
    pub fn find_var(&self, env: EnvId, name: &[u8]) -> Option<EnvId> {
        if self.envs[env].vars.contains_key(name) {
            return Some(env);
        }
        if env == ROOT_ENV {
            return None;
        }
        if self.envs[ROOT_ENV].vars.contains_key(name) {
            Some(ROOT_ENV)
        } else {
            None
        }
    }

    pub fn find_local_var(&self, env: EnvId, name: &[u8]) -> Option<&Var> {
        self.envs[env].find_local(name)
    }

    pub(crate) fn var_value(&self, env: EnvId, name: &[u8]) -> Option<Value> {
        self.envs[env].vars.get(name).map(|v| v.value.clone())
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn get_var(&self, name: &[u8]) -> Value {
        self.get_var_or(name, &Value::empty())
    }

    /// Resolve a variable; absent or root-owned names consult the host
    /// store first. Precedence: local > host store (for root-scope names) >
    /// root variable > `default`.
    pub fn get_var_or(&self, name: &[u8], default: &Value) -> Value {
        let found = self.find_var(self.current, name);

        if found.is_none() || found == Some(ROOT_ENV) {
            if let Some(bytes) = self.host.get_root_var(name) {
                return Value::from_bytes(&bytes);
            }
        }

        match found {
            Some(env) => self.envs[env].vars[name].value.clone(),
            None => default.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Write a variable according to `mode`. Returns the owning frame on
    /// success; an empty name or a host-rejected root write is a no-op.
    ///
    /// Overwriting a watched variable evaluates the watch script in the
    /// frame that owns the variable, after the write is visible; the
    /// writer's current frame is restored afterwards.
    pub fn set_var(&mut self, name: &[u8], value: &Value, mode: SetVarMode) -> Option<EnvId> {
        if name.is_empty() {
            return None;
        }

        let target = if mode == SetVarMode::Global {
            ROOT_ENV
        } else {
            self.current
        };

        if mode != SetVarMode::LocalNew {
            let mut found = self.find_var(target, name);

            if mode == SetVarMode::LocalOnly
                && found == Some(ROOT_ENV)
                && target != ROOT_ENV
            {
                found = None;
            }

            let root_write =
                (found.is_none() && target == ROOT_ENV) || found == Some(ROOT_ENV);
            if root_write && !self.host.set_root_var(name, value.as_bytes()) {
                return None;
            }

            if let Some(owner) = found {
                let var = self.envs[owner]
                    .vars
                    .get_mut(name)
                    .expect("resolved variable exists");
                var.value = value.clone();
                let watch = var.watch.clone();

                if let Some(watch) = watch {
                    let save_env = self.current;
                    self.current = owner;
                    let _ = self.parse(&watch, true);
                    self.current = save_env;
                }
                return Some(owner);
            }
        }

        self.envs[target]
            .vars
            .insert(name.to_vec(), Var::new(value.clone()));
        Some(target)
    }

    /// Attach (or with an empty script, detach) a watch on a variable,
    /// creating it empty if missing.
    pub fn set_watch(&mut self, name: &[u8], script: &[u8]) {
        if name.is_empty() {
            return;
        }
        let owner = match self.find_var(self.current, name) {
            Some(env) => env,
            None => match self.set_var(name, &Value::empty(), SetVarMode::LocalNew) {
                Some(env) => env,
                None => return,
            },
        };
        if let Some(var) = self.envs[owner].vars.get_mut(name) {
            var.watch = if script.is_empty() {
                None
            } else {
                Some(script.to_vec())
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut lil = Interp::new();
        let id = lil.push_env();
        assert_ne!(id, ROOT_ENV);
        lil.pop_env();
        // popping the root is a no-op
        lil.pop_env();
        assert_eq!(lil.current, ROOT_ENV);
    }

    #[test]
    fn test_two_level_resolution_skips_middle_frames() {
        let mut lil = Interp::new();
        lil.set_var(b"x", &Value::from("root"), SetVarMode::Local);

        lil.push_env();
        lil.set_var(b"x", &Value::from("mid"), SetVarMode::LocalNew);
        lil.push_env();

        // the middle frame's binding is invisible; resolution goes to root
        assert_eq!(lil.get_var(b"x").as_bytes(), b"root");
        lil.pop_env();
        assert_eq!(lil.get_var(b"x").as_bytes(), b"mid");
        lil.pop_env();
    }

    #[test]
    fn test_local_only_shadows_root() {
        let mut lil = Interp::new();
        lil.set_var(b"i", &Value::from("root"), SetVarMode::Local);
        lil.push_env();
        lil.set_var(b"i", &Value::from("shadow"), SetVarMode::LocalOnly);
        assert_eq!(lil.get_var(b"i").as_bytes(), b"shadow");
        lil.pop_env();
        assert_eq!(lil.get_var(b"i").as_bytes(), b"root");
    }

    #[test]
    fn test_local_writes_through_to_root() {
        let mut lil = Interp::new();
        lil.set_var(b"x", &Value::from("1"), SetVarMode::Local);
        lil.push_env();
        lil.set_var(b"x", &Value::from("2"), SetVarMode::Local);
        lil.pop_env();
        assert_eq!(lil.get_var(b"x").as_bytes(), b"2");
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let mut lil = Interp::new();
        assert!(lil.set_var(b"", &Value::from("x"), SetVarMode::Local).is_none());
    }

    #[test]
    fn test_watch_fires_after_write_is_visible() {
        let mut lil = Interp::new();
        lil.parse("set x 1; watch x {set saw $x}; set x 5", false);
        assert!(!lil.has_error());
        assert_eq!(lil.get_var(b"saw").as_bytes(), b"5");
    }

    #[test]
    fn test_watch_creation_does_not_fire() {
        let mut lil = Interp::new();
        lil.parse("watch fresh {set fired 1}", false);
        assert!(lil.get_var(b"fired").is_empty());
        lil.parse("set fresh go", false);
        assert_eq!(lil.get_var(b"fired").as_bytes(), b"1");
    }

    mod host_bridge {
        use super::*;
        use crate::host::Host;
        use std::cell::RefCell;
        use std::collections::HashMap;
        use std::rc::Rc;

        #[derive(Default)]
        struct StoreHost {
            store: Rc<RefCell<HashMap<Vec<u8>, Vec<u8>>>>,
        }

        impl Host for StoreHost {
            fn set_root_var(&mut self, name: &[u8], value: &[u8]) -> bool {
                self.store
                    .borrow_mut()
                    .insert(name.to_vec(), value.to_vec());
                true
            }

            fn get_root_var(&self, name: &[u8]) -> Option<Vec<u8>> {
                self.store.borrow().get(name).cloned()
            }
        }

        #[test]
        fn test_root_writes_reach_the_store() {
            let store = Rc::new(RefCell::new(HashMap::new()));
            let mut lil = Interp::with_host(Box::new(StoreHost {
                store: store.clone(),
            }));
            lil.parse("set x 42", true);
            assert_eq!(store.borrow().get(&b"x"[..]).unwrap(), b"42");
        }

        #[test]
        fn test_store_wins_over_root_binding() {
            let store = Rc::new(RefCell::new(HashMap::new()));
            store.borrow_mut().insert(b"x".to_vec(), b"host".to_vec());
            let mut lil = Interp::with_host(Box::new(StoreHost { store }));
            assert_eq!(lil.get_var(b"x").as_bytes(), b"host");
        }

        #[test]
        fn test_local_wins_over_store() {
            let store = Rc::new(RefCell::new(HashMap::new()));
            store.borrow_mut().insert(b"x".to_vec(), b"host".to_vec());
            let mut lil = Interp::with_host(Box::new(StoreHost { store }));
            lil.push_env();
            lil.set_var(b"x", &Value::from("local"), SetVarMode::LocalNew);
            assert_eq!(lil.get_var(b"x").as_bytes(), b"local");
            lil.pop_env();
        }
    }
}
