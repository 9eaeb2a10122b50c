//! Environments
//!
//! One `Env` is a frame of the variable-scope stack: an insertion-ordered
//! map of named variables plus the control state the evaluator threads
//! through it (pending return value, break-run flag, the executing function
//! or the command name a catcher was invoked for).
//!
//! Frames live in an arena (`Vec<Env>`) owned by the interpreter and are
//! addressed by index; the root is index 0. Pushes and pops are strictly
//! LIFO, while the interpreter's notion of the *current* frame may point
//! anywhere on the stack (`upeval`, `topeval`, `downeval` and watch
//! dispatch move it without pushing).

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::interp::interp::Function;
use crate::value::Value;

/// Index of an environment in the interpreter's arena.
pub type EnvId = usize;

/// The root environment's id.
pub const ROOT_ENV: EnvId = 0;

/// A named variable slot: the owned value plus an optional watch script
/// evaluated (in the owning environment) after every write.
#[derive(Clone, Debug)]
pub struct Var {
    pub(crate) value: Value,
    pub(crate) watch: Option<Vec<u8>>,
}

impl Var {
    pub(crate) fn new(value: Value) -> Self {
        Self { value, watch: None }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// One frame of the scope stack.
pub struct Env {
    pub(crate) parent: Option<EnvId>,
    pub(crate) vars: IndexMap<Vec<u8>, Var>,
    /// The script function executing in this frame, if any.
    pub(crate) func: Option<Rc<RefCell<Function>>>,
    /// The command name that triggered the catcher, when this frame is a
    /// catcher invocation.
    pub(crate) catcher_for: Option<Value>,
    pub(crate) retval: Option<Value>,
    pub(crate) retval_set: bool,
    pub(crate) breakrun: bool,
}

impl Env {
    pub(crate) fn new(parent: Option<EnvId>) -> Self {
        Self {
            parent,
            vars: IndexMap::new(),
            func: None,
            catcher_for: None,
            retval: None,
            retval_set: false,
            breakrun: false,
        }
    }

    /// Look a name up in this frame only.
    pub fn find_local(&self, name: &[u8]) -> Option<&Var> {
        self.vars.get(name)
    }

    pub fn parent(&self) -> Option<EnvId> {
        self.parent
    }

    /// Variable names in insertion order.
    pub fn var_names(&self) -> impl Iterator<Item = &[u8]> {
        self.vars.keys().map(|k| k.as_slice())
    }
}
