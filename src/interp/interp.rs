//! Interpreter Core
//!
//! The `Interp` owns everything: the environment arena, the command
//! registry, the parse cursor and the sticky error slot. The evaluator is
//! here as well: `parse` drives the command loop, dispatching each parsed
//! word list to a native procedure or a script function.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::commands;
use crate::env::{Env, EnvId, ROOT_ENV};
use crate::host::{Host, NoopHost};
use crate::interp::errors::{ErrorKind, LilError};
use crate::list::List;
use crate::value::Value;

/// Unknown-command catcher invocations may nest (the catcher itself may hit
/// unknown commands) up to this depth before the lookup fails hard.
pub(crate) const MAX_CATCHER_DEPTH: usize = 16384;

/// A native command procedure. Receives the arguments after the command
/// name; signals failure by setting the interpreter's error slot (the
/// return value is not consulted for errors).
pub type NativeFn = Rc<dyn Fn(&mut Interp, &[Value]) -> Option<Value>>;

/// How a registered command is implemented.
#[derive(Clone)]
pub enum Callable {
    Native(NativeFn),
    Script { argnames: List, body: Value },
}

/// A registered command: native procedure or script function. Lives in the
/// registry until explicitly deleted or the interpreter is dropped.
pub struct Function {
    pub(crate) name: Vec<u8>,
    pub(crate) callable: Callable,
}

impl Function {
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn is_native(&self) -> bool {
        matches!(self.callable, Callable::Native(_))
    }
}

/// An embeddable interpreter instance. Strictly single-threaded; create one
/// per thread if you need several.
pub struct Interp {
    pub(crate) host: Box<dyn Host>,

    /// Environment arena; index 0 is the root, pushes/pops are LIFO.
    pub(crate) envs: Vec<Env>,
    /// The frame commands currently run in. Not necessarily the top of the
    /// arena: `upeval`/`topeval`/`downeval` and watch dispatch repoint it.
    pub(crate) current: EnvId,
    /// Target frame for `downeval`, set while an `upeval`/`topeval` runs.
    pub(crate) downenv: Option<EnvId>,

    /// Registered commands in insertion order; `cmdmap` indexes them by
    /// name. The first `syscmds` entries are the system set registered at
    /// construction, everything after is user-defined.
    pub(crate) cmds: Vec<Rc<RefCell<Function>>>,
    pub(crate) cmdmap: HashMap<Vec<u8>, Rc<RefCell<Function>>>,
    pub(crate) syscmds: usize,

    /// Unknown-command handler script, if installed.
    pub(crate) catcher: Option<Vec<u8>>,
    pub(crate) in_catcher: usize,

    /// Expansion of `$name` re-parses `<dollar_prefix><name>`.
    pub(crate) dollar_prefix: Vec<u8>,

    pub(crate) error: Option<LilError>,
    /// Message of the most recent error, kept for `reflect error` even
    /// after the sticky slot is consumed.
    pub(crate) last_error_msg: Option<String>,

    pub(crate) parse_depth: usize,
    pub(crate) max_parse_depth: Option<usize>,

    // Parse cursor. Saved and restored around re-entrant invocations.
    pub(crate) code: Rc<[u8]>,
    pub(crate) head: usize,
    pub(crate) ignore_eol: bool,
    /// How many cursor save/restore scopes are active (parses and
    /// substitutions); used to detect the outermost submission.
    pub(crate) cursor_depth: usize,
    /// The outermost code submitted to `parse`, for introspection.
    pub(crate) root_code: Rc<[u8]>,
}

impl Interp {
    /// A new interpreter with the no-op host and the standard command set.
    pub fn new() -> Self {
        Self::with_host(Box::new(NoopHost))
    }

    pub fn with_host(host: Box<dyn Host>) -> Self {
        let mut interp = Self {
            host,
            envs: vec![Env::new(None)],
            current: ROOT_ENV,
            downenv: None,
            cmds: Vec::new(),
            cmdmap: HashMap::new(),
            syscmds: 0,
            catcher: None,
            in_catcher: 0,
            dollar_prefix: b"set ".to_vec(),
            error: None,
            last_error_msg: None,
            parse_depth: 0,
            max_parse_depth: Some(10_000),
            code: Rc::from(&b""[..]),
            head: 0,
            ignore_eol: false,
            cursor_depth: 0,
            root_code: Rc::from(&b""[..]),
        };
        commands::register_stdcmds(&mut interp);
        interp.syscmds = interp.cmds.len();
        interp
    }

    // ------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------

    /// Raise an unanchored error; the evaluator will anchor it at the
    /// failing command's start offset. First error wins, later ones are
    /// dropped until the slot is consumed.
    pub fn set_error(&mut self, kind: ErrorKind, message: impl Into<String>) {
        if self.error.is_none() {
            let message = message.into();
            self.last_error_msg = Some(message.clone());
            self.error = Some(LilError::unanchored(kind, message));
        }
    }

    /// Raise an error at a byte offset into the code being parsed.
    pub fn set_error_at(&mut self, position: usize, kind: ErrorKind, message: impl Into<String>) {
        if self.error.is_none() {
            let message = message.into();
            self.last_error_msg = Some(message.clone());
            self.error = Some(LilError::at(kind, position, message));
        }
    }

    pub(crate) fn set_error_unbalanced(&mut self, expected: u8) {
        let position = self.head;
        self.set_error_at(
            position,
            ErrorKind::Unbalanced,
            format!("expected {}", expected as char),
        );
    }

    /// Consume the sticky error, re-enabling evaluation.
    pub fn error(&mut self) -> Option<LilError> {
        self.error.take()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    // ------------------------------------------------------------------
    // Command registry
    // ------------------------------------------------------------------

    /// Install a native command, replacing any existing command with the
    /// same name.
    pub fn register<F>(&mut self, name: impl AsRef<[u8]>, proc: F)
    where
        F: Fn(&mut Interp, &[Value]) -> Option<Value> + 'static,
    {
        self.register_native(name.as_ref(), Rc::new(proc));
    }

    pub(crate) fn register_native(&mut self, name: &[u8], proc: NativeFn) {
        let func = self.add_func(name);
        func.borrow_mut().callable = Callable::Native(proc);
    }

    pub(crate) fn define_script_fn(&mut self, name: &[u8], argnames: List, body: Value) {
        let func = self.add_func(name);
        func.borrow_mut().callable = Callable::Script { argnames, body };
    }

    /// Look a command up by name. Names may carry sub-names after a dot:
    /// everything from the first `.` on is ignored, so `foo.bar` resolves
    /// to `foo`.
    pub fn find_cmd(&self, name: &[u8]) -> Option<Rc<RefCell<Function>>> {
        let base = match name.iter().position(|&b| b == b'.') {
            Some(dot) => &name[..dot],
            None => name,
        };
        self.cmdmap.get(base).cloned()
    }

    /// Find-or-create a registry slot; an existing command (dot rule
    /// applies) is reused so redefinition keeps its registry position.
    fn add_func(&mut self, name: &[u8]) -> Rc<RefCell<Function>> {
        if let Some(existing) = self.find_cmd(name) {
            return existing;
        }
        let func = Rc::new(RefCell::new(Function {
            name: name.to_vec(),
            callable: Callable::Script {
                argnames: List::new(),
                body: Value::empty(),
            },
        }));
        self.cmds.push(func.clone());
        self.cmdmap.insert(name.to_vec(), func.clone());
        func
    }

    pub(crate) fn del_func(&mut self, func: &Rc<RefCell<Function>>) {
        let index = match self.cmds.iter().position(|f| Rc::ptr_eq(f, func)) {
            Some(i) => i,
            None => return,
        };
        let name = func.borrow().name.clone();
        self.cmdmap.remove(&name);
        self.cmds.remove(index);
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    pub fn dollar_prefix(&self) -> &[u8] {
        &self.dollar_prefix
    }

    pub fn set_dollar_prefix(&mut self, prefix: impl AsRef<[u8]>) {
        self.dollar_prefix = prefix.as_ref().to_vec();
    }

    pub fn catcher(&self) -> Option<&[u8]> {
        self.catcher.as_deref()
    }

    /// Install (or with an empty script, uninstall) the unknown-command
    /// handler.
    pub fn set_catcher(&mut self, script: impl AsRef<[u8]>) {
        let script = script.as_ref();
        self.catcher = if script.is_empty() {
            None
        } else {
            Some(script.to_vec())
        };
    }

    /// `None` disables the recursion cap entirely.
    pub fn set_max_parse_depth(&mut self, limit: Option<usize>) {
        self.max_parse_depth = limit;
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    /// Parse and evaluate `code`, returning the last command's value.
    ///
    /// With `funclevel`, a pending `return`/`result` value in the current
    /// environment is consumed and becomes the result. While the sticky
    /// error slot is occupied, evaluation is suppressed and the result is
    /// empty.
    pub fn parse(&mut self, code: impl AsRef<[u8]>, funclevel: bool) -> Value {
        let code: Rc<[u8]> = Rc::from(code.as_ref());
        if self.cursor_depth == 0 {
            self.root_code = code.clone();
        }
        let save_code = std::mem::replace(&mut self.code, code);
        let save_head = std::mem::replace(&mut self.head, 0);
        self.cursor_depth += 1;

        self.skip_spaces();
        self.parse_depth += 1;

        let mut val: Option<Value> = None;
        'run: {
            if let Some(limit) = self.max_parse_depth {
                if self.parse_depth > limit {
                    let position = self.head;
                    self.set_error_at(
                        position,
                        ErrorKind::RecursionExceeded,
                        "too many recursive calls",
                    );
                    break 'run;
                }
            }

            if funclevel {
                self.envs[self.current].breakrun = false;
            }

            while self.head < self.code.len() && self.error.is_none() {
                val = None;

                if self.host.interrupted() {
                    let position = self.head;
                    self.set_error_at(position, ErrorKind::Interrupted, "interrupted");
                    break 'run;
                }

                let cmd_start = self.head;
                let words = match self.substitute() {
                    Some(words) => words,
                    None => break 'run,
                };
                if self.error.is_some() {
                    break 'run;
                }

                if !words.is_empty() {
                    let name = words.get(0).expect("non-empty word list");
                    match self.find_cmd(name.as_bytes()) {
                        Some(cmd) => val = self.run_cmd(&cmd, &words, cmd_start),
                        None => {
                            if !name.is_empty() {
                                match self.unknown_cmd(&words) {
                                    Some(v) => val = Some(v),
                                    None => break 'run,
                                }
                            }
                        }
                    }

                    if self.envs[self.current].breakrun {
                        break 'run;
                    }
                }

                self.skip_spaces();
                while self.at_eol() {
                    self.head += 1;
                }
                self.skip_spaces();
            }
        }

        self.code = save_code;
        self.head = save_head;
        self.cursor_depth -= 1;

        if funclevel && self.envs[self.current].retval_set {
            let env = &mut self.envs[self.current];
            val = env.retval.take();
            env.retval_set = false;
            env.breakrun = false;
        }

        self.parse_depth -= 1;
        val.unwrap_or_default()
    }

    /// `parse` with an empty-value short-circuit.
    pub fn parse_value(&mut self, val: &Value, funclevel: bool) -> Value {
        if val.is_empty() {
            return Value::empty();
        }
        self.parse(val, funclevel)
    }

    fn run_cmd(
        &mut self,
        cmd: &Rc<RefCell<Function>>,
        words: &List,
        cmd_start: usize,
    ) -> Option<Value> {
        let callable = cmd.borrow().callable.clone();
        match callable {
            Callable::Native(proc) => {
                let r = proc(self, &words.as_slice()[1..]);
                if let Some(err) = self.error.as_mut() {
                    if err.needs_anchor {
                        err.needs_anchor = false;
                        err.position = cmd_start;
                    }
                }
                r
            }
            Callable::Script { argnames, body } => {
                self.push_env();
                self.envs[self.current].func = Some(cmd.clone());

                if argnames.len() == 1
                    && argnames.get(0).map(Value::as_bytes) == Some(&b"args"[..])
                {
                    let args = words.to_value(true);
                    self.set_var(b"args", &args, crate::interp::vars::SetVarMode::LocalNew);
                } else {
                    for (i, formal) in argnames.iter().enumerate() {
                        let actual = words.get(i + 1).cloned().unwrap_or_default();
                        let name = formal.as_bytes().to_vec();
                        self.set_var(&name, &actual, crate::interp::vars::SetVarMode::LocalNew);
                    }
                }

                let r = self.parse_value(&body, true);
                self.pop_env();
                Some(r)
            }
        }
    }

    /// Dispatch for a command name with no registry entry: run the catcher
    /// if one is installed (binding `args` to the whole word list, command
    /// name included), otherwise raise unknown-command. `None` stops the
    /// enclosing command loop.
    fn unknown_cmd(&mut self, words: &List) -> Option<Value> {
        let name = words.get(0).expect("non-empty word list").clone();

        let catcher = match self.catcher.clone() {
            Some(c) => c,
            None => {
                let position = self.head;
                self.set_error_at(
                    position,
                    ErrorKind::UnknownCommand,
                    format!("unknown function {}", name),
                );
                return None;
            }
        };

        if self.in_catcher >= MAX_CATCHER_DEPTH {
            let position = self.head;
            self.set_error_at(
                position,
                ErrorKind::UnknownCommand,
                format!(
                    "catcher limit reached while trying to call unknown function {}",
                    name
                ),
            );
            return None;
        }

        self.in_catcher += 1;
        self.push_env();
        self.envs[self.current].catcher_for = Some(name);

        let args = words.to_value(true);
        self.set_var(b"args", &args, crate::interp::vars::SetVarMode::LocalNew);
        let r = self.parse(&catcher, true);

        self.pop_env();
        self.in_catcher -= 1;
        Some(r)
    }

    /// Invoke a registered command directly, bypassing the parser. Returns
    /// `None` when no such command exists.
    pub fn call(&mut self, name: impl AsRef<[u8]>, argv: &[Value]) -> Option<Value> {
        let cmd = self.find_cmd(name.as_ref())?;
        let callable = cmd.borrow().callable.clone();
        match callable {
            Callable::Native(proc) => proc(self, argv),
            Callable::Script { argnames, body } => {
                self.push_env();
                self.envs[self.current].func = Some(cmd.clone());

                if argnames.len() == 1
                    && argnames.get(0).map(Value::as_bytes) == Some(&b"args"[..])
                {
                    let args: List = argv.iter().cloned().collect();
                    let argsval = args.to_value(false);
                    self.set_var(b"args", &argsval, crate::interp::vars::SetVarMode::LocalNew);
                } else {
                    for (i, formal) in argnames.iter().enumerate() {
                        let actual = argv.get(i).cloned().unwrap_or_default();
                        let name = formal.as_bytes().to_vec();
                        self.set_var(&name, &actual, crate::interp::vars::SetVarMode::LocalNew);
                    }
                }

                let r = self.parse_value(&body, true);
                self.pop_env();
                Some(r)
            }
        }
    }

    /// Generate a name in use by no command or variable, embedding `part`.
    pub fn unused_name(&self, part: &[u8]) -> Option<Value> {
        for i in 0..u32::MAX {
            let mut name = b"!!un!".to_vec();
            name.extend_from_slice(part);
            name.extend_from_slice(format!("!{:09}!nu!!", i).as_bytes());

            if self.find_cmd(&name).is_some() {
                continue;
            }
            if self.find_var(self.current, &name).is_some() {
                continue;
            }
            return Some(Value::from_bytes(&name));
        }
        None
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_command() {
        let mut lil = Interp::new();
        let r = lil.parse("set x 3", false);
        assert_eq!(r.as_bytes(), b"3");
        assert_eq!(lil.get_var(b"x").as_bytes(), b"3");
    }

    #[test]
    fn test_last_command_value_wins() {
        let mut lil = Interp::new();
        let r = lil.parse("set a 1; set b 2", false);
        assert_eq!(r.as_bytes(), b"2");
    }

    #[test]
    fn test_unknown_command_error() {
        let mut lil = Interp::new();
        let r = lil.parse("definitely-not-a-command", false);
        assert!(r.is_empty());
        let err = lil.error().expect("error set");
        assert_eq!(err.kind, ErrorKind::UnknownCommand);
    }

    #[test]
    fn test_sticky_error_suppresses_until_consumed() {
        let mut lil = Interp::new();
        lil.parse("no-such-cmd", false);
        assert!(lil.has_error());

        // evaluation is a no-op while the error is pending
        lil.parse("set x 1", false);
        assert!(lil.get_var(b"x").is_empty());

        assert!(lil.error().is_some());
        lil.parse("set x 1", false);
        assert_eq!(lil.get_var(b"x").as_bytes(), b"1");
    }

    #[test]
    fn test_register_native() {
        let mut lil = Interp::new();
        lil.register("double", |_interp, args| {
            Some(Value::from_integer(args[0].to_integer() * 2))
        });
        let r = lil.parse("double 21", false);
        assert_eq!(r.as_bytes(), b"42");
    }

    #[test]
    fn test_dotted_command_names_resolve_to_base() {
        let mut lil = Interp::new();
        lil.register("foo", |_interp, args| {
            Some(Value::from_integer(args.len() as i64))
        });
        let r = lil.parse("foo.bar 1 2", false);
        assert_eq!(r.as_bytes(), b"2");
    }

    #[test]
    fn test_call_script_function() {
        let mut lil = Interp::new();
        lil.parse("func add {a b} {expr $a + $b}", false);
        let r = lil
            .call("add", &[Value::from("2"), Value::from("5")])
            .unwrap();
        assert_eq!(r.as_bytes(), b"7");
        assert!(lil.call("missing", &[]).is_none());
    }

    #[test]
    fn test_recursion_cap_leaves_interp_usable() {
        let mut lil = Interp::new();
        lil.set_max_parse_depth(Some(50));
        let depth = 80;
        let mut code = String::new();
        for _ in 0..depth {
            code.push_str("[quote ");
        }
        code.push('x');
        for _ in 0..depth {
            code.push(']');
        }

        lil.parse(&code, false);
        let err = lil.error().expect("recursion error");
        assert_eq!(err.kind, ErrorKind::RecursionExceeded);

        let r = lil.parse("set ok 1", false);
        assert_eq!(r.as_bytes(), b"1");
    }

    #[test]
    fn test_unused_name_shape() {
        let lil = Interp::new();
        let name = lil.unused_name(b"tmp").unwrap();
        assert_eq!(name.as_bytes(), b"!!un!tmp!000000000!nu!!");
    }
}
