//! Introspection Commands
//!
//! `reflect` exposes the interpreter's registries and the identity of the
//! running function; `rename` and `unusedname` manage the command table
//! from script code.

use crate::env::ROOT_ENV;
use crate::interp::errors::ErrorKind;
use crate::interp::interp::{Callable, Interp};
use crate::list::List;
use crate::value::Value;

/// Walk from the current frame to the nearest one that identifies what is
/// running: a function frame, a catcher frame, or the root.
fn active_frame(interp: &Interp) -> crate::env::EnvId {
    let mut env = interp.current;
    while env != ROOT_ENV
        && interp.envs[env].catcher_for.is_none()
        && interp.envs[env].func.is_none()
    {
        env = interp.envs[env]
            .parent()
            .expect("non-root frame has a parent");
    }
    env
}

/// `reflect what [arg]`: introspection. See the match arms for the
/// supported queries.
pub(crate) fn fnc_reflect(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    let what = args.first()?.as_bytes().to_vec();

    match what.as_slice() {
        b"version" => Some(Value::from(env!("CARGO_PKG_VERSION"))),

        b"args" => {
            let func = interp.find_cmd(args.get(1)?.as_bytes())?;
            let func = func.borrow();
            match &func.callable {
                Callable::Script { argnames, .. } => Some(argnames.to_value(true)),
                Callable::Native(_) => None,
            }
        }

        b"body" => {
            let func = interp.find_cmd(args.get(1)?.as_bytes())?;
            let func = func.borrow();
            match &func.callable {
                Callable::Script { body, .. } => Some(body.clone()),
                Callable::Native(_) => None,
            }
        }

        b"func-count" => Some(Value::from_integer(interp.cmds.len() as i64)),

        b"funcs" => {
            let funcs: List = interp
                .cmds
                .iter()
                .map(|f| Value::from_bytes(&f.borrow().name))
                .collect();
            Some(funcs.to_value(true))
        }

        b"vars" => {
            let mut vars = List::new();
            let mut env = Some(interp.current);
            while let Some(id) = env {
                for name in interp.envs[id].var_names() {
                    vars.append(Value::from_bytes(name));
                }
                env = interp.envs[id].parent();
            }
            Some(vars.to_value(true))
        }

        b"globals" => {
            let vars: List = interp.envs[ROOT_ENV]
                .var_names()
                .map(Value::from_bytes)
                .collect();
            Some(vars.to_value(true))
        }

        b"has-func" => {
            let target = args.get(1)?;
            if interp.cmdmap.contains_key(target.as_bytes()) {
                Some(Value::from("1"))
            } else {
                None
            }
        }

        b"has-var" => {
            let target = args.get(1)?.as_bytes();
            let mut env = Some(interp.current);
            while let Some(id) = env {
                if interp.envs[id].find_local(target).is_some() {
                    return Some(Value::from("1"));
                }
                env = interp.envs[id].parent();
            }
            None
        }

        b"has-global" => {
            let target = args.get(1)?.as_bytes();
            if interp.envs[ROOT_ENV].find_local(target).is_some() {
                Some(Value::from("1"))
            } else {
                None
            }
        }

        b"error" => interp
            .last_error_msg
            .as_ref()
            .map(|msg| Value::from(msg.clone())),

        b"dollar-prefix" => {
            let old = Value::from_bytes(interp.dollar_prefix());
            if let Some(new_prefix) = args.get(1) {
                interp.set_dollar_prefix(new_prefix);
            }
            Some(old)
        }

        b"this" => {
            let env = active_frame(interp);
            if interp.envs[env].catcher_for.is_some() {
                return Some(Value::from_bytes(interp.catcher().unwrap_or_default()));
            }
            if env == ROOT_ENV {
                return Some(Value::from_bytes(&interp.root_code));
            }
            let func = interp.envs[env].func.as_ref()?;
            match &func.borrow().callable {
                Callable::Script { body, .. } => Some(body.clone()),
                Callable::Native(_) => None,
            }
        }

        b"name" => {
            let env = active_frame(interp);
            if let Some(name) = &interp.envs[env].catcher_for {
                return Some(name.clone());
            }
            if env == ROOT_ENV {
                return None;
            }
            let func = interp.envs[env].func.as_ref()?;
            let name = func.borrow().name.clone();
            Some(Value::from_bytes(&name))
        }

        _ => None,
    }
}

/// `rename old new`: rename a command in place; an empty new name deletes
/// it.
pub(crate) fn fnc_rename(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.len() < 2 {
        return None;
    }

    let newname = args[1].as_bytes().to_vec();
    let func = match interp.find_cmd(args[0].as_bytes()) {
        Some(f) => f,
        None => {
            let position = interp.head;
            interp.set_error_at(
                position,
                ErrorKind::Default,
                format!("unknown function '{}'", args[0]),
            );
            return None;
        }
    };

    let oldname = func.borrow().name.clone();
    let r = Value::from_bytes(&oldname);
    if newname.is_empty() {
        interp.del_func(&func);
    } else {
        interp.cmdmap.remove(&oldname);
        interp.cmdmap.insert(newname.clone(), func.clone());
        func.borrow_mut().name = newname;
    }
    Some(r)
}

/// `unusedname [part]`: a name no command or variable uses.
pub(crate) fn fnc_unusedname(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    let part = args.first().map_or(&b"unusedname"[..], Value::as_bytes);
    interp.unused_name(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(code: &str) -> (Interp, Value) {
        let mut lil = Interp::new();
        let r = lil.parse(code, false);
        assert!(!lil.has_error(), "error: {:?}", lil.error());
        (lil, r)
    }

    #[test]
    fn test_reflect_func_introspection() {
        let (_, r) = run("func f {a b} {quote $a$b}; reflect args f");
        assert_eq!(r.as_bytes(), b"a b");
        let (_, r) = run("func f {a b} {quote $a$b}; reflect body f");
        assert_eq!(r.as_bytes(), b"quote $a$b");
        let (_, r) = run("reflect body set");
        assert_eq!(r.as_bytes(), b"");
    }

    #[test]
    fn test_reflect_has_func_and_var() {
        let (_, r) = run("reflect has-func set");
        assert_eq!(r.as_bytes(), b"1");
        let (_, r) = run("reflect has-func no-such-thing");
        assert_eq!(r.as_bytes(), b"");
        let (_, r) = run("set v 1; reflect has-var v");
        assert_eq!(r.as_bytes(), b"1");
        let (_, r) = run("set v 1; reflect has-global v");
        assert_eq!(r.as_bytes(), b"1");
        let (_, r) = run("func f {} {local w; reflect has-global w}; f");
        assert_eq!(r.as_bytes(), b"");
    }

    #[test]
    fn test_reflect_name_inside_function() {
        let (_, r) = run("func myname {} {reflect name}; myname");
        assert_eq!(r.as_bytes(), b"myname");
        let (_, r) = run("reflect name");
        assert_eq!(r.as_bytes(), b"");
    }

    #[test]
    fn test_reflect_name_inside_catcher() {
        let (_, r) = run("catcher {reflect name}; vanished 1 2");
        assert_eq!(r.as_bytes(), b"vanished");
    }

    #[test]
    fn test_reflect_this_at_root() {
        let mut lil = Interp::new();
        let r = lil.parse("reflect this", false);
        assert_eq!(r.as_bytes(), b"reflect this");
    }

    #[test]
    fn test_reflect_dollar_prefix() {
        let (_, r) = run("reflect dollar-prefix");
        assert_eq!(r.as_bytes(), b"set ");

        let mut lil = Interp::new();
        lil.parse("func my-set {name} {return [set [set name]]}; set baz qux", false);
        let old = lil.parse("reflect dollar-prefix {my-set }", false);
        assert_eq!(old.as_bytes(), b"set ");
        let r = lil.parse("quote $baz", false);
        assert!(!lil.has_error());
        assert_eq!(r.as_bytes(), b"qux");
    }

    #[test]
    fn test_reflect_error_reports_last_message() {
        // the last error message survives the slot being cleared by try
        let (_, r) = run("try {error boom} {reflect error}");
        assert_eq!(r.as_bytes(), b"boom");
    }

    #[test]
    fn test_reflect_funcs_and_count() {
        let (mut lil, r) = run("reflect func-count");
        let count = r.to_integer();
        assert!(count > 10);
        lil.parse("func extra {} {}", false);
        let r = lil.parse("reflect func-count", false);
        assert_eq!(r.to_integer(), count + 1);
        let funcs = lil.parse("reflect funcs", false);
        assert!(funcs.to_string().split(' ').any(|n| n == "extra"));
    }

    #[test]
    fn test_reflect_vars_walks_the_stack() {
        let (_, r) = run("set g 1; func f {p} {reflect vars}; f x");
        let names = r.to_string();
        assert!(names.split(' ').any(|n| n == "p"));
        assert!(names.split(' ').any(|n| n == "g"));
    }

    #[test]
    fn test_rename_and_delete() {
        let (mut lil, r) = run("func f {} {quote hi}; rename f g");
        assert_eq!(r.as_bytes(), b"f");
        assert_eq!(lil.parse("g", false).as_bytes(), b"hi");
        lil.parse("f", false);
        assert!(lil.error().is_some());

        lil.parse("rename g {}", false);
        assert!(!lil.has_error());
        lil.parse("g", false);
        assert!(lil.error().is_some());
    }

    #[test]
    fn test_rename_unknown_raises() {
        let mut lil = Interp::new();
        lil.parse("rename nope other", false);
        let err = lil.error().unwrap();
        assert!(err.message.contains("unknown function 'nope'"));
    }

    #[test]
    fn test_unusedname_command() {
        let (_, r) = run("unusedname widget");
        assert_eq!(r.as_bytes(), b"!!un!widget!000000000!nu!!");
    }
}
