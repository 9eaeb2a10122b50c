//! Cross-Environment Evaluation
//!
//! The commands that run code somewhere other than the current frame:
//! `upeval` (the parent), `topeval` (the root), `downeval` (wherever the
//! enclosing up/top evaluation came from), `enveval` (a fresh frame with
//! explicit variable copying), and `jaileval` (a fresh interpreter).
//! Also the catcher and watch installers, which hook evaluation into
//! command lookup and variable writes.

use crate::env::ROOT_ENV;
use crate::interp::interp::{Callable, Interp};
use crate::interp::vars::SetVarMode;
use crate::list::List;
use crate::value::Value;

use super::core::fnc_eval;

/// `topeval code...`: evaluate in the root environment; `downeval` inside
/// the code comes back to the calling frame.
pub(crate) fn fnc_topeval(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    let this_env = interp.current;
    let this_downenv = interp.downenv;

    interp.current = ROOT_ENV;
    interp.downenv = Some(this_env);

    let r = fnc_eval(interp, args);

    interp.downenv = this_downenv;
    interp.current = this_env;
    r
}

/// `upeval code...`: evaluate in the parent environment. At the root this
/// is plain `eval`.
pub(crate) fn fnc_upeval(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    let this_env = interp.current;
    let this_downenv = interp.downenv;

    if this_env == ROOT_ENV {
        return fnc_eval(interp, args);
    }

    interp.current = interp.envs[this_env]
        .parent()
        .expect("non-root frame has a parent");
    interp.downenv = Some(this_env);

    let r = fnc_eval(interp, args);

    interp.current = this_env;
    interp.downenv = this_downenv;
    r
}

/// `downeval code...`: evaluate in the frame the enclosing `upeval` /
/// `topeval` was called from. Without one pending this is plain `eval`.
pub(crate) fn fnc_downeval(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    let down = match interp.downenv {
        Some(env) => env,
        None => return fnc_eval(interp, args),
    };

    let up_env = interp.current;
    interp.downenv = None;
    interp.current = down;

    let r = fnc_eval(interp, args);

    interp.downenv = Some(down);
    interp.current = up_env;
    r
}

/// `enveval [invars] [outvars] code`: evaluate in a fresh frame, copying
/// `invars` in first and copying `outvars` (or the `invars`) back out.
pub(crate) fn fnc_enveval(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }

    let (code_index, invars) = if args.len() == 1 {
        (0, None)
    } else {
        (
            if args.len() > 2 { 2 } else { 1 },
            Some(interp.subst_to_list(&args[0])),
        )
    };
    let outvars = if args.len() > 2 {
        Some(interp.subst_to_list(&args[1]))
    } else {
        None
    };

    let in_values: Vec<Value> = invars
        .iter()
        .flat_map(List::iter)
        .map(|name| interp.get_var(name.as_bytes()))
        .collect();

    interp.push_env();
    if let Some(invars) = &invars {
        for (name, value) in invars.iter().zip(&in_values) {
            let name = name.as_bytes().to_vec();
            interp.set_var(&name, value, SetVarMode::LocalNew);
        }
    }

    let r = interp.parse_value(&args[code_index], false);

    let capture = outvars.as_ref().or(invars.as_ref());
    let out_values: Vec<Value> = capture
        .into_iter()
        .flat_map(List::iter)
        .map(|name| interp.get_var(name.as_bytes()))
        .collect();

    interp.pop_env();

    if invars.is_some() {
        let capture = outvars.as_ref().or(invars.as_ref());
        if let Some(capture) = capture {
            for (name, value) in capture.iter().zip(&out_values) {
                let name = name.as_bytes().to_vec();
                interp.set_var(&name, value, SetVarMode::Local);
            }
        }
    }

    Some(r)
}

/// `jaileval [clean] code`: evaluate in a brand-new interpreter. The jail
/// is seeded with the user-registered native commands unless `clean`.
pub(crate) fn fnc_jaileval(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }

    let mut base = 0;
    if args[0].as_bytes() == b"clean" {
        base = 1;
        if args.len() == 1 {
            return None;
        }
    }

    let mut jail = Interp::new();
    if base != 1 {
        for i in interp.syscmds..interp.cmds.len() {
            let func = interp.cmds[i].clone();
            let func = func.borrow();
            if let Callable::Native(proc) = &func.callable {
                jail.register_native(&func.name, proc.clone());
            }
        }
    }

    Some(jail.parse_value(&args[base], true))
}

/// `catcher [script]`: install, clear (empty script) or report the
/// unknown-command handler.
pub(crate) fn fnc_catcher(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    match args.first() {
        None => Some(Value::from_bytes(interp.catcher().unwrap_or_default())),
        Some(script) => {
            interp.set_catcher(script);
            None
        }
    }
}

/// `watch var... script`: attach `script` (empty to detach) to each named
/// variable; it runs after every write to them.
pub(crate) fn fnc_watch(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.len() < 2 {
        return None;
    }

    let script = args[args.len() - 1].as_bytes().to_vec();
    for name in &args[..args.len() - 1] {
        let name = name.as_bytes().to_vec();
        interp.set_watch(&name, &script);
    }
    None
}
