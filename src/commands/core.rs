//! Core Commands
//!
//! The always-on command set: variable access, control flow, function
//! definition and error recovery. Everything here is registered in both
//! the full and the reduced build.
//!
//! Commands receive the arguments after the command name and signal
//! failure through the interpreter's sticky error slot; a `None` result is
//! simply an empty value to the script.

#[cfg(any(feature = "full", test))]
use crate::interp::errors::ErrorKind;
use crate::interp::interp::Interp;
use crate::interp::vars::SetVarMode;
use crate::list::List;
use crate::value::Value;

/// `set [global] [name [value]]...`: read a variable, or assign
/// name/value pairs. A trailing name without a value reads it.
pub(crate) fn fnc_set(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }

    let mut i = 0;
    let mut mode = SetVarMode::Local;
    if args[0].as_bytes() == b"global" {
        i = 1;
        mode = SetVarMode::Global;
    }

    let mut last: Option<(crate::env::EnvId, Vec<u8>)> = None;
    while i < args.len() {
        if args.len() == i + 1 {
            return Some(interp.get_var(args[i].as_bytes()));
        }

        let name = args[i].as_bytes().to_vec();
        last = interp
            .set_var(&name, &args[i + 1], mode)
            .map(|env| (env, name));
        i += 2;
    }

    let (env, name) = last?;
    interp.var_value(env, &name)
}

/// `local name...`: ensure each name has a slot in the current frame, so
/// later writes cannot leak to the root.
pub(crate) fn fnc_local(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    for arg in args {
        let name = arg.as_bytes().to_vec();
        if interp.find_local_var(interp.current, &name).is_none() {
            interp.set_var(&name, &Value::empty(), SetVarMode::LocalNew);
        }
    }
    None
}

fn join_args(args: &[Value]) -> Value {
    let mut val = Value::empty();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            val.append_byte(b' ');
        }
        val.append(arg);
    }
    val
}

/// `eval code...`: evaluate the arguments (joined with spaces) as code.
pub(crate) fn fnc_eval(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    match args.len() {
        0 => None,
        1 => Some(interp.parse_value(&args[0], false)),
        _ => Some(interp.parse_value(&join_args(args), false)),
    }
}

/// `expr e...`: evaluate the arguments (joined with spaces) as an integer
/// expression.
pub(crate) fn fnc_expr(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    match args.len() {
        0 => None,
        1 => interp.eval_expr(&args[0]),
        _ => interp.eval_expr(&join_args(args)),
    }
}

/// `if [not] cond then-code [else-code]`.
pub(crate) fn fnc_if(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }

    let mut base = 0;
    let mut not = false;
    if args[0].as_bytes() == b"not" {
        base = 1;
        not = true;
    }
    if args.len() < base + 2 {
        return None;
    }

    let val = interp.eval_expr(&args[base]);
    if interp.has_error() {
        return None;
    }
    let mut v = val?.to_boolean();
    if not {
        v = !v;
    }

    if v {
        Some(interp.parse_value(&args[base + 1], false))
    } else if args.len() > base + 2 {
        Some(interp.parse_value(&args[base + 2], false))
    } else {
        None
    }
}

/// `while [not] cond code`: the result is the last body evaluation.
pub(crate) fn fnc_while(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }

    let mut base = 0;
    let mut not = false;
    if args[0].as_bytes() == b"not" {
        base = 1;
        not = true;
    }
    if args.len() < base + 2 {
        return None;
    }

    let mut r = None;
    while !interp.has_error() && !interp.breakrun() {
        let val = interp.eval_expr(&args[base]);
        if interp.has_error() {
            return None;
        }
        let mut v = val?.to_boolean();
        if not {
            v = !v;
        }
        if !v {
            break;
        }

        r = Some(interp.parse_value(&args[base + 1], false));
    }
    r
}

/// `for init cond step code`.
pub(crate) fn fnc_for(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.len() < 4 {
        return None;
    }

    interp.parse_value(&args[0], false);
    let mut r = None;
    while !interp.has_error() && !interp.breakrun() {
        let val = interp.eval_expr(&args[1]);
        if interp.has_error() {
            return None;
        }
        if !val?.to_boolean() {
            break;
        }

        r = Some(interp.parse_value(&args[3], false));
        interp.parse_value(&args[2], false);
    }
    r
}

/// `foreach [name] list code`: evaluate `code` per element with `name`
/// (default `i`) bound in the current frame, shadowing any root binding.
/// Non-empty results are collected into the result list.
pub(crate) fn fnc_foreach(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.len() < 2 {
        return None;
    }

    let (varname, listidx, codeidx) = if args.len() >= 3 {
        (args[0].as_bytes().to_vec(), 1, 2)
    } else {
        (b"i".to_vec(), 0, 1)
    };

    let list = interp.subst_to_list(&args[listidx]);
    let mut rlist = List::new();
    for item in &list {
        interp.set_var(&varname, item, SetVarMode::LocalOnly);
        let rv = interp.parse_value(&args[codeidx], false);
        if !rv.is_empty() {
            rlist.append(rv);
        }

        if interp.breakrun() || interp.has_error() {
            break;
        }
    }

    Some(rlist.to_value(true))
}

/// `func [name] [argnames] body`: define a script function. Without a
/// name, a generated one is returned; without argnames, the single formal
/// `args` collects everything.
pub(crate) fn fnc_func(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }

    if args.len() >= 3 {
        let name = args[0].clone();
        let fargs = interp.subst_to_list(&args[1]);
        interp.define_script_fn(name.as_bytes(), fargs, args[2].clone());
        return Some(name);
    }

    let name = interp.unused_name(b"anonymous-function")?;
    if args.len() < 2 {
        let fargs = interp.subst_to_list(&Value::from("args"));
        interp.define_script_fn(name.as_bytes(), fargs, args[0].clone());
    } else {
        let fargs = interp.subst_to_list(&args[0]);
        interp.define_script_fn(name.as_bytes(), fargs, args[1].clone());
    }
    Some(name)
}

/// `return [v]`: stash the return value and unwind the enclosing run.
pub(crate) fn fnc_return(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    let env = &mut interp.envs[interp.current];
    env.breakrun = true;
    env.retval = args.first().cloned();
    env.retval_set = true;
    args.first().cloned()
}

/// `result [v]`: stash the return value without unwinding; with no
/// argument, read back what is pending.
#[cfg(feature = "full")]
pub(crate) fn fnc_result(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if let Some(v) = args.first() {
        let env = &mut interp.envs[interp.current];
        env.retval = Some(v.clone());
        env.retval_set = true;
    }

    let env = &interp.envs[interp.current];
    if env.retval_set {
        env.retval.clone()
    } else {
        None
    }
}

fn real_inc(interp: &mut Interp, varname: &[u8], delta: i64) -> Option<Value> {
    let v = Value::from_integer(interp.get_var(varname).to_integer().wrapping_add(delta));
    interp.set_var(varname, &v, SetVarMode::Local);
    Some(v)
}

/// `inc name [delta]`.
pub(crate) fn fnc_inc(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }
    let name = args[0].as_bytes().to_vec();
    let delta = args.get(1).map_or(1, Value::to_integer);
    real_inc(interp, &name, delta)
}

/// `dec name [delta]`.
pub(crate) fn fnc_dec(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }
    let name = args[0].as_bytes().to_vec();
    let delta = args.get(1).map_or(1, Value::to_integer);
    real_inc(interp, &name, delta.wrapping_neg())
}

/// C-string style comparison: the difference of the first differing bytes
/// (an implicit NUL terminates each side).
fn strcmp_bytes(a: &[u8], b: &[u8]) -> i64 {
    let mut i = 0;
    loop {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        if x != y {
            return x as i64 - y as i64;
        }
        if x == 0 {
            return 0;
        }
        i += 1;
    }
}

/// `strcmp a b`: ordering of two strings.
pub(crate) fn fnc_strcmp(_interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.len() < 2 {
        return None;
    }
    Some(Value::from_integer(strcmp_bytes(
        args[0].as_bytes(),
        args[1].as_bytes(),
    )))
}

/// `try body [handler]`: evaluate `body`; if it raises, clear the error
/// and evaluate `handler` instead. A no-op while an error is already
/// pending.
pub(crate) fn fnc_try(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() || interp.has_error() {
        return None;
    }

    let r = interp.parse_value(&args[0], false);
    if interp.has_error() {
        interp.error();
        if args.len() > 1 {
            return Some(interp.parse_value(&args[1], false));
        }
        return None;
    }
    Some(r)
}

/// `error [msg]`: raise an error from script code.
#[cfg(feature = "full")]
pub(crate) fn fnc_error(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    let msg = args.first().map(|v| v.to_string()).unwrap_or_default();
    interp.set_error(ErrorKind::Default, msg);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(code: &str) -> (Interp, Value) {
        let mut lil = Interp::new();
        let r = lil.parse(code, false);
        (lil, r)
    }

    #[test]
    fn test_set_pairs_and_read() {
        let (mut lil, r) = run("set a 1 b 2");
        assert_eq!(r.as_bytes(), b"2");
        assert_eq!(lil.parse("set a", false).as_bytes(), b"1");
        assert_eq!(lil.parse("set b", false).as_bytes(), b"2");
    }

    #[test]
    fn test_set_global_from_function() {
        let (lil, _) = run("func f {} {set global g 7}; f");
        assert_eq!(lil.root_env().find_local(b"g").unwrap().value().as_bytes(), b"7");
    }

    #[test]
    fn test_local_keeps_root_intact() {
        let (lil, _) = run(
            "set y 1001; \
             func f {} {local y; set y 5; return $y}; \
             f",
        );
        assert_eq!(lil.get_var(b"y").as_bytes(), b"1001");
    }

    #[test]
    fn test_if_not_and_else() {
        let (_, r) = run("if {0} {quote then} {quote else}");
        assert_eq!(r.as_bytes(), b"else");
        let (_, r) = run("if not {0} {quote then}");
        assert_eq!(r.as_bytes(), b"then");
        let (_, r) = run("if {1} {quote then}");
        assert_eq!(r.as_bytes(), b"then");
    }

    #[test]
    fn test_while_loop() {
        let (lil, _) = run("set i 0; set sum 0; while {$i < 5} {set sum [expr $sum + $i]; inc i}");
        assert_eq!(lil.get_var(b"sum").as_bytes(), b"10");
    }

    #[test]
    fn test_while_not() {
        let (lil, _) = run("set i 0; while not {$i >= 3} {inc i}");
        assert_eq!(lil.get_var(b"i").as_bytes(), b"3");
    }

    #[test]
    fn test_for_loop() {
        let (lil, _) = run("set sum 0; for {set i 0} {$i < 4} {inc i} {set sum [expr $sum + $i]}");
        assert_eq!(lil.get_var(b"sum").as_bytes(), b"6");
    }

    #[test]
    fn test_foreach_collects_non_empty() {
        let (_, r) = run("foreach x [list 1 2 3] {expr {$x * $x}}");
        assert_eq!(r.as_bytes(), b"1 4 9");
        let (_, r) = run("foreach [list a b c] {if {[streq $i b]} {quote $i}}");
        assert_eq!(r.as_bytes(), b"b");
    }

    #[test]
    fn test_func_and_call() {
        let (_, r) = run("func f {a b} {expr {$a * $b}}; f 6 7");
        assert_eq!(r.as_bytes(), b"42");
    }

    #[test]
    fn test_func_args_form() {
        // a single formal named args receives the whole command line
        let (_, r) = run("func f args {count $args}; f a b c");
        assert_eq!(r.as_bytes(), b"4");
        let (_, r) = run("func f args {index $args 0}; f a b c");
        assert_eq!(r.as_bytes(), b"f");
    }

    #[test]
    fn test_missing_actuals_bind_empty() {
        let (_, r) = run("func f {a b} {quote \"$a|$b\"}; f only");
        assert_eq!(r.as_bytes(), b"only|");
    }

    #[test]
    fn test_anonymous_func_returns_name() {
        let (mut lil, name) = run("func {expr 1 + 1}");
        assert!(name.as_bytes().starts_with(b"!!un!anonymous-function!"));
        let r = lil.call(name.as_bytes(), &[]).unwrap();
        assert_eq!(r.as_bytes(), b"2");
    }

    #[test]
    fn test_return_stops_execution() {
        let (_, r) = run("func f {} {return 1; error unreachable}; f");
        assert_eq!(r.as_bytes(), b"1");
    }

    #[test]
    fn test_result_does_not_stop_execution() {
        let (_, r) = run("func f {} {result 1; quote 0}; f");
        assert_eq!(r.as_bytes(), b"1");
    }

    #[test]
    fn test_inc_dec() {
        let (lil, _) = run("set n 10; inc n; inc n 5; dec n 2");
        assert_eq!(lil.get_var(b"n").as_bytes(), b"14");
    }

    #[test]
    fn test_strcmp_byte_difference() {
        let (_, r) = run("strcmp 'This is a string' 'This is another string'");
        assert_eq!(r.as_bytes(), b"-78");
        let (_, r) = run("strcmp abc abc");
        assert_eq!(r.as_bytes(), b"0");
    }

    #[test]
    fn test_try_clears_error() {
        let (mut lil, r) = run("try {expr {1/0}} {quote err}");
        assert_eq!(r.as_bytes(), b"err");
        assert!(lil.error().is_none());
    }

    #[test]
    fn test_try_without_handler() {
        let (mut lil, r) = run("try {error boom}");
        assert!(r.is_empty());
        assert!(lil.error().is_none());
    }

    #[test]
    fn test_error_command_is_anchored() {
        let (mut lil, _) = run("quote ok; error boom");
        let err = lil.error().unwrap();
        assert_eq!(err.kind, ErrorKind::Default);
        assert_eq!(err.message, "boom");
        assert_eq!(err.position, 10);
    }
}
