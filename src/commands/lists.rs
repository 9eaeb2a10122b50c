//! List Commands
//!
//! Commands over the space-joined list rendering: any value can be read as
//! a list by running it through list-mode substitution, and list results
//! are rendered back with escaping so they survive re-parsing.

use crate::interp::interp::Interp;
use crate::interp::vars::SetVarMode;
use crate::list::List;
use crate::value::Value;

/// `list v...`: build a properly escaped list out of the arguments.
pub(crate) fn fnc_list(_interp: &mut Interp, args: &[Value]) -> Option<Value> {
    let list: List = args.iter().cloned().collect();
    Some(list.to_value(true))
}

/// `count list`: number of elements.
pub(crate) fn fnc_count(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    let Some(arg) = args.first() else {
        return Some(Value::from("0"));
    };
    let list = interp.subst_to_list(arg);
    Some(Value::from_integer(list.len() as i64))
}

/// `index list i`: the i-th element, or empty when out of range.
pub(crate) fn fnc_index(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.len() < 2 {
        return None;
    }

    let list = interp.subst_to_list(&args[0]);
    let index = args[1].to_integer();
    if index < 0 {
        return None;
    }
    list.get(index as usize).cloned()
}

/// `indexof list v`: index of the first equal element, or empty.
pub(crate) fn fnc_indexof(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.len() < 2 {
        return None;
    }

    let list = interp.subst_to_list(&args[0]);
    list.iter()
        .position(|item| item.as_bytes() == args[1].as_bytes())
        .map(|i| Value::from_integer(i as i64))
}

/// `append [global] var v...`: append elements to the list stored in a
/// variable; stores and returns the new rendering.
pub(crate) fn fnc_append(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.len() < 2 {
        return None;
    }

    let mut base = 1;
    let mut mode = SetVarMode::Local;
    let mut varname = args[0].as_bytes().to_vec();
    if varname == b"global" {
        if args.len() < 3 {
            return None;
        }
        varname = args[1].as_bytes().to_vec();
        base = 2;
        mode = SetVarMode::Global;
    }

    let current = interp.get_var(&varname);
    let mut list = interp.subst_to_list(&current);
    for v in &args[base..] {
        list.append(v.clone());
    }

    let r = list.to_value(true);
    interp.set_var(&varname, &r, mode);
    Some(r)
}

/// `slice list from [to]`: the half-open sub-range, clamped.
pub(crate) fn fnc_slice(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }
    if args.len() < 2 {
        return Some(args[0].clone());
    }

    let mut from = args[1].to_integer();
    if from < 0 {
        from = 0;
    }

    let list = interp.subst_to_list(&args[0]);
    let mut to = args.get(2).map_or(list.len() as i64, Value::to_integer);
    if to > list.len() as i64 {
        to = list.len() as i64;
    } else if to < from {
        to = from;
    }

    let slice: List = list.as_slice()[from as usize..to as usize]
        .iter()
        .cloned()
        .collect();
    Some(slice.to_value(true))
}

/// `filter [name] list expr`: keep the elements for which `expr` is
/// truthy, binding `name` (default `x`) per element.
pub(crate) fn fnc_filter(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }
    if args.len() < 2 {
        return Some(args[0].clone());
    }

    let (varname, base) = if args.len() > 2 {
        (args[0].as_bytes().to_vec(), 1)
    } else {
        (b"x".to_vec(), 0)
    };

    let list = interp.subst_to_list(&args[base]);
    let mut filtered = List::new();
    for item in &list {
        if interp.breakrun() {
            break;
        }
        interp.set_var(&varname, item, SetVarMode::LocalOnly);
        let keep = interp
            .eval_expr(&args[base + 1])
            .is_some_and(|v| v.to_boolean());
        if keep {
            filtered.append(item.clone());
        }
    }

    Some(filtered.to_value(true))
}

/// `lmap list name...`: destructure list elements into variables.
pub(crate) fn fnc_lmap(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.len() < 2 {
        return None;
    }

    let list = interp.subst_to_list(&args[0]);
    for (i, name) in args[1..].iter().enumerate() {
        let name = name.as_bytes().to_vec();
        let value = list.get(i).cloned().unwrap_or_default();
        interp.set_var(&name, &value, SetVarMode::Local);
    }
    None
}

/// `split s [sep]`: split on any byte in `sep` (default space), keeping
/// empty fields; an empty separator returns the input unchanged.
pub(crate) fn fnc_split(_interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }

    let mut sep: &[u8] = b" ";
    if args.len() > 1 {
        sep = args[1].as_bytes();
        if sep.is_empty() {
            return Some(args[0].clone());
        }
    }

    let mut list = List::new();
    let mut field = Value::empty();
    for &b in args[0].as_bytes() {
        if sep.contains(&b) {
            list.append(std::mem::take(&mut field));
        } else {
            field.append_byte(b);
        }
    }
    list.append(field);
    Some(list.to_value(true))
}

/// `concat list...`: re-render each argument as an escaped list and glue
/// the renderings together.
pub(crate) fn fnc_concat(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    if args.is_empty() {
        return None;
    }

    let mut r = Value::empty();
    for arg in args {
        let list = interp.subst_to_list(arg);
        r.append(&list.to_value(true));
    }
    Some(r)
}

/// `subst code`: run substitution without evaluating the result.
pub(crate) fn fnc_subst(interp: &mut Interp, args: &[Value]) -> Option<Value> {
    let arg = args.first()?;
    Some(interp.subst_to_value(arg))
}
