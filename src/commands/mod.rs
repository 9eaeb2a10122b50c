//! Built-in Command Set
//!
//! Registration of the standard commands. The core set is always present;
//! the rest rides behind the `full` feature, matching the reduced build
//! used on space-constrained hosts.

pub(crate) mod core;

#[cfg(feature = "full")]
pub(crate) mod evals;
#[cfg(feature = "full")]
pub(crate) mod introspect;
#[cfg(feature = "full")]
pub(crate) mod lists;
#[cfg(feature = "full")]
pub(crate) mod strings;

use crate::interp::interp::Interp;

pub(crate) fn register_stdcmds(interp: &mut Interp) {
    interp.register("dec", core::fnc_dec);
    interp.register("eval", core::fnc_eval);
    interp.register("expr", core::fnc_expr);
    interp.register("for", core::fnc_for);
    interp.register("foreach", core::fnc_foreach);
    interp.register("func", core::fnc_func);
    interp.register("if", core::fnc_if);
    interp.register("inc", core::fnc_inc);
    interp.register("local", core::fnc_local);
    interp.register("return", core::fnc_return);
    interp.register("set", core::fnc_set);
    interp.register("strcmp", core::fnc_strcmp);
    interp.register("try", core::fnc_try);
    interp.register("while", core::fnc_while);

    #[cfg(feature = "full")]
    {
        interp.register("append", lists::fnc_append);
        interp.register("catcher", evals::fnc_catcher);
        interp.register("char", strings::fnc_char);
        interp.register("charat", strings::fnc_charat);
        interp.register("codeat", strings::fnc_codeat);
        interp.register("concat", lists::fnc_concat);
        interp.register("count", lists::fnc_count);
        interp.register("downeval", evals::fnc_downeval);
        interp.register("enveval", evals::fnc_enveval);
        interp.register("error", core::fnc_error);
        interp.register("filter", lists::fnc_filter);
        interp.register("index", lists::fnc_index);
        interp.register("indexof", lists::fnc_indexof);
        interp.register("jaileval", evals::fnc_jaileval);
        interp.register("length", strings::fnc_length);
        interp.register("list", lists::fnc_list);
        interp.register("lmap", lists::fnc_lmap);
        interp.register("ltrim", strings::fnc_ltrim);
        interp.register("quote", strings::fnc_quote);
        interp.register("reflect", introspect::fnc_reflect);
        interp.register("rename", introspect::fnc_rename);
        interp.register("repstr", strings::fnc_repstr);
        interp.register("result", core::fnc_result);
        interp.register("rtrim", strings::fnc_rtrim);
        interp.register("slice", lists::fnc_slice);
        interp.register("split", lists::fnc_split);
        interp.register("streq", strings::fnc_streq);
        interp.register("strpos", strings::fnc_strpos);
        interp.register("subst", lists::fnc_subst);
        interp.register("substr", strings::fnc_substr);
        interp.register("topeval", evals::fnc_topeval);
        interp.register("trim", strings::fnc_trim);
        interp.register("unusedname", introspect::fnc_unusedname);
        interp.register("upeval", evals::fnc_upeval);
        interp.register("watch", evals::fnc_watch);
    }
}
