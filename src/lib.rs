//! lil, an embeddable command-oriented scripting interpreter.
//!
//! A Tcl-flavoured mini-language: a program is a sequence of commands whose
//! arguments are computed by interleaved substitution (`$name`, `[...]`,
//! braces and quotes), each dispatched to a native procedure or a script
//! function. Script functions run in nested variable environments with
//! two-level (local-or-root) scoping, variable watches and a catcher
//! fallback for unknown commands.
//!
//! ```
//! use lil::Interp;
//!
//! let mut lil = Interp::new();
//! let r = lil.parse("func f {a b} {expr {$a * $b}}; f 6 7", false);
//! assert_eq!(r.as_bytes(), b"42");
//! ```
//!
//! The interpreter is a library with no I/O of its own; hosts bridge their
//! key/value store and interrupt signal through the [`Host`] trait and
//! register native commands with [`Interp::register`].

pub mod bytes;
pub mod commands;
pub mod env;
pub mod host;
pub mod interp;
pub mod list;
pub mod parser;
pub mod value;

pub use env::{Env, EnvId, Var, ROOT_ENV};
pub use host::{Host, NoopHost};
pub use interp::errors::{ErrorKind, LilError};
pub use interp::interp::{Callable, Function, Interp, NativeFn};
pub use interp::vars::SetVarMode;
pub use list::List;
pub use value::Value;
