//! Global builtin functions.

use tarn_ir::SourceLoc;

use super::NativeSpec;
use crate::diagnostics::FaultKind;
use crate::interpreter::Interpreter;
use crate::types::TypeId;
use crate::value::{EvalResult, Payload, ValueRef};

pub(super) const FUNCTIONS: &[NativeSpec] = &[
    ("print", 0, true, print),
    ("println", 0, true, println),
    ("string", 1, false, string),
    ("type", 1, false, type_of),
    ("hash", 1, false, hash),
    ("dbg", 1, false, dbg),
    ("len", 1, false, len),
    ("gc_dump", 0, false, gc_dump),
    ("gc_enable", 0, false, gc_enable),
    ("gc_disable", 0, false, gc_disable),
    ("gc_is_disabled", 0, false, gc_is_disabled),
    ("gc_collect", 0, false, gc_collect),
    ("gc_live", 0, false, gc_live),
];

/// Arguments rendered through `str`, separated by single spaces.
fn join_rendered(interp: &mut Interpreter, args: &[ValueRef]) -> Result<String, FaultKind> {
    let mut out = String::new();
    for (i, &arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&interp.render(arg)?);
    }
    Ok(out)
}

fn print(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let text = join_rendered(interp, args)?;
    interp.print_handler().print(&text);
    Ok(ValueRef::Nil)
}

fn println(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let text = join_rendered(interp, args)?;
    interp.print_handler().println(&text);
    Ok(ValueRef::Nil)
}

fn string(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let text = interp.render(args[0])?;
    Ok(interp.alloc_str(text))
}

/// The Type value describing the argument's type.
fn type_of(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let ty = interp.type_of(args[0]);
    Ok(interp.alloc_payload(TypeId::TYPE, Payload::Type(ty)))
}

fn hash(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let method = interp.names.hash;
    interp.call_method(args[0], method, &[], SourceLoc::DUMMY)
}

/// Print the `dbg` rendering and pass the argument through.
fn dbg(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let v = args[0];
    let method = interp.names.dbg;
    let shown = interp.call_method(v, method, &[], SourceLoc::DUMMY)?;
    let text = match interp.value(shown).as_str() {
        Some(s) => s.to_owned(),
        None => interp.render_default(shown),
    };
    interp.print_handler().println(&text);
    Ok(v)
}

fn len(interp: &mut Interpreter, args: &[ValueRef]) -> EvalResult {
    let method = interp.names.len;
    interp.call_method(args[0], method, &[], SourceLoc::DUMMY)
}

fn gc_dump(interp: &mut Interpreter, _: &[ValueRef]) -> EvalResult {
    let dump = interp.heap.dump(&interp.types, interp.interner());
    interp.print_handler().print(&dump);
    Ok(ValueRef::Nil)
}

fn gc_enable(interp: &mut Interpreter, _: &[ValueRef]) -> EvalResult {
    interp.heap.enable();
    Ok(ValueRef::Nil)
}

fn gc_disable(interp: &mut Interpreter, _: &[ValueRef]) -> EvalResult {
    interp.heap.disable();
    Ok(ValueRef::Nil)
}

fn gc_is_disabled(interp: &mut Interpreter, _: &[ValueRef]) -> EvalResult {
    Ok(ValueRef::bool(interp.heap.is_disabled()))
}

/// Collect now; evaluates to the number of values freed.
fn gc_collect(interp: &mut Interpreter, _: &[ValueRef]) -> EvalResult {
    let freed = interp.collect_garbage();
    Ok(interp.alloc_int(count(freed)))
}

fn gc_live(interp: &mut Interpreter, _: &[ValueRef]) -> EvalResult {
    let live = interp.heap.live();
    Ok(interp.alloc_int(count(live)))
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
