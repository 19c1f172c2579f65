use crate::error::{EngineResult, ErrorKind};
use crate::frame::{Frames, Slot};
use crate::program::Argument;
use crate::value::{TypeTag, Value};

/// Resolves a `symb`-class argument (`var` or a literal) into a slot,
/// without yet demanding it be initialised (`TYPE` needs to see
/// `Uninitialized` rather than fail on it).
pub fn resolve_symb(arg: &Argument, frames: &Frames) -> EngineResult<Slot> {
    match arg {
        Argument::Var(kind, name) => frames.get_value(*kind, name).cloned(),
        Argument::Literal(v) => Ok(Slot::Initialized(v.clone())),
        Argument::Label(_) | Argument::Type(_) => Err(ErrorKind::BadOperandType(
            "label/type argument used where a value was expected".to_string(),
        )),
    }
}

/// As `resolve_symb`, but fails `MISSING_VALUE` on an uninitialised slot,
/// the evaluator behavior every opcode except `TYPE` wants.
pub fn resolve_value(arg: &Argument, frames: &Frames) -> EngineResult<Value> {
    match resolve_symb(arg, frames)? {
        Slot::Initialized(v) => Ok(v),
        Slot::Uninitialized => Err(ErrorKind::MissingValue(
            "read of an uninitialised variable".to_string(),
        )),
    }
}

/// The `(frame-kind, name)` a writable destination argument must be.
pub fn require_var(arg: &Argument) -> EngineResult<(crate::frame::FrameKind, &str)> {
    match arg {
        Argument::Var(kind, name) => Ok((*kind, name.as_str())),
        _ => Err(ErrorKind::Intern(
            "destination argument is not a variable".to_string(),
        )),
    }
}

pub fn require_label(arg: &Argument) -> EngineResult<&str> {
    match arg {
        Argument::Label(name) => Ok(name.as_str()),
        _ => Err(ErrorKind::BadOperandType(
            "expected a label argument".to_string(),
        )),
    }
}

pub fn require_type_tag(arg: &Argument) -> EngineResult<TypeTag> {
    match arg {
        Argument::Type(t) => Ok(*t),
        _ => Err(ErrorKind::BadOperandType(
            "expected a type argument".to_string(),
        )),
    }
}
