use util::EnumFromStr;
use util_derive::EnumFromStr;

/// Every IPPcode22 opcode, register-form and stack-form alike. Matched
/// from its XML mnemonic case-insensitively via `EnumFromStr`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumFromStr)]
pub enum Opcode {
    Move,
    Createframe,
    Pushframe,
    Popframe,
    Defvar,
    Call,
    Return,

    Pushs,
    Pops,
    Clears,

    Add,
    Sub,
    Mul,
    Div,
    Idiv,
    Lt,
    Gt,
    Eq,
    And,
    Or,
    Not,
    Int2char,
    Stri2int,
    Int2float,
    Float2int,

    Adds,
    Subs,
    Muls,
    Idivs,
    Lts,
    Gts,
    Eqs,
    Ands,
    Ors,
    Nots,
    Int2chars,
    Stri2ints,
    Int2floats,
    Float2ints,

    Read,
    Write,

    Concat,
    Strlen,
    Getchar,
    Setchar,

    Type,

    Label,
    Jump,
    Jumpifeq,
    Jumpifneq,
    Jumpifeqs,
    Jumpifneqs,
    Exit,

    Dprint,
    Break,
}

/// How many XML `argK` children an opcode expects. Ingestion rejects any
/// instruction whose argument count doesn't match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Zero,
    One,
    Two,
    Three,
}

impl Opcode {
    pub fn arity(self) -> Arity {
        use Arity::*;
        use Opcode::*;
        match self {
            Createframe | Pushframe | Popframe | Return | Clears | Break => Zero,
            Adds | Subs | Muls | Idivs | Lts | Gts | Eqs | Ands | Ors | Nots | Int2chars
            | Stri2ints | Int2floats | Float2ints => Zero,

            Defvar | Call | Pushs | Pops | Label | Jump | Exit | Write | Dprint
            | Jumpifeqs | Jumpifneqs => One,

            Move | Not | Int2char | Int2float | Float2int | Strlen | Type | Read => Two,

            Add | Sub | Mul | Div | Idiv | Lt | Gt | Eq | And | Or | Stri2int | Concat | Getchar
            | Setchar | Jumpifeq | Jumpifneq => Three,
        }
    }

    /// Whether this opcode is excluded from the `insts` counter and the
    /// `hot` selection (`LABEL`, `DPRINT`, `BREAK` are metadata/debug,
    /// not "real" execution steps).
    pub fn counts_toward_stats(self) -> bool {
        !matches!(self, Opcode::Label | Opcode::Dprint | Opcode::Break)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_names_parse_case_insensitively() {
        assert_eq!("move".parse::<Opcode>().unwrap(), Opcode::Move);
        assert_eq!("MOVE".parse::<Opcode>().unwrap(), Opcode::Move);
        assert_eq!("MoVe".parse::<Opcode>().unwrap(), Opcode::Move);
    }

    #[test]
    fn unknown_mnemonic_is_rejected() {
        assert!("frobnicate".parse::<Opcode>().is_err());
    }

    #[test]
    fn arities_match_the_language_reference() {
        assert_eq!(Opcode::Createframe.arity(), Arity::Zero);
        assert_eq!(Opcode::Defvar.arity(), Arity::One);
        assert_eq!(Opcode::Move.arity(), Arity::Two);
        assert_eq!(Opcode::Add.arity(), Arity::Three);
        assert_eq!(Opcode::Div.arity(), Arity::Three);
        assert_eq!(Opcode::Jumpifeqs.arity(), Arity::One);
    }

    #[test]
    fn label_dprint_break_are_excluded_from_stats() {
        assert!(!Opcode::Label.counts_toward_stats());
        assert!(!Opcode::Dprint.counts_toward_stats());
        assert!(!Opcode::Break.counts_toward_stats());
        assert!(Opcode::Add.counts_toward_stats());
    }
}
