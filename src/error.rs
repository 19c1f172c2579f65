use thiserror::Error;

/// Every failure mode the engine can terminate with, each carrying the
/// exit code the process must report.
#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("bad argument: {0}")]
    BadArg(String),

    #[error("input file: {0}")]
    InputFile(String),

    #[error("output file: {0}")]
    OutputFile(String),

    #[error("xml input format: {0}")]
    XmlInputFormat(String),

    #[error("xml bad structure: {0}")]
    XmlBadStructure(String),

    #[error("semantic error: {0}")]
    SemanticError(String),

    #[error("bad operand type: {0}")]
    BadOperandType(String),

    #[error("variable does not exist: {0}")]
    VariableDontExist(String),

    #[error("frame does not exist: {0}")]
    FrameDontExist(String),

    #[error("missing value: {0}")]
    MissingValue(String),

    #[error("bad operand value: {0}")]
    BadOperandValue(String),

    #[error("bad string operation: {0}")]
    BadStringOperation(String),

    #[error("internal error: {0}")]
    Intern(String),
}

impl ErrorKind {
    /// The process exit status this error must produce, per the
    /// interpreter's external interface.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::BadArg(_) => 10,
            ErrorKind::InputFile(_) => 11,
            ErrorKind::OutputFile(_) => 12,
            ErrorKind::XmlInputFormat(_) => 31,
            ErrorKind::XmlBadStructure(_) => 32,
            ErrorKind::SemanticError(_) => 52,
            ErrorKind::BadOperandType(_) => 53,
            ErrorKind::VariableDontExist(_) => 54,
            ErrorKind::FrameDontExist(_) => 55,
            ErrorKind::MissingValue(_) => 56,
            ErrorKind::BadOperandValue(_) => 57,
            ErrorKind::BadStringOperation(_) => 58,
            ErrorKind::Intern(_) => 99,
        }
    }
}

pub type EngineResult<T> = Result<T, ErrorKind>;

impl From<util::ParseEnumError> for ErrorKind {
    fn from(e: util::ParseEnumError) -> Self {
        ErrorKind::XmlBadStructure(e.to_string())
    }
}
