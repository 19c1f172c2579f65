use std::io::Write;

use crate::error::{EngineResult, ErrorKind};
use crate::eval::{require_label, require_type_tag, require_var, resolve_symb, resolve_value};
use crate::frame::{Frames, Slot};
use crate::io::InputSource;
use crate::ops;
use crate::opcode::Opcode;
use crate::program::{Argument, Program};
use crate::stats::{StatSelector, Stats};
use crate::value::{TypeTag, Value};

/// What to write the recorded counters to, and in what order (only
/// present when `--stats` was given).
pub struct StatsConfig {
    pub path: String,
    pub selectors: Vec<StatSelector>,
}

/// Owns every piece of mutable state the interpreter loop touches:
/// frames, both stacks, the statistics counters, and the three external
/// collaborators (input, stdout, diagnostics).
pub struct Interpreter<'p> {
    program: &'p Program,
    frames: Frames,
    call_stack: Vec<usize>,
    data_stack: Vec<Value>,
    stats: Stats,
    pc: usize,
    input: Box<dyn InputSource>,
    stdout: Box<dyn Write + 'p>,
    stderr: Box<dyn Write + 'p>,
}

impl<'p> Interpreter<'p> {
    pub fn new(
        program: &'p Program,
        input: Box<dyn InputSource>,
        stdout: Box<dyn Write + 'p>,
        stderr: Box<dyn Write + 'p>,
    ) -> Self {
        Interpreter {
            program,
            frames: Frames::new(),
            call_stack: Vec::new(),
            data_stack: Vec::new(),
            stats: Stats::new(),
            pc: 0,
            input,
            stdout,
            stderr,
        }
    }

    /// Runs until the program falls off the end or `EXIT` is executed,
    /// returning the process exit code either way, and saving statistics
    /// on both of those paths (never on an error termination).
    pub fn run(mut self, stats_config: Option<StatsConfig>) -> EngineResult<i32> {
        let code = loop {
            if self.pc >= self.program.len() {
                break 0;
            }
            let instr = self.program.get(self.pc).expect("pc within bounds").clone();
            self.pc += 1;

            if let Some(exit_code) = self.execute(&instr)? {
                break exit_code;
            }

            self.stats.sample_vars(self.frames.initialized_count());
            if instr.opcode.counts_toward_stats() {
                self.stats.record_instruction(instr.order);
            }
        };

        if let Some(cfg) = stats_config {
            self.stats.save(&cfg.path, &cfg.selectors)?;
        }

        Ok(code)
    }

    /// Executes one instruction. Returns `Some(code)` only for `EXIT`,
    /// signalling the loop to stop with that process exit code.
    fn execute(&mut self, instr: &crate::program::Instruction) -> EngineResult<Option<i32>> {
        use Opcode::*;

        let args = &instr.args;
        match instr.opcode {
            Label => {}

            Createframe => self.frames.create_frame(),
            Pushframe => self.frames.push_frame()?,
            Popframe => self.frames.pop_frame()?,
            Defvar => {
                let (kind, name) = require_var(&args[0])?;
                self.frames.create_variable(kind, name)?;
            }
            Call => {
                let label = require_label(&args[0])?;
                let target = self.program.label_position(label)?;
                self.call_stack.push(self.pc);
                self.pc = target;
            }
            Return => {
                self.pc = self
                    .call_stack
                    .pop()
                    .ok_or_else(|| ErrorKind::MissingValue("RETURN with an empty call stack".into()))?;
            }

            Pushs => {
                let v = resolve_value(&args[0], &self.frames)?;
                self.data_stack.push(v);
            }
            Pops => {
                let v = self.pop_data()?;
                let (kind, name) = require_var(&args[0])?;
                self.frames.set_value(kind, name, v)?;
            }
            Clears => self.data_stack.clear(),

            Move => {
                let v = resolve_value(&args[1], &self.frames)?;
                self.store(&args[0], v)?;
            }

            Add => self.binary(&args[0], &args[1], &args[2], ops::add)?,
            Sub => self.binary(&args[0], &args[1], &args[2], ops::sub)?,
            Mul => self.binary(&args[0], &args[1], &args[2], ops::mul)?,
            Div => self.binary(&args[0], &args[1], &args[2], ops::div)?,
            Idiv => self.binary(&args[0], &args[1], &args[2], ops::idiv)?,
            Lt => self.binary(&args[0], &args[1], &args[2], ops::lt)?,
            Gt => self.binary(&args[0], &args[1], &args[2], ops::gt)?,
            Eq => self.binary(&args[0], &args[1], &args[2], ops::eq)?,
            And => self.binary(&args[0], &args[1], &args[2], ops::and)?,
            Or => self.binary(&args[0], &args[1], &args[2], ops::or)?,
            Stri2int => self.binary(&args[0], &args[1], &args[2], ops::stri2int)?,
            Concat => self.binary(&args[0], &args[1], &args[2], ops::concat)?,
            Getchar => self.binary(&args[0], &args[1], &args[2], ops::getchar)?,
            Setchar => {
                let (kind, name) = require_var(&args[0])?;
                let current = match self.frames.get_value(kind, name)?.clone() {
                    Slot::Initialized(v) => v,
                    Slot::Uninitialized => {
                        return Err(ErrorKind::MissingValue(
                            "SETCHAR destination is uninitialised".into(),
                        ))
                    }
                };
                let idx = resolve_value(&args[1], &self.frames)?;
                let repl = resolve_value(&args[2], &self.frames)?;
                let result = ops::setchar(current, idx, repl)?;
                self.frames.set_value(kind, name, result)?;
            }

            Not => self.unary(&args[0], &args[1], ops::not)?,
            Int2char => self.unary(&args[0], &args[1], ops::int2char)?,
            Int2float => self.unary(&args[0], &args[1], ops::int2float)?,
            Float2int => self.unary(&args[0], &args[1], ops::float2int)?,
            Strlen => self.unary(&args[0], &args[1], ops::strlen)?,

            Type => {
                let slot = resolve_symb(&args[1], &self.frames)?;
                let name = match slot {
                    Slot::Initialized(v) => v.type_tag().name().to_string(),
                    Slot::Uninitialized => String::new(),
                };
                self.store(&args[0], Value::Str(name))?;
            }

            Adds => self.binary_stack(ops::add)?,
            Subs => self.binary_stack(ops::sub)?,
            Muls => self.binary_stack(ops::mul)?,
            Idivs => self.binary_stack(ops::idiv)?,
            Lts => self.binary_stack(ops::lt)?,
            Gts => self.binary_stack(ops::gt)?,
            Eqs => self.binary_stack(ops::eq)?,
            Ands => self.binary_stack(ops::and)?,
            Ors => self.binary_stack(ops::or)?,
            Stri2ints => self.binary_stack(ops::stri2int)?,
            Nots => self.unary_stack(ops::not)?,
            Int2chars => self.unary_stack(ops::int2char)?,
            Int2floats => self.unary_stack(ops::int2float)?,
            Float2ints => self.unary_stack(ops::float2int)?,

            Read => {
                let (kind, name) = require_var(&args[0])?;
                let ty = require_type_tag(&args[1])?;
                let value = self.read_value(ty);
                self.frames.set_value(kind, name, value)?;
            }
            Write => {
                let v = resolve_value(&args[0], &self.frames)?;
                write!(self.stdout, "{}", v).map_err(|e| ErrorKind::Intern(e.to_string()))?;
            }

            Jump => {
                let label = require_label(&args[0])?;
                self.pc = self.program.label_position(label)?;
            }
            Jumpifeq => self.jump_if(&args[0], &args[1], &args[2], false)?,
            Jumpifneq => self.jump_if(&args[0], &args[1], &args[2], true)?,
            Jumpifeqs => self.jump_if_stack(&args[0], false)?,
            Jumpifneqs => self.jump_if_stack(&args[0], true)?,

            Exit => {
                let v = resolve_value(&args[0], &self.frames)?;
                let code = match v {
                    Value::Int(i) => i,
                    _ => return Err(ErrorKind::BadOperandType("EXIT requires an Int operand".into())),
                };
                if !(0..=49).contains(&code) {
                    return Err(ErrorKind::BadOperandValue(format!(
                        "EXIT code {} outside 0..=49",
                        code
                    )));
                }
                return Ok(Some(code as i32));
            }

            Dprint => {
                let v = resolve_value(&args[0], &self.frames)?;
                write!(self.stderr, "{}", v).map_err(|e| ErrorKind::Intern(e.to_string()))?;
            }
            Break => self.dump_state(),
        }
        Ok(None)
    }

    fn pop_data(&mut self) -> EngineResult<Value> {
        self.data_stack
            .pop()
            .ok_or_else(|| ErrorKind::MissingValue("data stack underflow".into()))
    }

    fn store(&mut self, dest: &Argument, value: Value) -> EngineResult<()> {
        let (kind, name) = require_var(dest)?;
        self.frames.set_value(kind, name, value)
    }

    fn binary(
        &mut self,
        dest: &Argument,
        a: &Argument,
        b: &Argument,
        f: impl Fn(Value, Value) -> EngineResult<Value>,
    ) -> EngineResult<()> {
        let va = resolve_value(a, &self.frames)?;
        let vb = resolve_value(b, &self.frames)?;
        let result = f(va, vb)?;
        self.store(dest, result)
    }

    fn unary(
        &mut self,
        dest: &Argument,
        a: &Argument,
        f: impl Fn(Value) -> EngineResult<Value>,
    ) -> EngineResult<()> {
        let va = resolve_value(a, &self.frames)?;
        let result = f(va)?;
        self.store(dest, result)
    }

    /// Stack-form binary op: the top of the data stack is the *second*
    /// operand, the one beneath it the first.
    fn binary_stack(&mut self, f: impl Fn(Value, Value) -> EngineResult<Value>) -> EngineResult<()> {
        let b = self.pop_data()?;
        let a = self.pop_data()?;
        let result = f(a, b)?;
        self.data_stack.push(result);
        Ok(())
    }

    fn unary_stack(&mut self, f: impl Fn(Value) -> EngineResult<Value>) -> EngineResult<()> {
        let a = self.pop_data()?;
        let result = f(a)?;
        self.data_stack.push(result);
        Ok(())
    }

    fn jump_if(
        &mut self,
        label: &Argument,
        a: &Argument,
        b: &Argument,
        negate: bool,
    ) -> EngineResult<()> {
        let label = require_label(label)?;
        let va = resolve_value(a, &self.frames)?;
        let vb = resolve_value(b, &self.frames)?;
        let equal = matches!(ops::eq(va, vb)?, Value::Bool(true));
        if equal != negate {
            self.pc = self.program.label_position(label)?;
        }
        Ok(())
    }

    fn jump_if_stack(&mut self, label: &Argument, negate: bool) -> EngineResult<()> {
        let label = require_label(label)?;
        let b = self.pop_data()?;
        let a = self.pop_data()?;
        let equal = matches!(ops::eq(a, b)?, Value::Bool(true));
        if equal != negate {
            self.pc = self.program.label_position(label)?;
        }
        Ok(())
    }

    fn read_value(&mut self, ty: TypeTag) -> Value {
        let line = self.input.next_line();
        match ty {
            TypeTag::Bool => match line {
                Some(s) if s.eq_ignore_ascii_case("true") => Value::Bool(true),
                _ => Value::Bool(false),
            },
            TypeTag::Int => match line.and_then(|s| s.trim().parse::<i64>().ok()) {
                Some(i) => Value::Int(i),
                None => Value::Nil,
            },
            TypeTag::Float => match line.and_then(|s| crate::ingest::xml::parse_float(s.trim())) {
                Some(f) => Value::Float(f),
                None => Value::Nil,
            },
            TypeTag::Str => match line {
                Some(s) => Value::Str(s),
                None => Value::Nil,
            },
            TypeTag::Nil => Value::Nil,
        }
    }

    fn dump_state(&mut self) {
        let _ = writeln!(
            self.stderr,
            "-- BREAK at pc={} insts={} call_stack_depth={} data_stack_depth={} vars={}",
            self.pc,
            self.stats.insts(),
            self.call_stack.len(),
            self.data_stack.len(),
            self.frames.initialized_count(),
        );
    }
}
