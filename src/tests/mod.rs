//! End-to-end scenarios run through the public ingestion + interpreter
//! pipeline, exercising whole programs rather than single instructions
//! (those live next to the code they exercise, under `#[cfg(test)]` in
//! each module).

use crate::frame::FrameKind;
use crate::interpreter::Interpreter;
use crate::io::InputSource;
use crate::opcode::Opcode;
use crate::program::{Argument, Instruction, Program};
use crate::value::Value;

struct VecInput {
    lines: Vec<String>,
    index: usize,
}

impl VecInput {
    fn new(lines: &[&str]) -> Self {
        VecInput {
            lines: lines.iter().map(|s| s.to_string()).collect(),
            index: 0,
        }
    }
}

impl InputSource for VecInput {
    fn next_line(&mut self) -> Option<String> {
        let line = self.lines.get(self.index).cloned();
        self.index += 1;
        line
    }
}

fn instr(order: u32, opcode: Opcode, args: Vec<Argument>) -> Instruction {
    Instruction { order, opcode, args }
}

fn gf(name: &str) -> Argument {
    Argument::Var(FrameKind::Global, name.to_string())
}

fn lf(name: &str) -> Argument {
    Argument::Var(FrameKind::Local, name.to_string())
}

fn tf(name: &str) -> Argument {
    Argument::Var(FrameKind::Temporary, name.to_string())
}

fn int(v: i64) -> Argument {
    Argument::Literal(Value::Int(v))
}

fn string(s: &str) -> Argument {
    Argument::Literal(Value::Str(s.to_string()))
}

fn float(v: f64) -> Argument {
    Argument::Literal(Value::Float(v))
}

fn label(name: &str) -> Argument {
    Argument::Label(name.to_string())
}

/// Runs `instrs` to completion and returns `(stdout, stderr, exit_code)`.
fn run(instrs: Vec<Instruction>, input_lines: &[&str]) -> (String, String, i32) {
    let program = Program::new(instrs).expect("program should build");
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = {
        let interpreter = Interpreter::new(
            &program,
            Box::new(VecInput::new(input_lines)),
            Box::new(&mut stdout),
            Box::new(&mut stderr),
        );
        interpreter.run(None).expect("program should not error")
    };
    (
        String::from_utf8(stdout).unwrap(),
        String::from_utf8(stderr).unwrap(),
        code,
    )
}

fn run_expect_err(instrs: Vec<Instruction>) -> crate::error::ErrorKind {
    let program = Program::new(instrs).expect("program should build");
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let interpreter = Interpreter::new(
        &program,
        Box::new(VecInput::new(&[])),
        Box::new(&mut stdout),
        Box::new(&mut stderr),
    );
    interpreter.run(None).expect_err("program should error")
}

#[test]
fn scenario_hello() {
    let (stdout, _stderr, code) = run(
        vec![instr(1, Opcode::Write, vec![string("Hello World")])],
        &[],
    );
    assert_eq!(stdout, "Hello World");
    assert_eq!(code, 0);
}

#[test]
fn scenario_arithmetic_with_typing() {
    let (stdout, _stderr, code) = run(
        vec![
            instr(1, Opcode::Defvar, vec![gf("a")]),
            instr(2, Opcode::Move, vec![gf("a"), int(3)]),
            instr(3, Opcode::Add, vec![gf("a"), gf("a"), int(4)]),
            instr(4, Opcode::Write, vec![gf("a")]),
        ],
        &[],
    );
    assert_eq!(stdout, "7");
    assert_eq!(code, 0);
}

#[test]
fn scenario_division_by_zero_halts_before_any_further_output() {
    let err = run_expect_err(vec![
        instr(1, Opcode::Defvar, vec![gf("r")]),
        instr(2, Opcode::Idiv, vec![gf("r"), int(1), int(0)]),
        instr(3, Opcode::Write, vec![string("unreachable")]),
    ]);
    assert_eq!(err.exit_code(), 57);
}

#[test]
fn scenario_call_and_return() {
    let (stdout, _stderr, code) = run(
        vec![
            instr(1, Opcode::Call, vec![label("sub")]),
            instr(2, Opcode::Write, vec![string("AFTER")]),
            instr(3, Opcode::Exit, vec![int(0)]),
            instr(4, Opcode::Label, vec![label("sub")]),
            instr(5, Opcode::Write, vec![string("IN")]),
            instr(6, Opcode::Return, vec![]),
        ],
        &[],
    );
    assert_eq!(stdout, "INAFTER");
    assert_eq!(code, 0);
}

#[test]
fn scenario_frame_lifecycle() {
    let (stdout, _stderr, code) = run(
        vec![
            instr(1, Opcode::Createframe, vec![]),
            instr(2, Opcode::Defvar, vec![tf("x")]),
            instr(3, Opcode::Move, vec![tf("x"), int(1)]),
            instr(4, Opcode::Pushframe, vec![]),
            instr(5, Opcode::Write, vec![lf("x")]),
            instr(6, Opcode::Popframe, vec![]),
            instr(7, Opcode::Write, vec![tf("x")]),
        ],
        &[],
    );
    assert_eq!(stdout, "11");
    assert_eq!(code, 0);
}

#[test]
fn scenario_reading_an_uninitialised_variable_fails() {
    let err = run_expect_err(vec![
        instr(1, Opcode::Defvar, vec![gf("x")]),
        instr(2, Opcode::Write, vec![gf("x")]),
    ]);
    assert_eq!(err.exit_code(), 56);
}

#[test]
fn stack_opcodes_round_trip_through_push_and_pop() {
    let (stdout, _stderr, code) = run(
        vec![
            instr(1, Opcode::Defvar, vec![gf("x")]),
            instr(2, Opcode::Pushs, vec![int(41)]),
            instr(3, Opcode::Pushs, vec![int(1)]),
            instr(4, Opcode::Adds, vec![]),
            instr(5, Opcode::Pops, vec![gf("x")]),
            instr(6, Opcode::Write, vec![gf("x")]),
        ],
        &[],
    );
    assert_eq!(stdout, "42");
    assert_eq!(code, 0);
}

#[test]
fn jumpifeq_skips_when_types_match_and_differ() {
    let (stdout, _stderr, code) = run(
        vec![
            instr(1, Opcode::Jumpifeq, vec![label("same"), int(1), int(1)]),
            instr(2, Opcode::Write, vec![string("not-taken")]),
            instr(3, Opcode::Jump, vec![label("end")]),
            instr(4, Opcode::Label, vec![label("same")]),
            instr(5, Opcode::Write, vec![string("taken")]),
            instr(6, Opcode::Label, vec![label("end")]),
        ],
        &[],
    );
    assert_eq!(stdout, "taken");
    assert_eq!(code, 0);
}

#[test]
fn read_int_yields_nil_on_unparsable_input() {
    let (stdout, _stderr, code) = run(
        vec![
            instr(1, Opcode::Defvar, vec![gf("x")]),
            instr(2, Opcode::Read, vec![gf("x"), Argument::Type(crate::value::TypeTag::Int)]),
            instr(3, Opcode::Write, vec![gf("x")]),
        ],
        &["not-a-number"],
    );
    assert_eq!(stdout, "");
    assert_eq!(code, 0);
}

#[test]
fn read_bool_at_end_of_input_resolves_to_false_not_nil() {
    let (stdout, _stderr, code) = run(
        vec![
            instr(1, Opcode::Defvar, vec![gf("x")]),
            instr(2, Opcode::Read, vec![gf("x"), Argument::Type(crate::value::TypeTag::Bool)]),
            instr(3, Opcode::Write, vec![gf("x")]),
        ],
        &[],
    );
    assert_eq!(stdout, "false");
    assert_eq!(code, 0);
}

#[test]
fn div_requires_float_operands_and_produces_a_float_result() {
    let (stdout, _stderr, code) = run(
        vec![
            instr(1, Opcode::Defvar, vec![gf("r")]),
            instr(2, Opcode::Div, vec![gf("r"), float(7.0), float(2.0)]),
            instr(3, Opcode::Write, vec![gf("r")]),
        ],
        &[],
    );
    assert_eq!(stdout, "3.5");
    assert_eq!(code, 0);
}

#[test]
fn div_by_zero_is_bad_operand_value() {
    let err = run_expect_err(vec![
        instr(1, Opcode::Defvar, vec![gf("r")]),
        instr(2, Opcode::Div, vec![gf("r"), float(1.0), float(0.0)]),
    ]);
    assert_eq!(err.exit_code(), 57);
}

#[test]
fn div_rejects_int_operands() {
    let err = run_expect_err(vec![
        instr(1, Opcode::Defvar, vec![gf("r")]),
        instr(2, Opcode::Div, vec![gf("r"), int(1), int(2)]),
    ]);
    assert_eq!(err.exit_code(), 53);
}

#[test]
fn exit_code_out_of_range_is_bad_operand_value() {
    let err = run_expect_err(vec![instr(1, Opcode::Exit, vec![int(50)])]);
    assert_eq!(err.exit_code(), 57);
}
