use std::collections::HashSet;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{EngineResult, ErrorKind};
use crate::frame::FrameKind;
use crate::opcode::{Arity, Opcode};
use crate::program::{Argument, Instruction};
use crate::value::{unescape, TypeTag, Value};

fn bad_structure(msg: impl Into<String>) -> ErrorKind {
    ErrorKind::XmlBadStructure(msg.into())
}

fn bad_format(msg: impl Into<String>) -> ErrorKind {
    ErrorKind::XmlInputFormat(msg.into())
}

/// The `type` attribute's vocabulary on an `argK` element, distinct
/// from `TypeTag`, which is only the five value tags and is itself one
/// of this vocabulary's members (the literal `type` kind).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ArgXmlKind {
    Var,
    Label,
    Type,
    Int,
    Float,
    Bool,
    String,
    Nil,
}

impl ArgXmlKind {
    fn parse(s: &str) -> EngineResult<ArgXmlKind> {
        match s {
            "var" => Ok(ArgXmlKind::Var),
            "label" => Ok(ArgXmlKind::Label),
            "type" => Ok(ArgXmlKind::Type),
            "int" => Ok(ArgXmlKind::Int),
            "float" => Ok(ArgXmlKind::Float),
            "bool" => Ok(ArgXmlKind::Bool),
            "string" => Ok(ArgXmlKind::String),
            "nil" => Ok(ArgXmlKind::Nil),
            other => Err(bad_structure(format!("unknown argument type \"{}\"", other))),
        }
    }
}

struct PartialInstruction {
    order: u32,
    opcode: Opcode,
    args: [Option<Argument>; 3],
}

impl PartialInstruction {
    fn finish(self) -> EngineResult<Instruction> {
        let expected = match self.opcode.arity() {
            Arity::Zero => 0,
            Arity::One => 1,
            Arity::Two => 2,
            Arity::Three => 3,
        };
        let mut args = Vec::with_capacity(expected);
        for (i, slot) in self.args.into_iter().enumerate() {
            match slot {
                Some(arg) => args.push(arg),
                None => {
                    if i < expected {
                        return Err(bad_structure(format!(
                            "instruction at order {} is missing arg{}",
                            self.order,
                            i + 1
                        )));
                    }
                    break;
                }
            }
        }
        if args.len() != expected {
            return Err(bad_structure(format!(
                "instruction at order {} expects {} argument(s), found {}",
                self.order,
                expected,
                args.len()
            )));
        }
        Ok(Instruction {
            order: self.order,
            opcode: self.opcode,
            args,
        })
    }
}

/// Parses the whole XML document into an unsorted, unchecked-for-order
/// `Instruction` vector (order uniqueness is checked here; sorting and
/// label-index construction belong to `Program::new`).
pub fn parse(xml: &str) -> EngineResult<Vec<Instruction>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    reader.check_end_names(true);

    let mut seen_root = false;
    let mut instructions = Vec::new();
    let mut seen_orders: HashSet<u32> = HashSet::new();

    let mut current: Option<PartialInstruction> = None;
    // (arg index 0..3, xml kind, accumulated text)
    let mut current_arg: Option<(usize, ArgXmlKind, String)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| bad_format(e.to_string()))?;

        match event {
            Event::Eof => break,
            Event::Text(text) => {
                if let Some((_, _, buf)) = current_arg.as_mut() {
                    let decoded = text
                        .unescape()
                        .map_err(|e| bad_format(e.to_string()))?;
                    buf.push_str(&decoded);
                }
            }
            Event::Start(ref e) => {
                let name = local_name(e.name().as_ref());
                start_element(
                    &name,
                    e,
                    &mut seen_root,
                    &mut current,
                    &mut current_arg,
                    &mut seen_orders,
                )?;
            }
            Event::Empty(ref e) => {
                let name = local_name(e.name().as_ref());
                start_element(
                    &name,
                    e,
                    &mut seen_root,
                    &mut current,
                    &mut current_arg,
                    &mut seen_orders,
                )?;
                end_element(&name, &mut current, &mut current_arg, &mut instructions)?;
            }
            Event::End(ref e) => {
                let name = local_name(e.name().as_ref());
                end_element(&name, &mut current, &mut current_arg, &mut instructions)?;
            }
            _ => {}
        }
    }

    if !seen_root {
        return Err(bad_structure("missing <program> root element"));
    }

    Ok(instructions)
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_string()
}

fn attr_value(e: &quick_xml::events::BytesStart, key: &str) -> EngineResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| bad_format(err.to_string()))?;
        if attr.key.as_ref() == key.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|err| bad_format(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

#[allow(clippy::too_many_arguments)]
fn start_element(
    name: &str,
    e: &quick_xml::events::BytesStart,
    seen_root: &mut bool,
    current: &mut Option<PartialInstruction>,
    current_arg: &mut Option<(usize, ArgXmlKind, String)>,
    seen_orders: &mut HashSet<u32>,
) -> EngineResult<()> {
    match name {
        "program" => {
            if *seen_root {
                return Err(bad_structure("more than one <program> root element"));
            }
            let language = attr_value(e, "language")?;
            if language.as_deref() != Some("IPPcode22") {
                return Err(bad_structure("<program> missing language=\"IPPcode22\""));
            }
            *seen_root = true;
        }
        "instruction" => {
            if !*seen_root {
                return Err(bad_structure("<instruction> outside <program>"));
            }
            if current.is_some() {
                return Err(bad_structure("nested <instruction>"));
            }
            let order_text = attr_value(e, "order")?
                .ok_or_else(|| bad_structure("<instruction> missing order attribute"))?;
            let opcode_text = attr_value(e, "opcode")?
                .ok_or_else(|| bad_structure("<instruction> missing opcode attribute"))?;
            let order = parse_order(&order_text)?;
            if !seen_orders.insert(order) {
                return Err(bad_structure(format!("duplicate instruction order {}", order)));
            }
            let opcode: Opcode = opcode_text.parse()?;
            *current = Some(PartialInstruction {
                order,
                opcode,
                args: [None, None, None],
            });
        }
        "arg1" | "arg2" | "arg3" => {
            if current.is_none() {
                return Err(bad_structure("argument element outside <instruction>"));
            }
            let idx = (name.as_bytes()[3] - b'1') as usize;
            if current.as_ref().unwrap().args[idx].is_some() {
                return Err(bad_structure(format!("duplicate {}", name)));
            }
            let type_text = attr_value(e, "type")?
                .ok_or_else(|| bad_structure(format!("{} missing type attribute", name)))?;
            let kind = ArgXmlKind::parse(&type_text)?;
            *current_arg = Some((idx, kind, String::new()));
        }
        "name" | "description" => {}
        other => return Err(bad_structure(format!("unexpected element <{}>", other))),
    }
    Ok(())
}

fn end_element(
    name: &str,
    current: &mut Option<PartialInstruction>,
    current_arg: &mut Option<(usize, ArgXmlKind, String)>,
    instructions: &mut Vec<Instruction>,
) -> EngineResult<()> {
    match name {
        "arg1" | "arg2" | "arg3" => {
            if let Some((idx, kind, text)) = current_arg.take() {
                let arg = build_argument(kind, text.trim())?;
                let instr = current
                    .as_mut()
                    .ok_or_else(|| bad_structure("argument closed outside instruction"))?;
                instr.args[idx] = Some(arg);
            }
        }
        "instruction" => {
            if let Some(instr) = current.take() {
                instructions.push(instr.finish()?);
            }
        }
        _ => {}
    }
    Ok(())
}

fn parse_order(text: &str) -> EngineResult<u32> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(bad_structure(format!("invalid order value \"{}\"", text)));
    }
    let order: u32 = text
        .parse()
        .map_err(|_| bad_structure(format!("invalid order value \"{}\"", text)))?;
    if order == 0 {
        return Err(bad_structure("instruction order must be nonzero"));
    }
    Ok(order)
}

fn build_argument(kind: ArgXmlKind, text: &str) -> EngineResult<Argument> {
    match kind {
        ArgXmlKind::Var => {
            let (prefix, name) = text
                .split_once('@')
                .ok_or_else(|| bad_structure(format!("malformed variable \"{}\"", text)))?;
            if name.is_empty() {
                return Err(bad_structure("variable name is empty"));
            }
            let frame = FrameKind::parse_prefix(prefix)
                .ok_or_else(|| bad_structure(format!("unknown frame prefix \"{}\"", prefix)))?;
            Ok(Argument::Var(frame, name.to_string()))
        }
        ArgXmlKind::Label => Ok(Argument::Label(text.to_string())),
        ArgXmlKind::Type => {
            let tag = TypeTag::parse(text)
                .ok_or_else(|| bad_structure(format!("unknown type token \"{}\"", text)))?;
            Ok(Argument::Type(tag))
        }
        ArgXmlKind::Int => {
            let value: i64 = text
                .parse()
                .map_err(|_| bad_structure(format!("invalid int literal \"{}\"", text)))?;
            Ok(Argument::Literal(Value::Int(value)))
        }
        ArgXmlKind::Float => {
            let value = parse_float(text)
                .ok_or_else(|| bad_structure(format!("invalid float literal \"{}\"", text)))?;
            Ok(Argument::Literal(Value::Float(value)))
        }
        ArgXmlKind::Bool => match text {
            "true" => Ok(Argument::Literal(Value::Bool(true))),
            "false" => Ok(Argument::Literal(Value::Bool(false))),
            _ => Err(bad_structure(format!("invalid bool literal \"{}\"", text))),
        },
        ArgXmlKind::String => Ok(Argument::Literal(Value::Str(unescape(text)))),
        ArgXmlKind::Nil => {
            if text == "nil" {
                Ok(Argument::Literal(Value::Nil))
            } else {
                Err(bad_structure(format!("invalid nil literal \"{}\"", text)))
            }
        }
    }
}

/// Accepts plain decimal float syntax (`"3.14"`, `"1e10"`) and the
/// hexadecimal-float form (`"0x1.8p3"`), matching the source's
/// `float()`-then-`float.fromhex()` fallback.
pub(crate) fn parse_float(text: &str) -> Option<f64> {
    let lower = text.to_ascii_lowercase();
    if lower.contains("0x") {
        parse_hex_float(&lower)
    } else {
        text.parse().ok()
    }
}

fn parse_hex_float(text: &str) -> Option<f64> {
    let (sign, rest) = match text.strip_prefix('-') {
        Some(r) => (-1.0, r),
        None => (1.0, text.strip_prefix('+').unwrap_or(text)),
    };
    let rest = rest.strip_prefix("0x")?;
    let (mantissa, exponent) = match rest.split_once('p') {
        Some((m, e)) => (m, e),
        None => (rest, "0"),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    let mut value = 0f64;
    if !int_part.is_empty() {
        value += i64::from_str_radix(int_part, 16).ok()? as f64;
    }
    for (i, c) in frac_part.chars().enumerate() {
        let digit = c.to_digit(16)? as f64;
        value += digit / 16f64.powi(i as i32 + 1);
    }
    let exp: i32 = exponent.parse().ok()?;
    Some(sign * value * 2f64.powi(exp))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><program language="IPPcode22">{}</program>"#,
            body
        )
    }

    #[test]
    fn parses_a_minimal_instruction() {
        let xml = doc(
            r#"<instruction order="1" opcode="WRITE"><arg1 type="string">hi</arg1></instruction>"#,
        );
        let instrs = parse(&xml).unwrap();
        assert_eq!(instrs.len(), 1);
        assert_eq!(instrs[0].order, 1);
        assert_eq!(instrs[0].opcode, Opcode::Write);
        assert_eq!(instrs[0].args, vec![Argument::Literal(Value::Str("hi".into()))]);
    }

    #[test]
    fn rejects_wrong_language_attribute() {
        let xml = r#"<program language="other"></program>"#;
        assert_eq!(parse(xml).unwrap_err().exit_code(), 32);
    }

    #[test]
    fn rejects_zero_order() {
        let xml = doc(r#"<instruction order="0" opcode="CREATEFRAME"></instruction>"#);
        assert_eq!(parse(&xml).unwrap_err().exit_code(), 32);
    }

    #[test]
    fn rejects_duplicate_order() {
        let xml = doc(
            r#"<instruction order="1" opcode="CREATEFRAME"></instruction>
               <instruction order="1" opcode="PUSHFRAME"></instruction>"#,
        );
        assert_eq!(parse(&xml).unwrap_err().exit_code(), 32);
    }

    #[test]
    fn rejects_missing_arg_gap() {
        let xml = doc(
            r#"<instruction order="1" opcode="ADD">
                 <arg1 type="var">GF@x</arg1>
                 <arg3 type="int">1</arg3>
               </instruction>"#,
        );
        assert_eq!(parse(&xml).unwrap_err().exit_code(), 32);
    }

    #[test]
    fn resolves_string_escapes() {
        let xml = doc(
            r#"<instruction order="1" opcode="WRITE"><arg1 type="string">Hello\032World</arg1></instruction>"#,
        );
        let instrs = parse(&xml).unwrap();
        assert_eq!(
            instrs[0].args[0],
            Argument::Literal(Value::Str("Hello World".to_string()))
        );
    }

    #[test]
    fn parses_var_with_frame_prefix() {
        let xml = doc(
            r#"<instruction order="1" opcode="DEFVAR"><arg1 type="var">LF@counter</arg1></instruction>"#,
        );
        let instrs = parse(&xml).unwrap();
        assert_eq!(
            instrs[0].args[0],
            Argument::Var(FrameKind::Local, "counter".to_string())
        );
    }

    #[test]
    fn parses_hex_float_literals() {
        let xml = doc(
            r#"<instruction order="1" opcode="WRITE"><arg1 type="float">0x1.8p3</arg1></instruction>"#,
        );
        let instrs = parse(&xml).unwrap();
        assert_eq!(instrs[0].args[0], Argument::Literal(Value::Float(12.0)));
    }

    #[test]
    fn args_are_reordered_by_suffix_regardless_of_document_order() {
        let xml = doc(
            r#"<instruction order="1" opcode="ADD">
                 <arg3 type="int">2</arg3>
                 <arg1 type="var">GF@x</arg1>
                 <arg2 type="int">1</arg2>
               </instruction>"#,
        );
        let instrs = parse(&xml).unwrap();
        assert_eq!(
            instrs[0].args,
            vec![
                Argument::Var(FrameKind::Global, "x".to_string()),
                Argument::Literal(Value::Int(1)),
                Argument::Literal(Value::Int(2)),
            ]
        );
    }

    #[test]
    fn malformed_xml_is_xml_input_format_not_bad_structure() {
        let xml = "<program language=\"IPPcode22\"><instruction></program>";
        assert_eq!(parse(xml).unwrap_err().exit_code(), 31);
    }
}
