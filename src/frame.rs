use crate::error::{EngineResult, ErrorKind};
use crate::value::Value;

/// One of a variable's two lifecycle states. Distinct from `Nil`, so
/// `TYPE` can tell "declared but never assigned" from "explicitly nil".
#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    Uninitialized,
    Initialized(Value),
}

/// `GF`/`LF`/`TF`, which of the three frames a `var` argument names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Global,
    Local,
    Temporary,
}

impl FrameKind {
    pub fn parse_prefix(prefix: &str) -> Option<FrameKind> {
        match prefix {
            "GF" => Some(FrameKind::Global),
            "LF" => Some(FrameKind::Local),
            "TF" => Some(FrameKind::Temporary),
            _ => None,
        }
    }
}

/// An ordered associative store from variable name to slot. Insertion
/// order is kept (it's what `BREAK` dumps) but carries no other meaning.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    vars: Vec<(String, Slot)>,
}

impl Frame {
    pub fn new() -> Self {
        Frame { vars: Vec::new() }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.vars.iter().position(|(n, _)| n == name)
    }

    pub fn declare(&mut self, name: &str) -> EngineResult<()> {
        if self.index_of(name).is_some() {
            return Err(ErrorKind::SemanticError(format!(
                "variable {} already exists in frame",
                name
            )));
        }
        self.vars.push((name.to_string(), Slot::Uninitialized));
        Ok(())
    }

    pub fn get(&self, name: &str) -> EngineResult<&Slot> {
        self.index_of(name)
            .map(|i| &self.vars[i].1)
            .ok_or_else(|| ErrorKind::VariableDontExist(name.to_string()))
    }

    pub fn set(&mut self, name: &str, value: Value) -> EngineResult<()> {
        let i = self
            .index_of(name)
            .ok_or_else(|| ErrorKind::VariableDontExist(name.to_string()))?;
        self.vars[i].1 = Slot::Initialized(value);
        Ok(())
    }

    pub fn initialized_count(&self) -> usize {
        self.vars
            .iter()
            .filter(|(_, s)| matches!(s, Slot::Initialized(_)))
            .count()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|(n, _)| n.as_str())
    }
}

/// The global frame, the stack of local frames, and at most one pending
/// temporary frame, plus the lookup helpers that turn `(FrameKind, name)`
/// into a slot.
pub struct Frames {
    global: Frame,
    locals: Vec<Frame>,
    temporary: Option<Frame>,
}

impl Frames {
    pub fn new() -> Self {
        Frames {
            global: Frame::new(),
            locals: Vec::new(),
            temporary: None,
        }
    }

    fn frame(&self, kind: FrameKind) -> EngineResult<&Frame> {
        match kind {
            FrameKind::Global => Ok(&self.global),
            FrameKind::Local => self
                .locals
                .last()
                .ok_or_else(|| ErrorKind::FrameDontExist("no local frame".to_string())),
            FrameKind::Temporary => self
                .temporary
                .as_ref()
                .ok_or_else(|| ErrorKind::FrameDontExist("no temporary frame".to_string())),
        }
    }

    fn frame_mut(&mut self, kind: FrameKind) -> EngineResult<&mut Frame> {
        match kind {
            FrameKind::Global => Ok(&mut self.global),
            FrameKind::Local => self
                .locals
                .last_mut()
                .ok_or_else(|| ErrorKind::FrameDontExist("no local frame".to_string())),
            FrameKind::Temporary => self
                .temporary
                .as_mut()
                .ok_or_else(|| ErrorKind::FrameDontExist("no temporary frame".to_string())),
        }
    }

    pub fn create_variable(&mut self, kind: FrameKind, name: &str) -> EngineResult<()> {
        self.frame_mut(kind)?.declare(name)
    }

    pub fn get_value(&self, kind: FrameKind, name: &str) -> EngineResult<&Slot> {
        self.frame(kind)?.get(name)
    }

    pub fn set_value(&mut self, kind: FrameKind, name: &str, value: Value) -> EngineResult<()> {
        self.frame_mut(kind)?.set(name, value)
    }

    pub fn create_frame(&mut self) {
        self.temporary = Some(Frame::new());
    }

    pub fn push_frame(&mut self) -> EngineResult<()> {
        let frame = self
            .temporary
            .take()
            .ok_or_else(|| ErrorKind::FrameDontExist("no temporary frame to push".to_string()))?;
        self.locals.push(frame);
        Ok(())
    }

    pub fn pop_frame(&mut self) -> EngineResult<()> {
        let frame = self
            .locals
            .pop()
            .ok_or_else(|| ErrorKind::FrameDontExist("no local frame to pop".to_string()))?;
        self.temporary = Some(frame);
        Ok(())
    }

    /// Summed over every live frame, for the `vars` statistic.
    pub fn initialized_count(&self) -> usize {
        let mut total = self.global.initialized_count();
        for f in &self.locals {
            total += f.initialized_count();
        }
        if let Some(f) = &self.temporary {
            total += f.initialized_count();
        }
        total
    }
}
