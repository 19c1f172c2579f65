//! Turns an external source of text into the ordered `Instruction`
//! vector the engine core consumes. The only implementation today is
//! the XML grammar from the external interface; it's kept in its own
//! module so the core never depends on `quick_xml` directly.

pub mod xml;
