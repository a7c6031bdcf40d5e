//! Text format printer.
//!
//! ```text
//! rel_alg.compare() ["comparator" = "="] {
//!   rel_alg.column() ["col_name" = "a"]
//! } {
//!   rel_alg.literal() ["val" = 5 : !i64, "type" = !rel_alg.int32]
//! }
//! ```
//!
//! A region holding one non-empty block prints its operations directly;
//! any other region prints `^bbN:` labels, so the block structure survives
//! a round trip through [`crate::parse_op`].

use std::fmt::{self, Write};

use crate::ir::{Operation, Region, Value};
use crate::symbol::Symbol;
use crate::types::{Attribute, DataType};

const INDENT: usize = 2;

/// Print an operation tree as IR text, ending with a newline.
pub fn print_op(op: &Operation) -> String {
    op.to_string()
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_op(f, self, 0)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type(f, self)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_attribute(f, self)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('%')?;
        write_name(f, self.name())?;
        f.write_str(": ")?;
        write_type(f, self.ty())
    }
}

// ============================================================================
// Type printing
// ============================================================================

fn write_type(f: &mut impl Write, ty: &DataType) -> fmt::Result {
    write!(f, "!{}", ty.name())?;
    if !ty.params().is_empty() {
        f.write_char('<')?;
        for (i, (key, val)) in ty.params().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: ")?;
            // The parameter kind fixes the width, so integers print bare.
            match val {
                Attribute::Integer { value, .. } => write!(f, "{value}")?,
                other => write_attribute(f, other)?,
            }
        }
        f.write_char('>')?;
    }
    Ok(())
}

// ============================================================================
// Attribute printing
// ============================================================================

fn write_attribute(f: &mut impl Write, attr: &Attribute) -> fmt::Result {
    match attr {
        Attribute::Integer { value, width } => write!(f, "{value} : !i{width}"),
        Attribute::String(s) => write_quoted(f, s),
        Attribute::Type(ty) => write_type(f, ty),
        Attribute::Array(items) => {
            f.write_char('[')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_attribute(f, item)?;
            }
            f.write_char(']')
        }
    }
}

fn write_quoted(f: &mut impl Write, s: &str) -> fmt::Result {
    f.write_char('"')?;
    write_escaped_string(f, s)?;
    f.write_char('"')
}

fn write_escaped_string(f: &mut impl Write, s: &str) -> fmt::Result {
    for ch in s.chars() {
        match ch {
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            '\0' => f.write_str("\\0")?,
            c if c.is_control() => write!(f, "\\x{:02x}", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    Ok(())
}

/// Value names print bare when they are identifiers, quoted otherwise.
fn write_name(f: &mut impl Write, name: Symbol) -> fmt::Result {
    name.with_str(|s| {
        if crate::symbol::is_ident(s) {
            f.write_str(s)
        } else {
            write_quoted(f, s)
        }
    })
}

// ============================================================================
// Operation printing
// ============================================================================

fn write_op(f: &mut impl Write, op: &Operation, indent: usize) -> fmt::Result {
    write!(f, "{:indent$}{}(", "", op.kind())?;
    for (i, operand) in op.operands().iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{operand}")?;
    }
    f.write_char(')')?;

    let attrs = op.attributes();
    if !attrs.is_empty() {
        f.write_str(" [")?;
        for (i, (key, val)) in attrs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            key.with_str(|k| write_quoted(f, k))?;
            f.write_str(" = ")?;
            write_attribute(f, val)?;
        }
        f.write_char(']')?;
    }

    let results = op.results();
    if !results.is_empty() {
        f.write_str(" : ")?;
        for (i, ty) in results.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write_type(f, ty)?;
        }
    }

    for region in op.regions() {
        f.write_str(" {\n")?;
        write_region(f, region, indent + INDENT)?;
        write!(f, "{:indent$}}}", "")?;
    }

    f.write_char('\n')
}

// ============================================================================
// Region / Block printing
// ============================================================================

fn write_region(f: &mut impl Write, region: &Region, indent: usize) -> fmt::Result {
    if let Some(block) = region.single_block()
        && !block.is_empty()
    {
        for op in block.ops() {
            write_op(f, op, indent)?;
        }
        return Ok(());
    }

    let blocks = region.blocks();
    for (i, block) in blocks.iter().enumerate() {
        writeln!(f, "{:indent$}^bb{i}:", "")?;
        for op in block.ops() {
            write_op(f, op, indent + INDENT)?;
        }
        if i + 1 < blocks.len() {
            // Blank line between blocks for readability
            f.write_char('\n')?;
        }
    }
    Ok(())
}
