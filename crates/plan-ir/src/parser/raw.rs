//! Raw (unresolved) parse structures and winnow combinators.
//!
//! This is the first parsing stage: text → `Raw*` structs. Nothing here
//! consults a [`crate::Context`]; names and parameters are resolved later.

use winnow::ascii;
use winnow::combinator::{alt, cut_err, delimited, fail, opt, preceded, separated};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};

use crate::types::INTEGER_WIDTHS;

// ============================================================================
// Raw (unresolved) structures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawOperation<'a> {
    pub dialect: &'a str,
    pub op_name: &'a str,
    pub operands: Vec<(String, RawType<'a>)>,
    pub attributes: Vec<(String, RawAttribute<'a>)>,
    pub result_types: Vec<RawType<'a>>,
    pub regions: Vec<RawRegion<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawRegion<'a> {
    pub blocks: Vec<RawBlock<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawBlock<'a> {
    pub ops: Vec<RawOperation<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawType<'a> {
    pub dialect: &'a str,
    pub name: &'a str,
    pub params: Vec<(&'a str, RawTypeParam<'a>)>,
}

/// A type parameter value. Integers may appear without a width suffix.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawTypeParam<'a> {
    Int(i64),
    Attr(RawAttribute<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawAttribute<'a> {
    Int { value: i64, width: u32 },
    String(String),
    Type(RawType<'a>),
    Array(Vec<RawAttribute<'a>>),
}

fn backtrack<T>() -> ModalResult<T> {
    Err(ErrMode::Backtrack(ContextError::new()))
}

fn expected(what: &'static str) -> StrContext {
    StrContext::Expected(StrContextValue::Description(what))
}

/// Fail without backtracking, recording what was expected here.
fn cut_expected<T>(input: &mut &str, what: &'static str) -> ModalResult<T> {
    cut_err(fail).context(expected(what)).parse_next(input)
}

// ============================================================================
// Lexical parsers
// ============================================================================

/// Skip whitespace.
pub(crate) fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_ascii_whitespace())
        .void()
        .parse_next(input)
}

/// Parse an identifier: [a-zA-Z_][a-zA-Z0-9_]*
pub(crate) fn ident<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

/// Parse a dialect-qualified name: dialect.name
pub(crate) fn qualified_name<'a>(input: &mut &'a str) -> ModalResult<(&'a str, &'a str)> {
    (ident, '.', ident)
        .map(|(d, _, n)| (d, n))
        .parse_next(input)
}

/// Parse a value name: %name or %"quoted name"
pub(crate) fn value_name(input: &mut &str) -> ModalResult<String> {
    '%'.parse_next(input)?;
    if input.starts_with('"') {
        string_lit.parse_next(input)
    } else {
        ident.map(str::to_owned).parse_next(input)
    }
}

/// Parse a block label: ^bbN or ^name
pub(crate) fn block_label<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    preceded(
        '^',
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
    .parse_next(input)
}

/// Parse a signed 64-bit integer literal.
pub(crate) fn integer_lit(input: &mut &str) -> ModalResult<i64> {
    let negative = opt('-').parse_next(input)?.is_some();
    let magnitude: u64 = ascii::dec_uint(input)?;
    let value = if negative {
        // i64::MIN has no positive counterpart.
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    };
    match value {
        Some(value) => Ok(value),
        None => backtrack(),
    }
}

/// Parse an integer width suffix: `: !iN` with N in 1..=64.
fn width_suffix(input: &mut &str) -> ModalResult<u32> {
    preceded(
        (ws, ':', ws, "!i"),
        cut_err(ascii::dec_uint.verify(|width: &u32| INTEGER_WIDTHS.contains(width)))
            .context(expected("integer width between 1 and 64")),
    )
    .parse_next(input)
}

/// Parse a string literal: "content"
pub(crate) fn string_lit(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut result = String::new();
    loop {
        let c = any.parse_next(input)?;
        match c {
            '"' => break,
            '\\' => {
                let escaped = any.parse_next(input)?;
                match escaped {
                    '"' => result.push('"'),
                    '\\' => result.push('\\'),
                    'n' => result.push('\n'),
                    't' => result.push('\t'),
                    'r' => result.push('\r'),
                    '0' => result.push('\0'),
                    'x' => {
                        let hex = (
                            one_of(|c: char| c.is_ascii_hexdigit()),
                            one_of(|c: char| c.is_ascii_hexdigit()),
                        )
                            .take()
                            .parse_next(input)?;
                        match u8::from_str_radix(hex, 16) {
                            Ok(code) => result.push(char::from(code)),
                            Err(_) => return backtrack(),
                        }
                    }
                    _ => return cut_expected(input, "escape sequence"),
                }
            }
            _ => result.push(c),
        }
    }
    Ok(result)
}

// ============================================================================
// Types and attributes
// ============================================================================

/// Parse a type: `!dialect.name` or `!dialect.name<key: value, ...>`.
pub(crate) fn raw_type<'a>(input: &mut &'a str) -> ModalResult<RawType<'a>> {
    let (dialect, name) = preceded('!', qualified_name).parse_next(input)?;
    let params = opt(delimited(
        ('<', ws),
        separated(
            0..,
            (ws, ident, ws, ':', ws, raw_type_param, ws).map(|(_, k, _, _, _, v, _)| (k, v)),
            ',',
        ),
        (ws, '>'),
    ))
    .parse_next(input)?
    .unwrap_or_default();
    Ok(RawType {
        dialect,
        name,
        params,
    })
}

fn raw_type_param<'a>(input: &mut &'a str) -> ModalResult<RawTypeParam<'a>> {
    alt((
        raw_int_attr.map(RawTypeParam::Attr),
        integer_lit.map(RawTypeParam::Int),
        raw_attr_value.map(RawTypeParam::Attr),
    ))
    .parse_next(input)
}

fn raw_int_attr<'a>(input: &mut &'a str) -> ModalResult<RawAttribute<'a>> {
    (integer_lit, width_suffix)
        .map(|(value, width)| RawAttribute::Int { value, width })
        .parse_next(input)
}

/// Parse an attribute value.
pub(crate) fn raw_attr_value<'a>(input: &mut &'a str) -> ModalResult<RawAttribute<'a>> {
    alt((
        string_lit.map(RawAttribute::String),
        raw_type.map(RawAttribute::Type),
        delimited(
            ('[', ws),
            separated(0.., (ws, raw_attr_value, ws).map(|(_, a, _)| a), ','),
            (ws, ']'),
        )
        .map(RawAttribute::Array),
        raw_int_attr,
    ))
    .parse_next(input)
}

/// Parse an attribute dict: ["key" = value, ...]
pub(crate) fn raw_attr_dict<'a>(
    input: &mut &'a str,
) -> ModalResult<Vec<(String, RawAttribute<'a>)>> {
    delimited(
        ('[', ws),
        separated(
            0..,
            (ws, string_lit, ws, '=', ws, raw_attr_value, ws).map(|(_, k, _, _, _, v, _)| (k, v)),
            ',',
        ),
        (ws, ']'),
    )
    .parse_next(input)
}

/// Parse an operand list: (%name: type, ...)
fn operand_list<'a>(input: &mut &'a str) -> ModalResult<Vec<(String, RawType<'a>)>> {
    delimited(
        ('(', ws),
        separated(
            0..,
            (ws, value_name, ws, ':', ws, raw_type, ws).map(|(_, name, _, _, _, ty, _)| (name, ty)),
            ',',
        ),
        (ws, ')'),
    )
    .parse_next(input)
}

/// Parse result types: : type1, type2
fn type_annotation<'a>(input: &mut &'a str) -> ModalResult<Vec<RawType<'a>>> {
    preceded(
        (ws, ':', ws),
        separated(1.., (ws, raw_type, ws).map(|(_, t, _)| t), ','),
    )
    .parse_next(input)
}

// ============================================================================
// Operations and regions
// ============================================================================

/// Parse a single operation.
///
/// Grammar:
/// ```text
/// dialect.op (%name: type, ...) [["key" = attr, ...]] [: types] {region}*
/// ```
pub(crate) fn raw_operation<'a>(input: &mut &'a str) -> ModalResult<RawOperation<'a>> {
    ws.parse_next(input)?;
    let (dialect, op_name) = qualified_name
        .context(expected("operation name `dialect.op`"))
        .parse_next(input)?;
    ws.parse_next(input)?;
    let operands = operand_list
        .context(expected("operand list `(...)`"))
        .parse_next(input)?;

    ws.parse_next(input)?;
    let attributes = if input.starts_with('[') {
        raw_attr_dict
            .context(StrContext::Label("attribute dictionary"))
            .parse_next(input)?
    } else {
        Vec::new()
    };

    let result_types = opt(type_annotation).parse_next(input)?.unwrap_or_default();

    let mut regions = Vec::new();
    loop {
        ws.parse_next(input)?;
        if input.starts_with('{') {
            regions.push(raw_region.parse_next(input)?);
        } else {
            break;
        }
    }

    Ok(RawOperation {
        dialect,
        op_name,
        operands,
        attributes,
        result_types,
        regions,
    })
}

/// Parse operations until a block label or the closing brace.
fn raw_ops<'a>(input: &mut &'a str) -> ModalResult<Vec<RawOperation<'a>>> {
    let mut ops = Vec::new();
    loop {
        ws.parse_next(input)?;
        if input.starts_with('^') || input.starts_with('}') || input.is_empty() {
            break;
        }
        ops.push(raw_operation.parse_next(input)?);
    }
    Ok(ops)
}

/// Parse a labeled block: ^label: ops...
pub(crate) fn raw_block<'a>(input: &mut &'a str) -> ModalResult<RawBlock<'a>> {
    ws.parse_next(input)?;
    block_label.parse_next(input)?;
    ws.parse_next(input)?;
    ':'.parse_next(input)?;
    let ops = raw_ops.parse_next(input)?;
    Ok(RawBlock { ops })
}

/// Parse a region: `{}` (no blocks), `{ ^bb0: ... }` or `{ ops... }`
/// (single implicit block).
pub(crate) fn raw_region<'a>(input: &mut &'a str) -> ModalResult<RawRegion<'a>> {
    '{'.parse_next(input)?;
    ws.parse_next(input)?;

    let mut blocks = Vec::new();
    if input.starts_with('^') {
        loop {
            ws.parse_next(input)?;
            if !input.starts_with('^') {
                break;
            }
            blocks.push(raw_block.parse_next(input)?);
        }
    } else if !input.starts_with('}') {
        let ops = raw_ops.parse_next(input)?;
        blocks.push(RawBlock { ops });
    }

    ws.parse_next(input)?;
    '}'.context(expected("`}` closing the region"))
        .parse_next(input)?;

    Ok(RawRegion { blocks })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type() {
        let mut input = "!rel_alg.int32";
        let raw = raw_type.parse_next(&mut input).expect("should parse type");
        assert_eq!(raw.dialect, "rel_alg");
        assert_eq!(raw.name, "int32");
        assert!(raw.params.is_empty());
    }

    #[test]
    fn test_parse_parameterized_type() {
        let mut input = r#"!t.text<nullable: 0, collation: "en", inner: !t.int>"#;
        let raw = raw_type.parse_next(&mut input).expect("should parse type");
        assert_eq!(raw.params.len(), 3);
        assert_eq!(raw.params[0], ("nullable", RawTypeParam::Int(0)));
        assert!(matches!(
            raw.params[1].1,
            RawTypeParam::Attr(RawAttribute::String(ref s)) if s == "en"
        ));
        assert!(matches!(
            raw.params[2].1,
            RawTypeParam::Attr(RawAttribute::Type(_))
        ));
        assert!(input.is_empty());
    }

    #[test]
    fn test_parse_attribute_values() {
        let mut input = "42 : !i64";
        let attr = raw_attr_value.parse_next(&mut input).expect("should parse int");
        assert_eq!(attr, RawAttribute::Int { value: 42, width: 64 });

        let mut input = "-1 : !i1";
        let attr = raw_attr_value.parse_next(&mut input).expect("should parse int");
        assert_eq!(attr, RawAttribute::Int { value: -1, width: 1 });

        let mut input = r#"["a", 1 : !i32]"#;
        let attr = raw_attr_value.parse_next(&mut input).expect("should parse array");
        assert!(matches!(attr, RawAttribute::Array(ref items) if items.len() == 2));
    }

    #[test]
    fn test_integer_attribute_requires_width() {
        let mut input = "42";
        assert!(raw_attr_value.parse_next(&mut input).is_err());

        let mut input = "42 : !i65";
        assert!(raw_attr_value.parse_next(&mut input).is_err());
    }

    #[test]
    fn test_parse_string_escapes() {
        let cases = [
            (r#""hello""#, "hello"),
            (r#""a\nb""#, "a\nb"),
            (r#""a\tb""#, "a\tb"),
            (r#""a\rb""#, "a\rb"),
            (r#""a\0b""#, "a\0b"),
            (r#""a\\b""#, "a\\b"),
            (r#""a\"b""#, "a\"b"),
            (r#""a\x01b""#, "a\x01b"),
            (r#""a\x7fb""#, "a\x7fb"),
        ];
        for (input_str, expected) in &cases {
            let mut input = *input_str;
            let result = string_lit.parse_next(&mut input).expect("should parse");
            assert_eq!(&result, *expected, "failed for input: {}", input_str);
        }
    }

    #[test]
    fn test_parse_integer_lit_overflow() {
        let mut input = "-9223372036854775808";
        let val = integer_lit.parse_next(&mut input).expect("i64::MIN should parse");
        assert_eq!(val, i64::MIN);

        let mut input = "-9223372036854775809";
        assert!(integer_lit.parse_next(&mut input).is_err());

        let mut input = "9223372036854775808";
        assert!(integer_lit.parse_next(&mut input).is_err());
    }

    #[test]
    fn test_parse_value_names() {
        let mut input = "%left";
        assert_eq!(value_name.parse_next(&mut input).unwrap(), "left");

        let mut input = r#"%"two words""#;
        assert_eq!(value_name.parse_next(&mut input).unwrap(), "two words");
    }

    #[test]
    fn test_parse_regions() {
        let mut input = "{}";
        let region = raw_region.parse_next(&mut input).expect("should parse");
        assert!(region.blocks.is_empty());

        let mut input = "{ ^bb0: }";
        let region = raw_region.parse_next(&mut input).expect("should parse");
        assert_eq!(region.blocks.len(), 1);
        assert!(region.blocks[0].ops.is_empty());

        let mut input = "{ t.a() t.b() }";
        let region = raw_region.parse_next(&mut input).expect("should parse");
        assert_eq!(region.blocks.len(), 1);
        assert_eq!(region.blocks[0].ops.len(), 2);

        let mut input = "{ ^bb0: t.a() ^bb1: t.b() t.c() }";
        let region = raw_region.parse_next(&mut input).expect("should parse");
        assert_eq!(region.blocks.len(), 2);
        assert_eq!(region.blocks[1].ops.len(), 2);
    }

    #[test]
    fn test_parse_operation() {
        let mut input = r#"t.op(%x: !t.int) ["k" = "v"] : !t.int, !t.int {
  t.leaf()
} {}"#;
        let op = raw_operation.parse_next(&mut input).expect("should parse");
        assert_eq!((op.dialect, op.op_name), ("t", "op"));
        assert_eq!(op.operands.len(), 1);
        assert_eq!(op.attributes[0].0, "k");
        assert_eq!(op.result_types.len(), 2);
        assert_eq!(op.regions.len(), 2);
        assert!(input.is_empty());
    }
}
