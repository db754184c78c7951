//! MathML expression trees for kinetic laws and function definitions.
//!
//! SBML carries rate expressions as content MathML. This module parses the
//! subset used by kinetic laws (`apply`, `ci`, `cn`, `csymbol`, operator
//! tags, `lambda`/`bvar`) into an owned [`MathNode`] tree and serializes it
//! back. Both the parser and the [`MathWalk`] iterator run over explicit
//! work-lists rather than recursion, so expression depth is not bounded by
//! the call stack.

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};

use crate::sbml::error::SbmlError;

/// XML namespace of content MathML.
pub const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";

/// A node of a content-MathML expression tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MathNode {
    /// A numeric literal (`<cn>`).
    Number(f64),

    /// A named leaf referencing a species, parameter, or bound variable
    /// (`<ci>`).
    Identifier(String),

    /// An externally defined symbol such as `time` (`<csymbol>`).
    Symbol {
        name: String,
        definition_url: String,
    },

    /// A builtin MathML operator tag, only valid as the head of an apply.
    Operator(MathOperator),

    /// A function application: the head is an [`MathNode::Operator`] for
    /// builtin operations or an [`MathNode::Identifier`] naming a function
    /// definition.
    Apply {
        head: Box<MathNode>,
        args: Vec<MathNode>,
    },

    /// A function definition body (`<lambda>` with `<bvar>` bindings).
    Lambda {
        bindings: Vec<String>,
        body: Box<MathNode>,
    },
}

impl MathNode {
    /// Returns the identifier name if this node is a named leaf.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            MathNode::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Iterates over the whole tree, node first, with an explicit stack.
    pub fn walk(&self) -> MathWalk<'_> {
        MathWalk { stack: vec![self] }
    }

    /// Parses a standalone `<math>` element.
    pub fn from_xml_str(xml: &str) -> Result<Self, SbmlError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        loop {
            match reader.read_event()? {
                Event::Start(e) if e.local_name().as_ref() == b"math" => {
                    return parse_math(&mut reader);
                }
                Event::Decl(_) | Event::Comment(_) | Event::Text(_) => {}
                Event::Eof => return Err(SbmlError::UnexpectedEof("math".into())),
                _ => return Err(SbmlError::MalformedMath("expected <math> root".into())),
            }
        }
    }

    /// Serializes the tree as a standalone `<math>` element.
    pub fn to_xml_string(&self) -> Result<String, SbmlError> {
        let mut writer = Writer::new(Vec::new());
        write_math(&mut writer, self)?;
        Ok(String::from_utf8(writer.into_inner())?)
    }
}

/// Depth-first iterator over a [`MathNode`] tree.
pub struct MathWalk<'a> {
    stack: Vec<&'a MathNode>,
}

impl<'a> Iterator for MathWalk<'a> {
    type Item = &'a MathNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        match node {
            MathNode::Apply { head, args } => {
                self.stack.push(&**head);
                self.stack.extend(args.iter());
            }
            MathNode::Lambda { body, .. } => self.stack.push(&**body),
            _ => {}
        }
        Some(node)
    }
}

/// Builtin MathML operators understood by the parser.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MathOperator {
    Plus,
    Minus,
    Times,
    Divide,
    Power,
    Root,
    Exp,
    Ln,
    Log,
    Abs,
    Floor,
    Ceiling,
    Sin,
    Cos,
    Tan,
    Eq,
    Neq,
    Gt,
    Lt,
    Geq,
    Leq,
    And,
    Or,
    Xor,
    Not,
}

impl MathOperator {
    /// Maps a MathML element name to an operator.
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        Some(match tag {
            b"plus" => Self::Plus,
            b"minus" => Self::Minus,
            b"times" => Self::Times,
            b"divide" => Self::Divide,
            b"power" => Self::Power,
            b"root" => Self::Root,
            b"exp" => Self::Exp,
            b"ln" => Self::Ln,
            b"log" => Self::Log,
            b"abs" => Self::Abs,
            b"floor" => Self::Floor,
            b"ceiling" => Self::Ceiling,
            b"sin" => Self::Sin,
            b"cos" => Self::Cos,
            b"tan" => Self::Tan,
            b"eq" => Self::Eq,
            b"neq" => Self::Neq,
            b"gt" => Self::Gt,
            b"lt" => Self::Lt,
            b"geq" => Self::Geq,
            b"leq" => Self::Leq,
            b"and" => Self::And,
            b"or" => Self::Or,
            b"xor" => Self::Xor,
            b"not" => Self::Not,
            _ => return None,
        })
    }

    /// The MathML element name of the operator.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Plus => "plus",
            Self::Minus => "minus",
            Self::Times => "times",
            Self::Divide => "divide",
            Self::Power => "power",
            Self::Root => "root",
            Self::Exp => "exp",
            Self::Ln => "ln",
            Self::Log => "log",
            Self::Abs => "abs",
            Self::Floor => "floor",
            Self::Ceiling => "ceiling",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Geq => "geq",
            Self::Leq => "leq",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Not => "not",
        }
    }
}

/// Partially built containers while the parser walks the event stream.
enum Frame {
    Root { nodes: Vec<MathNode> },
    Apply { nodes: Vec<MathNode> },
    Lambda {
        bindings: Vec<String>,
        nodes: Vec<MathNode>,
        in_bvar: bool,
    },
}

/// Parses MathML content. The caller must already have consumed the opening
/// `<math>` tag; parsing stops at the matching `</math>`.
pub(crate) fn parse_math(reader: &mut Reader<&[u8]>) -> Result<MathNode, SbmlError> {
    let mut stack = vec![Frame::Root { nodes: Vec::new() }];

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let local = e.local_name().as_ref().to_vec();
                match local.as_slice() {
                    b"apply" => stack.push(Frame::Apply { nodes: Vec::new() }),
                    b"lambda" => stack.push(Frame::Lambda {
                        bindings: Vec::new(),
                        nodes: Vec::new(),
                        in_bvar: false,
                    }),
                    b"bvar" => set_in_bvar(&mut stack, true)?,
                    b"ci" => {
                        let name = reader.read_text(e.name())?.trim().to_string();
                        push_node(&mut stack, MathNode::Identifier(name))?;
                    }
                    b"cn" => {
                        let value = parse_cn(reader)?;
                        push_node(&mut stack, MathNode::Number(value))?;
                    }
                    b"csymbol" => {
                        let definition_url = attr_value(&e, b"definitionURL")?.unwrap_or_default();
                        let name = reader.read_text(e.name())?.trim().to_string();
                        push_node(
                            &mut stack,
                            MathNode::Symbol {
                                name,
                                definition_url,
                            },
                        )?;
                    }
                    tag => {
                        if let Some(op) = MathOperator::from_tag(tag) {
                            reader.read_to_end(e.name())?;
                            push_node(&mut stack, MathNode::Operator(op))?;
                        } else {
                            return Err(SbmlError::UnsupportedMathElement(
                                String::from_utf8_lossy(tag).into_owned(),
                            ));
                        }
                    }
                }
            }
            Event::Empty(e) => {
                let local = e.local_name().as_ref().to_vec();
                match local.as_slice() {
                    b"sep" | b"bvar" => {}
                    tag => {
                        if let Some(op) = MathOperator::from_tag(tag) {
                            push_node(&mut stack, MathNode::Operator(op))?;
                        } else {
                            return Err(SbmlError::UnsupportedMathElement(
                                String::from_utf8_lossy(tag).into_owned(),
                            ));
                        }
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"apply" => {
                    let Some(Frame::Apply { mut nodes }) = stack.pop() else {
                        return Err(SbmlError::MalformedMath("unbalanced </apply>".into()));
                    };
                    if nodes.is_empty() {
                        return Err(SbmlError::MalformedMath("empty <apply>".into()));
                    }
                    let head = Box::new(nodes.remove(0));
                    push_node(&mut stack, MathNode::Apply { head, args: nodes })?;
                }
                b"lambda" => {
                    let Some(Frame::Lambda {
                        bindings, mut nodes, ..
                    }) = stack.pop()
                    else {
                        return Err(SbmlError::MalformedMath("unbalanced </lambda>".into()));
                    };
                    if nodes.len() != 1 {
                        return Err(SbmlError::MalformedMath(
                            "<lambda> must have exactly one body expression".into(),
                        ));
                    }
                    push_node(
                        &mut stack,
                        MathNode::Lambda {
                            bindings,
                            body: Box::new(nodes.remove(0)),
                        },
                    )?;
                }
                b"bvar" => set_in_bvar(&mut stack, false)?,
                b"math" => {
                    let Some(Frame::Root { mut nodes }) = stack.pop() else {
                        return Err(SbmlError::MalformedMath("unbalanced </math>".into()));
                    };
                    if nodes.len() != 1 {
                        return Err(SbmlError::MalformedMath(
                            "<math> must contain exactly one expression".into(),
                        ));
                    }
                    return Ok(nodes.remove(0));
                }
                _ => {}
            },
            Event::Text(_) | Event::Comment(_) => {}
            Event::Eof => return Err(SbmlError::UnexpectedEof("math".into())),
            _ => {}
        }
    }
}

/// Appends a finished node to the innermost open container.
fn push_node(stack: &mut [Frame], node: MathNode) -> Result<(), SbmlError> {
    match stack.last_mut() {
        Some(Frame::Root { nodes }) | Some(Frame::Apply { nodes }) => nodes.push(node),
        Some(Frame::Lambda {
            bindings,
            nodes,
            in_bvar,
        }) => {
            if *in_bvar {
                match node {
                    MathNode::Identifier(name) => bindings.push(name),
                    _ => {
                        return Err(SbmlError::MalformedMath(
                            "<bvar> may only contain <ci>".into(),
                        ))
                    }
                }
            } else {
                nodes.push(node);
            }
        }
        None => return Err(SbmlError::MalformedMath("content outside <math>".into())),
    }
    Ok(())
}

fn set_in_bvar(stack: &mut [Frame], value: bool) -> Result<(), SbmlError> {
    match stack.last_mut() {
        Some(Frame::Lambda { in_bvar, .. }) => {
            *in_bvar = value;
            Ok(())
        }
        _ => Err(SbmlError::MalformedMath(
            "<bvar> outside of <lambda>".into(),
        )),
    }
}

/// Parses a `<cn>` literal, including the `e-notation` mantissa/`<sep/>`/
/// exponent form.
fn parse_cn(reader: &mut Reader<&[u8]>) -> Result<f64, SbmlError> {
    let mut mantissa = String::new();
    let mut exponent = String::new();
    let mut in_exponent = false;

    loop {
        match reader.read_event()? {
            Event::Text(t) => {
                let decoded = t.decode().map_err(quick_xml::Error::from)?;
                let text = quick_xml::escape::unescape(&decoded).map_err(quick_xml::Error::from)?;
                if in_exponent {
                    exponent.push_str(text.trim());
                } else {
                    mantissa.push_str(text.trim());
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == b"sep" => in_exponent = true,
            Event::End(e) if e.local_name().as_ref() == b"cn" => break,
            Event::Comment(_) => {}
            Event::Eof => return Err(SbmlError::UnexpectedEof("cn".into())),
            _ => return Err(SbmlError::MalformedMath("unexpected content in <cn>".into())),
        }
    }

    if !in_exponent {
        return mantissa
            .parse()
            .map_err(|_| SbmlError::InvalidNumber(mantissa));
    }
    // Compose mantissa and exponent back into decimal notation so the
    // result is rounded exactly like a plain literal.
    let composed = format!("{}e{}", mantissa, exponent);
    composed
        .parse()
        .map_err(|_| SbmlError::InvalidNumber(composed))
}

/// Reads an attribute value from an element, if present.
pub(crate) fn attr_value(e: &BytesStart, name: &[u8]) -> Result<Option<String>, SbmlError> {
    match e.try_get_attribute(name)? {
        Some(attr) => Ok(Some(
            attr.unescape_value()
                .map_err(quick_xml::Error::from)?
                .into_owned(),
        )),
        None => Ok(None),
    }
}

/// Writes a `<math>` element for the given expression tree.
pub(crate) fn write_math<W: Write>(
    writer: &mut Writer<W>,
    math: &MathNode,
) -> Result<(), SbmlError> {
    let mut root = BytesStart::new("math");
    root.push_attribute(("xmlns", MATHML_NS));
    writer.write_event(Event::Start(root))?;
    write_node(writer, math)?;
    writer.write_event(Event::End(BytesEnd::new("math")))?;
    Ok(())
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &MathNode) -> Result<(), SbmlError> {
    match node {
        MathNode::Number(value) => {
            writer.write_event(Event::Start(BytesStart::new("cn")))?;
            writer.write_event(Event::Text(BytesText::new(&format!(" {} ", value))))?;
            writer.write_event(Event::End(BytesEnd::new("cn")))?;
        }
        MathNode::Identifier(name) => {
            writer.write_event(Event::Start(BytesStart::new("ci")))?;
            writer.write_event(Event::Text(BytesText::new(&format!(" {} ", name))))?;
            writer.write_event(Event::End(BytesEnd::new("ci")))?;
        }
        MathNode::Symbol {
            name,
            definition_url,
        } => {
            let mut el = BytesStart::new("csymbol");
            el.push_attribute(("encoding", "text"));
            el.push_attribute(("definitionURL", definition_url.as_str()));
            writer.write_event(Event::Start(el))?;
            writer.write_event(Event::Text(BytesText::new(&format!(" {} ", name))))?;
            writer.write_event(Event::End(BytesEnd::new("csymbol")))?;
        }
        MathNode::Operator(op) => {
            writer.write_event(Event::Empty(BytesStart::new(op.tag())))?;
        }
        MathNode::Apply { head, args } => {
            writer.write_event(Event::Start(BytesStart::new("apply")))?;
            write_node(writer, head)?;
            for arg in args {
                write_node(writer, arg)?;
            }
            writer.write_event(Event::End(BytesEnd::new("apply")))?;
        }
        MathNode::Lambda { bindings, body } => {
            writer.write_event(Event::Start(BytesStart::new("lambda")))?;
            for binding in bindings {
                writer.write_event(Event::Start(BytesStart::new("bvar")))?;
                writer.write_event(Event::Start(BytesStart::new("ci")))?;
                writer.write_event(Event::Text(BytesText::new(&format!(" {} ", binding))))?;
                writer.write_event(Event::End(BytesEnd::new("ci")))?;
                writer.write_event(Event::End(BytesEnd::new("bvar")))?;
            }
            write_node(writer, body)?;
            writer.write_event(Event::End(BytesEnd::new("lambda")))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_product() {
        let xml = r#"
            <math xmlns="http://www.w3.org/1998/Math/MathML">
              <apply>
                <times/>
                <ci> k1 </ci>
                <ci> S1 </ci>
              </apply>
            </math>
        "#;

        let math = MathNode::from_xml_str(xml).unwrap();
        let MathNode::Apply { head, args } = math else {
            panic!("expected apply");
        };
        assert_eq!(*head, MathNode::Operator(MathOperator::Times));
        assert_eq!(
            args,
            vec![
                MathNode::Identifier("k1".into()),
                MathNode::Identifier("S1".into())
            ]
        );
    }

    #[test]
    fn test_parse_e_notation() {
        let xml = r#"
            <math xmlns="http://www.w3.org/1998/Math/MathML">
              <cn type="e-notation"> 5 <sep/> -3 </cn>
            </math>
        "#;

        let math = MathNode::from_xml_str(xml).unwrap();
        assert_eq!(math, MathNode::Number(5e-3));
    }

    #[test]
    fn test_parse_lambda() {
        let xml = r#"
            <math xmlns="http://www.w3.org/1998/Math/MathML">
              <lambda>
                <bvar><ci> x </ci></bvar>
                <bvar><ci> y </ci></bvar>
                <apply>
                  <plus/>
                  <ci> x </ci>
                  <ci> y </ci>
                </apply>
              </lambda>
            </math>
        "#;

        let math = MathNode::from_xml_str(xml).unwrap();
        let MathNode::Lambda { bindings, body } = math else {
            panic!("expected lambda");
        };
        assert_eq!(bindings, vec!["x".to_string(), "y".to_string()]);
        assert!(matches!(*body, MathNode::Apply { .. }));
    }

    #[test]
    fn test_walk_visits_every_node() {
        let xml = r#"
            <math xmlns="http://www.w3.org/1998/Math/MathML">
              <apply>
                <divide/>
                <apply>
                  <times/>
                  <ci> Vmax </ci>
                  <ci> S </ci>
                </apply>
                <apply>
                  <plus/>
                  <ci> Km </ci>
                  <ci> S </ci>
                </apply>
              </apply>
            </math>
        "#;

        let math = MathNode::from_xml_str(xml).unwrap();
        let names: Vec<&str> = math.walk().filter_map(|n| n.identifier()).collect();
        assert_eq!(names.len(), 4);
        assert!(names.contains(&"Vmax"));
        assert!(names.contains(&"Km"));
    }

    #[test]
    fn test_roundtrip() {
        let xml = r#"
            <math xmlns="http://www.w3.org/1998/Math/MathML">
              <apply>
                <ci> michaelis </ci>
                <ci> S1 </ci>
                <cn> 0.5 </cn>
              </apply>
            </math>
        "#;

        let math = MathNode::from_xml_str(xml).unwrap();
        let written = math.to_xml_string().unwrap();
        let reparsed = MathNode::from_xml_str(&written).unwrap();
        assert_eq!(math, reparsed);
    }

    #[test]
    fn test_rejects_unsupported_elements() {
        let xml = r#"
            <math xmlns="http://www.w3.org/1998/Math/MathML">
              <piecewise><piece/></piecewise>
            </math>
        "#;

        let err = MathNode::from_xml_str(xml).unwrap_err();
        assert!(matches!(err, SbmlError::UnsupportedMathElement(_)));
    }
}
