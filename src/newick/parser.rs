//! Recursive-descent parser for Newick strings.
//!
//! The parser consumes a whole tree text and emits a flat [ParsedNode]
//! vector in post-order (children before parents). It understands the
//! BEAST-style annotation extension `[&key=value,...]` with quoted and
//! `{...}` braced values, skips plain `[...]` comments, and reports every
//! failure as a [ParseError] with a byte offset.
//!
//! # Grammar
//! ```text
//! subtree := '(' subtree (',' subtree)* ')' suffix
//!         |  tip suffix
//! tip     := quoted | bareword
//! suffix  := [ label ] [ ':' number ] [ annot ]*
//! annot   := '[&' attrs ']'  |  '[' comment ']'
//! attrs   := attr (',' attr)*
//! attr    := name '=' (quoted | '{' balanced '}' | bareword)
//! ```
//!
//! Quoted tokens use `'` or `"`; a backslash preserves the following
//! character, including the closing quote. Barewords run until whitespace
//! or one of `: [ , ( ) ] ;`. A trailing `;` after the tree is optional.

use crate::model::parsed_node::ParsedNode;
use crate::parser::{Cursor, ParseError};

/// Parses a single Newick tree into its post-order node list.
///
/// This is also the debugging surface for inspecting exactly what the
/// reader recovered from a tree text, before any encoding.
///
/// # Arguments
/// * `text` - A Newick string, optionally terminated by `;`
///
/// # Returns
/// * `Ok(Vec<ParsedNode>)` - Nodes in post-order; the root is the last entry
/// * `Err(ParseError)` - Malformed input, with the byte offset of the problem
///
/// # Example
/// ```
/// use phylopack::parse_tree;
///
/// let nodes = parse_tree("(A:1.0,B:2.0);").unwrap();
/// assert_eq!(nodes.len(), 3);
/// assert_eq!(nodes[0].taxon.as_deref(), Some("A"));
/// assert_eq!(nodes[2].sons, vec![0, 1]);
/// ```
pub fn parse_tree(text: &str) -> Result<Vec<ParsedNode>, ParseError> {
    let mut cur = Cursor::for_str(text);
    let mut nodes = Vec::new();

    cur.skip_whitespace();
    if cur.is_eof() {
        return Err(ParseError::unexpected_char(&cur));
    }

    parse_subtree(&mut cur, &mut nodes)?;

    cur.skip_whitespace();
    cur.consume_if(b';');
    cur.skip_whitespace();
    if !cur.is_eof() {
        return Err(ParseError::extraneous_trailing(&cur));
    }

    Ok(nodes)
}

/// Parses one subtree, appends its node to `nodes` and returns its index.
///
/// Children are parsed (and appended) before their parent, which
/// guarantees the post-order emission the encoder relies on.
fn parse_subtree(cur: &mut Cursor, nodes: &mut Vec<ParsedNode>) -> Result<usize, ParseError> {
    cur.skip_whitespace();

    let mut node = ParsedNode::default();

    if cur.consume_if(b'(') {
        loop {
            let son = parse_subtree(cur, nodes)?;
            node.sons.push(son);

            cur.skip_whitespace();
            if cur.consume_if(b',') {
                continue;
            }
            if cur.consume_if(b')') {
                break;
            }
            return Err(ParseError::unexpected_char(cur));
        }
    } else {
        let label = parse_label(cur)?;
        if label.is_empty() {
            return Err(ParseError::unexpected_char(cur));
        }
        node.taxon = Some(label);
    }

    parse_suffix(cur, &mut node)?;

    nodes.push(node);
    Ok(nodes.len() - 1)
}

/// Parses the suffix after a tip or a closing `)`: an optional internal
/// label, an optional `:branch`, and any number of `[...]` comments or
/// `[&...]` annotation blocks, in any interleaving.
fn parse_suffix(cur: &mut Cursor, node: &mut ParsedNode) -> Result<(), ParseError> {
    loop {
        cur.skip_whitespace();
        match cur.peek() {
            Some(b'[') => {
                if cur.peek_at(1) == Some(b'&') {
                    parse_annotations(cur, node)?;
                } else {
                    skip_comment(cur)?;
                }
            }
            Some(b':') if node.branch.is_none() => {
                cur.next_byte();
                cur.skip_whitespace();
                node.branch = Some(parse_number(cur)?);
            }
            Some(b'(') | Some(b')') | Some(b',') | Some(b';') | None => break,
            Some(_) => {
                // a label after ')' names the internal node
                if node.taxon.is_none() && node.branch.is_none() && !node.sons.is_empty() {
                    let label = parse_label(cur)?;
                    if label.is_empty() {
                        return Err(ParseError::unexpected_char(cur));
                    }
                    node.taxon = Some(label);
                } else {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Parses a quoted or bareword label. An empty result means no label
/// material was present at the cursor.
fn parse_label(cur: &mut Cursor) -> Result<String, ParseError> {
    match cur.peek() {
        Some(q) if q == b'\'' || q == b'"' => parse_quoted(cur, q),
        _ => Ok(parse_bareword(cur)),
    }
}

/// Parses a `'...'` or `"..."` token. A backslash preserves the following
/// byte (the backslash itself is dropped).
fn parse_quoted(cur: &mut Cursor, quote: u8) -> Result<String, ParseError> {
    cur.next_byte(); // opening quote

    let mut out = Vec::new();
    loop {
        match cur.next_byte() {
            None => return Err(ParseError::unterminated_quote(cur)),
            Some(b'\\') => match cur.next_byte() {
                None => return Err(ParseError::unterminated_quote(cur)),
                Some(b) => out.push(b),
            },
            Some(b) if b == quote => break,
            Some(b) => out.push(b),
        }
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Collects bareword bytes until whitespace or a structure character.
fn parse_bareword(cur: &mut Cursor) -> String {
    let mut out = Vec::new();
    while let Some(b) = cur.peek() {
        match b {
            b' ' | b'\t' | b'\n' | b'\r' => break,
            b':' | b'[' | b',' | b'(' | b')' | b']' | b';' => break,
            _ => {
                out.push(b);
                cur.next_byte();
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parses the number after `:`. Accepts the usual float shapes including
/// scientific notation (`1.5e-10`).
fn parse_number(cur: &mut Cursor) -> Result<f64, ParseError> {
    let mut txt = String::new();
    while let Some(b) = cur.peek() {
        if b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E') {
            txt.push(b as char);
            cur.next_byte();
        } else {
            break;
        }
    }

    txt.parse::<f64>().map_err(|_| ParseError::bad_number(cur))
}

/// Skips a `[...]` comment. A backslash preserves the following byte, so
/// an escaped `]` does not close the comment.
fn skip_comment(cur: &mut Cursor) -> Result<(), ParseError> {
    cur.next_byte(); // '['
    loop {
        match cur.next_byte() {
            None => return Err(ParseError::unterminated_quote(cur)),
            Some(b'\\') => {
                cur.next_byte();
            }
            Some(b']') => return Ok(()),
            Some(_) => {}
        }
    }
}

/// Parses one `[&name=value,...]` block and appends the pairs to the
/// node's attributes. Several blocks on the same node concatenate.
fn parse_annotations(cur: &mut Cursor, node: &mut ParsedNode) -> Result<(), ParseError> {
    cur.next_byte(); // '['
    cur.next_byte(); // '&'

    let attrs = node.attributes.get_or_insert_with(Vec::new);

    loop {
        cur.skip_whitespace();
        if cur.consume_if(b']') {
            return Ok(());
        }

        // name, up to '='
        let mut name = Vec::new();
        loop {
            match cur.peek() {
                None => return Err(ParseError::unterminated_quote(cur)),
                Some(b'=') => {
                    cur.next_byte();
                    break;
                }
                Some(b',') | Some(b']') | Some(b'"') | Some(b'{') | Some(b'}') => {
                    return Err(ParseError::missing_equals(cur));
                }
                Some(b) => {
                    name.push(b);
                    cur.next_byte();
                }
            }
        }
        let name = String::from_utf8_lossy(&name);

        let value = parse_attribute_value(cur)?;
        attrs.push((name.trim().to_string(), value.trim().to_string()));

        cur.skip_whitespace();
        match cur.peek() {
            Some(b',') => {
                cur.next_byte();
            }
            Some(b']') => {
                cur.next_byte();
                return Ok(());
            }
            None => return Err(ParseError::unterminated_quote(cur)),
            Some(_) => return Err(ParseError::unexpected_char(cur)),
        }
    }
}

/// Parses a single attribute value: quoted, `{...}` braced (content kept
/// verbatim, outer braces stripped), or bare up to `,` / `]`.
fn parse_attribute_value(cur: &mut Cursor) -> Result<String, ParseError> {
    match cur.peek() {
        Some(q) if q == b'"' || q == b'\'' => parse_quoted(cur, q),
        Some(b'{') => {
            cur.next_byte();
            let mut out = Vec::new();
            loop {
                match cur.next_byte() {
                    None => return Err(ParseError::unterminated_quote(cur)),
                    Some(b'\\') => match cur.next_byte() {
                        None => return Err(ParseError::unterminated_quote(cur)),
                        Some(b) => out.push(b),
                    },
                    Some(b'}') => break,
                    Some(b) => out.push(b),
                }
            }
            Ok(String::from_utf8_lossy(&out).into_owned())
        }
        _ => {
            let mut out = Vec::new();
            loop {
                match cur.peek() {
                    None => return Err(ParseError::unterminated_quote(cur)),
                    Some(b',') | Some(b']') => break,
                    Some(b) => {
                        out.push(b);
                        cur.next_byte();
                    }
                }
            }
            Ok(String::from_utf8_lossy(&out).into_owned())
        }
    }
}
