//! Pretty-printer for terms.
//!
//! Renders atoms back to source syntax for display and round-trip testing.

use crate::id::AtomId;
use crate::store::AtomView;
use crate::term::Term;
use crate::types::TypeRegistry;

/// Pretty-print configuration
pub struct PrettyConfig {
    pub indent: usize,
}

impl Default for PrettyConfig {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

/// A pretty-printer with indentation tracking
pub struct Pretty {
    output: String,
    indent_level: usize,
    config: PrettyConfig,
}

impl Default for Pretty {
    fn default() -> Self {
        Self::new()
    }
}

impl Pretty {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
            config: PrettyConfig::default(),
        }
    }

    pub fn finish(self) -> String {
        self.output
    }

    fn indent(&mut self) {
        for _ in 0..(self.indent_level * self.config.indent) {
            self.output.push(' ');
        }
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn newline(&mut self) {
        self.output.push('\n');
    }

    fn inc_indent(&mut self) {
        self.indent_level += 1;
    }

    fn dec_indent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }
}

// ============ Pretty-printing implementations ============

impl Pretty {
    /// Renders one term. Links whose children are all nodes stay on one
    /// line; anything deeper breaks one child per line.
    pub fn term(&mut self, types: &TypeRegistry, term: &Term) {
        match term {
            Term::Node(ty, name) => {
                self.write("(");
                self.write(types.name(*ty));
                self.write(" ");
                if *ty == crate::types::NUMBER && is_numeral(name) {
                    self.write(name);
                } else {
                    let quoted = quote_name(name);
                    self.write(&quoted);
                }
                self.write(")");
            }
            Term::Link(ty, children) => {
                self.write("(");
                self.write(types.name(*ty));
                if children.is_empty() {
                    self.write(")");
                } else if children.iter().all(|c| matches!(c, Term::Node(..))) {
                    for child in children {
                        self.write(" ");
                        self.term(types, child);
                    }
                    self.write(")");
                } else {
                    self.inc_indent();
                    for child in children {
                        self.newline();
                        self.indent();
                        self.term(types, child);
                    }
                    self.write(")");
                    self.dec_indent();
                }
            }
        }
    }
}

/// One-shot rendering of a term.
pub fn pretty_term(types: &TypeRegistry, term: &Term) -> String {
    let mut printer = Pretty::new();
    printer.term(types, term);
    printer.finish()
}

/// One-shot rendering of a stored atom.
pub fn pretty_atom<V: AtomView>(view: &V, id: AtomId) -> String {
    pretty_term(view.types(), &view.export_term(id))
}

/// True when the name prints back as a numeric literal the lexer accepts:
/// no leading zeros, and a fractional part only with digits on both sides.
fn is_numeral(name: &str) -> bool {
    let digits = name.strip_prefix('-').unwrap_or(name);
    let (int, frac) = match digits.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (digits, None),
    };
    if int.is_empty() || !int.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    if int.len() > 1 && int.starts_with('0') {
        return false;
    }
    match frac {
        Some(frac) => !frac.is_empty() && frac.chars().all(|c| c.is_ascii_digit()),
        None => true,
    }
}

/// Wraps a name in quotes, escaping the characters the lexer unescapes.
fn quote_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for c in name.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

// Unit tests are in tests/unit_parsing.rs
