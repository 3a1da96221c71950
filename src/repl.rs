//! The interactive shell: a store, a multi-line input buffer, and the
//! dispatch for toplevel forms.
//!
//! Dispatch is by type: `Join`-family atoms compile and execute, `Meet`
//! atoms run the grounding search directly, and anything else simply
//! interns. Meta commands (lines starting with `:`) inspect or reset the
//! store without going through the reader.

use std::fs;
use std::path::PathBuf;

use crate::id::AtomId;
use crate::join::{self, JoinSpec};
use crate::pretty::pretty_atom;
use crate::query;
use crate::store::{AtomSink, AtomView, Store};
use crate::types;

/// REPL state: the store plus the multi-line input machinery.
pub struct ReplState {
    pub store: Store,

    /// Multi-line input buffer
    pub input_buffer: String,

    /// Paren depth for multi-line detection
    pub paren_depth: i32,
}

impl Default for ReplState {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplState {
    pub fn new() -> Self {
        Self {
            store: Store::new(),
            input_buffer: String::new(),
            paren_depth: 0,
        }
    }

    /// Reset to initial state, dropping every interned atom.
    pub fn reset(&mut self) {
        self.store = Store::new();
        self.input_buffer.clear();
        self.paren_depth = 0;
    }

    /// Process a line of input, handling multi-line paren matching.
    pub fn process_line(&mut self, line: &str) -> InputResult {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if self.input_buffer.is_empty() {
                return InputResult::Empty;
            }
            // Empty line while buffering: keep waiting for the close paren.
            return InputResult::Incomplete;
        }

        // Meta-command (only at start, not in continuation)
        if trimmed.starts_with(':') && self.input_buffer.is_empty() {
            return InputResult::MetaCommand(MetaCommand::parse(trimmed));
        }

        if !self.input_buffer.is_empty() {
            self.input_buffer.push('\n');
        }
        self.input_buffer.push_str(line);

        // Count parens outside string literals; a `;` outside a string
        // starts a comment that runs to end of line.
        let mut in_str = false;
        let mut last_code = None;
        for ch in line.chars() {
            if in_str {
                if ch == '"' {
                    in_str = false;
                }
                continue;
            }
            match ch {
                '"' => in_str = true,
                ';' => break,
                '(' => {
                    self.paren_depth += 1;
                    last_code = Some('(');
                }
                ')' => {
                    self.paren_depth -= 1;
                    last_code = Some(')');
                }
                c if !c.is_whitespace() => last_code = Some(c),
                _ => {}
            }
        }

        if self.paren_depth <= 0 && last_code == Some(')') {
            let input = std::mem::take(&mut self.input_buffer);
            self.paren_depth = 0;
            InputResult::Source(input)
        } else {
            InputResult::Incomplete
        }
    }

    /// Force submit the current buffer (for Ctrl-D).
    pub fn force_submit(&mut self) -> Option<String> {
        if self.input_buffer.is_empty() {
            None
        } else {
            self.paren_depth = 0;
            Some(std::mem::take(&mut self.input_buffer))
        }
    }

    /// Read and process every toplevel form in `source`.
    pub fn execute_source(&mut self, source: &str) -> Result<Vec<ExecuteResult>, String> {
        let terms = crate::read_terms(&self.store.types, source).map_err(|e| e.to_string())?;

        let mut results = Vec::new();
        for term in &terms {
            let id = self.store.intern_term(term);
            let ty = self.store.atom_type(id);
            if self.store.types.is_a(ty, types::JOIN) {
                results.push(self.execute_join(id)?);
            } else if self.store.types.is_a(ty, types::MEET) {
                results.push(self.execute_meet(id)?);
            } else {
                results.push(ExecuteResult::Atom {
                    id,
                    text: pretty_atom(&self.store, id),
                });
            }
        }
        Ok(results)
    }

    fn execute_join(&mut self, op: AtomId) -> Result<ExecuteResult, String> {
        let spec = JoinSpec::new(&self.store, op).map_err(|e| e.to_string())?;
        let queue = spec.execute(&mut self.store).map_err(|e| e.to_string())?;
        let containers: Vec<String> = queue.map(|rid| pretty_atom(&self.store, rid)).collect();
        Ok(ExecuteResult::Join { containers })
    }

    /// Runs a toplevel `Meet` through the grounding search and collects
    /// its tuples. Shape mirrors the join operator: an optional leading
    /// declaration, then clauses (a sole `And` child is unwrapped).
    fn execute_meet(&mut self, op: AtomId) -> Result<ExecuteResult, String> {
        let children = self.store.outgoing(op).to_vec();
        let (decl, mut clauses) = match children.split_first() {
            Some((&first, rest)) if is_declaration(&self.store, first) => (first, rest.to_vec()),
            _ => return Err("Meet declares no variables".to_string()),
        };
        if let [sole] = clauses[..] {
            if self.store.atom_type(sole) == types::AND {
                clauses = self.store.outgoing(sole).to_vec();
            }
        }
        let vars = join::parse_variables(&self.store, decl).map_err(|e| e.to_string())?;
        let groundings =
            query::ground(&self.store, &vars, &clauses).map_err(|e| e.to_string())?;

        let names = vars
            .atoms()
            .iter()
            .map(|&v| pretty_atom(&self.store, v))
            .collect();
        let tuples = groundings
            .iter()
            .map(|tuple| {
                tuple
                    .iter()
                    .map(|&a| pretty_atom(&self.store, a))
                    .collect()
            })
            .collect();
        Ok(ExecuteResult::Meet { vars: names, tuples })
    }

    /// Read and process a whole source file.
    pub fn load_file(&mut self, path: &PathBuf) -> Result<Vec<ExecuteResult>, String> {
        let source = fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        self.execute_source(&source)
    }

    /// Every interned atom, with its id.
    pub fn list_atoms(&self) -> Vec<(AtomId, String)> {
        (0..self.store.len())
            .map(|id| (id, pretty_atom(&self.store, id)))
            .collect()
    }

    /// Atoms no link contains.
    pub fn list_roots(&self) -> Vec<String> {
        self.store
            .roots()
            .iter()
            .map(|id| pretty_atom(&self.store, id as AtomId))
            .collect()
    }

    /// Atoms whose type is `name` or inherits from it.
    pub fn list_of_type(&self, name: &str) -> Result<Vec<String>, String> {
        let ty = self
            .store
            .types
            .lookup(name)
            .ok_or_else(|| format!("unknown type: {}", name))?;
        Ok(self
            .store
            .atoms_isa(ty)
            .iter()
            .map(|id| pretty_atom(&self.store, id as AtomId))
            .collect())
    }
}

fn is_declaration<V: AtomView>(view: &V, id: AtomId) -> bool {
    let reg = view.types();
    let ty = view.atom_type(id);
    reg.is_a(ty, types::VARIABLE)
        || reg.is_a(ty, types::TYPED_VARIABLE)
        || reg.is_a(ty, types::VARIABLE_LIST)
}

/// Result of processing a line of input
#[derive(Debug)]
pub enum InputResult {
    MetaCommand(MetaCommand),
    Source(String),
    Incomplete,
    Empty,
}

/// Result of processing one toplevel form
#[derive(Debug)]
pub enum ExecuteResult {
    /// A join ran; pretty-printed containers in delivery order.
    Join { containers: Vec<String> },
    /// A meet ran; variable names and grounding tuples.
    Meet {
        vars: Vec<String>,
        tuples: Vec<Vec<String>>,
    },
    /// A plain form was interned.
    Atom { id: AtomId, text: String },
}

/// Meta-commands supported by the REPL
#[derive(Debug, PartialEq, Eq)]
pub enum MetaCommand {
    Help,
    Quit,
    Load(PathBuf),
    List,
    Roots,
    Type(String),
    Clear,
    Unknown(String),
}

impl MetaCommand {
    pub fn parse(input: &str) -> Self {
        let input = input.trim_start_matches(':').trim();
        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");
        let arg = parts.next();

        match cmd {
            "help" | "h" | "?" => MetaCommand::Help,
            "quit" | "q" | "exit" => MetaCommand::Quit,
            "load" | "source" => {
                if let Some(path) = arg {
                    MetaCommand::Load(PathBuf::from(path))
                } else {
                    MetaCommand::Unknown(":load requires a file path".to_string())
                }
            }
            "list" | "ls" | "l" => MetaCommand::List,
            "roots" | "r" => MetaCommand::Roots,
            "type" | "t" => {
                if let Some(name) = arg {
                    MetaCommand::Type(name.to_string())
                } else {
                    MetaCommand::Unknown(":type requires a type name".to_string())
                }
            }
            "clear" | "reset" => MetaCommand::Clear,
            other => MetaCommand::Unknown(format!("Unknown command: :{}", other)),
        }
    }
}
