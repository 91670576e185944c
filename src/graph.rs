use std::collections::{BTreeMap, BTreeSet};

use crate::error::ConvertError;

/// Dependency graph recovered from `terraform graph` DOT output.
///
/// Adjacency is stored undirected because ownership resolution walks the
/// graph in both directions, and sorted so traversal order never depends on
/// hash iteration. Node identity is the terraform address: the `[root] `
/// marker and trailing annotations like ` (expand)` / ` (close)` are
/// stripped, which collapses the several DOT nodes terraform emits for one
/// address into a single graph node.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    neighbors: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn parse(raw: &str) -> Result<Self, ConvertError> {
        let mut graph = Self::default();
        let mut depth: i64 = 0;
        let mut saw_header = false;
        for (index, raw_line) in raw.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            graph
                .consume_line(line, &mut depth, &mut saw_header)
                .map_err(|reason| ConvertError::GraphParse {
                    reason: format!("line {}: {reason}", index + 1),
                })?;
        }
        if !saw_header {
            return Err(ConvertError::GraphParse {
                reason: "missing digraph header".to_string(),
            });
        }
        if depth != 0 {
            return Err(ConvertError::GraphParse {
                reason: "unbalanced braces".to_string(),
            });
        }
        Ok(graph)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.neighbors.contains_key(address)
    }

    /// Neighbors in ascending address order.
    pub fn neighbors(&self, address: &str) -> impl Iterator<Item = &str> + '_ {
        self.neighbors
            .get(address)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    fn consume_line(
        &mut self,
        line: &str,
        depth: &mut i64,
        saw_header: &mut bool,
    ) -> Result<(), String> {
        let line = line.strip_suffix(';').unwrap_or(line).trim();
        if line.is_empty() {
            return Ok(());
        }
        if line == "{" {
            *depth += 1;
            return Ok(());
        }
        if line == "}" {
            *depth -= 1;
            if *depth < 0 {
                return Err("unbalanced closing brace".to_string());
            }
            return Ok(());
        }

        let mut scanner = Scanner::new(line);
        let _ = scanner.eat_word("strict");
        if scanner.eat_word("digraph") {
            *saw_header = true;
            return open_block(&mut scanner, depth);
        }
        if !*saw_header {
            return Err("statement before digraph header".to_string());
        }
        if scanner.eat_word("subgraph") {
            return open_block(&mut scanner, depth);
        }
        // Default-attribute statements (`graph [...]`, `node [...]`,
        // `edge [...]`) carry nothing the converter needs.
        if scanner.eat_word("graph") || scanner.eat_word("node") || scanner.eat_word("edge") {
            if scanner.peek() == Some('[') {
                scanner.read_attributes()?;
            }
            return Ok(());
        }

        let first = scanner.read_token()?;
        if scanner.eat("=") {
            // graph-level attribute, e.g. `compound = "true"`
            scanner.read_token()?;
            return scanner.expect_end();
        }
        if scanner.eat("->") {
            let mut previous = node_address(&first).to_string();
            loop {
                let token = scanner.read_token()?;
                let next = node_address(&token).to_string();
                self.add_edge(previous, next.clone());
                previous = next;
                if !scanner.eat("->") {
                    break;
                }
            }
            if scanner.peek() == Some('[') {
                scanner.read_attributes()?;
            }
            return scanner.expect_end();
        }

        // Node statement: prefer the label attribute, it carries the
        // address without the node-name decorations.
        let address = if scanner.peek() == Some('[') {
            let attributes = scanner.read_attributes()?;
            match attributes.get("label") {
                Some(label) => node_address(label).to_string(),
                None => node_address(&first).to_string(),
            }
        } else {
            node_address(&first).to_string()
        };
        self.add_node(address);
        scanner.expect_end()
    }

    fn add_node(&mut self, address: String) {
        if address.is_empty() {
            return;
        }
        self.neighbors.entry(address).or_default();
    }

    fn add_edge(&mut self, from: String, to: String) {
        if from.is_empty() || to.is_empty() || from == to {
            return;
        }
        self.neighbors
            .entry(from.clone())
            .or_default()
            .insert(to.clone());
        self.neighbors.entry(to).or_default().insert(from);
    }
}

fn open_block(scanner: &mut Scanner, depth: &mut i64) -> Result<(), String> {
    // optional block name, bare or quoted
    if scanner
        .peek()
        .is_some_and(|ch| ch == '"' || is_ident_char(ch))
    {
        scanner.read_token()?;
    }
    if scanner.eat("{") {
        *depth += 1;
    }
    scanner.expect_end()
}

/// Strips the decorations `terraform graph` adds around an address: the
/// `[root] ` marker and trailing annotations such as ` (expand)` or
/// ` (close)`.
fn node_address(raw: &str) -> &str {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("[root] ").unwrap_or(trimmed);
    match trimmed.find(" (") {
        Some(end) => trimmed[..end].trim_end(),
        None => trimmed,
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' || ch == '-'
}

struct Scanner<'a> {
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.rest.chars().next()
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        match self.rest.strip_prefix(token) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    /// Like `eat`, but only when the token is not a prefix of a longer
    /// identifier.
    fn eat_word(&mut self, word: &str) -> bool {
        self.skip_ws();
        if let Some(rest) = self.rest.strip_prefix(word) {
            if !rest.chars().next().is_some_and(is_ident_char) {
                self.rest = rest;
                return true;
            }
        }
        false
    }

    /// Reads a quoted (with `\"` escapes) or bare token.
    fn read_token(&mut self) -> Result<String, String> {
        match self.peek() {
            Some('"') => self.read_quoted(),
            Some(ch) if is_ident_char(ch) => {
                let end = self
                    .rest
                    .find(|c: char| !is_ident_char(c))
                    .unwrap_or(self.rest.len());
                let (token, rest) = self.rest.split_at(end);
                self.rest = rest;
                Ok(token.to_string())
            }
            Some(ch) => Err(format!("unexpected character `{ch}`")),
            None => Err("unexpected end of line".to_string()),
        }
    }

    fn read_quoted(&mut self) -> Result<String, String> {
        let mut value = String::new();
        let mut escaped = false;
        for (index, ch) in self.rest.char_indices().skip(1) {
            if escaped {
                value.push(ch);
                escaped = false;
                continue;
            }
            match ch {
                '\\' => escaped = true,
                '"' => {
                    self.rest = &self.rest[index + 1..];
                    return Ok(value);
                }
                _ => value.push(ch),
            }
        }
        Err("unterminated quoted string".to_string())
    }

    /// Parses a `[key = value, ...]` attribute list.
    fn read_attributes(&mut self) -> Result<BTreeMap<String, String>, String> {
        if !self.eat("[") {
            return Err("expected `[`".to_string());
        }
        let mut attributes = BTreeMap::new();
        loop {
            if self.eat("]") {
                return Ok(attributes);
            }
            let key = self.read_token()?;
            if !self.eat("=") {
                return Err(format!("expected `=` after attribute `{key}`"));
            }
            let value = self.read_token()?;
            attributes.insert(key, value);
            let _ = self.eat(",");
            let _ = self.eat(";");
        }
    }

    fn expect_end(&mut self) -> Result<(), String> {
        self.skip_ws();
        if self.rest.is_empty() {
            Ok(())
        } else {
            Err(format!("unexpected trailing input `{}`", self.rest))
        }
    }
}
