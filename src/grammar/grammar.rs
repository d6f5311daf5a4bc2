use std::collections::{HashMap, HashSet};
use std::fmt;

use super::{END_MARK, EPSILON};

/// A grammar symbol. Equality is by tag and text, so two `Terminal("id")`
/// values are the same symbol no matter where they came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Terminal(String),
    NonTerminal(String),
    Epsilon,
    End,
}

impl Symbol {
    pub fn text(&self) -> &str {
        match self {
            Symbol::Terminal(s) | Symbol::NonTerminal(s) => s.as_str(),
            Symbol::Epsilon => EPSILON,
            Symbol::End => END_MARK,
        }
    }

    pub fn is_non_terminal(&self) -> bool {
        matches!(self, Symbol::NonTerminal(_))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// One right-hand-side alternative.
pub type Production = Vec<Symbol>;

/// A context-free grammar: declaration-ordered non-terminals, each with an
/// ordered list of alternatives. The first non-terminal is the start symbol.
///
/// Any right-hand-side name without a declaration of its own is a terminal.
/// That rule can hide a typo in the input, but it is the documented behavior
/// of the input format and the tokenizer in `parse.rs` is the only place
/// that applies it.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    pub non_terminals: Vec<String>,
    pub productions: HashMap<String, Vec<Production>>,
    pub start: Option<String>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_non_terminal(&self, name: &str) -> bool {
        self.productions.contains_key(name)
    }

    /// Registers `name` as a non-terminal, keeping declaration order.
    pub fn add_non_terminal(&mut self, name: &str) {
        if !self.productions.contains_key(name) {
            self.non_terminals.push(name.to_string());
            self.productions.insert(name.to_string(), Vec::new());
            if self.start.is_none() {
                self.start = Some(name.to_string());
            }
        }
    }

    pub fn add_production(&mut self, left: &str, right: Production) {
        self.add_non_terminal(left);
        self.productions
            .get_mut(left)
            .expect("non-terminal was just registered")
            .push(right);
    }

    pub fn productions_of(&self, name: &str) -> &[Production] {
        self.productions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All productions in declaration order, as (left, right) pairs.
    pub fn production_iter(&self) -> impl Iterator<Item = (&str, &Production)> {
        self.non_terminals.iter().flat_map(move |name| {
            self.productions_of(name)
                .iter()
                .map(move |p| (name.as_str(), p))
        })
    }

    /// Terminals referenced anywhere in the grammar, first-seen order.
    /// Epsilon and the end marker are not terminals.
    pub fn terminals(&self) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut out: Vec<String> = Vec::new();
        for (_, production) in self.production_iter() {
            for symbol in production {
                if let Symbol::Terminal(name) = symbol {
                    if seen.insert(name.as_str()) {
                        out.push(name.clone());
                    }
                }
            }
        }
        out
    }

    /// A non-terminal name not yet taken by any symbol of the grammar:
    /// `A'` if free, otherwise `A'1`, `A'2`, ...
    pub fn fresh_prime_name(&self, base: &str) -> String {
        let taken: HashSet<String> = self
            .non_terminals
            .iter()
            .cloned()
            .chain(self.terminals())
            .collect();
        fresh_prime_name(base, &taken)
    }
}

pub fn fresh_prime_name(base: &str, taken: &HashSet<String>) -> String {
    let candidate = format!("{}'", base);
    if !taken.contains(&candidate) {
        return candidate;
    }
    let mut counter = 1usize;
    loop {
        let candidate = format!("{}'{}", base, counter);
        if !taken.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_order_is_kept() {
        let mut g = Grammar::new();
        g.add_production("S", vec![Symbol::NonTerminal("A".into())]);
        g.add_production("A", vec![Symbol::Terminal("a".into())]);
        g.add_production("S", vec![Symbol::Terminal("b".into())]);

        assert_eq!(g.non_terminals, vec!["S", "A"]);
        assert_eq!(g.start.as_deref(), Some("S"));
        assert_eq!(g.productions_of("S").len(), 2);
    }

    #[test]
    fn terminals_are_derived_in_first_seen_order() {
        let mut g = Grammar::new();
        g.add_production(
            "S",
            vec![
                Symbol::Terminal("b".into()),
                Symbol::NonTerminal("S".into()),
                Symbol::Terminal("a".into()),
            ],
        );
        g.add_production("S", vec![Symbol::Epsilon]);

        assert_eq!(g.terminals(), vec!["b", "a"]);
    }

    #[test]
    fn fresh_names_avoid_collisions() {
        let mut g = Grammar::new();
        g.add_production("A", vec![Symbol::Terminal("a".into())]);
        g.add_production("A'", vec![Symbol::Terminal("b".into())]);

        assert_eq!(g.fresh_prime_name("A"), "A'1");
        assert_eq!(g.fresh_prime_name("A'"), "A''");
    }
}
