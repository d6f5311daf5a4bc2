use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::pretty_print::production_text;
use super::{FirstFollowSets, Grammar, Production, Symbol, END_MARK};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConflictKind {
    #[serde(rename = "FIRST/FIRST")]
    FirstFirst,
    #[serde(rename = "FIRST/FOLLOW")]
    FirstFollow,
}

/// Two productions competing for the same table cell. The earlier
/// production in declaration order keeps the cell; both appear here.
#[derive(Debug, Clone, Serialize)]
pub struct Conflict {
    pub non_terminal: String,
    pub terminal: String,
    pub productions: Vec<String>,
    pub kind: ConflictKind,
}

/// An LL(1) parse table. Absent cells are not an error at build time; they
/// mean "no applicable rule" and surface during simulation.
#[derive(Debug, Clone)]
pub struct LL1Table {
    pub non_terminals: Vec<String>,
    /// Sorted, with the end marker last.
    pub terminals: Vec<String>,
    pub sets: FirstFollowSets,
    entries: HashMap<(String, String), Production>,
    pub conflicts: Vec<Conflict>,
}

impl LL1Table {
    pub fn get(&self, non_terminal: &str, terminal: &str) -> Option<&Production> {
        self.entries
            .get(&(non_terminal.to_string(), terminal.to_string()))
    }

    pub fn is_ll1(&self) -> bool {
        self.conflicts.is_empty()
    }
}

fn sorted_texts(set: &HashSet<Symbol>) -> Vec<String> {
    let mut texts: Vec<String> = set
        .iter()
        .filter(|s| **s != Symbol::Epsilon)
        .map(|s| s.text().to_string())
        .collect();
    texts.sort();
    texts
}

impl Grammar {
    /// Builds the LL(1) table. Never fails: every cell collision is
    /// recorded as a conflict and the earliest production keeps the cell.
    pub fn ll1_table(&self) -> LL1Table {
        let sets = self.first_follow();

        let mut terminals = self.terminals();
        terminals.sort();
        terminals.push(END_MARK.to_string());

        let mut entries: HashMap<(String, String), Production> = HashMap::new();
        let mut conflicts: Vec<Conflict> = Vec::new();

        let occupy = |name: &str,
                          terminal: &str,
                          production: &Production,
                          kind: ConflictKind,
                          conflicts: &mut Vec<Conflict>,
                          entries: &mut HashMap<(String, String), Production>| {
            let key = (name.to_string(), terminal.to_string());
            if let Some(existing) = entries.get(&key) {
                conflicts.push(Conflict {
                    non_terminal: name.to_string(),
                    terminal: terminal.to_string(),
                    productions: vec![
                        production_text(name, existing),
                        production_text(name, production),
                    ],
                    kind,
                });
            } else {
                entries.insert(key, production.clone());
            }
        };

        for name in &self.non_terminals {
            for production in self.productions_of(name) {
                let first = self.first_of_sequence(production, &sets.first);
                for terminal in sorted_texts(&first) {
                    occupy(
                        name,
                        &terminal,
                        production,
                        ConflictKind::FirstFirst,
                        &mut conflicts,
                        &mut entries,
                    );
                }
                if first.contains(&Symbol::Epsilon) {
                    let follow = sets.follow_of(name).cloned().unwrap_or_default();
                    for terminal in sorted_texts(&follow) {
                        occupy(
                            name,
                            &terminal,
                            production,
                            ConflictKind::FirstFollow,
                            &mut conflicts,
                            &mut entries,
                        );
                    }
                }
            }
        }

        LL1Table {
            non_terminals: self.non_terminals.clone(),
            terminals,
            sets,
            entries,
            conflicts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_grammar_is_ll1() {
        let g = Grammar::parse(
            "E -> T E'\nE' -> + T E' | ε\nT -> F T'\nT' -> * F T' | ε\nF -> ( E ) | id",
        );
        let table = g.ll1_table();

        assert!(table.is_ll1());
        assert_eq!(table.terminals, vec!["(", ")", "*", "+", "id", "$"]);
        assert_eq!(
            production_text("E", table.get("E", "id").unwrap()),
            "E → T E'"
        );
        assert_eq!(
            production_text("E'", table.get("E'", "$").unwrap()),
            "E' → ε"
        );
        assert!(table.get("F", "+").is_none());
    }

    #[test]
    fn first_first_conflicts_are_reported() {
        let g = Grammar::parse("S -> a b | a c");
        let table = g.ll1_table();

        assert!(!table.is_ll1());
        assert_eq!(table.conflicts.len(), 1);
        let conflict = &table.conflicts[0];
        assert_eq!(conflict.kind, ConflictKind::FirstFirst);
        assert_eq!(conflict.non_terminal, "S");
        assert_eq!(conflict.terminal, "a");
        // The earlier production keeps the cell.
        assert_eq!(
            production_text("S", table.get("S", "a").unwrap()),
            "S → a b"
        );
    }

    #[test]
    fn first_follow_conflicts_are_reported() {
        let g = Grammar::parse("S -> A a\nA -> a | ε");
        let table = g.ll1_table();

        assert!(!table.is_ll1());
        let conflict = &table.conflicts[0];
        assert_eq!(conflict.kind, ConflictKind::FirstFollow);
        assert_eq!(conflict.non_terminal, "A");
        assert_eq!(conflict.terminal, "a");
        assert_eq!(
            production_text("A", table.get("A", "a").unwrap()),
            "A → a"
        );
    }

    #[test]
    fn epsilon_rows_fill_follow_cells() {
        let g = Grammar::parse("S -> AB\nA -> a | ε\nB -> b");
        let table = g.ll1_table();

        assert!(table.is_ll1());
        assert_eq!(
            production_text("A", table.get("A", "b").unwrap()),
            "A → ε"
        );
    }
}
