use std::collections::{HashMap, HashSet};

use super::{Grammar, Symbol};

/// FIRST and FOLLOW, keyed by non-terminal name. Epsilon may occur in a
/// FIRST set (the non-terminal can derive the empty string) but never in a
/// FOLLOW set.
#[derive(Debug, Clone)]
pub struct FirstFollowSets {
    pub first: HashMap<String, HashSet<Symbol>>,
    pub follow: HashMap<String, HashSet<Symbol>>,
}

impl FirstFollowSets {
    pub fn first_of(&self, name: &str) -> Option<&HashSet<Symbol>> {
        self.first.get(name)
    }

    pub fn follow_of(&self, name: &str) -> Option<&HashSet<Symbol>> {
        self.follow.get(name)
    }
}

impl Grammar {
    /// Upper bound on fixed-point passes. Every pass that changes anything
    /// grows at least one set, each set is bounded by the alphabet plus
    /// epsilon and the end marker, so the loops below terminate within
    /// this many passes on any input.
    fn pass_bound(&self) -> usize {
        self.non_terminals.len() * (self.terminals().len() + 2) + 1
    }

    /// FIRST of a symbol sequence under the given (possibly still growing)
    /// FIRST sets: a terminal ends the walk, a non-terminal contributes its
    /// FIRST minus epsilon and ends the walk unless it is nullable, and a
    /// sequence whose every symbol derives epsilon contributes epsilon.
    pub fn first_of_sequence(
        &self,
        sequence: &[Symbol],
        first: &HashMap<String, HashSet<Symbol>>,
    ) -> HashSet<Symbol> {
        let mut out = HashSet::new();
        let mut derives_epsilon = true;
        for symbol in sequence {
            match symbol {
                Symbol::Epsilon => {}
                Symbol::Terminal(_) | Symbol::End => {
                    out.insert(symbol.clone());
                    derives_epsilon = false;
                    break;
                }
                Symbol::NonTerminal(name) => {
                    let empty = HashSet::new();
                    let f = first.get(name).unwrap_or(&empty);
                    out.extend(f.iter().filter(|s| **s != Symbol::Epsilon).cloned());
                    if !f.contains(&Symbol::Epsilon) {
                        derives_epsilon = false;
                        break;
                    }
                }
            }
        }
        if derives_epsilon && !sequence.is_empty() {
            out.insert(Symbol::Epsilon);
        }
        out
    }

    /// Computes FIRST and FOLLOW for every non-terminal.
    pub fn first_follow(&self) -> FirstFollowSets {
        let bound = self.pass_bound();

        let mut first: HashMap<String, HashSet<Symbol>> = self
            .non_terminals
            .iter()
            .map(|name| (name.clone(), HashSet::new()))
            .collect();

        for _ in 0..bound {
            let mut changed = false;
            for name in &self.non_terminals {
                for production in self.productions_of(name) {
                    let f = self.first_of_sequence(production, &first);
                    let entry = first.get_mut(name).expect("initialized above");
                    let before = entry.len();
                    entry.extend(f);
                    changed |= entry.len() > before;
                }
            }
            if !changed {
                break;
            }
        }

        let mut follow: HashMap<String, HashSet<Symbol>> = self
            .non_terminals
            .iter()
            .map(|name| (name.clone(), HashSet::new()))
            .collect();
        if let Some(start) = &self.start {
            follow
                .get_mut(start)
                .expect("start symbol is a non-terminal")
                .insert(Symbol::End);
        }

        for _ in 0..bound {
            let mut changed = false;
            for (left, production) in self.production_iter() {
                for (i, symbol) in production.iter().enumerate() {
                    let Symbol::NonTerminal(b) = symbol else {
                        continue;
                    };
                    let beta = &production[i + 1..];
                    let mut additions: HashSet<Symbol> = HashSet::new();
                    if beta.is_empty() {
                        additions.extend(follow[left].iter().cloned());
                    } else {
                        let f = self.first_of_sequence(beta, &first);
                        let nullable = f.contains(&Symbol::Epsilon);
                        additions.extend(f.into_iter().filter(|s| *s != Symbol::Epsilon));
                        if nullable {
                            additions.extend(follow[left].iter().cloned());
                        }
                    }
                    let entry = follow.get_mut(b).expect("initialized above");
                    let before = entry.len();
                    entry.extend(additions);
                    changed |= entry.len() > before;
                }
            }
            if !changed {
                break;
            }
        }

        FirstFollowSets { first, follow }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Symbol {
        Symbol::Terminal(s.into())
    }

    fn set(symbols: &[Symbol]) -> HashSet<Symbol> {
        symbols.iter().cloned().collect()
    }

    #[test]
    fn first_of_terminal_sequence_is_its_head() {
        let g = Grammar::parse("S -> a b");
        let sets = g.first_follow();
        assert_eq!(sets.first["S"], set(&[t("a")]));
    }

    #[test]
    fn first_of_epsilon_production_is_epsilon() {
        let g = Grammar::parse("A -> ε");
        let sets = g.first_follow();
        assert_eq!(sets.first["A"], set(&[Symbol::Epsilon]));
    }

    #[test]
    fn nullable_prefix_exposes_the_next_symbol() {
        // S -> AB, A -> a | ε, B -> b
        let g = Grammar::parse("S -> AB\nA -> a | ε\nB -> b");
        let sets = g.first_follow();

        assert_eq!(sets.first["S"], set(&[t("a"), t("b")]));
        assert_eq!(sets.first["A"], set(&[t("a"), Symbol::Epsilon]));
        assert_eq!(sets.follow["A"], set(&[t("b")]));
        assert_eq!(sets.follow["S"], set(&[Symbol::End]));
    }

    #[test]
    fn follow_of_start_contains_end_marker() {
        let g = Grammar::parse("E -> E + T | T\nT -> id");
        let sets = g.first_follow();
        assert!(sets.follow["E"].contains(&Symbol::End));
    }

    #[test]
    fn epsilon_never_enters_a_follow_set() {
        let g = Grammar::parse("S -> A B\nA -> ε | a\nB -> ε | b");
        let sets = g.first_follow();
        for name in &g.non_terminals {
            assert!(!sets.follow[name].contains(&Symbol::Epsilon), "{}", name);
        }
    }

    #[test]
    fn expression_grammar_sets() {
        let g = Grammar::parse(
            "E -> T E'\nE' -> + T E' | ε\nT -> F T'\nT' -> * F T' | ε\nF -> ( E ) | id",
        );
        let sets = g.first_follow();

        assert_eq!(sets.first["E"], set(&[t("("), t("id")]));
        assert_eq!(sets.first["E'"], set(&[t("+"), Symbol::Epsilon]));
        assert_eq!(sets.follow["E"], set(&[t(")"), Symbol::End]));
        assert_eq!(sets.follow["T"], set(&[t("+"), t(")"), Symbol::End]));
        assert_eq!(
            sets.follow["F"],
            set(&[t("+"), t("*"), t(")"), Symbol::End])
        );
    }
}
