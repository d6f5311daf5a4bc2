use serde::Serialize;

use super::ll1_table::Conflict;
use super::pretty_print::production_text;
use super::{Grammar, LL1Table, Symbol, EPSILON};

/// Hard cap on simulation steps. A grammar that still loops through
/// epsilon expansions (for example one that was never cleaned of left
/// recursion) must hit this instead of running forever.
pub const STEP_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Serialize)]
pub struct ParseStep {
    pub step: usize,
    pub stack: String,
    pub input: String,
    pub action: String,
    pub production: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseTreeNode {
    pub symbol: String,
    pub children: Vec<ParseTreeNode>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason")]
pub enum SimulationFailure {
    /// Stack top is a terminal that does not match the lookahead.
    Mismatch { expected: String, found: String },
    /// No table cell for (non-terminal, lookahead).
    NoRule {
        non_terminal: String,
        terminal: String,
    },
    /// The step cap was reached before accept or error.
    StepLimitExceeded { limit: usize },
    /// The table has conflicts; simulation refuses to run on it.
    NotLl1 { conflicts: Vec<Conflict> },
}

/// The finished trace of one simulation run. Failures are values, never
/// panics, so a caller can always render the partial trace.
#[derive(Debug, Clone, Serialize)]
pub struct Simulation {
    pub steps: Vec<ParseStep>,
    pub accepted: bool,
    pub message: String,
    pub derivation: String,
    pub tree: Option<ParseTreeNode>,
    pub failure: Option<SimulationFailure>,
}

struct ArenaNode {
    symbol: String,
    children: Vec<usize>,
}

fn own_tree(nodes: &[ArenaNode], index: usize) -> ParseTreeNode {
    ParseTreeNode {
        symbol: nodes[index].symbol.clone(),
        children: nodes[index]
            .children
            .iter()
            .map(|&child| own_tree(nodes, child))
            .collect(),
    }
}

fn stack_text(stack: &[(Symbol, Option<usize>)]) -> String {
    stack.iter().rev().map(|(s, _)| s.text()).collect()
}

fn symbols_concat(symbols: &[Symbol]) -> String {
    if symbols.is_empty() {
        EPSILON.to_string()
    } else {
        symbols.iter().map(Symbol::text).collect()
    }
}

impl Grammar {
    /// Runs the table-driven predictive parser over `input` and returns
    /// the full trace. See [`STEP_LIMIT`] for the step cap.
    pub fn simulate(&self, table: &LL1Table, input: &str) -> Simulation {
        self.simulate_with_limit(table, input, STEP_LIMIT)
    }

    pub fn simulate_with_limit(
        &self,
        table: &LL1Table,
        input: &str,
        limit: usize,
    ) -> Simulation {
        if !table.is_ll1() {
            return Simulation {
                steps: Vec::new(),
                accepted: false,
                message: "Cannot parse: grammar is not LL(1)".to_string(),
                derivation: String::new(),
                tree: None,
                failure: Some(SimulationFailure::NotLl1 {
                    conflicts: table.conflicts.clone(),
                }),
            };
        }
        let Some(start) = self.start.clone() else {
            return Simulation {
                steps: Vec::new(),
                accepted: false,
                message: "Grammar has no productions".to_string(),
                derivation: String::new(),
                tree: None,
                failure: None,
            };
        };

        let mut tokens = self.split_input(input);
        tokens.push(Symbol::End);

        let mut nodes = vec![ArenaNode {
            symbol: start.clone(),
            children: Vec::new(),
        }];
        let mut stack: Vec<(Symbol, Option<usize>)> = vec![
            (Symbol::End, None),
            (Symbol::NonTerminal(start.clone()), Some(0)),
        ];
        let mut sentential: Vec<Symbol> = vec![Symbol::NonTerminal(start)];
        let mut derivation: Vec<String> = vec![symbols_concat(&sentential)];

        let mut steps: Vec<ParseStep> = Vec::new();
        let mut pointer = 0usize;
        let mut accepted = false;
        let mut message = String::new();
        let mut failure: Option<SimulationFailure> = None;

        loop {
            if steps.len() >= limit {
                message = format!("Parsing aborted after {} steps", limit);
                failure = Some(SimulationFailure::StepLimitExceeded { limit });
                break;
            }

            let (top, parent) = stack.last().cloned().expect("end marker stays on stack");
            let lookahead = tokens[pointer].clone();
            let step = ParseStep {
                step: steps.len() + 1,
                stack: stack_text(&stack),
                input: tokens[pointer..].iter().map(Symbol::text).collect(),
                action: String::new(),
                production: String::new(),
            };

            match top {
                Symbol::End if lookahead == Symbol::End => {
                    steps.push(ParseStep {
                        action: "Accept".to_string(),
                        ..step
                    });
                    accepted = true;
                    message = "Input accepted".to_string();
                    break;
                }
                Symbol::Terminal(_) | Symbol::End => {
                    if top == lookahead {
                        steps.push(ParseStep {
                            action: format!("Match '{}'", top.text()),
                            ..step
                        });
                        stack.pop();
                        pointer += 1;
                    } else {
                        steps.push(ParseStep {
                            action: "Error".to_string(),
                            ..step
                        });
                        message = format!(
                            "Expected '{}' but found '{}'",
                            top.text(),
                            lookahead.text()
                        );
                        failure = Some(SimulationFailure::Mismatch {
                            expected: top.text().to_string(),
                            found: lookahead.text().to_string(),
                        });
                        break;
                    }
                }
                // Epsilon is never pushed; nothing to do beyond dropping it.
                Symbol::Epsilon => {
                    stack.pop();
                }
                Symbol::NonTerminal(name) => {
                    let Some(production) = table.get(&name, lookahead.text()).cloned() else {
                        steps.push(ParseStep {
                            action: "Error".to_string(),
                            ..step
                        });
                        message =
                            format!("No rule for {} under '{}'", name, lookahead.text());
                        failure = Some(SimulationFailure::NoRule {
                            non_terminal: name,
                            terminal: lookahead.text().to_string(),
                        });
                        break;
                    };

                    steps.push(ParseStep {
                        action: "Apply production".to_string(),
                        production: production_text(&name, &production),
                        ..step
                    });

                    // Leftmost derivation: the expanded non-terminal is the
                    // leftmost one in the sentential form.
                    if let Some(at) = sentential
                        .iter()
                        .position(|s| matches!(s, Symbol::NonTerminal(n) if *n == name))
                    {
                        let replacement: Vec<Symbol> = production
                            .iter()
                            .filter(|s| **s != Symbol::Epsilon)
                            .cloned()
                            .collect();
                        sentential.splice(at..at + 1, replacement);
                        derivation.push(symbols_concat(&sentential));
                    }

                    stack.pop();
                    if production.as_slice() == [Symbol::Epsilon] {
                        if let Some(p) = parent {
                            let id = nodes.len();
                            nodes.push(ArenaNode {
                                symbol: EPSILON.to_string(),
                                children: Vec::new(),
                            });
                            nodes[p].children.push(id);
                        }
                    } else {
                        let mut pushed: Vec<(Symbol, Option<usize>)> = Vec::new();
                        for symbol in &production {
                            let id = nodes.len();
                            nodes.push(ArenaNode {
                                symbol: symbol.text().to_string(),
                                children: Vec::new(),
                            });
                            if let Some(p) = parent {
                                nodes[p].children.push(id);
                            }
                            pushed.push((symbol.clone(), Some(id)));
                        }
                        while let Some(item) = pushed.pop() {
                            stack.push(item);
                        }
                    }
                }
            }
        }

        Simulation {
            steps,
            accepted,
            message,
            derivation: derivation.join(" ⇒ "),
            tree: Some(own_tree(&nodes, 0)),
            failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expression_grammar() -> Grammar {
        Grammar::parse(
            "E -> T E'\nE' -> + T E' | ε\nT -> F T'\nT' -> * F T' | ε\nF -> ( E ) | id",
        )
    }

    #[test]
    fn accepts_expression_input() {
        let g = expression_grammar();
        let table = g.ll1_table();
        let run = g.simulate(&table, "id+id*id");

        assert!(run.accepted, "{}", run.message);
        let last = run.steps.last().unwrap();
        assert_eq!(last.action, "Accept");
        assert_eq!(last.stack, "$");
        assert_eq!(last.input, "$");
        assert!(run.derivation.ends_with("id+id*id"));
    }

    #[test]
    fn records_the_leftmost_derivation() {
        let g = Grammar::parse("S -> AB\nA -> a | ε\nB -> b");
        let table = g.ll1_table();
        let run = g.simulate(&table, "ab");

        assert!(run.accepted);
        assert_eq!(run.derivation, "S ⇒ AB ⇒ aB ⇒ ab");
    }

    #[test]
    fn builds_the_parse_tree_with_epsilon_leaves() {
        let g = Grammar::parse("S -> AB\nA -> a | ε\nB -> b");
        let table = g.ll1_table();
        let run = g.simulate(&table, "b");

        assert!(run.accepted);
        let tree = run.tree.unwrap();
        assert_eq!(tree.symbol, "S");
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].symbol, "A");
        assert_eq!(tree.children[0].children[0].symbol, "ε");
        assert_eq!(tree.children[1].symbol, "B");
        assert_eq!(tree.children[1].children[0].symbol, "b");
    }

    #[test]
    fn mismatch_is_a_structured_failure_with_partial_trace() {
        let g = Grammar::parse("S -> a b");
        let table = g.ll1_table();
        let run = g.simulate(&table, "ac");

        assert!(!run.accepted);
        assert!(!run.steps.is_empty());
        match run.failure {
            Some(SimulationFailure::Mismatch { expected, found }) => {
                assert_eq!(expected, "b");
                assert_eq!(found, "c");
            }
            other => panic!("unexpected failure: {:?}", other),
        }
    }

    #[test]
    fn missing_cell_reports_no_rule() {
        let g = Grammar::parse("S -> a");
        let table = g.ll1_table();
        let run = g.simulate(&table, "b");

        match run.failure {
            Some(SimulationFailure::NoRule {
                non_terminal,
                terminal,
            }) => {
                assert_eq!(non_terminal, "S");
                assert_eq!(terminal, "b");
            }
            other => panic!("unexpected failure: {:?}", other),
        }
    }

    #[test]
    fn conflicted_tables_are_refused() {
        let g = Grammar::parse("S -> a b | a c");
        let table = g.ll1_table();
        let run = g.simulate(&table, "ab");

        assert!(!run.accepted);
        assert!(run.steps.is_empty());
        assert!(matches!(
            run.failure,
            Some(SimulationFailure::NotLl1 { .. })
        ));
    }

    #[test]
    fn step_cap_turns_long_runs_into_a_failure() {
        let g = expression_grammar();
        let table = g.ll1_table();
        let run = g.simulate_with_limit(&table, "id+id+id+id", 3);

        assert!(!run.accepted);
        assert_eq!(run.steps.len(), 3);
        assert!(matches!(
            run.failure,
            Some(SimulationFailure::StepLimitExceeded { limit: 3 })
        ));
    }
}
