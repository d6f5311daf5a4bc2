use std::collections::BTreeMap;

use crowbook_text_processing::escape;
use serde::Serialize;

use super::ll1_table::{Conflict, ConflictKind};
use super::simulate::ParseTreeNode;
use super::{FirstFollowSets, Grammar, LL1Table, Production, Simulation, Symbol, EPSILON};

/// `a b c`, or `ε` for an empty sequence.
pub fn symbols_text(symbols: &[Symbol]) -> String {
    if symbols.is_empty() {
        return EPSILON.to_string();
    }
    symbols
        .iter()
        .map(Symbol::text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `a b | c | ε`
pub fn alternatives_text(alternatives: &[Production]) -> String {
    alternatives
        .iter()
        .map(|p| symbols_text(p))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// `A → a b`
pub fn production_text(left: &str, right: &[Symbol]) -> String {
    format!("{} → {}", left, symbols_text(right))
}

fn sorted_set_texts(sets: &FirstFollowSets, name: &str, follow: bool) -> Vec<String> {
    let set = if follow {
        sets.follow_of(name)
    } else {
        sets.first_of(name)
    };
    let mut texts: Vec<String> = set
        .map(|s| s.iter().map(|sym| sym.text().to_string()).collect())
        .unwrap_or_default();
    texts.sort();
    texts
}

impl Grammar {
    /// The grammar in its own input notation, one non-terminal per line.
    pub fn to_text(&self) -> String {
        self.non_terminals
            .iter()
            .map(|name| format!("{} -> {}", name, alternatives_text(self.productions_of(name))))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductionOutput {
    pub left: String,
    pub rights: Vec<Vec<String>>,
}

impl ProductionOutput {
    pub fn to_plaintext(&self, left_width: usize) -> String {
        self.rights
            .iter()
            .map(|right| right.join(" "))
            .enumerate()
            .map(|(i, right)| {
                if i == 0 {
                    format!("{:>width$} -> {}", self.left, right, width = left_width)
                } else {
                    format!("{:>width$}  | {}", "", right, width = left_width)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        if self.rights.is_empty() {
            return String::new();
        }
        let left = format!("{} & \\rightarrow &", escape::tex(self.left.as_str()));
        let right = self
            .rights
            .iter()
            .map(|right| {
                right
                    .iter()
                    .map(|s| escape::tex(s.as_str()))
                    .collect::<Vec<_>>()
                    .join(" \\ ")
            })
            .collect::<Vec<_>>()
            .join(" \\mid ");
        (left + &right).replace(EPSILON, "\\epsilon")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductionOutputVec {
    productions: Vec<ProductionOutput>,
}

impl ProductionOutputVec {
    pub fn to_plaintext(&self) -> String {
        let left_width = self
            .productions
            .iter()
            .map(|p| p.left.len())
            .max()
            .unwrap_or(0);
        self.productions
            .iter()
            .map(|p| p.to_plaintext(left_width))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        std::iter::once("\\[\\begin{array}{cll}".to_string())
            .chain(self.productions.iter().map(|p| p.to_latex()))
            .chain(std::iter::once("\\end{array}\\]".to_string()))
            .collect::<Vec<_>>()
            .join("\\\\\n")
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

impl Grammar {
    pub fn to_production_output_vec(&self) -> ProductionOutputVec {
        ProductionOutputVec {
            productions: self
                .non_terminals
                .iter()
                .map(|name| ProductionOutput {
                    left: name.clone(),
                    rights: self
                        .productions_of(name)
                        .iter()
                        .map(|p| p.iter().map(|s| s.text().to_string()).collect())
                        .collect(),
                })
                .collect(),
        }
    }
}

/// A transformed grammar plus the trace of how it was produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutput {
    pub transformed_grammar: String,
    pub steps: Vec<String>,
}

impl TransformOutput {
    pub fn new(grammar: &Grammar, steps: Vec<String>) -> Self {
        Self {
            transformed_grammar: grammar.to_text(),
            steps,
        }
    }

    pub fn to_plaintext(&self) -> String {
        format!("{}\n\n{}", self.steps.join("\n"), self.transformed_grammar)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

#[derive(Debug, Clone, Serialize)]
struct FirstFollowRow {
    name: String,
    first: Vec<String>,
    follow: Vec<String>,
}

impl FirstFollowRow {
    fn to_plaintext(&self) -> String {
        format!(
            "{} | {} | {}",
            self.name,
            self.first.join(", "),
            self.follow.join(", ")
        )
    }

    fn to_latex(&self) -> String {
        fn f(texts: &[String]) -> String {
            texts
                .iter()
                .map(|s| escape::tex(s.as_str()))
                .collect::<Vec<_>>()
                .join(r"\ ")
                .replace(EPSILON, r"$\epsilon$")
        }
        format!(
            "{} & {} & {}",
            escape::tex(self.name.as_str()),
            f(&self.first),
            f(&self.follow)
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FirstFollowOutput {
    data: Vec<FirstFollowRow>,
}

impl FirstFollowOutput {
    pub fn to_plaintext(&self) -> String {
        self.data
            .iter()
            .map(|row| row.to_plaintext())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        let content = self
            .data
            .iter()
            .map(|row| row.to_latex())
            .collect::<Vec<_>>()
            .join("\\\\\n ");
        "\\begin{tabular}{c|c|c}\n".to_string()
            + "Symbol & First & Follow\\\\\\hline\n"
            + &content
            + "\\\\\n\\end{tabular}"
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

impl Grammar {
    pub fn to_first_follow_output(&self, sets: &FirstFollowSets) -> FirstFollowOutput {
        FirstFollowOutput {
            data: self
                .non_terminals
                .iter()
                .map(|name| FirstFollowRow {
                    name: name.clone(),
                    first: sorted_set_texts(sets, name, false),
                    follow: sorted_set_texts(sets, name, true),
                })
                .collect(),
        }
    }
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::FirstFirst => "FIRST/FIRST",
            ConflictKind::FirstFollow => "FIRST/FOLLOW",
        }
    }
}

/// The parse-table data contract: cell texts, symbol lists, the sets the
/// table was built from, and the conflict report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LL1TableOutput {
    pub parse_table: BTreeMap<String, BTreeMap<String, String>>,
    pub first_sets: BTreeMap<String, Vec<String>>,
    pub follow_sets: BTreeMap<String, Vec<String>>,
    pub terminals: Vec<String>,
    pub non_terminals: Vec<String>,
    #[serde(rename = "isLL1")]
    pub is_ll1: bool,
    pub conflicts: Vec<Conflict>,
    pub message: String,
}

impl LL1Table {
    pub fn to_output(&self) -> LL1TableOutput {
        let mut parse_table: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for name in &self.non_terminals {
            let mut row = BTreeMap::new();
            for terminal in &self.terminals {
                if let Some(production) = self.get(name, terminal) {
                    row.insert(terminal.clone(), production_text(name, production));
                }
            }
            parse_table.insert(name.clone(), row);
        }

        let collect_sets = |follow: bool| {
            self.non_terminals
                .iter()
                .map(|name| (name.clone(), sorted_set_texts(&self.sets, name, follow)))
                .collect()
        };

        LL1TableOutput {
            parse_table,
            first_sets: collect_sets(false),
            follow_sets: collect_sets(true),
            terminals: self.terminals.clone(),
            non_terminals: self.non_terminals.clone(),
            is_ll1: self.is_ll1(),
            conflicts: self.conflicts.clone(),
            message: if self.is_ll1() {
                "Grammar is LL(1)".to_string()
            } else {
                "Grammar is NOT LL(1) - conflicts detected".to_string()
            },
        }
    }

    pub fn to_plaintext(&self) -> String {
        let mut output: Vec<Vec<String>> = Vec::new();
        let mut header = vec![String::new()];
        header.extend(self.terminals.iter().cloned());
        output.push(header);

        for name in &self.non_terminals {
            let mut line = vec![name.clone()];
            line.extend(self.terminals.iter().map(|terminal| {
                self.get(name, terminal)
                    .map(|p| production_text(name, p))
                    .unwrap_or_default()
            }));
            output.push(line);
        }

        let width: Vec<usize> = (0..output[0].len())
            .map(|j| output.iter().map(|line| line[j].len()).max().unwrap())
            .collect();
        let mut grid = output
            .iter()
            .map(|line| {
                line.iter()
                    .enumerate()
                    .map(|(i, s)| format!("{:>width$}", s, width = width[i]))
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("\n");

        for conflict in &self.conflicts {
            grid.push_str(&format!(
                "\nConflict at [{}, {}] ({}): {}",
                conflict.non_terminal,
                conflict.terminal,
                conflict.kind.as_str(),
                conflict.productions.join(" vs ")
            ));
        }
        grid
    }

    pub fn to_latex(&self) -> String {
        let mut header: Vec<String> = vec![format!(
            "\\[\\begin{{array}}{{c{}}}\n",
            "|l".repeat(self.terminals.len()),
        )];
        header.extend(
            self.terminals
                .iter()
                .map(|t| format!("\\text{{{}}}", escape::tex(t.as_str()))),
        );
        let header = header.join(" & ");

        let rows = self
            .non_terminals
            .iter()
            .map(|name| {
                let mut line: Vec<String> = vec![escape::tex(name.as_str()).to_string()];
                line.extend(self.terminals.iter().map(|terminal| {
                    self.get(name, terminal)
                        .map(|p| {
                            format!(
                                "{} \\rightarrow {}",
                                escape::tex(name.as_str()),
                                p.iter()
                                    .map(|s| escape::tex(s.text()))
                                    .collect::<Vec<_>>()
                                    .join(" \\ ")
                                    .replace(EPSILON, "\\epsilon")
                            )
                        })
                        .unwrap_or_default()
                }));
                line.join(" & ")
            })
            .collect::<Vec<_>>()
            .join("\\\\\n");

        header + "\\\\\\hline\n" + &rows + "\n\\end{array}\\]"
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.to_output()).unwrap()
    }
}

fn tree_lines(node: &ParseTreeNode, depth: usize, out: &mut Vec<String>) {
    out.push(format!("{}{}", "  ".repeat(depth), node.symbol));
    for child in &node.children {
        tree_lines(child, depth + 1, out);
    }
}

impl Simulation {
    pub fn to_plaintext(&self) -> String {
        let mut output: Vec<Vec<String>> = vec![vec![
            "Step".to_string(),
            "Stack".to_string(),
            "Input".to_string(),
            "Action".to_string(),
            "Production".to_string(),
        ]];
        for step in &self.steps {
            output.push(vec![
                step.step.to_string(),
                step.stack.clone(),
                step.input.clone(),
                step.action.clone(),
                step.production.clone(),
            ]);
        }

        let width: Vec<usize> = (0..output[0].len())
            .map(|j| output.iter().map(|line| line[j].len()).max().unwrap())
            .collect();
        let mut text = output
            .iter()
            .map(|line| {
                line.iter()
                    .enumerate()
                    .map(|(i, s)| format!("{:>width$}", s, width = width[i]))
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("\n");

        text.push_str(&format!("\n\n{}", self.message));
        if !self.derivation.is_empty() {
            text.push_str(&format!("\nDerivation: {}", self.derivation));
        }
        if let Some(tree) = &self.tree {
            let mut lines = Vec::new();
            tree_lines(tree, 0, &mut lines);
            text.push_str(&format!("\nParse tree:\n{}", lines.join("\n")));
        }
        text
    }

    pub fn to_latex(&self) -> String {
        let rows = self
            .steps
            .iter()
            .map(|step| {
                [
                    step.step.to_string(),
                    step.stack.clone(),
                    step.input.clone(),
                    step.action.clone(),
                    step.production.clone(),
                ]
                .iter()
                .map(|s| escape::tex(s.as_str()).replace(EPSILON, "$\\epsilon$"))
                .collect::<Vec<_>>()
                .join(" & ")
            })
            .collect::<Vec<_>>()
            .join("\\\\\n ");
        "\\begin{tabular}{c|l|r|l|l}\n".to_string()
            + "Step & Stack & Input & Action & Production\\\\\\hline\n"
            + &rows
            + "\\\\\n\\end{tabular}"
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grammar_round_trips_through_its_text_form() {
        let g = Grammar::parse("E -> T E'\nE' -> + T E' | ε\nT -> id");
        assert_eq!(g.to_text(), "E -> T E'\nE' -> + T E' | ε\nT -> id");

        let reparsed = Grammar::parse(&g.to_text());
        assert_eq!(reparsed.non_terminals, g.non_terminals);
        for name in &g.non_terminals {
            assert_eq!(reparsed.productions_of(name), g.productions_of(name));
        }
    }

    #[test]
    fn production_output_aligns_left_sides() {
        let g = Grammar::parse("E -> T E'\nE' -> + T E' | ε");
        let text = g.to_production_output_vec().to_plaintext();
        assert_eq!(text, " E -> T E'\nE' -> + T E'\n    | ε");
    }

    #[test]
    fn table_json_carries_the_contract_fields() {
        let g = Grammar::parse("S -> a");
        let json = g.ll1_table().to_json();
        for field in ["parseTable", "firstSets", "followSets", "isLL1", "conflicts"] {
            assert!(json.contains(field), "missing {}", field);
        }
    }

    #[test]
    fn epsilon_is_rendered_as_latex_epsilon() {
        let g = Grammar::parse("A -> ε");
        let latex = g.to_production_output_vec().to_latex();
        assert!(latex.contains("\\epsilon"));
    }
}
