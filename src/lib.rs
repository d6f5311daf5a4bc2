extern crate wasm_bindgen;

use wasm_bindgen::prelude::*;

pub mod grammar;
pub use grammar::{Grammar, LL1Table, Simulation};

fn checked(grammar: &str) -> Result<Grammar, String> {
    let g = Grammar::parse(grammar);
    if g.start.is_none() {
        Err("Grammar has no productions".to_string())
    } else {
        Ok(g)
    }
}

#[wasm_bindgen]
pub fn first_follow_to_json(grammar: &str) -> String {
    match checked(grammar) {
        Ok(g) => {
            let sets = g.first_follow();
            g.to_first_follow_output(&sets).to_json()
        }
        Err(e) => format!("{{\"error\":\"{}\"}}", e),
    }
}

#[wasm_bindgen]
pub fn eliminate_left_recursion_to_json(grammar: &str) -> String {
    match checked(grammar) {
        Ok(g) => {
            let (out, steps) = g.eliminate_left_recursion();
            grammar::pretty_print::TransformOutput::new(&out, steps).to_json()
        }
        Err(e) => format!("{{\"error\":\"{}\"}}", e),
    }
}

#[wasm_bindgen]
pub fn left_factor_to_json(grammar: &str) -> String {
    match checked(grammar) {
        Ok(g) => {
            let (out, steps) = g.left_factor();
            grammar::pretty_print::TransformOutput::new(&out, steps).to_json()
        }
        Err(e) => format!("{{\"error\":\"{}\"}}", e),
    }
}

#[wasm_bindgen]
pub fn ll1_table_to_json(grammar: &str) -> String {
    match checked(grammar) {
        Ok(g) => g.ll1_table().to_json(),
        Err(e) => format!("{{\"error\":\"{}\"}}", e),
    }
}

#[wasm_bindgen]
pub fn simulate_to_json(grammar: &str, input: &str) -> String {
    match checked(grammar) {
        Ok(g) => {
            let table = g.ll1_table();
            g.simulate(&table, input).to_json()
        }
        Err(e) => format!("{{\"error\":\"{}\"}}", e),
    }
}

#[cfg(test)]
mod parse_tests {
    use crate::Grammar;

    #[test]
    fn simple_parse() {
        let g = Grammar::parse("S -> a");
        assert_eq!(g.non_terminals, vec!["S"]);
        assert_eq!(g.to_text(), "S -> a");
    }

    #[test]
    fn simple_parse_with_space() {
        let g = Grammar::parse("  S -> a ");
        assert_eq!(g.to_text(), "S -> a");
    }

    #[test]
    fn empty_parse() {
        let g = Grammar::parse("  \n  ");
        assert!(g.start.is_none());
    }

    #[test]
    fn lines_without_an_arrow_are_skipped() {
        let g = Grammar::parse("just a comment\nS -> a");
        assert_eq!(g.non_terminals, vec!["S"]);
    }
}

#[cfg(test)]
mod api_tests {
    use super::*;

    #[test]
    fn empty_grammar_reports_an_error_object() {
        for json in [
            first_follow_to_json(""),
            eliminate_left_recursion_to_json(" \n "),
            left_factor_to_json(""),
            ll1_table_to_json(""),
            simulate_to_json("", "a"),
        ] {
            assert_eq!(json, "{\"error\":\"Grammar has no productions\"}");
        }
    }

    #[test]
    fn left_recursion_pipeline_end_to_end() {
        let json = eliminate_left_recursion_to_json("A -> Aab | c");
        assert!(json.contains("A -> c A'"));
        assert!(json.contains("A' -> a b A' | ε"));
    }

    #[test]
    fn left_factoring_pipeline_end_to_end() {
        let json = left_factor_to_json("S -> iEtS | iEtSeS | a\nE -> b");
        assert!(json.contains("S -> i E t S S' | a"));
        assert!(json.contains("S' -> ε | e S"));
    }

    #[test]
    fn table_pipeline_reports_ll1() {
        let json = ll1_table_to_json(
            "E -> T E'\nE' -> + T E' | ε\nT -> F T'\nT' -> * F T' | ε\nF -> ( E ) | id",
        );
        assert!(json.contains("\"isLL1\":true"));
        assert!(json.contains("E → T E'"));
    }

    #[test]
    fn simulation_pipeline_accepts_expression_input() {
        let json = simulate_to_json(
            "E -> T E'\nE' -> + T E' | ε\nT -> F T'\nT' -> * F T' | ε\nF -> ( E ) | id",
            "id+id*id",
        );
        assert!(json.contains("\"accepted\":true"));
    }
}
