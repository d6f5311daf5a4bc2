use super::pretty_print::{alternatives_text, symbols_text};
use super::{Grammar, Production, Symbol};

impl Grammar {
    /// Removes direct and indirect left recursion, returning the rewritten
    /// grammar and a human-readable step trace. The receiver is left
    /// untouched.
    ///
    /// Non-terminals are processed in declaration order A1..An: every
    /// Ai-alternative starting with an earlier Aj is first expanded with
    /// Aj's alternatives, then direct recursion on Ai is rewritten through
    /// a fresh primed non-terminal. New non-terminals are appended after
    /// the original ones and are not re-processed.
    pub fn eliminate_left_recursion(&self) -> (Grammar, Vec<String>) {
        let mut g = self.clone();
        let mut steps = vec![
            "Step 1: Parse the input grammar".to_string(),
            format!("Original grammar:\n{}", g.to_text()),
            "Step 2: Eliminate indirect left recursion by substitution".to_string(),
        ];

        let order = g.non_terminals.clone();
        for i in 0..order.len() {
            let ai = order[i].clone();

            for aj in &order[..i] {
                let aj_alts = g.productions_of(aj).to_vec();
                let mut substituted = false;
                let mut new_alts: Vec<Production> = Vec::new();

                for alt in g.productions_of(&ai).to_vec() {
                    let starts_with_aj =
                        matches!(alt.first(), Some(Symbol::NonTerminal(h)) if h == aj);
                    if !starts_with_aj {
                        new_alts.push(alt);
                        continue;
                    }
                    substituted = true;
                    steps.push(format!(
                        "   Substituting {} in {} -> {}",
                        aj,
                        ai,
                        symbols_text(&alt)
                    ));
                    let remainder = &alt[1..];
                    for delta in &aj_alts {
                        let mut expanded: Production =
                            if delta.as_slice() == [Symbol::Epsilon] {
                                Vec::new()
                            } else {
                                delta.clone()
                            };
                        expanded.extend_from_slice(remainder);
                        if expanded.is_empty() {
                            expanded.push(Symbol::Epsilon);
                        }
                        new_alts.push(expanded);
                    }
                }

                if substituted {
                    g.productions.insert(ai.clone(), new_alts);
                    steps.push(format!(
                        "   After substitution: {} -> {}",
                        ai,
                        alternatives_text(g.productions_of(&ai))
                    ));
                }
            }

            // Partition into recursive (Ai alpha) and non-recursive (beta)
            // alternatives. An alternative that is exactly Ai has no alpha
            // and contributes nothing.
            let mut alphas: Vec<Production> = Vec::new();
            let mut betas: Vec<Production> = Vec::new();
            for alt in g.productions_of(&ai) {
                let recursive =
                    matches!(alt.first(), Some(Symbol::NonTerminal(h)) if *h == ai);
                if recursive {
                    if alt.len() > 1 {
                        alphas.push(alt[1..].to_vec());
                    }
                } else {
                    betas.push(alt.clone());
                }
            }
            if alphas.is_empty() {
                continue;
            }

            steps.push(format!(
                "Step 3: Eliminate direct left recursion for {}",
                ai
            ));
            let prime = g.fresh_prime_name(&ai);
            steps.push(format!("   Creating new non-terminal: {}", prime));

            let mut ai_alts: Vec<Production> = Vec::new();
            for beta in &betas {
                if beta.as_slice() == [Symbol::Epsilon] {
                    // An epsilon beta contributes just the prime, never εA'.
                    ai_alts.push(vec![Symbol::NonTerminal(prime.clone())]);
                } else {
                    let mut alt = beta.clone();
                    alt.push(Symbol::NonTerminal(prime.clone()));
                    ai_alts.push(alt);
                }
            }
            if betas.is_empty() {
                ai_alts.push(vec![Symbol::NonTerminal(prime.clone())]);
            }

            let mut prime_alts: Vec<Production> = Vec::new();
            for alpha in alphas {
                let mut alt = alpha;
                alt.push(Symbol::NonTerminal(prime.clone()));
                prime_alts.push(alt);
            }
            prime_alts.push(vec![Symbol::Epsilon]);

            g.productions.insert(ai.clone(), ai_alts);
            g.add_non_terminal(&prime);
            g.productions.insert(prime.clone(), prime_alts);

            steps.push(format!(
                "   {} -> {}",
                ai,
                alternatives_text(g.productions_of(&ai))
            ));
            steps.push(format!(
                "   {} -> {}",
                prime,
                alternatives_text(g.productions_of(&prime))
            ));
        }

        steps.push("Step 4: Final grammar without left recursion".to_string());
        steps.push(g.to_text());
        (g, steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alts(g: &Grammar, name: &str) -> Vec<String> {
        g.productions_of(name)
            .iter()
            .map(|p| symbols_text(p))
            .collect()
    }

    #[test]
    fn direct_recursion_is_rewritten() {
        // A -> Aab | c  becomes  A -> cA', A' -> abA' | ε
        let g = Grammar::parse("A -> Aab | c");
        let (out, steps) = g.eliminate_left_recursion();

        assert_eq!(out.non_terminals, vec!["A", "A'"]);
        assert_eq!(alts(&out, "A"), vec!["c A'"]);
        assert_eq!(alts(&out, "A'"), vec!["a b A'", "ε"]);
        assert!(steps.iter().any(|s| s.contains("Creating new non-terminal: A'")));
    }

    #[test]
    fn indirect_recursion_is_substituted_first() {
        let g = Grammar::parse("S -> Aa | bB\nA -> Ac | Sd | ε\nB -> e | f");
        let (out, _) = g.eliminate_left_recursion();

        assert_eq!(alts(&out, "S"), vec!["A a", "b B"]);
        assert_eq!(alts(&out, "A"), vec!["b B d A'", "A'"]);
        assert_eq!(alts(&out, "A'"), vec!["c A'", "a d A'", "ε"]);
        assert_eq!(alts(&out, "B"), vec!["e", "f"]);
    }

    #[test]
    fn no_production_starts_with_its_own_left_side() {
        let g = Grammar::parse("E -> E + T | T\nT -> T * F | F\nF -> ( E ) | id");
        let (out, _) = g.eliminate_left_recursion();

        for (left, production) in out.production_iter() {
            let direct =
                matches!(production.first(), Some(Symbol::NonTerminal(h)) if h == left);
            assert!(!direct, "{} still left-recursive", left);
        }
    }

    #[test]
    fn non_recursive_grammars_pass_through() {
        let g = Grammar::parse("S -> a S | b");
        let (out, _) = g.eliminate_left_recursion();
        assert_eq!(out.non_terminals, vec!["S"]);
        assert_eq!(alts(&out, "S"), vec!["a S", "b"]);
    }

    #[test]
    fn the_input_grammar_is_not_mutated() {
        let g = Grammar::parse("A -> Aa | b");
        let before = alts(&g, "A");
        let _ = g.eliminate_left_recursion();
        assert_eq!(alts(&g, "A"), before);
    }
}
