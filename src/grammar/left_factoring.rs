use std::collections::HashSet;

use super::grammar::fresh_prime_name;
use super::pretty_print::{alternatives_text, symbols_text};
use super::{Grammar, Production, Symbol};

fn common_prefix(a: &[Symbol], b: &[Symbol]) -> Production {
    a.iter()
        .zip(b.iter())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.clone())
        .collect()
}

/// Groups alternatives by shared prefix: each unprocessed alternative seeds
/// a group, every later alternative with a non-empty pairwise prefix
/// against the seed joins it, and the group's factor is the intersection
/// of those pairwise prefixes. This transitively merges overlapping
/// alternatives, which is an approximation: with partial, non-nested
/// overlap a member can shrink the factor for the whole group.
fn group_alternatives(alts: &[Production]) -> Vec<(Production, Vec<usize>)> {
    let mut groups: Vec<(Production, Vec<usize>)> = Vec::new();
    let mut processed = vec![false; alts.len()];

    for i in 0..alts.len() {
        if processed[i] {
            continue;
        }
        processed[i] = true;
        let mut members = vec![i];
        let mut prefix: Production = Vec::new();

        for j in i + 1..alts.len() {
            if processed[j] {
                continue;
            }
            let pairwise = common_prefix(&alts[i], &alts[j]);
            if pairwise.is_empty() {
                continue;
            }
            prefix = if members.len() == 1 {
                pairwise
            } else {
                common_prefix(&prefix, &pairwise)
            };
            members.push(j);
            processed[j] = true;
        }

        if members.len() < 2 {
            prefix.clear();
        }
        groups.push((prefix, members));
    }
    groups
}

impl Grammar {
    /// Left-factors every non-terminal in a single top-level pass,
    /// returning the rewritten grammar and a step trace. The pass is not
    /// re-applied to the freshly introduced non-terminals. The receiver is
    /// left untouched.
    pub fn left_factor(&self) -> (Grammar, Vec<String>) {
        let mut steps = vec!["Step 1: Identify common prefixes".to_string()];

        let grouped: Vec<(String, Vec<(Production, Vec<usize>)>)> = self
            .non_terminals
            .iter()
            .map(|name| (name.clone(), group_alternatives(self.productions_of(name))))
            .collect();
        let factorable = |groups: &[(Production, Vec<usize>)]| {
            groups
                .iter()
                .any(|(prefix, members)| !prefix.is_empty() && members.len() >= 2)
        };

        let mut any = false;
        for (name, groups) in &grouped {
            for (prefix, members) in groups {
                if !prefix.is_empty() && members.len() >= 2 {
                    any = true;
                    steps.push(format!(
                        "   {} has common prefix: \"{}\"",
                        name,
                        symbols_text(prefix)
                    ));
                }
            }
        }
        if !any {
            steps.push("   No common prefixes found. Grammar doesn't need left factoring.".into());
            return (self.clone(), steps);
        }

        steps.push("Step 2: Group productions by common prefix".to_string());
        for (name, groups) in &grouped {
            if !factorable(groups) {
                continue;
            }
            steps.push(format!("   {}:", name));
            let alts = self.productions_of(name);
            for (prefix, members) in groups {
                let listed = members
                    .iter()
                    .map(|&i| symbols_text(&alts[i]))
                    .collect::<Vec<_>>()
                    .join(", ");
                if prefix.is_empty() {
                    steps.push(format!("      No prefix: {}", listed));
                } else {
                    steps.push(format!(
                        "      Prefix \"{}\": {}",
                        symbols_text(prefix),
                        listed
                    ));
                }
            }
        }

        steps.push("Step 3: Rewrite productions".to_string());
        let mut out = Grammar::new();
        let mut taken: HashSet<String> = self
            .non_terminals
            .iter()
            .cloned()
            .chain(self.terminals())
            .collect();

        for (name, groups) in &grouped {
            let alts = self.productions_of(name);
            if !factorable(groups) {
                for alt in alts {
                    out.add_production(name, alt.clone());
                }
                steps.push(format!(
                    "   {} -> {} (no change)",
                    name,
                    alternatives_text(alts)
                ));
                continue;
            }

            // One fresh primed non-terminal per factored group; its rows go
            // right after the owner's.
            let mut introduced: Vec<(String, Vec<Production>)> = Vec::new();
            for (prefix, members) in groups {
                if prefix.is_empty() || members.len() < 2 {
                    for &i in members {
                        out.add_production(name, alts[i].clone());
                    }
                    continue;
                }
                let fresh = fresh_prime_name(name, &taken);
                taken.insert(fresh.clone());
                steps.push(format!("   For {}, create new variable: {}", name, fresh));

                let mut factored = prefix.clone();
                factored.push(Symbol::NonTerminal(fresh.clone()));
                out.add_production(name, factored);

                let suffixes = members
                    .iter()
                    .map(|&i| {
                        let suffix = alts[i][prefix.len()..].to_vec();
                        if suffix.is_empty() {
                            vec![Symbol::Epsilon]
                        } else {
                            suffix
                        }
                    })
                    .collect();
                introduced.push((fresh, suffixes));
            }

            steps.push(format!(
                "   {} -> {}",
                name,
                alternatives_text(out.productions_of(name))
            ));
            for (fresh, suffixes) in introduced {
                for suffix in suffixes {
                    out.add_production(&fresh, suffix);
                }
                steps.push(format!(
                    "   {} -> {}",
                    fresh,
                    alternatives_text(out.productions_of(&fresh))
                ));
            }
        }

        steps.push("Step 4: Final factored grammar".to_string());
        steps.push(out.to_text());
        (out, steps)
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
    fn dangling_else_grammar_factors() {
        // S -> iEtS | iEtSeS | a  becomes  S -> iEtSS' | a, S' -> ε | eS
        let g = Grammar::parse("S -> iEtS | iEtSeS | a\nE -> b");
        let (out, _) = g.left_factor();

        assert_eq!(out.non_terminals, vec!["S", "S'", "E"]);
        assert_eq!(alts(&out, "S"), vec!["i E t S S'", "a"]);
        assert_eq!(alts(&out, "S'"), vec!["ε", "e S"]);
        assert_eq!(alts(&out, "E"), vec!["b"]);
    }

    #[test]
    fn prefixes_are_symbols_not_characters() {
        // "id" and "if" share no symbol prefix in token form.
        let g = Grammar::parse("S -> id x | if y");
        let (out, steps) = g.left_factor();
        assert_eq!(alts(&out, "S"), vec!["id x", "if y"]);
        assert!(steps.iter().any(|s| s.contains("No common prefixes")));
    }

    #[test]
    fn exact_prefix_alternative_becomes_epsilon() {
        let g = Grammar::parse("A -> a b | a b c");
        let (out, _) = g.left_factor();
        assert_eq!(alts(&out, "A"), vec!["a b A'"]);
        assert_eq!(alts(&out, "A'"), vec!["ε", "c"]);
    }

    #[test]
    fn multiple_groups_get_their_own_variables() {
        let g = Grammar::parse("A -> a b | a c | d e | d f");
        let (out, _) = g.left_factor();
        assert_eq!(out.non_terminals, vec!["A", "A'", "A'1"]);
        assert_eq!(alts(&out, "A"), vec!["a A'", "d A'1"]);
        assert_eq!(alts(&out, "A'"), vec!["b", "c"]);
        assert_eq!(alts(&out, "A'1"), vec!["e", "f"]);
    }

    #[test]
    fn factoring_is_idempotent() {
        let g = Grammar::parse("S -> iEtS | iEtSeS | a\nE -> b");
        let (once, _) = g.left_factor();
        let (twice, steps) = once.left_factor();

        assert_eq!(once.non_terminals, twice.non_terminals);
        for name in &once.non_terminals {
            assert_eq!(alts(&once, name), alts(&twice, name));
        }
        assert!(steps.iter().any(|s| s.contains("No common prefixes")));
    }
}
