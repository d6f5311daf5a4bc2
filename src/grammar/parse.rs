use super::{Grammar, Production, Symbol};

/// Splits a line at the first `->` or `→`.
fn split_arrow(line: &str) -> Option<(&str, &str)> {
    let ascii = line.find("->").map(|i| (i, 2));
    let unicode = line.find('→').map(|i| (i, '→'.len_utf8()));
    let (at, len) = match (ascii, unicode) {
        (Some(a), Some(u)) => {
            if a.0 <= u.0 {
                a
            } else {
                u
            }
        }
        (Some(a), None) => a,
        (None, Some(u)) => u,
        (None, None) => return None,
    };
    Some((&line[..at], &line[at + len..]))
}

fn is_epsilon_name(text: &str) -> bool {
    matches!(text, "ε" | "epsilon" | "#")
}

impl Grammar {
    /// Parses grammar text, one non-terminal per line:
    /// `NT -> alt1 | alt2 | ...` with `->` or `→` as the arrow and `ε`,
    /// `epsilon` or `#` as the empty alternative. Lines without an arrow
    /// are dropped without comment; right-hand-side names that never
    /// appear on a left-hand side become terminals.
    ///
    /// Alternatives are whitespace-separated symbol sequences when any
    /// alternative in the grammar contains whitespace, and concatenated
    /// single-character symbols otherwise (with longest-match recognition
    /// of non-terminal names such as `A'`, and digit runs collapsed into
    /// one terminal).
    pub fn parse(text: &str) -> Self {
        let mut g = Grammar::new();
        let mut raw: Vec<(String, Vec<String>)> = Vec::new();

        for line in text.lines() {
            let Some((left, right)) = split_arrow(line) else {
                continue;
            };
            let left = left.trim();
            if left.is_empty() {
                continue;
            }
            g.add_non_terminal(left);
            raw.push((
                left.to_string(),
                right.split('|').map(|alt| alt.trim().to_string()).collect(),
            ));
        }

        let spaced = raw
            .iter()
            .flat_map(|(_, alts)| alts.iter())
            .any(|alt| alt.contains(char::is_whitespace));
        let mut names: Vec<String> = g.non_terminals.clone();
        names.sort_by_key(|name| std::cmp::Reverse(name.len()));

        for (left, alts) in raw {
            for alt in alts {
                let production = if spaced {
                    tokenize_spaced(&alt, &g)
                } else {
                    tokenize_concatenated(&alt, &g, &names)
                };
                if !production.is_empty() {
                    g.add_production(&left, production);
                }
            }
        }

        g
    }

    /// Splits an input sentence into terminal tokens for simulation.
    /// Whitespace separates tokens when present; otherwise terminals are
    /// longest-matched (so `id+id*id` yields `id + id * id`), digit runs
    /// collapse into one token, and anything else is a single character.
    pub fn split_input(&self, input: &str) -> Vec<Symbol> {
        let input = input.trim();
        if input.is_empty() {
            return Vec::new();
        }
        if input.contains(char::is_whitespace) {
            return input
                .split_whitespace()
                .map(|token| match token {
                    super::END_MARK => Symbol::End,
                    _ => Symbol::Terminal(token.to_string()),
                })
                .collect();
        }

        let mut names = self.terminals();
        names.sort_by_key(|name| std::cmp::Reverse(name.len()));

        let mut tokens = Vec::new();
        let mut rest = input;
        'outer: while let Some(c) = rest.chars().next() {
            if c.is_whitespace() {
                rest = &rest[c.len_utf8()..];
                continue;
            }
            for name in &names {
                if rest.starts_with(name.as_str()) {
                    tokens.push(Symbol::Terminal(name.clone()));
                    rest = &rest[name.len()..];
                    continue 'outer;
                }
            }
            if c.is_ascii_digit() {
                let end = rest
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(rest.len());
                tokens.push(Symbol::Terminal(rest[..end].to_string()));
                rest = &rest[end..];
            } else {
                if c == '$' {
                    tokens.push(Symbol::End);
                } else {
                    tokens.push(Symbol::Terminal(c.to_string()));
                }
                rest = &rest[c.len_utf8()..];
            }
        }
        tokens
    }
}

fn tokenize_spaced(alt: &str, g: &Grammar) -> Production {
    if is_epsilon_name(alt) {
        return vec![Symbol::Epsilon];
    }
    alt.split_whitespace()
        .map(|token| {
            if is_epsilon_name(token) {
                Symbol::Epsilon
            } else if token == super::END_MARK {
                Symbol::End
            } else if g.is_non_terminal(token) {
                Symbol::NonTerminal(token.to_string())
            } else {
                Symbol::Terminal(token.to_string())
            }
        })
        .collect()
}

/// Character-walking tokenizer for grammars written without separators.
/// Non-terminal names are tried longest first so that primed names like
/// `A'` win over the bare `A`.
fn tokenize_concatenated(alt: &str, g: &Grammar, names_by_len: &[String]) -> Production {
    if is_epsilon_name(alt) {
        return vec![Symbol::Epsilon];
    }

    let mut production = Vec::new();
    let mut rest = alt;
    'outer: while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }
        for name in names_by_len {
            if rest.starts_with(name.as_str()) {
                production.push(Symbol::NonTerminal(name.clone()));
                rest = &rest[name.len()..];
                continue 'outer;
            }
        }
        if c.is_ascii_digit() {
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            production.push(Symbol::Terminal(rest[..end].to_string()));
            rest = &rest[end..];
        } else {
            match c {
                'ε' => production.push(Symbol::Epsilon),
                '$' => production.push(Symbol::End),
                _ => production.push(Symbol::Terminal(c.to_string())),
            }
            rest = &rest[c.len_utf8()..];
        }
    }
    production
}
