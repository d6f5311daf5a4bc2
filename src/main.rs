pub mod grammar;
use std::{fs, io::BufRead};

pub use grammar::Grammar;

fn print_help() {
    println!("Usage: ll1-workbench [actions] outputs [options] [grammar file]");
    println!("actions:");
    println!("  elf: Eliminate left recursion");
    println!("  lf: Left factor");
    println!("outputs:");
    println!("  prod: Productions");
    println!("  ff: First and follow sets");
    println!("  ll1: LL(1) parsing table");
    println!("  sim: Parse an input string (requires -i)");
    println!("options:");
    println!("  -h: Print this help");
    println!("  -l: Print in LaTeX format");
    println!("  -j: Print in JSON format");
    println!("  -i <input>: Input string for sim");
}

fn main() {
    let mut actions: Vec<&str> = Vec::new();
    let mut outputs: Vec<&str> = Vec::new();
    let args = std::env::args().skip(1).collect::<Vec<String>>();
    let mut i: usize = 0;
    while i < args.len() && ["elf", "lf"].contains(&args[i].as_str()) {
        actions.push(args[i].as_str());
        i += 1;
    }
    while i < args.len() && ["prod", "ff", "ll1", "sim"].contains(&args[i].as_str()) {
        outputs.push(args[i].as_str());
        i += 1;
    }

    enum OutputFormat {
        Plain,
        LaTeX,
        JSON,
    }
    let mut output_format = OutputFormat::Plain;
    let mut sim_input: Option<String> = None;

    while i < args.len() && ["-h", "--help", "-l", "-j", "-i"].contains(&args[i].as_str()) {
        if args[i] == "-h" || args[i] == "--help" {
            print_help();
            return;
        } else if args[i] == "-l" {
            output_format = OutputFormat::LaTeX;
        } else if args[i] == "-j" {
            output_format = OutputFormat::JSON;
        } else if args[i] == "-i" {
            if i + 1 >= args.len() {
                print_help();
                return;
            }
            sim_input = Some(args[i + 1].clone());
            i += 1;
        }
        i += 1;
    }

    if i + 1 < args.len() || outputs.is_empty() {
        print_help();
        return;
    }
    if outputs.contains(&"sim") && sim_input.is_none() {
        print_help();
        return;
    }

    let input: String = if i == args.len() {
        std::io::stdin()
            .lock()
            .lines()
            .map(|l| l.unwrap())
            .collect::<Vec<String>>()
            .join("\n")
    } else {
        fs::read_to_string(args[i].as_str()).expect("Failed to read file")
    };

    let mut g = Grammar::parse(&input);
    if g.start.is_none() {
        eprintln!("Grammar has no productions");
        return;
    }

    for action in actions {
        if action == "elf" {
            g = g.eliminate_left_recursion().0;
        }
        if action == "lf" {
            g = g.left_factor().0;
        }
    }

    for output in outputs {
        if output == "prod" {
            let t = g.to_production_output_vec();
            println!(
                "{}",
                match output_format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::LaTeX => t.to_latex(),
                    OutputFormat::JSON => t.to_json(),
                }
            );
        }
        if output == "ff" {
            let sets = g.first_follow();
            let t = g.to_first_follow_output(&sets);
            println!(
                "{}",
                match output_format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::LaTeX => t.to_latex(),
                    OutputFormat::JSON => t.to_json(),
                }
            );
        }
        if output == "ll1" {
            let t = g.ll1_table();
            println!(
                "{}",
                match output_format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::LaTeX => t.to_latex(),
                    OutputFormat::JSON => t.to_json(),
                }
            );
        }
        if output == "sim" {
            let table = g.ll1_table();
            let word = sim_input.as_deref().unwrap_or_default();
            let t = g.simulate(&table, word);
            println!(
                "{}",
                match output_format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::LaTeX => t.to_latex(),
                    OutputFormat::JSON => t.to_json(),
                }
            );
        }
    }
}
