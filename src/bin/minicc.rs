//! Command-line interface for minicc
//! Runs the compiler front end over one C source file and prints the stage
//! that was asked for.
//!
//! Usage:
//!   minicc `<path>`            - Print the abstract syntax tree
//!   minicc --tree `<path>`     - Print the pruned parse tree instead
//!   minicc --tokens `<path>`   - Stop after lexing and print the tokens
//!   minicc --json `<path>`     - Emit the selected stage as JSON

use clap::{Arg, ArgAction, Command};
use minicc::c_grammar::c_front;
use minicc::lexer::tokenize;
use std::fs;
use std::process;

fn main() {
    let matches = Command::new("minicc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A small C compiler front end")
        .arg(
            Arg::new("path")
                .help("Path to the C source file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .short('t')
                .help("Stop after lexing and print the token stream")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tree")
                .long("tree")
                .help("Print the pruned parse tree instead of the AST")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Emit the selected stage as JSON")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let path = matches.get_one::<String>("path").unwrap();
    let tokens_only = matches.get_flag("tokens");
    let tree_only = matches.get_flag("tree");
    let json = matches.get_flag("json");

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error: cannot read '{}': {}", path, err);
            process::exit(1);
        }
    };

    let tokens = match tokenize(&source) {
        Ok(tokens) => tokens,
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    };

    if tokens_only {
        if json {
            print_json(&tokens);
        } else {
            for token in &tokens {
                println!("{}:{}\t{}\t{}", token.line, token.column, token.kind, token.text);
            }
        }
        return;
    }

    let front = c_front();
    let tree = match front.parse(&tokens) {
        Ok(tree) => tree,
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    };

    if tree_only {
        // the parse tree has no JSON form; the dump is its one rendering
        print!("{}", tree.dump());
        return;
    }

    match front.lower(&tree) {
        Ok(ast) => {
            if json {
                print_json(&ast);
            } else {
                print!("{}", ast.dump());
            }
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{}", rendered),
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    }
}
