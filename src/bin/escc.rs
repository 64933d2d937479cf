use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Arg, Command};

use esc_parser::diagnostics::{self, Diagnostics};
use esc_parser::source::SourceFile;
use esc_parser::tokenize::hex_case_lint;
use esc_parser::{parse_expression, tokenize, Options};

fn main() {
    // The prototype always speaks ANSI, even into a pipe.
    colored::control::set_override(true);

    let matches = Command::new("escc")
        .version("0.1.0")
        .about("Compiler driver for the esc language")
        .arg(
            Arg::new("file")
                .help("esc source file to compile")
                .required(true)
                .index(1),
        )
        .get_matches();

    let file = matches.get_one::<String>("file").unwrap();
    let path = Path::new(file);
    if !path.exists() {
        diagnostics::fatal(&format!("{}: no such file or directory", path.display()));
    }
    if path.is_dir() {
        diagnostics::fatal(&format!("{}: is a directory", path.display()));
    }
    let path: PathBuf = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::PermissionDenied => diagnostics::fatal(&format!(
            "{}: insufficient permissions to read",
            path.display()
        )),
        Err(err) => diagnostics::fatal(&format!("{}: {err}", path.display())),
    };

    let src = SourceFile::new(path.display().to_string(), text);
    let opts = Options::default();
    let mut diag = Diagnostics::new();

    let tokens = match tokenize(&src, &opts, &mut diag) {
        Ok(tokens) => tokens,
        Err(_) => die(&mut diag),
    };
    hex_case_lint(&tokens, &mut diag);
    let expr = match parse_expression(&src, tokens, &mut diag) {
        Ok(expr) => expr,
        Err(_) => die(&mut diag),
    };

    println!("{expr}");
    print!("{}", expr.lispfmt());

    // Recoverable lexer errors leave a token list behind; they still fail
    // the compile.
    if diag.error_count() > 0 {
        die(&mut diag);
    }
}

fn die(diag: &mut Diagnostics) -> ! {
    let summary = if diag.error_count() == 1 {
        "compilation aborted due to this error.".to_string()
    } else {
        format!("compilation aborted due to {} errors.", diag.error_count())
    };
    diag.info(&summary, &[]);
    process::exit(1);
}
