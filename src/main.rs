//! mforge – command-line email HTML renderer.
//!
//! Usage:
//!   mforge <input.html> [output.html] [--pretty] [--text] [--tailwind-config <path>] [--global-styles <file.css>]
//!
//! If `output.html` is omitted the result is written next to the input file
//! with an `.out.html` extension (e.g. `welcome.html` → `welcome.out.html`).
//! With `--text` a plain-text alternative is written alongside as `.out.txt`.

use std::{env, fs, path::PathBuf, process};

use mail_forge::pipeline::{render_document, RenderOptions, RenderOutput};
use mail_forge::tailwind::TailwindConfig;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut pretty = false;
    let mut plain_text = false;
    let mut tailwind_config: Option<String> = None;
    let mut global_styles_path: Option<String> = None;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1).peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--pretty" | "-p" => pretty = true,
            "--text" | "-t" => plain_text = true,
            "--tailwind-config" => match iter.next() {
                Some(v) => tailwind_config = Some(v.clone()),
                None => {
                    eprintln!("--tailwind-config requires a path");
                    process::exit(1);
                }
            },
            "--global-styles" => match iter.next() {
                Some(v) => global_styles_path = Some(v.clone()),
                None => {
                    eprintln!("--global-styles requires a path");
                    process::exit(1);
                }
            },
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                positional += 1;
            }
        }
    }

    let input = match input_path {
        Some(p) => p,
        None => {
            eprintln!("Error: no input file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    // Default output: same directory + same stem as input, with .out.html
    let output = output_path.unwrap_or_else(|| input.with_extension("out.html"));

    let html = match fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", input.display());
            process::exit(1);
        }
    };

    let global_styles = match global_styles_path {
        Some(path) => match fs::read_to_string(&path) {
            Ok(css) => Some(css),
            Err(e) => {
                eprintln!("Error reading '{path}': {e}");
                process::exit(1);
            }
        },
        None => None,
    };

    let options = RenderOptions {
        pretty,
        plain_text,
        tailwind_config: tailwind_config.map(TailwindConfig::Path),
        global_styles,
        ..RenderOptions::default()
    };

    match render_document(&html, &options) {
        RenderOutput::Html(rendered) => {
            write_or_die(&output, &rendered);
            eprintln!("Wrote '{}' ({} bytes)", output.display(), rendered.len());
        }
        RenderOutput::WithText { html, text } => {
            write_or_die(&output, &html);
            let text_output = output.with_extension("txt");
            write_or_die(&text_output, &text);
            eprintln!(
                "Wrote '{}' ({} bytes) and '{}' ({} bytes)",
                output.display(),
                html.len(),
                text_output.display(),
                text.len()
            );
        }
    }
}

fn write_or_die(path: &PathBuf, contents: &str) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating output directory: {e}");
                process::exit(1);
            }
        }
    }
    if let Err(e) = fs::write(path, contents) {
        eprintln!("Error writing '{}': {e}", path.display());
        process::exit(1);
    }
}

fn print_usage(prog: &str) {
    eprintln!("mforge – email HTML renderer (mail-forge)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <input.html> [output.html] [--pretty] [--text] [--tailwind-config <path>] [--global-styles <file.css>]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <input.html>        Rendered email markup to process");
    eprintln!("  [output.html]       Output path (default: input stem with .out.html)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --pretty, -p        Reformat output with one tag per line");
    eprintln!("  --text, -t          Also write a plain-text alternative (.txt)");
    eprintln!("  --tailwind-config   JSON theme config enabling utility-CSS generation");
    eprintln!("  --global-styles     CSS file merged in ahead of generated styles");
    eprintln!("  --help              Print this message");
}
