// Command-line interface for richdoc
//
// This binary converts stored rich documents between their representations and renders them
// to PDF. It is a thin shell over the richdoc library: every conversion goes through the
// FormatRegistry, and configuration comes from richdoc-config.
//
// Converting:
//
// The conversion needs a to and from pair. The from can be auto-detected from the file
// extension, while being overwrittable by an explicit --from flag.
// Usage:
//  richdoc <input> --to <format> [--from <format>] [--output <file>]          - Convert (default)
//  richdoc convert <input> --to <format> [--from <format>] [--output <file>]  - Same as above
//  richdoc upgrade <input.html> [--output <file>]   - Rewrite a legacy HTML record as JSON
//  richdoc inspect <input> [--from <format>]        - Print the document tree
//  richdoc --list-formats                           - List available formats
//
// Extra Parameters:
//
// Format-specific parameters can be passed using --extra-<parameter-name> <value>.
// The CLI layer strips the "extra-" prefix and passes the parameters to the format.
// Example:
//  richdoc issue.json --to pdf -o issue.pdf --extra-header header.json --extra-comments comments.json

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use richdoc::formats::pdf::PdfFormat;
use richdoc::{FormatRegistry, SerializedDocument};
use richdoc_config::{Loader, RichdocConfig};
use std::collections::HashMap;
use std::fs;

const SUBCOMMANDS: &[&str] = &["convert", "upgrade", "inspect", "help"];

/// Parse extra-* arguments from command line args
/// Returns (cleaned_args_without_extras, extra_params_map)
///
/// Supports both:
/// - `--extra-<key> <value>` (explicit value)
/// - `--extra-<key>` (boolean flag, defaults to "true")
/// - `--extras-<key>` (alias for `--extra-<key>`)
fn parse_extra_args(args: &[String]) -> (Vec<String>, HashMap<String, String>) {
    let mut cleaned_args = Vec::new();
    let mut extra_params = HashMap::new();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        let key_opt = arg
            .strip_prefix("--extra-")
            .or_else(|| arg.strip_prefix("--extras-"));

        if let Some(key) = key_opt {
            let has_value = args
                .get(i + 1)
                .map(|next| !next.starts_with('-'))
                .unwrap_or(false);

            if has_value {
                extra_params.insert(key.to_string(), args[i + 1].clone());
                i += 2;
            } else {
                extra_params.insert(key.to_string(), "true".to_string());
                i += 1;
            }
            continue;
        }

        cleaned_args.push(arg.clone());
        i += 1;
    }

    (cleaned_args, extra_params)
}

fn build_cli() -> Command {
    Command::new("richdoc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert, upgrade and render rich documents")
        .long_about(
            "richdoc works with documents written in the block editor.\n\n\
            Commands:\n  \
            - convert: Transform between representations (json, html, pdf, treeviz)\n  \
            - upgrade: Rewrite a legacy HTML record as editor JSON\n  \
            - inspect: Print the document tree\n\n\
            Extra Parameters:\n  \
            Use --extra-<name> [value] to pass format-specific options.\n  \
            Boolean flags can omit the value (defaults to 'true').\n\n\
            Examples:\n  \
            richdoc issue.json --to pdf -o issue.pdf          # Render to PDF\n  \
            richdoc old.html --to json                        # Import legacy HTML\n  \
            richdoc inspect issue.json --extra-ast-full       # Tree with inline nodes",
        )
        .arg_required_else_help(true)
        .subcommand_required(false)
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .help("List available formats")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a richdoc.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log debug output to stderr (RUST_LOG still takes precedence)")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert between document formats (default command)")
                .long_about(
                    "Convert documents between representations.\n\n\
                    Supported formats:\n  \
                    - json:    Editor JSON (.json), read and write\n  \
                    - html:    Legacy stored HTML (.html, .htm), read only\n  \
                    - pdf:     Paginated PDF (.pdf), write only\n  \
                    - treeviz: Document tree (.tree), write only\n\n\
                    The source format is auto-detected from the file extension.\n\
                    Output goes to stdout by default; PDF output needs -o.\n\n\
                    PDF parameters:\n  \
                    --extra-header <file.json>     Header band shown on every page\n  \
                    --extra-comments <file.json>   Comment thread appended after the body\n  \
                    --extra-base-url <url>         Base for relative links and images",
                )
                .arg(
                    Arg::new("input")
                        .help("Input file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Source format (auto-detected from file extension if not specified)")
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Target format (required)")
                        .required(true)
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file path (defaults to stdout)")
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("upgrade")
                .about("Rewrite a legacy HTML record as editor JSON")
                .arg(
                    Arg::new("input")
                        .help("HTML file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file path (defaults to stdout)")
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Print the document tree of a stored document")
                .arg(
                    Arg::new("path")
                        .help("Input file path")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("Source format (auto-detected from file extension if not specified)")
                        .value_hint(ValueHint::Other),
                ),
        )
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Parse extra-* arguments before clap processing
    let (cleaned_args, mut extra_params) = parse_extra_args(&args);

    let cli = build_cli();
    let matches = match cli.clone().try_get_matches_from(&cleaned_args) {
        Ok(m) => m,
        Err(e) => {
            // A bare file path means the default convert command
            if cleaned_args.len() > 1
                && !cleaned_args[1].starts_with('-')
                && !SUBCOMMANDS.contains(&cleaned_args[1].as_str())
            {
                let mut new_args = vec![cleaned_args[0].clone(), "convert".to_string()];
                new_args.extend_from_slice(&cleaned_args[1..]);

                match cli.try_get_matches_from(&new_args) {
                    Ok(m) => m,
                    Err(e2) => e2.exit(),
                }
            } else {
                e.exit();
            }
        }
    };

    init_logging(matches.get_flag("verbose"));

    if matches.get_flag("list-formats") {
        handle_list_formats_command();
        return;
    }

    let config = load_cli_config(matches.get_one::<String>("config").map(|s| s.as_str()));
    let config = apply_config_overrides(config, &mut extra_params);

    match matches.subcommand() {
        Some(("convert", sub_matches)) => {
            let input = required(sub_matches, "input");
            let to = required(sub_matches, "to");
            let from = source_format(input, sub_matches.get_one::<String>("from"));
            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            handle_convert_command(input, &from, to, output, &extra_params, &config);
        }
        Some(("upgrade", sub_matches)) => {
            let input = required(sub_matches, "input");
            let output = sub_matches.get_one::<String>("output").map(|s| s.as_str());
            handle_upgrade_command(input, output);
        }
        Some(("inspect", sub_matches)) => {
            let path = required(sub_matches, "path");
            let from = source_format(path, sub_matches.get_one::<String>("from"));
            handle_inspect_command(path, &from, &extra_params);
        }
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    // clap enforces required arguments before we get here
    matches
        .get_one::<String>(name)
        .map(|s| s.as_str())
        .unwrap_or_else(|| {
            eprintln!("Error: missing required argument '{name}'");
            std::process::exit(2);
        })
}

/// The explicit --from, or the format detected from the file extension.
fn source_format(input: &str, explicit: Option<&String>) -> String {
    if let Some(from) = explicit {
        return from.to_string();
    }
    let registry = FormatRegistry::default();
    match registry.detect_format_from_filename(input) {
        Some(detected) => detected,
        None => {
            eprintln!("Error: Could not detect format from filename '{input}'");
            eprintln!("Please specify --from explicitly");
            std::process::exit(1);
        }
    }
}

fn read_input(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{path}': {e}");
        std::process::exit(1);
    })
}

/// Registry whose PDF format renders with the configured page, fonts and images.
fn configured_registry(config: &RichdocConfig) -> FormatRegistry {
    let context = config.render_context().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });
    let mut registry = FormatRegistry::default();
    registry.register(PdfFormat::with_context(context));
    registry
}

/// Handle the convert command
fn handle_convert_command(
    input: &str,
    from: &str,
    to: &str,
    output: Option<&str>,
    extra_params: &HashMap<String, String>,
    config: &RichdocConfig,
) {
    let registry = if to == "pdf" {
        configured_registry(config)
    } else {
        FormatRegistry::default()
    };

    // Validate formats exist
    for name in [from, to] {
        if let Err(e) = registry.get(name) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    let source = read_input(input);
    let doc = registry.parse(&source, from).unwrap_or_else(|e| {
        eprintln!("Parse error: {e}");
        std::process::exit(1);
    });

    let result = registry
        .serialize_with_options(&doc, to, extra_params)
        .unwrap_or_else(|e| {
            eprintln!("Serialization error: {e}");
            std::process::exit(1);
        });

    write_output(output, result);
}

/// Handle the upgrade command
fn handle_upgrade_command(input: &str, output: Option<&str>) {
    let source = read_input(input);
    let json = richdoc::upgrade_html_to_json(&source).unwrap_or_else(|e| {
        eprintln!("Upgrade error: {e}");
        std::process::exit(1);
    });
    log::info!("upgraded '{input}' ({} bytes of JSON)", json.len());

    let text = String::from_utf8(json).unwrap_or_else(|e| {
        eprintln!("Upgrade error: {e}");
        std::process::exit(1);
    });
    write_output(output, SerializedDocument::Text(text));
}

/// Handle the inspect command
fn handle_inspect_command(path: &str, from: &str, extra_params: &HashMap<String, String>) {
    let registry = FormatRegistry::default();
    let source = read_input(path);
    let doc = registry.parse(&source, from).unwrap_or_else(|e| {
        eprintln!("Parse error: {e}");
        std::process::exit(1);
    });

    let result = registry
        .serialize_with_options(&doc, "treeviz", extra_params)
        .unwrap_or_else(|e| {
            eprintln!("Execution error: {e}");
            std::process::exit(1);
        });
    write_output(None, result);
}

fn write_output(output: Option<&str>, result: SerializedDocument) {
    match (output, result) {
        (Some(path), data) => {
            fs::write(path, data.into_bytes()).unwrap_or_else(|e| {
                eprintln!("Error writing file '{path}': {e}");
                std::process::exit(1);
            });
        }
        (None, SerializedDocument::Text(text)) => {
            print!("{text}");
        }
        (None, SerializedDocument::Binary(_)) => {
            eprintln!("Binary formats (like PDF) require an output file. Use -o <path>.");
            std::process::exit(1);
        }
    }
}

/// Handle the list-formats command
fn handle_list_formats_command() {
    let registry = FormatRegistry::default();
    println!("Available formats:\n");
    for name in registry.list_formats() {
        if let Ok(format) = registry.get(&name) {
            let mut modes = Vec::new();
            if format.supports_parsing() {
                modes.push("read");
            }
            if format.supports_serialization() {
                modes.push("write");
            }
            println!(
                "  {name:<8} {:<11} {}",
                modes.join("/"),
                format.description()
            );
        }
    }
}

fn load_cli_config(explicit_path: Option<&str>) -> RichdocConfig {
    let loader = Loader::new().with_optional_file("richdoc.toml");
    let loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

/// Moves configuration-level extras into the config; the rest stay for the format.
fn apply_config_overrides(
    mut config: RichdocConfig,
    extra_params: &mut HashMap<String, String>,
) -> RichdocConfig {
    if let Some(raw) = take_override(extra_params, &["offline"]) {
        config.images.allow_remote = !parse_bool_arg("offline", &raw);
    }
    if let Some(raw) = take_override(extra_params, &["body-size", "font-size"]) {
        config.render.body_font_size = raw.parse().unwrap_or_else(|_| {
            eprintln!("Invalid number '{raw}' for --extra-body-size");
            std::process::exit(1);
        });
    }
    for (key, slot) in [
        ("font-regular", "regular"),
        ("font-bold", "bold"),
        ("font-italic", "italic"),
        ("font-bold-italic", "bold_italic"),
        ("font-monospace", "monospace"),
    ] {
        if let Some(path) = extra_params.remove(key) {
            let fonts = &mut config.render.fonts;
            let target = match slot {
                "regular" => &mut fonts.regular,
                "bold" => &mut fonts.bold,
                "italic" => &mut fonts.italic,
                "bold_italic" => &mut fonts.bold_italic,
                _ => &mut fonts.monospace,
            };
            *target = path;
        }
    }
    config
}

fn take_override(map: &mut HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| map.remove(*key))
}

fn parse_bool_arg(flag: &str, raw: &str) -> bool {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => true,
        "false" | "0" | "no" | "n" => false,
        other => {
            eprintln!("Invalid boolean value '{other}' for --extra-{flag}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_extra_args_empty() {
        let input = args(&["richdoc", "inspect", "doc.json"]);
        let (cleaned, extra) = parse_extra_args(&input);

        assert_eq!(cleaned, input);
        assert!(extra.is_empty());
    }

    #[test]
    fn test_parse_extra_args_mixed_with_regular_args() {
        let input = args(&[
            "richdoc",
            "convert",
            "issue.json",
            "--to",
            "pdf",
            "--extra-header",
            "header.json",
            "-o",
            "issue.pdf",
        ]);
        let (cleaned, extra) = parse_extra_args(&input);

        assert_eq!(
            cleaned,
            args(&["richdoc", "convert", "issue.json", "--to", "pdf", "-o", "issue.pdf"])
        );
        assert_eq!(extra.len(), 1);
        assert_eq!(extra.get("header"), Some(&"header.json".to_string()));
    }

    #[test]
    fn test_parse_extra_args_boolean_flags() {
        let input = args(&[
            "richdoc",
            "inspect",
            "doc.json",
            "--extra-ast-full",
            "--extras-base-url",
            "https://example.com/",
            "--extra-offline",
        ]);
        let (cleaned, extra) = parse_extra_args(&input);

        assert_eq!(cleaned, args(&["richdoc", "inspect", "doc.json"]));
        assert_eq!(extra.len(), 3);
        assert_eq!(extra.get("ast-full"), Some(&"true".to_string()));
        assert_eq!(
            extra.get("base-url"),
            Some(&"https://example.com/".to_string())
        );
        assert_eq!(extra.get("offline"), Some(&"true".to_string()));
    }

    #[test]
    fn apply_config_overrides_consumes_config_keys() {
        let config = load_cli_config(None);
        let mut extras = HashMap::new();
        extras.insert("offline".to_string(), "true".to_string());
        extras.insert("body-size".to_string(), "12".to_string());
        extras.insert("font-monospace".to_string(), "mono.ttf".to_string());
        extras.insert("header".to_string(), "header.json".to_string());

        let config = apply_config_overrides(config, &mut extras);

        assert!(!config.images.allow_remote);
        assert_eq!(config.render.body_font_size, 12.0);
        assert_eq!(config.render.fonts.monospace, "mono.ttf");
        assert_eq!(extras.len(), 1);
        assert!(extras.contains_key("header"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }
}
