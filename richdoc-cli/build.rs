use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of the command layout in src/main.rs, reduced to what completions need.
// Build scripts can't access src/ modules, so this is kept in sync by hand.
const FORMATS: &[&str] = &["html", "json", "pdf", "treeviz"];

fn input_arg(name: &'static str) -> Arg {
    Arg::new(name)
        .required(true)
        .index(1)
        .value_hint(ValueHint::FilePath)
}

fn format_arg(name: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_parser(clap::builder::PossibleValuesParser::new(FORMATS))
}

fn output_arg() -> Arg {
    Arg::new("output")
        .long("output")
        .short('o')
        .value_hint(ValueHint::FilePath)
}

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let mut cmd = Command::new("richdoc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert, upgrade and render rich documents")
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("convert")
                .arg(input_arg("input"))
                .arg(format_arg("from"))
                .arg(format_arg("to").required(true))
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("upgrade")
                .arg(input_arg("input"))
                .arg(output_arg()),
        )
        .subcommand(
            Command::new("inspect")
                .arg(input_arg("path"))
                .arg(format_arg("from")),
        );

    generate_to(Bash, &mut cmd, "richdoc", &outdir)?;
    generate_to(Zsh, &mut cmd, "richdoc", &outdir)?;
    generate_to(Fish, &mut cmd, "richdoc", &outdir)?;

    println!("cargo:warning=Shell completions generated in {outdir:?}");

    Ok(())
}
