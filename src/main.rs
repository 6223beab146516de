extern crate clap;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use urit::config::templates::TemplateRegistry;
use urit::domain::template::{BuildOptions, CaseInsensitiveFixed, ParseOptions, PathRegexCheck, Template};
use urit::{PathVars, QueryParams};

fn template_arg() -> Arg {
    Arg::new("template")
        .required(true)
        .value_name("TEMPLATE")
        .help("Path template, e.g. /users/{id:[0-9]+}")
}

fn vars_args() -> [Arg; 2] {
    [
        Arg::new("var")
            .short('v')
            .long("var")
            .value_name("NAME=VALUE")
            .action(ArgAction::Append)
            .help("Named path var (repeat a name for further occurrences)"),
        Arg::new("positional")
            .short('p')
            .long("positional")
            .value_name("VALUE")
            .action(ArgAction::Append)
            .conflicts_with("var")
            .help("Positional path var, in order"),
    ]
}

fn cli() -> clap::Command {
    clap::Command::new("urit")
        .about("Match paths against URI templates and build paths from them")
        .subcommand_required(true)
        .subcommand(
            clap::Command::new("parse")
                .about("Parse a template and print its structure")
                .arg(template_arg()),
        )
        .subcommand(
            clap::Command::new("vars")
                .about("List the variables of a template")
                .arg(template_arg()),
        )
        .subcommand(
            clap::Command::new("match")
                .about("Match a path against a template and print the extracted vars")
                .arg(template_arg())
                .arg(Arg::new("path").required(true).value_name("PATH"))
                .arg(
                    Arg::new("case_insensitive")
                        .long("case-insensitive")
                        .action(ArgAction::SetTrue)
                        .help("Match fixed parts regardless of case"),
                ),
        )
        .subcommand(
            clap::Command::new("build")
                .about("Build a path from a template")
                .arg(template_arg())
                .args(vars_args())
                .arg(
                    Arg::new("query")
                        .short('q')
                        .long("query")
                        .value_name("KEY=VALUE")
                        .action(ArgAction::Append)
                        .help("Query param; a bare KEY is emitted without a value"),
                )
                .arg(
                    Arg::new("host")
                        .long("host")
                        .value_name("HOST")
                        .help("Prepended verbatim, e.g. https://example.com"),
                )
                .arg(
                    Arg::new("unsorted")
                        .long("unsorted")
                        .action(ArgAction::SetTrue)
                        .help("Keep query params in the order given"),
                )
                .arg(
                    Arg::new("regex_check")
                        .long("regex-check")
                        .action(ArgAction::SetTrue)
                        .help("Reject values not matching their var pattern"),
                ),
        )
        .subcommand(
            clap::Command::new("resolve")
                .about("Fix the given vars into the template, leaving the rest")
                .arg(template_arg())
                .args(vars_args()),
        )
        .subcommand(
            clap::Command::new("sub")
                .about("Append a template to another")
                .arg(template_arg())
                .arg(Arg::new("addition").required(true).value_name("ADDITION")),
        )
        .subcommand(
            clap::Command::new("route")
                .about("Find the first configured template matching a path")
                .arg(Arg::new("path").required(true).value_name("PATH"))
                .arg(
                    Arg::new("templates")
                        .short('t')
                        .long("templates")
                        .value_name("TEMPLATES")
                        .help("Path to a YAML file containing templates"),
                ),
        )
}

fn split_pair(pair: &str) -> Option<(&str, &str)> {
    pair.split_once('=')
}

fn path_vars(matches: &ArgMatches, template: &Template) -> Result<PathVars> {
    if let Some(values) = matches.get_many::<String>("positional") {
        return Ok(PathVars::from_values(values.map(|v| v.as_str())));
    }
    match matches.get_many::<String>("var") {
        Some(pairs) => {
            let mut named = Vec::new();
            for pair in pairs {
                let (name, value) =
                    split_pair(pair).with_context(|| format!("Expected NAME=VALUE, got '{}'", pair))?;
                named.push((name, value));
            }
            Ok(PathVars::from_pairs(named))
        }
        None => Ok(PathVars::new(template.vars_type())),
    }
}

fn query_params(matches: &ArgMatches) -> Option<QueryParams> {
    let pairs = matches.get_many::<String>("query")?;
    let mut query = QueryParams::new();
    for pair in pairs {
        match split_pair(pair) {
            Some((key, value)) => query.add(key, value),
            None => query.add_bare(pair.as_str()),
        };
    }
    query.sorted(!matches.get_flag("unsorted"));
    Some(query)
}

fn parse_template(matches: &ArgMatches) -> Result<Template> {
    let text = matches
        .get_one::<String>("template")
        .context("Missing template")?;
    Template::parse(text).with_context(|| format!("Invalid template '{}'", text))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(matches: ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("parse", sub)) => {
            let template = parse_template(sub)?;
            print_json(&json!({
                "template": template.original_template(),
                "normalized": template.template(true),
                "parts": template.parts().len(),
                "type": template.vars_type(),
                "vars": template.vars(),
            }))
        }
        Some(("vars", sub)) => print_json(&parse_template(sub)?.vars()),
        Some(("match", sub)) => {
            let text = sub.get_one::<String>("template").context("Missing template")?;
            let path = sub.get_one::<String>("path").context("Missing path")?;
            let mut options = ParseOptions::new();
            if sub.get_flag("case_insensitive") {
                options = options.with_fixed(CaseInsensitiveFixed);
            }
            let template = Template::parse_with(text, options)
                .with_context(|| format!("Invalid template '{}'", text))?;
            match template.matches(path) {
                Some(vars) => print_json(&vars),
                None => bail!("'{}' does not match '{}'", path, template.original_template()),
            }
        }
        Some(("build", sub)) => {
            let template = parse_template(sub)?;
            let vars = path_vars(sub, &template)?;
            let mut options = BuildOptions::new();
            if let Some(host) = sub.get_one::<String>("host") {
                options = options.with_host(host.as_str());
            }
            if let Some(query) = query_params(sub) {
                options = options.with_query(query);
            }
            if sub.get_flag("regex_check") {
                options = options.with_var(PathRegexCheck);
            }
            println!("{}", template.path_from(&vars, &options)?);
            Ok(())
        }
        Some(("resolve", sub)) => {
            let template = parse_template(sub)?;
            let vars = path_vars(sub, &template)?;
            println!("{}", template.resolve_to(&vars).original_template());
            Ok(())
        }
        Some(("sub", sub)) => {
            let template = parse_template(sub)?;
            let addition = sub.get_one::<String>("addition").context("Missing addition")?;
            println!("{}", template.sub(addition)?.original_template());
            Ok(())
        }
        Some(("route", sub)) => {
            let path = sub.get_one::<String>("path").context("Missing path")?;
            let registry = TemplateRegistry::load(sub.get_one::<String>("templates").map(|s| s.as_str()))?;
            match registry.route(path) {
                Some((named, vars)) => print_json(&json!({
                    "name": named.name,
                    "template": named.template.original_template(),
                    "vars": vars,
                })),
                None => bail!("No template matches '{}'", path),
            }
        }
        _ => bail!("Unknown command"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    run(cli().get_matches())
}
