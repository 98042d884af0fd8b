mod context;
mod test_runner;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use htm::{HtmlError, MergePolicy};
use tagstr::{Template, ValueMap};

const SUBCOMMANDS: &[&str] = &["render", "test", "help"];

#[derive(Parser)]
#[command(name = "htm", version, about = "Render HTML templates with interpolations")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log builder and resolver activity (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a template file to HTML
    Render(RenderArgs),

    /// Run .test.md fixtures
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Template file using `{name}` interpolations
    file: String,

    /// TOML file providing template variables
    #[arg(short, long)]
    context: Option<String>,

    /// Set a variable, e.g. `--set name=World`. Repeatable.
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Build the tree only, don't resolve (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Dump the unresolved tree
    #[arg(long)]
    ast: bool,

    /// Dump the resolved node instead of HTML
    #[arg(long)]
    dom: bool,

    /// Let call-site attributes override those of a substituted component
    #[arg(long)]
    call_site_wins: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or a directory containing them
    path: String,

    /// Run only these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `htm page.html` is shorthand for `htm render page.html`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().skip(1).position(|a| !a.starts_with('-')).map(|p| p + 1)
        && !SUBCOMMANDS.contains(&args[pos].as_str())
    {
        args.insert(pos, "render".to_string());
    }

    let cli = Cli::parse_from(&args);
    init_tracing(cli.verbose);

    match cli.command {
        Command::Render(render_args) => do_render(render_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn do_render(args: RenderArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    let vars = match build_context(&args) {
        Ok(vars) => vars,
        Err(message) => {
            eprintln!("error: {}", message);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    // A trailing newline would otherwise become a sibling text node.
    let body = source.trim_end().to_string();
    let parser = tagstr::parser::Parser::new(body, file_id);
    let template = match parser.parse(&vars) {
        Ok(template) => template,
        Err(errors) => {
            for error in &errors {
                let diagnostic = error.to_diagnostic();
                let _ =
                    term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            }
            process::exit(1);
        }
    };

    if args.check || args.ast {
        match htm::parse(template.items()) {
            Ok(ast) if args.ast => print!("{}", ast),
            Ok(_) => eprintln!("ok: {} parsed successfully", args.file),
            Err(error) => {
                emit_html_error(&writer, &config, &files, file_id, &template, &error);
                process::exit(1);
            }
        }
        return;
    }

    let merge_policy = if args.call_site_wins {
        MergePolicy::CallSiteWins
    } else {
        MergePolicy::NodeWins
    };
    match htm::html_template_with(&template, merge_policy) {
        Ok(node) if args.dom => println!("{:#?}", node),
        Ok(node) => println!("{}", node),
        Err(error) => {
            emit_html_error(&writer, &config, &files, file_id, &template, &error);
            process::exit(1);
        }
    }
}

fn build_context(args: &RenderArgs) -> Result<ValueMap, String> {
    let mut vars = match &args.context {
        Some(path) => context::load(Path::new(path))?,
        None => ValueMap::new(),
    };
    for assignment in &args.set {
        let (key, value) = context::parse_assignment(assignment)?;
        vars.insert(key, value);
    }
    Ok(vars)
}

/// Structural errors point at the template item they occurred in; the rest
/// are reported without a location.
fn emit_html_error(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    file_id: usize,
    template: &Template,
    error: &HtmlError,
) {
    match error.item().and_then(|item| template.span(item)) {
        Some(span) => {
            let diagnostic = Diagnostic::error()
                .with_message(error.to_string())
                .with_labels(vec![Label::primary(file_id, span)]);
            let _ = term::emit_to_write_style(&mut writer.lock(), config, files, &diagnostic);
        }
        None => eprintln!("error: {}", error),
    }
}
