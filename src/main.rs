use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use feedsite::build::build_site;
use feedsite::config::Config;
use feedsite::render::{RenderRequest, Renderer};
use feedsite::select::{Category, Limit};
use feedsite::source;
use feedsite::theme::{Theme, DEFAULT_FALLBACK_IMAGE};
use std::error::Error;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = App::new("feedsite")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a static site and renders its content feeds")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site described by the nearest feedsite.yaml")
                .arg(
                    Arg::with_name("project")
                        .long("project")
                        .value_name("DIR")
                        .takes_value(true)
                        .default_value(".")
                        .help("Directory to start searching for feedsite.yaml"),
                )
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .value_name("DIR")
                        .takes_value(true)
                        .default_value("./_output")
                        .help("Output directory (deleted and recreated)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("render")
                .about("Renders a single feed and prints the markup")
                .arg(
                    Arg::with_name("manifest")
                        .long("manifest")
                        .value_name("PATH_OR_URL")
                        .takes_value(true)
                        .required(true)
                        .help("Manifest file or http(s) URL"),
                )
                .arg(
                    Arg::with_name("category")
                        .long("category")
                        .value_name("CATEGORY")
                        .takes_value(true)
                        .default_value("all")
                        .help("`all`, a category, or a comma-separated list of categories"),
                )
                .arg(
                    Arg::with_name("limit")
                        .long("limit")
                        .value_name("N")
                        .takes_value(true)
                        .help("Maximum number of cards (positive)"),
                )
                .arg(
                    Arg::with_name("theme")
                        .long("theme")
                        .value_name("DIR")
                        .takes_value(true)
                        .help("Directory with template overrides"),
                )
                .arg(
                    Arg::with_name("fallback-image")
                        .long("fallback-image")
                        .value_name("URL")
                        .takes_value(true)
                        .default_value(DEFAULT_FALLBACK_IMAGE)
                        .help("Image shown when a card image fails to load"),
                )
                .arg(
                    Arg::with_name("strict")
                        .long("strict")
                        .help("Fail on the first malformed manifest entry"),
                ),
        )
        .get_matches();

    let result = match matches.subcommand() {
        ("build", Some(m)) => build(m),
        ("render", Some(m)) => render(m),
        _ => Ok(()),
    };
    if let Err(err) = result {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn build(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let project = Path::new(matches.value_of("project").unwrap_or("."));
    let output = Path::new(matches.value_of("output").unwrap_or("./_output"));
    let config = Config::from_directory(&project.canonicalize()?, output)?;
    build_site(&config)?;
    Ok(())
}

fn render(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let category: Category = matches.value_of("category").unwrap_or("all").parse()?;
    let limit = match matches.value_of("limit") {
        Some(limit) => limit.parse::<Limit>()?,
        None => Limit::UNBOUNDED,
    };
    let theme = Theme::load(
        matches.value_of("theme").map(Path::new),
        matches.value_of("fallback-image").unwrap_or(DEFAULT_FALLBACK_IMAGE),
    )?;
    let source = source::resolve(matches.value_of("manifest").unwrap_or_default(), Path::new("."));
    let renderer = Renderer {
        source: source.as_ref(),
        theme: &theme,
        strict: matches.is_present("strict"),
    };

    let mut markup = String::new();
    let result = renderer.render(&mut markup, &RenderRequest::new(category, limit));
    println!("{}", markup);
    result?;
    Ok(())
}
