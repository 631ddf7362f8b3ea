// Command-line interface for mdpress
//
// This binary renders Markdown files into HTML that can be pasted into the editors of
// publishing platforms (WeChat official accounts, Zhihu, Twitter/X) or previewed locally.
// The rendering itself lives in mdpress-core; this crate only resolves configuration,
// reads input and writes output.
//
// Usage:
//  mdpress <input> [--platform <key>] [--output <file>]          - Render a file (default)
//  mdpress convert <input> [--platform <key>] [--output <file>]  - Same as above (explicit)
//  mdpress settings [--platform <key>]                           - Print the effective settings
//  mdpress --list-platforms                                      - List platform adapters
//  mdpress --list-plugins                                        - List extensions and plugins
//
// An input of "-" reads Markdown from stdin.
//
// Extra Parameters:
//
// Settings can be overridden with --extra-<setting> <value>. Dashes become underscores, so
// --extra-line-number maps to the `line_number` setting. A dotted key addresses one
// component's config slice instead:
//  mdpress post.md --extra-link-footnote-mode all --extra-styles.max-font-size 32

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use mdpress_config::{Loader, PressConfig};
use mdpress_core::{AdapterRegistry, Publisher};
use std::fs;
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

const SUBCOMMANDS: &[&str] = &["convert", "settings", "help"];

/// One `--extra-*` argument, already mapped onto the configuration it changes
#[derive(Debug, Clone, PartialEq, Eq)]
enum ExtraOverride {
    /// `--extra-line-number` sets `Settings::line_number`
    Setting { field: String, value: String },
    /// `--extra-styles.max-font-size 32` sets option `max_font_size` of the `styles` plugin
    PluginOption {
        plugin: String,
        key: String,
        value: String,
    },
}

impl ExtraOverride {
    fn parse(name: &str, value: String) -> Self {
        match name.split_once('.') {
            Some((plugin, key)) => ExtraOverride::PluginOption {
                plugin: plugin.to_string(),
                key: key.replace('-', "_"),
                value,
            },
            None => ExtraOverride::Setting {
                field: name.replace('-', "_"),
                value,
            },
        }
    }

    fn apply(self, loader: Loader) -> Loader {
        match self {
            ExtraOverride::Setting { field, value } => loader.set_setting(&field, value),
            ExtraOverride::PluginOption { plugin, key, value } => {
                loader.set_plugin_option(&plugin, &key, value)
            }
        }
    }
}

/// Pull `--extra-<key> [value]` (alias `--extras-`) out of the arguments clap will see.
/// A missing value, or one that looks like a flag, means "true".
fn split_extra_args(args: &[String]) -> (Vec<String>, Vec<ExtraOverride>) {
    let mut cleaned = Vec::new();
    let mut overrides = Vec::new();
    let mut args = args.iter().peekable();
    while let Some(arg) = args.next() {
        let Some(name) = arg
            .strip_prefix("--extra-")
            .or_else(|| arg.strip_prefix("--extras-"))
        else {
            cleaned.push(arg.clone());
            continue;
        };
        let value = args
            .next_if(|next| !next.starts_with('-'))
            .cloned()
            .unwrap_or_else(|| "true".to_string());
        overrides.push(ExtraOverride::parse(name, value));
    }
    (cleaned, overrides)
}

fn build_cli() -> Command {
    Command::new("mdpress")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Render Markdown into HTML for publishing platforms")
        .long_about(
            "mdpress renders Markdown into HTML that survives being pasted into the\n\
            rich-text editors of publishing platforms.\n\n\
            Commands:\n  \
            - convert:  Render a Markdown file for a platform (default)\n  \
            - settings: Print the effective settings as JSON\n\n\
            Extra Parameters:\n  \
            Use --extra-<setting> [value] to override a setting for one run.\n  \
            Boolean flags can omit the value (defaults to 'true').\n  \
            Dotted keys address a plugin: --extra-styles.max-font-size 32\n\n\
            Examples:\n  \
            mdpress post.md                           # Render for the configured platform\n  \
            mdpress post.md --platform zhihu          # Render for Zhihu\n  \
            mdpress post.md -o post.html              # Write to a file\n  \
            mdpress post.md --extra-line-number       # Number code block lines",
        )
        .arg_required_else_help(true)
        .subcommand_required(false)
        .arg(
            Arg::new("list-platforms")
                .long("list-platforms")
                .help("List available platform adapters")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("list-plugins")
                .long("list-plugins")
                .help("List extensions and process plugins with their config as JSON")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a mdpress.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("convert")
                .about("Render a Markdown file for a platform (default command)")
                .long_about(
                    "Render Markdown into platform HTML.\n\n\
                    The platform defaults to the `render.platform` configuration value.\n\
                    Output goes to stdout by default, or use -o to specify a file.\n\n\
                    Examples:\n  \
                    mdpress convert post.md --platform wechat   # WeChat HTML (stdout)\n  \
                    cat post.md | mdpress convert -             # Read from stdin\n  \
                    mdpress post.md --platform preview          # 'convert' is optional",
                )
                .arg(
                    Arg::new("input")
                        .help("Input Markdown file, or '-' for stdin")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("platform")
                        .long("platform")
                        .short('p')
                        .help("Target platform (see --list-platforms)")
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
            Command::new("settings")
                .about("Print the effective settings as JSON")
                .long_about(
                    "Print the settings that a render would use, after layering the\n\
                    built-in defaults, mdpress.toml, --config, the platform profile and\n\
                    --extra-* overrides. The output can be fed to editor integrations as-is.",
                )
                .arg(
                    Arg::new("platform")
                        .long("platform")
                        .short('p')
                        .help("Platform whose [platforms.<key>] profile applies")
                        .value_hint(ValueHint::Other),
                ),
        )
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Parse extra-* arguments before clap processing
    let (cleaned_args, extra_overrides) = split_extra_args(&args);

    let cli = build_cli();
    let matches = match cli.clone().try_get_matches_from(&cleaned_args) {
        Ok(m) => m,
        Err(e) => {
            // A leading input file (or "-" for stdin) without a subcommand: inject "convert"
            let first = cleaned_args.get(1).map(String::as_str).unwrap_or_default();
            let is_input = first == "-"
                || (!first.is_empty() && !first.starts_with('-') && !SUBCOMMANDS.contains(&first));
            if is_input {
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

    init_tracing(matches.get_count("verbose"));

    let platform_override = matches
        .subcommand()
        .and_then(|(_, sub)| sub.try_get_one::<String>("platform").ok().flatten())
        .map(String::as_str);
    let config = load_cli_config(
        matches.get_one::<String>("config").map(|s| s.as_str()),
        platform_override,
        extra_overrides,
    );

    if matches.get_flag("list-platforms") {
        handle_list_platforms_command();
        return;
    }
    if matches.get_flag("list-plugins") {
        handle_list_plugins_command(&config);
        return;
    }

    match matches.subcommand() {
        Some(("convert", sub_matches)) => handle_convert_command(sub_matches, &config),
        Some(("settings", _)) => handle_settings_command(&config),
        _ => {
            let _ = build_cli().print_help();
            std::process::exit(1);
        }
    }
}

fn load_cli_config(
    explicit_path: Option<&str>,
    platform: Option<&str>,
    overrides: Vec<ExtraOverride>,
) -> PressConfig {
    let mut loader = Loader::new().with_optional_file("mdpress.toml");
    if let Some(path) = explicit_path {
        loader = loader.with_file(path);
    }
    if let Some(platform) = platform {
        loader = loader.for_platform(platform);
    }
    let loader = overrides
        .into_iter()
        .fold(loader, |loader, extra| extra.apply(loader));

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

fn read_input(input: &str) -> io::Result<String> {
    if input == "-" {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        fs::read_to_string(input)
    }
}

fn handle_convert_command(sub_matches: &ArgMatches, config: &PressConfig) {
    let Some(input) = sub_matches.get_one::<String>("input") else {
        eprintln!("Error: an input file is required");
        std::process::exit(1);
    };
    let output = sub_matches.get_one::<String>("output");

    let adapters = AdapterRegistry::default();
    let platform = config.render.platform.as_str();
    if !adapters.has(platform) {
        eprintln!("Error: unknown platform '{platform}'");
        eprintln!("Available platforms: {}", adapters.list().join(", "));
        std::process::exit(1);
    }

    let source = read_input(input).unwrap_or_else(|err| {
        eprintln!("Error reading input file '{input}': {err}");
        std::process::exit(1);
    });

    let mut publisher = Publisher::with_defaults();
    publisher.load_settings(&config.settings);
    tracing::info!(input = input.as_str(), platform, "converting");
    let html = publisher.render(&source, &config.settings, platform);

    match output {
        Some(path) => {
            fs::write(path, html).unwrap_or_else(|err| {
                eprintln!("Error writing output file '{path}': {err}");
                std::process::exit(1);
            });
        }
        None => println!("{html}"),
    }
}

fn handle_settings_command(config: &PressConfig) {
    let mut settings = config.settings.clone();
    let mut publisher = Publisher::with_defaults();
    publisher.load_settings(&settings);
    publisher.save_settings(&mut settings);
    match settings.to_json() {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("Error serializing settings: {err}");
            std::process::exit(1);
        }
    }
}

fn handle_list_platforms_command() {
    let adapters = AdapterRegistry::default();
    println!("Available platforms:\n");
    for key in adapters.list() {
        if let Ok(adapter) = adapters.get(&key) {
            println!("  {key}");
            println!("    {}", adapter.description());
            println!("    chain: {}", adapter.chain().join(" → "));
            println!();
        }
    }
}

fn handle_list_plugins_command(config: &PressConfig) {
    let mut publisher = Publisher::with_defaults();
    publisher.load_settings(&config.settings);

    let extensions: Vec<_> = publisher
        .parser()
        .extensions()
        .map(|extension| serde_json::to_value(extension.state()))
        .collect::<Result<_, _>>()
        .unwrap_or_else(|err| {
            eprintln!("Error serializing extensions: {err}");
            std::process::exit(1);
        });
    let plugins: Vec<_> = publisher
        .plugins()
        .plugins()
        .map(|plugin| {
            serde_json::to_value(plugin.state()).map(|mut value| {
                value["description"] = serde_json::Value::from(plugin.description());
                value
            })
        })
        .collect::<Result<_, _>>()
        .unwrap_or_else(|err| {
            eprintln!("Error serializing plugins: {err}");
            std::process::exit(1);
        });

    let listing = serde_json::json!({
        "extensions": extensions,
        "plugins": plugins,
    });
    match serde_json::to_string_pretty(&listing) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("Error serializing plugin list: {err}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extra_args_are_split_out() {
        let (cleaned, extras) = split_extra_args(&args(&[
            "mdpress",
            "post.md",
            "--extra-line-number",
            "--extra-theme-color",
            "#ff6600",
            "--extras-styles.max-font-size",
            "32",
            "-o",
            "out.html",
        ]));
        assert_eq!(cleaned, args(&["mdpress", "post.md", "-o", "out.html"]));
        assert_eq!(
            extras,
            vec![
                ExtraOverride::Setting {
                    field: "line_number".into(),
                    value: "true".into()
                },
                ExtraOverride::Setting {
                    field: "theme_color".into(),
                    value: "#ff6600".into()
                },
                ExtraOverride::PluginOption {
                    plugin: "styles".into(),
                    key: "max_font_size".into(),
                    value: "32".into()
                },
            ]
        );
    }

    #[test]
    fn plugin_names_keep_their_dashes() {
        let (_, extras) = split_extra_args(&args(&["mdpress", "--extra-code-blocks.tab-size", "2"]));
        assert_eq!(
            extras,
            vec![ExtraOverride::PluginOption {
                plugin: "code-blocks".into(),
                key: "tab_size".into(),
                value: "2".into()
            }]
        );
    }

    #[test]
    fn extras_reach_the_loaded_config() {
        let loader = [
            ExtraOverride::parse("link-footnote-mode", "all".into()),
            ExtraOverride::parse("lists.text-color", "#333333".into()),
        ]
        .into_iter()
        .fold(Loader::new(), |loader, extra| extra.apply(loader));
        let config = loader.build().unwrap();
        assert_eq!(
            config.settings.link_footnote_mode,
            mdpress_core::LinkFootnoteMode::All
        );
        let lists = config.settings.component_config("lists").unwrap();
        assert_eq!(lists["text_color"].as_text(), "#333333");
    }

    #[test]
    fn cli_accepts_convert_arguments() {
        let matches = build_cli()
            .try_get_matches_from(["mdpress", "convert", "post.md", "--platform", "zhihu", "-vv"])
            .unwrap();
        assert_eq!(matches.get_count("verbose"), 2);
        let sub = matches.subcommand_matches("convert").unwrap();
        assert_eq!(sub.get_one::<String>("platform").unwrap(), "zhihu");
        assert_eq!(sub.get_one::<String>("input").unwrap(), "post.md");
    }
}
