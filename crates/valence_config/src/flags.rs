//! Compiler-style argument parsing.
//!
//! A unit is described by the same flags its compiler would be invoked with.
//! Parsing is forgiving: a flag with a missing value is logged and skipped,
//! unknown flags and unrecognized positional tokens are ignored. The only
//! hard failure is a `--profile` value that names no known profile.
//!
//! Arguments are processed in two passes. The first pass settles the output
//! directory (`--directory`), the second handles everything else, so output
//! paths always resolve against the right base regardless of flag order.

use crate::error::ConfigError;
use crate::types::{BuildConfiguration, Profile};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use valence_source::{FileId, SourceKind};

/// Flags that take a value, either as `--flag=value` or `--flag value`.
const VALUE_FLAGS: &[&str] = &[
    "pkg",
    "vapidir",
    "girdir",
    "metadatadir",
    "gresourcesdir",
    "define",
    "profile",
    "target-glib",
    "directory",
    "vapi",
    "gir",
    "internal-vapi",
];

/// Where relative paths in an argument list resolve.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentBase<'a> {
    /// Base for relative source files and search directories.
    pub source_dir: &'a Path,
    /// Default output directory, used when `--directory` is absent.
    pub output_dir: &'a Path,
}

/// The result of parsing a unit's arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArguments {
    /// The structured configuration.
    pub configuration: BuildConfiguration,
    /// Source files, in argument order, without duplicates.
    pub sources: Vec<FileId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Flag { name: &'a str, value: Option<&'a str> },
    Positional(&'a str),
}

/// Splits raw arguments into flags and positionals, attaching separated
/// values to the flags that take one.
fn tokenize(args: &[String]) -> Vec<Token<'_>> {
    let mut tokens = Vec::with_capacity(args.len());
    let mut iter = args.iter().map(String::as_str).peekable();
    while let Some(arg) = iter.next() {
        let (name, value) = if let Some(long) = arg.strip_prefix("--") {
            match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            }
        } else if let Some(short) = arg.strip_prefix('-').filter(|s| !s.is_empty()) {
            let mut chars = short.chars();
            let flag = chars.next();
            let rest = chars.as_str();
            let name = match flag {
                Some('D') => "define",
                Some('d') => "directory",
                _ => {
                    log::debug!("ignoring unsupported argument `{arg}`");
                    continue;
                }
            };
            (name, Some(rest).filter(|r| !r.is_empty()))
        } else {
            tokens.push(Token::Positional(arg));
            continue;
        };

        let value = match value {
            // `--name=` names the flag but leaves the value out.
            Some("") => None,
            Some(v) => Some(v),
            None if VALUE_FLAGS.contains(&name) => {
                match iter.peek() {
                    Some(next) if !next.starts_with('-') => iter.next(),
                    _ => None,
                }
            }
            None => None,
        };
        tokens.push(Token::Flag { name, value });
    }
    tokens
}

fn source_reference(token: &str, base: &Path) -> Option<FileId> {
    let path = Path::new(token);
    if SourceKind::from_path(path).is_some() {
        Some(FileId::resolve(base, path))
    } else {
        log::debug!("ignoring non-source argument `{token}`");
        None
    }
}

fn collect_from_tokens(tokens: &[Token<'_>], base: &Path) -> Vec<FileId> {
    let mut seen = BTreeSet::new();
    tokens
        .iter()
        .filter_map(|t| match t {
            Token::Positional(p) => source_reference(p, base),
            Token::Flag { .. } => None,
        })
        .filter(|f| seen.insert(f.clone()))
        .collect()
}

/// Returns the source files named in `args`, without interpreting any flag.
///
/// Lets a target learn its inputs even when the rest of its configuration is
/// invalid.
pub fn collect_sources(args: &[String], source_dir: &Path) -> Vec<FileId> {
    collect_from_tokens(&tokenize(args), source_dir)
}

fn resolve_path(base: &Path, value: &str) -> PathBuf {
    FileId::resolve(base, value).path().to_path_buf()
}

fn is_version(value: &str) -> bool {
    value == "auto"
        || value
            .split_once('.')
            .is_some_and(|(major, minor)| {
                !major.is_empty()
                    && !minor.is_empty()
                    && major.chars().all(|c| c.is_ascii_digit())
                    && minor.chars().all(|c| c.is_ascii_digit())
            })
}

/// Parses a unit's arguments into a configuration and its source list.
pub fn parse_arguments(
    args: &[String],
    base: &ArgumentBase<'_>,
) -> Result<ParsedArguments, ConfigError> {
    let tokens = tokenize(args);

    // Pass 1: the output directory.
    let mut directory: Option<PathBuf> = None;
    for token in &tokens {
        if let Token::Flag { name: "directory", value } = token {
            match value {
                Some(v) => directory = Some(resolve_path(base.output_dir, v)),
                None => log::warn!("--directory requires a value; ignoring"),
            }
        }
    }
    let explicit_directory = directory.is_some();
    let output_dir = directory.unwrap_or_else(|| base.output_dir.to_path_buf());

    // Pass 2: everything else.
    let mut config = BuildConfiguration::new(output_dir.clone());
    config.packages.clear();
    let mut warned_output_base = false;
    for token in &tokens {
        let Token::Flag { name, value } = *token else {
            continue;
        };
        match (name, value) {
            ("directory", _) => {}
            ("enable-experimental", _) => config.features.experimental = true,
            ("enable-experimental-non-null", _) => config.features.experimental_non_null = true,
            ("fatal-warnings", _) => config.features.fatal_warnings = true,
            ("abi-stability", _) => config.features.abi_stability = true,
            (_, None) if VALUE_FLAGS.contains(&name) => {
                log::warn!("--{name} requires a value; ignoring");
            }
            ("pkg", Some(v)) => {
                config.packages.insert(v.to_string());
            }
            ("define", Some(v)) => {
                config.defines.insert(v.to_string());
            }
            ("vapidir", Some(v)) => {
                config.search_dirs.vapi.insert(resolve_path(base.source_dir, v));
            }
            ("girdir", Some(v)) => {
                config.search_dirs.gir.insert(resolve_path(base.source_dir, v));
            }
            ("metadatadir", Some(v)) => {
                config.search_dirs.metadata.insert(resolve_path(base.source_dir, v));
            }
            ("gresourcesdir", Some(v)) => {
                config.search_dirs.gresources.insert(resolve_path(base.source_dir, v));
            }
            ("profile", Some(v)) => config.profile = v.parse::<Profile>()?,
            ("target-glib", Some(v)) => {
                if is_version(v) {
                    config.target_glib = Some(v.to_string());
                } else {
                    log::warn!("--target-glib expects MAJOR.MINOR or `auto`, got `{v}`; ignoring");
                }
            }
            ("vapi" | "gir" | "internal-vapi", Some(v)) => {
                if !explicit_directory && !warned_output_base {
                    log::warn!(
                        "--{name} given without --directory; resolving against {}",
                        output_dir.display()
                    );
                    warned_output_base = true;
                }
                let path = Some(resolve_path(&output_dir, v));
                match name {
                    "vapi" => config.outputs.interface = path,
                    "gir" => config.outputs.introspection = path,
                    _ => config.outputs.internal_interface = path,
                }
            }
            _ => log::debug!("ignoring unsupported flag --{name}"),
        }
    }
    config.add_baseline_packages();

    Ok(ParsedArguments {
        configuration: config,
        sources: collect_from_tokens(&tokens, base.source_dir),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn parse(list: &[&str]) -> ParsedArguments {
        let base = ArgumentBase {
            source_dir: Path::new("/project"),
            output_dir: Path::new("/project/build"),
        };
        parse_arguments(&args(list), &base).unwrap()
    }

    #[test]
    fn directory_after_output_still_applies() {
        let parsed = parse(&["--vapi=out.vapi", "--directory=/x"]);
        assert_eq!(
            parsed.configuration.outputs.interface,
            Some(PathBuf::from("/x/out.vapi"))
        );
        assert_eq!(parsed.configuration.output_dir, PathBuf::from("/x"));
    }

    #[test]
    fn directory_before_output() {
        let parsed = parse(&["--directory=/x", "--vapi=out.vapi"]);
        assert_eq!(
            parsed.configuration.outputs.interface,
            Some(PathBuf::from("/x/out.vapi"))
        );
    }

    #[test]
    fn output_without_directory_uses_default() {
        let parsed = parse(&["--gir=Demo-1.0.gir", "--internal-vapi=demo-internal.vapi"]);
        let outputs = &parsed.configuration.outputs;
        assert_eq!(
            outputs.introspection,
            Some(PathBuf::from("/project/build/Demo-1.0.gir"))
        );
        assert_eq!(
            outputs.internal_interface,
            Some(PathBuf::from("/project/build/demo-internal.vapi"))
        );
        assert!(outputs.interface.is_none());
    }

    #[test]
    fn relative_directory_resolves_against_default_output() {
        let parsed = parse(&["-d", "sub", "--vapi", "x.vapi"]);
        assert_eq!(
            parsed.configuration.outputs.interface,
            Some(PathBuf::from("/project/build/sub/x.vapi"))
        );
    }

    #[test]
    fn posix_profile_baseline_only() {
        let parsed = parse(&["--profile=posix"]);
        let expected: BTreeSet<String> = ["posix".to_string()].into_iter().collect();
        assert_eq!(parsed.configuration.packages, expected);
        assert_eq!(parsed.configuration.profile, Profile::Posix);
    }

    #[test]
    fn gobject_profile_baseline() {
        let parsed = parse(&["--profile=gobject"]);
        let expected: BTreeSet<String> = ["glib-2.0", "gobject-2.0"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(parsed.configuration.packages, expected);
    }

    #[test]
    fn default_profile_adds_gobject_baseline_to_requested_packages() {
        let parsed = parse(&["--pkg=gio-2.0", "--pkg", "gee-0.8"]);
        let packages = &parsed.configuration.packages;
        assert_eq!(packages.len(), 4);
        assert!(packages.contains("gio-2.0"));
        assert!(packages.contains("gee-0.8"));
        assert!(packages.contains("gobject-2.0"));
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let base = ArgumentBase {
            source_dir: Path::new("/p"),
            output_dir: Path::new("/p/build"),
        };
        let err = parse_arguments(&args(&["--profile=dova"]), &base).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile(p) if p == "dova"));
    }

    #[test]
    fn missing_value_is_skipped() {
        let parsed = parse(&["--pkg", "--define=DEBUG", "main.vala"]);
        let config = &parsed.configuration;
        assert!(config.defines.contains("DEBUG"));
        assert_eq!(config.packages.len(), 2, "only the baseline packages remain");
        assert_eq!(parsed.sources.len(), 1);
    }

    #[test]
    fn empty_values_are_skipped() {
        let parsed = parse(&["--pkg=", "--vapi=", "--define=", "--vapidir=", "main.vala"]);
        let config = &parsed.configuration;
        assert!(!config.packages.contains(""));
        assert_eq!(config.packages.len(), 2, "only the baseline packages remain");
        assert!(config.defines.is_empty());
        assert!(config.outputs.interface.is_none());
        assert!(config.search_dirs.vapi.is_empty());
        // An empty value does not swallow the next argument.
        assert_eq!(parsed.sources.len(), 1);
    }

    #[test]
    fn trailing_value_flag_is_skipped() {
        let parsed = parse(&["main.vala", "--vapidir"]);
        assert!(parsed.configuration.search_dirs.vapi.is_empty());
    }

    #[test]
    fn search_dirs_accumulate() {
        let parsed = parse(&[
            "--vapidir=vapi",
            "--vapidir=/usr/share/vala/vapi",
            "--vapidir=vapi",
            "--girdir=/usr/share/gir-1.0",
            "--metadatadir=metadata",
            "--gresourcesdir=data",
            "--gresourcesdir=data/icons",
        ]);
        let dirs = &parsed.configuration.search_dirs;
        assert_eq!(dirs.vapi.len(), 2);
        assert!(dirs.vapi.contains(Path::new("/project/vapi")));
        assert_eq!(dirs.gir.len(), 1);
        assert!(dirs.metadata.contains(Path::new("/project/metadata")));
        assert_eq!(dirs.gresources.len(), 2);
    }

    #[test]
    fn defines_from_short_and_long_forms() {
        let parsed = parse(&["-DWINDOWS", "-D", "DEBUG", "--define=HAVE_GEE"]);
        let defines = &parsed.configuration.defines;
        assert_eq!(defines.len(), 3);
        assert!(defines.contains("WINDOWS"));
        assert!(defines.contains("DEBUG"));
    }

    #[test]
    fn feature_switches() {
        let parsed = parse(&[
            "--enable-experimental",
            "--enable-experimental-non-null",
            "--fatal-warnings",
            "--abi-stability",
        ]);
        let f = parsed.configuration.features;
        assert!(f.experimental && f.experimental_non_null && f.fatal_warnings && f.abi_stability);
    }

    #[test]
    fn target_glib_validation() {
        assert_eq!(
            parse(&["--target-glib=2.56"]).configuration.target_glib.as_deref(),
            Some("2.56")
        );
        assert_eq!(
            parse(&["--target-glib=auto"]).configuration.target_glib.as_deref(),
            Some("auto")
        );
        assert!(parse(&["--target-glib=latest"]).configuration.target_glib.is_none());
    }

    #[test]
    fn sources_recognized_by_extension() {
        let parsed = parse(&[
            "src/main.vala",
            "src/main.vala",
            "vapi/config.vapi",
            "legacy.gs",
            "/usr/share/gir-1.0/Gtk-3.0.gir",
            "resources.c",
            "-C",
            "--use-header",
        ]);
        let names: Vec<_> = parsed.sources.iter().map(|f| f.path().to_path_buf()).collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("/project/src/main.vala"),
                PathBuf::from("/project/vapi/config.vapi"),
                PathBuf::from("/project/legacy.gs"),
                PathBuf::from("/usr/share/gir-1.0/Gtk-3.0.gir"),
            ]
        );
    }

    #[test]
    fn separated_value_is_not_a_source() {
        let parsed = parse(&["--vapi", "demo.vapi", "main.vala"]);
        assert_eq!(parsed.sources, vec![FileId::new("/project/main.vala")]);
    }

    #[test]
    fn collect_sources_ignores_invalid_profile() {
        let sources = collect_sources(
            &args(&["--profile=nonsense", "a.vala", "b.vala"]),
            Path::new("/p"),
        );
        assert_eq!(sources.len(), 2);
    }
}
