//! Prints the constructs recognised in a wikitext file as JSON.

use anyhow::Context as _;
use serde::Serialize;
use std::io::{Read as _, Write as _};
use wiki_scan::wikitext::{
    Error, FileMap, Options, Parameter, Section, Tag, TemplateNode, Wikilink, Wikitext,
};

/// Which constructs to print.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Mode {
    All,
    Tags,
    Sections,
    Parameters,
    Templates,
    Wikilinks,
}

/// Everything recognised in a document.
#[derive(Serialize)]
struct Summary<'a> {
    tags: Vec<&'a Tag>,
    sections: &'a [Section],
    parameters: Vec<&'a Parameter>,
    templates: Vec<&'a TemplateNode>,
    wikilinks: Vec<&'a Wikilink>,
}

fn usage<T>(err: &'static str) -> anyhow::Result<T> {
    let exe = std::env::args().next().unwrap_or_default();
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    println!("Usage: {exe} [options] <file.wikitext | ->\n");
    println!("Options:");
    println!("    --tags, --sections, --parameters, --templates, --wikilinks:");
    println!("        Print only one kind of construct (default: all)");
    println!("    --skip-tag <name>: Also treat the content of <name> as opaque");
    println!("    --only-skip-tags: Use only the --skip-tag names");
    println!("    --include-skipped: Include constructs inside opaque tags\n");
    Err(anyhow::Error::msg(err))
}

/// Attaches the source position to a recognition error.
fn located<T>(doc: &Wikitext<'_>, result: Result<T, Error>) -> anyhow::Result<T> {
    result.map_err(|err| {
        let offset = match err {
            Error::NestingTooDeep { offset, .. } => offset,
            _ => return anyhow::Error::new(err),
        };
        let at = FileMap::new(doc.content()).find_line_col(offset);
        anyhow::Error::new(err).context(format!("input is too deeply nested at {at}"))
    })
}

fn mode(args: &mut pico_args::Arguments) -> anyhow::Result<Mode> {
    let mut mode = Mode::All;
    for (flag, value) in [
        ("--tags", Mode::Tags),
        ("--sections", Mode::Sections),
        ("--parameters", Mode::Parameters),
        ("--templates", Mode::Templates),
        ("--wikilinks", Mode::Wikilinks),
    ] {
        if args.contains(flag) {
            if mode != Mode::All {
                return usage("Only one construct kind may be selected");
            }
            mode = value;
        }
    }
    Ok(mode)
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));

    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        return usage("Help requested");
    }
    let mode = mode(&mut args)?;
    let skip_tags = args.values_from_str::<_, String>("--skip-tag")?;
    let overwrite_skip_tags = args.contains("--only-skip-tags");
    let include_skipped = args.contains("--include-skipped");
    let _ = args.contains("--");
    let Some(path) = args.opt_free_from_str::<String>()? else {
        return usage("Missing input file argument");
    };
    if !args.finish().is_empty() {
        return usage("Unknown extra arguments passed");
    }

    let content = if path == "-" {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        content
    } else {
        std::fs::read_to_string(&path).with_context(|| format!("could not read {path}"))?
    };

    let doc = Wikitext::new(
        content,
        Options {
            skip_tags,
            overwrite_skip_tags,
        },
    );
    let keep = |skip: bool| include_skipped || !skip;

    let mut out = std::io::stdout().lock();
    match mode {
        Mode::All => {
            let summary = Summary {
                tags: doc.parse_tags_where(|tag| keep(tag.skip)),
                sections: doc.parse_sections(),
                parameters: located(&doc, doc.parse_parameters_where(|parameter| keep(parameter.skip), true))?,
                templates: located(&doc, doc.parse_templates_where(|template| keep(template.skip)))?,
                wikilinks: located(&doc, doc.parse_wikilinks_where(|link| keep(link.skip())))?,
            };
            serde_json::to_writer_pretty(&mut out, &summary)?;
        }
        Mode::Tags => serde_json::to_writer_pretty(&mut out, &doc.parse_tags_where(|tag| keep(tag.skip)))?,
        Mode::Sections => serde_json::to_writer_pretty(&mut out, doc.parse_sections())?,
        Mode::Parameters => serde_json::to_writer_pretty(
            &mut out,
            &located(&doc, doc.parse_parameters_where(|parameter| keep(parameter.skip), true))?,
        )?,
        Mode::Templates => serde_json::to_writer_pretty(
            &mut out,
            &located(&doc, doc.parse_templates_where(|template| keep(template.skip)))?,
        )?,
        Mode::Wikilinks => serde_json::to_writer_pretty(
            &mut out,
            &located(&doc, doc.parse_wikilinks_where(|link| keep(link.skip())))?,
        )?,
    }
    writeln!(out)?;

    Ok(())
}
