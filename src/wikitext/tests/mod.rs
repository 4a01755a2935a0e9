use super::*;

mod recognition;

/// Creates a document with the default options.
fn doc(source: &str) -> Wikitext<'static> {
    let _ = env_logger::try_init();
    Wikitext::new(source, Options::default())
}

/// Returns the raw title and nest level of each visible template.
fn template_summary(doc: &Wikitext<'_>) -> Vec<(String, usize)> {
    doc.parse_templates()
        .unwrap()
        .into_iter()
        .map(|template| (template.raw_title.clone(), template.nest_level))
        .collect()
}
