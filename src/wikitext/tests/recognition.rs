use super::*;

#[test]
fn template_nesting() {
    let doc = doc("{{a|{{b}}|{{c|{{d}}}}}}");
    assert_eq!(
        template_summary(&doc),
        [
            ("a".to_string(), 0),
            ("b".to_string(), 1),
            ("c".to_string(), 1),
            ("d".to_string(), 2),
        ]
    );
}

#[test]
fn skip_opacity() {
    let doc = doc("<nowiki>{{a}}</nowiki>{{b}}");
    assert_eq!(template_summary(&doc), [("b".to_string(), 0)]);

    let all = doc.parse_templates_where(|_| true).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all[0].skip);
    assert_eq!(all[0].raw_title, "a");
}

#[test]
fn default_skip_tags_are_opaque() {
    for name in DEFAULT_SKIP_TAGS.iter() {
        let source = if *name == COMMENT {
            "<!--{{a}} [[b]]-->{{c}}".to_string()
        } else {
            format!("<{name} class=\"x\">{{{{a}}}} [[b]]</{name}>{{{{c}}}}")
        };
        let doc = doc(&source);

        let templates = doc.parse_templates_where(|_| true).unwrap();
        assert_eq!(templates.len(), 2, "{name}");
        assert!(templates[0].skip, "{name}");
        assert!(!templates[1].skip, "{name}");
        let links = doc.parse_wikilinks_where(|_| true).unwrap();
        assert_eq!(links.len(), 1, "{name}");
        assert!(links[0].skip(), "{name}");

        assert_eq!(template_summary(&doc), [("c".to_string(), 0)], "{name}");
        assert!(doc.parse_wikilinks().unwrap().is_empty(), "{name}");
    }
}

#[test]
fn source_is_not_void() {
    let doc = doc("<source lang=\"cpp\">{{a}} [[b]]</source>{{c}}");
    let tags = doc.parse_tags();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "source");
    assert!(!tags[0].void);
    assert_eq!(tags[0].span, Span::new(0, 39));
    assert_eq!(tags[0].content.as_deref(), Some("{{a}} [[b]]"));
    assert_eq!(template_summary(&doc), [("c".to_string(), 0)]);
    assert!(doc.parse_wikilinks().unwrap().is_empty());
}

#[test]
fn comments_end_with_skip_tag() {
    let doc = doc("<nowiki><!--</nowiki>{{a}}");
    let tags = doc.parse_tags();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0].span, Span::new(0, 21));
    assert!(!tags[0].unclosed);
    assert_eq!(tags[1].name, COMMENT);
    assert_eq!(tags[1].span, Span::new(8, 12));
    assert!(tags[1].unclosed);
    assert!(tags[1].skip);
    assert_eq!(template_summary(&doc), [("a".to_string(), 0)]);

    let doc = super::doc("<PRE><!-- x --></pre><!--{{b}}");
    assert_eq!(doc.parse_tags()[1].span, Span::new(5, 15));
    assert!(doc.parse_tags()[2].unclosed);
    assert!(doc.parse_templates().unwrap().is_empty());
}

#[test]
fn comments_hide_links() {
    let doc = doc("<!-- [[a]] -->[[b]]");
    let links = doc.parse_wikilinks().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].base().left, "b");
    assert_eq!(doc.parse_wikilinks_where(|_| true).unwrap().len(), 2);
}

#[test]
fn unclosed_tag() {
    let doc = doc("<div>text");
    let tags = doc.parse_tags();
    assert_eq!(tags.len(), 1);
    let tag = &tags[0];
    assert_eq!(tag.name, "div");
    assert!(tag.unclosed);
    assert_eq!(tag.content.as_deref(), Some("text"));
    assert_eq!(tag.end, "");
    assert_eq!(tag.span, Span::new(0, 9));
    assert_eq!(tag.text(), "<div>text");
    assert_eq!(tag.closed_text(), "<div>text</div>");
}

#[test]
fn implicitly_closed_tags() {
    let doc = doc("<b><i>x</b>y");
    let tags = doc.parse_tags();
    assert_eq!(tags.len(), 2);

    assert_eq!(tags[0].name, "b");
    assert_eq!(tags[0].span, Span::new(0, 11));
    assert_eq!(tags[0].content.as_deref(), Some("<i>x"));
    assert_eq!(tags[0].end, "</b>");
    assert!(!tags[0].unclosed);

    assert_eq!(tags[1].name, "i");
    assert_eq!(tags[1].span, Span::new(3, 7));
    assert_eq!(tags[1].nest_level, 1);
    assert!(tags[1].unclosed);
    assert_eq!(tags[1].closed_text(), "<i>x</i>");
}

#[test]
fn leaf_tags() {
    let doc = doc("<ref name=a/>x<div/>y</DIV><br/></br><!-- c --></span>");
    let tags = doc.parse_tags();
    let names = tags.iter().map(|tag| tag.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["ref", "div", "br", "br", "!--"]);

    assert!(tags[0].self_closing);
    assert!(!tags[0].void);
    assert_eq!(tags[0].content, None);

    assert!(tags[1].self_closing);
    assert_eq!(tags[1].span, Span::new(14, 27));
    assert_eq!(tags[1].content.as_deref(), Some("y"));

    assert!(tags[2].void && tags[3].void);
    assert_eq!(tags[3].span, Span::new(32, 37));

    assert_eq!(tags[4].content.as_deref(), Some(" c "));
    assert!(tags.iter().all(|tag| tag.nest_level == 0 && !tag.skip));
}

#[test]
fn unterminated_comment() {
    let doc = doc("a<!-- <b>{{x}}");
    let tags = doc.parse_tags();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, COMMENT);
    assert!(tags[0].unclosed);
    assert_eq!(tags[0].closed_text(), "<!-- <b>{{x}}-->");
    assert!(doc.parse_templates().unwrap().is_empty());
}

#[test]
fn tags_in_skip_ranges() {
    let doc = doc("<pre><b>x</b></pre>");
    let tags = doc.parse_tags_where(|tag| tag.skip);
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "b");
    assert_eq!(doc.parse_tags().len(), 2);
}

#[test]
fn sections() {
    let source =
        "intro\n== A ==\na\n=== A1 ===\nx\n== B ==\n<nowiki>\n== C ==\n</nowiki>\n<h2>D</h2>\n";
    let doc = doc(source);
    let sections = doc.parse_sections();
    let summary = sections
        .iter()
        .map(|section| (section.title.as_str(), section.level, section.span))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        [
            ("top", 1, Span::new(0, 6)),
            ("A", 2, Span::new(6, 29)),
            ("A1", 3, Span::new(16, 29)),
            ("B", 2, Span::new(29, 64)),
            ("D", 2, Span::new(64, 75)),
        ]
    );
    assert_eq!(sections[0].content, "intro\n");
    assert_eq!(sections[0].heading, "");
    assert_eq!(sections[1].heading, "== A ==");
    assert_eq!(sections[1].content, "== A ==\na\n=== A1 ===\nx\n");
    assert_eq!(sections[4].heading, "<h2>D</h2>");
    assert!(sections.iter().enumerate().all(|(index, section)| section.index == index));
}

#[test]
fn uneven_headings() {
    let doc = doc("=Foo==\n==Bar== <!-- x -->\n== Baz == text\n");
    let sections = doc.parse_sections();
    let summary = sections
        .iter()
        .map(|section| (section.title.as_str(), section.level))
        .collect::<Vec<_>>();
    assert_eq!(summary, [("top", 1), ("Foo=", 1), ("Bar", 2)]);
    assert_eq!(sections[2].content, "==Bar== <!-- x -->\n== Baz == text\n");
}

#[test]
fn no_headings() {
    let doc = doc("just text");
    let sections = doc.parse_sections();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].span, Span::new(0, 9));
}

#[test]
fn parameter_balancing() {
    let source = "{{{1|{{{page|{{PAGENAME}}}}}}}}";
    let doc = doc(source);

    let top = doc.parse_parameters(false).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].name, "1");
    assert_eq!(top[0].text, source);

    let all = doc.parse_parameters(true).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].name, "page");
    assert_eq!(all[1].nest_level, 1);

    let templates = doc.parse_templates().unwrap();
    assert_eq!(templates.len(), 1);
    assert!(matches!(
        &templates[0].kind,
        TemplateKind::ParserFunction { hook, .. } if hook == "PAGENAME"
    ));
    assert_eq!(templates[0].span, Span::new(13, 25));
}

#[test]
fn parameters_inside_templates() {
    let doc = doc("{{a|{{{1}}}|b={{{2|x}}}}}");
    let templates = doc.parse_templates().unwrap();
    assert_eq!(templates.len(), 1);
    let params = &templates[0].params;
    assert_eq!(params[0].value, "{{{1}}}");
    assert_eq!(params[1].key, "b");
    assert_eq!(params[1].value, "{{{2|x}}}");
    assert_eq!(doc.parse_parameters(true).unwrap().len(), 2);
}

#[test]
fn file_link() {
    let doc = doc("[[File:Foo.png|thumb|300px]]");
    let links = doc.parse_wikilinks().unwrap();
    assert_eq!(links.len(), 1);
    let Wikilink::File { params, base } = links[0] else {
        panic!("{:?}", links[0]);
    };
    assert_eq!(params, &["thumb", "300px"]);
    assert_eq!(base.title.as_ref().unwrap().full_text(), "File:Foo.png");
}

#[test]
fn file_link_with_nested_constructs() {
    let doc = doc("[[Image:Foo.png|thumb|{{a|b}}|{{{c|d}}}|<nowiki>|</nowiki>x]]");
    let links = doc.parse_wikilinks().unwrap();
    let Wikilink::File { params, .. } = links[0] else {
        panic!("{:?}", links[0]);
    };
    assert_eq!(params, &["thumb", "{{a|b}}", "{{{c|d}}}", "<nowiki>|</nowiki>x"]);

    let templates = doc.parse_templates().unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].raw_title, "a");
}

#[test]
fn links_inside_templates() {
    let doc = doc("{{a|[[b|c]]|d=[[e]]}} [[f|{{g}}]]");
    let links = doc.parse_wikilinks().unwrap();
    let displays = links
        .iter()
        .map(|link| match link {
            Wikilink::Normal { display, .. } => display.as_str(),
            _ => panic!("{link:?}"),
        })
        .collect::<Vec<_>>();
    assert_eq!(displays, ["c", "e", "{{g}}"]);

    let templates = doc.parse_templates().unwrap();
    assert_eq!(templates[0].params.len(), 2);
    assert_eq!(templates[0].params[0].value, "[[b|c]]");
    assert_eq!(templates[1].raw_title, "g");
}

#[test]
fn templates_in_link_targets() {
    let doc = doc("[[{{PAGENAME}}|x]] [[Foo {{a}}]]");
    assert_eq!(
        template_summary(&doc),
        [("PAGENAME".to_string(), 0), ("a".to_string(), 0)]
    );
    let templates = doc.parse_templates().unwrap();
    assert_eq!(templates[0].span, Span::new(2, 14));
    assert_eq!(templates[1].span, Span::new(25, 30));
}

#[test]
fn malformed_title() {
    let doc = doc("{{}}");
    let templates = doc.parse_templates().unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].kind, TemplateKind::Raw);
    assert_eq!(templates[0].title(), None);
}

#[test]
fn raw_links() {
    let doc = doc("[[<b>]] [[]] [[a|b|c]]");
    let links = doc.parse_wikilinks().unwrap();
    assert_eq!(links.len(), 3);
    assert!(matches!(links[0], Wikilink::Raw { .. }));
    assert!(matches!(links[1], Wikilink::Raw { .. }));
    assert!(matches!(links[2], Wikilink::Normal { display, .. } if display == "b|c"));
}

#[test]
fn nesting_too_deep() {
    let source = format!("{}x{}", "{{a|".repeat(MAX_NESTING + 5), "}}".repeat(MAX_NESTING + 5));
    let doc = doc(&source);
    assert!(matches!(
        doc.parse_templates(),
        Err(Error::NestingTooDeep { kind: "template", .. })
    ));
    assert!(doc.parse_wikilinks().is_err());
    assert!(doc.parse_parameters(true).unwrap().is_empty());
}

#[test]
fn idempotence() {
    let source = "== A ==\n{{a|[[b]]|{{{c}}}}}<ref>x</ref>";
    let mut doc = doc(source);
    let tags = doc.parse_tags().to_vec();
    let sections = doc.parse_sections().to_vec();
    let templates = doc.parse_templates().unwrap().into_iter().cloned().collect::<Vec<_>>();
    let links = doc.parse_wikilinks().unwrap().into_iter().cloned().collect::<Vec<_>>();

    assert!(core::ptr::eq(doc.parse_tags(), doc.parse_tags()));
    doc.set_content(source);
    assert_eq!(doc.parse_tags(), tags);
    assert_eq!(doc.parse_sections(), sections);
    assert_eq!(
        doc.parse_templates().unwrap().into_iter().cloned().collect::<Vec<_>>(),
        templates
    );
    assert_eq!(
        doc.parse_wikilinks().unwrap().into_iter().cloned().collect::<Vec<_>>(),
        links
    );
}

#[test]
fn skip_tag_mutators() {
    let mut doc = doc("<span>{{a}}</span><nowiki>{{b}}</nowiki>{{c}}");
    assert_eq!(template_summary(&doc).len(), 2);

    doc.add_skip_tags(["SPAN"]);
    assert!(doc.skip_tags().any(|name| name == "SPAN"));
    assert_eq!(template_summary(&doc), [("c".to_string(), 0)]);

    doc.remove_skip_tags(["span", "nowiki"]);
    assert_eq!(template_summary(&doc).len(), 3);

    doc.set_skip_tags(["nowiki"]);
    assert_eq!(doc.skip_tags().collect::<Vec<_>>(), ["nowiki"]);
    assert_eq!(template_summary(&doc).len(), 2);
}

#[test]
fn overwrite_skip_tags() {
    let doc = Wikitext::new(
        "<nowiki>{{a}}</nowiki><span>{{b}}</span>",
        Options {
            skip_tags: vec!["span".to_string()],
            overwrite_skip_tags: true,
        },
    );
    assert_eq!(template_summary(&doc), [("a".to_string(), 0)]);
}
