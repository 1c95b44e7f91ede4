use ngtpl_dom::{Document, MarkupError, NodeData, h, text};

#[test]
fn parse_element_with_text() {
    let doc = Document::new();
    let div = doc.parse_element("<div>hi</div>").unwrap();
    assert_eq!(doc.snapshot(div), h("div", (), vec![text("hi")]));
}

#[test]
fn surrounding_whitespace_is_not_a_node() {
    let doc = Document::new();
    let nodes = doc.parse_fragment("\n   <p>a</p>\n  ").unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(doc.tag(nodes[0]).as_deref(), Some("p"));
}

#[test]
fn inner_whitespace_is_preserved() {
    let doc = Document::new();
    let div = doc.parse_element("<div>\n  <b>x</b>\n</div>").unwrap();
    let kids = doc.children(div);
    assert_eq!(kids.len(), 3);
    assert_eq!(doc.text(kids[0]).as_deref(), Some("\n  "));
}

#[test]
fn directive_attribute_names_are_lowercased() {
    let doc = Document::new();
    let span = doc
        .parse_element(r#"<span *ngIf="users.find(u => u.name === 'Rem') as user" [class.Active]="on" #Tpl>x</span>"#)
        .unwrap();
    let names: Vec<_> = doc.attrs(span).into_iter().map(|a| a.name).collect();
    assert_eq!(names, vec!["*ngif", "[class.active]", "#tpl"]);
    assert_eq!(
        doc.attr(span, "*ngif").as_deref(),
        Some("users.find(u => u.name === 'Rem') as user")
    );
    assert_eq!(doc.attr(span, "#tpl").as_deref(), Some(""));
}

#[test]
fn void_and_self_closing_elements() {
    let doc = Document::new();
    let div = doc
        .parse_element(r#"<div><img width="100%" src=a.png><br/><input disabled>tail</div>"#)
        .unwrap();
    let kids = doc.children(div);
    assert_eq!(kids.len(), 4);
    assert_eq!(doc.attr(kids[0], "src").as_deref(), Some("a.png"));
    assert!(doc.children(kids[0]).is_empty());
    assert_eq!(doc.attr(kids[2], "disabled").as_deref(), Some(""));
    assert!(matches!(doc.data(kids[3]), NodeData::Text(ref t) if t == "tail"));
}

#[test]
fn comments_are_skipped_and_entities_decoded() {
    let doc = Document::new();
    let p = doc
        .parse_element(r#"<p title="a &amp; b"><!-- note -->1 &lt; 2 &#65;</p>"#)
        .unwrap();
    assert_eq!(doc.attr(p, "title").as_deref(), Some("a & b"));
    assert_eq!(doc.text_content(p), "1 < 2 A");
    assert_eq!(doc.outer_html(p), r#"<p title="a &amp; b">1 &lt; 2 A</p>"#);
}

#[test]
fn less_than_inside_text_is_literal() {
    let doc = Document::new();
    let p = doc.parse_element("<p>{{ a < b }}</p>").unwrap();
    assert_eq!(doc.text_content(p), "{{ a < b }}");
}

#[test]
fn unclosed_tags_are_closed_at_end() {
    let doc = Document::new();
    let div = doc.parse_element("<div><span>a</div>").unwrap();
    assert_eq!(doc.outer_html(div), "<div><span>a</span></div>");
}

#[test]
fn empty_markup_is_an_error() {
    let doc = Document::new();
    assert!(matches!(doc.parse_element("   "), Err(MarkupError::Empty)));
}
