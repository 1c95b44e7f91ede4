use ngtpl_compiler::compile_template;
use ngtpl_dom::{Document, NodeId};
use ngtpl_expr::{Deferred, Scope};
use serde_json::json;

fn compile(markup: &str, ctx: serde_json::Value) -> (Document, NodeId) {
    let doc = Document::new();
    let root = doc.parse_element(markup).unwrap();
    let scope = Scope::from_json(ctx).unwrap();
    pollster::block_on(compile_template(&doc, root, scope)).unwrap();
    (doc, root)
}

fn html(markup: &str, ctx: serde_json::Value) -> String {
    let (doc, root) = compile(markup, ctx);
    doc.outer_html(root)
}

fn text(markup: &str, ctx: serde_json::Value) -> String {
    let (doc, root) = compile(markup, ctx);
    doc.text_content(root).trim().to_string()
}

#[test]
fn interpolation() {
    assert_eq!(text("<div>{{a}}: {{a+b}}</div>", json!({"a": 2, "b": 3})), "2: 5");
    assert_eq!(
        html("<div>{{type}}: <b>{{value}}</b></div>", json!({"type": "x", "value": "y"})),
        "<div>x: <b>y</b></div>"
    );
}

#[test]
fn nullish_interpolates_as_empty() {
    assert_eq!(
        html("<p>[{{ missing ?? null }}]</p>", json!({"missing": null})),
        "<p>[]</p>"
    );
}

#[test]
fn markers_produced_by_a_value_are_resolved() {
    assert_eq!(html("<p>{{a}}</p>", json!({"a": "{{b}}", "b": "x"})), "<p>x</p>");
    assert_eq!(
        html("<p>{{a}} {{c}}</p>", json!({"a": "{{b}}!", "b": "x", "c": 1})),
        "<p>x! 1</p>"
    );
}

#[test]
fn self_referencing_value_is_an_error() {
    let doc = Document::new();
    let root = doc.parse_element("<p>{{a}}</p>").unwrap();
    let scope = Scope::from_json(json!({"a": "{{a}}"})).unwrap();
    let err = pollster::block_on(compile_template(&doc, root, scope)).unwrap_err();
    assert!(matches!(
        err,
        ngtpl_compiler::CompileError::Eval(ngtpl_expr::EvalError::Type(_))
    ));
}

#[test]
fn property_binding() {
    assert_eq!(
        html(r#"<div [role]="role"></div>"#, json!({"role": "test"})),
        r#"<div role="test"></div>"#
    );
    assert_eq!(
        html(
            r#"<img width="100%" [src]="'/test/path/' + image">"#,
            json!({"image": "picture.jpg"})
        ),
        r#"<img width="100%" src="/test/path/picture.jpg">"#
    );
}

#[test]
fn bound_attributes_follow_plain_ones() {
    assert_eq!(
        html(r#"<a [href]="url" title="t"></a>"#, json!({"url": "/x"})),
        r#"<a title="t" href="/x"></a>"#
    );
    assert_eq!(
        html(r#"<a [title]="t" title="old"></a>"#, json!({"t": "new"})),
        r#"<a title="new"></a>"#
    );
}

#[test]
fn raw_style_binding_is_not_evaluated() {
    let (doc, root) = compile(r#"<div [style.max-width]="100px"></div>"#, json!(null));
    assert_eq!(doc.style_property(root, "max-width").as_deref(), Some("100px"));
}

#[test]
fn style_binding_with_unit() {
    let (doc, root) = compile(r#"<div [style.max-width.px]="100+500"></div>"#, json!(null));
    assert_eq!(doc.style_property(root, "max-width").as_deref(), Some("600px"));
    assert_eq!(doc.outer_html(root), r#"<div style="max-width: 600px;"></div>"#);
}

#[test]
fn style_binding_merges_into_existing_style() {
    assert_eq!(
        html(
            r#"<div style="color: red" [style.width.em]="w * 2"></div>"#,
            json!({"w": 1.5})
        ),
        r#"<div style="color: red; width: 3em;"></div>"#
    );
}

#[test]
fn class_toggles() {
    let tpl = r#"<div [class.test]="ctest"></div>"#;
    assert_eq!(html(tpl, json!({"ctest": false})), "<div></div>");
    assert_eq!(html(tpl, json!({"ctest": true})), r#"<div class="test"></div>"#);
    assert_eq!(
        html(r#"<div class="pre" [class.test]="ctest"></div>"#, json!({"ctest": true})),
        r#"<div class="pre test"></div>"#
    );
    assert_eq!(
        html(r#"<div [class.a]="1" [class.b]="0" [class.c]="'y'"></div>"#, json!({})),
        r#"<div class="a c"></div>"#
    );
}

#[test]
fn conditional_render() {
    let tpl = r#"<div>Hello, <span *ngIf="showName">Rem</span></div>"#;
    assert_eq!(text(tpl, json!({"showName": false})), "Hello,");
    assert_eq!(text(tpl, json!({"showName": true})), "Hello, Rem");
    assert_eq!(
        html(r#"<div><p *ngif="on" [title]="t">{{t}}</p></div>"#, json!({"on": 1, "t": "x"})),
        r#"<div><p title="x">x</p></div>"#
    );
}

#[test]
fn conditional_alias_reaches_descendants() {
    let users = json!([
        {"name": "Ivan", "message": "Version"},
        {"name": "Rem", "message": "App"}
    ]);
    let tpl = r#"<div><span *ngIf="users.find(u => u.name === 'Rem') as user">{{user.message}}</span></div>"#;
    assert_eq!(text(tpl, json!({"users": users.clone()})), "App");

    let tpl = r#"<div><ng-container *ngIf="users.find(u => u.name === 'Rem') as user"><span>{{user.message}}</span></ng-container></div>"#;
    assert_eq!(html(tpl, json!({"users": users})), "<div><span>App</span></div>");
}

#[test]
fn conditional_alias_reaches_own_bindings_but_not_siblings() {
    let tpl = r#"<div><b *ngif="name as n" [title]="n"></b><i>{{ typeof_n }}</i></div>"#;
    assert_eq!(
        html(tpl, json!({"name": "Rem", "typeof_n": "none"})),
        r#"<div><b title="Rem"></b><i>none</i></div>"#
    );

    let doc = Document::new();
    let root = doc
        .parse_element(r#"<div><b *ngif="name as n"></b><i>{{n}}</i></div>"#)
        .unwrap();
    let scope = Scope::from_json(json!({"name": "Rem"})).unwrap();
    assert!(pollster::block_on(compile_template(&doc, root, scope)).is_err());
}

#[test]
fn loop_render() {
    let tpl = r#"<div><span *ngFor="let x of numbers">Rem-{{x + 1}}</span></div>"#;
    assert_eq!(text(tpl, json!({"numbers": [0, 1]})), "Rem-1Rem-2");
    assert_eq!(text(tpl, json!({"numbers": []})), "");
    assert_eq!(html(tpl, json!({"numbers": []})), "<div></div>");
}

#[test]
fn loop_instances_keep_source_order_and_siblings() {
    let tpl = r#"<ul><li>first</li><li *ngfor="let u of users" [id]="u.id">{{u.name}}</li><li>last</li></ul>"#;
    let ctx = json!({"users": [{"id": "a", "name": "Rem"}, {"id": "b", "name": "Ram"}, {"id": "c", "name": "Emilia"}]});
    assert_eq!(
        html(tpl, ctx),
        r#"<ul><li>first</li><li id="a">Rem</li><li id="b">Ram</li><li id="c">Emilia</li><li>last</li></ul>"#
    );
}

#[test]
fn non_array_loop_source_counts_as_empty() {
    let tpl = r#"<div><i *ngfor="let c of word">{{c}}</i></div>"#;
    assert_eq!(html(tpl, json!({"word": "abc"})), "<div></div>");
    assert_eq!(html(tpl, json!({"word": null})), "<div></div>");
}

#[test]
fn malformed_loop_stays_as_plain_attribute() {
    assert_eq!(
        html(r#"<div><i *ngfor="x in xs">{{1}}</i></div>"#, json!({})),
        r#"<div><i *ngfor="x in xs">1</i></div>"#
    );
}

#[test]
fn conditional_then_loop_gates_the_whole_loop() {
    let tpl = r#"<div><i *ngif="show" *ngfor="let x of xs">{{x}}</i></div>"#;
    assert_eq!(text(tpl, json!({"show": true, "xs": [1, 2]})), "12");
    assert_eq!(text(tpl, json!({"show": false, "xs": [1, 2]})), "");
}

#[test]
fn loop_then_conditional_filters_per_item() {
    let tpl = r#"<div><i *ngfor="let x of xs" *ngif="x % 2">{{x}}</i></div>"#;
    assert_eq!(text(tpl, json!({"xs": [1, 2, 3, 4, 5]})), "135");
}

#[test]
fn nested_loops_see_outer_variables() {
    let tpl = r#"<table><tr *ngfor="let row of rows"><td *ngfor="let c of row.cells">{{row.name}}{{c}}</td></tr></table>"#;
    let ctx = json!({"rows": [{"name": "a", "cells": [1, 2]}, {"name": "b", "cells": [3]}]});
    assert_eq!(
        html(tpl, ctx),
        "<table><tr><td>a1</td><td>a2</td></tr><tr><td>b3</td></tr></table>"
    );
}

#[test]
fn async_values_are_awaited() {
    let doc = Document::new();
    let root = doc.parse_element("<div>{{name}}</div>").unwrap();
    let scope = Scope::new().with("name", Deferred::new(async {
        YieldOnce::default().await;
        Ok("Rem".into())
    }));
    pollster::block_on(compile_template(&doc, root, scope)).unwrap();
    assert_eq!(doc.text_content(root), "Rem");
}

#[test]
fn async_loop_sources_are_awaited() {
    let doc = Document::new();
    let root = doc
        .parse_element(r#"<div><b *ngfor="let x of xs">{{x}}</b></div>"#)
        .unwrap();
    let scope = Scope::new().with("xs", Deferred::ready(serde_json::json!([1, 2, 3])));
    pollster::block_on(compile_template(&doc, root, scope)).unwrap();
    assert_eq!(doc.outer_html(root), "<div><b>1</b><b>2</b><b>3</b></div>");
}

#[test]
fn container_unwraps_into_children() {
    let tpl = r#"<div><ng-container *ngIf="test"><span>a</span><span>b</span></ng-container></div>"#;
    assert_eq!(html(tpl, json!({"test": false})), "<div></div>");
    assert_eq!(html(tpl, json!({"test": true})), "<div><span>a</span><span>b</span></div>");
}

#[test]
fn container_keeps_text_between_children() {
    let tpl = "<div><ng-container *ngif=\"ok\">\n  <b>a</b>\n  <b>{{n}}</b>\n</ng-container></div>";
    assert_eq!(
        html(tpl, json!({"ok": true, "n": 2})),
        "<div>\n  <b>a</b>\n  <b>2</b>\n</div>"
    );

    let tpl = "<div><ng-template #pair>\n<b>a</b> <i>b</i>\n</ng-template><ng-container *ngtemplateoutlet=\"pair\"></ng-container></div>";
    assert_eq!(html(tpl, json!({})), "<div>\n<b>a</b> <i>b</i>\n</div>");
}

#[test]
fn container_loop_repeats_children() {
    let tpl = r#"<dl><ng-container *ngfor="let e of entries"><dt>{{e.k}}</dt><dd>{{e.v}}</dd></ng-container></dl>"#;
    let ctx = json!({"entries": [{"k": "a", "v": 1}, {"k": "b", "v": 2}]});
    assert_eq!(html(tpl, ctx), "<dl><dt>a</dt><dd>1</dd><dt>b</dt><dd>2</dd></dl>");
}

#[test]
fn fragments_expand_at_every_outlet() {
    let tpl = r#"<div>
      <ng-template #test>AbbA</ng-template>
      <ng-container *ngTemplateOutlet="test"></ng-container><ng-container *ngTemplateOutlet="test"></ng-container>
    </div>"#;
    assert_eq!(text(tpl, json!(null)), "AbbAAbbA");

    let tpl = r#"<div>
      <ng-template #test><span *ngIf="show">AbbA</span></ng-template>
      <ng-container *ngTemplateOutlet="test"></ng-container><ng-container *ngTemplateOutlet="test"></ng-container>
    </div>"#;
    assert_eq!(text(tpl, json!({"show": true})), "AbbAAbbA");
    assert_eq!(text(tpl, json!({"show": false})), "");
}

#[test]
fn text_fragment_is_wrapped_in_a_span() {
    assert_eq!(
        html(
            r#"<p><ng-template #hi>Hi {{name}}</ng-template><ng-container *ngtemplateoutlet="hi"></ng-container></p>"#,
            json!({"name": "Rem"})
        ),
        "<p><span>Hi Rem</span></p>"
    );
}

#[test]
fn fragment_expansions_are_independent() {
    let tpl = r#"<div><ng-template #row><b [class.on]="on">{{label}}</b></ng-template><ng-container *ngtemplateoutlet="row"></ng-container><i *ngfor="let label of labels"><ng-container *ngtemplateoutlet="row"></ng-container></i></div>"#;
    let ctx = json!({"on": true, "label": "top", "labels": ["x", "y"]});
    assert_eq!(
        html(tpl, ctx),
        r#"<div><b class="on">top</b><i><b class="on">x</b></i><i><b class="on">y</b></i></div>"#
    );
}

#[test]
fn unknown_fragment_removes_the_outlet() {
    assert_eq!(
        html(r#"<div>a<ng-container *ngtemplateoutlet="nope"></ng-container>b</div>"#, json!({})),
        "<div>ab</div>"
    );
}

#[test]
fn fragment_definitions_never_reach_the_output() {
    let tpl = r#"<div><ng-template #unused><b>{{ never_evaluated() }}</b></ng-template><i *ngfor="let x of [1, 2]"><ng-template #inner>t</ng-template>{{x}}</i></div>"#;
    assert_eq!(html(tpl, json!({})), "<div><i>1</i><i>2</i></div>");
}

#[test]
fn evaluation_errors_abort_the_compile() {
    let doc = Document::new();
    let root = doc.parse_element("<div>{{ a.b.c }}</div>").unwrap();
    let scope = Scope::from_json(json!({"a": {}})).unwrap();
    let err = pollster::block_on(compile_template(&doc, root, scope)).unwrap_err();
    assert!(matches!(
        err,
        ngtpl_compiler::CompileError::Eval(ngtpl_expr::EvalError::NullishAccess { .. })
    ));
}

#[test]
fn failed_async_source_aborts_the_compile() {
    let doc = Document::new();
    let root = doc.parse_element("<div>{{ user }}</div>").unwrap();
    let scope = Scope::new().with("user", Deferred::failed("offline"));
    let err = pollster::block_on(compile_template(&doc, root, scope)).unwrap_err();
    assert_eq!(err.to_string(), "async source failed: offline");
}

#[test]
fn binding_a_missing_value_is_an_error() {
    let doc = Document::new();
    let root = doc.parse_element(r#"<div [title]="t"></div>"#).unwrap();
    let scope = Scope::from_json(json!({"t": null})).unwrap();
    assert!(pollster::block_on(compile_template(&doc, root, scope)).is_err());
}

/// A future that is pending on its first poll, to exercise real suspension.
#[derive(Default)]
struct YieldOnce {
    polled: bool,
}

impl std::future::Future for YieldOnce {
    type Output = ();

    fn poll(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<()> {
        if self.polled {
            std::task::Poll::Ready(())
        } else {
            self.polled = true;
            cx.waker().wake_by_ref();
            std::task::Poll::Pending
        }
    }
}

#[test]
fn programmatic_trees_compile_like_parsed_ones() {
    use ngtpl_dom::{h, text};

    let doc = Document::new();
    let root = doc
        .build(&h(
            "div",
            (),
            vec![
                h("h1", vec![("[title]", "title")], vec![text("{{ title.toUpperCase() }}")]),
                h("p", vec![("*ngif", "items.length === 0")], vec![text("empty")]),
                h("span", vec![("*ngfor", "let i of items")], vec![text("{{i}};")]),
            ],
        ))
        .unwrap();
    let scope = Scope::from_json(json!({"title": "list", "items": ["a", "b"]})).unwrap();
    pollster::block_on(compile_template(&doc, root, scope)).unwrap();

    assert_eq!(
        doc.snapshot(root),
        h(
            "div",
            (),
            vec![
                h("h1", vec![("title", "list")], vec![text("LIST")]),
                h("span", (), vec![text("a;")]),
                h("span", (), vec![text("b;")]),
            ],
        )
    );
}
