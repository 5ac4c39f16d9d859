use pado_compiler::{compile, compile_template, BlockKind, CompileOptions, CompiledTemplate, Marker};

#[test]
fn test_counter_page() {
    let source = r#"<body>
  <p>{count}</p>
  <button onclick="{increment}">+</button>
</body>"#;

    let template = compile_template(source);
    assert!(template.html.contains(r#"<p pado-text="{count}"></p>"#));
    assert!(template.html.contains(r#"onclick="{increment}""#));
    assert!(template.conditions.is_empty());
    assert!(template.loops.is_empty());
}

#[test]
fn test_todo_page() {
    let source = r#"<ul>
  {@loop todos as todo}
    <li class={todo.done ? "done" : "open"}>
      {@if(todo.done)}<s>{todo.title}</s>{@else}<span>{todo.title}</span>{/if}
    </li>
  {/loop}
</ul>
{@if(todos.length == 0)}<p>Nothing to do</p>{/if}"#;

    let output = compile(source, &CompileOptions::default());
    assert!(output.warnings.is_empty());
    let template = output.template;

    assert_eq!(template.loops.len(), 1);
    assert_eq!(template.conditions.len(), 2);

    let def = &template.loops[0];
    assert_eq!(def.array_expr, "todos");
    assert_eq!(def.item_name, "todo");
    assert!(def.content.starts_with(r#"<li pado-class="todo.done ? &quot;done&quot; : &quot;open&quot;">"#));
    assert!(def.content.contains("<!-- if:page_if_0 -->"));

    let inner = template.condition_group("page_if_0").unwrap();
    assert_eq!(inner.blocks[0].content, r#"<s pado-text="{todo.title}"></s>"#);
    assert_eq!(inner.blocks[1].kind, BlockKind::Else);

    let empty = template.condition_group("page_if_1").unwrap();
    assert_eq!(empty.blocks[0].condition.as_deref(), Some("todos.length == 0"));
    assert!(template.html.contains("<!-- if:page_if_1 -->"));
}

#[test]
fn test_every_marker_resolves_to_a_record() {
    let source = "{@if(a)}{@loop xs as x}{@if(x)}y{/if}{/loop}{@elseif(b)}{@loop ys as y}{y}{/loop}{/if}";
    let template = compile_template(source);

    let mut markup = vec![template.html.clone()];
    markup.extend(template.conditions.iter().flat_map(|g| g.blocks.iter().map(|b| b.content.clone())));
    markup.extend(template.loops.iter().map(|l| l.content.clone()));

    let mut seen = 0;
    for text in &markup {
        for part in text.split("<!--").skip(1) {
            let comment = part.split("-->").next().unwrap();
            match Marker::parse(comment).unwrap() {
                Marker::Condition(name) => assert!(template.condition_group(&name).is_some()),
                Marker::Loop(name) => assert!(template.loop_definition(&name).is_some()),
            }
            seen += 1;
        }
    }
    assert_eq!(seen, template.conditions.len() + template.loops.len());
}

#[test]
fn test_artifact_json_roundtrip() {
    let template = compile_template("{@if(n>0)}pos{@elseif(n<0)}neg{@else}zero{/if}");
    let json = template.to_json().unwrap();
    assert!(json.contains(r#""groupName": "page_if_0""#));
    assert!(json.contains(r#""type": "elseif""#));
    assert_eq!(CompiledTemplate::from_json(&json).unwrap(), template);
}

#[test]
fn test_stray_brace_leaves_rest_of_page_compiled() {
    let template = compile_template("<p>a { b</p><p>{x}</p>{@if(x)}<i>{y}</i>{/if}");
    assert_eq!(
        template.html,
        r#"<p>a { b</p><p pado-text="{x}"></p><!-- if:page_if_0 -->"#
    );
    assert_eq!(template.conditions[0].blocks[0].content, r#"<i pado-text="{y}"></i>"#);
}
