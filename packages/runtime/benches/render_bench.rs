use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pado_compiler::compile_template;
use pado_dom::Document;
use pado_expression::{EvalContext, Value};
use pado_runtime::{Engine, Updated};

const TODO_PAGE: &str = r#"
<main>
  <h1>{title}</h1>
  <ul>
    {@loop todos as todo}
      <li class={todo.done ? "done" : "open"}>
        {@if(todo.done)}<s>{todo.title}</s>{@else}<span>{todo.title}</span>{/if}
      </li>
    {/loop}
  </ul>
  <p>{todos.length} items</p>
</main>
"#;

fn todos(count: usize) -> Value {
    Value::Array(
        (0..count)
            .map(|i| {
                Value::Object(
                    [
                        ("title".to_string(), Value::from(format!("task {}", i))),
                        ("done".to_string(), Value::Boolean(i % 3 == 0)),
                    ]
                    .into_iter()
                    .collect(),
                )
            })
            .collect(),
    )
}

fn full_render(c: &mut Criterion) {
    let template = compile_template(TODO_PAGE);
    let state: EvalContext = [("title", Value::from("Todos")), ("todos", todos(50))].into_iter().collect();

    c.bench_function("full_render_50_items", |b| {
        b.iter(|| {
            let mut engine = Engine::new(&template);
            let mut doc = Document::parse(&template.html);
            engine.render(&mut doc, black_box(&state), &Updated::All)
        })
    });
}

fn partial_update(c: &mut Criterion) {
    let template = compile_template(TODO_PAGE);
    let mut state: EvalContext = [("title", Value::from("Todos")), ("todos", todos(50))].into_iter().collect();
    let mut engine = Engine::new(&template);
    let mut doc = Document::parse(&template.html);
    engine.render(&mut doc, &state, &Updated::All);

    state.set_variable("title", Value::from("Renamed"));
    let updated = Updated::keys(["title"]);

    c.bench_function("title_update_50_items", |b| {
        b.iter(|| engine.render(&mut doc, black_box(&state), &updated))
    });
}

criterion_group!(benches, full_render, partial_update);
criterion_main!(benches);
