use aura_core::compile;
use aura_ir::HttpMethod;
use aura_tests::{read_demo, FixedOutput};
use serde_json::Value;

fn body_json(body: &str) -> Value {
    serde_json::from_str(body).expect("json body")
}

#[test]
fn greeter_route_renders_html_greeting() {
    let program = compile(&read_demo("greeter.aura").expect("demo")).expect("compile");
    let runtime = FixedOutput::default();
    let resp = program
        .handle(HttpMethod::Get, "/hello", r#"{"name": "Ada"}"#, &runtime)
        .expect("route");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.content_type, "text/html");
    assert_eq!(resp.body, "<h1>Prediction: Hi!</h1>");
    assert!(runtime.calls.borrow().is_empty());
}

#[test]
fn classifier_route_returns_argmax_as_json() {
    let program = compile(&read_demo("mnist.aura").expect("demo")).expect("compile");
    let runtime = FixedOutput::new(vec![0.05, 0.1, 0.7, 0.15]);
    let resp = program
        .handle(HttpMethod::Post, "/predict", r#"{"pixels": [[0, 1], [1, 0]]}"#, &runtime)
        .expect("route");
    assert_eq!(resp.status, 200);
    assert_eq!(body_json(&resp.body)["prediction"], 2);

    let calls = runtime.calls.borrow();
    assert_eq!(calls[0].0, "classifier");
    assert_eq!(calls[0].1, vec![0.0, 1.0, 1.0, 0.0]);
}

#[test]
fn empty_body_and_missing_field_use_default_input() {
    let program = compile(&read_demo("mnist.aura").expect("demo")).expect("compile");
    let runtime = FixedOutput::new(vec![1.0]);
    for body in ["", "   ", r#"{"other": 1}"#, r#"{"pixels": null}"#] {
        let resp = program
            .handle(HttpMethod::Post, "/predict", body, &runtime)
            .expect("route");
        assert_eq!(resp.status, 200, "body {:?}", body);
    }
    assert!(runtime.calls.borrow().iter().all(|(_, input)| input == &[1.0]));
}

#[test]
fn malformed_json_is_a_400_with_fixed_message() {
    let program = compile(&read_demo("mnist.aura").expect("demo")).expect("compile");
    let resp = program
        .handle(HttpMethod::Post, "/predict", "{\"pixels\": [1,", &FixedOutput::default())
        .expect("route");
    assert_eq!(resp.status, 400);
    assert_eq!(
        body_json(&resp.body)["error"],
        "Invalid JSON. Send { \"pixels\": [...] }"
    );
}

#[test]
fn handler_failures_are_500s_with_the_reason() {
    let program = compile(&read_demo("mnist.aura").expect("demo")).expect("compile");
    // An empty output row has no arg-max.
    let resp = program
        .handle(HttpMethod::Post, "/predict", r#"{"pixels": [1]}"#, &FixedOutput::default())
        .expect("route");
    assert_eq!(resp.status, 500);
    assert_eq!(
        body_json(&resp.body)["error"],
        "Something went wrong: model produced an empty output"
    );
}

#[test]
fn unknown_route_is_not_handled() {
    let program = compile(&read_demo("greeter.aura").expect("demo")).expect("compile");
    assert!(program
        .handle(HttpMethod::Post, "/hello", "{}", &FixedOutput::default())
        .is_none());
}
