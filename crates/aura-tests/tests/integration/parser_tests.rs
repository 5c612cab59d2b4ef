use aura_frontend::{parse_program, ModelLine, StatementKind, TrainOption};
use aura_tests::read_demo;

#[test]
fn parses_mnist_demo() {
    let src = read_demo("mnist.aura").expect("read demo");
    let cst = parse_program(&src).expect("parse");
    let kinds: Vec<&str> = cst
        .statements
        .iter()
        .map(|s| match &s.kind {
            StatementKind::Dataset(_) => "dataset",
            StatementKind::Model(_) => "model",
            StatementKind::Train(_) => "train",
            StatementKind::Evaluate(_) => "evaluate",
            StatementKind::Route(_) => "route",
            StatementKind::Run(_) => "run",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["dataset", "model", "train", "evaluate", "route", "run"]
    );

    let StatementKind::Model(model) = &cst.statements[1].kind else {
        panic!("expected model");
    };
    assert_eq!(model.name.text, "classifier");
    assert!(matches!(
        &model.body[0],
        ModelLine::InputShape { flatten: true, dims, .. } if dims.len() == 2
    ));
    // Same field shape, distinct tags.
    assert!(matches!(&model.body[1], ModelLine::Dense { .. }));
    assert!(matches!(&model.body[4], ModelLine::Output { .. }));

    let StatementKind::Train(train) = &cst.statements[2].kind else {
        panic!("expected train");
    };
    assert_eq!(train.options.len(), 5);
    assert!(matches!(
        &train.options[2],
        TrainOption::Optimizer { learning_rate: Some(_), .. }
    ));
}

#[test]
fn statement_ranges_are_one_based() {
    let cst = parse_program("\nevaluate m on \"d\"\n").expect("parse");
    let range = cst.statements[0].range;
    assert_eq!((range.start.line, range.start.column), (2, 1));
}

#[test]
fn hash_inside_string_is_not_a_comment() {
    let cst = parse_program("dataset \"a#b\" from huggingface \"org/a#b\" # trailing\n")
        .expect("parse");
    let StatementKind::Dataset(ds) = &cst.statements[0].kind else {
        panic!("expected dataset");
    };
    assert_eq!(ds.name.text, "\"a#b\"");
    assert_eq!(ds.source.text, "\"org/a#b\"");
}

#[test]
fn blank_lines_inside_blocks_are_allowed() {
    let src = "model g neural_network do\n\n  input text\n\nend\n";
    assert!(parse_program(src).is_ok());
}

#[test]
fn crlf_sources_parse() {
    let src = "model g neural_network do\r\n  input text\r\nend\r\nrun web on port: 80\r\n";
    assert_eq!(parse_program(src).expect("parse").statements.len(), 2);
}

#[test]
fn parse_misspelled_keyword_fails() {
    let err = parse_program("modle g neural_network do\n  input text\nend\n").unwrap_err();
    let syntax = err.syntax_error().expect("syntax error");
    assert_eq!(syntax.location.line, 1);
    assert!(!syntax.hint.is_empty());
}

#[test]
fn parse_route_without_model_call_fails() {
    let src = "route \"/x\" get do\n  output prediction from classifier\nend\n";
    assert!(parse_program(src).is_err());
}
