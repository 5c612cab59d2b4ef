use aura_core::{compile, ErrorKind, Stage};
use aura_ir::{DeclKind, IrError};

const MODEL: &str = "model classifier neural_network do\n  output units: 2, activation: :softmax\nend\n";
const DATASET: &str = "dataset \"mnist\" from huggingface \"ylecun/mnist\"\n";

#[test]
fn route_to_missing_model_is_undefined() {
    let err = compile("route \"/x\" get do\n  output prediction from ghost.predict(input)\nend\n")
        .unwrap_err();
    assert_eq!(err.stage, Stage::Resolve);
    assert_eq!(err.kind, ErrorKind::UndefinedReference);
    assert!(err.message.contains("undefined model 'ghost'"));
}

#[test]
fn train_to_missing_dataset_is_undefined() {
    let src = format!("{MODEL}train classifier on \"cifar\" do\n  epochs 1\nend\n");
    let err = compile(&src).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UndefinedReference);
    assert!(err.message.contains("undefined dataset 'cifar'"));
    assert!(err.message.contains("train 'classifier'"));
}

#[test]
fn declarations_may_follow_their_uses() {
    let src = format!(
        "route \"/p\" post do\n  output prediction from classifier.predict(x)\nend\ntrain classifier on \"mnist\" do\n  epochs 1\nend\n{MODEL}{DATASET}"
    );
    let program = compile(&src).expect("compile");
    assert_eq!(program.routes.len(), 1);
    assert_eq!(program.trains.len(), 1);
}

#[test]
fn resolver_reports_first_failure_only() {
    let src = "evaluate a on \"x\"\nevaluate b on \"y\"\n";
    let err = compile(src).unwrap_err();
    assert!(err.message.contains("'a'"));
    assert!(!err.message.contains("'b'"));
}

#[test]
fn resolve_error_is_typed_in_the_ir_crate() {
    let cst = aura_frontend::parse_program("evaluate ghost on \"d\"\n").expect("parse");
    let ir = aura_ir::transform_program(&cst, &aura_ir::Defaults::default()).expect("transform");
    match aura_ir::resolve_program(ir) {
        Err(IrError::UndefinedReference {
            kind, referenced_by, ..
        }) => {
            assert_eq!(kind, DeclKind::Model);
            assert_eq!(referenced_by, "evaluate 'ghost'");
        }
        other => panic!("expected undefined reference, got {:?}", other),
    }
}
