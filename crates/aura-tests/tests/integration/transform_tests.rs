use aura_core::{compile, ErrorKind, Stage};
use aura_frontend::parse_program;
use aura_ir::{
    transform_program, Activation, DeclKind, Defaults, IrError, Layer, ModelVariant, ProgramIR,
};

fn transform(src: &str) -> Result<ProgramIR, IrError> {
    let cst = parse_program(src).expect("parse");
    transform_program(&cst, &Defaults::default())
}

// ============================================================================
// Model variants
// ============================================================================

#[test]
fn greeter_is_a_text_model() {
    let ir = transform("model greeter neural_network do\n  input text\n  output greeting \"Hi!\"\nend\n")
        .expect("transform");
    let model = ir.model("greeter").expect("model");
    assert_eq!(
        model.variant,
        ModelVariant::Text {
            greeting: "Hi!".into()
        }
    );
}

#[test]
fn classifier_layers_match_source_order() {
    let src = "model classifier neural_network do\n  input shape(28,28)\n  layer dense units: 128, activation: :relu\n  layer dropout rate: 0.2\n  output units: 10, activation: :softmax\nend\n";
    let ir = transform(src).expect("transform");
    let ModelVariant::Network {
        layers,
        input_units,
    } = &ir.model("classifier").expect("model").variant
    else {
        panic!("expected network");
    };
    assert_eq!(*input_units, 784);
    assert_eq!(layers[0].flattened_units(), Some(784));
    assert_eq!(
        layers[1..],
        [
            Layer::Dense {
                units: 128,
                activation: Activation::Relu
            },
            Layer::Dropout { rate: 0.2 },
            Layer::Output {
                units: 10,
                activation: Activation::Softmax
            },
        ]
    );
}

#[test]
fn dense_units_64_defaults_to_relu() {
    let ir = transform("model m neural_network do\n  layer dense units: 64\nend\n").expect("transform");
    let ModelVariant::Network { layers, .. } = &ir.model("m").expect("model").variant else {
        panic!("expected network");
    };
    assert_eq!(
        layers[0],
        Layer::Dense {
            units: 64,
            activation: Activation::Relu
        }
    );
}

// ============================================================================
// Train defaults and options
// ============================================================================

#[test]
fn train_without_epochs_uses_default() {
    let ir = transform("train m on \"d\" do\n  batch_size 16\nend\n").expect("transform");
    let train = ir.trains().next().expect("train");
    assert_eq!(train.epochs, Defaults::default().epochs);
    assert_eq!(train.batch_size, 16);
}

#[test]
fn train_options_from_scenario() {
    let src = "train classifier on \"mnist\" do\n  epochs 10\n  batch_size 64\n  optimizer :adam, learning_rate: 0.0005\nend\n";
    let ir = transform(src).expect("transform");
    let train = ir.trains().next().expect("train");
    assert_eq!(
        (train.epochs, train.batch_size, train.optimizer.as_str()),
        (10, 64, "adam")
    );
    assert_eq!(train.learning_rate, 0.0005);
}

#[test]
fn later_train_option_overrides_earlier() {
    let ir = transform("train m on \"d\" do\n  batch_size 16\n  batch_size 8\nend\n")
        .expect("transform");
    assert_eq!(ir.trains().next().map(|t| t.batch_size), Some(8));
}

// ============================================================================
// Name uniqueness
// ============================================================================

#[test]
fn duplicate_models_fail_at_transform() {
    let src = "model a neural_network do\n  input text\nend\nmodel a neural_network do\n  layer dense units: 2\nend\n";
    let err = transform(src).unwrap_err();
    assert_eq!(
        err,
        IrError::DuplicateDeclaration {
            kind: DeclKind::Model,
            name: "a".into(),
            range: err.range(),
        }
    );
    assert_eq!(err.range().map(|r| r.start.line), Some(4));

    let compile_err = compile(src).unwrap_err();
    assert_eq!(compile_err.stage, Stage::Transform);
    assert_eq!(compile_err.kind, ErrorKind::DuplicateDeclaration);
}

#[test]
fn duplicate_datasets_and_runs_fail() {
    let ds = "dataset \"d\" from huggingface \"a/b\"\n";
    assert!(matches!(
        transform(&format!("{ds}{ds}")),
        Err(IrError::DuplicateDeclaration {
            kind: DeclKind::Dataset,
            ..
        })
    ));
    assert!(matches!(
        transform("run web on port: 1\nrun web on port: 2\n"),
        Err(IrError::DuplicateDeclaration {
            kind: DeclKind::Run,
            ..
        })
    ));
}

#[test]
fn model_and_dataset_may_share_a_name() {
    let src = "dataset \"x\" from huggingface \"a/b\"\nmodel x neural_network do\n  input text\nend\n";
    let ir = transform(src).expect("transform");
    assert!(ir.model("x").is_some());
    assert!(ir.dataset("x").is_some());
}

// ============================================================================
// Invalid values
// ============================================================================

#[test]
fn invalid_values_carry_locations() {
    let err = transform("model m neural_network do\n  input text\n  layer dropout rate: 0.5\nend\n")
        .unwrap_err();
    assert!(matches!(err, IrError::InvalidValue { .. }));
    let pos = err.range().expect("range").start;
    assert_eq!((pos.line, pos.column), (3, 23));
}

#[test]
fn port_zero_is_invalid() {
    let err = compile("run web on port: 0\n").unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidValue);
    assert_eq!(err.location.map(|p| p.line), Some(1));
}
