use aura_core::lower::{ModelAction, ModelOp, OutOfMemoryPolicy};
use aura_core::{compile, Compiler, CompilerConfig, ErrorKind};
use aura_ir::{Activation, Defaults, HttpMethod, ResponseFormat, Split};
use aura_tests::{read_demo, MemoryLimited};

#[test]
fn greeter_lowers_to_pass_through() {
    let program = compile("model greeter neural_network do\n  input text\n  output greeting \"Hi!\"\nend\n")
        .expect("compile");
    let model = program.model("greeter").expect("model");
    assert_eq!(
        *model,
        ModelAction::PassThrough {
            greeting: "Hi!".into()
        }
    );
    assert_eq!(model.greeting(), Some("Hi!"));
}

#[test]
fn mnist_demo_lowers_completely() {
    let program = compile(&read_demo("mnist.aura").expect("demo")).expect("compile");

    let ModelAction::Sequential {
        input_features,
        output_features,
        ops,
    } = program.model("classifier").expect("model")
    else {
        panic!("expected network");
    };
    assert_eq!((*input_features, *output_features), (784, 10));
    assert_eq!(
        ops.iter()
            .filter(|op| matches!(op, ModelOp::Linear { .. }))
            .count(),
        3
    );
    // Dense without an activation clause gets relu; dropout gets none.
    assert_eq!(
        ops[3..7],
        [
            ModelOp::Dropout { rate: 0.2 },
            ModelOp::Linear {
                in_features: 128,
                out_features: 64
            },
            ModelOp::Activation {
                function: Activation::Relu
            },
            ModelOp::Linear {
                in_features: 64,
                out_features: 10
            },
        ]
    );

    let train = &program.trains[0];
    assert_eq!(train.epochs, 10);
    assert_eq!(train.batch_size, 64);
    assert_eq!(train.optimizer, "adam");
    assert_eq!(train.learning_rate, 0.0005);
    assert_eq!(train.metrics.as_ref().map(|m| m.as_str()), Some("accuracy"));
    assert_eq!(train.on_out_of_memory, OutOfMemoryPolicy::HalveBatchAndRetryOnce);

    let route = &program.routes[0];
    assert_eq!(route.method, HttpMethod::Post);
    assert_eq!(route.path, "/predict");
    assert_eq!(route.handler.input_field, "pixels");
    assert_eq!(route.handler.format, ResponseFormat::Json);

    assert_eq!(program.run.port, 8080);
    assert_eq!(program.datasets[0].source, "ylecun/mnist");
    assert_eq!(program.evaluations[0].model, "classifier");
}

#[test]
fn run_port_defaults_to_3000() {
    assert_eq!(compile("").expect("compile").run.port, 3000);
    assert_eq!(
        compile("run web on port: 8080\n").expect("compile").run.port,
        8080
    );
}

#[test]
fn configured_defaults_flow_into_actions() {
    let defaults = Defaults {
        port: 5000,
        batch_size: 8,
        ..Defaults::default()
    };
    let compiler = Compiler::new(CompilerConfig::default().with_defaults(defaults));
    let src = "dataset \"d\" from huggingface \"a/b\"\nmodel m neural_network do\n  output units: 2, activation: :sigmoid\nend\ntrain m on \"d\" do\n  loss :bce\nend\n";
    let program = compiler.compile(src).expect("compile").program;
    assert_eq!(program.run.port, 5000);
    assert_eq!(program.trains[0].batch_size, 8);
    assert_eq!(program.trains[0].loss, "bce");
}

#[test]
fn configured_defaults_are_range_checked() {
    let defaults = Defaults {
        input_units: 0,
        ..Defaults::default()
    };
    let compiler = Compiler::new(CompilerConfig::default().with_defaults(defaults));
    let src = "model m neural_network do\n  output units: 2, activation: :softmax\nend\n";
    let err = compiler.compile(src).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidValue);
    assert!(err.message.contains("default input_units"), "{}", err.message);
}

#[test]
fn iris_demo_keeps_all_splits() {
    let program = compile(&read_demo("iris.aura").expect("demo")).expect("compile");
    assert_eq!(
        program.datasets[0].splits,
        vec![Split::Train, Split::Test, Split::Validation]
    );
    assert_eq!(program.routes[0].handler.format, ResponseFormat::Html);
}

#[test]
fn emitted_train_action_executes_backoff() {
    let program = compile(&read_demo("mnist.aura").expect("demo")).expect("compile");
    let mut runtime = MemoryLimited::new(40);
    let report = program.trains[0].execute(&mut runtime).expect("train");
    assert_eq!(runtime.attempts[..3], [(1, 64), (1, 32), (2, 32)]);
    assert_eq!(report.losses.len(), 10);
    assert_eq!(report.retried_epochs, vec![1]);
    assert_eq!(report.final_batch_size, 32);
}

#[test]
fn compiling_twice_is_identical() {
    let src = read_demo("mnist.aura").expect("demo");
    assert_eq!(compile(&src).expect("first"), compile(&src).expect("second"));
}
