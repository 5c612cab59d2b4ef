use aura_core::{
    Backend, CompileState, Compiler, EmitError, ErrorKind, PyTorchFlaskBackend, Stage,
};
use aura_tests::all_demos;

#[test]
fn every_demo_renders() {
    let compiler = Compiler::default();
    let demos = all_demos().expect("read demos");
    assert!(!demos.is_empty(), "no demo programs found");
    for (name, src) in demos {
        let py = compiler
            .compile_to_source(&src, &PyTorchFlaskBackend)
            .unwrap_or_else(|e| panic!("{} failed: {}", name, e))
            .source;
        assert!(py.starts_with("# Generated by aura."), "{}", name);
        assert!(py.contains("app = Flask(__name__)"), "{}", name);
    }
}

#[test]
fn rendering_is_deterministic() {
    let compiler = Compiler::default();
    for (_, src) in all_demos().expect("read demos") {
        let first = compiler.compile_to_source(&src, &PyTorchFlaskBackend);
        let second = compiler.compile_to_source(&src, &PyTorchFlaskBackend);
        assert_eq!(first.ok(), second.ok());
    }
}

#[test]
fn unsupported_loss_is_an_emit_error() {
    let src = "dataset \"d\" from huggingface \"a/b\"\nmodel m neural_network do\n  output units: 2, activation: :softmax\nend\ntrain m on \"d\" do\n  loss :hinge\nend\n";
    // Compiling alone succeeds: the loss is only checked by the backend.
    let program = aura_core::compile(src).expect("compile");
    let err = PyTorchFlaskBackend.emit(&program).unwrap_err();
    assert!(matches!(err, EmitError::Unsupported { what: "loss", .. }));

    let err = Compiler::default()
        .compile_to_source(src, &PyTorchFlaskBackend)
        .unwrap_err();
    assert_eq!(err.stage, Stage::Emit);
    assert_eq!(err.kind, ErrorKind::Unsupported);
    assert!(err.hint.as_deref().unwrap_or_default().contains("pytorch-flask"));
}

#[test]
fn custom_backends_plug_in() {
    struct RouteList;

    impl Backend for RouteList {
        fn name(&self) -> &'static str {
            "route-list"
        }

        fn emit(&self, program: &aura_core::EmittedProgram) -> Result<String, EmitError> {
            Ok(program
                .routes
                .iter()
                .map(|r| format!("{} {}", r.method, r.path))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }

    let src = "model g neural_network do\n  input text\nend\nroute \"/a\" get do\n  output prediction from g.predict(x)\nend\nroute \"/b\" post do\n  output prediction from g.predict(x)\nend\n";
    let out = Compiler::default()
        .compile_to_source(src, &RouteList)
        .expect("emit");
    assert_eq!(out.source, "GET /a\nPOST /b");
    assert_eq!(out.trace.last(), Some(&CompileState::Emitted));
}
