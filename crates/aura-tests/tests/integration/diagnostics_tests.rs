use aura_core::{
    compile, render_diagnostic, CompileState, Compiler, CompilerConfig, ErrorKind, Stage,
};
use aura_frontend::RecoveryMode;

const MISSING_END: &str = "model g neural_network do\n  input text\n";
const FLUSH_BODY: &str = "train m on \"d\" do\nepochs 3\nend\n";

#[test]
fn missing_end_is_a_syntax_error_with_hint() {
    let err = compile(MISSING_END).unwrap_err();
    assert_eq!(err.stage, Stage::Parse);
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert!(err.message.contains("`end`"), "{}", err.message);
    assert!(err.hint.as_deref().is_some_and(|h| h.contains("`end`")));
    assert_eq!(
        err.state(),
        CompileState::Failed {
            stage: Stage::Parse,
            kind: ErrorKind::Syntax
        }
    );
}

#[test]
fn rendered_diagnostic_quotes_the_line() {
    let src = "model m neural_network do\n  layer dense units: 0\nend\n";
    let err = compile(src).unwrap_err();
    let rendered = render_diagnostic(&err, src);
    assert!(rendered.starts_with("error: transform error: "));
    assert!(rendered.contains(" --> 2:22\n"));
    assert!(rendered.contains("2 |   layer dense units: 0\n"));
    assert!(rendered.contains("  |                      ^\n"));
}

#[test]
fn recovery_appends_terminator_and_warns() {
    let compiler = Compiler::new(CompilerConfig::default().with_recovery(RecoveryMode::Forgiving));
    let compilation = compiler.compile(MISSING_END).expect("recovered");
    assert_eq!(compilation.warnings.len(), 1);
    assert!(compilation.warnings[0].message.contains("appended a closing `end`"));
    assert!(compilation.program.model("g").is_some());
}

#[test]
fn recovery_reindents_body_lines() {
    let src = format!(
        "{FLUSH_BODY}model m neural_network do\n  output units: 2, activation: :softmax\nend\ndataset \"d\" from huggingface \"a/b\"\n"
    );
    let compiler = Compiler::new(CompilerConfig::default().with_recovery(RecoveryMode::Forgiving));
    let compilation = compiler.compile(&src).expect("recovered");
    let warning = &compilation.warnings[0];
    assert_eq!(warning.location.map(|p| p.line), Some(2));
    assert_eq!(compilation.program.trains[0].epochs, 3);
}

#[test]
fn recovery_is_off_by_default() {
    assert!(compile(FLUSH_BODY).is_err());
}

#[test]
fn failed_recovery_reports_the_original_error() {
    let src = "model g neural_network do\n  input txt\n";
    let plain = compile(src).unwrap_err();
    let compiler = Compiler::new(CompilerConfig::default().with_recovery(RecoveryMode::Forgiving));
    let recovered = compiler.compile(src).unwrap_err();
    assert_eq!(plain, recovered);
}

#[test]
fn training_a_text_model_is_a_resolve_error() {
    let src = "dataset \"d\" from huggingface \"a/b\"\nmodel g neural_network do\n  input text\n  output greeting \"Hi\"\nend\ntrain g on \"d\" do\n  epochs 2\nend\n";
    let err = compile(src).unwrap_err();
    assert_eq!(err.stage, Stage::Resolve);
    assert_eq!(err.kind, ErrorKind::InvalidValue);
    assert!(err.message.contains("text model"), "{}", err.message);
    assert!(render_diagnostic(&err, src).starts_with("error: resolve error: "));
}

#[test]
fn duplicate_run_suggests_removing_a_line() {
    let err = compile("run web on port: 8080\nrun web on port: 9090\n").unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateDeclaration);
    assert_eq!(err.hint.as_deref(), Some("remove the extra `run web` line"));
}
