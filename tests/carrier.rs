use trellis::{Carrier, Recorder, Seed, Settings};

#[test]
fn attach_and_retrieve() {
    let recorder = Recorder::default();
    let span = Seed::new(Settings::default())
        .with_backend(recorder.clone())
        .span("request");

    let mut carrier = Carrier::empty();
    assert!(carrier.span().is_none());
    carrier.attach(span.clone());

    let retrieved = carrier.span().unwrap();
    assert_eq!(retrieved.description(), "request");
    assert_eq!(retrieved.trace_context(), span.trace_context());

    retrieved.info("from the carrier", &[]);
    span.end();
    assert_eq!(recorder.lines().len(), 1);
}

#[test]
fn from_span_attaches() {
    let span = Seed::new(Settings::default()).span("request");
    let carrier = Carrier::from(span.clone());
    assert_eq!(carrier.must_span().description(), "request");
    span.end();
}

#[test]
fn missing_span_falls_through_to_a_discard_span() {
    let carrier = Carrier::empty();
    let span = carrier.span_or_discard();

    // No backends: logging and ending are harmless no-ops.
    span.info("nobody is listening", &[]);
    span.end();
}

#[test]
#[should_panic(expected = "No span attached")]
fn must_span_panics_without_a_span() {
    Carrier::empty().must_span();
}

#[test]
fn replacing_the_attached_span() {
    let seed = Seed::new(Settings::default());
    let first = seed.span("first");
    let second = seed.span("second");

    let mut carrier = Carrier::from(first.clone());
    carrier.attach(second.clone());
    assert_eq!(carrier.must_span().description(), "second");

    first.end();
    second.end();
}
