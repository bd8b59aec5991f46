use trellis::{attrs, Field, Level, Recorder, Seed, Settings};

fn recording_seed() -> (Recorder, Seed) {
    let recorder = Recorder::default();
    let seed = Seed::new(Settings::default()).with_backend(recorder.clone());
    (recorder, seed)
}

#[test]
fn end_delivers_exactly_one_submission() {
    let (recorder, seed) = recording_seed();
    let span = seed.span("request");
    span.span_data(attrs! { "foo" => "bar" });
    span.end();

    let spans = recorder.spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].description, "request");
    assert_eq!(spans[0].data["foo"], "bar".into());
    assert_eq!(recorder.flush_count(), 1);
}

#[test]
fn fork_and_parent_drain_in_one_sweep() {
    let (recorder, seed) = recording_seed();
    let parent = seed.span("request");
    let child = parent.fork("lookup");
    child.span_data(attrs! { "rows" => 3 });

    // The child ends first; the tree is still open, so nothing flushes.
    child.end();
    assert_eq!(recorder.spans().len(), 0);
    assert_eq!(recorder.flush_count(), 0);

    parent.end();
    let spans = recorder.spans();
    assert_eq!(spans.len(), 2);
    assert_eq!(recorder.flush_count(), 1);

    let child_submission = recorder.find_span("lookup").unwrap();
    assert_eq!(child_submission.data["rows"], 3.into());
    assert_eq!(
        child_submission.trace.parent_span_id(),
        Some(parent.trace_context().span_id()),
    );
    // The parent arrives even though nothing was written to it.
    assert!(recorder.find_span("request").is_some());
}

#[test]
fn flush_is_idempotent() {
    let (recorder, seed) = recording_seed();
    let span = seed.span("request");
    span.span_data(attrs! { "foo" => "bar" });

    span.flush();
    assert_eq!(recorder.spans().len(), 1);

    // No intervening mutation: the second flush is an empty drain.
    span.flush();
    assert_eq!(recorder.spans().len(), 1);
    assert_eq!(recorder.flush_count(), 2);

    span.end();
}

#[test]
fn mutation_after_drain_redirties_the_span() {
    let (recorder, seed) = recording_seed();
    let span = seed.span("request");
    span.span_data(attrs! { "first" => 1 });
    span.flush();
    assert_eq!(recorder.span_submissions("request").len(), 1);

    span.span_data(attrs! { "second" => 2 });
    span.flush();

    let submissions = recorder.span_submissions("request");
    assert_eq!(submissions.len(), 2);
    // The shared aggregate persists across sweeps.
    assert_eq!(submissions[1].data["first"], 1.into());
    assert_eq!(submissions[1].data["second"], 2.into());

    span.end();
}

#[test]
fn double_end_warns_and_does_not_crash() {
    let (recorder, seed) = recording_seed();
    let span = seed.span("request");
    span.end();
    span.end();

    let warnings = recorder.lines_at(Level::Warn);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("too many calls to end()"));
    // The first flush drained the parent; the second drain was empty.
    assert_eq!(recorder.span_submissions("request").len(), 1);
}

#[test]
fn child_created_after_completion_warns() {
    let (recorder, seed) = recording_seed();
    let span = seed.span("request");
    span.end();

    // fork() brings the refcount back up from zero, which means end() was
    // over-called relative to the spans created so far.
    let late = span.fork("late");
    assert_eq!(recorder.lines_at(Level::Warn).len(), 1);
    late.end();
}

#[test]
fn odd_trailing_index_argument_is_dropped() {
    let (recorder, seed) = recording_seed();
    let span = seed.span("request");
    span.span_index(&["a", "1", "b"]);
    span.end();

    let submission = recorder.find_span("request").unwrap();
    assert_eq!(submission.index.len(), 1);
    assert_eq!(submission.index["a"], vec!["1".to_owned()]);
    assert!(!submission.index.contains_key("b"));
}

#[test]
fn index_values_accumulate_in_order() {
    let (recorder, seed) = recording_seed();
    let span = seed.span("request");
    span.span_index(&["a", "1", "b", "x"]);
    span.span_index(&["a", "2"]);
    span.end();

    let submission = recorder.find_span("request").unwrap();
    assert_eq!(submission.index["a"], vec!["1".to_owned(), "2".to_owned()]);
    assert_eq!(submission.index["b"], vec!["x".to_owned()]);
}

#[test]
fn lines_are_immediate_and_carry_prefill() {
    let (recorder, seed) = recording_seed();
    let span = seed
        .with_prefill(Field::new("service", "api"))
        .span("request");

    span.info("accepted", &[Field::new("status", 200_u32)]);

    // Lines bypass the buffered protocol entirely.
    let lines = recorder.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(recorder.spans().len(), 0);
    assert_eq!(lines[0].level, Level::Info);
    assert_eq!(lines[0].message, "accepted");
    assert_eq!(lines[0].fields[0].key(), "service");
    assert_eq!(lines[0].fields[1].key(), "status");

    span.end();
}

#[test]
fn buffered_data_from_a_child_lands_in_the_shared_map() {
    let (recorder, seed) = recording_seed();
    let parent = seed.span("request");
    let child = parent.fork("worker");

    child.buffered_span_data(attrs! { "aggregate" => true });
    child.span_data(attrs! { "local" => true });
    child.end();
    parent.end();

    let parent_submission = recorder.find_span("request").unwrap();
    let child_submission = recorder.find_span("worker").unwrap();
    assert_eq!(parent_submission.data["aggregate"], true.into());
    assert!(!parent_submission.data.contains_key("local"));
    assert_eq!(child_submission.data["local"], true.into());
    assert!(!child_submission.data.contains_key("aggregate"));
}
