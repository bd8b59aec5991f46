use trellis::{Field, Recorder, Seed, Settings};

fn recording_seed() -> (Recorder, Seed) {
    let recorder = Recorder::default();
    let seed = Seed::new(Settings::default()).with_backend(recorder.clone());
    (recorder, seed)
}

#[test]
fn fork_suffixes_are_bijective_base26() {
    let (_recorder, seed) = recording_seed();
    let parent = seed.span("request");

    let mut prefixes = Vec::new();
    for i in 0..28 {
        let child = parent.fork(format!("fork {}", i));
        prefixes.push(child.prefix().to_owned());
        child.end();
    }
    parent.end();

    assert_eq!(prefixes[0], "A");
    assert_eq!(prefixes[1], "B");
    assert_eq!(prefixes[25], "Z");
    assert_eq!(prefixes[26], "AA");
    assert_eq!(prefixes[27], "AB");
}

#[test]
fn step_suffixes_are_decimal() {
    let (_recorder, seed) = recording_seed();
    let parent = seed.span("request");

    for expected in 1..=3 {
        let child = parent.step("step");
        assert_eq!(child.prefix(), expected.to_string());
        child.end();
    }
    parent.end();
}

#[test]
fn fork_and_step_counters_are_independent() {
    let (_recorder, seed) = recording_seed();
    let parent = seed.span("request");

    let fork = parent.fork("concurrent");
    let step = parent.step("sequential");
    assert_eq!(fork.prefix(), "A");
    assert_eq!(step.prefix(), "1");

    // Grandchildren extend the dotted path from their own parent.
    let grandchild = fork.step("nested");
    assert_eq!(grandchild.prefix(), "A.1");

    grandchild.end();
    step.end();
    fork.end();
    parent.end();
}

#[test]
fn children_share_the_trace_and_point_at_their_parent() {
    let (_recorder, seed) = recording_seed();
    let parent = seed.span("request");
    let child = parent.fork("lookup");
    let grandchild = child.step("page");

    assert_eq!(child.trace_context().trace_id(), parent.trace_context().trace_id());
    assert_eq!(
        child.trace_context().parent_span_id(),
        Some(parent.trace_context().span_id()),
    );
    assert_eq!(
        grandchild.trace_context().parent_span_id(),
        Some(child.trace_context().span_id()),
    );
    assert_ne!(child.trace_context().span_id(), parent.trace_context().span_id());

    grandchild.end();
    child.end();
    parent.end();
}

#[test]
fn no_wait_children_do_not_hold_the_tree_open() {
    let (recorder, seed) = recording_seed();
    let parent = seed.span("request");
    let fire_and_forget = parent.fork_no_wait("notify");
    fire_and_forget.span_data(trellis::attrs! { "queued" => true });

    // No end() on the child; the parent alone completes the tree.
    parent.end();
    assert_eq!(recorder.flush_count(), 1);
    let submission = recorder.find_span("notify").unwrap();
    assert_eq!(submission.data["queued"], true.into());
}

#[test]
fn fork_with_applies_the_seed_modifier_to_the_child_only() {
    let (recorder, seed) = recording_seed();
    let parent = seed.span("request");
    let child = parent.fork_with("worker", |seed| {
        seed.add_prefill(Field::new("worker", true));
    });

    parent.info("from parent", &[]);
    child.info("from child", &[]);
    child.end();
    parent.end();

    let lines = recorder.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].fields.is_empty());
    assert_eq!(lines[1].fields[0].key(), "worker");
}

#[test]
fn copied_seeds_start_new_trees_in_the_same_trace() {
    let (recorder, seed) = recording_seed();
    let first = seed.with_data("service", "api").span("first");
    let second = first.copy_seed().span("second");

    assert_eq!(
        second.trace_context().trace_id(),
        first.trace_context().trace_id(),
    );
    assert_ne!(
        second.trace_context().span_id(),
        first.trace_context().span_id(),
    );

    second.end();
    // Seed data carried over into the second tree's aggregate.
    let submission = recorder.find_span("second").unwrap();
    assert_eq!(submission.data["service"], "api".into());

    first.end();
}

#[test]
fn adopted_remote_trace_is_preserved() {
    use trellis::{SpanId, TraceContext};
    use uuid::Uuid;

    let trace_id = Uuid::new_v4();
    let remote_parent = SpanId::random();
    let (recorder, seed) = recording_seed();
    let span = seed
        .with_trace(TraceContext::with_remote_parent(trace_id, remote_parent))
        .span("inbound");

    assert_eq!(span.trace_context().trace_id(), trace_id);
    assert_eq!(span.trace_context().parent_span_id(), Some(remote_parent));
    assert!(!span.trace_context().span_id().is_zero());

    span.end();
    let submission = recorder.find_span("inbound").unwrap();
    assert_eq!(submission.trace.trace_id(), trace_id);
}
