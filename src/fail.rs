#[cold]
#[inline(never)]
pub(crate) fn no_span_in_carrier<T>() -> T {
    panic!("No span attached to the carrier, but the caller requires one");
}
