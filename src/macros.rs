/// Builds an [`AttrMap`] from `key => value` pairs.
///
/// Keys convert via `String::from`, values via [`AttrValue::from`].
///
/// # Examples
///
/// ```
/// use trellis::attrs;
///
/// let data = attrs! {
///     "user" => "alice",
///     "attempts" => 3,
/// };
/// assert_eq!(data.len(), 2);
/// ```
///
/// [`AttrMap`]: crate::AttrMap
/// [`AttrValue::from`]: crate::AttrValue
#[macro_export]
macro_rules! attrs {
    () => {
        $crate::AttrMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::AttrMap::new();
        $( map.insert(::std::string::String::from($key), $crate::AttrValue::from($value)); )+
        map
    }};
}

/// Builds an array of [`Field`]s from `key => value` pairs, for passing to
/// the line methods.
///
/// # Examples
///
/// ```
/// use trellis::{fields, Recorder, Seed, Settings};
///
/// let recorder = Recorder::default();
/// let span = Seed::new(Settings::default())
///     .with_backend(recorder.clone())
///     .span("request");
/// span.info("validated", &fields!["user" => "alice", "ok" => true]);
/// span.end();
/// ```
///
/// [`Field`]: crate::Field
#[macro_export]
macro_rules! fields {
    ($($key:expr => $value:expr),* $(,)?) => {
        [ $( $crate::Field::new($key, $value) ),* ]
    };
}
