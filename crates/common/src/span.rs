/// Enters an info-level span for the rest of the enclosing scope.
///
/// ```ignore
/// let _s = common::span!("resample", width = 224, height = 168);
/// ```
#[macro_export]
macro_rules! span {
    ($name:literal) => {
        $crate::__tracing::info_span!($name).entered()
    };
    ($name:literal, $($field:tt)+) => {
        $crate::__tracing::info_span!($name, $($field)+).entered()
    };
}

/// Debug-level counterpart of [`span!`].
#[macro_export]
macro_rules! span_debug {
    ($name:literal) => {
        $crate::__tracing::debug_span!($name).entered()
    };
    ($name:literal, $($field:tt)+) => {
        $crate::__tracing::debug_span!($name, $($field)+).entered()
    };
}
