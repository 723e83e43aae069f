/// Errors the engine can surface to a caller.
///
/// There is only one kind: the self-checker found a hoist that broke a
/// require- or peer-dependency promise. Malformed input is not validated
/// here — the engine trusts the shape of [`crate::InputTree`] it is given.
#[derive(thiserror::Error, Clone, Debug)]
pub enum HoistError {
    #[error("hoisting produced an inconsistent graph:\n{check_log}\n\nafter hoisting finished:\n{dump}")]
    Inconsistent { check_log: String, dump: String },
}
