// Error handling macros
// Provides macros for simplified error handling

/// Return early with an error if a condition is not satisfied.
///
/// The error is converted with `From` into the error type of the enclosing
/// function.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error:expr) => {
        if !($cond) {
            return Err(::core::convert::From::from($error));
        }
    };
}

/// Bail early with an error
#[macro_export]
macro_rules! bail {
    ($error:expr) => {
        return Err(::core::convert::From::from($error))
    };
}
