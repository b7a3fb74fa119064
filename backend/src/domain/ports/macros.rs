//! Generates coded error enums for driven ports.
//!
//! Each variant names its display message and the error code it surfaces as
//! once converted into [`crate::domain::Error`]:
//!
//! ```ignore
//! define_port_error! {
//!     pub enum SpaceRepositoryError {
//!         Query { message: String } => "query failed: {message}"; COMMON_DB_ERROR,
//!     }
//! }
//! ```
//!
//! Besides the enum the macro emits snake-case constructors taking
//! `impl Into<_>` for every field, a `code()` accessor and the conversion
//! into the domain error, which keeps the port message as an extra.

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        define_port_error!(@ctor_fields $variant [] [] $( $field : $ty, )*);
    };

    (@ctor_fields $variant:ident [$($params:tt)*] [$($inits:tt)*]) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor_fields $variant:ident [$($params:tt)*] [$($inits:tt)*] $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor_fields
            $variant
            [$($params)* $field: impl Into<$ty>,]
            [$($inits)* $field: $field.into(),]
            $($rest)*
        );
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr ; $code:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*

            /// Code reported to callers for this failure.
            #[must_use]
            pub fn code(&self) -> i32 {
                match self {
                    $( Self::$variant { .. } => $code, )*
                }
            }
        }

        impl From<$name> for $crate::domain::Error {
            fn from(err: $name) -> Self {
                let code = err.code();
                let detail = err.to_string();
                Self::wrap_by_code(err, code).with_extra_msg(detail)
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    use crate::domain::{COMMON_DB_ERROR, COMMON_DUPLICATE, COMMON_RPC_ERROR, Error};

    define_port_error! {
        pub enum ProbePortError {
            Unreachable { message: String } => "unreachable: {message}"; COMMON_RPC_ERROR,
            Retries { count: u32 } => "gave up after {count} retries"; COMMON_DB_ERROR,
            Partial { message: String, count: u32 } => "partial: {message} ({count})"; COMMON_DB_ERROR,
            Taken => "already taken"; COMMON_DUPLICATE,
        }
    }

    #[test]
    fn constructors_accept_str_for_string_fields() {
        let err = ProbePortError::unreachable("auth service");
        assert_eq!(err.to_string(), "unreachable: auth service");
        assert_eq!(err.code(), COMMON_RPC_ERROR);
    }

    #[test]
    fn constructors_cover_mixed_and_unit_variants() {
        assert_eq!(
            ProbePortError::partial("spaces", 2_u32).to_string(),
            "partial: spaces (2)"
        );
        assert_eq!(ProbePortError::retries(3_u32).code(), COMMON_DB_ERROR);
        assert_eq!(ProbePortError::taken(), ProbePortError::Taken);
        assert_eq!(ProbePortError::Taken.code(), COMMON_DUPLICATE);
    }

    #[test]
    fn conversion_keeps_the_port_message_and_source() {
        let err = Error::from(ProbePortError::retries(3_u32));
        assert_eq!(err.code(), COMMON_DB_ERROR);
        assert!(err.message().ends_with("gave up after 3 retries"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
