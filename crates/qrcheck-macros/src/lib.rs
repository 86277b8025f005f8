#[macro_export]
macro_rules! impl_default_for {
    ($name:ident) => {
        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// String newtype that can be looked up by `&str` in maps
///
/// The calling crate needs `derive_more` with the `deref`, `display`, `from` and `into` features
#[macro_export]
macro_rules! new_type {
    ($name:ident, String) => {
        #[derive(
            Clone,
            Debug,
            PartialEq,
            ::derive_more::Deref,
            ::derive_more::Display,
            ::derive_more::From,
            ::derive_more::Into,
            Hash,
            Eq,
            Ord,
            PartialOrd,
        )]
        pub struct $name(String);

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl core::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}
