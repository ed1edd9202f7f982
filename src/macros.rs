//! Defines the macros used to declare GL-named enums.

/// Declares an enum whose variants correspond one-to-one to GL enum names.
///
/// Generates `name()`, `from_glenum()`, an implementation of `ToGlEnum`, `Display` printing the
/// GL name, and `FromStr` parsing it. Parsing goes through a lazily built hash map.
///
/// ## Example
/// ```ignore rust
/// gl_named_enum! {
///     /// Doc.
///     pub enum Filter {
///         Nearest => NEAREST,
///         Linear => LINEAR,
///     }
/// }
/// ```
macro_rules! gl_named_enum {
    (
        $(#[$attr:meta])*
        pub enum $name:ident {
            $(
                $(#[$vattr:meta])*
                $variant:ident => $glname:ident
            ),+ $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                $(#[$vattr])*
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Returns the GL name of this value, without the `GL_` prefix.
            pub fn name(&self) -> &'static str {
                match *self {
                    $($name::$variant => stringify!($glname),)+
                }
            }

            /// Turns a GLenum back into a value, if it names one.
            pub fn from_glenum(value: $crate::gl::types::GLenum) -> Option<$name> {
                $(
                    if value == $crate::gl::$glname {
                        return Some($name::$variant);
                    }
                )+
                None
            }
        }

        impl $crate::ToGlEnum for $name {
            #[inline]
            fn to_glenum(&self) -> $crate::gl::types::GLenum {
                match *self {
                    $($name::$variant => $crate::gl::$glname,)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, formatter: &mut ::std::fmt::Formatter) -> Result<(), ::std::fmt::Error> {
                formatter.write_str(self.name())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::image_format::FormatParseError;

            fn from_str(s: &str) -> Result<$name, Self::Err> {
                ::lazy_static::lazy_static! {
                    static ref BY_NAME: ::fnv::FnvHashMap<&'static str, $name> =
                        $name::ALL.iter().map(|v| (v.name(), *v)).collect();
                }

                let key = s.trim();
                let key = key.strip_prefix("GL_").unwrap_or(key);

                BY_NAME.get(key).cloned().ok_or_else(|| $crate::image_format::FormatParseError {
                    kind: stringify!($name),
                    name: s.to_owned(),
                })
            }
        }
    };
}
