#[macro_export]
macro_rules! impl_display_for_enum {
    ($enum_name:ident, $( $variant:ident ),*) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $( $enum_name::$variant => f.write_str(stringify!($variant)), )*
                }
            }
        }
    };
}
