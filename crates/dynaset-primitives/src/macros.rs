#[macro_export]
macro_rules! kind_registry_entries {
    ($macro:ident $(, @args $($args:tt)+ )?) => {
        $macro! {
            $(
                @args $($args)+;
            )?
            @entries
            (None, Undefined, bits = 0, name = "none"),
            (List, Collection, bits = 0, name = "list"),
            (Bool, Bool, bits = 1, name = "bool"),
            (Int, Signed, bits = 32, name = "int"),
            (Int32, Signed, bits = 32, name = "int32"),
            (Int64, Signed, bits = 64, name = "int64"),
            (Uint, Unsigned, bits = 32, name = "uint"),
            (Uint32, Unsigned, bits = 32, name = "uint32"),
            (Uint64, Unsigned, bits = 64, name = "uint64"),
            (Float, Float, bits = 64, name = "float"),
            (Float32, Float, bits = 32, name = "float32"),
            (Float64, Float, bits = 64, name = "float64"),
            (Binary, Binary, bits = 0, name = "binary"),
            (Lookup, Reference, bits = 0, name = "lookup"),
            (String, Textual, bits = 0, name = "string"),
            (Richtext, Textual, bits = 0, name = "richtext"),
            (Datetime, Temporal, bits = 64, name = "datetime"),
            (Duration, Temporal, bits = 64, name = "duration"),
        }
    };
}

macro_rules! kind_registry {
    ($macro:ident) => {
        $crate::kind_registry_entries!($macro)
    };
    ($macro:ident, $($args:tt)+) => {
        $crate::kind_registry_entries!($macro, @args $($args)+)
    };
}

macro_rules! metadata_from_registry {
    ( @args $kind:expr; @entries $( ($variant:ident, $family:ident, bits = $bits:literal, name = $name:literal) ),* $(,)? ) => {
        match $kind {
            $(
                $crate::Kind::$variant => $crate::KindMetadata {
                    family: $crate::KindFamily::$family,
                    bits: $bits,
                    name: $name,
                },
            )*
        }
    };
}

macro_rules! kind_from_name_registry {
    ( @args $name:expr; @entries $( ($variant:ident, $family:ident, bits = $bits:literal, name = $label:literal) ),* $(,)? ) => {
        match $name {
            $(
                $label => Some($crate::Kind::$variant),
            )*
            _ => None,
        }
    };
}

macro_rules! all_kinds_from_registry {
    ( @entries $( ($variant:ident, $family:ident, bits = $bits:literal, name = $name:literal) ),* $(,)? ) => {
        [ $( $crate::Kind::$variant ),* ]
    };
}
