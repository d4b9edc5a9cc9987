#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

pub mod model {
    pub use graphbind_model::*;
}

pub mod common {
    pub use graphbind_common::*;
}

pub mod query {
    pub use graphbind_query::*;
}

pub mod components {
    pub use graphbind_components::*;
}

pub mod security {
    pub use graphbind_security::*;
}

pub mod markup {
    pub use graphbind_markup::*;
}
