pub mod style;

pub use style::{validate_style_name, StyleRecord};
