pub mod axis;
pub mod field;
pub mod variable;
