pub mod flow;
pub mod template;
pub mod validate;
pub mod variables;
